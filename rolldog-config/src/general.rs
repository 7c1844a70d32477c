use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings: where the optimized data store lives and where query
/// results are written.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct General {
    /// Root directory of the optimized data store. The partitioned events
    /// dataset and all rollup artifacts live under this directory.
    ///
    /// _Default:_ `data_store`
    #[serde(default = "General::data_store")]
    pub data_store: PathBuf,

    /// Name of the partitioned events dataset under the data store root.
    ///
    /// _Default:_ `events`
    #[serde(default = "General::events_dataset")]
    pub events_dataset: String,

    /// Directory where query results are written, one CSV file per query.
    ///
    /// _Default:_ `out`
    #[serde(default = "General::output_dir")]
    pub output_dir: PathBuf,
}

impl General {
    fn data_store() -> PathBuf {
        PathBuf::from("data_store")
    }

    fn events_dataset() -> String {
        "events".into()
    }

    fn output_dir() -> PathBuf {
        PathBuf::from("out")
    }

    /// Directory holding the partitioned events dataset.
    pub fn events_path(&self) -> PathBuf {
        self.data_store.join(&self.events_dataset)
    }

    /// Path to a rollup artifact inside the data store.
    pub fn rollup_path(&self, file_name: &str) -> PathBuf {
        self.data_store.join(file_name)
    }
}

impl Default for General {
    fn default() -> Self {
        Self {
            data_store: Self::data_store(),
            events_dataset: Self::events_dataset(),
            output_dir: Self::output_dir(),
        }
    }
}
