//! Rollup catalog.
//!
//! Static knowledge of which rollup artifacts the ingestion script builds:
//! their grain (the columns they are pre-grouped by), the measures they
//! store and the physical file the execution engine reads. Rules reference
//! entries by name; physical paths are resolved here against the configured
//! data store, never hardcoded in rule logic.
//!
//! Measures are restricted to SUM and COUNT so every entry stays
//! re-aggregable across any coarsening of its grain. AVG is never stored;
//! it is reconstructed from a (sum, count) pair at query time.

use std::path::PathBuf;

use rolldog_config::General;

use crate::sql::Relation;

/// Rollup names, used by rules to look entries up.
pub const COUNTS_BY_ADVERTISER_TYPE: &str = "counts_by_advertiser_type";
pub const REVENUE_BY_MINUTE: &str = "revenue_by_minute";
pub const PURCHASE_SUMMARY: &str = "purchase_summary";

/// How a stored measure is computed from the base events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureSource {
    /// `SUM(column)`.
    Sum(&'static str),
    /// `COUNT(column)`, or `COUNT(*)` when `None`.
    Count(Option<&'static str>),
}

/// A numeric measure stored per grain tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    pub name: &'static str,
    pub source: MeasureSource,
}

/// One rollup artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Rollup {
    name: &'static str,
    file_name: &'static str,
    grain: &'static [&'static str],
    measures: Vec<Measure>,
    /// Event type the rollup is restricted to; `None` covers all events.
    event_type: Option<&'static str>,
    path: PathBuf,
}

impl Rollup {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn grain(&self) -> &'static [&'static str] {
        self.grain
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn event_type(&self) -> Option<&'static str> {
        self.event_type
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Relation the execution engine reads this rollup from.
    pub fn relation(&self) -> Relation {
        Relation::File {
            path: self.path.clone(),
        }
    }

    pub fn measure(&self, name: &str) -> Option<&Measure> {
        self.measures.iter().find(|measure| measure.name == name)
    }
}

/// Fixed, ordered list of rollup declarations.
#[derive(Debug, Clone)]
pub struct Catalog {
    rollups: Vec<Rollup>,
}

impl Catalog {
    /// Declare the rollups the ingestion pipeline builds, with physical
    /// paths resolved against the configured data store.
    pub fn new(general: &General) -> Self {
        let declare = |name, file_name, grain, measures, event_type| Rollup {
            name,
            file_name,
            grain,
            measures,
            event_type,
            path: general.rollup_path(file_name),
        };

        Self {
            rollups: vec![
                declare(
                    COUNTS_BY_ADVERTISER_TYPE,
                    "agg_counts_by_advertiser_type.parquet",
                    &["advertiser_id", "type"][..],
                    vec![Measure {
                        name: "event_count",
                        source: MeasureSource::Count(None),
                    }],
                    None,
                ),
                declare(
                    REVENUE_BY_MINUTE,
                    "agg_revenue_by_minute_publisher_country.parquet",
                    &["minute", "day", "publisher_id", "country"][..],
                    vec![Measure {
                        name: "total_revenue",
                        source: MeasureSource::Sum("bid_price"),
                    }],
                    Some("impression"),
                ),
                declare(
                    PURCHASE_SUMMARY,
                    "agg_purchase_summary.parquet",
                    &["country"][..],
                    vec![
                        Measure {
                            name: "sum_of_price",
                            source: MeasureSource::Sum("total_price"),
                        },
                        Measure {
                            name: "count_of_purchases",
                            source: MeasureSource::Count(Some("total_price")),
                        },
                    ],
                    Some("purchase"),
                ),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rollup> {
        self.rollups.iter().find(|rollup| rollup.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rollup> {
        self.rollups.iter()
    }
}
