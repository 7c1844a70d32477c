//! Event counts by advertiser and type.
//!
//! ```sql
//! SELECT advertiser_id, type, COUNT(*) FROM events
//! GROUP BY advertiser_id, type ORDER BY COUNT(*) DESC
//! ```
//!
//! Direct read of the advertiser/type counts rollup. No filters are
//! permitted at all: the rollup has no finer dimension left to filter on,
//! so any filter would require the base dataset.

use crate::catalog::{Catalog, COUNTS_BY_ADVERTISER_TYPE};
use crate::descriptor::{AggregateFunction, QueryDescriptor};
use crate::sql::{Expr, SelectStatement};

use super::{grain_matches, AggregateMapping, RewriteRule, SelectMapping};

pub struct AdvertiserCounts;

fn mapping() -> SelectMapping {
    SelectMapping {
        columns: vec![
            ("advertiser_id", "advertiser_id"),
            ("type", "type"),
        ],
        aggregates: vec![AggregateMapping {
            function: AggregateFunction::Count,
            argument: None,
            expr: Expr::Column("event_count".into()),
            alias: "count_star()",
        }],
    }
}

impl RewriteRule for AdvertiserCounts {
    fn name(&self) -> &'static str {
        "advertiser_counts"
    }

    fn rollup(&self) -> &'static str {
        COUNTS_BY_ADVERTISER_TYPE
    }

    fn try_match(&self, query: &QueryDescriptor, catalog: &Catalog) -> Option<SelectStatement> {
        if !grain_matches(query.group_by(), &["advertiser_id", "type"]) {
            return None;
        }

        if !query.filters().is_empty() {
            return None;
        }

        let rollup = catalog.get(self.rollup())?;
        mapping().apply(SelectStatement::new(rollup.relation()), query)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::Catalog;
    use rolldog_config::General;

    fn query(json: &str) -> QueryDescriptor {
        serde_json::from_str(json).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new(&General::default())
    }

    #[test]
    fn test_matches_count_by_advertiser_and_type() {
        let q = query(
            r#"{
                "select": ["advertiser_id", "type", {"COUNT": "*"}],
                "group_by": ["advertiser_id", "type"],
                "order_by": [{"col": "COUNT(*)", "dir": "desc"}]
            }"#,
        );

        let sql = AdvertiserCounts
            .try_match(&q, &catalog())
            .unwrap()
            .render()
            .unwrap();
        assert!(sql.contains("event_count AS \"count_star()\""));
        assert!(sql.contains("agg_counts_by_advertiser_type.parquet"));
        assert!(sql.ends_with("ORDER BY \"count_star()\" DESC"));
        assert!(!sql.contains("GROUP BY"));
    }

    #[test]
    fn test_group_by_order_does_not_matter() {
        let q = query(
            r#"{
                "select": ["advertiser_id", "type", {"COUNT": "*"}],
                "group_by": ["type", "advertiser_id"]
            }"#,
        );

        assert!(AdvertiserCounts.try_match(&q, &catalog()).is_some());
    }

    #[test]
    fn test_any_filter_disqualifies() {
        let q = query(
            r#"{
                "select": ["advertiser_id", "type", {"COUNT": "*"}],
                "where": [{"col": "type", "op": "eq", "val": "click"}],
                "group_by": ["advertiser_id", "type"]
            }"#,
        );

        assert!(AdvertiserCounts.try_match(&q, &catalog()).is_none());
    }

    #[test]
    fn test_extra_grouping_dimension_disqualifies() {
        let q = query(
            r#"{
                "select": ["advertiser_id", "type", {"COUNT": "*"}],
                "group_by": ["advertiser_id", "type", "country"]
            }"#,
        );

        assert!(AdvertiserCounts.try_match(&q, &catalog()).is_none());
    }

    #[test]
    fn test_count_with_column_argument_disqualifies() {
        let q = query(
            r#"{
                "select": ["advertiser_id", "type", {"COUNT": "bid_price"}],
                "group_by": ["advertiser_id", "type"]
            }"#,
        );

        assert!(AdvertiserCounts.try_match(&q, &catalog()).is_none());
    }
}
