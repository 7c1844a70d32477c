//! Per-minute revenue for one day.
//!
//! ```sql
//! SELECT minute, SUM(bid_price) FROM events
//! WHERE type = 'impression' AND day = ? GROUP BY minute ORDER BY minute
//! ```
//!
//! Minute is a native rollup column, so ordering on it passes through
//! unchanged; the day equality is mandatory since the rollup carries
//! per-day detail, and at most these two filters are permitted.

use crate::catalog::{Catalog, REVENUE_BY_MINUTE};
use crate::descriptor::{
    AggregateFunction, Filter, Predicate, QueryDescriptor, Scalar,
};
use crate::sql::{Expr, SelectStatement};

use super::{grain_matches, AggregateMapping, RewriteRule, SelectMapping};

pub struct MinuteRevenue;

fn mapping() -> SelectMapping {
    SelectMapping {
        columns: vec![("minute", "minute")],
        aggregates: vec![AggregateMapping {
            function: AggregateFunction::Sum,
            argument: Some("bid_price"),
            expr: Expr::Aggregate {
                function: AggregateFunction::Sum,
                argument: Some("total_revenue".into()),
            },
            alias: "sum(bid_price)",
        }],
    }
}

impl RewriteRule for MinuteRevenue {
    fn name(&self) -> &'static str {
        "minute_revenue"
    }

    fn rollup(&self) -> &'static str {
        REVENUE_BY_MINUTE
    }

    fn try_match(&self, query: &QueryDescriptor, catalog: &Catalog) -> Option<SelectStatement> {
        if !grain_matches(query.group_by(), &["minute"]) {
            return None;
        }

        let mut saw_impressions = false;
        let mut day = None;

        for filter in query.filters() {
            match (filter.column(), filter.predicate()) {
                ("type", Predicate::Eq(Scalar::Text(value)))
                    if value == "impression" && !saw_impressions =>
                {
                    saw_impressions = true;
                }
                ("day", Predicate::Eq(value)) if day.is_none() => {
                    day = Some(value.clone());
                }
                _ => return None,
            }
        }

        if !saw_impressions {
            return None;
        }
        let day = day?;

        let rollup = catalog.get(self.rollup())?;
        let statement = SelectStatement::new(rollup.relation())
            .filter(Filter::new("day".into(), Predicate::Eq(day)))
            .group_by("minute");

        mapping().apply(statement, query)
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
    fn test_end_to_end_shape() {
        let q = query(
            r#"{
                "select": ["minute", {"SUM": "bid_price"}],
                "where": [
                    {"col": "type", "op": "eq", "val": "impression"},
                    {"col": "day", "op": "eq", "val": "2024-06-01"}
                ],
                "group_by": ["minute"],
                "order_by": [{"col": "minute", "dir": "asc"}]
            }"#,
        );

        let sql = MinuteRevenue
            .try_match(&q, &catalog())
            .unwrap()
            .render()
            .unwrap();
        assert!(sql.contains("agg_revenue_by_minute_publisher_country.parquet"));
        assert!(sql.contains("WHERE day = '2024-06-01'"));
        assert!(sql.contains("GROUP BY minute"));
        assert!(sql.ends_with("ORDER BY minute ASC"));
        assert!(sql.contains("SUM(total_revenue) AS \"sum(bid_price)\""));
    }

    #[test]
    fn test_missing_day_disqualifies() {
        let q = query(
            r#"{
                "select": ["minute", {"SUM": "bid_price"}],
                "where": [{"col": "type", "op": "eq", "val": "impression"}],
                "group_by": ["minute"]
            }"#,
        );

        assert!(MinuteRevenue.try_match(&q, &catalog()).is_none());
    }

    #[test]
    fn test_third_filter_disqualifies() {
        let q = query(
            r#"{
                "select": ["minute", {"SUM": "bid_price"}],
                "where": [
                    {"col": "type", "op": "eq", "val": "impression"},
                    {"col": "day", "op": "eq", "val": "2024-06-01"},
                    {"col": "publisher_id", "op": "eq", "val": 3}
                ],
                "group_by": ["minute"]
            }"#,
        );

        assert!(MinuteRevenue.try_match(&q, &catalog()).is_none());
    }

    #[test]
    fn test_day_range_disqualifies() {
        let q = query(
            r#"{
                "select": ["minute", {"SUM": "bid_price"}],
                "where": [
                    {"col": "type", "op": "eq", "val": "impression"},
                    {"col": "day", "op": "between", "val": ["2024-06-01", "2024-06-02"]}
                ],
                "group_by": ["minute"]
            }"#,
        );

        assert!(MinuteRevenue.try_match(&q, &catalog()).is_none());
    }
}
