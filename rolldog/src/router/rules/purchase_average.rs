//! Average purchase value by country.
//!
//! ```sql
//! SELECT country, AVG(total_price) FROM events
//! WHERE type = 'purchase' GROUP BY country ORDER BY AVG(total_price) DESC
//! ```
//!
//! The purchase summary rollup is already at country grain, so this is a
//! direct read with no re-grouping. AVG is never stored: it is
//! reconstructed as `sum_of_price / count_of_purchases`, which is exact,
//! unlike averaging stored averages.

use crate::catalog::{Catalog, PURCHASE_SUMMARY};
use crate::descriptor::{AggregateFunction, QueryDescriptor};
use crate::sql::{Expr, SelectStatement};

use super::{grain_matches, only_type_filter, AggregateMapping, RewriteRule, SelectMapping};

pub struct PurchaseAverage;

fn mapping() -> SelectMapping {
    SelectMapping {
        columns: vec![("country", "country")],
        aggregates: vec![AggregateMapping {
            function: AggregateFunction::Avg,
            argument: Some("total_price"),
            expr: Expr::Ratio {
                numerator: "sum_of_price".into(),
                denominator: "count_of_purchases".into(),
            },
            alias: "avg(total_price)",
        }],
    }
}

impl RewriteRule for PurchaseAverage {
    fn name(&self) -> &'static str {
        "purchase_average"
    }

    fn rollup(&self) -> &'static str {
        PURCHASE_SUMMARY
    }

    fn try_match(&self, query: &QueryDescriptor, catalog: &Catalog) -> Option<SelectStatement> {
        if !grain_matches(query.group_by(), &["country"]) {
            return None;
        }

        if !only_type_filter(query, "purchase") {
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
    fn test_average_reconstructed_from_sum_and_count() {
        let q = query(
            r#"{
                "select": ["country", {"AVG": "total_price"}],
                "where": [{"col": "type", "op": "eq", "val": "purchase"}],
                "group_by": ["country"],
                "order_by": [{"col": "AVG(total_price)", "dir": "desc"}]
            }"#,
        );

        let sql = PurchaseAverage
            .try_match(&q, &catalog())
            .unwrap()
            .render()
            .unwrap();
        assert!(sql.contains("sum_of_price / count_of_purchases AS \"avg(total_price)\""));
        assert!(sql.contains("agg_purchase_summary.parquet"));
        assert!(sql.ends_with("ORDER BY \"avg(total_price)\" DESC"));
        // Grain equality: direct read, no re-grouping.
        assert!(!sql.contains("GROUP BY"));
    }

    #[test]
    fn test_order_by_is_optional() {
        let q = query(
            r#"{
                "select": ["country", {"AVG": "total_price"}],
                "where": [{"col": "type", "op": "eq", "val": "purchase"}],
                "group_by": ["country"]
            }"#,
        );

        let sql = PurchaseAverage
            .try_match(&q, &catalog())
            .unwrap()
            .render()
            .unwrap();
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn test_extra_filter_disqualifies() {
        let q = query(
            r#"{
                "select": ["country", {"AVG": "total_price"}],
                "where": [
                    {"col": "type", "op": "eq", "val": "purchase"},
                    {"col": "day", "op": "eq", "val": "2024-06-01"}
                ],
                "group_by": ["country"]
            }"#,
        );

        assert!(PurchaseAverage.try_match(&q, &catalog()).is_none());
    }

    #[test]
    fn test_sum_instead_of_avg_disqualifies() {
        let q = query(
            r#"{
                "select": ["country", {"SUM": "total_price"}],
                "where": [{"col": "type", "op": "eq", "val": "purchase"}],
                "group_by": ["country"]
            }"#,
        );

        assert!(PurchaseAverage.try_match(&q, &catalog()).is_none());
    }

    #[test]
    fn test_order_by_unprojected_column_disqualifies() {
        let q = query(
            r#"{
                "select": ["country", {"AVG": "total_price"}],
                "where": [{"col": "type", "op": "eq", "val": "purchase"}],
                "group_by": ["country"],
                "order_by": [{"col": "publisher_id", "dir": "asc"}]
            }"#,
        );

        assert!(PurchaseAverage.try_match(&q, &catalog()).is_none());
    }
}
