//! Query router.
//!
//! Tries each rewrite rule in a fixed priority order and returns the first
//! match; `None` tells the caller to fall back to a scan over the
//! partitioned dataset. The router owns no mutable state: routing is a pure
//! dispatch over the immutable catalog, safe to call concurrently.

pub mod rules;

use tracing::debug;

use crate::catalog::Catalog;
use crate::descriptor::QueryDescriptor;
use crate::sql::{self, SelectStatement};

use rules::{
    AdvertiserCounts, DailyRevenue, MinuteRevenue, PublisherRevenue, PurchaseAverage, RewriteRule,
};

/// A query rewritten against a rollup.
#[derive(Debug)]
pub struct RewrittenQuery {
    rule: &'static str,
    rollup: &'static str,
    statement: SelectStatement,
}

impl RewrittenQuery {
    /// Rule that produced the rewrite.
    pub fn rule(&self) -> &'static str {
        self.rule
    }

    /// Rollup the rewritten query reads.
    pub fn rollup(&self) -> &'static str {
        self.rollup
    }

    pub fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    pub fn sql(&self) -> Result<String, sql::Error> {
        self.statement.render()
    }
}

/// Query router.
pub struct Router {
    catalog: Catalog,
    rules: Vec<Box<dyn RewriteRule>>,
}

impl Router {
    /// Create a router with the benchmark's rules in priority order.
    /// First match wins; the rules are mutually exclusive in practice,
    /// but order is the contract when they aren't.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            rules: vec![
                Box::new(DailyRevenue),
                Box::new(PublisherRevenue),
                Box::new(PurchaseAverage),
                Box::new(AdvertiserCounts),
                Box::new(MinuteRevenue),
            ],
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Route a descriptor to a rollup, or `None` for the fallback path.
    pub fn route(&self, query: &QueryDescriptor) -> Option<RewrittenQuery> {
        for rule in &self.rules {
            if let Some(statement) = rule.try_match(query, &self.catalog) {
                debug!(rule = rule.name(), rollup = rule.rollup(), "rewrite rule matched");
                return Some(RewrittenQuery {
                    rule: rule.name(),
                    rollup: rule.rollup(),
                    statement,
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rolldog_config::General;

    fn router() -> Router {
        Router::new(Catalog::new(&General::default()))
    }

    fn query(json: &str) -> QueryDescriptor {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_routes_benchmark_queries() {
        let router = router();

        let cases = [
            (
                r#"{
                    "select": ["day", {"SUM": "bid_price"}],
                    "where": [{"col": "type", "op": "eq", "val": "impression"}],
                    "group_by": ["day"]
                }"#,
                "daily_revenue",
            ),
            (
                r#"{
                    "select": ["publisher_id", {"SUM": "bid_price"}],
                    "where": [
                        {"col": "type", "op": "eq", "val": "impression"},
                        {"col": "country", "op": "eq", "val": "JP"},
                        {"col": "day", "op": "between", "val": ["2024-10-20", "2024-10-23"]}
                    ],
                    "group_by": ["publisher_id"]
                }"#,
                "publisher_revenue",
            ),
            (
                r#"{
                    "select": ["country", {"AVG": "total_price"}],
                    "where": [{"col": "type", "op": "eq", "val": "purchase"}],
                    "group_by": ["country"],
                    "order_by": [{"col": "AVG(total_price)", "dir": "desc"}]
                }"#,
                "purchase_average",
            ),
            (
                r#"{
                    "select": ["advertiser_id", "type", {"COUNT": "*"}],
                    "group_by": ["advertiser_id", "type"],
                    "order_by": [{"col": "COUNT(*)", "dir": "desc"}]
                }"#,
                "advertiser_counts",
            ),
            (
                r#"{
                    "select": ["minute", {"SUM": "bid_price"}],
                    "where": [
                        {"col": "type", "op": "eq", "val": "impression"},
                        {"col": "day", "op": "eq", "val": "2024-06-01"}
                    ],
                    "group_by": ["minute"],
                    "order_by": [{"col": "minute", "dir": "asc"}]
                }"#,
                "minute_revenue",
            ),
        ];

        for (json, expected_rule) in cases {
            let rewritten = router.route(&query(json)).unwrap();
            assert_eq!(rewritten.rule(), expected_rule);
            assert!(rewritten.sql().is_ok());
        }
    }

    #[test]
    fn test_no_match_defers_to_fallback() {
        let router = router();
        // Group by publisher_id with COUNT(*): no rollup serves this.
        let q = query(
            r#"{
                "select": ["publisher_id", {"COUNT": "*"}],
                "group_by": ["publisher_id"]
            }"#,
        );

        assert!(router.route(&q).is_none());
    }

    #[test]
    fn test_unrecognized_filter_never_partially_matches() {
        let router = router();
        let q = query(
            r#"{
                "select": ["day", {"SUM": "bid_price"}],
                "where": [
                    {"col": "type", "op": "eq", "val": "impression"},
                    {"col": "user_id", "op": "eq", "val": 12}
                ],
                "group_by": ["day"]
            }"#,
        );

        assert!(router.route(&q).is_none());
    }

    #[test]
    fn test_grain_superset_does_not_match() {
        let router = router();
        let q = query(
            r#"{
                "select": ["advertiser_id", "type", "country", {"COUNT": "*"}],
                "group_by": ["advertiser_id", "type", "country"]
            }"#,
        );

        assert!(router.route(&q).is_none());
    }

    #[test]
    fn test_first_match_priority() {
        // The five shapes have distinct grains, so a truly ambiguous
        // descriptor doesn't exist; assert the dispatch order is the
        // declared one by checking a rule earlier in priority wins over
        // the rollup both rules share.
        let router = router();
        let daily = query(
            r#"{
                "select": ["day", {"SUM": "bid_price"}],
                "where": [{"col": "type", "op": "eq", "val": "impression"}],
                "group_by": ["day"]
            }"#,
        );
        let rewritten = router.route(&daily).unwrap();
        assert_eq!(rewritten.rule(), "daily_revenue");
        assert_eq!(rewritten.rollup(), "revenue_by_minute");
    }
}
