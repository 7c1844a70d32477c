//! Daily revenue totals.
//!
//! ```sql
//! SELECT day, SUM(bid_price) FROM events WHERE type = 'impression' GROUP BY day
//! ```
//!
//! Served from the minute-grain revenue rollup by re-summing stored
//! per-minute totals across the day boundary. The filter set must be
//! exactly `type = 'impression'`: the rollup is already restricted to
//! impressions, and any other filter would need a dimension this rule
//! doesn't re-apply.

use crate::catalog::{Catalog, REVENUE_BY_MINUTE};
use crate::descriptor::{AggregateFunction, QueryDescriptor};
use crate::sql::{Expr, SelectStatement};

use super::{grain_matches, only_type_filter, AggregateMapping, RewriteRule, SelectMapping};

pub struct DailyRevenue;

fn mapping() -> SelectMapping {
    SelectMapping {
        columns: vec![("day", "day")],
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

impl RewriteRule for DailyRevenue {
    fn name(&self) -> &'static str {
        "daily_revenue"
    }

    fn rollup(&self) -> &'static str {
        REVENUE_BY_MINUTE
    }

    fn try_match(&self, query: &QueryDescriptor, catalog: &Catalog) -> Option<SelectStatement> {
        if !grain_matches(query.group_by(), &["day"]) {
            return None;
        }

        if !only_type_filter(query, "impression") {
            return None;
        }

        let rollup = catalog.get(self.rollup())?;
        let statement = SelectStatement::new(rollup.relation()).group_by("day");

        mapping().apply(statement, query)
    }
}
