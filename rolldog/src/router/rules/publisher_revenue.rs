//! Publisher revenue by country and date range.
//!
//! ```sql
//! SELECT publisher_id, SUM(bid_price) FROM events
//! WHERE type = 'impression' AND country = ? AND day BETWEEN ? AND ?
//! GROUP BY publisher_id
//! ```
//!
//! The rollup keeps per-country and per-day detail, so both the country
//! equality and the day range are mandatory: without them the rule would
//! silently widen the result to all countries or all days.

use crate::catalog::{Catalog, REVENUE_BY_MINUTE};
use crate::descriptor::{
    AggregateFunction, Filter, Predicate, QueryDescriptor, Scalar,
};
use crate::sql::{Expr, SelectStatement};

use super::{grain_matches, AggregateMapping, RewriteRule, SelectMapping};

pub struct PublisherRevenue;

fn mapping() -> SelectMapping {
    SelectMapping {
        columns: vec![("publisher_id", "publisher_id")],
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

impl RewriteRule for PublisherRevenue {
    fn name(&self) -> &'static str {
        "publisher_revenue"
    }

    fn rollup(&self) -> &'static str {
        REVENUE_BY_MINUTE
    }

    fn try_match(&self, query: &QueryDescriptor, catalog: &Catalog) -> Option<SelectStatement> {
        if !grain_matches(query.group_by(), &["publisher_id"]) {
            return None;
        }

        let mut saw_impressions = false;
        let mut country = None;
        let mut day_range = None;

        for filter in query.filters() {
            match (filter.column(), filter.predicate()) {
                ("type", Predicate::Eq(Scalar::Text(value)))
                    if value == "impression" && !saw_impressions =>
                {
                    saw_impressions = true;
                }
                ("country", Predicate::Eq(value)) if country.is_none() => {
                    country = Some(value.clone());
                }
                ("day", Predicate::Between(lo, hi)) if day_range.is_none() => {
                    day_range = Some((lo.clone(), hi.clone()));
                }
                // Unanticipated filter, duplicate slot, wrong operator.
                _ => return None,
            }
        }

        if !saw_impressions {
            return None;
        }
        let country = country?;
        let (lo, hi) = day_range?;

        let rollup = catalog.get(self.rollup())?;
        let statement = SelectStatement::new(rollup.relation())
            .filter(Filter::new("country".into(), Predicate::Eq(country)))
            .filter(Filter::new("day".into(), Predicate::Between(lo, hi)))
            .group_by("publisher_id");

        mapping().apply(statement, query)
    }
}
