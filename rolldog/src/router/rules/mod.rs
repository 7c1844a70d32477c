//! Rewrite rules.
//!
//! One rule per supported query shape. A rule matches only when the
//! descriptor's grouping set equals its grain exactly, the select list has
//! exactly the expected shape, and every filter is one the rule anticipated;
//! anything unrecognized disqualifies the match rather than being dropped.
//! On match the rule produces an equivalent statement against its rollup,
//! re-deriving aggregates from stored measures and re-mapping order-by
//! references to the rollup's output aliases.

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::descriptor::{
    AggregateFunction, OrderBy, OrderTarget, Projection, QueryDescriptor,
};
use crate::sql::{Expr, OrderClause, OrderRef, SelectStatement};

pub mod advertiser_counts;
pub mod daily_revenue;
pub mod minute_revenue;
pub mod publisher_revenue;
pub mod purchase_average;

pub use advertiser_counts::AdvertiserCounts;
pub use daily_revenue::DailyRevenue;
pub use minute_revenue::MinuteRevenue;
pub use publisher_revenue::PublisherRevenue;
pub use purchase_average::PurchaseAverage;

/// A pure pattern-matcher from descriptor to rollup statement.
pub trait RewriteRule: Send + Sync {
    /// Rule name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Catalog entry the rule rewrites against.
    fn rollup(&self) -> &'static str;

    /// Match the descriptor against this rule's shape. `None` means the
    /// descriptor cannot be served from this rule's rollup.
    fn try_match(&self, query: &QueryDescriptor, catalog: &Catalog) -> Option<SelectStatement>;
}

/// Unordered set equality between the descriptor's grouping columns and a
/// rule's grain. GROUP BY column order doesn't change results, but a
/// superset or subset does.
pub(crate) fn grain_matches(group_by: &[String], grain: &[&str]) -> bool {
    let got: HashSet<&str> = group_by.iter().map(|column| column.as_str()).collect();
    let expected: HashSet<&str> = grain.iter().copied().collect();
    got == expected
}

/// The filter set is exactly one equality: `type = <event_type>`.
pub(crate) fn only_type_filter(query: &QueryDescriptor, event_type: &str) -> bool {
    query.filters().len() == 1 && query.filters()[0].is_text_eq("type", event_type)
}

/// How one expected aggregate is served from the rollup.
pub(crate) struct AggregateMapping {
    pub function: AggregateFunction,
    pub argument: Option<&'static str>,
    /// Replacement expression over the rollup's stored measures.
    pub expr: Expr,
    /// Output alias the caller's result columns use.
    pub alias: &'static str,
}

/// Declarative mapping from a descriptor's select list onto rollup columns.
///
/// `columns` pairs descriptor column names with rollup output columns;
/// `aggregates` pairs expected aggregate applications with their
/// measure-derived replacements.
pub(crate) struct SelectMapping {
    pub columns: Vec<(&'static str, &'static str)>,
    pub aggregates: Vec<AggregateMapping>,
}

impl SelectMapping {
    /// Translate the select list, preserving the caller's projection order.
    /// Returns `None` unless every expected item appears exactly once and
    /// nothing else does.
    pub fn map_select(&self, select: &[Projection]) -> Option<Vec<(Expr, Option<&'static str>)>> {
        if select.len() != self.columns.len() + self.aggregates.len() {
            return None;
        }

        let mut columns_used = vec![false; self.columns.len()];
        let mut aggregates_used = vec![false; self.aggregates.len()];
        let mut items = Vec::with_capacity(select.len());

        for projection in select {
            match projection {
                Projection::Column(name) => {
                    let index = self.columns.iter().position(|(column, _)| column == name)?;
                    if columns_used[index] {
                        return None;
                    }
                    columns_used[index] = true;
                    items.push((Expr::Column(self.columns[index].1.to_owned()), None));
                }
                Projection::Aggregate(call) => {
                    let index = self.aggregates.iter().position(|mapping| {
                        call.is(mapping.function, mapping.argument)
                    })?;
                    if aggregates_used[index] {
                        return None;
                    }
                    aggregates_used[index] = true;
                    let mapping = &self.aggregates[index];
                    items.push((mapping.expr.clone(), Some(mapping.alias)));
                }
            }
        }

        Some(items)
    }

    /// Re-map the caller's order-by entries onto the rollup's output:
    /// projected columns pass through, aggregate expressions become alias
    /// references. An order-by target outside the mapping disqualifies.
    pub fn map_order_by(&self, order_by: &[OrderBy]) -> Option<Vec<OrderClause>> {
        let mut clauses = Vec::with_capacity(order_by.len());

        for entry in order_by {
            let target = match entry.target() {
                OrderTarget::Column(name) => {
                    let (_, output) = self.columns.iter().find(|(column, _)| column == name)?;
                    OrderRef::Column((*output).to_owned())
                }
                OrderTarget::Aggregate(call) => {
                    let mapping = self
                        .aggregates
                        .iter()
                        .find(|mapping| call.is(mapping.function, mapping.argument))?;
                    OrderRef::Alias(mapping.alias.to_owned())
                }
            };

            clauses.push(OrderClause {
                target,
                descending: matches!(
                    entry.direction(),
                    crate::descriptor::OrderDirection::Desc
                ),
            });
        }

        Some(clauses)
    }

    /// Apply the mapped select and order-by to a statement.
    pub fn apply(
        &self,
        mut statement: SelectStatement,
        query: &QueryDescriptor,
    ) -> Option<SelectStatement> {
        for (expr, alias) in self.map_select(query.select())? {
            statement = statement.item(expr, alias);
        }

        statement = statement.order_by_all(self.map_order_by(query.order_by())?);
        Some(statement)
    }
}
