//! Fallback assembler.
//!
//! Translates any valid descriptor into an equivalent statement over the
//! full partitioned events dataset. This is the correctness baseline: a
//! rewrite rule's output must produce the same result set as the fallback
//! statement for the same descriptor, so the translation here is complete
//! and literal, with no pattern-matching.

use std::path::PathBuf;

use rolldog_config::General;

use crate::descriptor::{OrderDirection, OrderTarget, Projection, QueryDescriptor};
use crate::sql::{Expr, OrderClause, OrderRef, Relation, SelectStatement};

pub struct Assembler {
    events: PathBuf,
}

impl Assembler {
    /// Assembler over the configured partitioned events dataset.
    pub fn new(general: &General) -> Self {
        Self {
            events: general.events_path(),
        }
    }

    /// Build the scan statement for a descriptor.
    pub fn assemble(&self, query: &QueryDescriptor) -> SelectStatement {
        let mut statement = SelectStatement::new(Relation::Partitioned {
            path: self.events.clone(),
        });

        for projection in query.select() {
            statement = match projection {
                Projection::Column(name) => statement.column(name),
                Projection::Aggregate(call) => {
                    // Alias aggregates explicitly so output headers follow
                    // the engine's convention regardless of the engine's
                    // own default naming.
                    let alias = call.output_alias();
                    statement.item(
                        Expr::Aggregate {
                            function: call.function(),
                            argument: call.column().map(|column| column.to_owned()),
                        },
                        Some(&alias),
                    )
                }
            };
        }

        for filter in query.filters() {
            statement = statement.filter(filter.clone());
        }

        for column in query.group_by() {
            statement = statement.group_by(column);
        }

        for order in query.order_by() {
            let target = match order.target() {
                OrderTarget::Column(name) => OrderRef::Column(name.clone()),
                // Order by the aggregate expression itself; valid whether
                // or not the aggregate is projected.
                OrderTarget::Aggregate(call) => OrderRef::Expr(Expr::Aggregate {
                    function: call.function(),
                    argument: call.column().map(|column| column.to_owned()),
                }),
            };
            statement = statement.order_by(OrderClause {
                target,
                descending: order.direction() == OrderDirection::Desc,
            });
        }

        statement
    }
}
