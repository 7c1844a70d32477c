//! SQL statement structure and rendering.
//!
//! Rules and the assembler build a [`SelectStatement`] describing the target
//! relation, projections, filters and ordering; the text is rendered in one
//! place, with string literals escaped and identifiers validated, so no
//! caller concatenates raw values into SQL.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::descriptor::{AggregateFunction, Filter, Predicate, Scalar};

pub mod error;

pub use error::Error;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Physical relation a statement reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// Hive-partitioned parquet dataset (partitioned by event type and day).
    Partitioned { path: PathBuf },
    /// A single parquet artifact, e.g. a rollup table.
    File { path: PathBuf },
}

impl Relation {
    fn render(&self) -> String {
        match self {
            Relation::Partitioned { path } => format!(
                "read_parquet('{}/*/*/*.parquet', hive_partitioning = 1)",
                escape_text(&path.display().to_string())
            ),
            Relation::File { path } => format!(
                "read_parquet('{}')",
                escape_text(&path.display().to_string())
            ),
        }
    }
}

/// A projected expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(String),
    Aggregate {
        function: AggregateFunction,
        /// `None` is the `COUNT(*)` wildcard.
        argument: Option<String>,
    },
    /// Ratio of two stored measures; how AVG is reconstructed from a rollup.
    Ratio {
        numerator: String,
        denominator: String,
    },
}

impl Expr {
    fn render(&self) -> Result<String, Error> {
        match self {
            Expr::Column(name) => identifier(name),
            Expr::Aggregate { function, argument } => {
                let function = match function {
                    AggregateFunction::Sum => "SUM",
                    AggregateFunction::Avg => "AVG",
                    AggregateFunction::Count => "COUNT",
                };
                match argument {
                    Some(column) => Ok(format!("{}({})", function, identifier(column)?)),
                    None => Ok(format!("{}(*)", function)),
                }
            }
            Expr::Ratio {
                numerator,
                denominator,
            } => Ok(format!(
                "{} / {}",
                identifier(numerator)?,
                identifier(denominator)?
            )),
        }
    }
}

/// A select-list item: expression plus optional output alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

/// What an ORDER BY entry references in the statement's own output.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderRef {
    /// A plain output column.
    Column(String),
    /// An aliased output column; rendered quoted since aliases like
    /// `sum(bid_price)` aren't plain identifiers.
    Alias(String),
    /// An arbitrary expression, e.g. ordering by an aggregate the
    /// statement computes itself.
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    pub target: OrderRef,
    pub descending: bool,
}

impl OrderClause {
    fn render(&self) -> Result<String, Error> {
        let target = match &self.target {
            OrderRef::Column(name) => identifier(name)?,
            OrderRef::Alias(alias) => format!("\"{}\"", escape_quoted_identifier(alias)),
            OrderRef::Expr(expr) => expr.render()?,
        };

        Ok(format!(
            "{}{}",
            target,
            if self.descending { " DESC" } else { " ASC" }
        ))
    }
}

/// A complete SELECT statement over one relation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    target: Relation,
    items: Vec<SelectItem>,
    filters: Vec<Filter>,
    group_by: Vec<String>,
    order_by: Vec<OrderClause>,
}

impl SelectStatement {
    pub fn new(target: Relation) -> Self {
        Self {
            target,
            items: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn item(mut self, expr: Expr, alias: Option<&str>) -> Self {
        self.items.push(SelectItem {
            expr,
            alias: alias.map(|a| a.to_owned()),
        });
        self
    }

    pub fn column(self, name: &str) -> Self {
        self.item(Expr::Column(name.to_owned()), None)
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(column.to_owned());
        self
    }

    pub fn order_by(mut self, clause: OrderClause) -> Self {
        self.order_by.push(clause);
        self
    }

    pub fn order_by_all(mut self, clauses: Vec<OrderClause>) -> Self {
        self.order_by.extend(clauses);
        self
    }

    pub fn items(&self) -> &[SelectItem] {
        &self.items
    }

    /// Render the statement to engine SQL.
    pub fn render(&self) -> Result<String, Error> {
        let mut select = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let expr = item.expr.render()?;
            match &item.alias {
                Some(alias) => select.push(format!(
                    "{} AS \"{}\"",
                    expr,
                    escape_quoted_identifier(alias)
                )),
                None => select.push(expr),
            }
        }

        let mut sql = format!(
            "SELECT {} FROM {}",
            select.join(", "),
            self.target.render()
        );

        if !self.filters.is_empty() {
            let filters = self
                .filters
                .iter()
                .map(render_filter)
                .collect::<Result<Vec<_>, _>>()?;
            sql.push_str(" WHERE ");
            sql.push_str(&filters.join(" AND "));
        }

        if !self.group_by.is_empty() {
            let group_by = self
                .group_by
                .iter()
                .map(|column| identifier(column))
                .collect::<Result<Vec<_>, _>>()?;
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            let order_by = self
                .order_by
                .iter()
                .map(|clause| clause.render())
                .collect::<Result<Vec<_>, _>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by.join(", "));
        }

        Ok(sql)
    }
}

fn render_filter(filter: &Filter) -> Result<String, Error> {
    let column = identifier(filter.column())?;
    Ok(match filter.predicate() {
        Predicate::Eq(value) => format!("{} = {}", column, render_scalar(value)),
        Predicate::Between(lo, hi) => format!(
            "{} BETWEEN {} AND {}",
            column,
            render_scalar(lo),
            render_scalar(hi)
        ),
    })
}

fn render_scalar(value: &Scalar) -> String {
    match value {
        Scalar::Int(value) => value.to_string(),
        Scalar::Float(value) => value.to_string(),
        Scalar::Text(value) => format!("'{}'", escape_text(value)),
    }
}

pub(crate) fn escape_text(value: &str) -> String {
    value.replace('\'', "''")
}

fn escape_quoted_identifier(value: &str) -> String {
    value.replace('"', "\"\"")
}

fn identifier(name: &str) -> Result<String, Error> {
    if IDENTIFIER.is_match(name) {
        Ok(name.to_owned())
    } else {
        Err(Error::InvalidIdentifier(name.to_owned()))
    }
}
