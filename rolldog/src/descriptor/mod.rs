//! Declarative query descriptor.
//!
//! Descriptors arrive as JSON and are validated at construction: unknown
//! function or operator tags, wildcard arguments outside `COUNT(*)` and
//! malformed ranges are rejected here, so the rules and the assembler never
//! probe for shape.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Deserialize;

pub mod error;

pub use error::Error;

/// Aggregate functions the benchmark queries use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Avg,
    Count,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Count => "count",
        }
    }
}

/// An aggregate application, e.g. `SUM(bid_price)` or `COUNT(*)`.
///
/// The wildcard argument is represented as `None` and is only valid
/// for `COUNT`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    function: AggregateFunction,
    column: Option<String>,
}

impl AggregateCall {
    pub fn new(function: AggregateFunction, column: Option<String>) -> Result<Self, Error> {
        if column.is_none() && function != AggregateFunction::Count {
            return Err(Error::WildcardArgument(function.as_str()));
        }

        Ok(Self { function, column })
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    /// Argument column; `None` is the `COUNT(*)` wildcard.
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Output column alias, following the execution engine's naming
    /// convention: `sum(bid_price)`, `avg(total_price)`, `count_star()`.
    pub fn output_alias(&self) -> String {
        match (&self.function, &self.column) {
            (AggregateFunction::Count, None) => "count_star()".into(),
            (function, Some(column)) => format!("{}({})", function.as_str(), column),
            // Unreachable by construction.
            (function, None) => format!("{}(*)", function.as_str()),
        }
    }

    /// The aggregate targets this exact function and column.
    pub fn is(&self, function: AggregateFunction, column: Option<&str>) -> bool {
        self.function == function && self.column.as_deref() == column
    }
}

/// One item of the select list.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Column(String),
    Aggregate(AggregateCall),
}

/// A filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Int(value) => write!(f, "{}", value),
            Scalar::Float(value) => write!(f, "{}", value),
            Scalar::Text(value) => write!(f, "{}", value),
        }
    }
}

/// A filter predicate. `Between` bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Scalar),
    Between(Scalar, Scalar),
}

/// One entry of the (unordered) filter set.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    column: String,
    predicate: Predicate,
}

impl Filter {
    pub fn new(column: String, predicate: Predicate) -> Self {
        Self { column, predicate }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// The filter is an equality on `column` with this exact text value.
    pub fn is_text_eq(&self, column: &str, value: &str) -> bool {
        self.column == column
            && matches!(&self.predicate, Predicate::Eq(Scalar::Text(text)) if text == value)
    }
}

/// What an order-by entry references: a projected column or one of the
/// projected aggregates, spelled the way the caller spelled it
/// (`"AVG(total_price)"`).
#[derive(Debug, Clone, PartialEq)]
pub enum OrderTarget {
    Column(String),
    Aggregate(AggregateCall),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    target: OrderTarget,
    direction: OrderDirection,
}

impl OrderBy {
    pub fn target(&self) -> &OrderTarget {
        &self.target
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }
}

/// Immutable, declarative representation of one analytical query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct QueryDescriptor {
    select: Vec<Projection>,
    filters: Vec<Filter>,
    group_by: Vec<String>,
    order_by: Vec<OrderBy>,
}

impl QueryDescriptor {
    pub fn new(
        select: Vec<Projection>,
        filters: Vec<Filter>,
        group_by: Vec<String>,
        order_by: Vec<OrderBy>,
    ) -> Result<Self, Error> {
        if select.is_empty() {
            return Err(Error::EmptySelect);
        }

        Ok(Self {
            select,
            filters,
            group_by,
            order_by,
        })
    }

    pub fn select(&self) -> &[Projection] {
        &self.select
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }
}

//
// Wire format.
//

#[derive(Deserialize)]
struct RawDescriptor {
    select: Vec<RawProjection>,
    #[serde(default, rename = "where")]
    filters: Vec<RawFilter>,
    #[serde(default)]
    group_by: Vec<String>,
    #[serde(default)]
    order_by: Vec<RawOrder>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProjection {
    Column(String),
    // {"SUM": "bid_price"}, {"COUNT": "*"}
    Aggregate(BTreeMap<String, String>),
}

#[derive(Deserialize)]
struct RawFilter {
    col: String,
    op: String,
    val: RawValue,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Scalar(RawScalar),
    Range(Vec<RawScalar>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Deserialize)]
struct RawOrder {
    col: String,
    #[serde(default)]
    dir: Option<String>,
}

impl From<RawScalar> for Scalar {
    fn from(raw: RawScalar) -> Self {
        match raw {
            RawScalar::Int(value) => Scalar::Int(value),
            RawScalar::Float(value) => Scalar::Float(value),
            RawScalar::Text(value) => Scalar::Text(value),
        }
    }
}

fn function_from_tag(tag: &str) -> Result<AggregateFunction, Error> {
    match tag {
        "SUM" | "sum" => Ok(AggregateFunction::Sum),
        "AVG" | "avg" => Ok(AggregateFunction::Avg),
        "COUNT" | "count" => Ok(AggregateFunction::Count),
        other => Err(Error::UnknownFunction(other.to_owned())),
    }
}

fn aggregate_from_tag(tag: &str, argument: &str) -> Result<AggregateCall, Error> {
    let function = function_from_tag(tag)?;
    let column = if argument == "*" {
        if function != AggregateFunction::Count {
            return Err(Error::WildcardArgument(function.as_str()));
        }
        None
    } else {
        Some(argument.to_owned())
    };

    AggregateCall::new(function, column)
}

impl TryFrom<RawProjection> for Projection {
    type Error = Error;

    fn try_from(raw: RawProjection) -> Result<Self, Self::Error> {
        match raw {
            RawProjection::Column(name) => Ok(Projection::Column(name)),
            RawProjection::Aggregate(map) => {
                if map.len() != 1 {
                    return Err(Error::MalformedAggregate);
                }
                let (tag, argument) = map.iter().next().ok_or(Error::MalformedAggregate)?;
                Ok(Projection::Aggregate(aggregate_from_tag(tag, argument)?))
            }
        }
    }
}

impl TryFrom<RawFilter> for Filter {
    type Error = Error;

    fn try_from(raw: RawFilter) -> Result<Self, Self::Error> {
        let predicate = match raw.op.as_str() {
            "eq" => match raw.val {
                RawValue::Scalar(scalar) => Predicate::Eq(scalar.into()),
                RawValue::Range(_) => return Err(Error::MalformedEquality(raw.col.clone())),
            },
            "between" => match raw.val {
                RawValue::Range(bounds) => match <[RawScalar; 2]>::try_from(bounds) {
                    Ok([lo, hi]) => Predicate::Between(lo.into(), hi.into()),
                    Err(_) => return Err(Error::MalformedRange(raw.col.clone())),
                },
                RawValue::Scalar(_) => return Err(Error::MalformedRange(raw.col.clone())),
            },
            other => return Err(Error::UnknownOperator(other.to_owned())),
        };

        Ok(Filter {
            column: raw.col,
            predicate,
        })
    }
}

impl TryFrom<RawOrder> for OrderBy {
    type Error = Error;

    fn try_from(raw: RawOrder) -> Result<Self, Self::Error> {
        let direction = match raw.dir.as_deref() {
            None => OrderDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => OrderDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => OrderDirection::Desc,
            Some(other) => return Err(Error::UnknownDirection(other.to_owned())),
        };

        // "AVG(total_price)" refers to the projected aggregate,
        // anything without parens to a projected column.
        let target = match raw.col.strip_suffix(')').and_then(|s| s.split_once('(')) {
            Some((tag, argument)) => OrderTarget::Aggregate(aggregate_from_tag(tag, argument)?),
            None => OrderTarget::Column(raw.col),
        };

        Ok(OrderBy { target, direction })
    }
}

impl TryFrom<RawDescriptor> for QueryDescriptor {
    type Error = Error;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        let select = raw
            .select
            .into_iter()
            .map(Projection::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let filters = raw
            .filters
            .into_iter()
            .map(Filter::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let order_by = raw
            .order_by
            .into_iter()
            .map(OrderBy::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        QueryDescriptor::new(select, filters, raw.group_by, order_by)
    }
}
