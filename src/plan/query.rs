//! # Abstract Query
//!
//! The compiler never talks to a storage engine. It issues calls against
//! [`QueryBuilder`], which the caller implements over whatever query
//! technology it uses.
//!
//! [`SelectQuery`] is an in-memory implementation that records every call
//! and renders it as SQL text. It backs the CLI and the test suite.

use std::fmt;

use serde::Serialize;

use crate::spec::{FilterValue, SortDirective};

use super::errors::PlanResult;

/// Comparison operators the compiler emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    /// Equals
    #[serde(rename = "eq")]
    Eq,

    /// Pattern match (LIKE)
    #[serde(rename = "like")]
    Like,
}

impl Operator {
    /// SQL token for the operator
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Like => "LIKE",
        }
    }
}

/// A single column predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl Predicate {
    pub fn new(column: impl Into<String>, operator: Operator, value: FilterValue) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    /// `column = value`
    pub fn eq(column: impl Into<String>, value: FilterValue) -> Self {
        Self::new(column, Operator::Eq, value)
    }

    /// `column LIKE '%value%'`
    pub fn contains(column: impl Into<String>, value: &FilterValue) -> Self {
        Self::new(column, Operator::Like, value.to_contains_pattern())
    }
}

/// An ordering instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Ordered list of columns, primary key first
    Columns(Vec<SortDirective>),

    /// Expression supplied verbatim by a custom sort
    Raw(String),
}

impl Order {
    pub fn raw(expression: impl Into<String>) -> Self {
        Order::Raw(expression.into())
    }
}

/// Mutable query capability driven by the plan builders.
///
/// Each call appends to the query; nothing is ever removed. Implementations
/// may fail, and such errors propagate out of the compiler unchanged.
pub trait QueryBuilder {
    /// AND a predicate onto the query
    fn add_predicate(&mut self, predicate: Predicate) -> PlanResult<()>;

    /// AND a group of predicates joined with OR
    fn add_or_predicates(&mut self, predicates: Vec<Predicate>) -> PlanResult<()>;

    /// Append an ordering instruction
    fn order_by(&mut self, order: Order) -> PlanResult<()>;

    /// Set the row window
    fn offset_limit(&mut self, offset: i64, limit: i64) -> PlanResult<()>;

    /// Request eager loading of a relation
    fn eager_load(&mut self, relation: &str) -> PlanResult<()>;
}

/// A recorded WHERE condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    All(Predicate),
    Any(Vec<Predicate>),
}

/// In-memory [`QueryBuilder`] that records calls against one table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectQuery {
    pub table: String,
    pub conditions: Vec<Condition>,
    pub orders: Vec<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    pub preloads: Vec<String>,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Render the recorded calls as SQL text.
    ///
    /// Columns are quoted with backticks, strings with single quotes.
    /// Raw orderings are emitted as given.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM `{}`", self.table);

        if !self.conditions.is_empty() {
            let clauses: Vec<String> = self
                .conditions
                .iter()
                .map(|condition| match condition {
                    Condition::All(p) => render_predicate(p),
                    Condition::Any(group) => {
                        let parts: Vec<String> = group.iter().map(render_predicate).collect();
                        if parts.len() == 1 {
                            parts.join("")
                        } else {
                            format!("({})", parts.join(" OR "))
                        }
                    }
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if !self.orders.is_empty() {
            let terms: Vec<String> = self
                .orders
                .iter()
                .map(|order| match order {
                    Order::Columns(columns) => columns
                        .iter()
                        .map(|c| format!("`{}` {}", c.name, c.direction()))
                        .collect::<Vec<_>>()
                        .join(", "),
                    Order::Raw(expression) => expression.clone(),
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        sql
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

impl QueryBuilder for SelectQuery {
    fn add_predicate(&mut self, predicate: Predicate) -> PlanResult<()> {
        self.conditions.push(Condition::All(predicate));
        Ok(())
    }

    fn add_or_predicates(&mut self, predicates: Vec<Predicate>) -> PlanResult<()> {
        if !predicates.is_empty() {
            self.conditions.push(Condition::Any(predicates));
        }
        Ok(())
    }

    fn order_by(&mut self, order: Order) -> PlanResult<()> {
        self.orders.push(order);
        Ok(())
    }

    fn offset_limit(&mut self, offset: i64, limit: i64) -> PlanResult<()> {
        self.offset = Some(offset);
        self.limit = Some(limit);
        Ok(())
    }

    fn eager_load(&mut self, relation: &str) -> PlanResult<()> {
        self.preloads.push(relation.to_string());
        Ok(())
    }
}

fn render_predicate(predicate: &Predicate) -> String {
    format!(
        "`{}` {} {}",
        predicate.column,
        predicate.operator.as_sql(),
        render_value(&predicate.value)
    )
}

fn render_value(value: &FilterValue) -> String {
    match value {
        FilterValue::Int(n) => n.to_string(),
        FilterValue::Bool(b) => b.to_string(),
        FilterValue::Str(s) => format!("'{}'", s.replace('\'', "''")),
    }
}
