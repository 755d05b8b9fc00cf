//! Filter expression tree.
//!
//! A filter is a [`CompositeExpression`] (AND / OR) whose parts are either
//! leaf [`Expression`]s or further composites.
//!
//! # Example
//!
//! ```ignore
//! use restmap_orm::query::*;
//!
//! let filter = and([
//!     Node::from(eq("status", "active")),
//!     in_("role", ["admin", "owner"]).into(),
//! ]);
//! assert_eq!(eq("status", "active").to_query_string(), "active");
//! assert_eq!(gt("age", 21).to_query_string(), "gt:21");
//! ```

use {
    restmap_client::value_to_param,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::{fmt, str::FromStr},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Neq,
    In,
    #[serde(rename = "nin")]
    NotIn,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::In => "in",
            Operator::NotIn => "nin",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Like => "like",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    /// Accepts both the wire names and the usual symbols.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" | "==" => Operator::Eq,
            "neq" | "!=" | "<>" => Operator::Neq,
            "in" => Operator::In,
            "nin" | "not in" | "notin" => Operator::NotIn,
            "lt" | "<" => Operator::Lt,
            "lte" | "<=" => Operator::Lte,
            "gt" | ">" => Operator::Gt,
            "gte" | ">=" => Operator::Gte,
            "like" => Operator::Like,
            other => return Err(format!("unknown operator `{other}`")),
        })
    }
}

/// A single `field <op> value` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    field: String,
    operator: Operator,
    value: Value,
}

impl Expression {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The value alone; sequences are comma-joined.
    pub fn value_as_string(&self) -> String {
        value_to_param(&self.value)
    }

    /// Wire form: the bare value for EQ, `op:value` for everything else.
    pub fn to_query_string(&self) -> String {
        match self.operator {
            Operator::Eq => self.value_as_string(),
            op => format!("{}:{}", op, self.value_as_string()),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompositeKind {
    And,
    Or,
}

impl fmt::Display for CompositeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompositeKind::And => "AND",
            CompositeKind::Or => "OR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Expr(Expression),
    Composite(CompositeExpression),
}

impl From<Expression> for Node {
    fn from(expr: Expression) -> Self {
        Node::Expr(expr)
    }
}

impl From<CompositeExpression> for Node {
    fn from(composite: CompositeExpression) -> Self {
        Node::Composite(composite)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeExpression {
    kind: CompositeKind,
    parts: Vec<Node>,
}

impl CompositeExpression {
    pub fn new<I, N>(kind: CompositeKind, parts: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self {
            kind,
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and<I, N>(parts: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self::new(CompositeKind::And, parts)
    }

    pub fn or<I, N>(parts: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self::new(CompositeKind::Or, parts)
    }

    pub fn kind(&self) -> CompositeKind {
        self.kind
    }

    pub fn is_and(&self) -> bool {
        self.kind == CompositeKind::And
    }

    pub fn is_or(&self) -> bool {
        self.kind == CompositeKind::Or
    }

    pub fn parts(&self) -> &[Node] {
        &self.parts
    }

    pub fn push(&mut self, part: impl Into<Node>) {
        self.parts.push(part.into());
    }

    pub fn with(mut self, part: impl Into<Node>) -> Self {
        self.push(part);
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Every leaf expression, depth first.
    pub fn leaves(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }
}

fn collect_leaves<'a>(composite: &'a CompositeExpression, out: &mut Vec<&'a Expression>) {
    for part in &composite.parts {
        match part {
            Node::Expr(expr) => out.push(expr),
            Node::Composite(nested) => collect_leaves(nested, out),
        }
    }
}

// ============================================================================
// Builder functions
// ============================================================================

pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Expression {
    Expression::new(field, Operator::Eq, value)
}

pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Expression {
    Expression::new(field, Operator::Neq, value)
}

pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Expression {
    Expression::new(field, Operator::Lt, value)
}

pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Expression {
    Expression::new(field, Operator::Lte, value)
}

pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Expression {
    Expression::new(field, Operator::Gt, value)
}

pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Expression {
    Expression::new(field, Operator::Gte, value)
}

pub fn like(field: impl Into<String>, value: impl Into<Value>) -> Expression {
    Expression::new(field, Operator::Like, value)
}

pub fn in_<I, V>(field: impl Into<String>, values: I) -> Expression
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Expression::new(
        field,
        Operator::In,
        Value::Array(values.into_iter().map(Into::into).collect()),
    )
}

pub fn not_in<I, V>(field: impl Into<String>, values: I) -> Expression
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Expression::new(
        field,
        Operator::NotIn,
        Value::Array(values.into_iter().map(Into::into).collect()),
    )
}

pub fn and<I, N>(parts: I) -> CompositeExpression
where
    I: IntoIterator<Item = N>,
    N: Into<Node>,
{
    CompositeExpression::and(parts)
}

pub fn or<I, N>(parts: I) -> CompositeExpression
where
    I: IntoIterator<Item = N>,
    N: Into<Node>,
{
    CompositeExpression::or(parts)
}
