use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::FilterError;

/// Client-supplied selection, joins, grouping and ordering for one query.
///
/// Wire shape:
/// ```json
/// {
///   "select": ["col"],
///   "where": {"and": [{"column": "", "operator": "", "value": 1}], "or": []},
///   "joins": [{"table": "", "alias": "", "left_column": "", "right_column": "", "join_type": ""}],
///   "group_by": ["col"],
///   "order_by": [{"column": "", "direction": ""}]
/// }
/// ```
/// Missing or `null` members decode to their empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDescriptor {
    #[serde(deserialize_with = "null_as_default")]
    pub select: Vec<String>,
    #[serde(rename = "where", deserialize_with = "null_as_default")]
    pub where_clause: WhereClause,
    #[serde(deserialize_with = "null_as_default")]
    pub joins: Vec<JoinClause>,
    #[serde(deserialize_with = "null_as_default")]
    pub group_by: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub order_by: Vec<OrderByClause>,
}

impl FilterDescriptor {
    /// Decodes the `filter` query parameter. Empty input means "no filter".
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// Single equality condition, for services building fixed queries.
    pub fn where_eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            where_clause: WhereClause {
                and: vec![WhereCondition::new(column, "=", value)],
                or: vec![],
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhereClause {
    #[serde(deserialize_with = "null_as_default")]
    pub and: Vec<WhereCondition>,
    #[serde(deserialize_with = "null_as_default")]
    pub or: Vec<WhereCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhereCondition {
    #[serde(deserialize_with = "null_as_default")]
    pub column: String,
    /// One of `=, >, <, >=, <=, LIKE, IN, IS NULL`
    #[serde(deserialize_with = "null_as_default")]
    pub operator: String,
    pub value: Value,
}

impl WhereCondition {
    pub fn new(column: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinClause {
    #[serde(deserialize_with = "null_as_default")]
    pub table: String,
    #[serde(deserialize_with = "null_as_default")]
    pub alias: String,
    #[serde(deserialize_with = "null_as_default")]
    pub left_column: String,
    #[serde(deserialize_with = "null_as_default")]
    pub right_column: String,
    /// INNER JOIN, LEFT JOIN, RIGHT JOIN
    #[serde(deserialize_with = "null_as_default")]
    pub join_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderByClause {
    #[serde(deserialize_with = "null_as_default")]
    pub column: String,
    /// ASC or DESC
    #[serde(deserialize_with = "null_as_default")]
    pub direction: String,
}

/// Pagination. A non-positive value means "unbounded" / "no offset".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    In,
    IsNull,
}

impl Operator {
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw.trim().to_uppercase().as_str() {
            "=" => Operator::Eq,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            "LIKE" => Operator::Like,
            "IN" => Operator::In,
            "IS NULL" => Operator::IsNull,
            _ => return None,
        })
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::IsNull => "IS NULL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl JoinType {
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw.trim().to_uppercase().as_str() {
            "INNER JOIN" => JoinType::Inner,
            "LEFT JOIN" => JoinType::Left,
            "RIGHT JOIN" => JoinType::Right,
            _ => return None,
        })
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "ASC" => Some(SortDirection::Asc),
            "DESC" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Query text plus the values bound to `$1..$n`, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
