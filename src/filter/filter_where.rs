use serde_json::Value;

use crate::database::quote_identifier;
use crate::database::schema::{ColumnDef, EntitySchema, SqlType};

use super::types::{Operator, WhereCondition};
use super::validate::resolve_column;

/// A validated WHERE term. Columns always point into the entity schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<'s> {
    Compare {
        column: &'s ColumnDef,
        operator: Operator,
        value: Value,
    },
    In {
        column: &'s ColumnDef,
        values: Vec<Value>,
    },
    IsNull {
        column: &'s ColumnDef,
    },
    /// Disjunction of its members, rendered as one parenthesized term.
    Any(Vec<Predicate<'s>>),
}

pub struct FilterWhere<'a> {
    table: &'a str,
    param_values: Vec<Value>,
}

impl<'a> FilterWhere<'a> {
    /// Validates one condition; `None` means it is dropped.
    pub fn parse_condition<'s>(schema: &'s EntitySchema, condition: &WhereCondition) -> Option<Predicate<'s>> {
        let Some(column) = resolve_column(schema, &condition.column) else {
            tracing::debug!(table = schema.table(), column = %condition.column, "dropping where condition: unknown column");
            return None;
        };
        let Some(operator) = Operator::parse(&condition.operator) else {
            tracing::debug!(table = schema.table(), operator = %condition.operator, "dropping where condition: operator not allowed");
            return None;
        };

        Some(match operator {
            Operator::IsNull => Predicate::IsNull { column },
            Operator::In => {
                let values = match &condition.value {
                    Value::Array(items) => items.clone(),
                    other => vec![other.clone()],
                };
                Predicate::In { column, values }
            }
            _ => Predicate::Compare {
                column,
                operator,
                value: condition.value.clone(),
            },
        })
    }

    /// Renders the predicates joined by AND. Returns an empty string when there are none.
    pub fn generate(table: &'a str, predicates: &[Predicate<'_>]) -> (String, Vec<Value>) {
        let mut filter_where = Self {
            table,
            param_values: vec![],
        };
        let parts: Vec<String> = predicates.iter().map(|p| filter_where.build(p)).collect();
        (parts.join(" AND "), filter_where.param_values)
    }

    fn build(&mut self, predicate: &Predicate<'_>) -> String {
        match predicate {
            Predicate::IsNull { column } => format!("{} IS NULL", self.column(column)),
            Predicate::In { column, values } => {
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let quoted = self.column(column);
                let params: Vec<String> = values
                    .iter()
                    .map(|v| self.param(v.clone(), column.sql_type))
                    .collect();
                format!("{} IN ({})", quoted, params.join(", "))
            }
            Predicate::Compare { column, operator, value } => {
                let quoted = self.column(column);
                let param = self.param(value.clone(), column.sql_type);
                format!("{} {} {}", quoted, operator.to_sql(), param)
            }
            Predicate::Any(members) => {
                let parts: Vec<String> = members.iter().map(|m| self.build(m)).collect();
                format!("({})", parts.join(" OR "))
            }
        }
    }

    fn column(&self, column: &ColumnDef) -> String {
        format!("{}.{}", quote_identifier(self.table), quote_identifier(&column.name))
    }

    fn param(&mut self, value: Value, sql_type: SqlType) -> String {
        self.param_values.push(value);
        format!("${}::{}", self.param_values.len(), sql_type.as_sql())
    }
}
