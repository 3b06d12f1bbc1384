use crate::database::quote_identifier;
use crate::database::schema::{ColumnDef, EntitySchema};

use super::types::{OrderByClause, SortDirection};
use super::validate::resolve_column;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm<'s> {
    pub column: &'s ColumnDef,
    pub sort: SortDirection,
}

pub struct FilterOrder;

impl FilterOrder {
    /// Entries with unknown columns are dropped; an invalid or missing direction becomes ASC.
    pub fn parse<'s>(schema: &'s EntitySchema, clauses: &[OrderByClause]) -> Vec<OrderTerm<'s>> {
        clauses
            .iter()
            .filter_map(|clause| {
                let Some(column) = resolve_column(schema, &clause.column) else {
                    tracing::debug!(table = schema.table(), column = %clause.column, "dropping order by: unknown column");
                    return None;
                };
                let sort = SortDirection::parse(&clause.direction).unwrap_or_default();
                Some(OrderTerm { column, sort })
            })
            .collect()
    }

    pub fn parse_group_by<'s>(schema: &'s EntitySchema, columns: &[String]) -> Vec<&'s ColumnDef> {
        columns
            .iter()
            .filter_map(|name| {
                let column = resolve_column(schema, name);
                if column.is_none() {
                    tracing::debug!(table = schema.table(), column = %name, "dropping group by: unknown column");
                }
                column
            })
            .collect()
    }

    pub fn generate(table: &str, terms: &[OrderTerm<'_>]) -> String {
        if terms.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = terms
            .iter()
            .map(|t| format!("{}.{} {}", quote_identifier(table), quote_identifier(&t.column.name), t.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    pub fn generate_group_by(table: &str, columns: &[&ColumnDef]) -> String {
        if columns.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = columns
            .iter()
            .map(|c| format!("{}.{}", quote_identifier(table), quote_identifier(&c.name)))
            .collect();
        format!("GROUP BY {}", parts.join(", "))
    }
}
