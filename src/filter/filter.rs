use serde_json::Value;

use crate::database::quote_identifier;
use crate::database::schema::{ColumnDef, EntitySchema};

use super::filter_order::{FilterOrder, OrderTerm};
use super::filter_where::{FilterWhere, Predicate};
use super::types::{FilterDescriptor, JoinClause, JoinType, Operator, QueryOptions, SqlResult, WhereClause};
use super::validate::{is_valid_identifier, resolve_column};

/// A query against one entity table, composed from validated fragments.
///
/// Rows are projected as one JSON object per row (`row` column) so that a restricted
/// projection still decodes into the entity, with unselected fields defaulted.
#[derive(Debug, Clone)]
pub struct SelectQuery<'s> {
    schema: &'s EntitySchema,
    projection: Vec<&'s ColumnDef>,
    joins: Vec<String>,
    predicates: Vec<Predicate<'s>>,
    group_by: Vec<&'s ColumnDef>,
    order_by: Vec<OrderTerm<'s>>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl<'s> SelectQuery<'s> {
    pub fn new(schema: &'s EntitySchema) -> Self {
        Self {
            schema,
            projection: vec![],
            joins: vec![],
            predicates: vec![],
            group_by: vec![],
            order_by: vec![],
            limit: None,
            offset: None,
        }
    }

    /// Positive limit/offset only; anything else leaves the query unbounded.
    pub fn apply_pagination(mut self, options: Option<&QueryOptions>) -> Self {
        if let Some(options) = options {
            if options.limit > 0 {
                self.limit = Some(options.limit);
            }
            if options.offset > 0 {
                self.offset = Some(options.offset);
            }
        }
        self
    }

    /// Applies a filter descriptor. Invalid elements are dropped, never reported.
    pub fn compile(mut self, filter: Option<&FilterDescriptor>) -> Self {
        let Some(filter) = filter else { return self };
        self.apply_select(&filter.select);
        self.apply_joins(&filter.joins);
        self.apply_where(&filter.where_clause);
        self.group_by.extend(FilterOrder::parse_group_by(self.schema, &filter.group_by));
        self.order_by.extend(FilterOrder::parse(self.schema, &filter.order_by));
        self
    }

    /// Restricts the query to the row with this primary key value.
    pub fn with_primary_key(mut self, id: impl Into<Value>) -> Self {
        if let Some(column) = self.schema.primary_key() {
            self.predicates.push(Predicate::Compare {
                column,
                operator: Operator::Eq,
                value: id.into(),
            });
        }
        self
    }

    fn apply_select(&mut self, select: &[String]) {
        let columns: Vec<&'s ColumnDef> = select
            .iter()
            .filter_map(|name| {
                let column = resolve_column(self.schema, name);
                if column.is_none() {
                    tracing::debug!(table = self.schema.table(), column = %name, "dropping select column: unknown column");
                }
                column
            })
            .collect();
        if !columns.is_empty() {
            self.projection = columns;
        }
    }

    fn apply_joins(&mut self, joins: &[JoinClause]) {
        for join in joins {
            match self.build_join(join) {
                Some(sql) => self.joins.push(sql),
                None => tracing::debug!(table = self.schema.table(), join = ?join, "dropping join clause"),
            }
        }
    }

    /// The entity's own key must be one of its columns; the joined side is only
    /// checked for identifier safety since its schema is unknown here.
    fn build_join(&self, join: &JoinClause) -> Option<String> {
        let join_type = JoinType::parse(&join.join_type)?;
        let left = resolve_column(self.schema, &join.left_column)?;
        if !is_valid_identifier(&join.right_column) || !is_valid_identifier(&join.table) {
            return None;
        }
        if !join.alias.is_empty() && !is_valid_identifier(&join.alias) {
            return None;
        }

        let mut sql = format!("{} {}", join_type.to_sql(), quote_identifier(&join.table));
        let target = if join.alias.is_empty() {
            &join.table
        } else {
            sql.push_str(&format!(" AS {}", quote_identifier(&join.alias)));
            &join.alias
        };
        sql.push_str(&format!(
            " ON {}.{} = {}.{}",
            quote_identifier(self.schema.table()),
            quote_identifier(&left.name),
            quote_identifier(target),
            quote_identifier(&join.right_column),
        ));
        Some(sql)
    }

    fn apply_where(&mut self, where_clause: &WhereClause) {
        for condition in &where_clause.and {
            if let Some(predicate) = FilterWhere::parse_condition(self.schema, condition) {
                self.predicates.push(predicate);
            }
        }

        let any: Vec<Predicate<'s>> = where_clause
            .or
            .iter()
            .filter_map(|condition| FilterWhere::parse_condition(self.schema, condition))
            .collect();
        if !any.is_empty() {
            self.predicates.push(Predicate::Any(any));
        }
    }

    pub fn schema(&self) -> &'s EntitySchema {
        self.schema
    }

    pub fn projection(&self) -> &[&'s ColumnDef] {
        &self.projection
    }

    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    pub fn predicates(&self) -> &[Predicate<'s>] {
        &self.predicates
    }

    pub fn group_by(&self) -> &[&'s ColumnDef] {
        &self.group_by
    }

    pub fn order_by(&self) -> &[OrderTerm<'s>] {
        &self.order_by
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    pub fn to_sql(&self) -> SqlResult {
        let table = self.schema.table();
        let (where_clause, params) = FilterWhere::generate(table, &self.predicates);

        let query = [
            format!("SELECT {} AS row", self.build_projection()),
            format!("FROM {}", quote_identifier(table)),
            self.joins.join(" "),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            FilterOrder::generate_group_by(table, &self.group_by),
            FilterOrder::generate(table, &self.order_by),
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    /// Projection, ordering and pagination do not change a count. With GROUP BY the
    /// count is the number of groups.
    pub fn to_count_sql(&self) -> SqlResult {
        let table = self.schema.table();
        let (where_clause, params) = FilterWhere::generate(table, &self.predicates);
        let group_by = FilterOrder::generate_group_by(table, &self.group_by);

        let source = [
            format!("FROM {}", quote_identifier(table)),
            self.joins.join(" "),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        let query = if group_by.is_empty() {
            format!("SELECT COUNT(*) AS count {}", source)
        } else {
            format!("SELECT COUNT(*) AS count FROM (SELECT 1 {} {}) AS grouped", source, group_by)
        };

        SqlResult { query, params }
    }

    fn build_projection(&self) -> String {
        let table = quote_identifier(self.schema.table());
        if self.projection.is_empty() {
            return format!("row_to_json({}.*)", table);
        }
        let pairs: Vec<String> = self
            .projection
            .iter()
            .map(|c| format!("'{}', {}.{}", c.name.replace('\'', "''"), table, quote_identifier(&c.name)))
            .collect();
        format!("json_build_object({})", pairs.join(", "))
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
