//! Static column tables for persisted entities.
//!
//! Every entity registers one [`EntitySchema`] (built once, on first use) listing its
//! addressable columns in declaration order. Relation fields are declared too but never
//! become columns, so the filter compiler can't address them.

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

/// PostgreSQL type a column is stored as. Bound parameters are cast to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Uuid,
    Text,
    Boolean,
    Integer,
    BigInt,
    Timestamptz,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Uuid => "uuid",
            SqlType::Text => "text",
            SqlType::Boolean => "boolean",
            SqlType::Integer => "integer",
            SqlType::BigInt => "bigint",
            SqlType::Timestamptz => "timestamptz",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Serialized field name on the entity struct.
    pub field: &'static str,
    /// Logical column name, already normalized (trimmed, lowercase).
    pub name: String,
    pub sql_type: SqlType,
    pub primary_key: bool,
    /// Never written by INSERT; the store fills it (e.g. `created_at DEFAULT now()`).
    pub store_assigned: bool,
    /// Set to `now()` on every UPDATE.
    pub touch_on_update: bool,
}

#[derive(Debug, Clone)]
pub struct EntitySchema {
    table: &'static str,
    columns: Vec<ColumnDef>,
    relations: Vec<&'static str>,
}

impl EntitySchema {
    pub fn builder(table: &'static str) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            table,
            columns: vec![],
            relations: vec![],
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Addressable columns in declaration order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Exact lookup by normalized column name.
    pub fn column(&self, normalized: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == normalized)
    }

    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }

    pub fn relations(&self) -> &[&'static str] {
        &self.relations
    }
}

pub struct EntitySchemaBuilder {
    table: &'static str,
    columns: Vec<ColumnDef>,
    relations: Vec<&'static str>,
}

impl EntitySchemaBuilder {
    /// Column named after the field by convention (`CreatedAt` -> `created_at`).
    pub fn field(self, field: &'static str, sql_type: SqlType) -> Self {
        let name = to_snake_case(field);
        self.push(field, name, sql_type)
    }

    /// Column with an explicit name that overrides the convention.
    pub fn field_as(self, field: &'static str, column: &'static str, sql_type: SqlType) -> Self {
        let name = column.trim().to_lowercase();
        self.push(field, name, sql_type)
    }

    /// Nested entity loaded through a join; not a column.
    pub fn relation(mut self, field: &'static str) -> Self {
        self.relations.push(field);
        self
    }

    pub fn primary_key(self) -> Self {
        self.modify_last(|c| c.primary_key = true)
    }

    pub fn store_assigned(self) -> Self {
        self.modify_last(|c| c.store_assigned = true)
    }

    pub fn touch_on_update(self) -> Self {
        self.modify_last(|c| c.touch_on_update = true)
    }

    pub fn build(self) -> EntitySchema {
        EntitySchema {
            table: self.table,
            columns: self.columns,
            relations: self.relations,
        }
    }

    fn push(mut self, field: &'static str, name: String, sql_type: SqlType) -> Self {
        self.columns.push(ColumnDef {
            field,
            name,
            sql_type,
            primary_key: false,
            store_assigned: false,
            touch_on_update: false,
        });
        self
    }

    fn modify_last(mut self, f: impl FnOnce(&mut ColumnDef)) -> Self {
        if let Some(last) = self.columns.last_mut() {
            f(last);
        }
        self
    }
}

/// A persisted type with a registered column table.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    fn schema() -> &'static EntitySchema;

    fn id(&self) -> Uuid;
}

/// Lowercases and separates words at case boundaries.
/// An uppercase run is kept together as one word: `UserID` -> `user_id`, `HTTPServer` -> `http_server`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EntitySchema {
        EntitySchema::builder("accounts")
            .field("ID", SqlType::Uuid).primary_key()
            .field("Email", SqlType::Text)
            .field_as("OwnerRef", " Owner_ID ", SqlType::Uuid)
            .field("CreatedAt", SqlType::Timestamptz).store_assigned()
            .relation("Owner")
            .build()
    }

    #[test]
    fn snake_case_follows_case_boundaries() {
        assert_eq!(to_snake_case("CreatedAt"), "created_at");
        assert_eq!(to_snake_case("ID"), "id");
        assert_eq!(to_snake_case("UserID"), "user_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("Field2Name"), "field2_name");
    }

    #[test]
    fn columns_keep_declaration_order_and_skip_relations() {
        let schema = sample();
        assert_eq!(schema.column_names(), vec!["id", "email", "owner_id", "created_at"]);
        assert!(schema.column("owner").is_none());
        assert_eq!(schema.relations(), &["Owner"]);
    }

    #[test]
    fn explicit_name_overrides_convention() {
        let schema = sample();
        let col = schema.column("owner_id").unwrap();
        assert_eq!(col.field, "OwnerRef");
        assert!(schema.column("owner_ref").is_none());
    }

    #[test]
    fn flags_apply_to_last_field() {
        let schema = sample();
        assert_eq!(schema.primary_key().map(|c| c.name.as_str()), Some("id"));
        assert!(schema.column("created_at").unwrap().store_assigned);
        assert!(!schema.column("email").unwrap().store_assigned);
    }

    #[test]
    fn empty_entity_has_no_columns() {
        let schema = EntitySchema::builder("empty").build();
        assert!(schema.columns().is_empty());
        assert!(schema.primary_key().is_none());
    }
}
