//! Allowlist checks applied to every element of a filter descriptor.
//!
//! All predicates are total: anything ambiguous is rejected, never corrected.

use crate::database::schema::{ColumnDef, EntitySchema};

use super::types::{JoinType, Operator, SortDirection};

/// Resolves a client-supplied column name to the entity's column.
/// Table-qualified names (`users.email`) are rejected even when the tail exists.
pub fn resolve_column<'s>(schema: &'s EntitySchema, name: &str) -> Option<&'s ColumnDef> {
    let normalized = name.trim().to_lowercase();
    if normalized.contains('.') {
        return None;
    }
    schema.column(&normalized)
}

pub fn is_valid_column(schema: &EntitySchema, name: &str) -> bool {
    resolve_column(schema, name).is_some()
}

pub fn is_valid_operator(op: &str) -> bool {
    Operator::parse(op).is_some()
}

pub fn is_valid_join_type(join_type: &str) -> bool {
    JoinType::parse(join_type).is_some()
}

pub fn is_valid_sort_direction(direction: &str) -> bool {
    SortDirection::parse(direction).is_some()
}

/// Non-empty and only ASCII letters, digits and underscores.
/// Guards join table/alias/foreign column names, which are not checked against any schema.
pub fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::SqlType;

    fn schema() -> EntitySchema {
        EntitySchema::builder("users")
            .field("id", SqlType::Uuid).primary_key()
            .field("email", SqlType::Text)
            .field("CreatedAt", SqlType::Timestamptz)
            .build()
    }

    #[test]
    fn column_matching_ignores_case_and_whitespace() {
        let s = schema();
        for name in ["email", "EMAIL", "  Email ", "created_at", "CREATED_AT\t"] {
            assert!(is_valid_column(&s, name), "{name:?} should be valid");
        }
        assert_eq!(resolve_column(&s, " ID ").map(|c| c.name.as_str()), Some("id"));
    }

    #[test]
    fn qualified_names_are_rejected() {
        let s = schema();
        assert!(!is_valid_column(&s, "users.email"));
        assert!(!is_valid_column(&s, ".email"));
        assert!(!is_valid_column(&s, "email."));
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let s = schema();
        assert!(!is_valid_column(&s, "secret"));
        assert!(!is_valid_column(&s, ""));
        assert!(!is_valid_column(&s, "email; DROP TABLE users"));
        assert!(!is_valid_column(&s, "createdat"));
    }

    #[test]
    fn fixed_allowlists() {
        for op in ["=", ">", "<", ">=", "<=", "like", "IN", " is null "] {
            assert!(is_valid_operator(op), "{op:?}");
        }
        for op in ["!=", "<>", "ILIKE", "NOT IN", "", "= 1 OR 1=1"] {
            assert!(!is_valid_operator(op), "{op:?}");
        }
        assert!(is_valid_join_type("inner join"));
        assert!(is_valid_join_type(" RIGHT JOIN "));
        assert!(!is_valid_join_type("CROSS JOIN"));
        assert!(!is_valid_join_type("JOIN"));
        assert!(is_valid_sort_direction("asc"));
        assert!(!is_valid_sort_direction("ascending"));
    }

    #[test]
    fn identifiers_are_bare_ascii() {
        assert!(is_valid_identifier("roles"));
        assert!(is_valid_identifier("_r2"));
        assert!(is_valid_identifier("2fa"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("public.roles"));
        assert!(!is_valid_identifier("roles r"));
        assert!(!is_valid_identifier("roles\""));
        assert!(!is_valid_identifier("rôles"));
    }
}
