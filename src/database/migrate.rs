//! Idempotent table bootstrap for the built-in entities.

use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "roles",
        r#"CREATE TABLE IF NOT EXISTS "roles" (
            "id" uuid PRIMARY KEY DEFAULT gen_random_uuid(),
            "name" varchar(32) NOT NULL UNIQUE
        )"#,
    ),
    (
        "users",
        r#"CREATE TABLE IF NOT EXISTS "users" (
            "id" uuid PRIMARY KEY DEFAULT gen_random_uuid(),
            "role_id" uuid REFERENCES "roles" ("id") ON DELETE SET NULL,
            "first_name" varchar(32) NOT NULL DEFAULT '',
            "last_name" varchar(32) NOT NULL DEFAULT '',
            "email" text NOT NULL UNIQUE,
            "password" text NOT NULL DEFAULT '',
            "phone" text NOT NULL UNIQUE,
            "is_active" boolean NOT NULL DEFAULT false,
            "created_at" timestamptz NOT NULL DEFAULT now(),
            "updated_at" timestamptz
        )"#,
    ),
    (
        "posts",
        r#"CREATE TABLE IF NOT EXISTS "posts" (
            "id" uuid PRIMARY KEY DEFAULT gen_random_uuid(),
            "title" varchar(255) NOT NULL,
            "content" text NOT NULL DEFAULT '',
            "published" boolean NOT NULL DEFAULT false,
            "created_at" timestamptz NOT NULL DEFAULT now(),
            "updated_at" timestamptz,
            "user_id" uuid NOT NULL REFERENCES "users" ("id") ON DELETE CASCADE
        )"#,
    ),
    (
        "organizations",
        r#"CREATE TABLE IF NOT EXISTS "organizations" (
            "id" uuid PRIMARY KEY DEFAULT gen_random_uuid(),
            "name" text NOT NULL,
            "slug" text NOT NULL UNIQUE,
            "created_at" timestamptz NOT NULL DEFAULT now(),
            "updated_at" timestamptz
        )"#,
    ),
    (
        "projects",
        r#"CREATE TABLE IF NOT EXISTS "projects" (
            "id" uuid PRIMARY KEY DEFAULT gen_random_uuid(),
            "organization_id" uuid NOT NULL REFERENCES "organizations" ("id") ON DELETE CASCADE,
            "name" text NOT NULL,
            "description" text,
            "created_at" timestamptz NOT NULL DEFAULT now(),
            "updated_at" timestamptz
        )"#,
    ),
];

/// Creates any missing table. Safe to run on every start.
pub async fn run(pool: &PgPool) -> Result<(), DatabaseError> {
    for (table, ddl) in STATEMENTS {
        sqlx::query(ddl).execute(pool).await?;
        info!(table, "ensured table");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Organization, Post, Project, Role, User};
    use crate::database::schema::{Entity, EntitySchema};

    fn assert_ddl_covers(schema: &EntitySchema) {
        let (_, ddl) = STATEMENTS
            .iter()
            .find(|(t, _)| *t == schema.table())
            .unwrap_or_else(|| panic!("no DDL for {}", schema.table()));
        for name in schema.column_names() {
            assert!(ddl.contains(&format!("\"{}\"", name)), "{} missing {}", schema.table(), name);
        }
    }

    #[test]
    fn every_entity_column_has_a_table_column() {
        assert_ddl_covers(User::schema());
        assert_ddl_covers(Role::schema());
        assert_ddl_covers(Post::schema());
        assert_ddl_covers(Organization::schema());
        assert_ddl_covers(Project::schema());
    }

    #[test]
    fn referenced_tables_come_first() {
        let order: Vec<&str> = STATEMENTS.iter().map(|(t, _)| *t).collect();
        let pos = |t: &str| order.iter().position(|x| *x == t).unwrap();
        assert!(pos("roles") < pos("users"));
        assert!(pos("users") < pos("posts"));
        assert!(pos("organizations") < pos("projects"));
    }
}
