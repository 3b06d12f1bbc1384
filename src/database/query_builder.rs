//! Statement construction for entity writes, plus execution of compiled [`SqlResult`]s.
//!
//! Reads always project one JSON object per row (`row`); writes return the stored row the
//! same way, so decoding goes through serde in both directions.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, PgPool, Postgres, Row};
use uuid::Uuid;

use crate::database::manager::{quote_identifier, DatabaseError};
use crate::database::schema::{ColumnDef, EntitySchema, SqlType};
use crate::filter::SqlResult;

/// `INSERT` of every non-null column the caller may write.
///
/// Store-assigned columns are never written and nil UUIDs are left to the column default,
/// so the returned row carries the generated values. At least one written value must differ
/// from its zero value; an all-default entity is rejected.
pub fn insert_sql(schema: &EntitySchema, values: &Map<String, Value>) -> Result<SqlResult, DatabaseError> {
    let table = quote_identifier(schema.table());
    let mut columns = vec![];
    let mut placeholders = vec![];
    let mut params = vec![];
    let mut populated = false;

    for column in schema.columns() {
        if column.store_assigned {
            continue;
        }
        let Some(value) = writable_value(column, values) else { continue };
        if column.sql_type == SqlType::Uuid && is_zero_value(column, value) {
            continue;
        }
        populated |= !is_zero_value(column, value);
        params.push(value.clone());
        columns.push(quote_identifier(&column.name));
        placeholders.push(format!("${}::{}", params.len(), column.sql_type.as_sql()));
    }

    if !populated {
        return Err(DatabaseError::InvalidArgument(format!(
            "nothing to insert into {}",
            schema.table()
        )));
    }

    Ok(SqlResult {
        query: format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING row_to_json({}.*) AS row",
            table,
            columns.join(", "),
            placeholders.join(", "),
            table
        ),
        params,
    })
}

/// `UPDATE ... WHERE pk = $n` setting every writable column that holds a non-zero value.
/// Null and zero-valued fields (`""`, `false`, `0`, nil UUID) are left untouched, so a
/// partially filled entity only changes what it carries. This statement cannot clear a column.
pub fn update_sql(schema: &EntitySchema, id: Uuid, values: &Map<String, Value>) -> Result<SqlResult, DatabaseError> {
    let pk = primary_key(schema)?;
    if id.is_nil() {
        return Err(DatabaseError::InvalidArgument(format!(
            "{} update requires an id",
            schema.table()
        )));
    }

    let mut assignments = vec![];
    let mut touched = vec![];
    let mut params = vec![];
    for column in schema.columns() {
        if column.primary_key || column.store_assigned {
            continue;
        }
        if column.touch_on_update {
            touched.push(format!("{} = now()", quote_identifier(&column.name)));
            continue;
        }
        let Some(value) = writable_value(column, values) else { continue };
        if is_zero_value(column, value) {
            continue;
        }
        params.push(value.clone());
        assignments.push(format!(
            "{} = ${}::{}",
            quote_identifier(&column.name),
            params.len(),
            column.sql_type.as_sql()
        ));
    }

    if assignments.is_empty() {
        return Err(DatabaseError::InvalidArgument(format!(
            "nothing to update in {}",
            schema.table()
        )));
    }
    assignments.extend(touched);

    params.push(Value::String(id.to_string()));
    Ok(SqlResult {
        query: format!(
            "UPDATE {} SET {} WHERE {} = ${}::uuid",
            quote_identifier(schema.table()),
            assignments.join(", "),
            quote_identifier(&pk.name),
            params.len()
        ),
        params,
    })
}

pub fn delete_sql(schema: &EntitySchema, id: Uuid) -> Result<SqlResult, DatabaseError> {
    let pk = primary_key(schema)?;
    Ok(SqlResult {
        query: format!(
            "DELETE FROM {} WHERE {} = $1::uuid",
            quote_identifier(schema.table()),
            quote_identifier(&pk.name)
        ),
        params: vec![Value::String(id.to_string())],
    })
}

pub fn exists_sql(schema: &EntitySchema, id: Uuid) -> Result<SqlResult, DatabaseError> {
    let pk = primary_key(schema)?;
    Ok(SqlResult {
        query: format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1::uuid) AS found",
            quote_identifier(schema.table()),
            quote_identifier(&pk.name)
        ),
        params: vec![Value::String(id.to_string())],
    })
}

/// Serializes an entity into its field map. Anything other than a JSON object is rejected.
pub fn entity_values<T: serde::Serialize>(entity: &T) -> Result<Map<String, Value>, DatabaseError> {
    match serde_json::to_value(entity)? {
        Value::Object(map) if !map.is_empty() => Ok(map),
        _ => Err(DatabaseError::InvalidArgument("entity is empty".to_string())),
    }
}

/// Decodes a projected row. Columns whose name differs from the field are renamed first.
pub fn decode_row<T: DeserializeOwned>(schema: &EntitySchema, row: Value) -> Result<T, DatabaseError> {
    let row = match row {
        Value::Object(mut map) => {
            for column in schema.columns().iter().filter(|c| c.field != c.name) {
                if let Some(v) = map.remove(&column.name) {
                    map.insert(column.field.to_string(), v);
                }
            }
            Value::Object(map)
        }
        other => other,
    };
    Ok(serde_json::from_value(row)?)
}

pub async fn fetch_rows<T: DeserializeOwned>(
    pool: &PgPool,
    schema: &EntitySchema,
    sql: &SqlResult,
) -> Result<Vec<T>, DatabaseError> {
    let rows = bind_all(sqlx::query(&sql.query), &sql.params).fetch_all(pool).await?;
    rows.into_iter()
        .map(|row| decode_row(schema, row.try_get::<Value, _>("row")?))
        .collect()
}

pub async fn fetch_optional<T: DeserializeOwned>(
    pool: &PgPool,
    schema: &EntitySchema,
    sql: &SqlResult,
) -> Result<Option<T>, DatabaseError> {
    let row = bind_all(sqlx::query(&sql.query), &sql.params).fetch_optional(pool).await?;
    match row {
        Some(row) => Ok(Some(decode_row(schema, row.try_get::<Value, _>("row")?)?)),
        None => Ok(None),
    }
}

pub async fn fetch_count(pool: &PgPool, sql: &SqlResult) -> Result<i64, DatabaseError> {
    let row = bind_all(sqlx::query(&sql.query), &sql.params).fetch_one(pool).await?;
    Ok(row.try_get("count")?)
}

pub async fn fetch_exists(pool: &PgPool, sql: &SqlResult) -> Result<bool, DatabaseError> {
    let row = bind_all(sqlx::query(&sql.query), &sql.params).fetch_one(pool).await?;
    Ok(row.try_get("found")?)
}

/// Runs a write and returns the number of rows it touched.
pub async fn execute(pool: &PgPool, sql: &SqlResult) -> Result<u64, DatabaseError> {
    let result = bind_all(sqlx::query(&sql.query), &sql.params).execute(pool).await?;
    Ok(result.rows_affected())
}

fn primary_key(schema: &EntitySchema) -> Result<&ColumnDef, DatabaseError> {
    schema
        .primary_key()
        .ok_or_else(|| DatabaseError::InvalidArgument(format!("{} has no primary key", schema.table())))
}

fn writable_value<'v>(column: &ColumnDef, values: &'v Map<String, Value>) -> Option<&'v Value> {
    values.get(column.field).filter(|v| !v.is_null())
}

/// Whether `value` is what the field's `Default` serializes to.
fn is_zero_value(column: &ColumnDef, value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => match column.sql_type {
            SqlType::Uuid => Uuid::parse_str(s).map_or(s.is_empty(), |id| id.is_nil()),
            SqlType::Timestamptz => DateTime::parse_from_rfc3339(s)
                .map_or(s.is_empty(), |t| t.timestamp() == 0 && t.timestamp_subsec_nanos() == 0),
            _ => s.is_empty(),
        },
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

fn bind_all<'q>(q: PgQuery<'q>, params: &'q [Value]) -> PgQuery<'q> {
    params.iter().fold(q, bind_param)
}

/// Each placeholder carries a `::type` cast, so the bound Rust type only has to be
/// convertible to the column type on the server side.
fn bind_param<'q>(q: PgQuery<'q>, v: &'q Value) -> PgQuery<'q> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Role, User};
    use crate::database::schema::Entity;
    use serde::Deserialize;
    use serde_json::json;

    fn schema() -> EntitySchema {
        EntitySchema::builder("posts")
            .field("id", SqlType::Uuid).primary_key()
            .field("title", SqlType::Text)
            .field_as("author_id", "user_id", SqlType::Uuid)
            .field("published", SqlType::Boolean)
            .field("created_at", SqlType::Timestamptz).store_assigned()
            .field("updated_at", SqlType::Timestamptz).touch_on_update()
            .build()
    }

    fn values(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn insert_skips_nil_id_nulls_and_store_assigned() {
        let sql = insert_sql(
            &schema(),
            &values(json!({
                "id": Uuid::nil(),
                "title": "Hello",
                "author_id": null,
                "published": false,
                "created_at": "2024-01-01T00:00:00Z",
            })),
        )
        .unwrap();
        assert_eq!(
            sql.query,
            r#"INSERT INTO "posts" ("title", "published") VALUES ($1::text, $2::boolean) RETURNING row_to_json("posts".*) AS row"#
        );
        assert_eq!(sql.params, vec![json!("Hello"), json!(false)]);
    }

    #[test]
    fn insert_writes_explicit_id_under_column_name() {
        let id = Uuid::new_v4();
        let author = Uuid::new_v4();
        let sql = insert_sql(&schema(), &values(json!({"id": id, "author_id": author}))).unwrap();
        assert_eq!(
            sql.query,
            r#"INSERT INTO "posts" ("id", "user_id") VALUES ($1::uuid, $2::uuid) RETURNING row_to_json("posts".*) AS row"#
        );
    }

    #[test]
    fn insert_of_nothing_is_invalid() {
        let err = insert_sql(&schema(), &values(json!({"id": Uuid::nil()}))).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)));
    }

    #[test]
    fn update_touches_timestamps_and_binds_id_last() {
        let id = Uuid::new_v4();
        let sql = update_sql(&schema(), id, &values(json!({"id": id, "title": "New", "published": null}))).unwrap();
        assert_eq!(
            sql.query,
            r#"UPDATE "posts" SET "title" = $1::text, "updated_at" = now() WHERE "id" = $2::uuid"#
        );
        assert_eq!(sql.params, vec![json!("New"), json!(id.to_string())]);
    }

    #[test]
    fn default_entity_has_nothing_to_insert() {
        let values = entity_values(&Role::default()).unwrap();
        let err = insert_sql(Role::schema(), &values).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)), "got {:?}", err);

        let named = entity_values(&Role { name: "admin".into(), ..Default::default() }).unwrap();
        let sql = insert_sql(Role::schema(), &named).unwrap();
        assert_eq!(sql.params, vec![json!("admin")]);
    }

    #[test]
    fn partial_update_leaves_zero_fields_alone() {
        let id = Uuid::new_v4();
        let partial = User { id, email: "new@x.io".into(), ..Default::default() };
        let sql = update_sql(User::schema(), id, &entity_values(&partial).unwrap()).unwrap();
        assert_eq!(
            sql.query,
            r#"UPDATE "users" SET "email" = $1::text, "updated_at" = now() WHERE "id" = $2::uuid"#
        );
        assert!(!sql.query.contains("\"password\""));
        assert!(!sql.query.contains("\"is_active\""));
        assert_eq!(sql.params, vec![json!("new@x.io"), json!(id.to_string())]);
    }

    #[test]
    fn update_with_only_defaults_is_invalid() {
        let id = Uuid::new_v4();
        let values = entity_values(&User { id, ..Default::default() }).unwrap();
        assert!(matches!(update_sql(User::schema(), id, &values), Err(DatabaseError::InvalidArgument(_))));
    }

    #[test]
    fn update_requires_an_id() {
        let err = update_sql(&schema(), Uuid::nil(), &values(json!({"title": "x"}))).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)));
    }

    #[test]
    fn delete_and_exists_target_primary_key() {
        let id = Uuid::new_v4();
        assert_eq!(delete_sql(&schema(), id).unwrap().query, r#"DELETE FROM "posts" WHERE "id" = $1::uuid"#);
        assert_eq!(
            exists_sql(&schema(), id).unwrap().query,
            r#"SELECT EXISTS(SELECT 1 FROM "posts" WHERE "id" = $1::uuid) AS found"#
        );
    }

    #[test]
    fn keyless_schema_cannot_address_rows() {
        let keyless = EntitySchema::builder("logs").field("line", SqlType::Text).build();
        assert!(matches!(delete_sql(&keyless, Uuid::new_v4()), Err(DatabaseError::InvalidArgument(_))));
    }

    #[test]
    fn decode_renames_overridden_columns() {
        #[derive(Deserialize, Default)]
        #[serde(default)]
        struct Row {
            title: String,
            author_id: Option<Uuid>,
        }
        let author = Uuid::new_v4();
        let row: Row = decode_row(&schema(), json!({"title": "T", "user_id": author})).unwrap();
        assert_eq!(row.title, "T");
        assert_eq!(row.author_id, Some(author));

        let partial: Row = decode_row(&schema(), json!({"title": "only"})).unwrap();
        assert_eq!(partial.author_id, None);
    }

    #[test]
    fn empty_or_non_object_entities_are_rejected() {
        #[derive(serde::Serialize)]
        struct Empty {}
        assert!(matches!(entity_values(&Empty {}), Err(DatabaseError::InvalidArgument(_))));
        assert!(matches!(entity_values(&42), Err(DatabaseError::InvalidArgument(_))));
    }
}
