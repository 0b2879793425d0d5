// ============================================================
// METADATA REPOSITORY
// ============================================================
// Key/value store persisted per project so a session can be rebuilt
// when the project is reopened. Per-column value types live under
// numeric keys and restore in column order regardless of insertion
// order of the other keys.

use crate::domain::error::{AppError, Result};
use crate::domain::session::ImportSession;
use sqlx::SqlitePool;
use tracing::info;

pub async fn init(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create metadata table: {}", e)))?;
    Ok(())
}

pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO metadata (key, value) VALUES (?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to write metadata: {}", e)))?;
    Ok(())
}

pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM metadata WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to read metadata: {}", e)))?;
    Ok(row.map(|(value,)| value))
}

/// All entries, canonically ordered: numeric keys (the per-column value
/// types) first in numeric order, then the remaining keys alphabetically.
pub async fn load_entries(pool: &SqlitePool) -> Result<Vec<(String, String)>> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM metadata")
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to read metadata: {}", e)))?;

    let (mut columns, mut general): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|(key, _)| key.parse::<usize>().is_ok());
    columns.sort_by_key(|(key, _)| key.parse::<usize>().unwrap_or(usize::MAX));
    general.sort_by(|a, b| a.0.cmp(&b.0));
    columns.extend(general);
    Ok(columns)
}

/// Per-column value type names in column order.
pub async fn column_types(pool: &SqlitePool) -> Result<Vec<String>> {
    Ok(load_entries(pool)
        .await?
        .into_iter()
        .take_while(|(key, _)| key.parse::<usize>().is_ok())
        .map(|(_, value)| value)
        .collect())
}

/// Persist the whole session, custom types and constraints included.
/// Every key is upserted, so re-saving after staged edits overwrites the
/// previous state.
pub async fn save_session(pool: &SqlitePool, session: &ImportSession) -> Result<()> {
    init(pool).await?;
    for (index, type_name) in session.value_types.iter().enumerate() {
        set(pool, &index.to_string(), type_name).await?;
    }
    set(pool, "projectName", &session.project_name).await?;
    set(pool, "fileName", &session.file_name).await?;
    set(pool, "url", &session.url).await?;
    set(pool, "encoding", &session.encoding).await?;
    set(pool, "commentLines", &session.comment_lines.to_string()).await?;
    set(pool, "delimiter", &session.delimiter).await?;
    set(pool, "enclosing", &session.enclosing).await?;
    set(pool, "database", &session.database).await?;
    set(pool, "table", &session.table).await?;
    set(pool, "header", &to_json(&session.header)?).await?;
    set(pool, "colsToDelete", &to_json(&session.cols_to_delete)?).await?;
    set(pool, "rowsToDelete", &to_json(&session.rows_to_delete)?).await?;
    set(pool, "createdValueTypes", &to_json(&session.created_value_types)?).await?;
    set(
        pool,
        "createdConstraints",
        &to_json(&session.created_constraints)?,
    )
    .await?;
    info!(project = %session.project_name, "session metadata saved");
    Ok(())
}

/// Rebuild a fresh session from the metadata store. The returned session
/// starts from `ImportSession::new`, so nothing from a previously open
/// project can leak in.
pub async fn load_session(pool: &SqlitePool) -> Result<ImportSession> {
    let mut session = ImportSession::new();

    session.value_types = column_types(pool).await?;
    session.project_name = get(pool, "projectName").await?.unwrap_or_default();
    session.file_name = get(pool, "fileName").await?.unwrap_or_default();
    session.url = get(pool, "url").await?.unwrap_or_default();
    session.encoding = get(pool, "encoding").await?.unwrap_or_default();
    session.comment_lines = get(pool, "commentLines")
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    session.delimiter = get(pool, "delimiter").await?.unwrap_or_default();
    session.enclosing = get(pool, "enclosing").await?.unwrap_or_default();
    session.database = get(pool, "database").await?.unwrap_or_default();
    session.table = get(pool, "table").await?.unwrap_or_default();
    if let Some(raw) = get(pool, "header").await? {
        session.header = from_json(&raw)?;
    }
    if let Some(raw) = get(pool, "colsToDelete").await? {
        session.cols_to_delete = from_json(&raw)?;
    }
    if let Some(raw) = get(pool, "rowsToDelete").await? {
        session.rows_to_delete = from_json(&raw)?;
    }
    if let Some(raw) = get(pool, "createdValueTypes").await? {
        session.created_value_types = from_json(&raw)?;
    }
    if let Some(raw) = get(pool, "createdConstraints").await? {
        session.created_constraints = from_json(&raw)?;
    }
    Ok(session)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| AppError::ParseError(format!("Failed to encode metadata: {}", e)))
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::ParseError(format!("Failed to decode metadata: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constraint::{Constraint, ConstraintRule};
    use crate::domain::value_type::{BaseType, ValueType};
    use crate::infrastructure::db::project::connect;

    async fn memory_pool() -> SqlitePool {
        let pool = connect("sqlite::memory:").await.unwrap();
        init(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let pool = memory_pool().await;
        set(&pool, "encoding", "utf8").await.unwrap();
        set(&pool, "encoding", "latin2").await.unwrap();
        assert_eq!(get(&pool, "encoding").await.unwrap().as_deref(), Some("latin2"));
        assert_eq!(get(&pool, "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_numeric_keys_sort_before_general_keys() {
        let pool = memory_pool().await;
        set(&pool, "encoding", "utf8").await.unwrap();
        set(&pool, "10", "text").await.unwrap();
        set(&pool, "2", "integer").await.unwrap();
        set(&pool, "0", "decimal").await.unwrap();
        set(&pool, "delimiter", ",").await.unwrap();

        let entries = load_entries(&pool).await.unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["0", "2", "10", "delimiter", "encoding"]);
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let pool = memory_pool().await;

        let short = Constraint::new(
            "Short".into(),
            BaseType::Text,
            ConstraintRule::Length { min: 1, max: 5 },
        )
        .unwrap();
        let upper = Constraint::new(
            "Upper".into(),
            BaseType::Text,
            ConstraintRule::Regex {
                pattern: "^[A-Z]+$".into(),
            },
        )
        .unwrap();

        let mut session = ImportSession::new();
        session.project_name = "trees".into();
        session.url = "https://example.org/trees.csv".into();
        session.encoding = "utf8".into();
        session.comment_lines = 2;
        session.delimiter = ",".into();
        session.header = vec!["name".into(), "height".into()];
        session.value_types = vec!["ShortText".into(), "integer".into()];
        session.cols_to_delete = vec!["B".into()];
        session.rows_to_delete = vec![4];
        session.created_constraints = vec![short, upper];
        session.created_value_types = vec![ValueType {
            name: "ShortText".into(),
            base: BaseType::Text,
            constraints: vec!["Short".into(), "Upper".into()],
        }];
        session.database = "trees.sqlite".into();
        session.table = "trees".into();

        save_session(&pool, &session).await.unwrap();
        let restored = load_session(&pool).await.unwrap();

        assert_eq!(restored.project_name, session.project_name);
        assert_eq!(restored.encoding, session.encoding);
        assert_eq!(restored.comment_lines, 2);
        assert_eq!(restored.header, session.header);
        assert_eq!(restored.value_types, session.value_types);
        assert_eq!(restored.cols_to_delete, session.cols_to_delete);
        assert_eq!(restored.rows_to_delete, session.rows_to_delete);
        assert_eq!(restored.created_value_types, session.created_value_types);
        assert_eq!(restored.created_constraints, session.created_constraints);
    }

    #[tokio::test]
    async fn test_column_order_restored_past_ten_columns() {
        let pool = memory_pool().await;
        let mut session = ImportSession::new();
        session.header = (1..=12).map(|i| format!("c{}", i)).collect();
        session.value_types = (1..=12).map(|i| format!("t{}", i)).collect();
        save_session(&pool, &session).await.unwrap();

        let types = column_types(&pool).await.unwrap();
        assert_eq!(types, session.value_types);
    }
}
