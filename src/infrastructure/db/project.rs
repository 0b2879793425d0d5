// ============================================================
// PROJECT TABLE REPOSITORY
// ============================================================
// Creates and fills the materialized table and serves paged reads
// for the browsing view

use crate::domain::error::{AppError, Result};
use crate::domain::staged::RowId;
use crate::domain::value_type::{BaseType, ColumnType};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::DatabaseError(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true);
    // an in-memory database exists per connection, so it must not be pooled
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))
}

pub async fn connect_file(path: &Path) -> Result<SqlitePool> {
    connect(&format!("sqlite://{}", path.display())).await
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite column type for a selected value type name. Custom types map
/// through their base; unknown names fall back to TEXT.
fn sqlite_type(type_name: &str, base_of: impl Fn(&str) -> Option<BaseType>) -> &'static str {
    let base = match ColumnType::parse(type_name) {
        Some(ColumnType::Integer) => Some(BaseType::Integer),
        Some(ColumnType::Decimal) => Some(BaseType::Decimal),
        Some(ColumnType::Boolean) => return "BOOLEAN",
        Some(_) => Some(BaseType::Text),
        None => base_of(type_name),
    };
    match base {
        Some(BaseType::Integer) => "INTEGER",
        Some(BaseType::Decimal) => "REAL",
        _ => "TEXT",
    }
}

/// Create (or replace) the table for the inferred schema.
pub async fn create_table(
    pool: &SqlitePool,
    table: &str,
    headers: &[String],
    type_names: &[String],
    base_of: impl Fn(&str) -> Option<BaseType>,
) -> Result<()> {
    let columns: Vec<String> = headers
        .iter()
        .zip(type_names.iter())
        .map(|(header, type_name)| {
            format!(
                "{} {}",
                quote_identifier(header),
                sqlite_type(type_name, &base_of)
            )
        })
        .collect();
    let drop = format!("DROP TABLE IF EXISTS {}", quote_identifier(table));
    let create = format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table),
        columns.join(", ")
    );
    sqlx::query(&drop)
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to drop table: {}", e)))?;
    sqlx::query(&create)
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {}", e)))?;
    info!(table, columns = headers.len(), "table created");
    Ok(())
}

/// Insert already-parsed rows. Used when the delimiter or enclosing falls
/// outside single-byte ASCII and the streaming reader cannot be configured.
pub async fn insert_rows(
    pool: &SqlitePool,
    table: &str,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<u64> {
    let mut inserted = 0;
    for row in rows {
        insert_row(pool, table, headers, row).await?;
        inserted += 1;
    }
    Ok(inserted)
}

async fn insert_row(
    pool: &SqlitePool,
    table: &str,
    headers: &[String],
    row: &[String],
) -> Result<()> {
    let columns: Vec<String> = headers.iter().map(|h| quote_identifier(h)).collect();
    let placeholders: Vec<&str> = headers.iter().map(|_| "?").collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        columns.join(", "),
        placeholders.join(", ")
    );
    let mut query = sqlx::query(&sql);
    for index in 0..headers.len() {
        query = query.bind(row.get(index).map(String::as_str).unwrap_or(""));
    }
    query
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert row: {}", e)))?;
    Ok(())
}

/// Stream a decoded CSV body (preamble and header already stripped) into
/// the table. Requires a single-byte ASCII delimiter; the enclosing is
/// optional.
pub async fn import_csv(
    pool: &SqlitePool,
    table: &str,
    headers: &[String],
    body: &str,
    delimiter: &str,
    enclosing: &str,
) -> Result<u64> {
    let delimiter = single_ascii_byte(delimiter).ok_or_else(|| {
        AppError::ParseError("Streaming import needs a single-byte ASCII delimiter".to_string())
    })?;
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All);
    match single_ascii_byte(enclosing) {
        Some(quote) => {
            builder.quote(quote);
        }
        None => {
            builder.quoting(false);
        }
    }

    let mut reader = builder.from_reader(body.as_bytes());
    let mut inserted = 0;
    for record in reader.records() {
        let record =
            record.map_err(|e| AppError::ParseError(format!("Malformed CSV row: {}", e)))?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        insert_row(pool, table, headers, &row).await?;
        inserted += 1;
    }
    info!(table, rows = inserted, "streamed rows into table");
    Ok(inserted)
}

fn single_ascii_byte(value: &str) -> Option<u8> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Some(c as u8),
        _ => None,
    }
}

/// One page of the table, each row keyed by its stable rowid. Every value
/// is cast to text for display.
pub async fn browse(
    pool: &SqlitePool,
    table: &str,
    headers: &[String],
    page: i64,
    page_size: i64,
) -> Result<Vec<(RowId, Vec<String>)>> {
    let casts: Vec<String> = headers
        .iter()
        .map(|h| format!("CAST({} AS TEXT)", quote_identifier(h)))
        .collect();
    let sql = format!(
        "SELECT rowid, {} FROM {} ORDER BY rowid LIMIT ? OFFSET ?",
        casts.join(", "),
        quote_identifier(table)
    );
    let rows = sqlx::query(&sql)
        .bind(page_size)
        .bind(page.max(0) * page_size)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to browse table: {}", e)))?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        let rowid: i64 = row
            .try_get(0)
            .map_err(|e| AppError::DatabaseError(format!("Failed to read rowid: {}", e)))?;
        let mut values = Vec::with_capacity(headers.len());
        for index in 0..headers.len() {
            let value: Option<String> = row
                .try_get(index + 1)
                .map_err(|e| AppError::DatabaseError(format!("Failed to read cell: {}", e)))?;
            values.push(value.unwrap_or_default());
        }
        result.push((rowid, values));
    }
    Ok(result)
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
    let count: (i64,) = sqlx::query_as(&sql)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to count rows: {}", e)))?;
    Ok(count.0)
}

/// Every value of one column as text, in rowid order. Feeds the
/// statistics view.
pub async fn fetch_column(pool: &SqlitePool, table: &str, column: &str) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT CAST({} AS TEXT) FROM {} ORDER BY rowid",
        quote_identifier(column),
        quote_identifier(table)
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to read column: {}", e)))?;
    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        let value: Option<String> = row
            .try_get(0)
            .map_err(|e| AppError::DatabaseError(format!("Failed to read cell: {}", e)))?;
        values.push(value.unwrap_or_default());
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    async fn memory_pool() -> SqlitePool {
        connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_create_table_maps_types() {
        let pool = memory_pool().await;
        create_table(
            &pool,
            "trees",
            &headers(&["name", "height", "alive"]),
            &headers(&["text", "integer", "boolean"]),
            |_| None,
        )
        .await
        .unwrap();

        let count = count_rows(&pool, "trees").await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_streamed_import_and_browse() {
        let pool = memory_pool().await;
        let header = headers(&["name", "height"]);
        create_table(&pool, "trees", &header, &headers(&["text", "integer"]), |_| None)
            .await
            .unwrap();

        let inserted = import_csv(
            &pool,
            "trees",
            &header,
            "oak,12\n\"tall, fir\",9\n",
            ",",
            "\"",
        )
        .await
        .unwrap();
        assert_eq!(inserted, 2);

        let page = browse(&pool, "trees", &header, 0, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].1, vec!["oak", "12"]);
        assert_eq!(page[1].1, vec!["tall, fir", "9"]);
    }

    #[tokio::test]
    async fn test_pagination() {
        let pool = memory_pool().await;
        let header = headers(&["n"]);
        create_table(&pool, "t", &header, &headers(&["integer"]), |_| None)
            .await
            .unwrap();
        let rows: Vec<Vec<String>> = (1..=5).map(|i| vec![i.to_string()]).collect();
        insert_rows(&pool, "t", &header, &rows).await.unwrap();

        let page = browse(&pool, "t", &header, 1, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].1, vec!["3"]);
        assert_eq!(page[1].1, vec!["4"]);
    }

    #[tokio::test]
    async fn test_fetch_column() {
        let pool = memory_pool().await;
        let header = headers(&["name", "height"]);
        create_table(&pool, "trees", &header, &headers(&["text", "integer"]), |_| None)
            .await
            .unwrap();
        insert_rows(
            &pool,
            "trees",
            &header,
            &[
                vec!["oak".into(), "12".into()],
                vec!["fir".into(), "9".into()],
            ],
        )
        .await
        .unwrap();

        let values = fetch_column(&pool, "trees", "height").await.unwrap();
        assert_eq!(values, vec!["12", "9"]);
    }

    #[tokio::test]
    async fn test_non_ascii_delimiter_is_rejected_for_streaming() {
        let pool = memory_pool().await;
        let err = import_csv(&pool, "t", &headers(&["a"]), "x", "—", "").await;
        assert!(matches!(err, Err(AppError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_quoted_identifiers_survive_odd_headers() {
        let pool = memory_pool().await;
        let header = headers(&["name\"with quote", "select"]);
        create_table(&pool, "odd", &header, &headers(&["text", "text"]), |_| None)
            .await
            .unwrap();
        insert_rows(&pool, "odd", &header, &[vec!["a".into(), "b".into()]])
            .await
            .unwrap();
        let page = browse(&pool, "odd", &header, 0, 10).await.unwrap();
        assert_eq!(page[0].1, vec!["a", "b"]);
    }
}
