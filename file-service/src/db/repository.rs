use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::FileRepository;
use crate::models::{FileRecord, NewFileRecord};

/// PostgreSQL-backed file metadata repository
#[derive(Debug, Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn insert_file(&self, file: &NewFileRecord) -> Result<FileRecord, sqlx::Error> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO files (id, name, original_name, size, content_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, original_name, size, content_type, uploaded_at
            "#,
        )
        .bind(&file.id)
        .bind(&file.name)
        .bind(&file.original_name)
        .bind(file.size)
        .bind(&file.content_type)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created file record: id={}, name={}", record.id, record.name);
        Ok(record)
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, original_name, size, content_type, uploaded_at
            FROM files
            ORDER BY uploaded_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        // Rows that fail to decode are dropped from the listing
        let files = rows
            .iter()
            .filter_map(|row| match FileRecord::from_row(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping undecodable file row: {}", e);
                    None
                }
            })
            .collect();

        Ok(files)
    }

    async fn delete_by_name(&self, name: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM files WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;

        tracing::info!(
            "Deleted {} file record(s) with name {}",
            result.rows_affected(),
            name
        );
        Ok(result.rows_affected())
    }
}
