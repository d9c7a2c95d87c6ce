use async_trait::async_trait;
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::time::Duration;

use crate::db_schema::initialize_schema;
use crate::error::{GalleryError, GalleryResult};
use crate::gallery_types::AlbumRecord;

pub type DbPool = sqlx::SqlitePool;

/// Read side of the album table as seen by the pipeline.
#[async_trait]
pub trait AlbumSource: Send + Sync {
    /// Every album record, ordered by id ascending.
    async fn fetch_albums(&self) -> GalleryResult<Vec<AlbumRecord>>;
}

#[async_trait]
impl AlbumSource for DbPool {
    async fn fetch_albums(&self) -> GalleryResult<Vec<AlbumRecord>> {
        let records = sqlx::query_as::<_, AlbumRecord>(
            "SELECT id, url, carpeta, nombre, fecha, formato, size
             FROM gallery
             ORDER BY id ASC",
        )
        .fetch_all(self)
        .await
        .map_err(GalleryError::StoreRead)?;
        Ok(records)
    }
}

pub async fn create_db_pool(database_path: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = std::path::Path::new(database_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    // WAL plus a busy timeout so transient locks are waited on
    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    initialize_schema(&pool).await?;
    info!("Gallery schema ready at {}", database_path);

    Ok(pool)
}

/// In-memory pool with the schema applied, for tests and local experiments.
pub async fn create_in_memory_pool() -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    initialize_schema(&pool).await?;
    Ok(pool)
}

#[derive(Debug, Clone, Default)]
pub struct NewAlbum {
    pub url: String,
    pub carpeta: String,
    pub nombre: Option<String>,
    pub fecha: Option<String>,
    pub formato: Option<String>,
    pub size: Option<String>,
}

impl NewAlbum {
    pub fn new(url: &str, carpeta: &str) -> Self {
        Self {
            url: url.to_string(),
            carpeta: carpeta.to_string(),
            ..Default::default()
        }
    }
}

/// Insert an album row and return its id. The pipeline never writes; this
/// is for seeding and tests.
pub async fn insert_album(pool: &DbPool, album: &NewAlbum) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO gallery (url, carpeta, nombre, fecha, formato, size)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&album.url)
    .bind(&album.carpeta)
    .bind(&album.nombre)
    .bind(&album.fecha)
    .bind(&album.formato)
    .bind(&album.size)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}
