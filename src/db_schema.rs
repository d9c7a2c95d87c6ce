use sqlx::SqlitePool;

// Schema definitions
pub const GALLERY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS gallery (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    -- Direct image url or a link to an external collection
    url TEXT NOT NULL,
    -- Album name shown in the sidebar
    carpeta TEXT NOT NULL,
    nombre TEXT,
    fecha TEXT,
    formato TEXT,
    size TEXT
)
"#;

pub const SCHEMA_SQL: &[&str] = &[
    GALLERY_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_gallery_carpeta ON gallery(carpeta);",
];

pub async fn initialize_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for sql in SCHEMA_SQL {
        sqlx::query(*sql).execute(pool).await?;
    }
    Ok(())
}
