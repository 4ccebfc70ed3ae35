use anyhow::Result;
use sqlx::SqlitePool;

/// Create the vector index schema. Safe to run on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profile_vectors (
            id TEXT PRIMARY KEY,
            document TEXT NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            vector BLOB NOT NULL,
            model TEXT NOT NULL,
            dims INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_profile_vectors_model ON profile_vectors(model)")
        .execute(pool)
        .await?;

    Ok(())
}
