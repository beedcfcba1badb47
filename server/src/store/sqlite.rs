//! SQLite-backed drink store.
//!
//! All drinks live in one `drink` table. The table is created on connect if
//! it does not exist yet.
//!
//! # Pre-conditions
//! - The database URL names a file database (`sqlite://path` or `sqlite:path`).
//!
//! # Invariants
//! - `title` carries a UNIQUE constraint, so duplicate titles are rejected by SQLite.
//! - `id` uses AUTOINCREMENT, so ids of deleted drinks are never reused.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::{DrinkStore, StoreError};
use crate::drinks::{MenuItem, NewDrink, decode_recipe, encode_recipe};

const MAX_CONNECTIONS: u32 = 4;

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS drink (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL UNIQUE,
        recipe TEXT NOT NULL
    )
";

#[derive(Debug, sqlx::FromRow)]
struct DrinkRow {
    id: i64,
    title: String,
    recipe: String,
}

impl TryFrom<DrinkRow> for MenuItem {
    type Error = StoreError;

    fn try_from(row: DrinkRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            recipe: decode_recipe(&row.recipe)?,
        })
    }
}

/// Drink store persisted in a SQLite database.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and ensure the table exists.
    ///
    /// # Errors
    /// Returns `StoreError::Database` if the URL is invalid or the database
    /// cannot be opened.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        tracing::info!("Opened drink database at {}", url);

        Ok(Self { pool })
    }
}

/// Map a constraint failure on `title` to `DuplicateTitle`.
fn title_conflict(title: &str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StoreError::DuplicateTitle(title.to_string())
        }
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl DrinkStore for SqliteStore {
    async fn list(&self) -> Result<Vec<MenuItem>, StoreError> {
        let rows = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drink ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MenuItem::try_from).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<MenuItem>, StoreError> {
        let row = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drink WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(MenuItem::try_from).transpose()
    }

    async fn insert(&self, drink: NewDrink) -> Result<MenuItem, StoreError> {
        let recipe = encode_recipe(&drink.recipe)?;

        let row = sqlx::query_as::<_, DrinkRow>(
            "INSERT INTO drink (title, recipe) VALUES (?, ?) RETURNING id, title, recipe",
        )
        .bind(&drink.title)
        .bind(&recipe)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| title_conflict(&drink.title, e))?;

        MenuItem::try_from(row)
    }

    async fn update(&self, id: i64, drink: NewDrink) -> Result<Option<MenuItem>, StoreError> {
        let recipe = encode_recipe(&drink.recipe)?;

        let row = sqlx::query_as::<_, DrinkRow>(
            "UPDATE drink SET title = ?, recipe = ? WHERE id = ? RETURNING id, title, recipe",
        )
        .bind(&drink.title)
        .bind(&recipe)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| title_conflict(&drink.title, e))?;

        row.map(MenuItem::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM drink WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
