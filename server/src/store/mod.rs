//! Persistence for menu items.
//!
//! The [`DrinkStore`] trait is the only way request handlers touch stored
//! drinks. Two implementations exist: [`MemoryStore`] keeps everything in
//! process memory, [`SqliteStore`] keeps it in a single SQLite table.
//!
//! # Invariants
//!
//! - Ids are generated by the store and never reused within a store's lifetime.
//! - Titles are unique across the store.
//! - Recipes are persisted in their encoded JSON form.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::drinks::{MenuItem, NewDrink, RecipeError};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Error returned by store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Another drink already has this title.
    DuplicateTitle(String),
    /// A recipe could not be encoded, or a stored recipe could not be decoded.
    Recipe(RecipeError),
    /// The database reported an error.
    Database(sqlx::Error),
    /// The in-memory lock was poisoned.
    LockPoisoned,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateTitle(title) => write!(f, "a drink titled '{title}' already exists"),
            Self::Recipe(e) => write!(f, "{e}"),
            Self::Database(e) => write!(f, "database error: {e}"),
            Self::LockPoisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Recipe(e) => Some(e),
            Self::Database(e) => Some(e),
            Self::DuplicateTitle(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<RecipeError> for StoreError {
    fn from(e: RecipeError) -> Self {
        Self::Recipe(e)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

/// Storage for menu items keyed by integer id.
#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// All drinks, ordered by id.
    async fn list(&self) -> Result<Vec<MenuItem>, StoreError>;

    /// The drink with `id`, if any.
    async fn get(&self, id: i64) -> Result<Option<MenuItem>, StoreError>;

    /// Insert a drink and return it with its generated id.
    async fn insert(&self, drink: NewDrink) -> Result<MenuItem, StoreError>;

    /// Replace the contents of drink `id`. Returns `None` if it does not exist.
    async fn update(&self, id: i64, drink: NewDrink) -> Result<Option<MenuItem>, StoreError>;

    /// Delete drink `id`. Returns whether a drink was removed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every `DrinkStore` implementation must share.

    use super::*;
    use crate::drinks::RecipePart;

    pub fn drink(title: &str) -> NewDrink {
        NewDrink {
            title: title.to_string(),
            recipe: vec![RecipePart {
                name: "tea".to_string(),
                color: "green".to_string(),
                parts: 5,
            }],
        }
    }

    pub async fn insert_then_get(store: &dyn DrinkStore) {
        let created = store.insert(drink("Test coffee")).await.expect("insert");
        assert_eq!(created.title, "Test coffee");
        assert_eq!(created.recipe, drink("Test coffee").recipe);

        let fetched = store.get(created.id).await.expect("get");
        assert_eq!(fetched, Some(created));
    }

    pub async fn list_is_ordered_by_id(store: &dyn DrinkStore) {
        let first = store.insert(drink("Latte")).await.expect("insert");
        let second = store.insert(drink("Mocha")).await.expect("insert");

        let all = store.list().await.expect("list");
        assert_eq!(all, vec![first, second]);
    }

    pub async fn duplicate_title_is_rejected(store: &dyn DrinkStore) {
        store.insert(drink("Latte")).await.expect("insert");

        let result = store.insert(drink("Latte")).await;
        assert!(matches!(result, Err(StoreError::DuplicateTitle(ref t)) if t == "Latte"));
        assert_eq!(store.list().await.expect("list").len(), 1);
    }

    pub async fn update_replaces_contents(store: &dyn DrinkStore) {
        let created = store.insert(drink("Latte")).await.expect("insert");
        let mut changes = drink("Flat white");
        changes.recipe[0].parts = 2;

        let updated = store
            .update(created.id, changes.clone())
            .await
            .expect("update")
            .expect("drink exists");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "Flat white");
        assert_eq!(updated.recipe, changes.recipe);

        assert_eq!(store.get(created.id).await.expect("get"), Some(updated));
    }

    pub async fn update_keeps_own_title(store: &dyn DrinkStore) {
        let created = store.insert(drink("Latte")).await.expect("insert");
        let updated = store
            .update(created.id, drink("Latte"))
            .await
            .expect("update to same title");
        assert!(updated.is_some());
    }

    pub async fn update_to_taken_title_is_rejected(store: &dyn DrinkStore) {
        store.insert(drink("Latte")).await.expect("insert");
        let mocha = store.insert(drink("Mocha")).await.expect("insert");

        let result = store.update(mocha.id, drink("Latte")).await;
        assert!(matches!(result, Err(StoreError::DuplicateTitle(_))));
    }

    pub async fn missing_ids(store: &dyn DrinkStore) {
        assert_eq!(store.get(300).await.expect("get"), None);
        assert_eq!(store.update(300, drink("Latte")).await.expect("update"), None);
        assert!(!store.delete(500).await.expect("delete"));
    }

    pub async fn delete_removes_drink(store: &dyn DrinkStore) {
        let created = store.insert(drink("Latte")).await.expect("insert");

        assert!(store.delete(created.id).await.expect("delete"));
        assert_eq!(store.get(created.id).await.expect("get"), None);
        assert!(!store.delete(created.id).await.expect("second delete"));
    }

    pub async fn ids_are_not_reused(store: &dyn DrinkStore) {
        let first = store.insert(drink("Latte")).await.expect("insert");
        store.delete(first.id).await.expect("delete");

        let second = store.insert(drink("Mocha")).await.expect("insert");
        assert!(second.id > first.id);
    }
}
