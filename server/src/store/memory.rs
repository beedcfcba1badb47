//! In-process drink store.
//!
//! Rows hold the encoded recipe, like the SQLite table does, so both stores
//! exercise the same encode/decode path.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{DrinkStore, StoreError};
use crate::drinks::{MenuItem, NewDrink, decode_recipe, encode_recipe};

#[derive(Debug, Clone)]
struct Row {
    title: String,
    recipe: String,
}

impl Row {
    fn to_item(&self, id: i64) -> Result<MenuItem, StoreError> {
        Ok(MenuItem {
            id,
            title: self.title.clone(),
            recipe: decode_recipe(&self.recipe)?,
        })
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Row>,
    last_id: i64,
}

impl Table {
    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.rows
            .iter()
            .any(|(id, row)| row.title == title && Some(*id) != except)
    }
}

/// Drink store held in memory. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DrinkStore for MemoryStore {
    async fn list(&self) -> Result<Vec<MenuItem>, StoreError> {
        self.table
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .rows
            .iter()
            .map(|(id, row)| row.to_item(*id))
            .collect()
    }

    async fn get(&self, id: i64) -> Result<Option<MenuItem>, StoreError> {
        self.table
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .rows
            .get(&id)
            .map(|row| row.to_item(id))
            .transpose()
    }

    async fn insert(&self, drink: NewDrink) -> Result<MenuItem, StoreError> {
        let recipe = encode_recipe(&drink.recipe)?;
        let mut table = self.table.write().map_err(|_| StoreError::LockPoisoned)?;

        if table.title_taken(&drink.title, None) {
            return Err(StoreError::DuplicateTitle(drink.title));
        }

        table.last_id += 1;
        let id = table.last_id;
        table.rows.insert(
            id,
            Row {
                title: drink.title.clone(),
                recipe,
            },
        );
        drop(table);

        Ok(MenuItem {
            id,
            title: drink.title,
            recipe: drink.recipe,
        })
    }

    async fn update(&self, id: i64, drink: NewDrink) -> Result<Option<MenuItem>, StoreError> {
        let recipe = encode_recipe(&drink.recipe)?;
        let mut table = self.table.write().map_err(|_| StoreError::LockPoisoned)?;

        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if table.title_taken(&drink.title, Some(id)) {
            return Err(StoreError::DuplicateTitle(drink.title));
        }

        table.rows.insert(
            id,
            Row {
                title: drink.title.clone(),
                recipe,
            },
        );
        drop(table);

        Ok(Some(MenuItem {
            id,
            title: drink.title,
            recipe: drink.recipe,
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .table
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .rows
            .remove(&id);
        Ok(removed.is_some())
    }
}
