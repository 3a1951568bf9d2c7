//! SQLite storage backend using sqlx.
//!
//! Provides [`SqliteCatalog`], a `CatalogStore` backed by an embedded
//! single-file database via `sqlx::SqlitePool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `sqlite` feature flag:
//! ```toml
//! [dependencies]
//! carte = { version = "0.1", features = ["sqlite"] }
//! ```
//!
//! # Schema
//!
//! One table per entity level (`menus`, `submenus`, `dishes`) with NOT NULL
//! parent references and `ON DELETE CASCADE` as a schema-level backstop;
//! the store still performs every cascade as an explicit ordered sequence
//! so the counter adjustments hold independent of the engine's cascade.
//! Prices are stored as TEXT (sqlx has no SQLite decimal codec) and parsed
//! back into `Decimal`.
//!
//! # Atomicity
//!
//! Every multi-write runs in one transaction. Counter maintenance uses
//! in-place `UPDATE ... SET c = c + 1`, which also doubles as the parent
//! existence check via `rows_affected`; SQLite's single-writer model rules
//! out lost updates between the read and the write.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::core::entity::{Dish, DishDraft, EntityKind, Menu, MenuDraft, Submenu, SubmenuDraft};
use crate::core::store::{CatalogStore, StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

/// Apply the required tables and indexes (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS menus (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            submenus_count INTEGER NOT NULL DEFAULT 0,
            dishes_count INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| anyhow!("failed to create menus table: {}", e))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS submenus (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            menu_id INTEGER NOT NULL REFERENCES menus(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            dishes_count INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| anyhow!("failed to create submenus table: {}", e))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS dishes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            menu_id INTEGER NOT NULL REFERENCES menus(id) ON DELETE CASCADE,
            submenu_id INTEGER NOT NULL REFERENCES submenus(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            price TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| anyhow!("failed to create dishes table: {}", e))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_submenus_menu ON submenus(menu_id)")
        .execute(pool)
        .await
        .map_err(|e| anyhow!("failed to create submenu index: {}", e))?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_dishes_submenu ON dishes(submenu_id)")
        .execute(pool)
        .await
        .map_err(|e| anyhow!("failed to create dish index: {}", e))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

type MenuRow = (i64, String, String, i64, i64);
type SubmenuRow = (i64, i64, String, String, i64);
type DishRow = (i64, i64, i64, String, String, String);

const MENU_COLUMNS: &str = "id, title, description, submenus_count, dishes_count";
const SUBMENU_COLUMNS: &str = "id, menu_id, title, description, dishes_count";
const DISH_COLUMNS: &str = "id, menu_id, submenu_id, title, description, price";

fn menu_from_row(row: MenuRow) -> Menu {
    let (id, title, description, submenus_count, dishes_count) = row;
    Menu {
        id,
        title,
        description,
        submenus_count,
        dishes_count,
    }
}

fn submenu_from_row(row: SubmenuRow) -> Submenu {
    let (id, menu_id, title, description, dishes_count) = row;
    Submenu {
        id,
        menu_id,
        title,
        description,
        dishes_count,
    }
}

fn dish_from_row(row: DishRow) -> Result<Dish> {
    let (id, menu_id, submenu_id, title, description, price) = row;
    let price = Decimal::from_str(&price)
        .map_err(|e| anyhow!("invalid stored price '{}': {}", price, e))?;
    Ok(Dish {
        id,
        menu_id,
        submenu_id,
        title,
        description,
        price,
    })
}

// ---------------------------------------------------------------------------
// SqliteCatalog
// ---------------------------------------------------------------------------

/// Catalog store backed by an embedded SQLite database.
#[derive(Clone, Debug)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Wrap an existing pool. The schema must already be applied.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database file at `path`, apply the
    /// schema, and return a ready store.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| anyhow!("failed to open sqlite database: {}", e))?;

        ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn list_menus(&self) -> StoreResult<Vec<Menu>> {
        let rows = sqlx::query_as::<_, MenuRow>(&format!(
            "SELECT {} FROM menus ORDER BY id",
            MENU_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to list menus: {}", e))?;

        Ok(rows.into_iter().map(menu_from_row).collect())
    }

    async fn get_menu(&self, id: i64) -> StoreResult<Option<Menu>> {
        let row = sqlx::query_as::<_, MenuRow>(&format!(
            "SELECT {} FROM menus WHERE id = ?",
            MENU_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to get menu: {}", e))?;

        Ok(row.map(menu_from_row))
    }

    async fn insert_menu(&self, draft: &MenuDraft) -> StoreResult<Menu> {
        let row = sqlx::query_as::<_, MenuRow>(&format!(
            "INSERT INTO menus (title, description) VALUES (?, ?) RETURNING {}",
            MENU_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to insert menu: {}", e))?;

        Ok(menu_from_row(row))
    }

    async fn update_menu(&self, id: i64, draft: &MenuDraft) -> StoreResult<Option<Menu>> {
        let row = sqlx::query_as::<_, MenuRow>(&format!(
            "UPDATE menus SET title = ?, description = ? WHERE id = ? RETURNING {}",
            MENU_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to update menu: {}", e))?;

        Ok(row.map(menu_from_row))
    }

    async fn delete_menu(&self, id: i64) -> StoreResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| anyhow!("failed to begin transaction: {}", e))?;

        // Explicit bottom-up subtree removal; the FK cascade is only a
        // backstop.
        sqlx::query("DELETE FROM dishes WHERE menu_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to delete menu dishes: {}", e))?;
        sqlx::query("DELETE FROM submenus WHERE menu_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to delete menu submenus: {}", e))?;
        let deleted = sqlx::query("DELETE FROM menus WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to delete menu: {}", e))?
            .rows_affected();

        if deleted == 0 {
            tx.rollback()
                .await
                .map_err(|e| anyhow!("failed to roll back: {}", e))?;
            return Ok(false);
        }

        tx.commit()
            .await
            .map_err(|e| anyhow!("failed to commit: {}", e))?;
        Ok(true)
    }

    async fn list_submenus(&self, menu_id: i64) -> StoreResult<Vec<Submenu>> {
        let rows = sqlx::query_as::<_, SubmenuRow>(&format!(
            "SELECT {} FROM submenus WHERE menu_id = ? ORDER BY id",
            SUBMENU_COLUMNS
        ))
        .bind(menu_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to list submenus: {}", e))?;

        Ok(rows.into_iter().map(submenu_from_row).collect())
    }

    async fn get_submenu(&self, menu_id: i64, submenu_id: i64) -> StoreResult<Option<Submenu>> {
        let row = sqlx::query_as::<_, SubmenuRow>(&format!(
            "SELECT {} FROM submenus WHERE id = ? AND menu_id = ?",
            SUBMENU_COLUMNS
        ))
        .bind(submenu_id)
        .bind(menu_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to get submenu: {}", e))?;

        Ok(row.map(submenu_from_row))
    }

    async fn insert_submenu(&self, menu_id: i64, draft: &SubmenuDraft) -> StoreResult<Submenu> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| anyhow!("failed to begin transaction: {}", e))?;

        // The in-place increment doubles as the existence check.
        let bumped = sqlx::query(
            "UPDATE menus SET submenus_count = submenus_count + 1 WHERE id = ?",
        )
        .bind(menu_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!("failed to increment submenus_count: {}", e))?
        .rows_affected();

        if bumped == 0 {
            tx.rollback()
                .await
                .map_err(|e| anyhow!("failed to roll back: {}", e))?;
            return Err(StoreError::MissingParent(EntityKind::Menu));
        }

        let row = sqlx::query_as::<_, SubmenuRow>(&format!(
            "INSERT INTO submenus (menu_id, title, description) VALUES (?, ?, ?) RETURNING {}",
            SUBMENU_COLUMNS
        ))
        .bind(menu_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| anyhow!("failed to insert submenu: {}", e))?;

        tx.commit()
            .await
            .map_err(|e| anyhow!("failed to commit: {}", e))?;
        Ok(submenu_from_row(row))
    }

    async fn update_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
        draft: &SubmenuDraft,
    ) -> StoreResult<Option<Submenu>> {
        let row = sqlx::query_as::<_, SubmenuRow>(&format!(
            "UPDATE submenus SET title = ?, description = ? \
             WHERE id = ? AND menu_id = ? RETURNING {}",
            SUBMENU_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(submenu_id)
        .bind(menu_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to update submenu: {}", e))?;

        Ok(row.map(submenu_from_row))
    }

    async fn delete_submenu(&self, menu_id: i64, submenu_id: i64) -> StoreResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| anyhow!("failed to begin transaction: {}", e))?;

        // Ordered cascade: remove dishes, remove the submenu, then adjust
        // the parent counters by what was actually removed.
        let removed_dishes = sqlx::query("DELETE FROM dishes WHERE submenu_id = ?")
            .bind(submenu_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to delete submenu dishes: {}", e))?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM submenus WHERE id = ? AND menu_id = ?")
            .bind(submenu_id)
            .bind(menu_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to delete submenu: {}", e))?
            .rows_affected();

        if deleted == 0 {
            tx.rollback()
                .await
                .map_err(|e| anyhow!("failed to roll back: {}", e))?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE menus SET submenus_count = submenus_count - 1, \
             dishes_count = dishes_count - ? WHERE id = ?",
        )
        .bind(removed_dishes as i64)
        .bind(menu_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!("failed to decrement menu counters: {}", e))?;

        tx.commit()
            .await
            .map_err(|e| anyhow!("failed to commit: {}", e))?;
        Ok(true)
    }

    async fn list_dishes(&self, menu_id: i64, submenu_id: i64) -> StoreResult<Vec<Dish>> {
        let rows = sqlx::query_as::<_, DishRow>(&format!(
            "SELECT {} FROM dishes WHERE menu_id = ? AND submenu_id = ? ORDER BY id",
            DISH_COLUMNS
        ))
        .bind(menu_id)
        .bind(submenu_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to list dishes: {}", e))?;

        rows.into_iter()
            .map(|row| dish_from_row(row).map_err(StoreError::Backend))
            .collect()
    }

    async fn get_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> StoreResult<Option<Dish>> {
        let row = sqlx::query_as::<_, DishRow>(&format!(
            "SELECT {} FROM dishes WHERE id = ? AND menu_id = ? AND submenu_id = ?",
            DISH_COLUMNS
        ))
        .bind(dish_id)
        .bind(menu_id)
        .bind(submenu_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to get dish: {}", e))?;

        row.map(dish_from_row).transpose().map_err(StoreError::from)
    }

    async fn insert_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        draft: &DishDraft,
    ) -> StoreResult<Dish> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| anyhow!("failed to begin transaction: {}", e))?;

        let menu_bumped = sqlx::query(
            "UPDATE menus SET dishes_count = dishes_count + 1 WHERE id = ?",
        )
        .bind(menu_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!("failed to increment menu dishes_count: {}", e))?
        .rows_affected();

        if menu_bumped == 0 {
            tx.rollback()
                .await
                .map_err(|e| anyhow!("failed to roll back: {}", e))?;
            return Err(StoreError::MissingParent(EntityKind::Menu));
        }

        // Scoped to the menu: a submenu under a different menu is a miss.
        let submenu_bumped = sqlx::query(
            "UPDATE submenus SET dishes_count = dishes_count + 1 \
             WHERE id = ? AND menu_id = ?",
        )
        .bind(submenu_id)
        .bind(menu_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!("failed to increment submenu dishes_count: {}", e))?
        .rows_affected();

        if submenu_bumped == 0 {
            tx.rollback()
                .await
                .map_err(|e| anyhow!("failed to roll back: {}", e))?;
            return Err(StoreError::MissingParent(EntityKind::Submenu));
        }

        let row = sqlx::query_as::<_, DishRow>(&format!(
            "INSERT INTO dishes (menu_id, submenu_id, title, description, price) \
             VALUES (?, ?, ?, ?, ?) RETURNING {}",
            DISH_COLUMNS
        ))
        .bind(menu_id)
        .bind(submenu_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.normalized_price().to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| anyhow!("failed to insert dish: {}", e))?;

        tx.commit()
            .await
            .map_err(|e| anyhow!("failed to commit: {}", e))?;
        dish_from_row(row).map_err(StoreError::from)
    }

    async fn update_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
        draft: &DishDraft,
    ) -> StoreResult<Option<Dish>> {
        let row = sqlx::query_as::<_, DishRow>(&format!(
            "UPDATE dishes SET title = ?, description = ?, price = ? \
             WHERE id = ? AND menu_id = ? AND submenu_id = ? RETURNING {}",
            DISH_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.normalized_price().to_string())
        .bind(dish_id)
        .bind(menu_id)
        .bind(submenu_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to update dish: {}", e))?;

        row.map(dish_from_row).transpose().map_err(StoreError::from)
    }

    async fn delete_dish(&self, menu_id: i64, submenu_id: i64, dish_id: i64) -> StoreResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| anyhow!("failed to begin transaction: {}", e))?;

        let deleted = sqlx::query(
            "DELETE FROM dishes WHERE id = ? AND menu_id = ? AND submenu_id = ?",
        )
        .bind(dish_id)
        .bind(menu_id)
        .bind(submenu_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!("failed to delete dish: {}", e))?
        .rows_affected();

        if deleted == 0 {
            tx.rollback()
                .await
                .map_err(|e| anyhow!("failed to roll back: {}", e))?;
            return Ok(false);
        }

        sqlx::query("UPDATE submenus SET dishes_count = dishes_count - 1 WHERE id = ?")
            .bind(submenu_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to decrement submenu dishes_count: {}", e))?;
        sqlx::query("UPDATE menus SET dishes_count = dishes_count - 1 WHERE id = ?")
            .bind(menu_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to decrement menu dishes_count: {}", e))?;

        tx.commit()
            .await
            .map_err(|e| anyhow!("failed to commit: {}", e))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    async fn store() -> SqliteCatalog {
        // A single-connection pool keeps the in-memory database alive and
        // shared across the test's statements.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        ensure_schema(&pool).await.unwrap();
        SqliteCatalog::from_pool(pool)
    }

    fn draft(title: &str) -> MenuDraft {
        MenuDraft {
            title: title.to_string(),
            description: format!("{}_description", title),
        }
    }

    fn dish_draft(title: &str, price: &str) -> DishDraft {
        DishDraft {
            title: title.to_string(),
            description: format!("{}_description", title),
            price: Decimal::from_str(price).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_menu_assigns_sequential_ids() {
        let store = store().await;

        let m1 = store.insert_menu(&draft("menu1")).await.unwrap();
        let m2 = store.insert_menu(&draft("menu2")).await.unwrap();

        assert_eq!((m1.id, m2.id), (1, 2));
        assert_eq!(m1.submenus_count, 0);
        assert_eq!(m1.dishes_count, 0);
    }

    #[tokio::test]
    async fn test_submenu_insert_bumps_parent_counter() {
        let store = store().await;
        let menu = store.insert_menu(&draft("menu1")).await.unwrap();

        store.insert_submenu(menu.id, &draft("submenu1")).await.unwrap();

        let menu = store.get_menu(menu.id).await.unwrap().unwrap();
        assert_eq!(menu.submenus_count, 1);
    }

    #[tokio::test]
    async fn test_insert_submenu_without_menu_is_missing_parent() {
        let store = store().await;

        let err = store.insert_submenu(1, &draft("submenu1")).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingParent(EntityKind::Menu)));
    }

    #[tokio::test]
    async fn test_dish_price_round_trips_through_text_column() {
        let store = store().await;
        let menu = store.insert_menu(&draft("menu1")).await.unwrap();
        let submenu = store.insert_submenu(menu.id, &draft("submenu1")).await.unwrap();

        let dish = store
            .insert_dish(menu.id, submenu.id, &dish_draft("dish1", "100"))
            .await
            .unwrap();
        let fetched = store
            .get_dish(menu.id, submenu.id, dish.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched.price.to_string(), "100.00");
        assert_eq!(fetched, dish);
    }

    #[tokio::test]
    async fn test_cascade_delete_submenu_adjusts_menu_counters() {
        let store = store().await;
        let menu = store.insert_menu(&draft("menu1")).await.unwrap();
        let submenu = store.insert_submenu(menu.id, &draft("submenu1")).await.unwrap();
        for i in 0..3 {
            store
                .insert_dish(menu.id, submenu.id, &dish_draft(&format!("dish{}", i), "10"))
                .await
                .unwrap();
        }

        assert!(store.delete_submenu(menu.id, submenu.id).await.unwrap());

        let menu = store.get_menu(menu.id).await.unwrap().unwrap();
        assert_eq!(menu.submenus_count, 0);
        assert_eq!(menu.dishes_count, 0);
        assert!(
            store
                .list_dishes(menu.id, submenu.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_connect_creates_file_and_schema_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let store = SqliteCatalog::connect(&path).await.unwrap();
        store.insert_menu(&draft("menu1")).await.unwrap();
        drop(store);

        // Reopening applies the schema again without clobbering data
        let store = SqliteCatalog::connect(&path).await.unwrap();
        assert_eq!(store.list_menus().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_menu_removes_subtree() {
        let store = store().await;
        let menu = store.insert_menu(&draft("menu1")).await.unwrap();
        let submenu = store.insert_submenu(menu.id, &draft("submenu1")).await.unwrap();
        store
            .insert_dish(menu.id, submenu.id, &dish_draft("dish1", "100"))
            .await
            .unwrap();

        assert!(store.delete_menu(menu.id).await.unwrap());
        assert!(!store.delete_menu(menu.id).await.unwrap());

        assert!(store.get_menu(menu.id).await.unwrap().is_none());
        assert!(store.list_submenus(menu.id).await.unwrap().is_empty());
    }
}
