//! PostgreSQL storage backend using sqlx.
//!
//! Provides [`PostgresCatalog`], a `CatalogStore` backed by a networked
//! PostgreSQL database via `sqlx::PgPool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! carte = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Differences from the SQLite backend
//!
//! - `$1`, `$2` placeholders instead of `?`
//! - `BIGSERIAL` keys instead of `AUTOINCREMENT`
//! - Prices in a `NUMERIC(10, 2)` column bound directly as `Decimal`
//! - `SELECT ... FOR UPDATE` serializes concurrent cascade deletes of the
//!   same submenu (SQLite's single-writer model makes this implicit)
//!
//! The atomicity discipline is the same: one transaction per multi-write,
//! counters adjusted with in-place `UPDATE ... SET c = c + 1` increments
//! that double as parent existence checks, so concurrent creates against
//! one parent never lose an increment under read-committed isolation.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::core::entity::{Dish, DishDraft, EntityKind, Menu, MenuDraft, Submenu, SubmenuDraft};
use crate::core::store::{CatalogStore, StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

/// Apply the required tables and indexes (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS menus (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            submenus_count BIGINT NOT NULL DEFAULT 0,
            dishes_count BIGINT NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| anyhow!("failed to create menus table: {}", e))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS submenus (
            id BIGSERIAL PRIMARY KEY,
            menu_id BIGINT NOT NULL REFERENCES menus(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            dishes_count BIGINT NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| anyhow!("failed to create submenus table: {}", e))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS dishes (
            id BIGSERIAL PRIMARY KEY,
            menu_id BIGINT NOT NULL REFERENCES menus(id) ON DELETE CASCADE,
            submenu_id BIGINT NOT NULL REFERENCES submenus(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            price NUMERIC(10, 2) NOT NULL
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
type DishRow = (i64, i64, i64, String, String, Decimal);

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

fn dish_from_row(row: DishRow) -> Dish {
    let (id, menu_id, submenu_id, title, description, price) = row;
    Dish {
        id,
        menu_id,
        submenu_id,
        title,
        description,
        price,
    }
}

// ---------------------------------------------------------------------------
// PostgresCatalog
// ---------------------------------------------------------------------------

/// Catalog store backed by a PostgreSQL database.
#[derive(Clone, Debug)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Wrap an existing pool. The schema must already be applied.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url`, apply the schema, and return a ready store.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| anyhow!("failed to connect to postgres: {}", e))?;

        ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalog {
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
            "SELECT {} FROM menus WHERE id = $1",
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
            "INSERT INTO menus (title, description) VALUES ($1, $2) RETURNING {}",
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
            "UPDATE menus SET title = $1, description = $2 WHERE id = $3 RETURNING {}",
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
        sqlx::query("DELETE FROM dishes WHERE menu_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to delete menu dishes: {}", e))?;
        sqlx::query("DELETE FROM submenus WHERE menu_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to delete menu submenus: {}", e))?;
        let deleted = sqlx::query("DELETE FROM menus WHERE id = $1")
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
            "SELECT {} FROM submenus WHERE menu_id = $1 ORDER BY id",
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
            "SELECT {} FROM submenus WHERE id = $1 AND menu_id = $2",
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

        // The in-place increment doubles as the existence check and takes
        // the row lock that serializes concurrent counter updates.
        let bumped = sqlx::query(
            "UPDATE menus SET submenus_count = submenus_count + 1 WHERE id = $1",
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
            "INSERT INTO submenus (menu_id, title, description) VALUES ($1, $2, $3) RETURNING {}",
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
            "UPDATE submenus SET title = $1, description = $2 \
             WHERE id = $3 AND menu_id = $4 RETURNING {}",
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

        // Lock the submenu row first so concurrent deletes of the same
        // submenu serialize and only one performs the cascade.
        let locked = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM submenus WHERE id = $1 AND menu_id = $2 FOR UPDATE",
        )
        .bind(submenu_id)
        .bind(menu_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| anyhow!("failed to lock submenu: {}", e))?;

        if locked.is_none() {
            tx.rollback()
                .await
                .map_err(|e| anyhow!("failed to roll back: {}", e))?;
            return Ok(false);
        }

        // Ordered cascade: remove dishes, remove the submenu, then adjust
        // the parent counters by what was actually removed.
        let removed_dishes = sqlx::query("DELETE FROM dishes WHERE submenu_id = $1")
            .bind(submenu_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to delete submenu dishes: {}", e))?
            .rows_affected();

        sqlx::query("DELETE FROM submenus WHERE id = $1")
            .bind(submenu_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to delete submenu: {}", e))?;

        sqlx::query(
            "UPDATE menus SET submenus_count = submenus_count - 1, \
             dishes_count = dishes_count - $1 WHERE id = $2",
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
            "SELECT {} FROM dishes WHERE menu_id = $1 AND submenu_id = $2 ORDER BY id",
            DISH_COLUMNS
        ))
        .bind(menu_id)
        .bind(submenu_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to list dishes: {}", e))?;

        Ok(rows.into_iter().map(dish_from_row).collect())
    }

    async fn get_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> StoreResult<Option<Dish>> {
        let row = sqlx::query_as::<_, DishRow>(&format!(
            "SELECT {} FROM dishes WHERE id = $1 AND menu_id = $2 AND submenu_id = $3",
            DISH_COLUMNS
        ))
        .bind(dish_id)
        .bind(menu_id)
        .bind(submenu_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to get dish: {}", e))?;

        Ok(row.map(dish_from_row))
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
            "UPDATE menus SET dishes_count = dishes_count + 1 WHERE id = $1",
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
             WHERE id = $1 AND menu_id = $2",
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
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            DISH_COLUMNS
        ))
        .bind(menu_id)
        .bind(submenu_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.normalized_price())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| anyhow!("failed to insert dish: {}", e))?;

        tx.commit()
            .await
            .map_err(|e| anyhow!("failed to commit: {}", e))?;
        Ok(dish_from_row(row))
    }

    async fn update_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
        draft: &DishDraft,
    ) -> StoreResult<Option<Dish>> {
        let row = sqlx::query_as::<_, DishRow>(&format!(
            "UPDATE dishes SET title = $1, description = $2, price = $3 \
             WHERE id = $4 AND menu_id = $5 AND submenu_id = $6 RETURNING {}",
            DISH_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.normalized_price())
        .bind(dish_id)
        .bind(menu_id)
        .bind(submenu_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("failed to update dish: {}", e))?;

        Ok(row.map(dish_from_row))
    }

    async fn delete_dish(&self, menu_id: i64, submenu_id: i64, dish_id: i64) -> StoreResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| anyhow!("failed to begin transaction: {}", e))?;

        let deleted = sqlx::query(
            "DELETE FROM dishes WHERE id = $1 AND menu_id = $2 AND submenu_id = $3",
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

        sqlx::query("UPDATE submenus SET dishes_count = dishes_count - 1 WHERE id = $1")
            .bind(submenu_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!("failed to decrement submenu dishes_count: {}", e))?;
        sqlx::query("UPDATE menus SET dishes_count = dishes_count - 1 WHERE id = $1")
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
