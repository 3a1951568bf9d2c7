//! Storage trait for the catalog
//!
//! [`CatalogStore`] is the persistence boundary: backends provide CRUD
//! primitives for the three entity tables plus the composite mutations that
//! must be atomic (insert-plus-counter-increment, delete-plus-decrement,
//! cascade delete). The service layer is agnostic to the backend.
//!
//! # Atomicity contract
//!
//! Every method that touches more than one row is a single atomic unit
//! relative to concurrent operations on the same rows:
//!
//! - `insert_submenu` applies the insert and the parent's
//!   `submenus_count` increment together; two concurrent inserts against
//!   one menu must both be counted (no lost update).
//! - `insert_dish` / `delete_dish` apply the row change and both dish
//!   counters together.
//! - `delete_submenu` removes the submenu's dishes, the submenu itself, and
//!   adjusts the parent's `submenus_count`/`dishes_count` as one unit; a
//!   partially applied cascade must never be observable.
//! - `delete_menu` removes the whole subtree.
//!
//! SQL backends meet this with one transaction per mutation and in-place
//! `UPDATE ... SET c = c + 1` increments (which double as parent existence
//! checks); the in-memory backend holds its write lock across the whole
//! mutation.
//!
//! Getters return `Ok(None)` / deletes return `Ok(false)` for a missing
//! target — a miss is not exceptional at this layer. Missing *parents* on
//! insert are reported as [`StoreError::MissingParent`] so the service can
//! name the right entity in its 404.

use async_trait::async_trait;

use crate::core::entity::{Dish, DishDraft, EntityKind, Menu, MenuDraft, Submenu, SubmenuDraft};

/// Errors surfaced by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An insert referenced a parent (menu or submenu) that does not exist.
    #[error("{0} not found")]
    MissingParent(EntityKind),

    /// The backend itself failed (I/O, connection, constraint violation).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence boundary for the three-level catalog.
///
/// Listings are ordered by insertion (ascending id). Scoped getters match
/// the id *and* every ancestor id; a row under a different parent is a miss.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // === Menus ===

    async fn list_menus(&self) -> StoreResult<Vec<Menu>>;

    async fn get_menu(&self, id: i64) -> StoreResult<Option<Menu>>;

    /// Insert a menu with both counters at zero; assigns the id.
    async fn insert_menu(&self, draft: &MenuDraft) -> StoreResult<Menu>;

    /// Update title/description only; counters untouched.
    async fn update_menu(&self, id: i64, draft: &MenuDraft) -> StoreResult<Option<Menu>>;

    /// Delete the menu and, transitively, all submenus and dishes under it.
    /// Returns false if the menu did not exist.
    async fn delete_menu(&self, id: i64) -> StoreResult<bool>;

    // === Submenus ===

    /// Submenus of a menu, insertion order. An unknown menu id yields an
    /// empty list, not an error.
    async fn list_submenus(&self, menu_id: i64) -> StoreResult<Vec<Submenu>>;

    async fn get_submenu(&self, menu_id: i64, submenu_id: i64) -> StoreResult<Option<Submenu>>;

    /// Insert a submenu with `dishes_count = 0` and increment the parent
    /// menu's `submenus_count`, atomically. `MissingParent(Menu)` if the
    /// menu does not exist.
    async fn insert_submenu(&self, menu_id: i64, draft: &SubmenuDraft) -> StoreResult<Submenu>;

    async fn update_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
        draft: &SubmenuDraft,
    ) -> StoreResult<Option<Submenu>>;

    /// Cascade-delete a submenu: remove its dishes, remove the submenu,
    /// decrement the parent's `submenus_count` by one and `dishes_count` by
    /// the number of dishes removed — all atomically. Returns false if the
    /// submenu did not exist under that menu.
    async fn delete_submenu(&self, menu_id: i64, submenu_id: i64) -> StoreResult<bool>;

    // === Dishes ===

    /// Dishes of a (menu, submenu) pair, insertion order; permissive on
    /// unknown parents like `list_submenus`.
    async fn list_dishes(&self, menu_id: i64, submenu_id: i64) -> StoreResult<Vec<Dish>>;

    async fn get_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> StoreResult<Option<Dish>>;

    /// Insert a dish and increment the menu's and submenu's `dishes_count`,
    /// atomically. `MissingParent(Menu)` or `MissingParent(Submenu)` when
    /// the scope does not resolve.
    async fn insert_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        draft: &DishDraft,
    ) -> StoreResult<Dish>;

    async fn update_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
        draft: &DishDraft,
    ) -> StoreResult<Option<Dish>>;

    /// Delete a dish and decrement both `dishes_count` counters atomically.
    /// Returns false if no dish matched the full (menu, submenu, dish)
    /// triple.
    async fn delete_dish(&self, menu_id: i64, submenu_id: i64, dish_id: i64) -> StoreResult<bool>;
}
