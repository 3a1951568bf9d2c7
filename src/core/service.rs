//! Catalog service: the operation contract over the storage trait
//!
//! [`CatalogService`] implements create/read/update/delete for each level of
//! the hierarchy. It owns the error taxonomy (which entity kind a 404 names)
//! and the scoping rules; the atomic counter/cascade mechanics live behind
//! [`CatalogStore`].

use std::sync::Arc;

use crate::core::entity::{Dish, DishDraft, EntityKind, Menu, MenuDraft, Submenu, SubmenuDraft};
use crate::core::error::CatalogError;
use crate::core::store::{CatalogStore, StoreError};

/// Transport-agnostic catalog operations.
///
/// Cheap to clone; handlers share one instance via `Arc`.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    // === Menus ===

    /// All menus, insertion order.
    pub async fn list_menus(&self) -> Result<Vec<Menu>, CatalogError> {
        Ok(self.store.list_menus().await?)
    }

    pub async fn get_menu(&self, id: i64) -> Result<Menu, CatalogError> {
        self.store
            .get_menu(id)
            .await?
            .ok_or(CatalogError::NotFound(EntityKind::Menu))
    }

    /// Create a menu with both counters at zero.
    pub async fn create_menu(&self, draft: MenuDraft) -> Result<Menu, CatalogError> {
        let menu = self.store.insert_menu(&draft).await?;
        tracing::debug!(menu_id = menu.id, "menu created");
        Ok(menu)
    }

    /// Update title/description; counters and children untouched.
    pub async fn update_menu(&self, id: i64, draft: MenuDraft) -> Result<Menu, CatalogError> {
        self.store
            .update_menu(id, &draft)
            .await?
            .ok_or(CatalogError::NotFound(EntityKind::Menu))
    }

    /// Delete a menu and its whole subtree.
    pub async fn delete_menu(&self, id: i64) -> Result<(), CatalogError> {
        if self.store.delete_menu(id).await? {
            tracing::debug!(menu_id = id, "menu deleted");
            Ok(())
        } else {
            Err(CatalogError::NotFound(EntityKind::Menu))
        }
    }

    // === Submenus ===

    /// Submenus of a menu. An unknown menu id yields an empty list — the
    /// listing endpoints are deliberately permissive.
    pub async fn list_submenus(&self, menu_id: i64) -> Result<Vec<Submenu>, CatalogError> {
        Ok(self.store.list_submenus(menu_id).await?)
    }

    pub async fn get_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<Submenu, CatalogError> {
        self.store
            .get_submenu(menu_id, submenu_id)
            .await?
            .ok_or(CatalogError::NotFound(EntityKind::Submenu))
    }

    /// Create a submenu under an existing menu; the parent's
    /// `submenus_count` is incremented atomically with the insert.
    pub async fn create_submenu(
        &self,
        menu_id: i64,
        draft: SubmenuDraft,
    ) -> Result<Submenu, CatalogError> {
        let submenu = self.store.insert_submenu(menu_id, &draft).await?;
        tracing::debug!(menu_id, submenu_id = submenu.id, "submenu created");
        Ok(submenu)
    }

    pub async fn update_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
        draft: SubmenuDraft,
    ) -> Result<Submenu, CatalogError> {
        self.store
            .update_submenu(menu_id, submenu_id, &draft)
            .await?
            .ok_or(CatalogError::NotFound(EntityKind::Submenu))
    }

    /// Cascade-delete a submenu: its dishes go with it, and the parent
    /// menu's counters are adjusted in the same atomic unit.
    pub async fn delete_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<(), CatalogError> {
        if self.store.delete_submenu(menu_id, submenu_id).await? {
            tracing::debug!(menu_id, submenu_id, "submenu deleted");
            Ok(())
        } else {
            Err(CatalogError::NotFound(EntityKind::Submenu))
        }
    }

    // === Dishes ===

    /// Dishes of a (menu, submenu) pair; permissive on unknown parents.
    pub async fn list_dishes(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<Vec<Dish>, CatalogError> {
        Ok(self.store.list_dishes(menu_id, submenu_id).await?)
    }

    pub async fn get_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> Result<Dish, CatalogError> {
        self.store
            .get_dish(menu_id, submenu_id, dish_id)
            .await?
            .ok_or(CatalogError::NotFound(EntityKind::Dish))
    }

    /// Create a dish under an existing (menu, submenu) pair; both
    /// `dishes_count` counters are incremented atomically with the insert.
    pub async fn create_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        draft: DishDraft,
    ) -> Result<Dish, CatalogError> {
        let dish = self.store.insert_dish(menu_id, submenu_id, &draft).await?;
        tracing::debug!(menu_id, submenu_id, dish_id = dish.id, "dish created");
        Ok(dish)
    }

    pub async fn update_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
        draft: DishDraft,
    ) -> Result<Dish, CatalogError> {
        self.store
            .update_dish(menu_id, submenu_id, dish_id, &draft)
            .await?
            .ok_or(CatalogError::NotFound(EntityKind::Dish))
    }

    pub async fn delete_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> Result<(), CatalogError> {
        if self.store.delete_dish(menu_id, submenu_id, dish_id).await? {
            tracing::debug!(menu_id, submenu_id, dish_id, "dish deleted");
            Ok(())
        } else {
            Err(CatalogError::NotFound(EntityKind::Dish))
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingParent(kind) => CatalogError::NotFound(kind),
            StoreError::Backend(cause) => CatalogError::Storage(cause),
        }
    }
}
