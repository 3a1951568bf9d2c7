//! In-memory implementation of CatalogStore for testing and development
//!
//! Tables are `BTreeMap`s keyed by id; ids are assigned from per-table
//! sequences, so ascending-key iteration is insertion order. Every mutation
//! runs under a single `RwLock` write guard, which makes each multi-write
//! (insert + counter increment, cascade delete + decrement) atomic with
//! respect to all other operations.

use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::entity::{Dish, DishDraft, EntityKind, Menu, MenuDraft, Submenu, SubmenuDraft};
use crate::core::store::{CatalogStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct CatalogState {
    menus: BTreeMap<i64, Menu>,
    submenus: BTreeMap<i64, Submenu>,
    dishes: BTreeMap<i64, Dish>,
    next_menu_id: i64,
    next_submenu_id: i64,
    next_dish_id: i64,
}

/// In-memory catalog store.
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// the single lock is the documented simplification of a single-process
/// backend — unrelated menus share it, but no lock is ever held across an
/// await point.
#[derive(Clone)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    /// Create a new, empty in-memory catalog.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogState::default())),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, CatalogState>> {
        self.state
            .read()
            .map_err(|e| StoreError::Backend(anyhow!("failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, CatalogState>> {
        self.state
            .write()
            .map_err(|e| StoreError::Backend(anyhow!("failed to acquire write lock: {}", e)))
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn list_menus(&self) -> StoreResult<Vec<Menu>> {
        let state = self.read()?;
        Ok(state.menus.values().cloned().collect())
    }

    async fn get_menu(&self, id: i64) -> StoreResult<Option<Menu>> {
        let state = self.read()?;
        Ok(state.menus.get(&id).cloned())
    }

    async fn insert_menu(&self, draft: &MenuDraft) -> StoreResult<Menu> {
        let mut state = self.write()?;

        state.next_menu_id += 1;
        let menu = Menu {
            id: state.next_menu_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            submenus_count: 0,
            dishes_count: 0,
        };
        state.menus.insert(menu.id, menu.clone());

        Ok(menu)
    }

    async fn update_menu(&self, id: i64, draft: &MenuDraft) -> StoreResult<Option<Menu>> {
        let mut state = self.write()?;

        let Some(menu) = state.menus.get_mut(&id) else {
            return Ok(None);
        };
        menu.title = draft.title.clone();
        menu.description = draft.description.clone();

        Ok(Some(menu.clone()))
    }

    async fn delete_menu(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.write()?;

        if state.menus.remove(&id).is_none() {
            return Ok(false);
        }
        state.submenus.retain(|_, submenu| submenu.menu_id != id);
        state.dishes.retain(|_, dish| dish.menu_id != id);

        Ok(true)
    }

    async fn list_submenus(&self, menu_id: i64) -> StoreResult<Vec<Submenu>> {
        let state = self.read()?;
        Ok(state
            .submenus
            .values()
            .filter(|submenu| submenu.menu_id == menu_id)
            .cloned()
            .collect())
    }

    async fn get_submenu(&self, menu_id: i64, submenu_id: i64) -> StoreResult<Option<Submenu>> {
        let state = self.read()?;
        Ok(state
            .submenus
            .get(&submenu_id)
            .filter(|submenu| submenu.menu_id == menu_id)
            .cloned())
    }

    async fn insert_submenu(&self, menu_id: i64, draft: &SubmenuDraft) -> StoreResult<Submenu> {
        let mut state = self.write()?;

        if !state.menus.contains_key(&menu_id) {
            return Err(StoreError::MissingParent(EntityKind::Menu));
        }

        state.next_submenu_id += 1;
        let submenu = Submenu {
            id: state.next_submenu_id,
            menu_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            dishes_count: 0,
        };
        state.submenus.insert(submenu.id, submenu.clone());

        // Same write guard as the insert: the increment cannot be lost
        // or observed separately.
        if let Some(menu) = state.menus.get_mut(&menu_id) {
            menu.submenus_count += 1;
        }

        Ok(submenu)
    }

    async fn update_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
        draft: &SubmenuDraft,
    ) -> StoreResult<Option<Submenu>> {
        let mut state = self.write()?;

        let Some(submenu) = state
            .submenus
            .get_mut(&submenu_id)
            .filter(|submenu| submenu.menu_id == menu_id)
        else {
            return Ok(None);
        };
        submenu.title = draft.title.clone();
        submenu.description = draft.description.clone();

        Ok(Some(submenu.clone()))
    }

    async fn delete_submenu(&self, menu_id: i64, submenu_id: i64) -> StoreResult<bool> {
        let mut state = self.write()?;

        let existed = state
            .submenus
            .get(&submenu_id)
            .is_some_and(|submenu| submenu.menu_id == menu_id);
        if !existed {
            return Ok(false);
        }
        state.submenus.remove(&submenu_id);

        // Count the dishes actually removed rather than trusting the
        // stored counter.
        let before = state.dishes.len();
        state.dishes.retain(|_, dish| dish.submenu_id != submenu_id);
        let removed = (before - state.dishes.len()) as i64;

        if let Some(menu) = state.menus.get_mut(&menu_id) {
            menu.submenus_count -= 1;
            menu.dishes_count -= removed;
        }

        Ok(true)
    }

    async fn list_dishes(&self, menu_id: i64, submenu_id: i64) -> StoreResult<Vec<Dish>> {
        let state = self.read()?;
        Ok(state
            .dishes
            .values()
            .filter(|dish| dish.menu_id == menu_id && dish.submenu_id == submenu_id)
            .cloned()
            .collect())
    }

    async fn get_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> StoreResult<Option<Dish>> {
        let state = self.read()?;
        Ok(state
            .dishes
            .get(&dish_id)
            .filter(|dish| dish.menu_id == menu_id && dish.submenu_id == submenu_id)
            .cloned())
    }

    async fn insert_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        draft: &DishDraft,
    ) -> StoreResult<Dish> {
        let mut state = self.write()?;

        if !state.menus.contains_key(&menu_id) {
            return Err(StoreError::MissingParent(EntityKind::Menu));
        }
        let submenu_matches = state
            .submenus
            .get(&submenu_id)
            .is_some_and(|submenu| submenu.menu_id == menu_id);
        if !submenu_matches {
            return Err(StoreError::MissingParent(EntityKind::Submenu));
        }

        state.next_dish_id += 1;
        let dish = Dish {
            id: state.next_dish_id,
            menu_id,
            submenu_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            price: draft.normalized_price(),
        };
        state.dishes.insert(dish.id, dish.clone());

        if let Some(menu) = state.menus.get_mut(&menu_id) {
            menu.dishes_count += 1;
        }
        if let Some(submenu) = state.submenus.get_mut(&submenu_id) {
            submenu.dishes_count += 1;
        }

        Ok(dish)
    }

    async fn update_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
        draft: &DishDraft,
    ) -> StoreResult<Option<Dish>> {
        let mut state = self.write()?;

        let Some(dish) = state
            .dishes
            .get_mut(&dish_id)
            .filter(|dish| dish.menu_id == menu_id && dish.submenu_id == submenu_id)
        else {
            return Ok(None);
        };
        dish.title = draft.title.clone();
        dish.description = draft.description.clone();
        dish.price = draft.normalized_price();

        Ok(Some(dish.clone()))
    }

    async fn delete_dish(&self, menu_id: i64, submenu_id: i64, dish_id: i64) -> StoreResult<bool> {
        let mut state = self.write()?;

        let existed = state
            .dishes
            .get(&dish_id)
            .is_some_and(|dish| dish.menu_id == menu_id && dish.submenu_id == submenu_id);
        if !existed {
            return Ok(false);
        }
        state.dishes.remove(&dish_id);

        if let Some(menu) = state.menus.get_mut(&menu_id) {
            menu.dishes_count -= 1;
        }
        if let Some(submenu) = state.submenus.get_mut(&submenu_id) {
            submenu.dishes_count -= 1;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

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
    async fn test_ids_are_sequential_per_table() {
        let store = InMemoryCatalog::new();

        let m1 = store.insert_menu(&draft("menu1")).await.unwrap();
        let m2 = store.insert_menu(&draft("menu2")).await.unwrap();
        let s1 = store.insert_submenu(m1.id, &draft("submenu1")).await.unwrap();

        assert_eq!((m1.id, m2.id), (1, 2));
        // Submenus have their own sequence
        assert_eq!(s1.id, 1);
    }

    #[tokio::test]
    async fn test_list_menus_is_insertion_ordered() {
        let store = InMemoryCatalog::new();
        for title in ["menu1", "menu2", "menu3"] {
            store.insert_menu(&draft(title)).await.unwrap();
        }

        let titles: Vec<_> = store
            .list_menus()
            .await
            .unwrap()
            .into_iter()
            .map(|menu| menu.title)
            .collect();
        assert_eq!(titles, ["menu1", "menu2", "menu3"]);
    }

    #[tokio::test]
    async fn test_insert_submenu_requires_menu() {
        let store = InMemoryCatalog::new();

        let err = store.insert_submenu(1, &draft("submenu1")).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingParent(EntityKind::Menu)));
    }

    #[tokio::test]
    async fn test_insert_dish_rejects_submenu_of_other_menu() {
        let store = InMemoryCatalog::new();
        let m1 = store.insert_menu(&draft("menu1")).await.unwrap();
        let m2 = store.insert_menu(&draft("menu2")).await.unwrap();
        let submenu = store.insert_submenu(m1.id, &draft("submenu1")).await.unwrap();

        // Submenu exists, but not under m2
        let err = store
            .insert_dish(m2.id, submenu.id, &dish_draft("dish1", "100"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingParent(EntityKind::Submenu)));
    }

    #[tokio::test]
    async fn test_dish_price_is_normalized_to_two_digits() {
        let store = InMemoryCatalog::new();
        let menu = store.insert_menu(&draft("menu1")).await.unwrap();
        let submenu = store.insert_submenu(menu.id, &draft("submenu1")).await.unwrap();

        let dish = store
            .insert_dish(menu.id, submenu.id, &dish_draft("dish1", "100"))
            .await
            .unwrap();

        assert_eq!(dish.price.to_string(), "100.00");
    }

    #[tokio::test]
    async fn test_cascade_delete_menu_leaves_no_orphans() {
        let store = InMemoryCatalog::new();
        let menu = store.insert_menu(&draft("menu1")).await.unwrap();
        let submenu = store.insert_submenu(menu.id, &draft("submenu1")).await.unwrap();
        store
            .insert_dish(menu.id, submenu.id, &dish_draft("dish1", "100"))
            .await
            .unwrap();

        assert!(store.delete_menu(menu.id).await.unwrap());

        assert!(store.list_submenus(menu.id).await.unwrap().is_empty());
        assert!(
            store
                .list_dishes(menu.id, submenu.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_cascade_delete_submenu_decrements_by_live_dish_count() {
        let store = InMemoryCatalog::new();
        let menu = store.insert_menu(&draft("menu1")).await.unwrap();
        let submenu = store.insert_submenu(menu.id, &draft("submenu1")).await.unwrap();
        let other = store.insert_submenu(menu.id, &draft("submenu2")).await.unwrap();
        for i in 0..4 {
            store
                .insert_dish(menu.id, submenu.id, &dish_draft(&format!("dish{}", i), "10"))
                .await
                .unwrap();
        }
        store
            .insert_dish(menu.id, other.id, &dish_draft("kept", "10"))
            .await
            .unwrap();

        assert!(store.delete_submenu(menu.id, submenu.id).await.unwrap());

        let menu = store.get_menu(menu.id).await.unwrap().unwrap();
        assert_eq!(menu.submenus_count, 1);
        // Only the kept dish under the sibling remains counted
        assert_eq!(menu.dishes_count, 1);
    }

    #[tokio::test]
    async fn test_delete_submenu_twice_reports_missing_second_time() {
        let store = InMemoryCatalog::new();
        let menu = store.insert_menu(&draft("menu1")).await.unwrap();
        let submenu = store.insert_submenu(menu.id, &draft("submenu1")).await.unwrap();

        assert!(store.delete_submenu(menu.id, submenu.id).await.unwrap());
        assert!(!store.delete_submenu(menu.id, submenu.id).await.unwrap());

        // The counter was decremented exactly once
        let menu = store.get_menu(menu.id).await.unwrap().unwrap();
        assert_eq!(menu.submenus_count, 0);
    }
}
