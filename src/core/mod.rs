//! Core module containing the catalog domain: entities, errors, the
//! storage trait, and the catalog service

pub mod entity;
pub mod error;
pub mod service;
pub mod store;

pub use entity::{Dish, DishDraft, EntityKind, Menu, MenuDraft, Submenu, SubmenuDraft};
pub use error::CatalogError;
pub use service::CatalogService;
pub use store::{CatalogStore, StoreError, StoreResult};
