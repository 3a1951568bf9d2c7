//! # Carte
//!
//! A hierarchical menu catalog service: menus own submenus, submenus own
//! dishes, exposed as a REST API with full CRUD at every level.
//!
//! ## Features
//!
//! - **Three-level hierarchy**: Menu → Submenu → Dish with exclusive
//!   ownership (children never outlive their parent)
//! - **Denormalized counters**: `submenus_count`/`dishes_count` are stored
//!   and maintained incrementally, and stay exact under concurrent
//!   mutations
//! - **Cascading deletes**: removing a menu or submenu removes its whole
//!   subtree and adjusts ancestor counters in one atomic unit
//! - **Pluggable storage**: in-memory (default), embedded SQLite
//!   (`sqlite` feature), or networked PostgreSQL (`postgres` feature),
//!   selected by explicit configuration
//! - **Exact prices**: decimal-typed, never binary floating point
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use carte::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     ServerBuilder::new()
//!         .with_store(InMemoryCatalog::new())
//!         .serve("127.0.0.1:8000")
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        entity::{Dish, DishDraft, EntityKind, Menu, MenuDraft, Submenu, SubmenuDraft},
        error::CatalogError,
        service::CatalogService,
        store::{CatalogStore, StoreError},
    };

    // === Storage ===
    pub use crate::storage::InMemoryCatalog;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresCatalog;
    #[cfg(feature = "sqlite")]
    pub use crate::storage::SqliteCatalog;

    // === Config ===
    pub use crate::config::{AppConfig, DbSettings, StoreBackend};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder, build_router};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use rust_decimal::Decimal;
}
