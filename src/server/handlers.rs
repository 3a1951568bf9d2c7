//! HTTP handlers for the catalog API
//!
//! Handlers are thin: extract path/body, delegate to [`CatalogService`],
//! and let [`CatalogError`]'s `IntoResponse` shape the failure bodies.
//! Creates respond 201; deletes respond with a confirmation body matching
//! the public API contract (`{"status": true, "message": "The menu has
//! been deleted"}`).

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::core::entity::{Dish, DishDraft, EntityKind, Menu, MenuDraft, Submenu, SubmenuDraft};
use crate::core::error::CatalogError;
use crate::core::service::CatalogService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
}

/// Confirmation body returned by the delete endpoints.
#[derive(Debug, Serialize)]
pub struct DeleteConfirmation {
    pub status: bool,
    pub message: String,
}

impl DeleteConfirmation {
    fn for_kind(kind: EntityKind) -> Self {
        Self {
            status: true,
            message: format!("The {} has been deleted", kind),
        }
    }
}

// === Menus ===

pub async fn list_menus(State(state): State<AppState>) -> Result<Json<Vec<Menu>>, CatalogError> {
    Ok(Json(state.catalog.list_menus().await?))
}

pub async fn get_menu(
    State(state): State<AppState>,
    Path(menu_id): Path<i64>,
) -> Result<Json<Menu>, CatalogError> {
    Ok(Json(state.catalog.get_menu(menu_id).await?))
}

pub async fn create_menu(
    State(state): State<AppState>,
    Json(draft): Json<MenuDraft>,
) -> Result<impl IntoResponse, CatalogError> {
    let menu = state.catalog.create_menu(draft).await?;
    Ok((StatusCode::CREATED, Json(menu)))
}

pub async fn update_menu(
    State(state): State<AppState>,
    Path(menu_id): Path<i64>,
    Json(draft): Json<MenuDraft>,
) -> Result<Json<Menu>, CatalogError> {
    Ok(Json(state.catalog.update_menu(menu_id, draft).await?))
}

pub async fn delete_menu(
    State(state): State<AppState>,
    Path(menu_id): Path<i64>,
) -> Result<Json<DeleteConfirmation>, CatalogError> {
    state.catalog.delete_menu(menu_id).await?;
    Ok(Json(DeleteConfirmation::for_kind(EntityKind::Menu)))
}

// === Submenus ===

pub async fn list_submenus(
    State(state): State<AppState>,
    Path(menu_id): Path<i64>,
) -> Result<Json<Vec<Submenu>>, CatalogError> {
    Ok(Json(state.catalog.list_submenus(menu_id).await?))
}

pub async fn get_submenu(
    State(state): State<AppState>,
    Path((menu_id, submenu_id)): Path<(i64, i64)>,
) -> Result<Json<Submenu>, CatalogError> {
    Ok(Json(state.catalog.get_submenu(menu_id, submenu_id).await?))
}

pub async fn create_submenu(
    State(state): State<AppState>,
    Path(menu_id): Path<i64>,
    Json(draft): Json<SubmenuDraft>,
) -> Result<impl IntoResponse, CatalogError> {
    let submenu = state.catalog.create_submenu(menu_id, draft).await?;
    Ok((StatusCode::CREATED, Json(submenu)))
}

pub async fn update_submenu(
    State(state): State<AppState>,
    Path((menu_id, submenu_id)): Path<(i64, i64)>,
    Json(draft): Json<SubmenuDraft>,
) -> Result<Json<Submenu>, CatalogError> {
    Ok(Json(
        state
            .catalog
            .update_submenu(menu_id, submenu_id, draft)
            .await?,
    ))
}

pub async fn delete_submenu(
    State(state): State<AppState>,
    Path((menu_id, submenu_id)): Path<(i64, i64)>,
) -> Result<Json<DeleteConfirmation>, CatalogError> {
    state.catalog.delete_submenu(menu_id, submenu_id).await?;
    Ok(Json(DeleteConfirmation::for_kind(EntityKind::Submenu)))
}

// === Dishes ===

pub async fn list_dishes(
    State(state): State<AppState>,
    Path((menu_id, submenu_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<Dish>>, CatalogError> {
    Ok(Json(state.catalog.list_dishes(menu_id, submenu_id).await?))
}

pub async fn get_dish(
    State(state): State<AppState>,
    Path((menu_id, submenu_id, dish_id)): Path<(i64, i64, i64)>,
) -> Result<Json<Dish>, CatalogError> {
    Ok(Json(
        state.catalog.get_dish(menu_id, submenu_id, dish_id).await?,
    ))
}

pub async fn create_dish(
    State(state): State<AppState>,
    Path((menu_id, submenu_id)): Path<(i64, i64)>,
    Json(draft): Json<DishDraft>,
) -> Result<impl IntoResponse, CatalogError> {
    let dish = state.catalog.create_dish(menu_id, submenu_id, draft).await?;
    Ok((StatusCode::CREATED, Json(dish)))
}

pub async fn update_dish(
    State(state): State<AppState>,
    Path((menu_id, submenu_id, dish_id)): Path<(i64, i64, i64)>,
    Json(draft): Json<DishDraft>,
) -> Result<Json<Dish>, CatalogError> {
    Ok(Json(
        state
            .catalog
            .update_dish(menu_id, submenu_id, dish_id, draft)
            .await?,
    ))
}

pub async fn delete_dish(
    State(state): State<AppState>,
    Path((menu_id, submenu_id, dish_id)): Path<(i64, i64, i64)>,
) -> Result<Json<DeleteConfirmation>, CatalogError> {
    state
        .catalog
        .delete_dish(menu_id, submenu_id, dish_id)
        .await?;
    Ok(Json(DeleteConfirmation::for_kind(EntityKind::Dish)))
}
