//! Router builder for the catalog API
//!
//! All catalog routes live under the `/api/v1` prefix:
//! - GET/POST `/menus`, GET/PATCH/DELETE `/menus/{id}`
//! - the same shape one level down for `/menus/{id}/submenus[/{id}]`
//! - and one more for `.../submenus/{id}/dishes[/{id}]`
//!
//! A `/health` route sits outside the prefix.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{
    AppState, create_dish, create_menu, create_submenu, delete_dish, delete_menu, delete_submenu,
    get_dish, get_menu, get_submenu, list_dishes, list_menus, list_submenus, update_dish,
    update_menu, update_submenu,
};

/// Build the full application router from shared state.
pub fn build_router(state: AppState) -> Router {
    let catalog_routes = Router::new()
        .route("/menus", get(list_menus).post(create_menu))
        .route(
            "/menus/{menu_id}",
            get(get_menu).patch(update_menu).delete(delete_menu),
        )
        .route(
            "/menus/{menu_id}/submenus",
            get(list_submenus).post(create_submenu),
        )
        .route(
            "/menus/{menu_id}/submenus/{submenu_id}",
            get(get_submenu).patch(update_submenu).delete(delete_submenu),
        )
        .route(
            "/menus/{menu_id}/submenus/{submenu_id}/dishes",
            get(list_dishes).post(create_dish),
        )
        .route(
            "/menus/{menu_id}/submenus/{submenu_id}/dishes/{dish_id}",
            get(get_dish).patch(update_dish).delete(delete_dish),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", catalog_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "carte"
    }))
}
