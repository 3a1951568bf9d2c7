//! End-to-end tests of the catalog REST API against the in-memory backend.
//!
//! These assert the exact wire contract: status codes, string ids, numeric
//! counters, fixed 404 details, and delete confirmations.

use axum_test::TestServer;
use serde_json::{Value, json};

use carte::server::ServerBuilder;
use carte::storage::InMemoryCatalog;

fn server() -> TestServer {
    let app = ServerBuilder::new()
        .with_store(InMemoryCatalog::new())
        .build()
        .expect("router should build");
    TestServer::new(app)
}

async fn create_menu(server: &TestServer, title: &str) -> Value {
    let response = server
        .post("/api/v1/menus")
        .json(&json!({
            "title": title,
            "description": format!("{}_description", title),
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

async fn create_submenu(server: &TestServer, menu_id: &str, title: &str) -> Value {
    let response = server
        .post(&format!("/api/v1/menus/{}/submenus", menu_id))
        .json(&json!({
            "title": title,
            "description": format!("{}_description", title),
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

async fn create_dish(
    server: &TestServer,
    menu_id: &str,
    submenu_id: &str,
    title: &str,
    price: &str,
) -> Value {
    let response = server
        .post(&format!(
            "/api/v1/menus/{}/submenus/{}/dishes",
            menu_id, submenu_id
        ))
        .json(&json!({
            "title": title,
            "description": format!("{}_description", title),
            "price": price,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn test_health() {
    let server = server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_get_menus_empty() {
    let server = server();

    let response = server.get("/api/v1/menus").await;
    response.assert_status_ok();
    response.assert_json(&json!([]));
}

#[tokio::test]
async fn test_post_menus() {
    let server = server();

    let created = create_menu(&server, "menu1").await;
    assert_eq!(
        created,
        json!({
            "id": "1",
            "title": "menu1",
            "description": "menu1_description",
            "submenus_count": 0,
            "dishes_count": 0,
        })
    );

    create_menu(&server, "menu2").await;

    let response = server.get("/api/v1/menus").await;
    response.assert_status_ok();
    response.assert_json(&json!([
        {
            "id": "1",
            "title": "menu1",
            "description": "menu1_description",
            "submenus_count": 0,
            "dishes_count": 0,
        },
        {
            "id": "2",
            "title": "menu2",
            "description": "menu2_description",
            "submenus_count": 0,
            "dishes_count": 0,
        },
    ]));
}

#[tokio::test]
async fn test_get_menu_error() {
    let server = server();

    let response = server.get("/api/v1/menus/10").await;
    response.assert_status_not_found();
    response.assert_json(&json!({"detail": "menu not found"}));
}

#[tokio::test]
async fn test_update_menu() {
    let server = server();
    create_menu(&server, "menu1").await;

    let response = server
        .patch("/api/v1/menus/1")
        .json(&json!({
            "title": "menu2",
            "description": "menu2_description",
        }))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "id": "1",
        "title": "menu2",
        "description": "menu2_description",
        "submenus_count": 0,
        "dishes_count": 0,
    }));
}

#[tokio::test]
async fn test_update_missing_menu_error() {
    let server = server();

    let response = server
        .patch("/api/v1/menus/10")
        .json(&json!({"title": "menu1", "description": "menu1_description"}))
        .await;
    response.assert_status_not_found();
    response.assert_json(&json!({"detail": "menu not found"}));
}

#[tokio::test]
async fn test_delete_menu_confirmation() {
    let server = server();
    create_menu(&server, "menu1").await;

    let response = server.delete("/api/v1/menus/1").await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "status": true,
        "message": "The menu has been deleted",
    }));

    server.get("/api/v1/menus/1").await.assert_status_not_found();
}

#[tokio::test]
async fn test_delete_missing_menu_error() {
    let server = server();

    let response = server.delete("/api/v1/menus/10").await;
    response.assert_status_not_found();
    response.assert_json(&json!({"detail": "menu not found"}));
}

#[tokio::test]
async fn test_submenu_crud_and_counters() {
    let server = server();
    let menu = create_menu(&server, "menu1").await;
    let menu_id = menu["id"].as_str().unwrap();

    let submenu = create_submenu(&server, menu_id, "submenu1").await;
    assert_eq!(
        submenu,
        json!({
            "id": "1",
            "menu_id": "1",
            "title": "submenu1",
            "description": "submenu1_description",
            "dishes_count": 0,
        })
    );

    // Parent counter is visible immediately
    let response = server.get("/api/v1/menus/1").await;
    assert_eq!(response.json::<Value>()["submenus_count"], json!(1));

    let response = server
        .patch("/api/v1/menus/1/submenus/1")
        .json(&json!({"title": "submenu2", "description": "submenu2_description"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["title"], "submenu2");

    let response = server.delete("/api/v1/menus/1/submenus/1").await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "status": true,
        "message": "The submenu has been deleted",
    }));

    let response = server.get("/api/v1/menus/1").await;
    assert_eq!(response.json::<Value>()["submenus_count"], json!(0));
}

#[tokio::test]
async fn test_get_submenu_error() {
    let server = server();
    create_menu(&server, "menu1").await;

    let response = server.get("/api/v1/menus/1/submenus/10").await;
    response.assert_status_not_found();
    response.assert_json(&json!({"detail": "submenu not found"}));
}

#[tokio::test]
async fn test_create_submenu_under_missing_menu_error() {
    let server = server();

    let response = server
        .post("/api/v1/menus/10/submenus")
        .json(&json!({"title": "submenu1", "description": "submenu1_description"}))
        .await;
    response.assert_status_not_found();
    response.assert_json(&json!({"detail": "menu not found"}));
}

#[tokio::test]
async fn test_submenu_of_other_menu_is_not_visible() {
    let server = server();
    create_menu(&server, "menu1").await;
    create_menu(&server, "menu2").await;
    create_submenu(&server, "1", "submenu1").await;

    // Same submenu id, wrong menu scope
    let response = server.get("/api/v1/menus/2/submenus/1").await;
    response.assert_status_not_found();
    response.assert_json(&json!({"detail": "submenu not found"}));
}

#[tokio::test]
async fn test_dish_crud() {
    let server = server();
    create_menu(&server, "menu1").await;
    create_submenu(&server, "1", "submenu1").await;

    let dish = create_dish(&server, "1", "1", "dish1", "12.5").await;
    assert_eq!(
        dish,
        json!({
            "id": "1",
            "menu_id": "1",
            "submenu_id": "1",
            "title": "dish1",
            "description": "dish1_description",
            "price": "12.50",
        })
    );

    let response = server
        .patch("/api/v1/menus/1/submenus/1/dishes/1")
        .json(&json!({
            "title": "dish1",
            "description": "dish1_description",
            "price": "99.99",
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["price"], "99.99");

    let response = server.delete("/api/v1/menus/1/submenus/1/dishes/1").await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "status": true,
        "message": "The dish has been deleted",
    }));

    let response = server.get("/api/v1/menus/1/submenus/1/dishes/1").await;
    response.assert_status_not_found();
    response.assert_json(&json!({"detail": "dish not found"}));
}

#[tokio::test]
async fn test_dish_accepts_numeric_price() {
    let server = server();
    create_menu(&server, "menu1").await;
    create_submenu(&server, "1", "submenu1").await;

    let response = server
        .post("/api/v1/menus/1/submenus/1/dishes")
        .json(&json!({
            "title": "dish1",
            "description": "dish1_description",
            "price": 100,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["price"], "100.00");
}

#[tokio::test]
async fn test_listing_under_missing_parent_is_empty() {
    let server = server();

    let response = server.get("/api/v1/menus/10/submenus").await;
    response.assert_status_ok();
    response.assert_json(&json!([]));

    let response = server.get("/api/v1/menus/10/submenus/20/dishes").await;
    response.assert_status_ok();
    response.assert_json(&json!([]));
}

#[tokio::test]
async fn test_full_scenario_counters_and_cascade() {
    let server = server();

    // Create the tree
    let menu = create_menu(&server, "menu1").await;
    assert_eq!(menu["id"], "1");
    assert_eq!(menu["submenus_count"], json!(0));
    assert_eq!(menu["dishes_count"], json!(0));

    create_submenu(&server, "1", "submenu1").await;
    let response = server.get("/api/v1/menus/1").await;
    assert_eq!(response.json::<Value>()["submenus_count"], json!(1));

    create_dish(&server, "1", "1", "dish1", "100").await;
    let response = server.get("/api/v1/menus/1/submenus/1").await;
    assert_eq!(response.json::<Value>()["dishes_count"], json!(1));
    let response = server.get("/api/v1/menus/1").await;
    assert_eq!(response.json::<Value>()["dishes_count"], json!(1));

    // Cascade the submenu away: both menu counters return to zero and the
    // dish is no longer retrievable
    server
        .delete("/api/v1/menus/1/submenus/1")
        .await
        .assert_status_ok();

    let menu = server.get("/api/v1/menus/1").await.json::<Value>();
    assert_eq!(menu["submenus_count"], json!(0));
    assert_eq!(menu["dishes_count"], json!(0));

    let response = server.get("/api/v1/menus/1/submenus/1/dishes/1").await;
    response.assert_status_not_found();
    response.assert_json(&json!({"detail": "dish not found"}));
}

#[tokio::test]
async fn test_menu_cascade_over_http() {
    let server = server();
    create_menu(&server, "menu1").await;
    create_submenu(&server, "1", "submenu1").await;
    create_dish(&server, "1", "1", "dish1", "100").await;

    server.delete("/api/v1/menus/1").await.assert_status_ok();

    server.get("/api/v1/menus/1").await.assert_status_not_found();
    server
        .get("/api/v1/menus/1/submenus/1")
        .await
        .assert_status_not_found();
    server
        .get("/api/v1/menus/1/submenus/1/dishes/1")
        .await
        .assert_status_not_found();
    // Listings under the removed tree are empty, not errors
    server.get("/api/v1/menus/1/submenus").await.assert_json(&json!([]));
}
