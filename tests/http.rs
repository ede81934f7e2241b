mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use nexsys_api::{app, services::tenancy::TenantRouter, AppState};

use common::{database_count, setup_with_users, SUPERADMIN};

fn test_app(registry: std::sync::Arc<nexsys_api::db::PoolRegistry>) -> Router {
    app(AppState::new(TenantRouter::new(registry), [9u8; 32]))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn only_superadmin_can_create_companies() {
    let (registry, _node) = setup_with_users().await;
    let app = test_app(registry.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/companies/create-company",
        Some(json!({ "username": "alice", "company": "Blocked Co" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(database_count(&registry, "company_blocked_co").await, 0);

    let (status, body) = send(
        &app,
        "POST",
        "/api/companies/create-company",
        Some(json!({ "username": "nobody", "company": "Blocked Co" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, body) = send(
        &app,
        "POST",
        "/api/companies/create-company",
        Some(json!({
            "username": SUPERADMIN,
            "company": "Blue Sky",
            "admin_username": "bob",
            "password": "bob-password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["database"], "company_blue_sky");
    assert_eq!(database_count(&registry, "company_blue_sky").await, 1);

    // The recorded admin can log in to the new company.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({ "username": "bob", "company": "Blue Sky", "password": "bob-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn unknown_company_is_404_and_blank_company_is_400() {
    let (registry, _node) = setup_with_users().await;
    let app = test_app(registry.clone());

    let (status, body) = send(&app, "GET", "/api/calendar/NeverCreated", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Unknown company");
    assert!(!registry
        .cached_names()
        .contains(&"company_nevercreated".to_string()));

    let (status, _) = send(&app, "GET", "/api/calendar/%20%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tenant_routes_work_after_provisioning() {
    let (registry, _node) = setup_with_users().await;
    let app = test_app(registry.clone());

    let (status, _) = send(
        &app,
        "POST",
        "/api/companies/create-company",
        Some(json!({ "username": SUPERADMIN, "company": "Acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/status/Acme",
        Some(json!({ "status_desc": "Confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let status_id = body["status"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/clients/acme",
        Some(json!({ "firstname": "Jane", "surname": "Doe" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let client_id = body["client"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/calendar/ACME",
        Some(json!({
            "agenda": "Kick-off",
            "status_id": status_id,
            "client_id": client_id,
            "time": "09:30:00",
            "date": "2026-01-15",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["agenda"]["status_desc"], "Confirmed");
    assert_eq!(body["agenda"]["name"], "Jane");

    // Status in use cannot be deleted.
    let (status, body) = send(&app, "DELETE", &format!("/api/status/Acme/{status_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, "GET", "/api/search-clients/Acme?name=ja", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clients"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn expenditure_requires_category_description_and_amount() {
    let (registry, _node) = setup_with_users().await;
    let app = test_app(registry.clone());
    send(
        &app,
        "POST",
        "/api/companies/create-company",
        Some(json!({ "username": SUPERADMIN, "company": "Acme" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/expenditures/Acme",
        Some(json!({ "description": "Paper" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Category, description, and amount are required");

    let (status, body) = send(
        &app,
        "POST",
        "/api/expenditures/Acme",
        Some(json!({ "category_name": "Office", "description": "Paper", "amount": 12.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["expenditure"]["amount"], 12.5);

    let (_, body) = send(&app, "GET", "/api/expense-categories/Acme", None).await;
    assert_eq!(body["categories"][0]["category_name"], "Office");
}

#[tokio::test]
async fn email_password_is_stored_encrypted() {
    let (registry, _node) = setup_with_users().await;
    let app = test_app(registry.clone());
    send(
        &app,
        "POST",
        "/api/companies/create-company",
        Some(json!({ "username": SUPERADMIN, "company": "Acme" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/email/config/Acme",
        Some(json!({
            "smtpHost": "smtp.acme.test",
            "smtpPort": 587,
            "email": "office@acme.test",
            "password": "mailbox-secret",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let router = TenantRouter::new(registry);
    let tenant = router.resolve_tenant("Acme").unwrap();
    let stored: String = sqlx::query_scalar("SELECT password FROM email_settings LIMIT 1")
        .fetch_one(tenant.pool())
        .await
        .unwrap();
    assert_ne!(stored, "mailbox-secret");

    let (status, body) = send(&app, "GET", "/api/email/config/Acme", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["password"], "mailbox-secret");
    assert_eq!(body["smtpHost"], "smtp.acme.test");
}

#[tokio::test]
async fn admins_create_users_only_in_their_company() {
    let (registry, _node) = setup_with_users().await;
    let app = test_app(registry.clone());
    send(
        &app,
        "POST",
        "/api/companies/create-company",
        Some(json!({ "username": SUPERADMIN, "company": "Acme" })),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/users/create-user",
        Some(json!({
            "username": "carol",
            "password": "pw",
            "company": "Other",
            "creatorUsername": "alice",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        "/api/users/create-user",
        Some(json!({
            "username": "carol",
            "password": "pw",
            "company": "Acme",
            "creatorUsername": "alice",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = send(
        &app,
        "POST",
        "/api/users/create-user",
        Some(json!({
            "username": "carol",
            "password": "pw",
            "company": "Acme",
            "creatorUsername": "alice",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
