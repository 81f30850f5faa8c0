//! End-to-end API tests over an in-memory SQLite database.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use od_api::{routes, AppState};
use od_core::db::{create_pool, create_staff_profile_repository, run_migrations};
use od_core::staff::{Position, Role, StaffProfile};

/// Creates a router over a fresh in-memory database.
async fn test_app() -> (Router, AppState) {
    let db_url = format!(
        "sqlite:file:api_test_{}?mode=memory&cache=shared",
        Uuid::new_v4()
    );
    let pool = create_pool(&db_url).await.expect("Failed to create pool");
    run_migrations(&pool).await.expect("Failed to run migrations");

    let state = AppState::new(pool);
    (routes::create_router(state.clone()), state)
}

/// Seeds a staff profile with the given role and returns its account id.
async fn seed_staff(state: &AppState, role: Role) -> Uuid {
    let user_id = Uuid::new_v4();
    let mut profile = StaffProfile::new(user_id);
    profile.last_name = "Tester".to_string();
    // Records clerk is valid without a management unit or department
    // placement and grants no write permissions by position.
    profile.position = Position::RecordsClerk;
    profile.role = role;
    create_staff_profile_repository(&state.db)
        .create(&profile)
        .await
        .expect("Failed to seed staff profile");
    user_id
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, user_id: Option<Uuid>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(id) = user_id {
        builder = builder.header("X-User-Id", id.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response was not JSON")
    };
    (status, body)
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let (app, _state) = test_app().await;

    let (status, body) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database_connected"], true);
}

#[tokio::test]
async fn anonymous_reads_are_allowed() {
    let (app, _state) = test_app().await;

    let (status, body) = send(app, get("/api/categories")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().is_some());
}

#[tokio::test]
async fn writes_without_identity_are_rejected() {
    let (app, _state) = test_app().await;

    let (status, body) = send(
        app,
        post_json("/api/categories", None, &json!({ "name": "Banks" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn viewer_cannot_create_categories() {
    let (app, state) = test_app().await;
    let viewer = seed_staff(&state, Role::Viewer).await;

    let (status, _body) = send(
        app,
        post_json("/api/categories", Some(viewer), &json!({ "name": "Banks" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_creates_and_fetches_category() {
    let (app, state) = test_app().await;
    let admin = seed_staff(&state, Role::Admin).await;

    let (status, created) = send(
        app.clone(),
        post_json(
            "/api/categories",
            Some(admin),
            &json!({ "name": "Commercial Banks", "description": "Licensed banks" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "commercial-banks");

    let (status, fetched) = send(app, get("/api/categories/commercial-banks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Commercial Banks");
}

#[tokio::test]
async fn unknown_category_returns_not_found() {
    let (app, _state) = test_app().await;

    let (status, body) = send(app, get("/api/categories/no-such-slug")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn admin_creates_organization_in_category() {
    let (app, state) = test_app().await;
    let admin = seed_staff(&state, Role::Admin).await;

    let (status, _) = send(
        app.clone(),
        post_json(
            "/api/categories",
            Some(admin),
            &json!({ "name": "Banks" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, org) = send(
        app.clone(),
        post_json(
            "/api/organizations",
            Some(admin),
            &json!({ "name": "Alpha Bank", "category": "banks" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(org["slug"], "alpha-bank");

    let (status, listed) = send(app, get("/api/organizations?category=banks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total_items"], 1);
}

#[tokio::test]
async fn validation_errors_carry_field_details() {
    let (app, state) = test_app().await;
    let admin = seed_staff(&state, Role::Admin).await;

    let (status, body) = send(
        app,
        post_json("/api/categories", Some(admin), &json!({ "name": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn audit_trail_requires_admin() {
    let (app, state) = test_app().await;
    let viewer = seed_staff(&state, Role::Viewer).await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/audit")
        .header("X-User-Id", viewer.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, _body) = send(app, request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn category_writes_appear_in_audit_trail() {
    let (app, state) = test_app().await;
    let admin = seed_staff(&state, Role::Admin).await;

    let (status, _) = send(
        app.clone(),
        post_json("/api/categories", Some(admin), &json!({ "name": "Banks" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/audit?target_kind=category")
        .header("X-User-Id", admin.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["data"][0]["action"], "create");
}

#[tokio::test]
async fn org_reply_stats_track_the_full_letter_cycle() {
    let (app, state) = test_app().await;
    let admin = seed_staff(&state, Role::Admin).await;

    let (status, _) = send(
        app.clone(),
        post_json("/api/categories", Some(admin), &json!({ "name": "Banks" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, alpha) = send(
        app.clone(),
        post_json(
            "/api/organizations",
            Some(admin),
            &json!({ "name": "Alpha Bank", "category": "banks" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, beta) = send(
        app.clone(),
        post_json(
            "/api/organizations",
            Some(admin),
            &json!({ "name": "Beta Bank", "category": "banks" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, letter) = send(
        app.clone(),
        post_json(
            "/api/cert/letters",
            Some(admin),
            &json!({
                "number": "01/100",
                "date": "2025-03-01",
                "subject": "Quarterly certification",
                "performer": "Karimova D.",
                "has_deadline": true,
                "deadline": "2025-03-10",
                "dest_organizations": [alpha["id"], beta["id"]],
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(letter["performer"], "Karimova D.");

    // Alpha replies before the deadline; Beta never replies.
    let (status, _) = send(
        app.clone(),
        post_json(
            "/api/cert/letter-replies",
            Some(admin),
            &json!({
                "letter_id": letter["id"],
                "organization_id": alpha["id"],
                "reply_number": "R-1",
                "received_date": "2025-03-05",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, stats) = send(app, get("/api/statistics/org-replies")).await;
    assert_eq!(status, StatusCode::OK);

    let rows = stats.as_array().expect("stats should be an array");
    assert_eq!(rows.len(), 2);

    // Sorted by on-time ratio descending.
    assert_eq!(rows[0]["organization_name"], "Alpha Bank");
    assert_eq!(rows[0]["total"], 1);
    assert_eq!(rows[0]["on_time"], 1);
    assert_eq!(rows[0]["on_time_ratio"], 1.0);

    assert_eq!(rows[1]["organization_name"], "Beta Bank");
    assert_eq!(rows[1]["no_reply"], 1);
    assert_eq!(rows[1]["on_time_ratio"], 0.0);
}

#[tokio::test]
async fn statistics_endpoints_respond_on_empty_data() {
    let (app, _state) = test_app().await;

    let (status, body) = send(app.clone(), get("/api/statistics/letters-by-month")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().is_some());

    let (status, body) = send(app, get("/api/statistics/employees-count")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}
