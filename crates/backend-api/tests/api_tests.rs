use std::str::FromStr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use billbuddy_auth::Authenticator;
use billbuddy_backend_api::{build_router, AppState};
use billbuddy_config::{AppConfig, RateLimitConfig};
use futures_util::StreamExt;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tempfile::TempDir;
use tower::ServiceExt;

type TestResult<T = ()> = anyhow::Result<T>;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

struct TestResponse {
    status: StatusCode,
    json: Value,
}

struct TestApp {
    router: Router,
    pool: SqlitePool,
    _db_dir: TempDir,
}

impl TestApp {
    async fn new() -> TestResult<Self> {
        Self::with_config(AppConfig::default()).await
    }

    async fn with_config(config: AppConfig) -> TestResult<Self> {
        let db_dir = TempDir::new()?;
        let db_path = db_dir.path().join("billbuddy-test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let mut options = SqliteConnectOptions::from_str(&db_url)?;
        options = options.create_if_missing(true);
        options = options.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;

        let authenticator = Authenticator::new(pool.clone(), &config.auth);
        let state = AppState::new(pool.clone(), authenticator, &config.rate_limit);
        let router = build_router(state);

        Ok(Self {
            router,
            pool,
            _db_dir: db_dir,
        })
    }

    async fn with_rate_limit(max_requests: u32) -> TestResult<Self> {
        let mut config = AppConfig::default();
        config.rate_limit = RateLimitConfig {
            max_requests,
            window_seconds: 900,
        };
        Self::with_config(config).await
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let app = self.router.clone();
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = if let Some(json_body) = body {
            let bytes = serde_json::to_vec(&json_body).expect("serialize request body");
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(bytes)
        } else {
            Body::empty()
        };

        let response = app
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("dispatch request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, json }
    }

    async fn register(&self, username: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({ "username": username, "password": password })),
            None,
        )
        .await
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/login",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login should succeed");
        response.json["data"]["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    async fn signup(&self, username: &str) -> String {
        let response = self.register(username, "pw123").await;
        assert_eq!(response.status, StatusCode::CREATED);
        self.login(username, "pw123").await
    }

    async fn create_household(&self, token: &str, name: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/v1/households",
                Some(json!({ "name": name })),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.json["data"]["id"]
            .as_str()
            .expect("household id")
            .to_string()
    }

    async fn create_bill(&self, token: &str, household_id: &str, amount: f64) -> TestResponse {
        self.request(
            Method::POST,
            "/api/v1/bills",
            Some(json!({
                "householdId": household_id,
                "amount": amount,
                "dueDate": "2024-06-01T00:00:00Z",
                "billerName": "Test Biller"
            })),
            Some(token),
        )
        .await
    }
}

// ===== HEALTH =====

#[tokio::test]
async fn health_endpoints_answer_without_auth() -> TestResult {
    let app = TestApp::new().await?;

    for uri in ["/health", "/healthz"] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json["status"], "ok");
        assert!(response.json["timestamp"].is_string());
    }

    let ready = app.request(Method::GET, "/readyz", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.json["ready"], true);

    Ok(())
}

#[tokio::test]
async fn responses_carry_security_headers() -> TestResult {
    let app = TestApp::new().await?;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())?,
        )
        .await?;

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("strict-transport-security"));
    assert!(headers.contains_key("content-security-policy"));

    Ok(())
}

// ===== AUTH =====

#[tokio::test]
async fn register_returns_created_identity_in_envelope() -> TestResult {
    let app = TestApp::new().await?;

    let response = app.register("alice", "pw123").await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json["success"], true);
    assert_eq!(response.json["data"]["username"], "alice");
    assert_eq!(response.json["data"]["role"], "user");
    assert_eq!(response.json["data"]["householdId"], Value::Null);
    assert!(response.json["data"]["id"].is_string());
    assert!(response.json["meta"]["timestamp"].is_string());
    assert!(
        response.json["data"].get("password").is_none()
            && response.json["data"].get("passwordHash").is_none(),
        "no credential material in the response"
    );

    let stored: String =
        sqlx::query_scalar("SELECT password_hash FROM users WHERE username = 'alice'")
            .fetch_one(&app.pool)
            .await?;
    assert!(stored.starts_with("$argon2"), "only the hash is persisted");

    Ok(())
}

#[tokio::test]
async fn register_rejects_missing_fields_with_validation_error() -> TestResult {
    let app = TestApp::new().await?;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({ "username": "alice" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["success"], false);
    assert_eq!(response.json["error"]["code"], "VALIDATION_ERROR");
    assert!(response.json["meta"]["requestId"].is_string());

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_always_conflicts() -> TestResult {
    let app = TestApp::new().await?;

    assert_eq!(app.register("alice", "pw123").await.status, StatusCode::CREATED);

    let second = app.register("alice", "other").await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.json["error"]["code"], "USER_EXISTS");

    Ok(())
}

#[tokio::test]
async fn login_failures_are_uniform() -> TestResult {
    let app = TestApp::new().await?;
    app.register("alice", "pw123").await;

    let unknown = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "username": "nobody", "password": "pw123" })),
            None,
        )
        .await;
    let wrong = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "username": "alice", "password": "wrong" })),
            None,
        )
        .await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.json["error"]["code"], "INVALID_CREDENTIALS");
    assert_eq!(
        unknown.json["error"]["message"], wrong.json["error"]["message"],
        "no hint about which part was wrong"
    );

    Ok(())
}

#[tokio::test]
async fn refresh_requires_then_reissues_a_token() -> TestResult {
    let app = TestApp::new().await?;
    app.register("alice", "pw123").await;
    let token = app.login("alice", "pw123").await;

    let missing = app
        .request(Method::POST, "/api/v1/auth/refresh", Some(json!({})), None)
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.json["error"]["code"], "MISSING_TOKEN");

    let garbage = app
        .request(
            Method::POST,
            "/api/v1/auth/refresh",
            Some(json!({ "token": "not.a.token" })),
            None,
        )
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.json["error"]["code"], "INVALID_TOKEN");

    let refreshed = app
        .request(
            Method::POST,
            "/api/v1/auth/refresh",
            Some(json!({ "token": token })),
            None,
        )
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    let new_token = refreshed.json["data"]["token"].as_str().unwrap().to_string();

    // The re-issued token works against a protected route.
    let profile = app
        .request(Method::GET, "/api/v1/users/profile", None, Some(&new_token))
        .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.json["data"]["username"], "alice");

    Ok(())
}

#[tokio::test]
async fn logout_is_a_no_op_acknowledgement() -> TestResult {
    let app = TestApp::new().await?;

    let response = app
        .request(Method::POST, "/api/v1/auth/logout", Some(json!({})), None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["data"]["message"], "Logged out");

    Ok(())
}

#[tokio::test]
async fn profile_requires_a_valid_token() -> TestResult {
    let app = TestApp::new().await?;
    let token = app.signup("alice").await;

    let no_token = app.request(Method::GET, "/api/v1/users/profile", None, None).await;
    assert_eq!(no_token.status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_token.json["error"]["code"], "NO_TOKEN");

    let bad_token = app
        .request(Method::GET, "/api/v1/users/profile", None, Some("garbage"))
        .await;
    assert_eq!(bad_token.status, StatusCode::UNAUTHORIZED);
    assert_eq!(bad_token.json["error"]["code"], "INVALID_TOKEN");

    let profile = app
        .request(Method::GET, "/api/v1/users/profile", None, Some(&token))
        .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.json["data"]["username"], "alice");

    Ok(())
}

// ===== THE FULL LIFECYCLE =====

#[tokio::test]
async fn bill_lifecycle_end_to_end() -> TestResult {
    let app = TestApp::new().await?;
    let token = app.signup("alice").await;

    let household_id = app.create_household(&token, "Home").await;

    let created = app.create_bill(&token, &household_id, 123.45).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["data"]["amount"], 123.45);
    assert_eq!(created.json["data"]["billerName"], "Test Biller");
    let bill_id = created.json["data"]["id"].as_str().unwrap().to_string();

    let fetched = app
        .request(Method::GET, &format!("/api/v1/bills/{bill_id}"), None, Some(&token))
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json["data"]["amount"], 123.45);

    let updated = app
        .request(
            Method::PUT,
            &format!("/api/v1/bills/{bill_id}"),
            Some(json!({ "amount": 99.99 })),
            Some(&token),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json["data"]["amount"], 99.99);
    assert_eq!(updated.json["data"]["householdId"], household_id.as_str());

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/v1/bills/{bill_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json["data"]["id"], bill_id.as_str());

    let gone = app
        .request(Method::GET, &format!("/api/v1/bills/{bill_id}"), None, Some(&token))
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.json["error"]["code"], "NOT_FOUND");

    Ok(())
}

// ===== HOUSEHOLDS =====

#[tokio::test]
async fn household_creation_validates_and_enrols_creator() -> TestResult {
    let app = TestApp::new().await?;
    let token = app.signup("alice").await;

    let invalid = app
        .request(Method::POST, "/api/v1/households", Some(json!({})), Some(&token))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json["error"]["code"], "VALIDATION_ERROR");

    let created = app
        .request(
            Method::POST,
            "/api/v1/households",
            Some(json!({ "name": "Home" })),
            Some(&token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["data"]["name"], "Home");
    assert_eq!(created.json["data"]["type"], "home");
    assert_eq!(created.json["data"]["role"], "owner");
    let members = created.json["data"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["username"], "alice");

    Ok(())
}

#[tokio::test]
async fn household_listing_is_scoped_and_paginated() -> TestResult {
    let app = TestApp::new().await?;
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    for name in ["Home", "Cabin", "Office"] {
        app.create_household(&alice, name).await;
    }
    app.create_household(&bob, "Bob's flat").await;

    let page = app
        .request(
            Method::GET,
            "/api/v1/households?page=1&limit=2",
            None,
            Some(&alice),
        )
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.json["data"].as_array().unwrap().len(), 2);
    assert_eq!(page.json["meta"]["page"], 1);
    assert_eq!(page.json["meta"]["limit"], 2);
    assert_eq!(page.json["meta"]["total"], 3);

    Ok(())
}

#[tokio::test]
async fn household_update_hides_existence_from_non_members() -> TestResult {
    let app = TestApp::new().await?;
    let alice = app.signup("alice").await;
    let mallory = app.signup("mallory").await;

    let household_id = app.create_household(&alice, "Home").await;

    // Non-member and nonexistent household answer identically: 404.
    let as_outsider = app
        .request(
            Method::PUT,
            &format!("/api/v1/households/{household_id}"),
            Some(json!({ "name": "Taken over" })),
            Some(&mallory),
        )
        .await;
    assert_eq!(as_outsider.status, StatusCode::NOT_FOUND);
    assert_eq!(as_outsider.json["error"]["code"], "NOT_FOUND");

    let missing = app
        .request(
            Method::PUT,
            "/api/v1/households/does-not-exist",
            Some(json!({ "name": "Ghost" })),
            Some(&mallory),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(
        as_outsider.json["error"]["message"], missing.json["error"]["message"],
        "non-member must not learn the household exists"
    );

    // The member's update goes through.
    let as_member = app
        .request(
            Method::PUT,
            &format!("/api/v1/households/{household_id}"),
            Some(json!({ "name": "Lake house", "totalMonthlyOutflow": 1200.5 })),
            Some(&alice),
        )
        .await;
    assert_eq!(as_member.status, StatusCode::OK);
    assert_eq!(as_member.json["data"]["name"], "Lake house");
    assert_eq!(as_member.json["data"]["totalMonthlyOutflow"], 1200.5);

    Ok(())
}

#[tokio::test]
async fn household_update_ignores_protected_fields() -> TestResult {
    let app = TestApp::new().await?;
    let alice = app.signup("alice").await;
    let household_id = app.create_household(&alice, "Home").await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/households/{household_id}"),
            Some(json!({ "name": "Renamed", "id": "forged-id", "members": [] })),
            Some(&alice),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["data"]["id"], household_id.as_str());
    assert_eq!(response.json["data"]["name"], "Renamed");
    assert_eq!(response.json["data"]["members"].as_array().unwrap().len(), 1);

    Ok(())
}

// ===== BILL AUTHORIZATION =====

#[tokio::test]
async fn bill_access_is_forbidden_for_non_members() -> TestResult {
    let app = TestApp::new().await?;
    let alice = app.signup("alice").await;
    let mallory = app.signup("mallory").await;

    let household_id = app.create_household(&alice, "Home").await;
    let created = app.create_bill(&alice, &household_id, 50.0).await;
    let bill_id = created.json["data"]["id"].as_str().unwrap().to_string();

    // Unlike households, an existing bill is acknowledged with 403.
    for (method, body) in [
        (Method::GET, None),
        (Method::PUT, Some(json!({ "amount": 1.0 }))),
        (Method::DELETE, None),
    ] {
        let response = app
            .request(method, &format!("/api/v1/bills/{bill_id}"), body, Some(&mallory))
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.json["error"]["code"], "FORBIDDEN");
    }

    // A missing bill is a plain 404 even for outsiders.
    let missing = app
        .request(Method::GET, "/api/v1/bills/does-not-exist", None, Some(&mallory))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn bill_creation_skips_the_membership_check() -> TestResult {
    let app = TestApp::new().await?;
    let alice = app.signup("alice").await;
    let mallory = app.signup("mallory").await;

    let household_id = app.create_household(&alice, "Home").await;

    // Current behavior: any authenticated user may attach a bill to any
    // existing household, member or not.
    let response = app.create_bill(&mallory, &household_id, 13.0).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json["data"]["householdId"], household_id.as_str());

    // But the household must exist.
    let missing = app.create_bill(&mallory, "does-not-exist", 13.0).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn bill_validation_and_listing() -> TestResult {
    let app = TestApp::new().await?;
    let token = app.signup("alice").await;
    let household_id = app.create_household(&token, "Home").await;

    let invalid = app
        .request(
            Method::POST,
            "/api/v1/bills",
            Some(json!({ "householdId": household_id })),
            Some(&token),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json["error"]["code"], "VALIDATION_ERROR");

    for (amount, due, status) in [
        (30.0, "2024-06-03T00:00:00Z", "paid"),
        (10.0, "2024-06-01T00:00:00Z", "upcoming"),
        (20.0, "2024-06-02T00:00:00Z", "upcoming"),
    ] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/bills",
                Some(json!({
                    "householdId": household_id,
                    "amount": amount,
                    "dueDate": due,
                    "status": status,
                    "billerName": "Test Biller"
                })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    // Default sort: due date ascending, with pagination meta.
    let listed = app
        .request(Method::GET, "/api/v1/bills", None, Some(&token))
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    let bills = listed.json["data"].as_array().unwrap();
    assert_eq!(bills.len(), 3);
    assert_eq!(bills[0]["amount"], 10.0);
    assert_eq!(listed.json["meta"]["total"], 3);
    assert_eq!(listed.json["meta"]["page"], 1);
    assert_eq!(listed.json["meta"]["limit"], 20);

    // Status filter plus sort-by-amount.
    let filtered = app
        .request(
            Method::GET,
            "/api/v1/bills?status=upcoming&sort=amount",
            None,
            Some(&token),
        )
        .await;
    let filtered_bills = filtered.json["data"].as_array().unwrap();
    assert_eq!(filtered_bills.len(), 2);
    assert_eq!(filtered_bills[0]["amount"], 10.0);
    assert_eq!(filtered.json["meta"]["total"], 2);

    Ok(())
}

#[tokio::test]
async fn bill_listing_excludes_other_households() -> TestResult {
    let app = TestApp::new().await?;
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let alices = app.create_household(&alice, "Home").await;
    let bobs = app.create_household(&bob, "Flat").await;
    app.create_bill(&alice, &alices, 10.0).await;
    app.create_bill(&bob, &bobs, 20.0).await;

    let listed = app
        .request(Method::GET, "/api/v1/bills", None, Some(&alice))
        .await;
    let bills = listed.json["data"].as_array().unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0]["householdId"], alices.as_str());

    Ok(())
}

// ===== UNAUTHENTICATED ACCESS =====

#[tokio::test]
async fn protected_routes_reject_unauthenticated_requests() -> TestResult {
    let app = TestApp::new().await?;

    for uri in [
        "/api/v1/bills",
        "/api/v1/households",
        "/api/v1/admin/compliance",
        "/api/v1/admin/risks",
        "/api/v1/admin/webhooks",
        "/api/v1/events/stream",
    ] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "uri: {uri}");
        assert_eq!(response.json["error"]["code"], "NO_TOKEN", "uri: {uri}");
    }

    Ok(())
}

// ===== ADMIN PANEL =====

#[tokio::test]
async fn compliance_crud_and_metrics() -> TestResult {
    let app = TestApp::new().await?;
    let token = app.signup("admin").await;

    let invalid = app
        .request(Method::POST, "/api/v1/admin/compliance", Some(json!({})), Some(&token))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let created = app
        .request(
            Method::POST,
            "/api/v1/admin/compliance",
            Some(json!({ "status": "compliant" })),
            Some(&token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let record_id = created.json["data"]["id"].as_str().unwrap().to_string();

    let metrics = app
        .request(Method::GET, "/api/v1/admin/compliance/metrics", None, Some(&token))
        .await;
    assert_eq!(metrics.json["data"]["compliantCount"], 1);

    let updated = app
        .request(
            Method::PUT,
            &format!("/api/v1/admin/compliance/{record_id}"),
            Some(json!({ "status": "pending" })),
            Some(&token),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json["data"]["status"], "pending");

    let listed = app
        .request(Method::GET, "/api/v1/admin/compliance", None, Some(&token))
        .await;
    assert_eq!(listed.json["data"].as_array().unwrap().len(), 1);

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/v1/admin/compliance/{record_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json["data"]["id"], record_id.as_str());

    // Updating a vanished record is an unexpected persistence failure.
    let vanished = app
        .request(
            Method::PUT,
            &format!("/api/v1/admin/compliance/{record_id}"),
            Some(json!({ "status": "x" })),
            Some(&token),
        )
        .await;
    assert_eq!(vanished.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(vanished.json["error"]["code"], "SERVER_ERROR");
    assert!(vanished.json["error"]["details"]["error"].is_string());

    Ok(())
}

#[tokio::test]
async fn risk_flags_crud_with_filters() -> TestResult {
    let app = TestApp::new().await?;
    let token = app.signup("admin").await;

    let incomplete = app
        .request(
            Method::POST,
            "/api/v1/admin/risks",
            Some(json!({ "userId": "user_1", "title": "Sparse" })),
            Some(&token),
        )
        .await;
    assert_eq!(incomplete.status, StatusCode::BAD_REQUEST);
    assert_eq!(incomplete.json["error"]["code"], "VALIDATION_ERROR");

    let flag = |flag_type: &str, status: &str| {
        json!({
            "userId": "user_1",
            "userName": "Alice",
            "type": flag_type,
            "category": "payments",
            "title": "Rapid transfers",
            "description": "Five transfers in a minute",
            "severity": 3,
            "status": status
        })
    };

    let created = app
        .request(
            Method::POST,
            "/api/v1/admin/risks",
            Some(flag("velocity", "open")),
            Some(&token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["data"]["type"], "velocity");
    let record_id = created.json["data"]["id"].as_str().unwrap().to_string();

    app.request(
        Method::POST,
        "/api/v1/admin/risks",
        Some(flag("geo", "resolved")),
        Some(&token),
    )
    .await;

    let filtered = app
        .request(
            Method::GET,
            "/api/v1/admin/risks?status=open&type=velocity",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(filtered.json["data"].as_array().unwrap().len(), 1);

    let refreshed = app
        .request(Method::GET, "/api/v1/admin/risks/flags", None, Some(&token))
        .await;
    assert_eq!(refreshed.json["data"].as_array().unwrap().len(), 2);

    let updated = app
        .request(
            Method::PUT,
            &format!("/api/v1/admin/risks/{record_id}"),
            Some(json!({ "status": "resolved" })),
            Some(&token),
        )
        .await;
    assert_eq!(updated.json["data"]["status"], "resolved");
    assert_eq!(updated.json["data"]["severity"], 3);

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/v1/admin/risks/{record_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn webhook_crud_and_health() -> TestResult {
    let app = TestApp::new().await?;
    let token = app.signup("admin").await;

    // No records: vacuously healthy.
    let empty_health = app
        .request(Method::GET, "/api/v1/admin/webhooks/health", None, Some(&token))
        .await;
    assert_eq!(empty_health.json["data"]["healthy"], true);

    let created = app
        .request(
            Method::POST,
            "/api/v1/admin/webhooks",
            Some(json!({ "status": "healthy" })),
            Some(&token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let record_id = created.json["data"]["id"].as_str().unwrap().to_string();

    let degraded = app
        .request(
            Method::PUT,
            &format!("/api/v1/admin/webhooks/{record_id}"),
            Some(json!({ "status": "degraded" })),
            Some(&token),
        )
        .await;
    assert_eq!(degraded.json["data"]["status"], "degraded");

    let health = app
        .request(Method::GET, "/api/v1/admin/webhooks/health", None, Some(&token))
        .await;
    assert_eq!(health.json["data"]["healthy"], false);

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/v1/admin/webhooks/{record_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    Ok(())
}

// ===== EVENTS =====

#[tokio::test]
async fn event_publish_validates_and_stamps_identity() -> TestResult {
    let app = TestApp::new().await?;
    let token = app.signup("alice").await;

    let invalid = app
        .request(
            Method::POST,
            "/api/v1/events",
            Some(json!({ "type": "bill.created" })),
            Some(&token),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json["error"]["code"], "VALIDATION_ERROR");

    let published = app
        .request(
            Method::POST,
            "/api/v1/events",
            Some(json!({ "type": "bill.created", "payload": { "amount": 1 } })),
            Some(&token),
        )
        .await;
    assert_eq!(published.status, StatusCode::CREATED);
    assert_eq!(published.json["data"]["type"], "bill.created");
    assert_eq!(published.json["data"]["payload"]["amount"], 1);
    assert!(published.json["data"]["userId"].is_string());
    assert!(published.json["data"]["timestamp"].is_string());

    Ok(())
}

#[tokio::test]
async fn event_stream_flushes_backlog_to_new_subscriber() -> TestResult {
    let app = TestApp::new().await?;
    let token = app.signup("alice").await;

    let published = app
        .request(
            Method::POST,
            "/api/v1/events",
            Some(json!({ "type": "bill.created", "payload": { "amount": 42 } })),
            Some(&token),
        )
        .await;
    assert_eq!(published.status, StatusCode::CREATED);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/v1/events/stream")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()?
        .starts_with("text/event-stream"));

    let mut body = response.into_body().into_data_stream();
    let first_chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .expect("initial flush should arrive immediately")
        .expect("stream must not be empty")?;
    let text = String::from_utf8_lossy(&first_chunk);
    assert!(text.contains("bill.created"), "got: {text}");
    assert!(text.contains("\"amount\":42"), "got: {text}");

    Ok(())
}

// ===== RATE LIMITING =====

#[tokio::test]
async fn fixed_window_rate_limit_applies_before_routing() -> TestResult {
    let app = TestApp::with_rate_limit(3).await?;

    for _ in 0..3 {
        let response = app.request(Method::GET, "/health", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let limited = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.json["success"], false);
    assert_eq!(limited.json["error"]["code"], "RATE_LIMITED");

    Ok(())
}
