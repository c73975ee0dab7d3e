use std::str::FromStr;

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD, AUTHORIZATION,
            CONTENT_TYPE, ORIGIN,
        },
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tempfile::TempDir;
use tower::ServiceExt;
use unieats_api::{build_router, AppState};
use unieats_config::AppConfig;
use unieats_database::{NewProfile, Role, MIGRATOR};

type TestResult<T = ()> = anyhow::Result<T>;

const PASSWORD: &str = "correct-horse-battery";

struct TestContext {
    _temp_dir: TempDir,
    pool: SqlitePool,
    state: AppState,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        Self::with_config(AppConfig::default()).await
    }

    async fn with_config(config: AppConfig) -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("unieats_api.sqlite");
        let db_url = format!("sqlite://{}", db_path.display());

        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;

        let state = AppState::from_config(pool.clone(), &config);

        Ok(Self {
            _temp_dir: temp_dir,
            pool,
            state,
        })
    }

    fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResult<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    async fn get(&self, uri: &str, token: &str) -> TestResult<(StatusCode, Value)> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    async fn post(&self, uri: &str, token: &str, body: Value) -> TestResult<(StatusCode, Value)> {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResult<(StatusCode, Value)> {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    async fn register(&self, email: &str, name: &str, role: Role) -> TestResult<()> {
        self.state
            .authenticator()
            .register(
                &NewProfile {
                    email: email.to_string(),
                    full_name: name.to_string(),
                    phone: None,
                    role,
                },
                PASSWORD,
            )
            .await?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, role: &str) -> TestResult<(StatusCode, Value)> {
        self.send(
            Method::POST,
            "/api/auth/sign-in",
            None,
            Some(json!({ "email": email, "password": PASSWORD, "role": role })),
        )
        .await
    }

    async fn token_for(&self, email: &str, role: &str) -> TestResult<String> {
        let (status, body) = self.sign_in(email, role).await?;
        assert_eq!(status, StatusCode::OK, "sign-in failed: {body}");
        Ok(body["token"].as_str().unwrap_or_default().to_string())
    }

    async fn admin_token(&self) -> TestResult<String> {
        self.register("admin@unieats.test", "Ada Admin", Role::Admin)
            .await?;
        self.token_for("admin@unieats.test", "admin").await
    }

    /// Sign up an owner, submit and approve their application, and return the
    /// owner's token together with the cafeteria public id.
    async fn onboard_cafeteria(
        &self,
        admin: &str,
        email: &str,
        name: &str,
    ) -> TestResult<(String, String)> {
        let (status, _) = self
            .send(
                Method::POST,
                "/api/auth/sign-up",
                None,
                Some(json!({ "email": email, "password": PASSWORD, "full_name": "Olive Owner" })),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .send(
                Method::POST,
                "/api/applications",
                None,
                Some(json!({
                    "business_name": name,
                    "contact_name": "Olive Owner",
                    "contact_email": email,
                    "location": "North Campus"
                })),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        let application_id = body["application"]["public_id"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        let (status, body) = self
            .post(
                &format!("/api/admin/applications/{application_id}/approve"),
                admin,
                json!({ "notes": "welcome" }),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        let cafeteria_id = body["cafeteria"]["public_id"].as_str().unwrap_or_default().to_string();

        let token = self.token_for(email, "cafeteria_manager").await?;
        Ok((token, cafeteria_id))
    }

    async fn add_menu_item(&self, owner: &str, name: &str, price_cents: i64) -> TestResult<i64> {
        let (status, body) = self
            .post(
                "/api/cafeteria/menu",
                owner,
                json!({ "name": name, "category": "mains", "price_cents": price_cents }),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        Ok(body["item"]["id"].as_i64().unwrap_or_default())
    }
}

#[tokio::test]
async fn health_and_openapi_are_public() -> TestResult {
    let ctx = TestContext::new().await?;

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = ctx
        .send(Method::GET, "/api-docs/openapi.json", None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/orders"].is_object());
    Ok(())
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() -> TestResult {
    let ctx = TestContext::new().await?;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/orders")
        .header(ORIGIN, "http://localhost:5173")
        .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())?;

    let response = ctx.router().oneshot(request).await?;
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).map(|v| v.as_bytes()),
        Some(&b"*"[..])
    );
    Ok(())
}

#[tokio::test]
async fn sign_up_returns_a_working_session() -> TestResult {
    let ctx = TestContext::new().await?;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/sign-up",
            None,
            Some(json!({ "email": "Sam@Campus.edu", "password": PASSWORD, "full_name": "Sam" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["role"], "student");
    assert_eq!(body["profile"]["email"], "sam@campus.edu");
    assert!(body["profile"].get("id").is_none());
    let token = body["token"].as_str().unwrap_or_default().to_string();

    let (status, body) = ctx.get("/api/auth/me", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["full_name"], "Sam");

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/sign-up",
            None,
            Some(json!({ "email": "sam@campus.edu", "password": PASSWORD, "full_name": "Sam" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = ctx
        .send(Method::POST, "/api/auth/sign-out", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.get("/api/auth/me", &token).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn sign_in_is_scoped_to_the_requested_role() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("sam@campus.edu", "Sam", Role::Student).await?;

    let (status, _) = ctx.sign_in("sam@campus.edu", "admin").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/auth/sign-in",
            None,
            Some(json!({ "email": "sam@campus.edu", "password": "wrong-password", "role": "student" })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.sign_in("sam@campus.edu", "student").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn suspended_user_cannot_sign_in() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin_token().await?;
    ctx.register("sam@campus.edu", "Sam", Role::Student).await?;
    let student = ctx.token_for("sam@campus.edu", "student").await?;

    let (_, me) = ctx.get("/api/auth/me", &student).await?;
    let user_id = me["profile"]["public_id"].as_str().unwrap_or_default().to_string();

    let (status, body) = ctx
        .patch(
            &format!("/api/admin/users/{user_id}/status"),
            &admin,
            json!({ "status": "suspended" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["status"], "suspended");

    // Existing sessions were revoked.
    let (status, _) = ctx.get("/api/auth/me", &student).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx.sign_in("sam@campus.edu", "student").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "account is suspended");

    let (status, logs) = ctx
        .get("/api/admin/audit-logs?entity_type=profile", &admin)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs["logs"][0]["action"], "user.suspended");

    let (status, _) = ctx
        .patch(
            &format!("/api/admin/users/{user_id}/status"),
            &admin,
            json!({ "status": "active" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.sign_in("sam@campus.edu", "student").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn admin_cannot_suspend_themselves() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin_token().await?;
    let (_, me) = ctx.get("/api/auth/me", &admin).await?;
    let admin_id = me["profile"]["public_id"].as_str().unwrap_or_default().to_string();

    let (status, _) = ctx
        .patch(
            &format!("/api/admin/users/{admin_id}/status"),
            &admin,
            json!({ "status": "suspended" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn back_offices_require_their_roles() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("sam@campus.edu", "Sam", Role::Student).await?;
    let student = ctx.token_for("sam@campus.edu", "student").await?;
    ctx.register("mo@campus.edu", "Mo", Role::CafeteriaManager)
        .await?;
    let manager = ctx.token_for("mo@campus.edu", "cafeteria_manager").await?;

    let (status, _) = ctx.get("/api/admin/users", &student).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = ctx.get("/api/cafeteria/menu", &student).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A manager without an approved cafeteria has nothing to manage.
    let (status, body) = ctx.get("/api/cafeteria/profile", &manager).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap_or_default().contains("No cafeteria"));

    let (status, _) = ctx
        .send(Method::GET, "/api/orders", None, None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn approval_requires_a_registered_applicant() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin_token().await?;

    let (_, body) = ctx
        .send(
            Method::POST,
            "/api/applications",
            None,
            Some(json!({
                "business_name": "Ghost Kitchen",
                "contact_name": "Nobody",
                "contact_email": "nobody@campus.edu"
            })),
        )
        .await?;
    let application_id = body["application"]["public_id"].as_str().unwrap_or_default().to_string();
    assert_eq!(body["application"]["status"], "pending");

    let (status, _) = ctx
        .post(
            &format!("/api/admin/applications/{application_id}/approve"),
            &admin,
            json!({}),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .post(
            &format!("/api/admin/applications/{application_id}/reject"),
            &admin,
            json!({ "notes": "no account" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "rejected");

    let (status, _) = ctx
        .post(
            &format!("/api/admin/applications/{application_id}/reject"),
            &admin,
            json!({}),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn order_lifecycle_keeps_revenue_balanced() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin_token().await?;
    let (owner, cafeteria_id) = ctx
        .onboard_cafeteria(&admin, "olive@campus.edu", "Olive's Deli")
        .await?;
    let wrap = ctx.add_menu_item(&owner, "Falafel Wrap", 1_235).await?;
    let soup = ctx.add_menu_item(&owner, "Lentil Soup", 499).await?;

    ctx.register("sam@campus.edu", "Sam", Role::Student).await?;
    let student = ctx.token_for("sam@campus.edu", "student").await?;

    let (status, menu) = ctx
        .send(Method::GET, &format!("/api/cafeterias/{cafeteria_id}/menu"), None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(menu["categories"][0]["category"], "mains");
    assert_eq!(menu["categories"][0]["items"].as_array().map(Vec::len), Some(2));

    let (status, body) = ctx
        .post(
            "/api/orders",
            &student,
            json!({
                "cafeteria_id": cafeteria_id,
                "items": [
                    { "menu_item_id": wrap, "quantity": 2 },
                    { "menu_item_id": soup, "quantity": 1 }
                ],
                "notes": "no onions"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = &body["order"];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["subtotal_cents"], 2_969);
    // 4% of 2969 = 118.76, 10% = 296.9
    assert_eq!(order["service_fee_cents"], 119);
    assert_eq!(order["commission_cents"], 297);
    assert_eq!(order["total_cents"], 3_088);
    assert_eq!(
        order["admin_revenue_cents"].as_i64().unwrap_or_default()
            + order["cafeteria_revenue_cents"].as_i64().unwrap_or_default(),
        order["total_cents"].as_i64().unwrap_or_default()
    );
    assert!(order["order_number"].as_str().unwrap_or_default().starts_with("ORD-"));
    assert_eq!(body["items"].as_array().map(Vec::len), Some(2));
    let order_id = order["public_id"].as_str().unwrap_or_default().to_string();

    // The owner was told about the order.
    let (_, unread) = ctx.get("/api/notifications/unread-count", &owner).await?;
    assert!(unread["unread"].as_i64().unwrap_or_default() >= 1);

    let status_uri = format!("/api/cafeteria/orders/{order_id}/status");
    let (status, _) = ctx
        .patch(&status_uri, &owner, json!({ "status": "ready" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .patch(&status_uri, &owner, json!({ "status": "preparing" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "preparing");

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/api/orders/{order_id}/cancel"),
            Some(&student),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for next in ["ready", "completed"] {
        let (status, _) = ctx
            .patch(&status_uri, &owner, json!({ "status": next }))
            .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = ctx.get(&format!("/api/orders/{order_id}"), &student).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "completed");

    let (_, notifications) = ctx.get("/api/notifications", &student).await?;
    let kinds: Vec<_> = notifications["notifications"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|n| n["kind"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(kinds.len(), 3);
    assert!(kinds.iter().all(|k| k == "order_status"));

    let (status, dashboard) = ctx.get("/api/admin/dashboard?days=7", &admin).await?;
    assert_eq!(status, StatusCode::OK);
    let totals = &dashboard["metrics"]["totals"];
    assert_eq!(totals["order_count"], 1);
    assert_eq!(totals["gross_cents"], 3_088);
    assert_eq!(
        totals["admin_revenue_cents"].as_i64().unwrap_or_default()
            + totals["cafeteria_revenue_cents"].as_i64().unwrap_or_default(),
        3_088
    );
    assert_eq!(dashboard["metrics"]["daily"].as_array().map(Vec::len), Some(7));
    assert_eq!(dashboard["by_cafeteria"][0]["cafeteria_name"], "Olive's Deli");

    let (status, dashboard) = ctx.get("/api/cafeteria/dashboard", &owner).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["top_items"][0]["item_name"], "Falafel Wrap");
    assert_eq!(dashboard["top_items"][0]["quantity"], 2);
    Ok(())
}

#[tokio::test]
async fn orders_are_validated_against_the_menu() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin_token().await?;
    let (owner, cafeteria_id) = ctx
        .onboard_cafeteria(&admin, "olive@campus.edu", "Olive's Deli")
        .await?;
    let wrap = ctx.add_menu_item(&owner, "Falafel Wrap", 1_200).await?;
    let (other_owner, _) = ctx
        .onboard_cafeteria(&admin, "pat@campus.edu", "Pat's Pies")
        .await?;
    let pie = ctx.add_menu_item(&other_owner, "Apple Pie", 400).await?;

    ctx.register("sam@campus.edu", "Sam", Role::Student).await?;
    let student = ctx.token_for("sam@campus.edu", "student").await?;

    let order = |items: Value| json!({ "cafeteria_id": cafeteria_id, "items": items });

    let (status, _) = ctx
        .post("/api/orders", &student, order(json!([{ "menu_item_id": wrap, "quantity": 51 }])))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post("/api/orders", &student, order(json!([])))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post("/api/orders", &student, order(json!([{ "menu_item_id": pie, "quantity": 1 }])))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post(
            &format!("/api/cafeteria/menu/{wrap}/availability"),
            &owner,
            json!({ "is_available": false }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx
        .post("/api/orders", &student, order(json!([{ "menu_item_id": wrap, "quantity": 1 }])))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(
            Method::PUT,
            "/api/cafeteria/profile",
            Some(&owner),
            Some(json!({ "is_open": false })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx
        .post(
            &format!("/api/cafeteria/menu/{wrap}/availability"),
            &owner,
            json!({ "is_available": true }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = ctx
        .post("/api/orders", &student, order(json!([{ "menu_item_id": wrap, "quantity": 1 }])))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("not accepting"));

    let (status, _) = ctx
        .post(
            "/api/orders",
            &student,
            json!({ "cafeteria_id": "missing", "items": [{ "menu_item_id": wrap, "quantity": 1 }] }),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn menu_prices_are_capped_so_order_totals_cannot_overflow() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin_token().await?;
    let (owner, cafeteria_id) = ctx
        .onboard_cafeteria(&admin, "olive@campus.edu", "Olive's Deli")
        .await?;

    let (status, body) = ctx
        .post(
            "/api/cafeteria/menu",
            &owner,
            json!({ "name": "Gold Leaf Cake", "price_cents": 1_000_000_000_000_000_000_i64 }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let cake = ctx.add_menu_item(&owner, "Gold Leaf Cake", 10_000_000).await?;
    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/cafeteria/menu/{cake}"),
            Some(&owner),
            Some(json!({ "price_cents": 1_000_000_000_000_000_000_i64 })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    // The schema enforces the same ceiling for writes that skip the API.
    let raw = sqlx::query("UPDATE menu_items SET price_cents = ? WHERE id = ?")
        .bind(1_000_000_000_000_000_000_i64)
        .bind(cake)
        .execute(&ctx.pool)
        .await;
    assert!(raw.is_err());

    ctx.register("sam@campus.edu", "Sam", Role::Student).await?;
    let student = ctx.token_for("sam@campus.edu", "student").await?;
    let (status, body) = ctx
        .post(
            "/api/orders",
            &student,
            json!({
                "cafeteria_id": cafeteria_id,
                "items": [{ "menu_item_id": cake, "quantity": 50 }]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = &body["order"];
    assert_eq!(order["subtotal_cents"], 500_000_000);
    assert_eq!(order["total_cents"], 520_000_000);
    assert_eq!(
        order["admin_revenue_cents"].as_i64().unwrap_or_default()
            + order["cafeteria_revenue_cents"].as_i64().unwrap_or_default(),
        520_000_000
    );
    Ok(())
}

#[tokio::test]
async fn pending_orders_can_be_cancelled_by_their_student() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin_token().await?;
    let (owner, cafeteria_id) = ctx
        .onboard_cafeteria(&admin, "olive@campus.edu", "Olive's Deli")
        .await?;
    let wrap = ctx.add_menu_item(&owner, "Falafel Wrap", 1_200).await?;

    ctx.register("sam@campus.edu", "Sam", Role::Student).await?;
    ctx.register("kim@campus.edu", "Kim", Role::Student).await?;
    let sam = ctx.token_for("sam@campus.edu", "student").await?;
    let kim = ctx.token_for("kim@campus.edu", "student").await?;

    let (_, body) = ctx
        .post(
            "/api/orders",
            &sam,
            json!({ "cafeteria_id": cafeteria_id, "items": [{ "menu_item_id": wrap, "quantity": 1 }] }),
        )
        .await?;
    let order_id = body["order"]["public_id"].as_str().unwrap_or_default().to_string();

    let (status, _) = ctx.get(&format!("/api/orders/{order_id}"), &kim).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .send(Method::POST, &format!("/api/orders/{order_id}/cancel"), Some(&sam), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "cancelled");

    let (_, list) = ctx.get("/api/orders?status=cancelled", &sam).await?;
    assert_eq!(list["orders"].as_array().map(Vec::len), Some(1));
    let (_, list) = ctx.get("/api/orders?status=pending", &sam).await?;
    assert_eq!(list["orders"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn support_thread_is_chronological() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin_token().await?;
    ctx.register("sam@campus.edu", "Sam", Role::Student).await?;
    ctx.register("kim@campus.edu", "Kim", Role::Student).await?;
    let sam = ctx.token_for("sam@campus.edu", "student").await?;
    let kim = ctx.token_for("kim@campus.edu", "student").await?;

    let (status, body) = ctx
        .post(
            "/api/support-tickets",
            &sam,
            json!({
                "subject": "Refund",
                "description": "My order never arrived",
                "priority": "high"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["ticket"]["status"], "open");
    assert_eq!(body["ticket"]["priority"], "high");
    assert!(body["ticket"]["ticket_number"].as_str().unwrap_or_default().starts_with("TKT-"));
    assert_eq!(body["responses"].as_array().map(Vec::len), Some(1));
    let ticket_id = body["ticket"]["public_id"].as_str().unwrap_or_default().to_string();
    let messages_uri = format!("/api/support-tickets/{ticket_id}/messages");

    let (status, _) = ctx
        .post(&messages_uri, &admin, json!({ "content": "Looking into it" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx
        .post(&messages_uri, &sam, json!({ "content": "Thanks!" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx
        .post(&messages_uri, &kim, json!({ "content": "Me too" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, thread) = ctx.get(&format!("/api/support-tickets/{ticket_id}"), &sam).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread["ticket"]["status"], "in_progress");
    let responses = thread["responses"].as_array().cloned().unwrap_or_default();
    let contents: Vec<_> = responses.iter().map(|m| m["content"].as_str().unwrap_or_default()).collect();
    assert_eq!(contents, vec!["My order never arrived", "Looking into it", "Thanks!"]);
    let stamps: Vec<_> = responses.iter().map(|m| m["created_at"].as_str().unwrap_or_default()).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(responses[1]["sender_role"], "admin");

    let (_, unread) = ctx.get("/api/notifications/unread-count", &sam).await?;
    assert_eq!(unread["unread"], 1);

    let (status, body) = ctx
        .patch(
            &format!("/api/admin/support-tickets/{ticket_id}"),
            &admin,
            json!({ "status": "closed" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["status"], "closed");

    let (status, _) = ctx
        .post(&messages_uri, &sam, json!({ "content": "One more thing" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, mine) = ctx.get("/api/support-tickets", &kim).await?;
    assert_eq!(mine["tickets"].as_array().map(Vec::len), Some(0));
    let (_, all) = ctx.get("/api/support-tickets?status=closed", &admin).await?;
    assert_eq!(all["tickets"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn inventory_never_goes_negative() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin_token().await?;
    let (owner, _) = ctx
        .onboard_cafeteria(&admin, "olive@campus.edu", "Olive's Deli")
        .await?;

    let (status, body) = ctx
        .post(
            "/api/cafeteria/inventory",
            &owner,
            json!({ "name": "Chickpeas", "unit": "kg", "quantity": 5.0, "reorder_level": 2.0 }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    let item_id = body["item"]["id"].as_i64().unwrap_or_default();
    let adjust_uri = format!("/api/cafeteria/inventory/{item_id}/adjust");

    let (status, _) = ctx.post(&adjust_uri, &owner, json!({ "delta": -6.0 })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx.post(&adjust_uri, &owner, json!({ "delta": -3.5 })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["quantity"], 1.5);

    let (status, low) = ctx.get("/api/cafeteria/inventory/low-stock", &owner).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(low["items"][0]["name"], "Chickpeas");

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/api/cafeteria/inventory/{item_id}"),
            Some(&owner),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.post(&adjust_uri, &owner, json!({ "delta": 1.0 })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn dashboard_counts_every_low_stock_item() -> TestResult {
    let mut config = AppConfig::default();
    config.dashboard.low_stock_limit = 2;
    let ctx = TestContext::with_config(config).await?;
    let admin = ctx.admin_token().await?;
    let (owner, _) = ctx
        .onboard_cafeteria(&admin, "olive@campus.edu", "Olive's Deli")
        .await?;

    for (name, quantity) in [("Chickpeas", 0.5), ("Tahini", 1.0), ("Pita", 0.0), ("Parsley", 9.0)] {
        let (status, body) = ctx
            .post(
                "/api/cafeteria/inventory",
                &owner,
                json!({ "name": name, "unit": "kg", "quantity": quantity, "reorder_level": 2.0 }),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, low) = ctx.get("/api/cafeteria/inventory/low-stock", &owner).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(low["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(low["items"][0]["name"], "Pita");

    let (status, dashboard) = ctx.get("/api/cafeteria/dashboard", &owner).await?;
    assert_eq!(status, StatusCode::OK, "{dashboard}");
    assert_eq!(dashboard["low_stock_items"], 3);
    Ok(())
}

#[tokio::test]
async fn suspended_cafeterias_disappear_from_browsing() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.admin_token().await?;
    let (_, cafeteria_id) = ctx
        .onboard_cafeteria(&admin, "olive@campus.edu", "Olive's Deli")
        .await?;

    let (_, list) = ctx.send(Method::GET, "/api/cafeterias", None, None).await?;
    assert_eq!(list["cafeterias"].as_array().map(Vec::len), Some(1));

    let (status, _) = ctx
        .patch(
            &format!("/api/admin/cafeterias/{cafeteria_id}/status"),
            &admin,
            json!({ "status": "suspended" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = ctx.send(Method::GET, "/api/cafeterias", None, None).await?;
    assert_eq!(list["cafeterias"].as_array().map(Vec::len), Some(0));
    let (status, _) = ctx
        .send(Method::GET, &format!("/api/cafeterias/{cafeteria_id}"), None, None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, admin_list) = ctx
        .get("/api/admin/cafeterias?status=suspended", &admin)
        .await?;
    assert_eq!(admin_list["cafeterias"].as_array().map(Vec::len), Some(1));

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM audit_logs WHERE entity_type = 'cafeteria'")
            .fetch_one(&ctx.pool)
            .await?;
    assert_eq!(count, 1);
    Ok(())
}
