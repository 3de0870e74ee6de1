//! End-to-end tests for the HTTP API.
//!
//! Each test builds the full router over a fresh in-memory database and
//! drives it with `tower::ServiceExt::oneshot`, so no socket is opened.
//!
//! Tests cover:
//! - Health check and session handling
//! - Role checks on inventory writes
//! - Checkout: stock decrement, insufficient stock, totals verification
//! - Report caching and invalidation after a sale
//! - CSV export

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use kasir_core::input::{CategoryInput, NewProduct};
use kasir_core::{Money, Role};
use kasir_db::{Database, DbConfig};
use kasir_server::auth::{hash_password, SESSION_COOKIE};
use kasir_server::{build_router, AppState, ServerConfig};

struct TestApp {
    state: AppState,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database");
        let state = AppState::new(db, ServerConfig::for_tests());
        let router = build_router(state.clone());
        TestApp { state, router }
    }

    async fn create_user(&self, username: &str, password: &str, role: Role) {
        let hash = hash_password(password).expect("hash password");
        self.state
            .db
            .users()
            .create(username, username, role, &hash)
            .await
            .expect("create user");
    }

    /// Logs in and returns the session token.
    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().expect("token").to_string()
    }

    /// Creates a category and a product with `stock` units on hand.
    async fn create_product(&self, sku: &str, price: i64, stock: i64) -> String {
        let admin = self
            .state
            .db
            .users()
            .find_by_username("admin")
            .await
            .expect("lookup admin")
            .expect("admin exists");
        let category = match self.state.db.categories().list(false).await.expect("list").first() {
            Some(category) => category.category.id.clone(),
            None => {
                self.state
                    .db
                    .categories()
                    .create(&CategoryInput {
                        name: "Makanan".to_string(),
                        description: None,
                    })
                    .await
                    .expect("create category")
                    .id
            }
        };

        let product = self
            .state
            .db
            .products()
            .create(
                &admin.id,
                NewProduct {
                    sku: sku.to_string(),
                    barcode: None,
                    name: format!("Produk {}", sku),
                    description: None,
                    price: Money::from_minor(price),
                    cost: Money::from_minor(price / 2),
                    stock,
                    min_stock: 5,
                    max_stock: None,
                    unit: None,
                    category_id: category,
                    supplier_id: None,
                },
            )
            .await
            .expect("create product");
        product.product.id
    }

    async fn request(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.request(request).await;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

async fn app_with_admin() -> (TestApp, String) {
    let app = TestApp::new().await;
    app.create_user("admin", "admin123", Role::Admin).await;
    let token = app.login("admin", "admin123").await;
    (app, token)
}

fn sale_body(product_id: &str, quantity: i64, unit_price: i64) -> Value {
    let subtotal = quantity * unit_price;
    json!({
        "items": [{ "productId": product_id, "quantity": quantity, "unitPrice": unit_price }],
        "paymentMethod": "CASH",
        "subtotal": subtotal,
        "taxAmount": 0,
        "total": subtotal,
    })
}

// =============================================================================
// Health and sessions
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_requests_without_session_are_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::GET, "/api/dashboard/stats", None, None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new().await;
    app.create_user("kasir", "kasir123", Role::Cashier).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "username": "kasir", "password": "kasir123" }).to_string(),
        ))
        .unwrap();
    let response = app.request(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(cookie.contains("HttpOnly"));

    // The cookie alone authenticates follow-up requests
    let session = cookie.split(';').next().unwrap().to_string();
    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, session)
        .body(Body::empty())
        .unwrap();
    let response = app.request(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let me: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(me["username"], "kasir");
    assert_eq!(me["role"], "CASHIER");
    assert!(me.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new().await;
    app.create_user("kasir", "kasir123", Role::Cashier).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "kasir", "password": "salah" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Username atau password salah");
}

#[tokio::test]
async fn test_malformed_json_is_invalid_input() {
    let (app, token) = app_with_admin().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/sales/transactions")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.request(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "INVALID_INPUT");
}

// =============================================================================
// Roles
// =============================================================================

#[tokio::test]
async fn test_cashier_cannot_create_products() {
    let (app, _) = app_with_admin().await;
    app.create_user("kasir", "kasir123", Role::Cashier).await;
    let cashier = app.login("kasir", "kasir123").await;

    let category = app
        .state
        .db
        .categories()
        .create(&CategoryInput {
            name: "Minuman".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let product = json!({
        "sku": "MNM-0001",
        "name": "Teh Botol",
        "price": 5000,
        "cost": 3500,
        "stock": 10,
        "categoryId": category.id,
    });

    let (status, body) = app
        .send(Method::POST, "/api/inventory/products", Some(&cashier), Some(product.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // Customer writes are open to every role
    let (status, _) = app
        .send(
            Method::POST,
            "/api/customers",
            Some(&cashier),
            Some(json!({ "name": "Ani Lestari" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_stock_adjustment_roles_and_floor() {
    let (app, token) = app_with_admin().await;
    let product_id = app.create_product("MKN-0001", 3500, 50).await;
    app.create_user("kasir", "kasir123", Role::Cashier).await;
    let cashier = app.login("kasir", "kasir123").await;

    let adjustment = |kind: &str, quantity: i64| {
        json!({
            "productId": product_id,
            "type": kind,
            "quantity": quantity,
            "reason": "Stock opname",
        })
    };

    let (status, body) = app
        .send(
            Method::POST,
            "/api/inventory/stock/adjust",
            Some(&cashier),
            Some(adjustment("IN", 10)),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/inventory/stock/adjust",
            Some(&token),
            Some(adjustment("OUT", 60)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NEGATIVE_STOCK");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/inventory/stock/adjust",
            Some(&token),
            Some(adjustment("IN", i64::MAX)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let detail = app.state.db.products().get_detail(&product_id).await.unwrap();
    assert_eq!(detail.product.stock, 50);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/inventory/stock/adjust",
            Some(&token),
            Some(adjustment("OUT", 20)),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["product"]["stock"], 30);
    assert_eq!(body["movement"]["type"], "OUT");
}

#[tokio::test]
async fn test_duplicate_sku_is_conflict() {
    let (app, token) = app_with_admin().await;
    app.create_product("MKN-0001", 3500, 10).await;
    let category_id = app.state.db.categories().list(false).await.unwrap()[0]
        .category
        .id
        .clone();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/inventory/products",
            Some(&token),
            Some(json!({
                "sku": "MKN-0001",
                "name": "Duplikat",
                "price": 1000,
                "cost": 500,
                "categoryId": category_id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_sale_decrements_stock() {
    let (app, token) = app_with_admin().await;
    let product_id = app.create_product("MKN-0001", 3500, 10).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/sales/transactions",
            Some(&token),
            Some(sale_body(&product_id, 3, 3500)),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["total"], 10500);
    assert_eq!(body["status"], "COMPLETED");
    assert!(body["transactionNumber"].as_str().unwrap().starts_with("TRX"));
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, product) = app
        .send(
            Method::GET,
            &format!("/api/inventory/products/{}", product_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["stock"], 7);

    let transaction_id = body["id"].as_str().unwrap();
    let (status, fetched) = app
        .send(
            Method::GET,
            &format!("/api/sales/transactions/{}", transaction_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], body["id"]);
}

#[tokio::test]
async fn test_sale_with_insufficient_stock() {
    let (app, token) = app_with_admin().await;
    let product_id = app.create_product("MKN-0001", 3500, 2).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/sales/transactions",
            Some(&token),
            Some(sale_body(&product_id, 5, 3500)),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let detail = app.state.db.products().get_detail(&product_id).await.unwrap();
    assert_eq!(detail.product.stock, 2);
}

#[tokio::test]
async fn test_sale_with_wrong_totals() {
    let (app, token) = app_with_admin().await;
    let product_id = app.create_product("MKN-0001", 3500, 10).await;

    let mut body = sale_body(&product_id, 2, 3500);
    body["total"] = json!(1000);

    let (status, response) = app
        .send(Method::POST, "/api/sales/transactions", Some(&token), Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "INVALID_TOTALS");
}

#[tokio::test]
async fn test_sale_with_unknown_product() {
    let (app, token) = app_with_admin().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/sales/transactions",
            Some(&token),
            Some(sale_body("does-not-exist", 1, 1000)),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ITEMS");
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn test_sales_report_is_cached_until_next_sale() {
    let (app, token) = app_with_admin().await;
    let product_id = app.create_product("MKN-0001", 3500, 10).await;

    let (status, first) = app
        .send(Method::GET, "/api/reports/sales", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["summary"]["totalTransactions"], 0);
    assert_eq!(app.state.cache.len(), 1);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/sales/transactions",
            Some(&token),
            Some(sale_body(&product_id, 2, 3500)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(app.state.cache.is_empty());

    let (status, second) = app
        .send(Method::GET, "/api/reports/sales", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["summary"]["totalTransactions"], 1);
    assert_eq!(second["summary"]["totalRevenue"], 7000);
}

#[tokio::test]
async fn test_invalid_report_dates_are_rejected() {
    let (app, token) = app_with_admin().await;

    let (status, body) = app
        .send(
            Method::GET,
            "/api/reports/sales?startDate=16-10-2026",
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_inventory_export_as_csv() {
    let (app, token) = app_with_admin().await;
    app.create_product("MKN-0001", 3500, 10).await;

    let request = Request::builder()
        .uri("/api/reports/export?report=inventory&format=csv")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.request(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(content_type.starts_with("text/csv"));
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(disposition.contains(".csv"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.contains("MKN-0001"));
}

// =============================================================================
// Dashboard
// =============================================================================

#[tokio::test]
async fn test_recent_transactions_limit() {
    let (app, token) = app_with_admin().await;
    let product_id = app.create_product("MKN-0001", 1000, 50).await;

    for _ in 0..3 {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/sales/transactions",
                Some(&token),
                Some(sale_body(&product_id, 1, 1000)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .send(
            Method::GET,
            "/api/dashboard/recent-transactions?limit=2",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, stats) = app
        .send(Method::GET, "/api/dashboard/stats", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["todaySales"]["value"], 3000);
}
