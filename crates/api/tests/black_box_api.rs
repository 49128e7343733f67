use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

use stockroom_api::app::{router, AppServices};
use stockroom_auth::{Credentials, JwtClaims, Role};
use stockroom_core::{SessionId, UserId};
use stockroom_infra::store::{Backend, InMemoryStore};
use stockroom_infra::AppConfig;

const JWT_SECRET: &str = "black-box-secret";

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory backend, ephemeral port.
        let config = AppConfig {
            jwt_secret: JWT_SECRET.to_string(),
            ..AppConfig::default()
        };
        let backend: Arc<dyn Backend> = Arc::new(InMemoryStore::new());
        let services = Arc::new(AppServices::from_backend(backend, &config));
        let app = router(Arc::clone(&services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn sign_up_and_in(&self, email: &str) -> String {
        let res = self
            .client
            .post(self.url("/auth/signup"))
            .json(&json!({ "email": email, "password": "hunter22" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        self.sign_in(email).await
    }

    async fn sign_in(&self, email: &str) -> String {
        let res = self
            .client
            .post(self.url("/auth/signin"))
            .json(&json!({ "email": email, "password": "hunter22" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn create_category(&self, token: &str, name: &str) -> i64 {
        let res = self.post(token, "/categories", json!({ "name": name })).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    async fn create_product(&self, token: &str, name: &str, category_id: i64, quantity: i64) -> i64 {
        let res = self
            .post(
                token,
                "/products",
                json!({ "name": name, "category_id": category_id, "price": 250, "quantity": quantity }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        sid: SessionId::new(),
        email: "ghost@example.com".to_string(),
        roles,
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let server = TestServer::spawn().await;

    let res = server.client.get(server.url("/products")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let res = server.get("not-a-jwt", "/products").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn well_signed_token_without_a_session_is_rejected() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET, vec![Role::ADMIN]);

    let res = server.get(&token, "/products").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_lifecycle() {
    let server = TestServer::spawn().await;
    let token = server.sign_up_and_in("Ops@Example.com").await;

    let res = server.get(&token, "/auth/session").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "ops@example.com");
    assert_eq!(body["user"]["roles"], json!(["member"]));

    let res = server
        .client
        .post(server.url("/auth/signup"))
        .json(&json!({ "email": "ops@example.com", "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = server
        .client
        .post(server.url("/auth/signin"))
        .json(&json!({ "email": "ops@example.com", "password": "wrong-one" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");

    let res = server.post(&token, "/auth/signout", json!({})).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server.get(&token, "/auth/session").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn viewers_can_read_but_not_write() {
    let server = TestServer::spawn().await;
    let member = server.sign_up_and_in("member@example.com").await;
    let category_id = server.create_category(&member, "Tools").await;

    server
        .services
        .accounts
        .register(
            Credentials::new("viewer@example.com", "hunter22"),
            vec![Role::VIEWER],
        )
        .await
        .unwrap();
    let viewer = server.sign_in("viewer@example.com").await;

    let res = server.get(&viewer, "/categories").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.post(&viewer, "/categories", json!({ "name": "Nope" })).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .post(
            &viewer,
            "/products",
            json!({ "name": "Hammer", "category_id": category_id, "price": 1, "quantity": 1 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Permission is checked before the body's contents.
    let hammer = server.create_product(&member, "Hammer", category_id, 5).await;
    for kind in ["OUT", "SIDEWAYS"] {
        let res = server
            .post(
                &viewer,
                "/inventory/transactions",
                json!({ "product_id": hammer, "type": kind, "quantity": 1 }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{kind}");
    }
}

#[tokio::test]
async fn categories_crud_and_restrict_delete() {
    let server = TestServer::spawn().await;
    let token = server.sign_up_and_in("cat@example.com").await;

    let res = server.post(&token, "/categories", json!({ "name": "   " })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let tools = server.create_category(&token, "Tools").await;
    let _ = server.create_category(&token, "Adhesives").await;

    let res = server.get(&token, "/categories?sort=name").await;
    let body: Vec<Value> = res.json().await.unwrap();
    let names: Vec<&str> = body.iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Adhesives", "Tools"]);

    let res = server.get(&token, "/categories?sort=price").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .put(server.url(&format!("/categories/{tools}")))
        .bearer_auth(&token)
        .json(&json!({ "name": "Hand tools" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Hand tools");

    server.create_product(&token, "Hammer", tools, 3).await;

    let res = server
        .client
        .delete(server.url(&format!("/categories/{tools}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = server.get(&token, "/categories/999").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn products_filter_by_search_and_category() {
    let server = TestServer::spawn().await;
    let token = server.sign_up_and_in("prod@example.com").await;
    let tools = server.create_category(&token, "Tools").await;
    let glue = server.create_category(&token, "Glue").await;

    server.create_product(&token, "Claw Hammer", tools, 20).await;
    server.create_product(&token, "Sledge hammer", tools, 2).await;
    server.create_product(&token, "Wood glue", glue, 0).await;

    let res = server.get(&token, "/products?search=HAMMER").await;
    let body: Vec<Value> = res.json().await.unwrap();
    assert_eq!(body.len(), 2);

    let res = server
        .get(&token, &format!("/products?category_id={glue}&search="))
        .await;
    let body: Vec<Value> = res.json().await.unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["name"], "Wood glue");
    assert_eq!(body[0]["category_name"], "Glue");
    assert_eq!(body[0]["stock_level"], "out_of_stock");

    let res = server.get(&token, "/products?category_id=abc").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .post(
            &token,
            "/products",
            json!({ "name": "Orphan", "category_id": 999, "price": 1 }),
        )
        .await;
    assert!(res.status().is_client_error());

    let res = server
        .post(
            &token,
            "/products",
            json!({ "name": "Negative", "category_id": tools, "price": -1 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stock_ledger_scenario() {
    let server = TestServer::spawn().await;
    let token = server.sign_up_and_in("ledger@example.com").await;
    let tools = server.create_category(&token, "Tools").await;
    let hammer = server.create_product(&token, "Hammer", tools, 10).await;

    let res = server
        .post(
            &token,
            "/inventory/transactions",
            json!({ "product_id": hammer, "type": "OUT", "quantity": 4 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["new_quantity"], 6);
    assert_eq!(body["transaction"]["type"], "OUT");
    assert_eq!(body["transaction"]["product_name"], "Hammer");

    let res = server
        .post(
            &token,
            "/inventory/transactions",
            json!({ "product_id": hammer, "type": "OUT", "quantity": 10 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["requested"], 10);
    assert_eq!(body["available"], 6);

    let res = server
        .post(
            &token,
            "/inventory/transactions",
            json!({ "product_id": hammer, "type": "in", "quantity": 5 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["new_quantity"], 11);

    let res = server.get(&token, &format!("/products/{hammer}")).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["quantity"], 11);

    let res = server
        .get(&token, &format!("/inventory/transactions?product_id={hammer}"))
        .await;
    let body: Vec<Value> = res.json().await.unwrap();
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["type"], "IN");
    assert_eq!(body[1]["type"], "OUT");

    let res = server.get(&token, "/inventory/transactions?limit=1").await;
    let body: Vec<Value> = res.json().await.unwrap();
    assert_eq!(body.len(), 1);

    let res = server.get(&token, "/inventory/transactions?limit=lots").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Ledger history pins the product.
    let res = server
        .client
        .delete(server.url(&format!("/products/{hammer}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_movements_are_bad_requests() {
    let server = TestServer::spawn().await;
    let token = server.sign_up_and_in("bad@example.com").await;
    let tools = server.create_category(&token, "Tools").await;
    let hammer = server.create_product(&token, "Hammer", tools, 10).await;

    for body in [
        json!({ "product_id": hammer, "type": "OUT", "quantity": 0 }),
        json!({ "product_id": hammer, "type": "OUT", "quantity": -3 }),
        json!({ "product_id": hammer, "type": "OUT", "quantity": 2.5 }),
        json!({ "product_id": hammer, "type": "SIDEWAYS", "quantity": 1 }),
        json!({ "product_id": hammer, "type": "IN" }),
    ] {
        let res = server.post(&token, "/inventory/transactions", body).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    let res = server
        .post(
            &token,
            "/inventory/transactions",
            json!({ "product_id": 9999, "type": "IN", "quantity": 1 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.get(&token, &format!("/products/{hammer}")).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["quantity"], 10);
}

#[tokio::test]
async fn dashboard_summarizes_stock() {
    let server = TestServer::spawn().await;
    let token = server.sign_up_and_in("dash@example.com").await;
    let tools = server.create_category(&token, "Tools").await;
    let glue = server.create_category(&token, "Glue").await;
    server.create_product(&token, "Hammer", tools, 20).await;
    server.create_product(&token, "Saw", tools, 4).await;
    server.create_product(&token, "Wood glue", glue, 0).await;

    let res = server.get(&token, "/dashboard").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["products"], 3);
    assert_eq!(body["categories"], 2);
    assert_eq!(body["total_stock"], 24);
    assert_eq!(body["low_stock"], 2);
    assert_eq!(
        body["stock_by_category"],
        json!([{ "name": "Glue", "value": 0 }, { "name": "Tools", "value": 24 }])
    );
}
