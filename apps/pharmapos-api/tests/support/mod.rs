#![allow(dead_code)]

use std::net::SocketAddr;

use chrono::NaiveDate;
use pharmapos_api::auth::JwtManager;
use pharmapos_api::{build_router, ApiConfig, AppState};
use pharmapos_core::{Product, ProductCategory, User, UserRole};
use pharmapos_db::{Database, DbConfig, ProductInput};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub addr: SocketAddr,
    pub db: Database,
}

/// Serves the router on an ephemeral port over a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("open in-memory db");
    let config = ApiConfig {
        jwt_secret: SECRET.to_string(),
        ..ApiConfig::default()
    };
    let app = build_router(AppState::new(db.clone(), config));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    TestApp { addr, db }
}

impl TestApp {
    /// Creates an account and a token for it without going through argon2.
    pub async fn token_for(&self, username: &str, role: UserRole) -> String {
        let user: User = self
            .db
            .users()
            .create(username, "unused-hash", role)
            .await
            .expect("create user");
        JwtManager::new(SECRET.to_string(), 3600)
            .issue(&user)
            .expect("issue token")
    }

    pub async fn product(&self, sku: &str, price: i64, cost: i64, stock: i64) -> Product {
        let input = ProductInput {
            name: format!("Product {sku}"),
            generic_name: "Paracetamol".to_string(),
            sku: sku.to_string(),
            // digits derived from the SKU keep barcodes unique per test
            barcode: sku.bytes().map(|b| b.to_string()).collect(),
            description: None,
            cost_price_cents: cost,
            selling_price_cents: price,
            tax_rate_bps: None,
            stock_quantity: stock,
            min_stock_level: 2,
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 31).expect("date"),
            batch_number: "B-100".to_string(),
            requires_prescription: false,
            category: ProductCategory::Medicine,
        };
        self.db
            .products()
            .create(&input, 500)
            .await
            .expect("create product")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (u16, Value) {
        self.call("GET", path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> (u16, Value) {
        self.call("POST", path, token, Some(body.to_string())).await
    }

    pub async fn call(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (u16, Value) {
        let bearer = token.map(|t| format!("Bearer {t}"));
        let headers: Vec<(&str, &str)> = bearer
            .as_deref()
            .map(|b| vec![("Authorization", b)])
            .unwrap_or_default();
        let (status, _head, body) =
            send_raw_with_method(self.addr, method, path, &headers, body.as_deref()).await;
        let json = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };
        (status, json)
    }
}

pub async fn send_raw_with_method(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(payload) = body {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", payload.len()));
    }
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    req.push_str("\r\n");
    if let Some(payload) = body {
        req.push_str(payload);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}
