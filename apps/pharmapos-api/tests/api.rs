mod support;

use chrono::{Duration, Utc};
use pharmapos_api::auth::seed_default_users;
use pharmapos_core::discount::DiscountType;
use pharmapos_core::UserRole;
use pharmapos_db::DiscountInput;
use serde_json::json;

use support::spawn_app;

fn coupon(code: &str, kind: DiscountType, value: i64) -> DiscountInput {
    DiscountInput {
        organization_id: None,
        name: format!("Coupon {code}"),
        code: Some(code.to_string()),
        discount_type: kind,
        value,
        start_date: None,
        end_date: None,
        is_active: true,
        rules: None,
        discount_rules: vec![],
    }
}

// =============================================================================
// Public surface & auth
// =============================================================================

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["schema"], "1/1");
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let app = spawn_app().await;

    let (status, body) = app.get("/products", None).await;
    assert_eq!(status, 401);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.get("/products", Some("not-a-jwt")).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn login_with_seeded_account() {
    let app = spawn_app().await;
    assert_eq!(seed_default_users(&app.db).await.unwrap(), 3);
    // second start doesn't duplicate accounts
    assert_eq!(seed_default_users(&app.db).await.unwrap(), 0);

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            &json!({"username": "cashier", "password": "cashpass"}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["user"]["role"], "Cashier");
    assert!(body["user"].get("passwordHash").is_none());

    let token = body["token"].as_str().unwrap().to_string();
    let (status, _) = app.get("/products", Some(&token)).await;
    assert_eq!(status, 200);

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            &json!({"username": "cashier", "password": "wrong"}),
        )
        .await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
async fn discount_writes_need_admin() {
    let app = spawn_app().await;
    let cashier = app.token_for("cashier", UserRole::Cashier).await;
    let admin = app.token_for("admin", UserRole::Admin).await;
    let body = json!({"name": "Vitamin Week", "type": "PERCENTAGE", "value": 1000});

    let (status, resp) = app.post("/discounts", Some(&cashier), &body).await;
    assert_eq!(status, 403);
    assert_eq!(resp["code"], "FORBIDDEN");

    let (status, resp) = app.post("/discounts", Some(&admin), &body).await;
    assert_eq!(status, 201);
    assert_eq!(resp["type"], "PERCENTAGE");
    assert_eq!(resp["isActive"], true);

    // reading is open to every role
    let (status, list) = app.get("/discounts", Some(&cashier)).await;
    assert_eq!(status, 200);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn users_are_admin_only() {
    let app = spawn_app().await;
    let pharmacist = app.token_for("pharmacist", UserRole::Pharmacist).await;
    let admin = app.token_for("admin", UserRole::Admin).await;

    let (status, _) = app.get("/users", Some(&pharmacist)).await;
    assert_eq!(status, 403);

    let (status, user) = app
        .post(
            "/users",
            Some(&admin),
            &json!({"username": "relief", "password": "shortpw1", "role": "Cashier"}),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(user["username"], "relief");

    let (status, body) = app
        .post(
            "/users",
            Some(&admin),
            &json!({"username": "relief", "password": "shortpw1", "role": "Cashier"}),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = app
        .post(
            "/users",
            Some(&admin),
            &json!({"username": "tiny", "password": "123", "role": "Cashier"}),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn tokens_follow_the_stored_account() {
    let app = spawn_app().await;
    let admin = app.token_for("admin", UserRole::Admin).await;
    let stored = app.db.users().find_by_username("admin").await.unwrap().unwrap();

    let (status, _) = app.get("/users", Some(&admin)).await;
    assert_eq!(status, 200);

    // demoted: the token still says Admin, the users table does not
    app.db
        .users()
        .update(&stored.id, None, None, Some(UserRole::Cashier))
        .await
        .unwrap();
    let (status, body) = app.get("/users", Some(&admin)).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "FORBIDDEN");
    let (status, _) = app.get("/products", Some(&admin)).await;
    assert_eq!(status, 200);

    app.db.users().delete(&stored.id).await.unwrap();
    let (status, body) = app.get("/products", Some(&admin)).await;
    assert_eq!(status, 401);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

// =============================================================================
// Discounts at the register
// =============================================================================

#[tokio::test]
async fn coupon_lookup_fails_closed() {
    let app = spawn_app().await;
    let token = app.token_for("cashier", UserRole::Cashier).await;

    app.db
        .discounts()
        .create(coupon("SAVE10", DiscountType::Percentage, 1000))
        .await
        .unwrap();
    let mut expired = coupon("OLD5", DiscountType::Fixed, 500);
    expired.end_date = Some(Utc::now() - Duration::days(1));
    app.db.discounts().create(expired).await.unwrap();
    let mut inactive = coupon("OFF1", DiscountType::Fixed, 100);
    inactive.is_active = false;
    app.db.discounts().create(inactive).await.unwrap();

    let (status, body) = app
        .post("/sales/validate-coupon", Some(&token), &json!({"code": "SAVE10"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["code"], "SAVE10");

    let (status, body) = app
        .post("/sales/validate-coupon", Some(&token), &json!({"code": "NOPE"}))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Coupon with code 'NOPE' not found or is inactive.");

    let (status, body) = app
        .post("/sales/validate-coupon", Some(&token), &json!({"code": "OLD5"}))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Coupon has expired.");

    let (status, _) = app
        .post("/sales/validate-coupon", Some(&token), &json!({"code": "OFF1"}))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn apply_coupon_and_best_automatic_discount() {
    let app = spawn_app().await;
    let token = app.token_for("cashier", UserRole::Cashier).await;
    let discounts = app.db.discounts();

    discounts
        .create(coupon("SAVE10", DiscountType::Percentage, 1000))
        .await
        .unwrap();
    let mut small = coupon("X", DiscountType::Fixed, 150);
    small.code = None;
    small.name = "Small".into();
    discounts.create(small).await.unwrap();
    let mut big = coupon("X", DiscountType::Percentage, 2000);
    big.code = None;
    big.name = "Big".into();
    let big = discounts.create(big).await.unwrap();

    let cart = json!([
        {"productId": "p1", "quantity": 2, "priceCents": 1000, "category": "Medicine"},
        {"productId": "p2", "quantity": 1, "priceCents": 500, "category": "Supplement"}
    ]);

    let (status, body) = app
        .post(
            "/sales/apply-coupon",
            Some(&token),
            &json!({"code": "SAVE10", "cartItems": cart}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["amountCents"], 250);

    // coupons never apply automatically; 20% of 2500 beats 150 flat
    let (status, body) = app
        .post(
            "/sales/calculate-discount",
            Some(&token),
            &json!({"cartItems": cart}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["discountId"], big.id.as_str());
    assert_eq!(body["discountName"], "Big");
    assert_eq!(body["amountCents"], 500);
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn checkout_deducts_stock_and_returns_change() {
    let app = spawn_app().await;
    let token = app.token_for("cashier", UserRole::Cashier).await;
    let product = app.product("PARA-1", 1250, 800, 10).await;

    let (status, body) = app
        .post(
            "/checkout",
            Some(&token),
            &json!({
                "items": [{"productId": product.id, "quantity": 4}],
                "manualDiscount": {"type": "fixed", "value": 500},
                "payments": [
                    {"method": "GCash", "amountCents": 2000},
                    {"method": "Cash", "amountCents": 5000}
                ]
            }),
        )
        .await;
    assert_eq!(status, 201, "{body}");
    // 5000 subtotal − 500 discount = 4500; cash owes 2500 of it
    assert_eq!(body["subtotalCents"], 5000);
    assert_eq!(body["totalAmountCents"], 4500);
    assert_eq!(body["totalProfitCents"], 1300);
    assert_eq!(body["changeDueCents"], 2500);
    assert_eq!(body["payments"].as_array().unwrap().len(), 2);

    let after = app.db.products().get(&product.id).await.unwrap();
    assert_eq!(after.stock_quantity, 6);

    let id = body["id"].as_str().unwrap();
    let (status, fetched) = app.get(&format!("/transactions/{id}"), Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["items"][0]["sku"], "PARA-1");
}

#[tokio::test]
async fn checkout_revalidates_coupon_server_side() {
    let app = spawn_app().await;
    let token = app.token_for("cashier", UserRole::Cashier).await;
    let product = app.product("VITC-1", 2000, 1000, 5).await;
    app.db
        .discounts()
        .create(coupon("SAVE10", DiscountType::Percentage, 1000))
        .await
        .unwrap();

    let (status, body) = app
        .post(
            "/checkout",
            Some(&token),
            &json!({
                "items": [{"productId": product.id, "quantity": 1}],
                "couponCode": "SAVE10",
                "payments": [{"method": "Card"}]
            }),
        )
        .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["couponCode"], "SAVE10");
    assert_eq!(body["couponDiscountCents"], 200);
    assert_eq!(body["totalAmountCents"], 1800);
    assert_eq!(body["changeDueCents"], 0);

    let (status, body) = app
        .post(
            "/checkout",
            Some(&token),
            &json!({
                "items": [{"productId": product.id, "quantity": 1}],
                "couponCode": "BOGUS",
                "payments": [{"method": "Card"}]
            }),
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn checkout_rejects_short_stock_without_partial_deduction() {
    let app = spawn_app().await;
    let token = app.token_for("cashier", UserRole::Cashier).await;
    let plenty = app.product("AMOX-1", 500, 300, 50).await;
    let scarce = app.product("INSU-1", 900, 600, 1).await;

    let (status, body) = app
        .post(
            "/checkout",
            Some(&token),
            &json!({
                "items": [
                    {"productId": plenty.id, "quantity": 5},
                    {"productId": scarce.id, "quantity": 2}
                ],
                "payments": [{"method": "Cash", "amountCents": 100000}]
            }),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let plenty_after = app.db.products().get(&plenty.id).await.unwrap();
    assert_eq!(plenty_after.stock_quantity, 50);
    assert_eq!(app.db.transactions().count().await.unwrap(), 0);
}

#[tokio::test]
async fn checkout_requires_full_payment() {
    let app = spawn_app().await;
    let token = app.token_for("cashier", UserRole::Cashier).await;
    let product = app.product("CETI-1", 1000, 400, 5).await;

    let (status, body) = app
        .post(
            "/checkout",
            Some(&token),
            &json!({
                "items": [{"productId": product.id, "quantity": 1}],
                "payments": [{"method": "Cash", "amountCents": 400}]
            }),
        )
        .await;
    assert_eq!(status, 422);
    assert_eq!(body["code"], "PAYMENT_ERROR");

    // non-cash can't overpay
    let (status, _) = app
        .post(
            "/checkout",
            Some(&token),
            &json!({
                "items": [{"productId": product.id, "quantity": 1}],
                "payments": [{"method": "Maya", "amountCents": 1500}]
            }),
        )
        .await;
    assert_eq!(status, 422);

    let (status, body) = app
        .post("/checkout", Some(&token), &json!({"items": [], "payments": []}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "CART_ERROR");
}

// =============================================================================
// Catalog, parked carts, reports
// =============================================================================

#[tokio::test]
async fn product_crud_and_conflicts() {
    let app = spawn_app().await;
    let token = app.token_for("pharmacist", UserRole::Pharmacist).await;
    let body = json!({
        "name": "Biogesic",
        "genericName": "Paracetamol",
        "sku": "BIO-500",
        "barcode": "4800100",
        "costPriceCents": 300,
        "sellingPriceCents": 550,
        "stockQuantity": 3,
        "minStockLevel": 5,
        "expiryDate": "2030-06-30",
        "batchNumber": "LOT-9"
    });

    let (status, created) = app.post("/products", Some(&token), &body).await;
    assert_eq!(status, 201, "{created}");
    // store default tax rate fills the gap
    assert_eq!(created["taxRateBps"], 500);
    assert_eq!(created["category"], "Other");

    let (status, dup) = app.post("/products", Some(&token), &body).await;
    assert_eq!(status, 409);
    assert_eq!(dup["code"], "CONFLICT");

    let (status, found) = app.get("/products?search=paracet", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, low) = app.get("/products/low-stock", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(low[0]["sku"], "BIO-500");

    let id = created["id"].as_str().unwrap();
    let (status, returned) = app
        .post(&format!("/products/{id}/return"), Some(&token), &json!({"quantity": 2}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(returned["stockQuantity"], 5);

    let (status, _) = app
        .call("DELETE", &format!("/products/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, 204);
    let (status, missing) = app.get(&format!("/products/{id}"), Some(&token)).await;
    assert_eq!(status, 404);
    assert_eq!(missing["message"], format!("Product with ID {id} not found"));
}

#[tokio::test]
async fn suspended_sale_resumes_once() {
    let app = spawn_app().await;
    let token = app.token_for("cashier", UserRole::Cashier).await;
    let product = app.product("LOPE-2", 800, 500, 10).await;

    let (status, sale) = app
        .post(
            "/suspended-sales",
            Some(&token),
            &json!({
                "items": [{
                    "productId": product.id,
                    "name": product.name,
                    "sku": product.sku,
                    "category": "Medicine",
                    "unitPriceCents": 800,
                    "unitCostCents": 500,
                    "quantity": 3
                }],
                "discountAmountCents": 400,
                "note": "customer went to the ATM"
            }),
        )
        .await;
    assert_eq!(status, 201, "{sale}");
    assert_eq!(sale["subtotalCents"], 2400);
    assert_eq!(sale["totalAmountCents"], 2000);

    let id = sale["id"].as_str().unwrap();
    let (_, list) = app.get("/suspended-sales", Some(&token)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let path = format!("/suspended-sales/{id}/resume");
    let (status, resumed) = app.post(&path, Some(&token), &json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(resumed["note"], "customer went to the ATM");

    let (status, _) = app.post(&path, Some(&token), &json!({})).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn reports_reflect_completed_sales() {
    let app = spawn_app().await;
    let token = app.token_for("admin", UserRole::Admin).await;
    let product = app.product("ZINC-1", 1000, 600, 20).await;

    for qty in [1, 2] {
        let (status, _) = app
            .post(
                "/checkout",
                Some(&token),
                &json!({
                    "items": [{"productId": product.id, "quantity": qty}],
                    "payments": [{"method": "Cash"}]
                }),
            )
            .await;
        assert_eq!(status, 201);
    }

    let (status, daily) = app.get("/reports/daily", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(daily["totalTransactions"], 2);
    assert_eq!(daily["totalSalesCents"], 3000);
    assert_eq!(daily["totalItemsSold"], 3);
    assert_eq!(daily["hourlyTrend"].as_array().unwrap().len(), 24);

    let (status, dash) = app.get("/reports/dashboard", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(dash["totalRevenueCents"], 3000);
    assert_eq!(dash["averageTransactionValueCents"], 1500);
    assert_eq!(dash["totalProducts"], 1);

    let (status, top) = app.get("/reports/top-products", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(top[0]["quantity"], 3);

    let (status, history) = app
        .get("/transactions?sortBy=amount&direction=asc", Some(&token))
        .await;
    assert_eq!(status, 200);
    assert_eq!(history["totalItems"], 2);
    assert_eq!(history["items"][0]["totalAmountCents"], 1000);

    let (status, bad) = app.get("/reports/monthly?year=2025&month=13", Some(&token)).await;
    assert_eq!(status, 400);
    assert_eq!(bad["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn out_of_range_numbers_are_validation_errors() {
    let app = spawn_app().await;
    let token = app.token_for("pharmacist", UserRole::Pharmacist).await;
    let product = app.product("ORS-1", 250, 100, 10).await;
    app.db
        .discounts()
        .create(coupon("FLAT1", DiscountType::Fixed, 100))
        .await
        .unwrap();
    let mut automatic = coupon("X", DiscountType::Fixed, 100);
    automatic.code = None;
    app.db.discounts().create(automatic).await.unwrap();

    // 3 × (i64::MAX / 2) does not fit in an i64
    let huge_price = json!([{"productId": "p1", "quantity": 3, "priceCents": i64::MAX / 2}]);
    let huge_quantity = json!([{"productId": "p1", "quantity": i64::MAX, "priceCents": 100}]);

    let (status, body) = app
        .post(
            "/sales/calculate-discount",
            Some(&token),
            &json!({"cartItems": huge_price}),
        )
        .await;
    assert_eq!(status, 400, "{body}");
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .post(
            "/sales/calculate-discount",
            Some(&token),
            &json!({"cartItems": huge_quantity}),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    for cart in [&huge_price, &huge_quantity] {
        let (status, body) = app
            .post(
                "/sales/apply-coupon",
                Some(&token),
                &json!({"code": "FLAT1", "cartItems": cart}),
            )
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    let (status, body) = app
        .post(
            "/suspended-sales",
            Some(&token),
            &json!({
                "items": [{
                    "productId": product.id,
                    "name": product.name,
                    "sku": product.sku,
                    "category": "Medicine",
                    "unitPriceCents": i64::MAX / 2,
                    "unitCostCents": 100,
                    "quantity": 3
                }]
            }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .post(
            "/products",
            Some(&token),
            &json!({
                "name": "Gold Leaf",
                "genericName": "Aurum",
                "sku": "GOLD-1",
                "barcode": "4800999",
                "costPriceCents": 100,
                "sellingPriceCents": i64::MAX / 2,
                "stockQuantity": 3,
                "minStockLevel": 1,
                "expiryDate": "2030-06-30",
                "batchNumber": "LOT-1"
            }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    for days in ["-1", "3651", "9223372036854775807"] {
        let (status, body) = app
            .get(&format!("/products/expiring?days={days}"), Some(&token))
            .await;
        assert_eq!(status, 400, "days={days}");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
    let (status, _) = app.get("/products/expiring?days=3650", Some(&token)).await;
    assert_eq!(status, 200);

    let path = format!("/products/{}/return", product.id);
    let (status, body) = app
        .post(&path, Some(&token), &json!({"quantity": i64::MAX}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let after = app.db.products().get(&product.id).await.unwrap();
    assert_eq!(after.stock_quantity, 10);

    let (status, body) = app
        .post(
            "/checkout",
            Some(&token),
            &json!({
                "items": [{"productId": product.id, "quantity": 1}],
                "payments": [
                    {"method": "Cash", "amountCents": i64::MAX},
                    {"method": "Cash", "amountCents": i64::MAX}
                ]
            }),
        )
        .await;
    assert_eq!(status, 422);
    assert_eq!(body["code"], "PAYMENT_ERROR");
}

#[tokio::test]
async fn malformed_requests_use_error_body() {
    let app = spawn_app().await;
    let token = app.token_for("cashier", UserRole::Cashier).await;

    let (status, body) = app
        .call("POST", "/checkout", Some(&token), Some("{not json".to_string()))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.get("/nowhere", Some(&token)).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
}
