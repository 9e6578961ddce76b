mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use giftdrop_api::services::purchases::CommitPurchaseCommand;

fn purchase_body(gift_id: &str, transaction_id: &str) -> serde_json::Value {
    json!({
        "buyer_id": "buyer_1",
        "gift_id": gift_id,
        "transaction_id": transaction_id,
        "username": "telegram_user",
        "first_name": "Tele",
        "last_name": "Gram",
    })
}

#[tokio::test]
async fn paid_purchase_decrements_stock_and_records_ownership() {
    let app = TestApp::new().await;

    let (status, before) = app.get("/api/gifts/telegatruck_002/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(before["remaining_quantity"], 80);
    assert_eq!(before["total_quantity"], 300);

    let (status, body) = app
        .post_json(
            "/api/purchase",
            purchase_body("telegatruck_002", "tx_1700000000000_abc123def"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body.get("error").is_none() || body["error"].is_null());

    let (_, after) = app.get("/api/gifts/telegatruck_002/status").await;
    assert_eq!(after["remaining_quantity"], 79);
    assert_eq!(after["total_quantity"], 300);

    let count = app
        .state
        .services
        .purchases
        .ownership_count("telegatruck_002")
        .await
        .expect("ownership count");
    assert_eq!(count, 1);

    // The feed shows the purchase newest-first with the buyer's username.
    let (status, feed) = app.get("/api/recent-purchases").await;
    assert_eq!(status, StatusCode::OK);
    let entries = feed.as_array().expect("feed is an array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["username"], "telegram_user");
    assert_eq!(entries[0]["gift_name"], "Telegatruck");
    assert_eq!(entries[0]["gift_id"], "telegatruck_002");
}

#[tokio::test]
async fn replayed_transaction_id_is_idempotent() {
    let app = TestApp::new().await;
    let body = purchase_body("durov_stand_001", "tx_1700000000000_replay001");

    let (status, first) = app.post_json("/api/purchase", body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);

    let (status, second) = app.post_json("/api/purchase", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["success"], true);

    // One decrement, one record, no matter how many replays.
    let (_, after) = app.get("/api/gifts/durov_stand_001/status").await;
    assert_eq!(after["remaining_quantity"], 119);
    let count = app
        .state
        .services
        .purchases
        .ownership_count("durov_stand_001")
        .await
        .expect("ownership count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn last_unit_goes_to_exactly_one_buyer() {
    let app = TestApp::new().await;
    let purchases = app.state.services.purchases.clone();

    // Burn Durov Stand down to a single unit.
    for i in 0..119 {
        purchases
            .commit(CommitPurchaseCommand {
                transaction_id: format!("tx_1700000000000_burn{:05}", i),
                gift_id: "durov_stand_001".to_string(),
                buyer_id: "burner".to_string(),
                username: None,
                first_name: None,
                last_name: None,
            })
            .await
            .expect("burn-down commit");
    }
    let (_, status) = app.get("/api/gifts/durov_stand_001/status").await;
    assert_eq!(status["remaining_quantity"], 1);

    let a = {
        let purchases = purchases.clone();
        tokio::spawn(async move {
            purchases
                .commit(CommitPurchaseCommand {
                    transaction_id: "tx_1700000000001_racer000a".to_string(),
                    gift_id: "durov_stand_001".to_string(),
                    buyer_id: "racer_a".to_string(),
                    username: Some("racer_a".to_string()),
                    first_name: None,
                    last_name: None,
                })
                .await
        })
    };
    let b = {
        let purchases = purchases.clone();
        tokio::spawn(async move {
            purchases
                .commit(CommitPurchaseCommand {
                    transaction_id: "tx_1700000000001_racer000b".to_string(),
                    gift_id: "durov_stand_001".to_string(),
                    buyer_id: "racer_b".to_string(),
                    username: Some("racer_b".to_string()),
                    first_name: None,
                    last_name: None,
                })
                .await
        })
    };

    let results = [a.await.expect("task a"), b.await.expect("task b")];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let sold_out = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(giftdrop_api::errors::ServiceError::OutOfStock(_))
            )
        })
        .count();
    assert_eq!(successes, 1, "exactly one buyer gets the last unit");
    assert_eq!(sold_out, 1, "the other sees out of stock");

    let (_, after) = app.get("/api/gifts/durov_stand_001/status").await;
    assert_eq!(after["remaining_quantity"], 0);
}

#[tokio::test]
async fn stock_never_goes_negative_under_a_commit_storm() {
    let app = TestApp::new().await;
    let purchases = app.state.services.purchases.clone();

    // Leave 3 units of Joy Stick, then race 10 distinct commits at them.
    for i in 0..47 {
        purchases
            .commit(CommitPurchaseCommand {
                transaction_id: format!("tx_1700000000000_joy{:06}", i),
                gift_id: "joy_stick_003".to_string(),
                buyer_id: "burner".to_string(),
                username: None,
                first_name: None,
                last_name: None,
            })
            .await
            .expect("burn-down commit");
    }

    let mut tasks = Vec::new();
    for i in 0..10 {
        let purchases = purchases.clone();
        tasks.push(tokio::spawn(async move {
            purchases
                .commit(CommitPurchaseCommand {
                    transaction_id: format!("tx_1700000000002_storm{:04}", i),
                    gift_id: "joy_stick_003".to_string(),
                    buyer_id: format!("stormer_{}", i),
                    username: None,
                    first_name: None,
                    last_name: None,
                })
                .await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.expect("storm task").is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 3, "only the remaining units can be sold");

    let (_, after) = app.get("/api/gifts/joy_stick_003/status").await;
    assert_eq!(after["remaining_quantity"], 0);

    let count = purchases
        .ownership_count("joy_stick_003")
        .await
        .expect("ownership count");
    assert_eq!(count, 50, "records never exceed total quantity");
}

#[tokio::test]
async fn selling_out_returns_the_business_error_shape() {
    let app = TestApp::new().await;
    let purchases = app.state.services.purchases.clone();

    for i in 0..120 {
        purchases
            .commit(CommitPurchaseCommand {
                transaction_id: format!("tx_1700000000000_sell{:05}", i),
                gift_id: "durov_stand_001".to_string(),
                buyer_id: "burner".to_string(),
                username: None,
                first_name: None,
                last_name: None,
            })
            .await
            .expect("sell-out commit");
    }

    let (status, body) = app
        .post_json(
            "/api/purchase",
            purchase_body("durov_stand_001", "tx_1700000000003_toolate00"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "out_of_stock");

    // A sold-out commit leaves no ownership record behind.
    let count = purchases
        .ownership_count("durov_stand_001")
        .await
        .expect("ownership count");
    assert_eq!(count, 120);
}

#[tokio::test]
async fn unknown_gift_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/purchase",
            purchase_body("no_such_gift", "tx_1700000000004_missing00"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, _) = app.get("/api/gifts/no_such_gift/status").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_identifiers_are_rejected_before_touching_stock() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/purchase",
            json!({
                "buyer_id": "",
                "gift_id": "durov_stand_001",
                "transaction_id": "tx_1700000000005_blankbuy0",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (_, after) = app.get("/api/gifts/durov_stand_001/status").await;
    assert_eq!(after["remaining_quantity"], 120);
}

#[tokio::test]
async fn catalog_listing_matches_the_seeded_defaults() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/gifts").await;
    assert_eq!(status, StatusCode::OK);
    let gifts = body.as_array().expect("gift list");
    assert_eq!(gifts.len(), 4);

    let truck = gifts
        .iter()
        .find(|g| g["id"] == "telegatruck_002")
        .expect("telegatruck present");
    assert_eq!(truck["name"], "Telegatruck");
    assert_eq!(truck["price"], 500);
    assert_eq!(truck["availability"], json!([80, 300]));
}

#[tokio::test]
async fn recent_purchases_limit_is_clamped() {
    let app = TestApp::new().await;
    let purchases = app.state.services.purchases.clone();

    for i in 0..60 {
        purchases
            .commit(CommitPurchaseCommand {
                transaction_id: format!("tx_1700000000000_feed{:05}", i),
                gift_id: "gram_pods_004".to_string(),
                buyer_id: format!("buyer_{}", i),
                username: Some(format!("user_{}", i)),
                first_name: None,
                last_name: None,
            })
            .await
            .expect("feed commit");
    }

    let (status, body) = app.get("/api/recent-purchases?limit=500").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("feed").len(), 50);

    let (_, body) = app.get("/api/recent-purchases").await;
    assert_eq!(body.as_array().expect("feed").len(), 10);

    let (_, body) = app.get("/api/recent-purchases?limit=3").await;
    let entries = body.as_array().expect("feed");
    assert_eq!(entries.len(), 3);
    // Newest first.
    assert_eq!(entries[0]["username"], "user_59");
}
