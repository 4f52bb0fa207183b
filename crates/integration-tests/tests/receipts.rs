//! Receipt submission, ordering, and deletion tests.

use axum::http::StatusCode;
use serde_json::{Value, json};
use shopdesk_integration_tests::{JPEG_BYTES, Part, TestApp, create_receipt};

#[tokio::test]
async fn test_receipts_are_newest_first() {
    let app = TestApp::new();
    create_receipt(&app, "A").await;
    create_receipt(&app, "B").await;
    create_receipt(&app, "C").await;

    let (status, body) = app.get("/receipts").await;
    assert_eq!(status, StatusCode::OK);
    let order_ids: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["orderId"].as_str().expect("orderId"))
        .collect();
    assert_eq!(order_ids, ["C", "B", "A"]);
}

#[tokio::test]
async fn test_submission_with_image_and_cart() {
    let app = TestApp::new();
    let cart = json!([
        {"id": 1, "name": "Coffee", "price": "3.50", "quantity": 2, "category": "drinks"},
        {"id": 2, "name": "Bagel", "price": "2.00", "quantity": 1}
    ])
    .to_string();

    let (status, body) = app
        .send_multipart(
            "POST",
            "/upload",
            &[
                Part::Text("orderId", "ORD100"),
                Part::Text("total", "9.00"),
                Part::Text("cname", "Ada"),
                Part::Text("note", "no onions"),
                Part::Text("paymentMethod", "qr"),
                Part::Text("cartItems", &cart),
                Part::File {
                    field: "receipt",
                    filename: "receipt.jpg",
                    content_type: "image/jpeg",
                    content: JPEG_BYTES,
                },
            ],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let receipt = &body["receipt"];
    assert_eq!(receipt["orderId"], "ORD100");
    assert_eq!(receipt["customerName"], "Ada");
    assert_eq!(receipt["note"], "no onions");
    assert_eq!(receipt["total"], "9.00");
    assert_eq!(receipt["paymentMethod"], "qr");

    // Cart items are projected down to the four known fields.
    let items = receipt["cartItems"].as_array().expect("cartItems");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Coffee");
    assert!(items[0].get("category").is_none());

    // The attached image is fetchable under the returned asset id.
    let asset_id = receipt["assetId"].as_str().expect("assetId");
    assert_eq!(app.blobs.object(asset_id).as_deref(), Some(JPEG_BYTES));
}

#[tokio::test]
async fn test_malformed_cart_becomes_empty() {
    let app = TestApp::new();
    let (status, body) = app
        .send_multipart(
            "POST",
            "/upload",
            &[
                Part::Text("orderId", "ORD200"),
                Part::Text("total", "5.00"),
                Part::Text("cartItems", "definitely-not-json"),
            ],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["receipt"]["cartItems"], Value::Array(vec![]));
}

#[tokio::test]
async fn test_order_id_defaults_when_absent() {
    let app = TestApp::new();
    let (status, body) = app
        .send_multipart("POST", "/upload", &[Part::Text("total", "1.00")])
        .await;

    assert_eq!(status, StatusCode::OK);
    let order_id = body["receipt"]["orderId"].as_str().expect("orderId");
    assert!(order_id.starts_with("ORD"));
    assert!(order_id.len() > 3);
}

#[tokio::test]
async fn test_client_timestamp_is_kept() {
    let app = TestApp::new();
    let (status, body) = app
        .send_multipart(
            "POST",
            "/upload",
            &[
                Part::Text("orderId", "ORD300"),
                Part::Text("timestamp", "2026-08-01T10:00:00.000Z"),
            ],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["receipt"]["uploadedAt"], "2026-08-01T10:00:00.000Z");
}

#[tokio::test]
async fn test_image_fields_omitted_without_attachment() {
    let app = TestApp::new();
    let receipt = create_receipt(&app, "ORD400").await;
    assert!(receipt.get("receiptUrl").is_none());
    assert!(receipt.get("assetId").is_none());
}

#[tokio::test]
async fn test_delete_by_order_id() {
    let app = TestApp::new();
    create_receipt(&app, "ORD1").await;
    create_receipt(&app, "ORD2").await;

    let (status, body) = app.delete("/receipts/ORD1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderId"], "ORD1");

    let (_, listed) = app.get("/receipts").await;
    let order_ids: Vec<&str> = listed
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["orderId"].as_str().expect("orderId"))
        .collect();
    assert_eq!(order_ids, ["ORD2"]);
}

#[tokio::test]
async fn test_delete_removes_attached_image() {
    let app = TestApp::new();
    let (_, body) = app
        .send_multipart(
            "POST",
            "/upload",
            &[
                Part::Text("orderId", "ORD500"),
                Part::File {
                    field: "receipt",
                    filename: "r.jpg",
                    content_type: "image/jpeg",
                    content: JPEG_BYTES,
                },
            ],
        )
        .await;
    let asset_id = body["receipt"]["assetId"]
        .as_str()
        .expect("assetId")
        .to_string();
    assert!(app.blobs.contains(&asset_id));

    let (status, _) = app.delete("/receipts/ORD500").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.blobs.contains(&asset_id));
}

#[tokio::test]
async fn test_delete_unknown_order_id_is_404_and_no_mutation() {
    let app = TestApp::new();
    create_receipt(&app, "ORD1").await;
    let (_, before) = app.get("/receipts").await;

    let (status, body) = app.delete("/receipts/ORD999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (_, after) = app.get("/receipts").await;
    assert_eq!(before, after);
}
