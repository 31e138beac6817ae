//! Integration tests for kotoba-api HTTP endpoints
//!
//! Tests cover:
//! - Listing with filters and pagination
//! - Single-card CRUD and review
//! - Random sampling bounds
//! - Enum listings
//! - Batch create, CSV import (multipart), CSV/JSON export, template
//! - Health endpoint
//!
//! Every test runs against a fresh in-memory store seeded with the four
//! sample cards (ids 1..=4).

use axum::{
    body::{Body, Bytes},
    http::{header, Request, StatusCode},
    Router,
};
use kotoba_api::services::csv_import::CSV_TEMPLATE;
use kotoba_api::{build_router, AppState, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Test helper: app over the seeded memory store
fn setup_app() -> Router {
    build_router(AppState::new(Arc::new(MemoryStore::with_sample_data())))
}

/// Test helper: app over an empty memory store
fn setup_empty_app() -> Router {
    build_router(AppState::new(Arc::new(MemoryStore::new())))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: hand-built multipart upload with a single `file` field
fn csv_upload(filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "kotoba-test-boundary";
    let mut body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/flashcards/import/csv")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Test helper: send a request and collect status, headers and body
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    (status, headers, bytes)
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, bytes) = send(app, request).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .expect("Should be an array")
        .iter()
        .map(|card| card["id"].as_i64().unwrap())
        .collect()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app();
    let (status, body) = send_json(&app, test_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "kotoba-api");
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["flashcardCount"], 4);
    assert!(body["version"].is_string());
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_defaults_to_first_page_in_id_order() {
    let app = setup_app();
    let (status, body) = send_json(&app, test_request("GET", "/api/flashcards")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 3, 4]);
    assert_eq!(body[0]["kanji"], "犬");
    assert_eq!(body[0]["category"], 1);
    assert_eq!(body[0]["isFavorite"], true);
}

#[tokio::test]
async fn test_list_second_page() {
    let app = setup_app();
    let (_, body) = send_json(
        &app,
        test_request("GET", "/api/flashcards?pageNumber=2&pageSize=2"),
    )
    .await;
    assert_eq!(ids(&body), vec![3, 4]);

    let (_, body) = send_json(
        &app,
        test_request("GET", "/api/flashcards?pageNumber=5&pageSize=2"),
    )
    .await;
    assert!(ids(&body).is_empty());
}

#[tokio::test]
async fn test_list_filters() {
    let app = setup_app();

    let cases = [
        ("/api/flashcards?category=Animals", vec![1]),
        ("/api/flashcards?category=3", vec![2]),
        ("/api/flashcards?isFavorite=true", vec![1, 3]),
        ("/api/flashcards?wordType=2&difficulty=2", vec![4]),
        ("/api/flashcards?searchTerm=%E3%82%B3%E3%83%BC%E3%83%92%E3%83%BC", vec![2]),
        ("/api/flashcards?searchTerm=MORNING", vec![3]),
        ("/api/flashcards?searchTerm=", vec![1, 2, 3, 4]),
    ];

    for (uri, expected) in cases {
        let (status, body) = send_json(&app, test_request("GET", uri)).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(ids(&body), expected, "{}", uri);
    }
}

#[tokio::test]
async fn test_list_rejects_bad_paging() {
    let app = setup_app();

    for uri in [
        "/api/flashcards?pageNumber=0",
        "/api/flashcards?pageSize=0",
        "/api/flashcards?pageNumber=-1",
    ] {
        let (status, body) = send_json(&app, test_request("GET", uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_list_rejects_unknown_enum() {
    let app = setup_app();
    let (status, _, _) = send(&app, test_request("GET", "/api/flashcards?category=Dragons")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Single-card commands
// =============================================================================

#[tokio::test]
async fn test_get_by_id() {
    let app = setup_app();

    let (status, body) = send_json(&app, test_request("GET", "/api/flashcards/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["katakana"], "コーヒー");

    let (status, body) = send_json(&app, test_request("GET", "/api/flashcards/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_flashcard() {
    let app = setup_app();
    let request = json_request(
        "POST",
        "/api/flashcards",
        json!({
            "kanji": "猫",
            "hiragana": "ねこ",
            "meaning": "cat",
            "wordType": 1,
            "category": "Animals"
        }),
    );

    let (status, headers, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers[header::LOCATION], "/api/flashcards/5");

    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["id"], 5);
    assert_eq!(body["category"], 1);
    assert_eq!(body["difficulty"], 1);
    assert_eq!(body["reviewCount"], 0);
    assert_eq!(body["isFavorite"], false);
    assert!(body["lastReviewedDate"].is_null());

    let (_, body) = send_json(&app, test_request("GET", "/api/flashcards/5")).await;
    assert_eq!(body["meaning"], "cat");
}

#[tokio::test]
async fn test_create_requires_meaning() {
    let app = setup_app();
    let request = json_request("POST", "/api/flashcards", json!({"kanji": "猫", "meaning": " "}));

    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Meaning is required");

    let (_, body) = send_json(&app, test_request("GET", "/health")).await;
    assert_eq!(body["flashcardCount"], 4);
}

#[tokio::test]
async fn test_patch_updates_only_present_fields() {
    let app = setup_app();
    let request = json_request(
        "PATCH",
        "/api/flashcards/4",
        json!({"meaning": "PC", "isFavorite": true}),
    );

    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meaning"], "PC");
    assert_eq!(body["isFavorite"], true);
    assert_eq!(body["katakana"], "コンピューター");
    assert_eq!(body["difficulty"], 2);
}

#[tokio::test]
async fn test_put_with_empty_strings_clears_fields() {
    let app = setup_app();
    let request = json_request(
        "PUT",
        "/api/flashcards/1",
        json!({"kanji": "", "example": ""}),
    );

    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kanji"], "");
    assert!(body["example"].is_null());
    assert_eq!(body["hiragana"], "いぬ");
}

#[tokio::test]
async fn test_update_errors() {
    let app = setup_app();

    let (status, _) = send_json(
        &app,
        json_request("PATCH", "/api/flashcards/1", json!({"meaning": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        json_request("PATCH", "/api/flashcards/999", json!({"meaning": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = setup_app();

    let (status, _, bytes) = send(&app, test_request("DELETE", "/api/flashcards/3")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(bytes.is_empty());

    let (status, _) = send_json(&app, test_request("GET", "/api/flashcards/3")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, test_request("DELETE", "/api/flashcards/3")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_increments_count() {
    let app = setup_app();

    let (status, body) = send_json(&app, test_request("POST", "/api/flashcards/4/review")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reviewCount"], 2);
    assert!(body["lastReviewedDate"].is_string());

    let (_, body) = send_json(&app, test_request("POST", "/api/flashcards/4/review")).await;
    assert_eq!(body["reviewCount"], 3);

    let (status, _) = send_json(&app, test_request("POST", "/api/flashcards/999/review")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Random sample
// =============================================================================

#[tokio::test]
async fn test_random_caps_at_pool_size() {
    let app = setup_app();
    let (status, body) = send_json(&app, test_request("GET", "/api/flashcards/random")).await;
    assert_eq!(status, StatusCode::OK);

    let mut returned = ids(&body);
    assert_eq!(returned.len(), 4);
    returned.sort_unstable();
    assert_eq!(returned, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_random_with_filter() {
    let app = setup_app();
    let (_, body) = send_json(
        &app,
        test_request("GET", "/api/flashcards/random?count=3&category=Food"),
    )
    .await;
    assert_eq!(ids(&body), vec![2]);
}

#[tokio::test]
async fn test_random_count_bounds() {
    let app = setup_app();
    for uri in ["/api/flashcards/random?count=0", "/api/flashcards/random?count=51"] {
        let (status, body) = send_json(&app, test_request("GET", uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["message"], "Count must be between 1 and 50");
    }
}

// =============================================================================
// Enum listings
// =============================================================================

#[tokio::test]
async fn test_enum_listings() {
    let app = setup_app();

    let (_, body) = send_json(&app, test_request("GET", "/api/flashcards/categories")).await;
    let categories = body.as_array().unwrap();
    assert_eq!(categories.len(), 12);
    assert_eq!(categories[1]["value"], 1);
    assert_eq!(categories[1]["name"], "Animals");
    assert!(categories[1]["description"].is_string());

    let (_, body) = send_json(&app, test_request("GET", "/api/flashcards/difficulties")).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
    assert_eq!(body[3]["name"], "Expert");

    let (_, body) = send_json(&app, test_request("GET", "/api/flashcards/wordtypes")).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
    assert_eq!(body[1]["name"], "SinoJapanese");
}

// =============================================================================
// Batch create
// =============================================================================

#[tokio::test]
async fn test_batch_skips_existing_duplicate() {
    let app = setup_app();
    let request = json_request(
        "POST",
        "/api/flashcards/batch",
        json!({
            "flashcards": [
                {"kanji": "犬", "hiragana": "いぬ", "meaning": "doggy"},
                {"kanji": "鳥", "hiragana": "とり", "meaning": "bird", "category": 1}
            ]
        }),
    );

    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProcessed"], 2);
    assert_eq!(body["successCount"], 1);
    assert_eq!(body["errorCount"], 1);
    assert_eq!(body["createdFlashcards"].as_array().unwrap().len(), 1);
    assert_eq!(body["createdFlashcards"][0]["id"], 5);

    let (_, body) = send_json(&app, test_request("GET", "/health")).await;
    assert_eq!(body["flashcardCount"], 5);
}

#[tokio::test]
async fn test_batch_validate_only_persists_nothing() {
    let app = setup_app();
    let request = json_request(
        "POST",
        "/api/flashcards/batch",
        json!({
            "flashcards": [
                {"kanji": "鳥", "meaning": "bird"},
                {"kanji": "魚", "meaning": ""}
            ],
            "validateOnly": true
        }),
    );

    let (_, body) = send_json(&app, request).await;
    assert_eq!(body["successCount"], 1);
    assert_eq!(body["errorCount"], 1);
    assert_eq!(body["errorMessages"][0], "Item 2: Meaning is required");
    assert!(body["createdFlashcards"].as_array().unwrap().is_empty());

    let (_, body) = send_json(&app, test_request("GET", "/health")).await;
    assert_eq!(body["flashcardCount"], 4);
}

#[tokio::test]
async fn test_batch_rejects_empty_list() {
    let app = setup_app();
    let (status, _) = send_json(
        &app,
        json_request("POST", "/api/flashcards/batch", json!({"flashcards": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// CSV import
// =============================================================================

#[tokio::test]
async fn test_import_template_into_empty_store() {
    let app = setup_empty_app();
    let (status, body) = send_json(&app, csv_upload("flashcards_template.csv", CSV_TEMPLATE.as_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProcessed"], 3);
    assert_eq!(body["successCount"], 3);
    assert_eq!(body["errorCount"], 0);
    assert_eq!(ids(&body["createdFlashcards"]), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_import_template_into_seeded_store_skips_duplicates() {
    let app = setup_app();
    let (_, body) = send_json(&app, csv_upload("cards.CSV", CSV_TEMPLATE.as_bytes())).await;

    assert_eq!(body["successCount"], 0);
    assert_eq!(body["errorCount"], 3);
}

#[tokio::test]
async fn test_import_rejects_undefined_word_type_row() {
    let app = setup_app();
    let csv = "Kanji,Hiragana,Katakana,Meaning,Example,WordType,Difficulty,Category\n\
               鳥,とり,,bird,,1,1,1\n\
               ,,ペン,pen,,99,1,0\n\
               魚,さかな,,fish,,1,1,3\n";

    let (status, body) = send_json(&app, csv_upload("words.csv", csv.as_bytes())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProcessed"], 3);
    assert_eq!(body["successCount"], 2);
    assert_eq!(body["errorCount"], 1);
    assert!(body["errorMessages"][0].as_str().unwrap().starts_with("Line 3:"));

    let (_, body) = send_json(&app, test_request("GET", "/api/flashcards?searchTerm=pen")).await;
    assert!(ids(&body).is_empty());
}

#[tokio::test]
async fn test_import_upload_checks() {
    let app = setup_app();

    let (status, body) = send_json(&app, csv_upload("words.txt", CSV_TEMPLATE.as_bytes())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "File must be a CSV file");

    let (status, body) = send_json(&app, csv_upload("words.csv", b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Please select a CSV file");

    let (status, _) = send_json(&app, csv_upload("words.csv", b"Kanji,Meaning\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Export and template
// =============================================================================

#[tokio::test]
async fn test_export_csv_download() {
    let app = setup_app();
    let (status, headers, bytes) = send(&app, test_request("GET", "/api/flashcards/export/csv")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"flashcards_"));
    assert!(disposition.ends_with(".csv\""));

    assert!(bytes.starts_with(UTF8_BOM));
    let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("Kanji,Hiragana,Katakana,Meaning,Example"));
}

#[tokio::test]
async fn test_export_csv_filtered_to_nothing_keeps_header() {
    let app = setup_app();
    let (_, _, bytes) = send(
        &app,
        test_request("GET", "/api/flashcards/export/csv?category=Verbs"),
    )
    .await;
    let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
    assert_eq!(text.lines().count(), 1);
}

#[tokio::test]
async fn test_export_json_download() {
    let app = setup_app();
    let (status, headers, bytes) = send(
        &app,
        test_request("GET", "/api/flashcards/export/json?isFavorite=true"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .ends_with(".json\""));

    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(text.contains("おはよう"));
    let body: Value = serde_json::from_str(text).unwrap();
    assert_eq!(ids(&body), vec![1, 3]);
}

#[tokio::test]
async fn test_csv_template_download() {
    let app = setup_app();
    let (status, headers, bytes) = send(&app, test_request("GET", "/api/flashcards/template/csv")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"flashcards_template.csv\""
    );
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), CSV_TEMPLATE);
}

#[tokio::test]
async fn test_export_then_import_round_trips() {
    let source = setup_app();
    let (_, _, exported) = send(&source, test_request("GET", "/api/flashcards/export/csv")).await;

    let target = setup_empty_app();
    let (status, body) = send_json(&target, csv_upload("export.csv", &exported)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["successCount"], 4);

    let (_, original) = send_json(&source, test_request("GET", "/api/flashcards")).await;
    let (_, imported) = send_json(&target, test_request("GET", "/api/flashcards")).await;

    let fields = [
        "kanji", "hiragana", "katakana", "meaning", "example", "wordType", "difficulty", "category",
    ];
    for (a, b) in original.as_array().unwrap().iter().zip(imported.as_array().unwrap()) {
        for field in fields {
            assert_eq!(a[field], b[field], "{}", field);
        }
    }
}
