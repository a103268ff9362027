//! API integration tests
//!
//! These run against a live server on a fresh database:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated admin token
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Unique suffix so tests can run repeatedly against the same database
fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

/// Create one equipment unit, returning its id
async fn create_unit(client: &Client, token: &str, equipment_type: &str, serial: &str) -> i64 {
    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": format!("{} unit", equipment_type),
            "serial_number": serial,
            "equipment_type": equipment_type
        }))
        .send()
        .await
        .expect("Failed to create equipment");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No equipment ID")
}

async fn get_equipment_status(client: &Client, token: &str, id: i64) -> String {
    let response = client
        .get(format!("{}/equipment/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to get equipment");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["status"].as_str().expect("No status").to_string()
}

/// Submit a borrow request for `quantity` units of a type, returning its id
async fn submit_borrow(client: &Client, token: &str, equipment_type: &str, quantity: i64) -> i64 {
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "equipment_requests": [
                { "equipment_type": equipment_type, "quantity": quantity }
            ],
            "purpose": "Field operation",
            "contact": "0123456789"
        }))
        .send()
        .await
        .expect("Failed to submit borrow request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "pending_borrow_approval");
    body["id"].as_i64().expect("No borrow ID")
}

async fn get_borrow(client: &Client, token: &str, id: i64) -> Value {
    let response = client
        .get(format!("{}/borrows/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to get borrow");

    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/equipment", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_borrow_happy_path() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let suffix = unique_suffix();
    let equipment_type = format!("ULV sprayer {}", suffix);
    let unit_a = create_unit(&client, &token, &equipment_type, &format!("SN-A-{}", suffix)).await;
    let unit_b = create_unit(&client, &token, &equipment_type, &format!("SN-B-{}", suffix)).await;

    let borrow_id = submit_borrow(&client, &token, &equipment_type, 2).await;

    // Approve: both units become pending_delivery, assignments match demand
    let response = client
        .post(format!("{}/borrows/{}/approve", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to approve");

    assert!(response.status().is_success());
    let details: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(details["status"], "pending_delivery");
    let assigned = details["equipment_assigned"].as_array().expect("No assignments");
    assert_eq!(assigned.len(), 2);
    assert_eq!(get_equipment_status(&client, &token, unit_a).await, "pending_delivery");
    assert_eq!(get_equipment_status(&client, &token, unit_b).await, "pending_delivery");

    // First unit assessed: request must NOT flip to borrowed yet
    let response = client
        .post(format!("{}/borrows/{}/assessments/delivery", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "equipment_id": unit_a,
            "items": [
                { "label": "nozzle", "condition": "normal" },
                { "label": "tank", "condition": "normal" }
            ]
        }))
        .send()
        .await
        .expect("Failed to assess delivery");

    assert!(response.status().is_success());
    let details: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(details["status"], "pending_delivery");
    assert_eq!(get_equipment_status(&client, &token, unit_a).await, "borrowed");

    // Second unit assessed: now the whole request is borrowed
    let response = client
        .post(format!("{}/borrows/{}/assessments/delivery", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "equipment_id": unit_b,
            "items": [{ "label": "nozzle", "condition": "normal" }]
        }))
        .send()
        .await
        .expect("Failed to assess delivery");

    assert!(response.status().is_success());
    let details: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(details["status"], "borrowed");

    // Return: snapshot copied, equipment untouched until assessment
    let response = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to return");

    assert!(response.status().is_success());
    let details: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(details["status"], "returned_pending_assessment");
    assert_eq!(details["equipment_returned"].as_array().unwrap().len(), 2);
    assert_eq!(get_equipment_status(&client, &token, unit_a).await, "borrowed");

    // Post-return assessments, both normal
    for unit in [unit_a, unit_b] {
        let response = client
            .post(format!("{}/borrows/{}/assessments/return", BASE_URL, borrow_id))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({
                "equipment_id": unit,
                "items": [{ "label": "overall", "condition": "normal" }]
            }))
            .send()
            .await
            .expect("Failed to assess return");
        assert!(response.status().is_success());
    }

    let details = get_borrow(&client, &token, borrow_id).await;
    assert_eq!(details["status"], "completed");
    assert_eq!(get_equipment_status(&client, &token, unit_a).await, "available");
    assert_eq!(get_equipment_status(&client, &token, unit_b).await, "available");
}

#[tokio::test]
#[ignore]
async fn test_approve_insufficient_availability() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let suffix = unique_suffix();
    let equipment_type = format!("fog machine {}", suffix);
    let unit = create_unit(&client, &token, &equipment_type, &format!("SN-{}", suffix)).await;

    let borrow_id = submit_borrow(&client, &token, &equipment_type, 2).await;

    let response = client
        .post(format!("{}/borrows/{}/approve", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send approve");

    assert_eq!(response.status(), 400);

    // Nothing was written: unit still available, request still pending
    assert_eq!(get_equipment_status(&client, &token, unit).await, "available");
    let details = get_borrow(&client, &token, borrow_id).await;
    assert_eq!(details["status"], "pending_borrow_approval");
    assert!(details["equipment_assigned"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_reject_touches_no_equipment() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let suffix = unique_suffix();
    let equipment_type = format!("sprayer {}", suffix);
    let unit = create_unit(&client, &token, &equipment_type, &format!("SN-{}", suffix)).await;

    let borrow_id = submit_borrow(&client, &token, &equipment_type, 1).await;

    let response = client
        .post(format!("{}/borrows/{}/reject", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "reason": "No justification given" }))
        .send()
        .await
        .expect("Failed to reject");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "rejected");
    assert_eq!(get_equipment_status(&client, &token, unit).await, "available");

    // A rejected request is terminal
    let response = client
        .post(format!("{}/borrows/{}/approve", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send approve");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_fault_path_spawns_repair() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let suffix = unique_suffix();
    let equipment_type = format!("pump {}", suffix);
    // Created first, so assigned first (oldest created_at wins)
    let faulty = create_unit(&client, &token, &equipment_type, &format!("SN-F-{}", suffix)).await;
    let spare = create_unit(&client, &token, &equipment_type, &format!("SN-S-{}", suffix)).await;

    let borrow_id = submit_borrow(&client, &token, &equipment_type, 1).await;

    let response = client
        .post(format!("{}/borrows/{}/approve", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to approve");
    assert!(response.status().is_success());
    let details: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        details["equipment_assigned"][0]["equipment_id"].as_i64(),
        Some(faulty)
    );

    // Pre-delivery assessment finds a fault; the spare takes the slot
    let response = client
        .post(format!("{}/borrows/{}/assessments/delivery", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "equipment_id": faulty,
            "items": [{ "label": "motor", "condition": "abnormal" }],
            "replacement_id": spare,
            "notes": "Motor does not start"
        }))
        .send()
        .await
        .expect("Failed to assess delivery");

    assert!(response.status().is_success());
    let details: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(details["status"], "borrowed");
    assert_eq!(
        details["equipment_assigned"][0]["equipment_id"].as_i64(),
        Some(spare)
    );
    assert_eq!(get_equipment_status(&client, &token, faulty).await, "under_maintenance");
    assert_eq!(get_equipment_status(&client, &token, spare).await, "borrowed");

    // Return and fail the post-return assessment
    let response = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to return");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/borrows/{}/assessments/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "equipment_id": spare,
            "items": [{ "label": "hose", "condition": "abnormal" }],
            "damage_description": "Cracked hose",
            "estimated_cost": "150.00"
        }))
        .send()
        .await
        .expect("Failed to assess return");

    assert!(response.status().is_success());
    let details: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(details["status"], "completed");
    assert_eq!(get_equipment_status(&client, &token, spare).await, "pending_repair_approval");

    // Exactly one repair request references this borrow and unit
    let response = client
        .get(format!("{}/repairs?equipment_id={}", BASE_URL, spare))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to list repairs");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    let repairs = body["items"].as_array().expect("No repairs array");
    assert_eq!(repairs.len(), 1);
    let repair = &repairs[0];
    assert_eq!(repair["status"], "pending_repair_approval");
    assert_eq!(repair["borrow_id"].as_i64(), Some(borrow_id));
    let repair_id = repair["id"].as_i64().expect("No repair ID");

    // Approve the repair: the unit moves into maintenance
    let response = client
        .post(format!("{}/repairs/{}/approve", BASE_URL, repair_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to approve repair");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "repair_approved");
    assert_eq!(get_equipment_status(&client, &token, spare).await, "under_maintenance");

    // Complete it: the unit is available again
    let response = client
        .post(format!("{}/repairs/{}/complete", BASE_URL, repair_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "repair_details": "Replaced hose",
            "final_cost": "120.50",
            "parts_used": "1x hose"
        }))
        .send()
        .await
        .expect("Failed to complete repair");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "repair_completed");
    assert_eq!(get_equipment_status(&client, &token, spare).await, "available");
}

#[tokio::test]
#[ignore]
async fn test_every_mutation_is_logged() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let suffix = unique_suffix();
    let equipment_type = format!("trap {}", suffix);
    create_unit(&client, &token, &equipment_type, &format!("SN-{}", suffix)).await;
    let borrow_id = submit_borrow(&client, &token, &equipment_type, 1).await;

    for (action, expected_borrow) in [
        ("ADD_EQUIPMENT", None),
        ("CREATE_BORROW_REQUEST", Some(borrow_id)),
    ] {
        let response = client
            .get(format!("{}/activity?action={}&per_page=5", BASE_URL, action))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to list activity");

        assert!(response.status().is_success());
        let body: Value = response.json().await.expect("Failed to parse response");
        let entries = body["items"].as_array().expect("No entries");
        assert!(!entries.is_empty(), "no {} entry found", action);
        if let Some(id) = expected_borrow {
            assert!(entries
                .iter()
                .any(|e| e["detail"]["borrow_id"].as_i64() == Some(id)));
        }
    }
}

#[tokio::test]
#[ignore]
async fn test_delete_equipment_refused_while_assigned() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let suffix = unique_suffix();
    let equipment_type = format!("net {}", suffix);
    let unit = create_unit(&client, &token, &equipment_type, &format!("SN-{}", suffix)).await;
    let borrow_id = submit_borrow(&client, &token, &equipment_type, 1).await;

    let response = client
        .post(format!("{}/borrows/{}/approve", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to approve");
    assert!(response.status().is_success());

    // The unit is pending delivery; soft delete must be refused
    let response = client
        .delete(format!("{}/equipment/{}", BASE_URL, unit))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete");

    assert_eq!(response.status(), 400);
    assert_eq!(get_equipment_status(&client, &token, unit).await, "pending_delivery");
}
