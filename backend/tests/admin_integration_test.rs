//! Integration tests for notices, category codes, foods and the dashboard

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8])
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_notice_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.register_admin("admin").await;
    let user = app.register("reader").await;
    let category_id = app.category_id("NOTICES_GROUP_002").await;

    let (status, body) = app
        .json(
            "POST",
            "/api/v1/notices",
            Some(&admin.token),
            json!({
                "category_id": category_id,
                "title": "Maintenance window",
                "content": "Sunday 02:00",
                "is_important": true,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let notice = &body["data"];
    assert_eq!(notice["status"], "active");
    assert_eq!(notice["is_important"], "Y");
    assert_eq!(notice["category_text"], "Update");
    let path = format!("/api/v1/notices/{}", notice["view_hash"].as_str().unwrap());

    let (status, body) = app.get("/api/v1/notices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["title"] == "Maintenance window"));

    let (status, _) = app
        .json("PUT", &path, Some(&user.token), json!({"category_id": category_id, "title": "x"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .json(
            "PUT",
            &path,
            Some(&admin.token),
            json!({"category_id": category_id, "title": "Maintenance moved"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Maintenance moved");
    assert_eq!(body["data"]["status"], "active");

    let (status, _) = app.delete(&path, Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/v1/notices/unknown-hash", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_category_codes_are_grouped_and_conflicts_rejected() {
    let app = TestApp::new().await;
    let admin = app.register_admin("catadmin").await;
    let category_type = unique("TEST").to_uppercase();

    let (status, body) = app
        .json(
            "POST",
            "/api/v1/categories",
            Some(&admin.token),
            json!({"type": category_type.to_lowercase(), "value": "First", "sort": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], category_type.as_str());
    assert_eq!(body["data"]["code"], format!("{}_001", category_type));
    let first_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .json(
            "POST",
            "/api/v1/categories",
            Some(&admin.token),
            json!({"type": category_type, "value": "Clash", "sort": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .json(
            "POST",
            "/api/v1/categories",
            Some(&admin.token),
            json!({"type": category_type, "value": "Second", "sort": 2}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .get(&format!("/api/v1/categories?type={}", category_type), None)
        .await;
    let group = body["data"][category_type.to_lowercase()].as_array().unwrap();
    let values: Vec<_> = group.iter().map(|c| c["value"].as_str().unwrap()).collect();
    assert_eq!(values, vec!["First", "Second"]);

    let (status, body) = app
        .json(
            "PUT",
            &format!("/api/v1/categories/{}", first_id),
            Some(&admin.token),
            json!({"type": category_type, "value": "Renamed", "sort": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "Renamed");

    let (status, _) = app
        .delete(&format!("/api/v1/categories/{}", first_id), Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app
        .get(&format!("/api/v1/categories?type={}", category_type), None)
        .await;
    assert_eq!(body["data"][category_type.to_lowercase()].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_foods_get_sequential_codes() {
    let app = TestApp::new().await;
    let admin = app.register_admin("foodadmin").await;
    let name = unique("kimchi");

    let (status, first) = app
        .json("POST", "/api/v1/categories/foods", Some(&admin.token), json!({"food_name": name}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let code = first["data"]["food_code"].as_str().unwrap().to_string();
    assert!(code.starts_with("FOOD_"));
    assert_eq!(code.len(), "FOOD_".len() + 6);
    assert_eq!(first["data"]["food_type"], "food");

    let (status, _) = app
        .json("POST", "/api/v1/categories/foods", Some(&admin.token), json!({"food_name": name}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, second) = app
        .json(
            "POST",
            "/api/v1/categories/foods",
            Some(&admin.token),
            json!({"food_name": format!("{}_stew", name)}),
        )
        .await;
    let next: u64 = second["data"]["food_code"].as_str().unwrap()[5..].parse().unwrap();
    let prev: u64 = code[5..].parse().unwrap();
    assert!(next > prev);

    let (status, body) = app
        .get(&format!("/api/v1/categories/foods/search?food_name={}", name), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .get("/api/v1/categories/foods/search?food_name=", None)
        .await;
    assert_eq!(body["data"], json!([]));
}

fn code_number(body: &serde_json::Value) -> u64 {
    let code = body["data"]["food_code"].as_str().unwrap();
    code.rsplit('_').next().unwrap().parse().unwrap()
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_food_codes_ignore_type_case_and_moved_items() {
    let app = TestApp::new().await;
    let admin = app.register_admin("drinkadmin").await;
    let path = "/api/v1/categories/foods";
    let name = unique("latte");

    let (status, first) = app
        .json("POST", path, Some(&admin.token), json!({"food_type": "Drink", "food_name": name}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", first);
    assert_eq!(first["data"]["food_type"], "drink");
    assert!(first["data"]["food_code"].as_str().unwrap().starts_with("DRINK_"));

    let (status, second) = app
        .json(
            "POST",
            path,
            Some(&admin.token),
            json!({"food_type": "drink", "food_name": format!("{}_iced", name)}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", second);
    assert!(code_number(&second) > code_number(&first));

    let (status, moved) = app
        .json(
            "PUT",
            &format!("{}/{}", path, second["data"]["id"]),
            Some(&admin.token),
            json!({"food_type": "food", "food_name": format!("{}_iced", name)}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["data"]["food_type"], "food");
    assert_eq!(moved["data"]["food_code"], second["data"]["food_code"]);

    let (status, third) = app
        .json(
            "POST",
            path,
            Some(&admin.token),
            json!({"food_type": "DRINK", "food_name": format!("{}_hot", name)}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", third);
    assert!(code_number(&third) > code_number(&second));

    let (status, _) = app
        .json(
            "POST",
            path,
            Some(&admin.token),
            json!({"food_type": "x".repeat(17), "food_name": unique("long")}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_dashboard_stats() {
    let app = TestApp::new().await;
    let admin = app.register_admin("statsadmin").await;

    let (status, body) = app.get("/api/v1/dashboard/stats", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert!(stats["total_users"].as_i64().unwrap() >= 1);
    assert!(stats["total_feeds"].as_i64().unwrap() >= 0);
    assert!(stats["last_user_registered"]
        .as_str()
        .unwrap()
        .ends_with("ago") || stats["last_user_registered"] == "just now");
}
