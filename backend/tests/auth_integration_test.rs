//! Integration tests for registration, login and the account endpoints

mod common;

use axum::http::StatusCode;
use common::Part;
use serde_json::json;

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_and_login() {
    let app = common::TestApp::new().await;
    let user = app.register("alice").await;
    assert!(!user.token.is_empty());
    assert!(!user.user_hash.is_empty());

    let (status, body) = app
        .json(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": user.email, "password": "SecurePassword123!"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["user_hash"], user.user_hash.as_str());
    assert_eq!(body["data"]["tokens"]["token_type"], "Bearer");
    assert!(!body["data"]["user"]["last_login_at"].is_null());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_duplicate_email_conflicts() {
    let app = common::TestApp::new().await;
    let user = app.register("bob").await;

    let data = json!({
        "sns_login_type": "EMAIL",
        "nickname": "bob2",
        "email": user.email,
        "password": "SecurePassword123!",
    })
    .to_string();
    let (status, body) = app
        .multipart("POST", "/api/v1/auth/register", None, &[Part::Text("data", &data)])
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_rejects_weak_password_and_bad_email() {
    let app = common::TestApp::new().await;

    for (email, password) in [("not-an-email", "SecurePassword123!"), ("weak@example.com", "123")] {
        let data = json!({
            "sns_login_type": "EMAIL",
            "nickname": "weak",
            "email": email,
            "password": password,
        })
        .to_string();
        let (status, _) = app
            .multipart("POST", "/api/v1/auth/register", None, &[Part::Text("data", &data)])
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} / {}", email, password);
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_with_avatar_stores_variants() {
    let app = common::TestApp::new().await;
    let email = format!("avatar_{}@example.com", uuid::Uuid::new_v4().simple());
    let data = json!({
        "sns_login_type": "EMAIL",
        "nickname": "avatar",
        "email": email,
        "password": "SecurePassword123!",
    })
    .to_string();
    let png = common::png_bytes(800, 600);

    let (status, body) = app
        .multipart(
            "POST",
            "/api/v1/auth/register",
            None,
            &[
                Part::Text("data", &data),
                Part::File("profile_image", "me.png", &png),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let image = body["data"]["user"]["profile_image"].as_str().unwrap();
    assert!(image.starts_with("/attaches/users/"));
    assert_eq!(
        app.get_raw(&format!("{}_medium.jpg", image)).await,
        StatusCode::OK
    );
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_wrong_password_is_unauthorized() {
    let app = common::TestApp::new().await;
    let user = app.register("carol").await;

    let (status, _) = app
        .json(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": user.email, "password": "WrongPassword!"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_refresh_rejects_access_token() {
    let app = common::TestApp::new().await;
    let user = app.register("dave").await;

    let (status, _) = app
        .json(
            "POST",
            "/api/v1/auth/refresh",
            None,
            json!({"refresh_token": user.token}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_withdraw_blocks_login() {
    let app = common::TestApp::new().await;
    let user = app.register("erin").await;

    let (status, _) = app.delete("/api/v1/auth/withdraw", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .json(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": user.email, "password": "SecurePassword123!"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_my_info_and_profile_update() {
    let app = common::TestApp::new().await;
    let user = app.register("frank").await;

    let (status, body) = app
        .multipart(
            "PUT",
            "/api/v1/users/me",
            Some(&user.token),
            &[
                Part::Text("nickname", "franky"),
                Part::Text("description", "likes soup"),
                Part::Text("push_agree", "Y"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "franky");
    assert_eq!(body["data"]["push_agree"], true);

    let (status, body) = app.get("/api/v1/users/me", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["description"], "likes soup");
    assert_eq!(body["data"]["feed_count"], 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_change_password() {
    let app = common::TestApp::new().await;
    let user = app.register("gina").await;

    let (status, _) = app
        .json(
            "PUT",
            "/api/v1/users/password",
            Some(&user.token),
            json!({"current_password": "nope-nope", "new_password": "AnotherPass456!"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .json(
            "PUT",
            "/api/v1/users/password",
            Some(&user.token),
            json!({"current_password": "SecurePassword123!", "new_password": "AnotherPass456!"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .json(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": user.email, "password": "AnotherPass456!"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_deny_toggle() {
    let app = common::TestApp::new().await;
    let me = app.register("henry").await;
    let other = app.register("iris").await;

    let path = "/api/v1/users/denies";
    let (status, body) = app
        .json("POST", path, Some(&me.token), json!({"deny_user_hash": other.user_hash}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["denied"], true);

    let (_, body) = app.get(path, Some(&me.token)).await;
    assert_eq!(body["data"][0]["user_hash"], other.user_hash.as_str());

    let (_, body) = app
        .json("POST", path, Some(&me.token), json!({"deny_user_hash": other.user_hash}))
        .await;
    assert_eq!(body["data"]["denied"], false);

    let (status, _) = app
        .json("POST", path, Some(&me.token), json!({"deny_user_hash": me.user_hash}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_admin_user_listing() {
    let app = common::TestApp::new().await;
    let admin = app.register_admin("root").await;
    let user = app.register("jules").await;

    let (status, _) = app.get("/api/v1/users", Some(&user.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .get("/api/v1/users?nickname=jules&page=1&limit=5", Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["per_page"], 5);
    assert!(body["data"]["total"].as_u64().unwrap() >= 1);
}
