mod common;

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use base_of_office::app_state::AppState;
use base_of_office::auth::Authentication;
use base_of_office::routes::configure_routes;
use base_of_office::store::MemoryStore;
use common::{test_config, TEST_JWT_SECRET};
use serde_json::json;

macro_rules! make_app {
    () => {{
        let store = Arc::new(MemoryStore::new());
        let state = web::Data::new(AppState::build(store, test_config()));
        test::init_service(
            App::new()
                .wrap(Authentication::new(TEST_JWT_SECRET))
                .app_data(state.clone())
                .configure(configure_routes),
        )
        .await
    }};
}

/// Signs a user up and yields `(token, user_id)`.
macro_rules! signup {
    ($app:expr, $email:expr, $role:expr) => {{
        let req = test::TestRequest::post()
            .uri("/auth/signup")
            .set_json(json!({
                "email": $email,
                "password": "secret-pass",
                "full_name": "Test User",
                "role": $role,
            }))
            .to_request();
        let resp = test::call_service($app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        let token = body["token"].as_str().unwrap().to_string();
        let user_id = body["user"]["_id"].as_str().unwrap().to_string();
        (token, user_id)
    }};
}

#[tokio::test]
async fn signup_create_team_and_join_over_http() {
    let app = make_app!();

    let (founder_token, founder_id) = signup!(&app, "founder@acme.com", "founder");

    let req = test::TestRequest::post()
        .uri("/teams")
        .insert_header(("Authorization", format!("Bearer {}", founder_token)))
        .set_json(json!({ "name": "Acme" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let team: serde_json::Value = test::read_body_json(resp).await;
    let team_id = team["_id"].as_str().unwrap().to_string();
    let invite_code = team["inviteCode"].as_str().unwrap().to_string();
    assert_eq!(invite_code.len(), 6);

    let (joiner_token, joiner_id) = signup!(&app, "joiner@acme.com", "individual");
    let req = test::TestRequest::post()
        .uri("/teams/join")
        .insert_header(("Authorization", format!("Bearer {}", joiner_token)))
        .set_json(json!({ "invite_code": invite_code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let joined: serde_json::Value = test::read_body_json(resp).await;
    let members = joined["members"].as_array().unwrap();
    assert!(members.iter().any(|m| m == founder_id.as_str()));
    assert!(members.iter().any(|m| m == joiner_id.as_str()));

    let req = test::TestRequest::get()
        .uri(&format!("/teams/{}/members", team_id))
        .insert_header(("Authorization", format!("Bearer {}", joiner_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let members: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(members.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = make_app!();

    let req = test::TestRequest::post()
        .uri("/teams")
        .set_json(json!({ "name": "Acme" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_bearer_tokens_are_rejected() {
    let app = make_app!();

    let req = test::TestRequest::post()
        .uri("/teams")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .set_json(json!({ "name": "Acme" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_invite_code_maps_to_not_found() {
    let app = make_app!();
    let (token, _) = signup!(&app, "loner@acme.com", "individual");

    let req = test::TestRequest::post()
        .uri("/teams/join")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "invite_code": "ZZZZZZ" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_INVITE_CODE");
}

#[tokio::test]
async fn task_status_flow_over_http() {
    let app = make_app!();
    let (founder_token, founder_id) = signup!(&app, "founder@acme.com", "founder");

    let req = test::TestRequest::post()
        .uri("/teams")
        .insert_header(("Authorization", format!("Bearer {}", founder_token)))
        .set_json(json!({ "name": "Acme" }))
        .to_request();
    let team: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    let team_id = team["_id"].as_str().unwrap();

    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(("Authorization", format!("Bearer {}", founder_token)))
        .set_json(json!({
            "title": "Clean kitchen",
            "assigned_to": founder_id,
            "team_id": team_id,
            "task_type": "cleaning",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let task: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(task["status"], "pending");
    let task_id = task["_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/tasks/{}/status", task_id))
        .insert_header(("Authorization", format!("Bearer {}", founder_token)))
        .set_json(json!({ "status": "completed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let task: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(task["status"], "completed");
    assert!(task["completedAt"].is_string());

    // Cancelling and then reviving must conflict.
    let req = test::TestRequest::put()
        .uri(&format!("/tasks/{}/status", task_id))
        .insert_header(("Authorization", format!("Bearer {}", founder_token)))
        .set_json(json!({ "status": "cancelled" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = test::TestRequest::put()
        .uri(&format!("/tasks/{}/status", task_id))
        .insert_header(("Authorization", format!("Bearer {}", founder_token)))
        .set_json(json!({ "status": "pending" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );
}
