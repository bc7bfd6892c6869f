use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

fn admin_bearer(secret: &str) -> String {
    let claims = formbuilder_backend::middleware::auth::Claims {
        sub: Uuid::new_v4().to_string(),
        exp: 4102444800, // 2100-01-01
        role: Some("admin".to_string()),
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("encode jwt");
    format!("Bearer {}", token)
}

async fn body_json(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn admin_render_submit_flow_end_to_end() {
    dotenvy::dotenv().ok();
    let Ok(_) = env::var("DATABASE_URL") else {
        eprintln!("skipping http_api_test: DATABASE_URL is not set");
        return;
    };
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("RESULT_PAGE_URL", "http://localhost/results");
    env::set_var("ADMIN_RPS", "100");
    env::set_var("PUBLIC_RPS", "100");

    formbuilder_backend::config::init_config().expect("init config");
    let pool = formbuilder_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let app_state = formbuilder_backend::AppState::new(pool);
    let app = Router::new()
        .route(
            "/api/admin/questions",
            post(formbuilder_backend::routes::admin::create_question),
        )
        .route(
            "/api/admin/builds",
            post(formbuilder_backend::routes::admin::create_build),
        )
        .route(
            "/api/admin/builds/:id/entries",
            get(formbuilder_backend::routes::admin::list_entries_by_build),
        )
        .layer(axum::middleware::from_fn(
            formbuilder_backend::middleware::auth::require_admin,
        ))
        .route(
            "/api/public/forms/:build_id",
            get(formbuilder_backend::routes::public::get_form),
        )
        .route(
            "/api/public/forms/:build_id/submit",
            post(formbuilder_backend::routes::public::submit_form),
        )
        .with_state(app_state);

    let bearer = admin_bearer("test_secret_key");

    // unauthenticated admin calls are refused
    let req = Request::builder()
        .method("POST")
        .uri("/api/admin/questions")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // seed one quiz question and one survey question
    let q1_body = json!({
        "text": "2+2?",
        "input_type": "single_choice",
        "options": ["3", "4", "5"],
        "correct_options": [1]
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/admin/questions")
        .header("authorization", &bearer)
        .header("content-type", "application/json")
        .body(Body::from(q1_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let q1: JsonValue = body_json(resp).await;
    let q1_id = q1["id"].as_str().unwrap().to_string();

    let q2_body = json!({
        "text": "How did we do?",
        "input_type": "single_choice",
        "options": ["Great", "Okay", "Poor"]
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/admin/questions")
        .header("authorization", &bearer)
        .header("content-type", "application/json")
        .body(Body::from(q2_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let q2: JsonValue = body_json(resp).await;
    let q2_id = q2["id"].as_str().unwrap().to_string();

    let build_body = json!({
        "title": "Exit quiz",
        "kind": "quiz",
        "question_ids": [q1_id, q2_id],
        "layout": "single_page",
        "required": true,
        "guest_allowed": true,
        "ajax_enabled": true
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/admin/builds")
        .header("authorization", &bearer)
        .header("content-type", "application/json")
        .body(Body::from(build_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let build: JsonValue = body_json(resp).await;
    let build_id = build["id"].as_str().unwrap().to_string();

    // render the form: questions come back without markers, with a token
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/public/forms/{}?show_title=true", build_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let model: JsonValue = body_json(resp).await;
    assert_eq!(model["title"], "Exit quiz");
    assert_eq!(model["questions"].as_array().unwrap().len(), 2);
    assert!(model["questions"][0].get("correct_options").is_none());
    let form_token = model["form_token"].as_str().unwrap().to_string();

    // submit as a guest
    let submit_body = json!({
        "form_token": form_token,
        "answers": [
            { "question_id": q1_id, "selected": [1] },
            { "question_id": q2_id, "selected": [0] }
        ],
        "guest": { "name": "Alice", "email": "alice@example.com" }
    });
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/public/forms/{}/submit", build_id))
        .header("content-type", "application/json")
        .body(Body::from(submit_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let result: JsonValue = body_json(resp).await;
    assert_eq!(result["correct_count"], 1);
    assert_eq!(result["scorable_count"], 1);
    assert_eq!(result["status"], "complete");
    let entry_id = result["entry_id"].as_str().unwrap().to_string();

    // the same token a second time gets the generic rejection
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/public/forms/{}/submit", build_id))
        .header("content-type", "application/json")
        .body(Body::from(submit_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let rejected: JsonValue = body_json(resp).await;
    assert_eq!(rejected["error"], "submission_rejected");

    // exactly one entry is visible to the admin
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/admin/builds/{}/entries", build_id))
        .header("authorization", &bearer)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let entries: JsonValue = body_json(resp).await;
    let items = entries["items"].as_array().unwrap();
    assert!(items.iter().any(|e| e["id"] == entry_id.as_str()));
}
