//! Integration tests for the public waitlist and its admin management endpoints.

mod common;

use axum::http::{header, StatusCode};
use common::{
    create_failing_waitlist_app, create_test_app, fake_name, json_request, login_cookie,
    parse_response_body, request_with_cookie, response_text, seed_admin, test_config,
    unique_test_email,
};
use serde_json::json;
use tower::ServiceExt;

fn signup_body(email: &str) -> serde_json::Value {
    json!({
        "email": email,
        "name": fake_name(),
        "source": "landing-page",
        "interests": ["Reporting", "reporting", "exports"]
    })
}

fn with_cookie(
    mut request: axum::http::Request<axum::body::Body>,
    cookie: &str,
) -> axum::http::Request<axum::body::Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

#[tokio::test]
async fn test_signup_and_duplicate() {
    let (app, _stores) = create_test_app(test_config());
    let email = unique_test_email();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/waitlist", signup_body(&email)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], true);
    assert!(body["id"].is_string());

    // Same address in another case is still a duplicate.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/waitlist",
            signup_body(&format!("  {}  ", email.to_uppercase())),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = parse_response_body(response).await;
    assert_eq!(body["code"], "email_exists");

    let response = app
        .oneshot(request_with_cookie("GET", "/api/waitlist", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body, json!({ "count": 1 }));
}

#[tokio::test]
async fn test_signup_validation() {
    let (app, _stores) = create_test_app(test_config());

    let cases = [
        json!({ "email": "not-an-email", "name": "Jane" }),
        json!({ "email": unique_test_email(), "name": "   " }),
        json!({ "email": unique_test_email(), "name": "Jane", "source": "Not A Slug!" }),
        json!({ "email": unique_test_email() }),
    ];

    for case in cases {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/waitlist", case.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "case: {}", case);
        let body = parse_response_body(response).await;
        assert_eq!(body["code"], "validation_error");
    }
}

#[tokio::test]
async fn test_signup_store_failure_is_server_error() {
    let app = create_failing_waitlist_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/waitlist",
            signup_body(&unique_test_email()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body["code"], "server_error");

    let response = app
        .oneshot(request_with_cookie("GET", "/api/waitlist", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_admin_routes_require_session() {
    let (app, _stores) = create_test_app(test_config());

    for (method, uri) in [
        ("GET", "/api/admin/waitlist"),
        ("GET", "/api/admin/waitlist/export"),
        ("DELETE", "/api/admin/waitlist?id=00000000-0000-0000-0000-000000000000"),
    ] {
        let response = app
            .clone()
            .oneshot(request_with_cookie(method, uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }

    let response = app
        .oneshot(request_with_cookie(
            "GET",
            "/api/admin/waitlist",
            Some(&format!("admin_session={}", "a".repeat(64))),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_list_update_and_delete() {
    let (app, stores) = create_test_app(test_config());
    let admin_email = unique_test_email();
    seed_admin(&stores, &admin_email).await;
    let cookie = login_cookie(&app, &admin_email).await;

    let signup_email = unique_test_email();
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/waitlist", signup_body(&signup_email)))
        .await
        .unwrap();
    let id = parse_response_body(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Listing
    let response = app
        .clone()
        .oneshot(request_with_cookie(
            "GET",
            "/api/admin/waitlist?page=1&per_page=10",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["data"][0]["email"], signup_email);
    assert_eq!(body["data"][0]["interests"], json!(["reporting", "exports"]));
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["perPage"], 10);
    assert_eq!(body["pagination"]["totalPages"], 1);
    assert_eq!(body["stats"]["total"], 1);
    assert_eq!(body["stats"]["lastWeek"], 1);
    assert_eq!(body["stats"]["byStatus"]["pending"], 1);

    let response = app
        .clone()
        .oneshot(request_with_cookie(
            "GET",
            "/api/admin/waitlist?per_page=500",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Update
    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PATCH",
                "/api/admin/waitlist",
                json!({ "id": id, "contacted": true, "note": "Called", "tag": "VIP" }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["contacted"], true);
    assert!(body["notes"].as_str().unwrap().contains("Called"));
    assert_eq!(body["tags"], json!(["vip"]));

    let response = app
        .clone()
        .oneshot(request_with_cookie(
            "GET",
            "/api/admin/waitlist?status=contacted",
            Some(&cookie),
        ))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["stats"]["byStatus"]["contacted"], 1);

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request("PATCH", "/api/admin/waitlist", json!({ "id": id })),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A whitespace-only note is rejected and leaves the log untouched.
    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PATCH",
                "/api/admin/waitlist",
                json!({ "id": id, "note": "   " }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["code"], "validation_error");

    let response = app
        .clone()
        .oneshot(request_with_cookie("GET", "/api/admin/waitlist", Some(&cookie)))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["data"][0]["notes"].as_str().unwrap().lines().count(), 1);

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PATCH",
                "/api/admin/waitlist",
                json!({ "id": uuid::Uuid::new_v4(), "contacted": true }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Delete
    let response = app
        .clone()
        .oneshot(request_with_cookie(
            "DELETE",
            &format!("/api/admin/waitlist?id={}", id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request_with_cookie(
            "DELETE",
            &format!("/api/admin/waitlist?id={}", id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(request_with_cookie("GET", "/api/waitlist", None))
        .await
        .unwrap();
    assert_eq!(parse_response_body(response).await["count"], 0);
}

#[tokio::test]
async fn test_admin_export_csv() {
    let (app, stores) = create_test_app(test_config());
    let admin_email = unique_test_email();
    seed_admin(&stores, &admin_email).await;
    let cookie = login_cookie(&app, &admin_email).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/waitlist",
            json!({ "email": unique_test_email(), "name": "=HYPERLINK(\"x\")" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(request_with_cookie(
            "GET",
            "/api/admin/waitlist/export",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"waitlist-"));

    let csv = response_text(response).await;
    let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("id,email,name,source"));
    assert!(lines[1].contains("'=HYPERLINK"));
    assert!(lines[1].contains(",website,"));
}

#[tokio::test]
async fn test_health_reports_in_memory_backend() {
    let (app, _stores) = create_test_app(test_config());

    let response = app
        .clone()
        .oneshot(request_with_cookie("GET", "/api/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().get("x-request-id").is_some());
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["backend"], "in_memory");

    let response = app
        .oneshot(request_with_cookie("GET", "/api/health/ready", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
