use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use skydesk_api::middleware::auth::AdminClaims;
use skydesk_api::{app, AppState, AuthConfig};
use skydesk_core::{BusinessRules, Services};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn auth_config() -> AuthConfig {
    AuthConfig {
        enabled: true,
        secret: SECRET.to_string(),
        expiration: 600,
        admin_username: "admin".to_string(),
        admin_password: "s3cret".to_string(),
    }
}

fn test_app() -> Router {
    app(AppState {
        services: Services::new(skydesk_store::memory_repositories(), BusinessRules::default()),
        auth: auth_config(),
    })
}

fn token_with_role(role: &str) -> String {
    let claims = AdminClaims {
        sub: "tester".to_string(),
        role: role.to_string(),
        exp: (Utc::now() + Duration::minutes(5)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_admin_token() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/api/airlines", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::GET, "/api/airlines", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let agent = token_with_role("AGENT");
    let (status, _) = send(&app, Method::GET, "/api/airlines", Some(&agent), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = token_with_role("ADMIN");
    let (status, body) = send(&app, Method::GET, "/api/airlines", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 0);
}

#[tokio::test]
async fn test_token_endpoint() {
    let app = test_app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/token",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/token",
        None,
        Some(json!({ "username": "admin", "password": "s3cret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "Bearer");
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::GET, "/api/airports", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_disabled_auth_opens_the_api() {
    let app = app(AppState {
        services: Services::new(skydesk_store::memory_repositories(), BusinessRules::default()),
        auth: AuthConfig {
            enabled: false,
            ..auth_config()
        },
    });
    let (status, _) = send(&app, Method::GET, "/api/seat-classes", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_airline_and_conflict() {
    let app = test_app();
    let admin = token_with_role("ADMIN");
    let payload = json!({ "code": "vn", "name": "Vietnam Airlines", "country": "Vietnam" });

    let (status, body) = send(&app, Method::POST, "/api/airlines", Some(&admin), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], 201);
    assert_eq!(body["data"]["code"], "VN");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::POST, "/api/airlines", Some(&admin), Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, Method::GET, &format!("/api/airlines/{}", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Vietnam Airlines");
}

#[tokio::test]
async fn test_bad_input_is_a_bad_request() {
    let app = test_app();
    let admin = token_with_role("ADMIN");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/airlines",
        Some(&admin),
        Some(json!({ "code": "VN" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::GET, "/api/airlines/not-a-uuid", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/airlines",
        Some(&admin),
        Some(json!({ "code": "TOOLONG", "name": "X", "country": "Y" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let app = test_app();
    let admin = token_with_role("ADMIN");
    let missing = uuid::Uuid::new_v4();

    for uri in [
        format!("/api/airlines/{}", missing),
        format!("/api/flights/{}", missing),
        format!("/api/bookings/{}", missing),
        "/api/bookings/number/BK0000000000".to_string(),
    ] {
        let (status, body) = send(&app, Method::GET, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_flight_search_over_http() {
    let app = test_app();
    let admin = token_with_role("ADMIN");

    let (_, airline) = send(
        &app,
        Method::POST,
        "/api/airlines",
        Some(&admin),
        Some(json!({ "code": "QH", "name": "Bamboo", "country": "Vietnam" })),
    )
    .await;
    let airline_id = airline["data"]["id"].as_str().unwrap().to_string();

    let mut airports = Vec::new();
    for code in ["DAD", "PQC"] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/airports",
            Some(&admin),
            Some(json!({ "iata_code": code, "name": code, "city": code, "country": "Vietnam" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        airports.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let (_, class) = send(
        &app,
        Method::POST,
        "/api/seat-classes",
        Some(&admin),
        Some(json!({ "code": "BUSINESS", "name": "Business", "rank": 1 })),
    )
    .await;
    let class_id = class["data"]["id"].as_str().unwrap().to_string();

    let (status, airplane) = send(
        &app,
        Method::POST,
        "/api/airplanes",
        Some(&admin),
        Some(json!({ "airline_id": airline_id, "model": "E190", "manufacturer": "Embraer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(airplane["data"]["registration_code"], "QH-0001");
    let airplane_id = airplane["data"]["id"].as_str().unwrap().to_string();

    let (status, seats) = send(
        &app,
        Method::POST,
        &format!("/api/airplanes/{}/seats/layout", airplane_id),
        Some(&admin),
        Some(json!({ "seat_class_id": class_id, "first_row": 1, "last_row": 2, "layout": "AC" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(seats["data"].as_array().unwrap().len(), 4);

    let day = (Utc::now() + Duration::days(5)).date_naive();
    let departure = day.and_hms_opt(9, 0, 0).unwrap().and_utc();
    let (status, flight) = send(
        &app,
        Method::POST,
        "/api/flights",
        Some(&admin),
        Some(json!({
            "airline_id": airline_id,
            "airplane_id": airplane_id,
            "origin_airport_id": airports[0],
            "destination_airport_id": airports[1],
            "departure_time": departure,
            "arrival_time": departure + Duration::minutes(90),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(flight["data"]["flight_number"], "QH0001");
    let flight_id = flight["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/class-flights",
        Some(&admin),
        Some(json!({ "flight_id": flight_id, "seat_class_id": class_id, "price_cents": 450000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, offers) = send(
        &app,
        Method::GET,
        &format!("/api/flights/search?origin=DAD&destination=PQC&date={}&passengers=2", day),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let offers = offers["data"].as_array().unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0]["classes"][0]["seat_class_code"], "BUSINESS");
    assert_eq!(offers[0]["classes"][0]["available_seats"], 4);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/flights/{}/status", flight_id),
        Some(&admin),
        Some(json!({ "status": "ARRIVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
