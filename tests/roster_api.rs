//! End-to-end tests of the match routes over the in-memory roster store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use padel_roster::{
    auth::{AuthConfig, Claims},
    config::AppConfig,
    dao::roster_store::{RosterStore, memory::MemoryRosterStore},
    routes,
    state::AppState,
};
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt; // For `oneshot` method
use uuid::Uuid;

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    store: MemoryRosterStore,
}

async fn test_app() -> TestApp {
    let state = AppState::new(AppConfig::default(), AuthConfig::new(SECRET));
    let store = MemoryRosterStore::new();
    state.install_roster_store(Arc::new(store.clone())).await;
    TestApp {
        router: routes::router(state),
        store,
    }
}

fn token_for(user: Uuid) -> String {
    let claims = Claims {
        sub: user.to_string(),
        exp: OffsetDateTime::now_utc().unix_timestamp() + 3_600,
        aud: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

impl TestApp {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        caller: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = caller {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create_match(&self, creator: Uuid, days_from_today: i64) -> Uuid {
        let date = OffsetDateTime::now_utc().date() + Duration::days(days_from_today);
        let (status, body) = self
            .call(
                Method::POST,
                "/matches",
                Some(creator),
                Some(json!({
                    "match_date": date.to_string(),
                    "start_time": "18:00",
                    "end_time": "19:30",
                    "level": "medio",
                    "price_per_player": 5.0
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().parse().unwrap()
    }
}

#[tokio::test]
async fn healthcheck_is_public() {
    let app = test_app().await;
    let (status, body) = app.call(Method::GET, "/healthcheck", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn match_routes_require_a_valid_token() {
    let app = test_app().await;
    let (status, _) = app.call(Method::GET, "/matches", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/matches")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_match_payload_is_a_bad_request() {
    let app = test_app().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/matches",
            Some(Uuid::new_v4()),
            Some(json!({
                "match_date": "2030-01-10",
                "start_time": "20:00",
                "end_time": "19:00",
                "level": "bajo"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("validation failed"));
}

#[tokio::test]
async fn malformed_requests_use_the_error_body() {
    let app = test_app().await;
    let caller = Uuid::new_v4();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/matches")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(caller)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"match_date\": "))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].as_str().unwrap().contains("malformed JSON body"));

    let (status, body) = app
        .call(Method::GET, "/matches/not-a-uuid", Some(caller), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("malformed path"));

    let (status, body) = app
        .call(Method::GET, "/matches?level=legendario", Some(caller), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("malformed query"));
}

#[tokio::test]
async fn roster_lifecycle_over_http() {
    let app = test_app().await;
    let creator = Uuid::new_v4();
    let match_id = app.create_match(creator, 14).await;

    for _ in 0..3 {
        let (status, body) = app
            .call(Method::POST, &format!("/matches/{match_id}/join"), Some(Uuid::new_v4()), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "confirmed");
    }

    let late = Uuid::new_v4();
    let (status, body) = app
        .call(Method::POST, &format!("/matches/{match_id}/join"), Some(late), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "waitlist");

    let (status, _) = app
        .call(Method::POST, &format!("/matches/{match_id}/join"), Some(late), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let guest = Uuid::new_v4();
    let (status, body) = app
        .call(
            Method::POST,
            &format!("/matches/{match_id}/invitations"),
            Some(creator),
            Some(json!({ "player_ids": [guest, late] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invited"], json!([guest]));
    assert_eq!(body["skipped"], json!([late]));

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/matches/{match_id}/invitation"),
            Some(guest),
            Some(json!({ "decision": "accept" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "waitlist");

    let (status, body) = app
        .call(Method::GET, &format!("/matches/{match_id}"), Some(guest), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmed_count"], 4);
    assert_eq!(body["is_full"], true);
    assert_eq!(body["roster"]["confirmed"].as_array().unwrap().len(), 4);
    assert_eq!(body["roster"]["waitlist"].as_array().unwrap().len(), 2);
    assert!(body.get("result").is_none());

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/matches/{match_id}/players/{late}/promote"),
            Some(creator),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn creator_only_routes_are_forbidden_to_others() {
    let app = test_app().await;
    let creator = Uuid::new_v4();
    let player = Uuid::new_v4();
    let match_id = app.create_match(creator, -1).await;
    app.call(Method::POST, &format!("/matches/{match_id}/join"), Some(player), None)
        .await;

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/matches/{match_id}/players/{creator}"),
            Some(player),
            Some(json!({ "team": "team_a", "position": "drive" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/matches/{match_id}/players/{creator}"),
            Some(player),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/matches/{match_id}/result"),
            Some(player),
            Some(json!({ "team_a_score": 6, "team_b_score": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::DELETE, &format!("/matches/{match_id}"), Some(player), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn results_and_deletion() {
    let app = test_app().await;
    let creator = Uuid::new_v4();
    let upcoming = app.create_match(creator, 7).await;
    let played = app.create_match(creator, -3).await;
    let score = json!({ "team_a_score": 6, "team_b_score": 2 });

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/matches/{upcoming}/result"),
            Some(creator),
            Some(score.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/matches/{played}/result"),
            Some(creator),
            Some(score.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["team_a_score"], 6);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/matches/{played}/result"),
            Some(creator),
            Some(score),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(Method::GET, &format!("/matches/{played}/result"), Some(creator), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team_b_score"], 2);

    let (status, _) = app
        .call(Method::DELETE, &format!("/matches/{played}"), Some(creator), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(app.store.list_match_players(played).await.unwrap().is_empty());
    assert!(app.store.find_result(played).await.unwrap().is_none());

    let (status, _) = app
        .call(Method::GET, &format!("/matches/{played}"), Some(creator), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn leave_without_a_row_succeeds() {
    let app = test_app().await;
    let match_id = app.create_match(Uuid::new_v4(), 3).await;
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/matches/{match_id}/leave"),
            Some(Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn listing_filters_by_level_and_membership() {
    let app = test_app().await;
    let me = Uuid::new_v4();
    let mine = app.create_match(me, 5).await;
    let other = app.create_match(Uuid::new_v4(), 6).await;

    let (status, body) = app
        .call(Method::GET, "/matches?level=medio", Some(me), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = app
        .call(Method::GET, "/matches?level=alto", Some(me), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = app.call(Method::GET, "/me/matches", Some(me), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&mine.to_string().as_str()));
    assert!(!ids.contains(&other.to_string().as_str()));
}

#[tokio::test]
async fn degraded_service_answers_unavailable() {
    let state = AppState::new(AppConfig::default(), AuthConfig::new(SECRET));
    let router = routes::router(state);
    let request = Request::builder()
        .uri("/matches")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_for(Uuid::new_v4())),
        )
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
