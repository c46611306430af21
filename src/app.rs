use axum::{http::HeaderValue, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::TokenVerifier;
use crate::config::Settings;
use crate::middleware::request_id_layer;
use crate::routes;
use crate::services::{EmailQueue, Services};
use crate::store::{Store, StoreHealth};

/// Shared application state
pub struct AppState {
    pub settings: Settings,
    pub services: Services,
    pub health: Arc<dyn StoreHealth>,
    pub verifier: TokenVerifier,
}

impl AppState {
    pub fn new<S: Store + 'static>(store: Arc<S>, settings: Settings, emails: EmailQueue) -> Arc<Self> {
        let verifier = TokenVerifier::new(&settings.jwt_secret, settings.jwt_issuer.as_deref());
        let services = Services::new(store.clone(), emails, settings.store_timeout);

        Arc::new(Self {
            settings,
            services,
            health: store,
            verifier,
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    // Spans at DEBUG keep INFO output to the services' own events
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let (set_request_id, propagate_request_id) = request_id_layer();

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let max_age = if settings.env.is_dev() {
        std::time::Duration::from_secs(86400)
    } else {
        std::time::Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]))
        .allow_credentials(true)
        .max_age(max_age)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::{verifier::sign, Claims};
    use crate::config::{Environment, StoreBackend};
    use crate::store::MemoryStore;

    const SECRET: &str = "test-secret";

    fn app() -> Router {
        let settings = Settings {
            env: Environment::Dev,
            server_addr: "127.0.0.1:0".into(),
            store: StoreBackend::Memory,
            store_timeout: std::time::Duration::from_secs(1),
            cors_allow_origins: vec!["http://localhost:3000".into()],
            jwt_secret: SECRET.into(),
            jwt_issuer: None,
            email: None,
            notification_queue_capacity: 16,
        };
        let (emails, _jobs) = EmailQueue::channel(16);
        create_app(AppState::new(Arc::new(MemoryStore::new()), settings, emails))
    }

    fn token(user_id: Uuid, role: &str) -> String {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: Utc::now().timestamp() + 600,
            iat: None,
            iss: None,
            role: role.into(),
            email: None,
            carwash_id: None,
        };
        format!("Bearer {}", sign(&claims, SECRET))
    }

    fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app().oneshot(request("GET", "/health", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let app = app();
        let response = app.clone().oneshot(request("GET", "/carwashes", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(request("GET", "/carwashes", Some("Bearer garbage"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn carwash_lifecycle_over_http() {
        let app = app();
        let owner = token(Uuid::new_v4(), "business");
        let driver = token(Uuid::new_v4(), "car_owner");

        let create = json!({
            "name": "Bubble Bay",
            "address": "12 Harbour Road",
            "latitude": 6.5244,
            "longitude": 3.3792,
        });

        let response = app
            .clone()
            .oneshot(request("POST", "/carwashes", Some(&driver), Some(create.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(request("POST", "/carwashes", Some(&owner), Some(create)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let carwash_id = json_body(response).await["data"]["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/carwashes/nearby?lat=6.5244&lng=3.3792",
                Some(&driver),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["search_type"], "nearby");
        assert_eq!(body["data"]["count"], 1);

        let response = app
            .clone()
            .oneshot(request(
                "PATCH",
                &format!("/carwashes/{}", carwash_id),
                Some(&driver),
                Some(json!({ "name": "Hijacked" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(
                "GET",
                &format!("/carwashes/{}/services/{}", carwash_id, Uuid::new_v4()),
                Some(&driver),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "service not found");
    }

    #[tokio::test]
    async fn cars_are_private_to_their_owner() {
        let app = app();
        let driver = token(Uuid::new_v4(), "car_owner");
        let stranger = token(Uuid::new_v4(), "car_owner");

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/cars",
                Some(&driver),
                Some(json!({ "model": "Toyota Corolla", "plate": "LAG-123", "is_default": true })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let car_id = json_body(response).await["data"]["id"].as_str().unwrap().to_string();

        let response = app.clone().oneshot(request("GET", "/cars/my", Some(&driver), None)).await.unwrap();
        assert_eq!(json_body(response).await["data"].as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/cars/{}", car_id), Some(&stranger), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/cars/{}", car_id),
                Some(&stranger),
                Some(json!({ "plate": "STOLEN" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "car not found");

        let response = app
            .clone()
            .oneshot(request("DELETE", &format!("/cars/{}", car_id), Some(&driver), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request("GET", &format!("/cars/{}", car_id), Some(&driver), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests() {
        let response = app()
            .oneshot(request(
                "GET",
                "/carwashes/nearby?lat=123&lng=0",
                Some(&token(Uuid::new_v4(), "car_owner")),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "BAD_REQUEST");
    }
}
