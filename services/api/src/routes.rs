use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use verdura::shipping::{shipping_router, RatingProvider, ShippingConfigStore, ShippingRateService};

pub(crate) fn with_shipping_routes<P, S>(service: Arc<ShippingRateService<P, S>>) -> axum::Router
where
    P: RatingProvider + 'static,
    S: ShippingConfigStore + 'static,
{
    shipping_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{fixture_settings, CannedRatingProvider, FixtureConfigStore};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use verdura::config::{RatingConfig, RatingMode};

    fn demo_rating_config() -> RatingConfig {
        RatingConfig {
            enabled: true,
            mode: RatingMode::Sandbox,
            api_key: None,
            sandbox_api_key: Some("demo-sandbox-key".to_string()),
            base_url: "https://api.shipengine.com".to_string(),
            timeout_secs: 20,
        }
    }

    fn demo_router() -> axum::Router {
        let store = Arc::new(FixtureConfigStore::new(fixture_settings(
            &demo_rating_config(),
        )));
        let provider = Arc::new(CannedRatingProvider);
        with_shipping_routes(Arc::new(ShippingRateService::new(provider, store)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let response = demo_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn rates_endpoint_quotes_an_iowa_order() {
        let payload = json!({
            "destination": {
                "name": "Casey Gardener",
                "line1": "12 Prairie Ave",
                "city": "Cedar Rapids",
                "region": "IA",
                "postal_code": "52401"
            },
            "order_items": [{ "quantity": 5, "weight_per_item": 0.5 }]
        });

        let response = demo_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/shipping/rates")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        let rates = body["rates"].as_array().expect("rates array");
        assert!(!rates.is_empty());
        assert_eq!(body["package_breakdown"]["total_packages"], 1);
        assert!(body.get("zone_info").is_none());
    }

    #[tokio::test]
    async fn rates_endpoint_reports_blocked_zone_as_business_failure() {
        let payload = json!({
            "destination": {
                "name": "Isla Verde",
                "line1": "8 Calle Loiza",
                "city": "San Juan",
                "region": "PR",
                "postal_code": "00911"
            },
            "order_items": [{ "quantity": 2 }]
        });

        let response = demo_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/shipping/rates")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "ZONE_BLOCKED");
    }

    #[tokio::test]
    async fn rates_endpoint_rejects_empty_orders_with_422() {
        let payload = json!({
            "destination": {
                "name": "Casey Gardener",
                "line1": "12 Prairie Ave",
                "city": "Cedar Rapids",
                "region": "IA",
                "postal_code": "52401"
            },
            "order_items": []
        });

        let response = demo_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/shipping/rates")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn zone_preview_endpoint_describes_a_blocked_region() {
        let response = demo_router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/shipping/zones/pr")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["region"], "PR");
        assert_eq!(body["verdict"]["allowed"], false);
    }
}
