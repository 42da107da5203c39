use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::gateway::RatingProvider;
use super::service::{RateFailure, RateFailureCode, RateRequest, ShippingRateService};
use super::store::ShippingConfigStore;

/// Router builder exposing the quote and zone-preview endpoints.
pub fn shipping_router<P, S>(service: Arc<ShippingRateService<P, S>>) -> Router
where
    P: RatingProvider + 'static,
    S: ShippingConfigStore + 'static,
{
    Router::new()
        .route("/api/v1/shipping/rates", post(rates_handler::<P, S>))
        .route(
            "/api/v1/shipping/zones/:region",
            get(zone_preview_handler::<P, S>),
        )
        .with_state(service)
}

pub(crate) async fn rates_handler<P, S>(
    State(service): State<Arc<ShippingRateService<P, S>>>,
    axum::Json(request): axum::Json<RateRequest>,
) -> Response
where
    P: RatingProvider + 'static,
    S: ShippingConfigStore + 'static,
{
    match service.quote(request).await {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(failure) => failure_response(failure),
    }
}

pub(crate) async fn zone_preview_handler<P, S>(
    State(service): State<Arc<ShippingRateService<P, S>>>,
    Path(region): Path<String>,
) -> Response
where
    P: RatingProvider + 'static,
    S: ShippingConfigStore + 'static,
{
    match service.zone_preview(&region) {
        Ok(verdict) => {
            let payload = json!({
                "region": region.trim().to_ascii_uppercase(),
                "verdict": verdict,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(failure) => failure_response(failure),
    }
}

/// A business "no" stays a 200 with `success: false`; only malformed requests
/// and orchestration faults map to error statuses.
fn failure_response(failure: RateFailure) -> Response {
    let status = match failure.code {
        RateFailureCode::InvalidRequest => StatusCode::UNPROCESSABLE_ENTITY,
        RateFailureCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };

    let payload = json!({
        "success": false,
        "error": failure,
    });
    (status, axum::Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingMode;
    use crate::shipping::domain::MarkupPolicy;
    use crate::shipping::gateway::{
        CarrierAccount, ProviderError, RatedShipment, ShipmentRequest,
    };
    use crate::shipping::store::{RatingCredentials, ShippingSettings, StoreError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    struct IdleProvider;

    #[async_trait]
    impl RatingProvider for IdleProvider {
        async fn list_carriers(
            &self,
            _credentials: &RatingCredentials,
        ) -> Result<Vec<CarrierAccount>, ProviderError> {
            Ok(Vec::new())
        }

        async fn shipment_rates(
            &self,
            _credentials: &RatingCredentials,
            _request: ShipmentRequest,
        ) -> Result<RatedShipment, ProviderError> {
            Ok(RatedShipment::default())
        }
    }

    struct DisabledStore;

    impl ShippingConfigStore for DisabledStore {
        fn snapshot(&self) -> Result<ShippingSettings, StoreError> {
            Ok(ShippingSettings {
                integration_enabled: false,
                mode: RatingMode::Production,
                production_api_key: None,
                sandbox_api_key: None,
                origin: None,
                enabled_carrier_ids: Vec::new(),
                package_templates: Vec::new(),
                zone_records: Vec::new(),
                zone_rules: Vec::new(),
                markup: MarkupPolicy::None,
                allowed_service_codes: None,
                forced_service: None,
                default_item_weight_lb: 0.5,
            })
        }
    }

    fn disabled_router() -> Router {
        let service = Arc::new(ShippingRateService::new(
            Arc::new(IdleProvider),
            Arc::new(DisabledStore),
        ));
        shipping_router(service)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn business_failures_keep_a_200_status() {
        let payload = json!({
            "destination": {
                "name": "Casey Gardener",
                "line1": "12 Prairie Ave",
                "city": "Cedar Rapids",
                "region": "IA",
                "postal_code": "52401"
            },
            "order_items": [{ "quantity": 3 }]
        });

        let response = disabled_router()
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
        assert_eq!(body["error"]["code"], "INTEGRATION_DISABLED");
    }

    #[tokio::test]
    async fn zone_preview_uppercases_the_region() {
        let response = disabled_router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/shipping/zones/ia")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["region"], "IA");
        assert_eq!(body["verdict"]["allowed"], true);
    }
}
