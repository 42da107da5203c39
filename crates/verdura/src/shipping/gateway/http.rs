//! `reqwest`-backed rating provider adapter.
//!
//! One bounded retry on transport-level failures (timeout, connect). A
//! definitive HTTP response, 4xx included, is never retried.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::shipping::store::RatingCredentials;

use super::wire::{CarrierListResponse, RateRequestBody, RateResponseBody};
use super::{CarrierAccount, ProviderError, RatedShipment, RatingProvider, ShipmentRequest};

const API_KEY_HEADER: &str = "api-key";

pub struct HttpRatingProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRatingProvider {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|source| ProviderError::Initialization { source })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Send a request built by `make`, retrying once on transient transport
    /// failure, and fail on any non-2xx status with the body preserved for
    /// diagnostics.
    async fn send<F>(&self, make: F, endpoint: &str) -> Result<reqwest::Response, ProviderError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        let response = loop {
            match make().send().await {
                Ok(response) => break response,
                Err(source) if attempt == 0 && (source.is_timeout() || source.is_connect()) => {
                    warn!(endpoint, error = %source, "rating provider call failed, retrying once");
                    attempt += 1;
                }
                Err(source) => {
                    return Err(ProviderError::Transport {
                        endpoint: endpoint.to_string(),
                        source,
                    });
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl RatingProvider for HttpRatingProvider {
    async fn list_carriers(
        &self,
        credentials: &RatingCredentials,
    ) -> Result<Vec<CarrierAccount>, ProviderError> {
        let endpoint = "/v1/carriers";
        let url = format!("{}{endpoint}", self.base_url);

        let response = self
            .send(
                || {
                    self.client
                        .get(&url)
                        .header(API_KEY_HEADER, &credentials.api_key)
                },
                endpoint,
            )
            .await?;

        let payload: CarrierListResponse =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Deserialization {
                    endpoint: endpoint.to_string(),
                    source,
                })?;

        debug!(carriers = payload.carriers.len(), "carrier discovery complete");
        Ok(payload.carriers)
    }

    async fn shipment_rates(
        &self,
        credentials: &RatingCredentials,
        request: ShipmentRequest,
    ) -> Result<RatedShipment, ProviderError> {
        let endpoint = "/v1/rates";
        let url = format!("{}{endpoint}", self.base_url);
        let body = RateRequestBody::from(&request);

        let response = self
            .send(
                || {
                    self.client
                        .post(&url)
                        .header(API_KEY_HEADER, &credentials.api_key)
                        .json(&body)
                },
                endpoint,
            )
            .await?;

        let payload: RateResponseBody =
            response
                .json()
                .await
                .map_err(|source| ProviderError::Deserialization {
                    endpoint: endpoint.to_string(),
                    source,
                })?;

        Ok(RatedShipment {
            rates: payload.rate_response.rates,
            errors: payload
                .rate_response
                .errors
                .into_iter()
                .map(Into::into)
                .collect(),
        })
    }
}
