//! Carrier rate gateway: resolves the carrier set, requests live rates from
//! the external rating provider, and normalizes the heterogeneous response.

pub mod http;
mod wire;

pub use http::HttpRatingProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RatingMode;

use super::domain::{Address, CarrierApiError, CarrierRate, PlannedPackage};
use super::store::RatingCredentials;

/// A carrier account known to the rating provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierAccount {
    pub carrier_id: String,
    pub carrier_code: String,
    pub friendly_name: String,
    #[serde(default)]
    pub disabled: bool,
}

/// Monetary amount as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyAmount {
    pub amount: f64,
    pub currency: String,
}

/// Provider-shaped rate record before normalization. Amounts and service
/// identity are optional because partial carrier responses are common.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRate {
    pub rate_id: String,
    pub carrier_id: String,
    pub carrier_code: String,
    #[serde(default)]
    pub carrier_friendly_name: Option<String>,
    #[serde(default)]
    pub service_code: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub shipping_amount: Option<MoneyAmount>,
    #[serde(default)]
    pub delivery_days: Option<u32>,
    #[serde(default)]
    pub estimated_delivery_date: Option<String>,
    #[serde(default)]
    pub carrier_delivery_days: Option<String>,
    #[serde(default)]
    pub guaranteed_service: bool,
}

/// Raw rating result for one shipment: usable rates plus per-carrier errors
/// the provider reported alongside them.
#[derive(Debug, Clone, Default)]
pub struct RatedShipment {
    pub rates: Vec<ProviderRate>,
    pub errors: Vec<CarrierApiError>,
}

/// One shipment covering the full package list and resolved carrier set.
#[derive(Debug, Clone)]
pub struct ShipmentRequest {
    pub carrier_ids: Vec<String>,
    pub ship_from: Address,
    pub ship_to: Address,
    pub packages: Vec<PlannedPackage>,
}

/// Seam to the external rating provider. The production implementation is
/// [`HttpRatingProvider`]; tests substitute spies and canned responses.
#[async_trait]
pub trait RatingProvider: Send + Sync {
    async fn list_carriers(
        &self,
        credentials: &RatingCredentials,
    ) -> Result<Vec<CarrierAccount>, ProviderError>;

    async fn shipment_rates(
        &self,
        credentials: &RatingCredentials,
        request: ShipmentRequest,
    ) -> Result<RatedShipment, ProviderError>;
}

/// Failure talking to the rating provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to initialize rating client: {source}")]
    Initialization {
        #[source]
        source: reqwest::Error,
    },
    #[error("transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("rating provider {endpoint} returned {status}")]
    Api {
        endpoint: String,
        status: u16,
        /// Raw provider error body, for diagnostics only.
        body: String,
    },
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ProviderError {
    /// Raw provider payload suitable for a diagnostics field, never for
    /// end-user display.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ProviderError::Api { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no enabled carriers available for rating")]
    NoCarriers,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Normalized gateway output handed to the post-processor.
#[derive(Debug, Clone, Default)]
pub struct RateFetch {
    pub rates: Vec<CarrierRate>,
    pub carrier_errors: Vec<CarrierApiError>,
}

/// Resolve the carrier set, request rates once for the whole shipment, and
/// normalize the response.
pub async fn fetch_rates<P>(
    provider: &P,
    credentials: &RatingCredentials,
    origin: &Address,
    destination: &Address,
    packages: &[PlannedPackage],
    configured_carrier_ids: &[String],
) -> Result<RateFetch, GatewayError>
where
    P: RatingProvider + ?Sized,
{
    let carrier_ids = resolve_carrier_ids(provider, credentials, configured_carrier_ids).await?;
    if carrier_ids.is_empty() {
        return Err(GatewayError::NoCarriers);
    }

    let rated = provider
        .shipment_rates(
            credentials,
            ShipmentRequest {
                carrier_ids,
                ship_from: origin.clone(),
                ship_to: destination.clone(),
                packages: packages.to_vec(),
            },
        )
        .await?;

    let rates: Vec<CarrierRate> = rated.rates.into_iter().filter_map(normalize_rate).collect();

    Ok(RateFetch {
        rates,
        carrier_errors: rated.errors,
    })
}

/// Stored production carrier IDs win when configured; sandbox mode always
/// rediscovers, since production identifiers are environment-specific.
async fn resolve_carrier_ids<P>(
    provider: &P,
    credentials: &RatingCredentials,
    configured: &[String],
) -> Result<Vec<String>, GatewayError>
where
    P: RatingProvider + ?Sized,
{
    if credentials.mode == RatingMode::Production && !configured.is_empty() {
        return Ok(configured.to_vec());
    }

    let carriers = provider.list_carriers(credentials).await?;
    Ok(carriers
        .into_iter()
        .filter(|carrier| !carrier.disabled)
        .map(|carrier| carrier.carrier_id)
        .collect())
}

/// Map one provider rate into the uniform record; rates without a shipping
/// amount are discarded.
fn normalize_rate(rate: ProviderRate) -> Option<CarrierRate> {
    let amount = rate.shipping_amount?;
    let service_code = rate.service_code.unwrap_or_default();
    let service_type = rate.service_type.unwrap_or_else(|| service_code.clone());
    let carrier_name = rate
        .carrier_friendly_name
        .unwrap_or_else(|| rate.carrier_code.clone());

    Some(CarrierRate {
        rate_id: rate.rate_id,
        carrier_id: rate.carrier_id,
        carrier_code: rate.carrier_code,
        carrier_name,
        service_code,
        service_type,
        amount: amount.amount,
        currency: amount.currency,
        delivery_days: rate.delivery_days,
        estimated_delivery_date: rate.estimated_delivery_date,
        carrier_delivery_days: rate.carrier_delivery_days,
        guaranteed_service: rate.guaranteed_service,
    })
}
