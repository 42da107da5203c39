//! Orchestration of a shipping quote: zone check, package planning, carrier
//! rating, and post-processing, in one pass with no retries across steps.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::{
    Address, CarrierApiError, CarrierRate, Dimensions, PlannedPackage, Weight,
};
use super::gateway::{self, GatewayError, RatingProvider};
use super::packing;
use super::pricing;
use super::store::{ShippingConfigStore, ShippingSettings, StoreError};
use super::zones::{ZonePolicyEngine, ZoneStatus, ZoneVerdict};

/// Inbound quote request. Explicit packages win over order items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRequest {
    pub destination: Address,
    #[serde(default)]
    pub packages: Vec<RequestedPackage>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

/// A caller-supplied physical package, bypassing the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedPackage {
    pub weight: Weight,
    pub dimensions: Dimensions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_per_item: Option<f64>,
}

/// Successful quote payload.
#[derive(Debug, Clone, Serialize)]
pub struct RateResponse {
    pub success: bool,
    pub rates: Vec<CarrierRate>,
    pub origin: Address,
    pub destination: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_info: Option<ZoneInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_breakdown: Option<PackageBreakdown>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub carrier_errors: Vec<CarrierApiError>,
}

/// Zone context echoed to the caller when the destination is anything other
/// than plainly allowed.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneInfo {
    pub status: ZoneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ZoneInfoConditions>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneInfoConditions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_services: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_transit_days: Option<u32>,
    pub surcharge_amount: f64,
    pub surcharge_percent: f64,
}

impl ZoneInfo {
    fn from_verdict(verdict: &ZoneVerdict) -> Self {
        let conditions = verdict.has_constraints().then(|| ZoneInfoConditions {
            required_services: verdict.required_services.clone(),
            max_transit_days: verdict.max_transit_days,
            surcharge_amount: verdict.surcharge_amount,
            surcharge_percent: verdict.surcharge_percent,
        });

        Self {
            status: verdict.status,
            message: verdict.message.clone(),
            conditions,
        }
    }
}

/// How the order was packed, present only when the planner ran.
#[derive(Debug, Clone, Serialize)]
pub struct PackageBreakdown {
    pub total_packages: usize,
    pub packages: Vec<PlannedPackage>,
    pub summary: String,
}

/// Machine-readable failure codes so the storefront can render distinct UI
/// states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateFailureCode {
    IntegrationDisabled,
    MissingApiKey,
    MissingConfig,
    InvalidRequest,
    ZoneBlocked,
    NoCarriers,
    RatingProviderError,
    InternalError,
}

impl RateFailureCode {
    pub const fn label(self) -> &'static str {
        match self {
            RateFailureCode::IntegrationDisabled => "INTEGRATION_DISABLED",
            RateFailureCode::MissingApiKey => "MISSING_API_KEY",
            RateFailureCode::MissingConfig => "MISSING_CONFIG",
            RateFailureCode::InvalidRequest => "INVALID_REQUEST",
            RateFailureCode::ZoneBlocked => "ZONE_BLOCKED",
            RateFailureCode::NoCarriers => "NO_CARRIERS",
            RateFailureCode::RatingProviderError => "RATING_PROVIDER_ERROR",
            RateFailureCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Structured negative result. A business "no" is a normal outcome here, not
/// a transport error.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct RateFailure {
    pub code: RateFailureCode,
    pub message: String,
    /// Diagnostics only; never rendered verbatim to end users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RateFailure {
    fn new(code: RateFailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<StoreError> for RateFailure {
    fn from(error: StoreError) -> Self {
        RateFailure::new(
            RateFailureCode::InternalError,
            "shipping configuration could not be loaded",
        )
        .with_details(error.to_string())
    }
}

/// Service composing the zone evaluator, package planner, rate gateway, and
/// pricing pipeline behind one entry point.
pub struct ShippingRateService<P, S> {
    provider: Arc<P>,
    store: Arc<S>,
}

impl<P, S> ShippingRateService<P, S>
where
    P: RatingProvider + 'static,
    S: ShippingConfigStore + 'static,
{
    pub fn new(provider: Arc<P>, store: Arc<S>) -> Self {
        Self { provider, store }
    }

    /// Produce a quote for one destination, or a structured failure.
    pub async fn quote(&self, request: RateRequest) -> Result<RateResponse, RateFailure> {
        let settings = self.store.snapshot()?;

        if !settings.integration_enabled {
            return Err(RateFailure::new(
                RateFailureCode::IntegrationDisabled,
                "Live shipping rates are currently disabled.",
            ));
        }

        if !request.destination.is_rateable() {
            return Err(RateFailure::new(
                RateFailureCode::InvalidRequest,
                "Destination address requires a street line, state/territory, and postal code.",
            ));
        }

        let Some(credentials) = settings.credentials() else {
            return Err(RateFailure::new(
                RateFailureCode::MissingApiKey,
                "No rating API credential is configured for the active mode.",
            ));
        };

        let Some(origin) = settings.origin.clone() else {
            return Err(RateFailure::new(
                RateFailureCode::MissingConfig,
                "Shipping origin address is not configured.",
            ));
        };

        let region = request.destination.normalized_region();
        let today = Utc::now().date_naive();
        let engine =
            ZonePolicyEngine::new(settings.zone_records.clone(), settings.zone_rules.clone());
        let verdict = engine.evaluate(&region, today);

        if !verdict.allowed {
            info!(%region, status = verdict.status.label(), "destination blocked by zone policy");
            return Err(RateFailure::new(
                RateFailureCode::ZoneBlocked,
                verdict
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("We are unable to ship to {region} at this time.")),
            ));
        }

        let (packages, breakdown) = resolve_packages(&request, &settings)?;
        debug!(%region, packages = packages.len(), "shipment packed");

        let fetch = gateway::fetch_rates(
            self.provider.as_ref(),
            &credentials,
            &origin,
            &request.destination,
            &packages,
            &settings.enabled_carrier_ids,
        )
        .await
        .map_err(|error| match error {
            GatewayError::NoCarriers => RateFailure::new(
                RateFailureCode::NoCarriers,
                "No enabled carriers are available to rate this shipment.",
            ),
            GatewayError::Provider(provider_error) => {
                let failure = RateFailure::new(
                    RateFailureCode::RatingProviderError,
                    "The shipping rate provider is currently unavailable.",
                );
                match provider_error.diagnostic() {
                    Some(body) => failure.with_details(body.to_string()),
                    None => failure.with_details(provider_error.to_string()),
                }
            }
        })?;

        let rates = pricing::apply_pricing(
            fetch.rates,
            &verdict,
            settings.markup,
            settings.allowed_service_codes.as_deref(),
            settings.forced_service.as_ref(),
            &region,
        );

        info!(%region, rates = rates.len(), "shipping quote priced");

        let zone_info = (verdict.status != ZoneStatus::Allowed)
            .then(|| ZoneInfo::from_verdict(&verdict));

        Ok(RateResponse {
            success: true,
            rates,
            origin,
            destination: request.destination,
            zone_info,
            package_breakdown: breakdown,
            carrier_errors: fetch.carrier_errors,
        })
    }

    /// Evaluate zone policy for a region as of today, without rating.
    pub fn zone_preview(&self, region_code: &str) -> Result<ZoneVerdict, RateFailure> {
        let settings = self.store.snapshot()?;
        let engine = ZonePolicyEngine::new(settings.zone_records, settings.zone_rules);
        Ok(engine.evaluate(region_code, Utc::now().date_naive()))
    }
}

/// Explicit packages bypass planning; otherwise the order items are packed
/// against the configured box templates.
fn resolve_packages(
    request: &RateRequest,
    settings: &ShippingSettings,
) -> Result<(Vec<PlannedPackage>, Option<PackageBreakdown>), RateFailure> {
    if !request.packages.is_empty() {
        let packages = request
            .packages
            .iter()
            .map(|package| PlannedPackage {
                weight: package.weight,
                dimensions: package.dimensions,
                item_count: 0,
            })
            .collect();
        return Ok((packages, None));
    }

    let total_quantity: u32 = request.order_items.iter().map(|item| item.quantity).sum();
    if total_quantity == 0 {
        return Err(RateFailure::new(
            RateFailureCode::InvalidRequest,
            "Request contained no packages or order items.",
        ));
    }

    if settings.package_templates.is_empty() {
        return Err(RateFailure::new(
            RateFailureCode::MissingConfig,
            "No package templates are configured.",
        ));
    }

    let weighted_total: f64 = request
        .order_items
        .iter()
        .map(|item| {
            f64::from(item.quantity)
                * item.weight_per_item.unwrap_or(settings.default_item_weight_lb)
        })
        .sum();
    let weight_per_item = weighted_total / f64::from(total_quantity);

    let plan = packing::plan(total_quantity, weight_per_item, &settings.package_templates);
    let breakdown = PackageBreakdown {
        total_packages: plan.packages.len(),
        packages: plan.packages.clone(),
        summary: plan.summary,
    };

    Ok((plan.packages, Some(breakdown)))
}
