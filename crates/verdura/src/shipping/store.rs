//! Read-only configuration snapshot the engine takes once per request.

use crate::config::RatingMode;

use super::domain::{Address, ForcedServicePolicy, MarkupPolicy, PackageTemplate};
use super::zones::{ZoneRecord, ZoneRule};

/// Storage abstraction so the orchestrator can be exercised in isolation.
/// Implementations must return a consistent snapshot; the engine never
/// writes back.
pub trait ShippingConfigStore: Send + Sync {
    fn snapshot(&self) -> Result<ShippingSettings, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("configuration store unavailable: {0}")]
    Unavailable(String),
}

/// Everything the rate engine reads: integration switches, credentials,
/// origin, carriers, box templates, zone policy, and pricing policy.
#[derive(Debug, Clone)]
pub struct ShippingSettings {
    pub integration_enabled: bool,
    pub mode: RatingMode,
    pub production_api_key: Option<String>,
    pub sandbox_api_key: Option<String>,
    pub origin: Option<Address>,
    /// Production carrier account IDs enabled by the administrator. Ignored
    /// in sandbox mode, where carriers are rediscovered per request.
    pub enabled_carrier_ids: Vec<String>,
    pub package_templates: Vec<PackageTemplate>,
    pub zone_records: Vec<ZoneRecord>,
    pub zone_rules: Vec<ZoneRule>,
    pub markup: MarkupPolicy,
    /// When present and non-empty, only these service codes are offered.
    pub allowed_service_codes: Option<Vec<String>>,
    pub forced_service: Option<ForcedServicePolicy>,
    /// Fallback weight for order items that do not declare one.
    pub default_item_weight_lb: f64,
}

/// The active credential for the configured mode, resolved once per request
/// and passed down by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingCredentials {
    pub mode: RatingMode,
    pub api_key: String,
}

impl ShippingSettings {
    /// Pick the credential matching the configured mode. `None` when the
    /// matching key is unset.
    pub fn credentials(&self) -> Option<RatingCredentials> {
        let key = match self.mode {
            RatingMode::Production => self.production_api_key.as_ref(),
            RatingMode::Sandbox => self.sandbox_api_key.as_ref(),
        }?;

        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        Some(RatingCredentials {
            mode: self.mode,
            api_key: key.to_string(),
        })
    }
}
