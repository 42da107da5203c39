use serde::{Deserialize, Serialize};

/// Postal address for either end of a shipment. Supplied per request for the
/// destination, read from configuration for the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    /// State or territory code, e.g. "IA" or "PR".
    pub region: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_string()
}

impl Address {
    /// Region code as used for zone lookups.
    pub fn normalized_region(&self) -> String {
        self.region.trim().to_ascii_uppercase()
    }

    /// A destination must carry a street line, a region code, and a postal
    /// code before it can be rated.
    pub fn is_rateable(&self) -> bool {
        !self.line1.trim().is_empty()
            && !self.region.trim().is_empty()
            && !self.postal_code.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Pound,
    Ounce,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub value: f64,
    pub unit: WeightUnit,
}

impl Weight {
    pub fn pounds(value: f64) -> Self {
        Self {
            value,
            unit: WeightUnit::Pound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionUnit {
    Inch,
}

/// Interior box dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub unit: DimensionUnit,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn inches(length: f64, width: f64, height: f64) -> Self {
        Self {
            unit: DimensionUnit::Inch,
            length,
            width,
            height,
        }
    }
}

/// Administrator-configured box the planner may pack items into. Quantity
/// ranges are allowed to overlap; the planner tie-breaks deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageTemplate {
    pub name: String,
    pub dimensions: Dimensions,
    pub empty_weight_lb: f64,
    pub min_quantity: u32,
    pub max_quantity: u32,
    #[serde(default)]
    pub is_default: bool,
}

impl PackageTemplate {
    pub fn covers(&self, quantity: u32) -> bool {
        quantity >= self.min_quantity && quantity <= self.max_quantity
    }
}

/// One physical package produced by the planner. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPackage {
    pub weight: Weight,
    pub dimensions: Dimensions,
    pub item_count: u32,
}

/// Normalized priced offer from a carrier for one service level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierRate {
    pub rate_id: String,
    pub carrier_id: String,
    pub carrier_code: String,
    pub carrier_name: String,
    pub service_code: String,
    pub service_type: String,
    pub amount: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_delivery_days: Option<String>,
    pub guaranteed_service: bool,
}

/// Non-fatal diagnostic reported by the rating provider for one carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierApiError {
    pub carrier: String,
    pub message: String,
}

/// Administrator-configured margin applied to every carrier rate before any
/// zone surcharge. Fixed and percentage markup are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkupPolicy {
    #[default]
    None,
    Percentage { percent: f64 },
    Fixed { amount: f64 },
}

/// Narrows offered rates to one specific carrier service, optionally varying
/// by destination region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedServicePolicy {
    pub default_service: String,
    #[serde(default)]
    pub overrides: Vec<ForcedServiceOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedServiceOverride {
    pub service_code: String,
    pub regions: Vec<String>,
}

impl ForcedServicePolicy {
    /// Region-specific overrides win over the default service code.
    pub fn service_for_region(&self, region: &str) -> &str {
        self.overrides
            .iter()
            .find(|entry| {
                entry
                    .regions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(region))
            })
            .map(|entry| entry.service_code.as_str())
            .unwrap_or(self.default_service.as_str())
    }
}

/// Round monetary amounts and package weights to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rateable_requires_line1_region_and_postal_code() {
        let mut address = Address {
            name: "Maria Ortiz".to_string(),
            company: None,
            phone: None,
            line1: "12 Fern Way".to_string(),
            line2: None,
            city: "Des Moines".to_string(),
            region: "ia".to_string(),
            postal_code: "50309".to_string(),
            country: "US".to_string(),
        };
        assert!(address.is_rateable());
        assert_eq!(address.normalized_region(), "IA");

        address.postal_code = "  ".to_string();
        assert!(!address.is_rateable());
    }

    #[test]
    fn forced_service_override_beats_default() {
        let policy = ForcedServicePolicy {
            default_service: "usps_ground_advantage".to_string(),
            overrides: vec![ForcedServiceOverride {
                service_code: "usps_priority_mail".to_string(),
                regions: vec!["AK".to_string(), "HI".to_string()],
            }],
        };

        assert_eq!(policy.service_for_region("hi"), "usps_priority_mail");
        assert_eq!(policy.service_for_region("IA"), "usps_ground_advantage");
    }

    #[test]
    fn rounding_is_to_cents() {
        assert_eq!(round2(11.004_999), 11.0);
        assert_eq!(round2(3.456), 3.46);
        assert_eq!(round2(3.5), 3.5);
    }
}
