use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use verdura::config::RatingConfig;
use verdura::shipping::gateway::{MoneyAmount, ProviderRate, ShipmentRequest};
use verdura::shipping::{
    Address, CarrierAccount, Dimensions, MarkupPolicy, PackageTemplate, ProviderError,
    RatedShipment, RatingCredentials, RatingProvider, ShippingConfigStore, ShippingSettings,
    StoreError, ZoneConditions, ZoneRecord, ZoneRule, ZoneRuleAction, ZoneStatus,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory configuration store seeded with the nursery fixtures. The admin
/// console's persistence lives outside this service.
#[derive(Clone)]
pub(crate) struct FixtureConfigStore {
    settings: ShippingSettings,
}

impl FixtureConfigStore {
    pub(crate) fn new(settings: ShippingSettings) -> Self {
        Self { settings }
    }
}

impl ShippingConfigStore for FixtureConfigStore {
    fn snapshot(&self) -> Result<ShippingSettings, StoreError> {
        Ok(self.settings.clone())
    }
}

/// Deterministic offline provider used by the `quote` and `demo` commands and
/// the route tests. Prices scale with total shipment weight.
#[derive(Default, Clone)]
pub(crate) struct CannedRatingProvider;

#[async_trait]
impl RatingProvider for CannedRatingProvider {
    async fn list_carriers(
        &self,
        _credentials: &RatingCredentials,
    ) -> Result<Vec<CarrierAccount>, ProviderError> {
        Ok(vec![
            CarrierAccount {
                carrier_id: "se-demo-usps".to_string(),
                carrier_code: "usps".to_string(),
                friendly_name: "USPS".to_string(),
                disabled: false,
            },
            CarrierAccount {
                carrier_id: "se-demo-ups".to_string(),
                carrier_code: "ups".to_string(),
                friendly_name: "UPS".to_string(),
                disabled: false,
            },
        ])
    }

    async fn shipment_rates(
        &self,
        _credentials: &RatingCredentials,
        request: ShipmentRequest,
    ) -> Result<RatedShipment, ProviderError> {
        let total_weight: f64 = request
            .packages
            .iter()
            .map(|package| package.weight.value)
            .sum();

        let money = |amount: f64| MoneyAmount {
            amount: (amount * 100.0).round() / 100.0,
            currency: "usd".to_string(),
        };

        Ok(RatedShipment {
            rates: vec![
                ProviderRate {
                    rate_id: "demo-ground".to_string(),
                    carrier_id: "se-demo-usps".to_string(),
                    carrier_code: "usps".to_string(),
                    carrier_friendly_name: Some("USPS".to_string()),
                    service_code: Some("usps_ground_advantage".to_string()),
                    service_type: Some("USPS Ground Advantage".to_string()),
                    shipping_amount: Some(money(7.95 + 1.25 * total_weight)),
                    delivery_days: Some(4),
                    estimated_delivery_date: None,
                    carrier_delivery_days: Some("2-4 business days".to_string()),
                    guaranteed_service: false,
                },
                ProviderRate {
                    rate_id: "demo-priority".to_string(),
                    carrier_id: "se-demo-usps".to_string(),
                    carrier_code: "usps".to_string(),
                    carrier_friendly_name: Some("USPS".to_string()),
                    service_code: Some("usps_priority_mail".to_string()),
                    service_type: Some("USPS Priority Mail".to_string()),
                    shipping_amount: Some(money(12.40 + 1.80 * total_weight)),
                    delivery_days: Some(2),
                    estimated_delivery_date: None,
                    carrier_delivery_days: Some("1-2 business days".to_string()),
                    guaranteed_service: false,
                },
                ProviderRate {
                    rate_id: "demo-overnight".to_string(),
                    carrier_id: "se-demo-ups".to_string(),
                    carrier_code: "ups".to_string(),
                    carrier_friendly_name: Some("UPS".to_string()),
                    service_code: Some("ups_next_day_air".to_string()),
                    service_type: Some("UPS Next Day Air".to_string()),
                    shipping_amount: Some(money(32.0 + 2.5 * total_weight)),
                    delivery_days: Some(1),
                    estimated_delivery_date: None,
                    carrier_delivery_days: Some("Next business day".to_string()),
                    guaranteed_service: true,
                },
            ],
            errors: Vec::new(),
        })
    }
}

/// Greenhouse origin plus the box templates and zone table the nursery ships
/// with.
pub(crate) fn fixture_settings(rating: &RatingConfig) -> ShippingSettings {
    ShippingSettings {
        integration_enabled: rating.enabled,
        mode: rating.mode,
        production_api_key: rating.api_key.clone(),
        sandbox_api_key: rating.sandbox_api_key.clone(),
        origin: Some(Address {
            name: "Verdura Nursery".to_string(),
            company: Some("Verdura Gardens LLC".to_string()),
            phone: Some("515-555-0184".to_string()),
            line1: "100 Greenhouse Rd".to_string(),
            line2: None,
            city: "Des Moines".to_string(),
            region: "IA".to_string(),
            postal_code: "50309".to_string(),
            country: "US".to_string(),
        }),
        enabled_carrier_ids: Vec::new(),
        package_templates: vec![
            PackageTemplate {
                name: "Seedling Mailer".to_string(),
                dimensions: Dimensions::inches(10.0, 6.0, 6.0),
                empty_weight_lb: 0.4,
                min_quantity: 1,
                max_quantity: 4,
                is_default: false,
            },
            PackageTemplate {
                name: "Small Box".to_string(),
                dimensions: Dimensions::inches(14.0, 10.0, 8.0),
                empty_weight_lb: 1.0,
                min_quantity: 1,
                max_quantity: 12,
                is_default: true,
            },
            PackageTemplate {
                name: "Grower Box".to_string(),
                dimensions: Dimensions::inches(20.0, 16.0, 12.0),
                empty_weight_lb: 2.5,
                min_quantity: 13,
                max_quantity: 36,
                is_default: false,
            },
        ],
        zone_records: vec![
            ZoneRecord {
                region: "PR".to_string(),
                status: ZoneStatus::Blocked,
                conditions: ZoneConditions::default(),
                message: Some(
                    "USDA restrictions prevent live plant shipments to Puerto Rico.".to_string(),
                ),
            },
            ZoneRecord {
                region: "GU".to_string(),
                status: ZoneStatus::Blocked,
                conditions: ZoneConditions::default(),
                message: Some(
                    "We cannot ship live plants to Guam under current agricultural rules."
                        .to_string(),
                ),
            },
            ZoneRecord {
                region: "AK".to_string(),
                status: ZoneStatus::Conditional,
                conditions: ZoneConditions {
                    required_service: Some("usps_priority_mail".to_string()),
                    blocked_months: vec![11, 12, 1, 2],
                    minimum_order_value: None,
                    max_transit_days: Some(4),
                },
                message: Some(
                    "Alaska orders ship expedited and pause for the winter months.".to_string(),
                ),
            },
            ZoneRecord {
                region: "HI".to_string(),
                status: ZoneStatus::Conditional,
                conditions: ZoneConditions {
                    required_service: None,
                    blocked_months: Vec::new(),
                    minimum_order_value: Some(40.0),
                    max_transit_days: Some(5),
                },
                message: Some(
                    "Hawaii shipments require agricultural inspection on arrival.".to_string(),
                ),
            },
        ],
        zone_rules: vec![ZoneRule {
            name: "Desert summer heat hold".to_string(),
            active: true,
            priority: 10,
            regions: Some(vec!["AZ".to_string(), "NV".to_string()]),
            months: Some(vec![6, 7, 8]),
            starts_on: None,
            ends_on: None,
            action: ZoneRuleAction::RequireServices {
                services: vec!["usps_priority_mail_express".to_string()],
            },
        }],
        markup: MarkupPolicy::Percentage { percent: 5.0 },
        allowed_service_codes: None,
        forced_service: None,
        default_item_weight_lb: 0.5,
    }
}
