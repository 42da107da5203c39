//! Shipping rate and zone-policy engine.
//!
//! The storefront hands this module a destination address and an order's item
//! quantities; it decides whether shipping there is allowed, packs the order
//! into physical boxes, fetches live carrier rates, and prices them according
//! to zone policy, markup, and service overrides.

pub mod domain;
pub mod gateway;
pub mod packing;
pub mod pricing;
pub mod router;
pub mod service;
pub mod store;
pub mod zones;

pub use domain::{
    Address, CarrierApiError, CarrierRate, Dimensions, ForcedServicePolicy, ForcedServiceOverride,
    MarkupPolicy, PackageTemplate, PlannedPackage, Weight,
};
pub use gateway::{CarrierAccount, GatewayError, ProviderError, RatedShipment, RatingProvider};
pub use packing::{plan, PackagePlan};
pub use router::shipping_router;
pub use service::{
    OrderItem, PackageBreakdown, RateFailure, RateFailureCode, RateRequest, RateResponse,
    RequestedPackage, ShippingRateService, ZoneInfo,
};
pub use store::{RatingCredentials, ShippingConfigStore, ShippingSettings, StoreError};
pub use zones::{
    ZoneConditions, ZonePolicyEngine, ZoneRecord, ZoneRule, ZoneRuleAction, ZoneStatus, ZoneVerdict,
};
