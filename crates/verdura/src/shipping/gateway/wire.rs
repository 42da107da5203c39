//! Serde shapes for the rating provider's wire protocol (ShipEngine-style
//! `/v1/carriers` and `/v1/rates`).

use serde::{Deserialize, Serialize};

use crate::shipping::domain::{Address, CarrierApiError, PlannedPackage};

use super::{CarrierAccount, ProviderRate, ShipmentRequest};

#[derive(Debug, Deserialize)]
pub(super) struct CarrierListResponse {
    #[serde(default)]
    pub carriers: Vec<CarrierAccount>,
}

#[derive(Debug, Serialize)]
pub(super) struct RateRequestBody {
    pub rate_options: RateOptions,
    pub shipment: WireShipment,
}

#[derive(Debug, Serialize)]
pub(super) struct RateOptions {
    pub carrier_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct WireShipment {
    pub validate_address: &'static str,
    pub ship_from: WireAddress,
    pub ship_to: WireAddress,
    pub packages: Vec<PlannedPackage>,
}

#[derive(Debug, Serialize)]
pub(super) struct WireAddress {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city_locality: String,
    pub state_province: String,
    pub postal_code: String,
    pub country_code: String,
}

impl From<&Address> for WireAddress {
    fn from(address: &Address) -> Self {
        Self {
            name: address.name.clone(),
            company_name: address.company.clone(),
            phone: address.phone.clone(),
            address_line1: address.line1.clone(),
            address_line2: address.line2.clone(),
            city_locality: address.city.clone(),
            state_province: address.region.clone(),
            postal_code: address.postal_code.clone(),
            country_code: address.country.clone(),
        }
    }
}

impl From<&ShipmentRequest> for RateRequestBody {
    fn from(request: &ShipmentRequest) -> Self {
        Self {
            rate_options: RateOptions {
                carrier_ids: request.carrier_ids.clone(),
            },
            shipment: WireShipment {
                validate_address: "no_validation",
                ship_from: WireAddress::from(&request.ship_from),
                ship_to: WireAddress::from(&request.ship_to),
                packages: request.packages.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RateResponseBody {
    pub rate_response: RateResponsePayload,
}

#[derive(Debug, Deserialize)]
pub(super) struct RateResponsePayload {
    #[serde(default)]
    pub rates: Vec<ProviderRate>,
    #[serde(default)]
    pub errors: Vec<WireRateError>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireRateError {
    #[serde(default)]
    pub carrier_id: Option<String>,
    #[serde(default)]
    pub carrier_code: Option<String>,
    pub message: String,
}

impl From<WireRateError> for CarrierApiError {
    fn from(error: WireRateError) -> Self {
        Self {
            carrier: error
                .carrier_code
                .or(error.carrier_id)
                .unwrap_or_else(|| "unknown".to_string()),
            message: error.message,
        }
    }
}
