//! Zone policy evaluation: a pure function of the destination region, the
//! evaluation date, and configuration.

mod model;

pub use model::{ZoneConditions, ZoneRecord, ZoneRule, ZoneRuleAction, ZoneStatus};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

/// Outcome of evaluating a destination region against the zone table and
/// rule set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneVerdict {
    pub allowed: bool,
    pub status: ZoneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_transit_days: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_services: Vec<String>,
    pub surcharge_amount: f64,
    pub surcharge_percent: f64,
}

impl ZoneVerdict {
    fn allowed_without_constraints() -> Self {
        Self {
            allowed: true,
            status: ZoneStatus::Allowed,
            message: None,
            max_transit_days: None,
            required_services: Vec::new(),
            surcharge_amount: 0.0,
            surcharge_percent: 0.0,
        }
    }

    fn blocked(status: ZoneStatus, message: String) -> Self {
        Self {
            allowed: false,
            status,
            message: Some(message),
            max_transit_days: None,
            required_services: Vec::new(),
            surcharge_amount: 0.0,
            surcharge_percent: 0.0,
        }
    }

    /// Whether the verdict carries anything beyond a plain allow.
    pub fn has_constraints(&self) -> bool {
        self.max_transit_days.is_some()
            || !self.required_services.is_empty()
            || self.surcharge_amount != 0.0
            || self.surcharge_percent != 0.0
    }
}

/// Evaluates the static zone table plus the prioritized rule set. Holds a
/// read-only configuration snapshot; nothing here mutates state.
pub struct ZonePolicyEngine {
    records: HashMap<String, ZoneRecord>,
    /// Active rules sorted by ascending priority.
    rules: Vec<ZoneRule>,
}

impl ZonePolicyEngine {
    pub fn new(records: Vec<ZoneRecord>, rules: Vec<ZoneRule>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.region.trim().to_ascii_uppercase(), record))
            .collect();

        let mut rules: Vec<ZoneRule> = rules.into_iter().filter(|rule| rule.active).collect();
        rules.sort_by_key(|rule| rule.priority);

        Self { records, rules }
    }

    /// Evaluate a destination region as of `today`.
    pub fn evaluate(&self, region_code: &str, today: NaiveDate) -> ZoneVerdict {
        let region = region_code.trim().to_ascii_uppercase();

        let mut verdict = ZoneVerdict::allowed_without_constraints();

        if let Some(record) = self.records.get(&region) {
            match record.status {
                ZoneStatus::Blocked => {
                    let message = record
                        .message
                        .clone()
                        .unwrap_or_else(|| generic_block_message(&region));
                    return ZoneVerdict::blocked(ZoneStatus::Blocked, message);
                }
                ZoneStatus::Conditional => {
                    if record.conditions.blocked_months.contains(&today.month()) {
                        let message = record
                            .message
                            .clone()
                            .unwrap_or_else(|| seasonal_block_message(&region));
                        return ZoneVerdict::blocked(ZoneStatus::Conditional, message);
                    }

                    verdict.status = ZoneStatus::Conditional;
                    verdict.message = record.message.clone();
                    verdict.max_transit_days = record.conditions.max_transit_days;
                    if let Some(service) = &record.conditions.required_service {
                        verdict.required_services.push(service.clone());
                    }
                }
                ZoneStatus::Allowed => {}
            }
        }

        for rule in &self.rules {
            if !rule.applies(&region, today) {
                continue;
            }

            match &rule.action {
                ZoneRuleAction::Block { message } => {
                    let message = message
                        .clone()
                        .unwrap_or_else(|| generic_block_message(&region));
                    return ZoneVerdict::blocked(verdict.status, message);
                }
                ZoneRuleAction::RequireServices { services } => {
                    for service in services {
                        if !verdict
                            .required_services
                            .iter()
                            .any(|existing| existing.eq_ignore_ascii_case(service))
                        {
                            verdict.required_services.push(service.clone());
                        }
                    }
                }
                ZoneRuleAction::TransitLimit { max_transit_days } => {
                    verdict.max_transit_days = Some(
                        verdict
                            .max_transit_days
                            .map_or(*max_transit_days, |current| current.min(*max_transit_days)),
                    );
                }
                ZoneRuleAction::Surcharge { amount, percent } => {
                    verdict.surcharge_amount += amount.unwrap_or(0.0);
                    verdict.surcharge_percent += percent.unwrap_or(0.0);
                }
            }
        }

        verdict
    }
}

fn generic_block_message(region: &str) -> String {
    format!("We are unable to ship live plants to {region} at this time.")
}

fn seasonal_block_message(region: &str) -> String {
    format!("Seasonal shipping restrictions apply to {region} this month.")
}
