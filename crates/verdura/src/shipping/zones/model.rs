use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Base shipping eligibility for a destination region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    Allowed,
    Blocked,
    Conditional,
}

impl ZoneStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ZoneStatus::Allowed => "allowed",
            ZoneStatus::Blocked => "blocked",
            ZoneStatus::Conditional => "conditional",
        }
    }
}

/// Structured constraints attached to a `conditional` zone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_service: Option<String>,
    /// Calendar months (1-12) during which the zone does not accept plants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_months: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_order_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_transit_days: Option<u32>,
}

/// One row of the static zone table, keyed by region code. Absence of a
/// record implies `allowed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub region: String,
    pub status: ZoneStatus,
    #[serde(default)]
    pub conditions: ZoneConditions,
    /// Customer-facing explanation shown when the zone blocks or constrains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What a matching rule does to the verdict. A tagged union instead of the
/// loosely typed action bags the admin console historically stored, so rule
/// evaluation is exhaustive at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ZoneRuleAction {
    Block {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    RequireServices {
        services: Vec<String>,
    },
    TransitLimit {
        max_transit_days: u32,
    },
    Surcharge {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percent: Option<f64>,
    },
}

/// Prioritized override layered on top of the zone table. Lower priority
/// evaluates first; a block from any applicable rule is final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRule {
    pub name: String,
    pub active: bool,
    pub priority: i32,
    /// Region filter; `None` applies everywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,
    /// Month filter (1-12); `None` applies year-round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<NaiveDate>,
    pub action: ZoneRuleAction,
}

impl ZoneRule {
    /// Whether this rule's region, month, and effective-date filters all
    /// match the evaluation context.
    pub fn applies(&self, region: &str, today: NaiveDate) -> bool {
        if !self.active {
            return false;
        }

        if let Some(regions) = &self.regions {
            if !regions.iter().any(|r| r.eq_ignore_ascii_case(region)) {
                return false;
            }
        }

        if let Some(months) = &self.months {
            if !months.contains(&today.month()) {
                return false;
            }
        }

        if let Some(starts_on) = self.starts_on {
            if today < starts_on {
                return false;
            }
        }
        if let Some(ends_on) = self.ends_on {
            if today > ends_on {
                return false;
            }
        }

        true
    }
}
