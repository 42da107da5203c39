//! Post-processing pipeline for fetched rates: transit filtering, markup,
//! zone surcharges, sorting, and service steering.
//!
//! Step order matters for the final amount: markup applies before the zone
//! surcharge, and the additive surcharge applies before the percentage one.
//! The allow-list filter fails closed; the required-service and forced-service
//! steps fail open so policy steering never empties the rate list on its own.

use std::cmp::Ordering;

use super::domain::{round2, CarrierRate, ForcedServicePolicy, MarkupPolicy};
use super::zones::ZoneVerdict;

/// Service vocabulary treated as an expedited tier when matching required
/// services.
const EXPEDITED_TERMS: [&str; 6] = [
    "priority",
    "express",
    "expedited",
    "2-day",
    "1-day",
    "overnight",
];

/// Fastest delivery-day estimate still considered expedited.
const EXPEDITED_MAX_DAYS: u32 = 3;

pub fn apply_pricing(
    rates: Vec<CarrierRate>,
    verdict: &ZoneVerdict,
    markup: MarkupPolicy,
    allowed_service_codes: Option<&[String]>,
    forced_service: Option<&ForcedServicePolicy>,
    destination_region: &str,
) -> Vec<CarrierRate> {
    let mut rates = filter_by_transit(rates, verdict.max_transit_days);

    for rate in &mut rates {
        let with_markup = apply_markup(rate.amount, markup);
        let with_surcharge =
            (with_markup + verdict.surcharge_amount) * (1.0 + verdict.surcharge_percent / 100.0);
        rate.amount = round2(with_surcharge);
    }

    rates.sort_by(|a, b| a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal));

    if let Some(allowed) = allowed_service_codes {
        if !allowed.is_empty() {
            rates.retain(|rate| {
                allowed
                    .iter()
                    .any(|code| code.eq_ignore_ascii_case(&rate.service_code))
            });
        }
    }

    rates = restrict_to_required_services(rates, &verdict.required_services);

    if let Some(policy) = forced_service {
        let code = policy.service_for_region(destination_region);
        let narrowed: Vec<CarrierRate> = rates
            .iter()
            .filter(|rate| rate.service_code.eq_ignore_ascii_case(code))
            .cloned()
            .collect();
        if !narrowed.is_empty() {
            rates = narrowed;
        }
    }

    rates
}

fn filter_by_transit(rates: Vec<CarrierRate>, max_transit_days: Option<u32>) -> Vec<CarrierRate> {
    let Some(limit) = max_transit_days else {
        return rates;
    };

    rates
        .into_iter()
        .filter(|rate| rate.delivery_days.map_or(true, |days| days <= limit))
        .collect()
}

fn apply_markup(amount: f64, markup: MarkupPolicy) -> f64 {
    match markup {
        MarkupPolicy::None => amount,
        MarkupPolicy::Percentage { percent } => amount * (1.0 + percent / 100.0),
        MarkupPolicy::Fixed { amount: fixed } => amount + fixed,
    }
}

/// When the zone requires an expedited tier, restrict to rates that match the
/// expedited vocabulary or deliver within three days. Fails open: an empty
/// restriction keeps the full list.
fn restrict_to_required_services(
    rates: Vec<CarrierRate>,
    required_services: &[String],
) -> Vec<CarrierRate> {
    let wants_expedited = required_services
        .iter()
        .any(|service| mentions_expedited(service));
    if !wants_expedited {
        return rates;
    }

    let restricted: Vec<CarrierRate> = rates
        .iter()
        .filter(|rate| {
            mentions_expedited(&rate.service_type)
                || mentions_expedited(&rate.service_code)
                || rate.delivery_days.map_or(false, |days| days <= EXPEDITED_MAX_DAYS)
        })
        .cloned()
        .collect();

    if restricted.is_empty() {
        rates
    } else {
        restricted
    }
}

fn mentions_expedited(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    EXPEDITED_TERMS.iter().any(|term| lowered.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::domain::ForcedServiceOverride;
    use crate::shipping::zones::ZoneStatus;

    fn rate(rate_id: &str, service_code: &str, amount: f64, days: Option<u32>) -> CarrierRate {
        CarrierRate {
            rate_id: rate_id.to_string(),
            carrier_id: "se-123".to_string(),
            carrier_code: "usps".to_string(),
            carrier_name: "USPS".to_string(),
            service_code: service_code.to_string(),
            service_type: service_code.replace('_', " "),
            amount,
            currency: "usd".to_string(),
            delivery_days: days,
            estimated_delivery_date: None,
            carrier_delivery_days: None,
            guaranteed_service: false,
        }
    }

    fn open_verdict() -> ZoneVerdict {
        ZoneVerdict {
            allowed: true,
            status: ZoneStatus::Allowed,
            message: None,
            max_transit_days: None,
            required_services: Vec::new(),
            surcharge_amount: 0.0,
            surcharge_percent: 0.0,
        }
    }

    #[test]
    fn percentage_markup_applies_before_additive_surcharge() {
        let mut verdict = open_verdict();
        verdict.surcharge_amount = 1.0;

        let priced = apply_pricing(
            vec![rate("r1", "usps_ground_advantage", 10.0, Some(3))],
            &verdict,
            MarkupPolicy::Percentage { percent: 10.0 },
            None,
            None,
            "IA",
        );

        // $10 * 1.10 = $11.00, + $1.00 surcharge = $12.00.
        assert_eq!(priced[0].amount, 12.0);
    }

    #[test]
    fn additive_surcharge_applies_before_percentage_surcharge() {
        let mut verdict = open_verdict();
        verdict.surcharge_amount = 2.0;
        verdict.surcharge_percent = 10.0;

        let priced = apply_pricing(
            vec![rate("r1", "usps_ground_advantage", 8.0, Some(3))],
            &verdict,
            MarkupPolicy::None,
            None,
            None,
            "IA",
        );

        // ($8 + $2) * 1.10 = $11.00.
        assert_eq!(priced[0].amount, 11.0);
    }

    #[test]
    fn fixed_markup_is_additive() {
        let priced = apply_pricing(
            vec![rate("r1", "usps_ground_advantage", 7.25, Some(4))],
            &open_verdict(),
            MarkupPolicy::Fixed { amount: 1.5 },
            None,
            None,
            "IA",
        );
        assert_eq!(priced[0].amount, 8.75);
    }

    #[test]
    fn transit_ceiling_drops_slow_rates_but_keeps_unknowns() {
        let mut verdict = open_verdict();
        verdict.max_transit_days = Some(3);

        let priced = apply_pricing(
            vec![
                rate("slow", "usps_ground_advantage", 6.0, Some(5)),
                rate("fast", "usps_priority_mail", 9.0, Some(2)),
                rate("unknown", "usps_media_mail", 4.0, None),
            ],
            &verdict,
            MarkupPolicy::None,
            None,
            None,
            "IA",
        );

        let ids: Vec<&str> = priced.iter().map(|r| r.rate_id.as_str()).collect();
        assert_eq!(ids, vec!["unknown", "fast"]);
    }

    #[test]
    fn rates_sort_ascending_by_final_amount() {
        let priced = apply_pricing(
            vec![
                rate("expensive", "ups_next_day_air", 42.0, Some(1)),
                rate("cheap", "usps_ground_advantage", 8.0, Some(4)),
                rate("middle", "usps_priority_mail", 12.0, Some(2)),
            ],
            &open_verdict(),
            MarkupPolicy::None,
            None,
            None,
            "IA",
        );

        let amounts: Vec<f64> = priced.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![8.0, 12.0, 42.0]);
    }

    #[test]
    fn allow_list_fails_closed() {
        let allowed = vec!["usps_priority_mail".to_string()];
        let priced = apply_pricing(
            vec![rate("r1", "usps_ground_advantage", 8.0, Some(4))],
            &open_verdict(),
            MarkupPolicy::None,
            Some(&allowed),
            None,
            "IA",
        );
        assert!(priced.is_empty());
    }

    #[test]
    fn required_expedited_service_restricts_to_fast_rates() {
        let mut verdict = open_verdict();
        verdict.required_services = vec!["USPS Priority Mail".to_string()];

        let priced = apply_pricing(
            vec![
                rate("slow", "usps_ground_advantage", 8.0, Some(5)),
                rate("fast", "usps_priority_mail", 12.0, Some(2)),
            ],
            &verdict,
            MarkupPolicy::None,
            None,
            None,
            "IA",
        );

        assert_eq!(priced.len(), 1);
        assert_eq!(priced[0].rate_id, "fast");
    }

    #[test]
    fn required_service_fails_open_when_nothing_matches() {
        let mut verdict = open_verdict();
        verdict.required_services = vec!["overnight".to_string()];

        let priced = apply_pricing(
            vec![rate("slow", "usps_ground_advantage", 8.0, Some(6))],
            &verdict,
            MarkupPolicy::None,
            None,
            None,
            "IA",
        );

        assert_eq!(priced.len(), 1);
    }

    #[test]
    fn non_expedited_required_service_leaves_rates_alone() {
        let mut verdict = open_verdict();
        verdict.required_services = vec!["usps_ground_advantage".to_string()];

        let priced = apply_pricing(
            vec![
                rate("slow", "usps_ground_advantage", 8.0, Some(5)),
                rate("fast", "usps_priority_mail", 12.0, Some(2)),
            ],
            &verdict,
            MarkupPolicy::None,
            None,
            None,
            "IA",
        );

        assert_eq!(priced.len(), 2);
    }

    #[test]
    fn forced_service_narrows_when_present_and_fails_open_when_absent() {
        let policy = ForcedServicePolicy {
            default_service: "usps_priority_mail".to_string(),
            overrides: Vec::new(),
        };
        let rates = vec![
            rate("ground", "usps_ground_advantage", 8.0, Some(4)),
            rate("priority", "usps_priority_mail", 12.0, Some(2)),
        ];

        let narrowed = apply_pricing(
            rates.clone(),
            &open_verdict(),
            MarkupPolicy::None,
            None,
            Some(&policy),
            "IA",
        );
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].rate_id, "priority");

        let absent = ForcedServicePolicy {
            default_service: "fedex_2day".to_string(),
            overrides: Vec::new(),
        };
        let unfiltered = apply_pricing(
            rates,
            &open_verdict(),
            MarkupPolicy::None,
            None,
            Some(&absent),
            "IA",
        );
        assert_eq!(unfiltered.len(), 2);
    }

    #[test]
    fn forced_service_override_takes_precedence_by_region() {
        let policy = ForcedServicePolicy {
            default_service: "usps_ground_advantage".to_string(),
            overrides: vec![ForcedServiceOverride {
                service_code: "usps_priority_mail".to_string(),
                regions: vec!["AK".to_string()],
            }],
        };
        let rates = vec![
            rate("ground", "usps_ground_advantage", 8.0, Some(4)),
            rate("priority", "usps_priority_mail", 12.0, Some(2)),
        ];

        let alaska = apply_pricing(
            rates.clone(),
            &open_verdict(),
            MarkupPolicy::None,
            None,
            Some(&policy),
            "AK",
        );
        assert_eq!(alaska[0].rate_id, "priority");

        let iowa = apply_pricing(
            rates,
            &open_verdict(),
            MarkupPolicy::None,
            None,
            Some(&policy),
            "IA",
        );
        assert_eq!(iowa[0].rate_id, "ground");
    }
}
