use crate::infra::{fixture_settings, CannedRatingProvider, FixtureConfigStore};
use clap::Args;
use std::sync::Arc;
use verdura::config::{RatingConfig, RatingMode};
use verdura::error::AppError;
use verdura::shipping::{
    Address, OrderItem, RateFailure, RateRequest, RateResponse, ShippingRateService,
};

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Destination state or territory code (for example IA or AK)
    #[arg(long)]
    pub(crate) region: String,
    /// Destination city
    #[arg(long, default_value = "Cedar Rapids")]
    pub(crate) city: String,
    /// Destination postal code
    #[arg(long, default_value = "52401")]
    pub(crate) postal_code: String,
    /// Number of plants in the order
    #[arg(long, default_value_t = 5)]
    pub(crate) quantity: u32,
    /// Per-item weight in pounds (defaults to the configured item weight)
    #[arg(long)]
    pub(crate) item_weight_lb: Option<f64>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Show the raw JSON payload for each quote alongside the summary
    #[arg(long)]
    pub(crate) show_json: bool,
}

fn demo_service() -> ShippingRateService<CannedRatingProvider, FixtureConfigStore> {
    let rating = RatingConfig {
        enabled: true,
        mode: RatingMode::Sandbox,
        api_key: None,
        sandbox_api_key: Some("demo".to_string()),
        base_url: "https://api.shipengine.com".to_string(),
        timeout_secs: 20,
    };
    let store = Arc::new(FixtureConfigStore::new(fixture_settings(&rating)));
    ShippingRateService::new(Arc::new(CannedRatingProvider), store)
}

fn destination(region: &str, city: &str, postal_code: &str) -> Address {
    Address {
        name: "Demo Customer".to_string(),
        company: None,
        phone: None,
        line1: "12 Prairie Ave".to_string(),
        line2: None,
        city: city.to_string(),
        region: region.to_string(),
        postal_code: postal_code.to_string(),
        country: "US".to_string(),
    }
}

pub(crate) async fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let QuoteArgs {
        region,
        city,
        postal_code,
        quantity,
        item_weight_lb,
    } = args;

    let service = demo_service();
    let request = RateRequest {
        destination: destination(&region, &city, &postal_code),
        packages: Vec::new(),
        order_items: vec![OrderItem {
            quantity,
            weight_per_item: item_weight_lb,
        }],
    };

    println!(
        "Quoting {} item(s) to {}, {} {}",
        quantity, city, region, postal_code
    );
    match service.quote(request).await {
        Ok(response) => render_quote(&response, false),
        Err(failure) => render_failure(&failure),
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = demo_service();

    println!("Shipping rate engine demo");

    println!("\n[1] Standard order: 5 plants to Cedar Rapids, IA");
    let iowa = RateRequest {
        destination: destination("IA", "Cedar Rapids", "52401"),
        packages: Vec::new(),
        order_items: vec![OrderItem {
            quantity: 5,
            weight_per_item: Some(0.5),
        }],
    };
    render_outcome(service.quote(iowa).await, args.show_json);

    println!("\n[2] Blocked destination: 2 plants to San Juan, PR");
    let blocked = RateRequest {
        destination: destination("PR", "San Juan", "00911"),
        packages: Vec::new(),
        order_items: vec![OrderItem {
            quantity: 2,
            weight_per_item: None,
        }],
    };
    render_outcome(service.quote(blocked).await, args.show_json);

    println!("\n[3] Zone preview: Alaska");
    match service.zone_preview("AK") {
        Ok(verdict) => {
            println!("- Status: {}", verdict.status.label());
            if let Some(message) = &verdict.message {
                println!("- Message: {}", message);
            }
            if !verdict.required_services.is_empty() {
                println!("- Required services: {}", verdict.required_services.join(", "));
            }
            if let Some(days) = verdict.max_transit_days {
                println!("- Max transit: {} days", days);
            }
        }
        Err(failure) => render_failure(&failure),
    }

    println!("\n[4] Oversized order: 30 plants to Cedar Rapids, IA");
    let bulk = RateRequest {
        destination: destination("IA", "Cedar Rapids", "52401"),
        packages: Vec::new(),
        order_items: vec![OrderItem {
            quantity: 30,
            weight_per_item: Some(0.5),
        }],
    };
    render_outcome(service.quote(bulk).await, args.show_json);

    Ok(())
}

fn render_outcome(outcome: Result<RateResponse, RateFailure>, show_json: bool) {
    match outcome {
        Ok(response) => render_quote(&response, show_json),
        Err(failure) => render_failure(&failure),
    }
}

fn render_quote(response: &RateResponse, show_json: bool) {
    if let Some(breakdown) = &response.package_breakdown {
        println!("- {}", breakdown.summary);
        for package in &breakdown.packages {
            println!(
                "  {:.1} lb box, {} item(s), {:.0}x{:.0}x{:.0} in",
                package.weight.value,
                package.item_count,
                package.dimensions.length,
                package.dimensions.width,
                package.dimensions.height
            );
        }
    }

    if response.rates.is_empty() {
        println!("- No rates available for this destination");
    } else {
        println!("- Rates (cheapest first):");
        for rate in &response.rates {
            let transit = match rate.delivery_days {
                Some(days) => format!("{} day(s)", days),
                None => "transit unknown".to_string(),
            };
            println!(
                "  ${:.2} {} | {} {} | {}",
                rate.amount, rate.currency, rate.carrier_name, rate.service_type, transit
            );
        }
    }

    if let Some(zone) = &response.zone_info {
        println!("- Zone status: {}", zone.status.label());
        if let Some(message) = &zone.message {
            println!("  {}", message);
        }
    }

    for error in &response.carrier_errors {
        println!("- Carrier {} reported: {}", error.carrier, error.message);
    }

    if show_json {
        match serde_json::to_string_pretty(response) {
            Ok(json) => println!("Raw payload:\n{}", json),
            Err(err) => println!("Raw payload unavailable: {}", err),
        }
    }
}

fn render_failure(failure: &RateFailure) {
    println!("- No quote: [{}] {}", failure.code.label(), failure.message);
    if let Some(details) = &failure.details {
        println!("  details: {}", details);
    }
}
