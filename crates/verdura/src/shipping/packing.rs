//! Best-fit bin packing of an order's item count into configured box
//! templates.

use super::domain::{round2, PackageTemplate, PlannedPackage, Weight};

/// Output of the planner: the physical packages plus a customer-facing
/// summary line.
#[derive(Debug, Clone, PartialEq)]
pub struct PackagePlan {
    pub packages: Vec<PlannedPackage>,
    pub summary: String,
}

impl PackagePlan {
    fn empty(summary: impl Into<String>) -> Self {
        Self {
            packages: Vec::new(),
            summary: summary.into(),
        }
    }
}

/// Pack `total_quantity` items of `weight_per_item` pounds into the fewest
/// configured boxes.
///
/// Template quantity ranges may overlap; ties break toward the smallest
/// `max_quantity` that still covers the remaining quantity so small orders do
/// not ship in oversized boxes. Quantities above every template's maximum
/// repeatedly consume the largest template until the remainder fits.
pub fn plan(
    total_quantity: u32,
    weight_per_item: f64,
    templates: &[PackageTemplate],
) -> PackagePlan {
    if templates.is_empty() {
        return PackagePlan::empty("No package templates configured");
    }
    if total_quantity == 0 {
        return PackagePlan::empty("No items to ship");
    }

    let mut by_capacity: Vec<&PackageTemplate> = templates.iter().collect();
    by_capacity.sort_by(|a, b| b.max_quantity.cmp(&a.max_quantity));
    let largest = by_capacity[0];

    let mut packages = Vec::new();
    // (template name, package count) in packing order, for the summary line.
    let mut groups: Vec<(String, u32)> = Vec::new();

    let mut remaining = total_quantity;
    while remaining > 0 {
        let chosen = select_template(remaining, &by_capacity, largest);
        let placed = remaining.min(chosen.max_quantity.max(1));

        packages.push(PlannedPackage {
            weight: Weight::pounds(round2(
                chosen.empty_weight_lb + f64::from(placed) * weight_per_item,
            )),
            dimensions: chosen.dimensions,
            item_count: placed,
        });

        match groups.iter_mut().find(|(name, _)| *name == chosen.name) {
            Some((_, count)) => *count += 1,
            None => groups.push((chosen.name.clone(), 1)),
        }

        remaining -= placed;
    }

    let summary = summarize(&packages, &groups, total_quantity);
    PackagePlan { packages, summary }
}

/// Pick the box for a remaining quantity `q`.
///
/// Preference order: among templates whose range contains `q`, the tightest
/// fit (`max_quantity >= q`, smallest first); when nothing contains `q`, the
/// largest template for oversized remainders, otherwise the smallest template
/// that can still hold `q`, the default-flagged template, or the largest.
fn select_template<'a>(
    quantity: u32,
    by_capacity: &[&'a PackageTemplate],
    largest: &'a PackageTemplate,
) -> &'a PackageTemplate {
    let candidates: Vec<&PackageTemplate> = by_capacity
        .iter()
        .copied()
        .filter(|template| template.covers(quantity))
        .collect();

    if !candidates.is_empty() {
        return candidates
            .iter()
            .copied()
            .filter(|template| template.max_quantity >= quantity)
            .min_by_key(|template| template.max_quantity)
            .or_else(|| {
                candidates
                    .iter()
                    .copied()
                    .max_by_key(|template| template.max_quantity)
            })
            .unwrap_or(largest);
    }

    if quantity > largest.max_quantity {
        return largest;
    }

    by_capacity
        .iter()
        .copied()
        .filter(|template| template.max_quantity >= quantity)
        .min_by_key(|template| template.max_quantity)
        .or_else(|| by_capacity.iter().copied().find(|template| template.is_default))
        .unwrap_or(largest)
}

fn summarize(packages: &[PlannedPackage], groups: &[(String, u32)], total_items: u32) -> String {
    if packages.len() == 1 {
        let items = packages[0].item_count;
        let noun = if items == 1 { "item" } else { "items" };
        return format!("Ships in: 1 {} ({items} {noun})", groups[0].0);
    }

    let grouped = groups
        .iter()
        .map(|(name, count)| format!("{count} {name}"))
        .collect::<Vec<_>>()
        .join(" + ");

    format!(
        "Ships in: {} packages ({grouped}) — {total_items} items",
        packages.len()
    )
}
