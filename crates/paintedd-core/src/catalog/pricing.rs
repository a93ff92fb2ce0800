use serde::Serialize;

use crate::models::{PriceModifier, Product, VariantOption};

/// Intermediate values of a price computation, kept for display and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBreakdown {
    /// Base price plus every flat amount
    pub subtotal: f64,
    /// Product of every multiplier (1.0 when none)
    pub multiplier: f64,
    pub total: i64,
}

/// Price = round((base + sum of flats) * product of multipliers).
pub fn compute_price<'a, I>(base: f64, modifiers: I) -> PriceBreakdown
where
    I: IntoIterator<Item = &'a PriceModifier>,
{
    let mut subtotal = base;
    let mut multiplier = 1.0;
    for modifier in modifiers {
        match modifier {
            PriceModifier::Flat(amount) => subtotal += amount,
            PriceModifier::Multiplier(factor) => multiplier *= factor,
        }
    }
    PriceBreakdown {
        subtotal,
        multiplier,
        total: (subtotal * multiplier).round() as i64,
    }
}

/// Everything a cart line needs from a product and its chosen options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub price: i64,
    pub details: String,
    pub sku: String,
}

pub fn quote(product: &Product, choices: &[&VariantOption]) -> Quote {
    let breakdown = compute_price(product.base_price, choices.iter().map(|o| &o.modifier));

    let details = if choices.is_empty() {
        product.kind.clone()
    } else {
        choices.iter().map(|o| o.label.as_str()).collect::<Vec<_>>().join(" · ")
    };

    let base = if product.sku_base.is_empty() { "ITEM" } else { product.sku_base.as_str() };
    let mut sku_parts = vec![base];
    sku_parts.extend(choices.iter().filter_map(|o| o.code.as_deref()));

    Quote {
        price: breakdown.total,
        details,
        sku: sku_parts.join("-"),
    }
}
