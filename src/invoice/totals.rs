//! Invoice arithmetic.
//!
//! Every input is coerced before use, so these functions never panic and
//! never produce NaN. Presentation (currency symbol, decimals) lives in
//! [`format_money`].

use serde::Serialize;

use crate::invoice::items::LineItems;
use crate::invoice::model::Invoice;
use crate::numeric::{finite_or_zero, NumericField};

/// Sum of quantity × price over all items.
pub fn subtotal(items: &LineItems) -> f64 {
    finite_or_zero(items.iter().map(|item| item.amount()).sum())
}

pub fn discount_amount(subtotal: f64, discount_pct: &NumericField) -> f64 {
    finite_or_zero(subtotal * discount_pct.value() / 100.0)
}

pub fn discounted(subtotal: f64, discount_pct: &NumericField) -> f64 {
    finite_or_zero(subtotal - discount_amount(subtotal, discount_pct))
}

/// Tax is charged on the discounted amount.
pub fn tax_amount(discounted: f64, tax_pct: &NumericField) -> f64 {
    finite_or_zero(discounted * tax_pct.value() / 100.0)
}

pub fn total(items: &LineItems, discount_pct: &NumericField, tax_pct: &NumericField) -> f64 {
    let after_discount = discounted(subtotal(items), discount_pct);
    finite_or_zero(after_discount + tax_amount(after_discount, tax_pct))
}

/// All derived figures for one invoice
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub subtotal: f64,
    pub discount_pct: f64,
    pub discount_amount: f64,
    pub discounted: f64,
    pub tax_pct: f64,
    pub tax_amount: f64,
    pub total: f64,
}

impl Totals {
    pub fn compute(invoice: &Invoice) -> Self {
        let subtotal = subtotal(&invoice.items);
        let discount_amount = discount_amount(subtotal, &invoice.discount);
        let discounted = discounted(subtotal, &invoice.discount);
        let tax_amount = tax_amount(discounted, &invoice.tax);

        Self {
            subtotal,
            discount_pct: invoice.discount.value(),
            discount_amount,
            discounted,
            tax_pct: invoice.tax.value(),
            tax_amount,
            total: finite_or_zero(discounted + tax_amount),
        }
    }
}

/// Format a money amount with two decimal places and thousands separators
pub fn format_money(currency_symbol: &str, value: f64) -> String {
    let value = finite_or_zero(value);
    let rounded = format!("{:.2}", value.abs());
    let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let grouped = group_digits(whole);

    let sign = if value < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{sign}{currency_symbol}{grouped}.{frac}")
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}
