use chrono::NaiveDate;
use serde::Serialize;

use crate::invoice::model::Invoice;
use crate::invoice::totals::{format_money, Totals};

/// Text shown in place of a missing logo
pub const LOGO_PLACEHOLDER: &str = "YOUR LOGO";

/// A line item as it appears on the exported document
#[derive(Debug, Serialize)]
pub struct ExportRow {
    pub description: String,
    pub price: String,
    pub quantity: String,
    pub amount: String,
}

/// Everything the document template needs, already formatted
#[derive(Debug, Serialize)]
pub struct ExportData {
    pub title: String,
    pub number: String,
    pub date: String,
    pub from: String,
    pub to: String,
    pub to_address: String,
    pub notes: String,
    pub currency_symbol: String,
    /// File name of the logo next to the template, if one could be prepared
    pub logo: Option<String>,
    pub logo_placeholder: String,
    pub items: Vec<ExportRow>,
    pub subtotal: String,
    pub discount_pct: String,
    pub discount: String,
    pub tax_pct: String,
    pub tax: String,
    pub total: String,
}

impl ExportData {
    pub fn new(invoice: &Invoice, date: NaiveDate) -> Self {
        let symbol = invoice.currency.symbol();
        let totals = Totals::compute(invoice);

        let items = invoice
            .items
            .rows_for_display()
            .into_iter()
            .map(|item| ExportRow {
                price: format_money(symbol, item.price.value()),
                quantity: format_quantity(item.quantity.value()),
                amount: format_money(symbol, item.amount()),
                description: item.description,
            })
            .collect();

        Self {
            title: "INVOICE".to_string(),
            number: invoice.invoice_number.clone(),
            date: date.format("%B %d, %Y").to_string(),
            from: invoice.from.clone(),
            to: invoice.to.clone(),
            to_address: invoice.to_address.clone(),
            notes: invoice.notes.clone(),
            currency_symbol: symbol.to_string(),
            logo: None,
            logo_placeholder: LOGO_PLACEHOLDER.to_string(),
            items,
            subtotal: format_money(symbol, totals.subtotal),
            discount_pct: format_percent(totals.discount_pct),
            discount: format_money(symbol, -totals.discount_amount),
            tax_pct: format_percent(totals.tax_pct),
            tax: format_money(symbol, totals.tax_amount),
            total: format_money(symbol, totals.total),
        }
    }
}

pub fn pdf_file_name(invoice_number: &str) -> String {
    format!("invoice-{}.pdf", invoice_number)
}

fn format_quantity(value: f64) -> String {
    value.to_string()
}

fn format_percent(value: f64) -> String {
    format!("{}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::items::{LineItem, LineItems};
    use crate::invoice::model::Currency;
    use crate::numeric::NumericField;

    fn sample() -> Invoice {
        let mut invoice = Invoice::with_number("0042");
        invoice.from = "Acme Studio".to_string();
        invoice.to = "Globex".to_string();
        invoice.currency = Currency::Dollar;
        invoice.items = LineItems::from(vec![LineItem::new("Design work", "2", "1500")]);
        invoice.discount = NumericField::from("10");
        invoice.tax = NumericField::from("5");
        invoice
    }

    #[test]
    fn rows_and_totals_are_formatted() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let data = ExportData::new(&sample(), date);

        assert_eq!(data.date, "March 01, 2026");
        assert_eq!(data.items.len(), 1);
        assert_eq!(data.items[0].price, "$1,500.00");
        assert_eq!(data.items[0].quantity, "2");
        assert_eq!(data.items[0].amount, "$3,000.00");
        assert_eq!(data.subtotal, "$3,000.00");
        assert_eq!(data.discount_pct, "10%");
        assert_eq!(data.discount, "-$300.00");
        assert_eq!(data.tax, "$135.00");
        assert_eq!(data.total, "$2,835.00");
        assert_eq!(pdf_file_name(&data.number), "invoice-0042.pdf");
    }

    #[test]
    fn empty_item_list_renders_one_blank_row() {
        let mut invoice = sample();
        invoice.items = LineItems::new();

        let data = ExportData::new(&invoice, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(data.items.len(), 1);
        assert_eq!(data.items[0].amount, "$0.00");
        assert_eq!(data.total, "$0.00");
    }
}
