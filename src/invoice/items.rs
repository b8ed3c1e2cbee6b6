use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{InvoiceError, Result};
use crate::numeric::{finite_or_zero, NumericField};

/// One billable row on the invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: NumericField,
    #[serde(default)]
    pub price: NumericField,
}

impl LineItem {
    /// A fresh form row: no description, quantity 1, price 0.
    pub fn blank() -> Self {
        Self {
            description: String::new(),
            quantity: NumericField::from("1"),
            price: NumericField::from("0"),
        }
    }

    pub fn new(
        description: impl Into<String>,
        quantity: impl Into<NumericField>,
        price: impl Into<NumericField>,
    ) -> Self {
        Self {
            description: description.into(),
            quantity: quantity.into(),
            price: price.into(),
        }
    }

    pub fn amount(&self) -> f64 {
        finite_or_zero(self.quantity.value() * self.price.value())
    }
}

/// Editable fields of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Description,
    Quantity,
    Price,
}

impl FromStr for ItemField {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "description" | "desc" => Ok(ItemField::Description),
            "quantity" | "qty" => Ok(ItemField::Quantity),
            "price" | "rate" => Ok(ItemField::Price),
            _ => Err(InvoiceError::InvalidItemField(s.to_string())),
        }
    }
}

/// Ordered line items, addressed by position.
///
/// An empty list is legal here; views that need a row to render call
/// [`LineItems::rows_for_display`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItems(Vec<LineItem>);

impl LineItems {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a blank row and return its index.
    pub fn add(&mut self) -> usize {
        self.push(LineItem::blank())
    }

    pub fn push(&mut self, item: LineItem) -> usize {
        self.0.push(item);
        self.0.len() - 1
    }

    /// Remove the item at `index`; later items shift down by one.
    pub fn remove(&mut self, index: usize) -> Result<LineItem> {
        self.check_index(index)?;
        Ok(self.0.remove(index))
    }

    /// Replace a single field of the item at `index` in place.
    pub fn update(&mut self, index: usize, field: ItemField, value: &str) -> Result<()> {
        self.check_index(index)?;
        let item = &mut self.0[index];
        match field {
            ItemField::Description => item.description = value.to_string(),
            ItemField::Quantity => item.quantity = NumericField::from(value),
            ItemField::Price => item.price = NumericField::from(value),
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&LineItem> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.0.iter()
    }

    /// Items to render; an empty list shows one blank row.
    pub fn rows_for_display(&self) -> Vec<LineItem> {
        if self.0.is_empty() {
            vec![LineItem::blank()]
        } else {
            self.0.clone()
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.0.len() {
            return Err(InvoiceError::ItemIndexOutOfRange {
                index: index + 1,
                count: self.0.len(),
            });
        }
        Ok(())
    }
}

impl From<Vec<LineItem>> for LineItems {
    fn from(items: Vec<LineItem>) -> Self {
        Self(items)
    }
}

impl<'a> IntoIterator for &'a LineItems {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
