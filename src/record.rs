//! Record schema: the typed sales transaction, its CSV wire shape and the display projection.
//!
//! Every typed column is parsed exactly once, when the dataset is loaded. A value that does not
//! parse becomes `None`, which never matches a numeric or date filter.

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One sales transaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SaleRecord {
    pub transaction_id: String,
    pub date: Option<NaiveDate>,
    pub customer_id: String,
    pub customer_name: String,
    pub phone_number: String,
    pub gender: String,
    pub age: Option<i64>,
    pub customer_region: String,
    pub customer_type: String,
    pub product_id: String,
    pub product_name: String,
    pub brand: String,
    pub product_category: String,
    /// Raw comma-separated tag list as it appeared in the source.
    pub tags: String,
    pub quantity: Option<i64>,
    pub price_per_unit: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub total_amount: Option<f64>,
    pub final_amount: Option<f64>,
    pub payment_method: String,
    pub order_status: String,
    pub delivery_type: String,
    pub store_id: String,
    pub store_location: String,
    pub salesperson_id: String,
    pub employee_name: String,
}

impl SaleRecord {
    /// Trimmed tag tokens. Empty tokens (e.g. from `"a,,b"`) are kept out.
    pub fn tag_tokens(&self) -> impl Iterator<Item = &str> {
        split_tags(&self.tags)
    }

    /// Project onto the 13 fields returned to callers.
    #[must_use]
    pub fn to_row(&self) -> SaleRow {
        SaleRow {
            transaction_id: self.transaction_id.clone(),
            date: self.date,
            customer_id: self.customer_id.clone(),
            customer_name: self.customer_name.clone(),
            phone_number: self.phone_number.clone(),
            gender: self.gender.clone(),
            age: self.age,
            customer_region: self.customer_region.clone(),
            product_category: self.product_category.clone(),
            quantity: self.quantity,
            total_amount: self.total_amount,
            product_id: self.product_id.clone(),
            employee_name: self.employee_name.clone(),
        }
    }
}

/// Split a raw tag string on commas and trim every token.
pub fn split_tags(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// The CSV row as written by the upstream export. Every column is optional text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSale {
    #[serde(rename = "Transaction ID")]
    pub transaction_id: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Customer ID")]
    pub customer_id: String,
    #[serde(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Phone Number")]
    pub phone_number: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Customer Region")]
    pub customer_region: String,
    #[serde(rename = "Customer Type")]
    pub customer_type: String,
    #[serde(rename = "Product ID")]
    pub product_id: String,
    #[serde(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Product Category")]
    pub product_category: String,
    #[serde(rename = "Tags")]
    pub tags: String,
    #[serde(rename = "Quantity")]
    pub quantity: String,
    #[serde(rename = "Price per Unit")]
    pub price_per_unit: String,
    #[serde(rename = "Discount Percentage")]
    pub discount_percentage: String,
    #[serde(rename = "Total Amount")]
    pub total_amount: String,
    #[serde(rename = "Final Amount")]
    pub final_amount: String,
    #[serde(rename = "Payment Method")]
    pub payment_method: String,
    #[serde(rename = "Order Status")]
    pub order_status: String,
    #[serde(rename = "Delivery Type")]
    pub delivery_type: String,
    #[serde(rename = "Store ID")]
    pub store_id: String,
    #[serde(rename = "Store Location")]
    pub store_location: String,
    #[serde(rename = "Salesperson ID")]
    pub salesperson_id: String,
    #[serde(rename = "Employee Name")]
    pub employee_name: String,
}

impl From<RawSale> for SaleRecord {
    fn from(r: RawSale) -> Self {
        Self {
            date: parse_date(&r.date),
            age: parse_int(&r.age),
            quantity: parse_int(&r.quantity),
            price_per_unit: parse_decimal(&r.price_per_unit),
            discount_percentage: parse_decimal(&r.discount_percentage),
            total_amount: parse_decimal(&r.total_amount),
            final_amount: parse_decimal(&r.final_amount),
            transaction_id: r.transaction_id,
            customer_id: r.customer_id,
            customer_name: r.customer_name,
            phone_number: r.phone_number,
            gender: r.gender,
            customer_region: r.customer_region,
            customer_type: r.customer_type,
            product_id: r.product_id,
            product_name: r.product_name,
            brand: r.brand,
            product_category: r.product_category,
            tags: r.tags,
            payment_method: r.payment_method,
            order_status: r.order_status,
            delivery_type: r.delivery_type,
            store_id: r.store_id,
            store_location: r.store_location,
            salesperson_id: r.salesperson_id,
            employee_name: r.employee_name,
        }
    }
}

/// The display projection returned by the query operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRow {
    #[serde(rename = "Transaction ID")]
    pub transaction_id: String,
    #[serde(rename = "Date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "Customer ID")]
    pub customer_id: String,
    #[serde(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Phone Number")]
    pub phone_number: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Age")]
    pub age: Option<i64>,
    #[serde(rename = "Customer Region")]
    pub customer_region: String,
    #[serde(rename = "Product Category")]
    pub product_category: String,
    #[serde(rename = "Quantity")]
    pub quantity: Option<i64>,
    #[serde(rename = "Total Amount")]
    pub total_amount: Option<f64>,
    #[serde(rename = "Product ID")]
    pub product_id: String,
    #[serde(rename = "Employee Name")]
    pub employee_name: String,
}

/// Integers: surrounding whitespace is ignored, anything else must be a plain integer.
#[must_use]
pub fn parse_int(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

/// Decimals: finite values only, so `NaN`/`inf` in the source behave like garbage.
#[must_use]
pub fn parse_decimal(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Calendar dates in `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used.
///
/// Years outside 1..=9999 are rejected so the ISO text form always orders chronologically.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))?;
    (1..=9999).contains(&date.year()).then_some(date)
}
