//! # Input Types
//!
//! Request payloads, filters and pagination shared by the database layer and
//! the HTTP server.
//!
//! ## Flow
//! ```text
//! HTTP JSON body ──► SaleInput / NewProduct / ... ──► validate() ──► kasir-db
//!                    (this module)                   (validation.rs)
//! ```
//!
//! Inputs are plain data. Each carries a `validate()` that runs the field
//! rules from [`crate::validation`] before any database work starts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{MovementType, PaymentMethod, StockStatus, TransactionStatus};
use crate::validation::{self, ValidationResult};
use crate::{DEFAULT_PAGE_SIZE, MAX_AMOUNT, MAX_CART_ITEMS, MAX_PAGE_SIZE};

// =============================================================================
// Sale
// =============================================================================

/// One cart line at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLineInput {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub discount: Money,
}

impl SaleLineInput {
    /// `quantity × unit_price`, the stored `totalPrice` of the item.
    ///
    /// Fails with `OutOfRange` instead of wrapping when the product does not
    /// fit in `i64`.
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price
            .checked_mul_quantity(self.quantity)
            .ok_or_else(|| out_of_range("unitPrice"))
    }

    /// Line total after the per-line discount.
    pub fn net_total(&self) -> CoreResult<Money> {
        self.line_total()?
            .checked_sub(self.discount)
            .ok_or_else(|| out_of_range("discount"))
    }
}

/// Money figure that left the `i64` range while totalling a cart.
pub(crate) fn out_of_range(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: MAX_AMOUNT,
    }
    .into()
}

/// Checkout request: the cart plus the totals the client computed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleInput {
    pub items: Vec<SaleLineInput>,
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub tax_amount: Money,
    #[serde(default)]
    pub discount_amount: Money,
    pub total: Money,
    pub notes: Option<String>,
}

impl SaleInput {
    /// Shape checks that need no database access.
    ///
    /// ## Rules
    /// - at least one line, at most [`MAX_CART_ITEMS`]
    /// - every quantity > 0, every unit price and discount ≥ 0
    /// - tax and order discount ≥ 0
    pub fn validate(&self) -> ValidationResult<()> {
        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }
        validation::validate_cart_size(self.items.len())?;

        for line in &self.items {
            validation::validate_id("productId", &line.product_id)?;
            validation::validate_quantity(line.quantity)?;
            validation::validate_amount("unitPrice", line.unit_price)?;
            validation::validate_amount("discount", line.discount)?;
        }

        validation::validate_amount("taxAmount", self.tax_amount)?;
        validation::validate_amount("discountAmount", self.discount_amount)?;
        if let Some(notes) = &self.notes {
            validation::validate_max_len("notes", notes, 500)?;
        }
        Ok(())
    }

    /// Distinct product ids in first-seen order.
    pub fn product_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.items.len());
        for line in &self.items {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id.clone());
            }
        }
        ids
    }

    /// Requested quantity per product, summed across lines.
    pub fn requested_quantity(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .filter(|line| line.product_id == product_id)
            .map(|line| line.quantity)
            .sum()
    }
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// Movement types a user may record by hand. `SALE` is written by checkout only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum AdjustmentType {
    In,
    Out,
    Adjustment,
}

impl From<AdjustmentType> for MovementType {
    fn from(kind: AdjustmentType) -> Self {
        match kind {
            AdjustmentType::In => MovementType::In,
            AdjustmentType::Out => MovementType::Out,
            AdjustmentType::Adjustment => MovementType::Adjustment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockAdjustmentInput {
    pub product_id: String,
    #[serde(rename = "type")]
    pub kind: AdjustmentType,
    pub quantity: i64,
    pub reason: String,
    pub notes: Option<String>,
}

impl StockAdjustmentInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_id("productId", &self.product_id)?;
        validation::validate_stock_quantity(self.quantity)?;
        validation::validate_required("reason", &self.reason, 200)?;
        if let Some(notes) = &self.notes {
            validation::validate_max_len("notes", notes, 500)?;
        }
        Ok(())
    }
}

// =============================================================================
// Catalogue
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost: Money,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    pub max_stock: Option<i64>,
    pub unit: Option<String>,
    pub category_id: String,
    pub supplier_id: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_sku(&self.sku)?;
        if let Some(barcode) = non_empty(&self.barcode) {
            validation::validate_barcode(barcode)?;
        }
        validation::validate_product_name(&self.name)?;
        validation::validate_amount("price", self.price)?;
        validation::validate_amount("cost", self.cost)?;
        validation::validate_stock_level("stock", self.stock)?;
        validation::validate_stock_bounds(self.min_stock, self.max_stock)?;
        validation::validate_id("categoryId", &self.category_id)?;
        Ok(())
    }
}

/// Partial product update. `None` leaves a field unchanged; an empty string
/// clears `barcode`, `description` or `supplierId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductUpdate {
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub cost: Option<Money>,
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
    pub unit: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(sku) = &self.sku {
            validation::validate_sku(sku)?;
        }
        if let Some(barcode) = non_empty(&self.barcode) {
            validation::validate_barcode(barcode)?;
        }
        if let Some(name) = &self.name {
            validation::validate_product_name(name)?;
        }
        if let Some(price) = self.price {
            validation::validate_amount("price", price)?;
        }
        if let Some(cost) = self.cost {
            validation::validate_amount("cost", cost)?;
        }
        if let Some(min_stock) = self.min_stock {
            validation::validate_stock_bounds(min_stock, self.max_stock)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_required("name", &self.name, 100)?;
        if let Some(description) = &self.description {
            validation::validate_max_len("description", description, 500)?;
        }
        Ok(())
    }
}

/// Supplier create and update payload; updates replace every field.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplierInput {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl SupplierInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_required("name", &self.name, 200)?;
        if let Some(email) = non_empty(&self.email) {
            validation::validate_email(email)?;
        }
        if let Some(phone) = non_empty(&self.phone) {
            validation::validate_phone(phone)?;
        }
        Ok(())
    }
}

/// Customer create and update payload; updates replace every field.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_required("name", &self.name, 200)?;
        if let Some(email) = non_empty(&self.email) {
            validation::validate_email(email)?;
        }
        if let Some(phone) = non_empty(&self.phone) {
            validation::validate_phone(phone)?;
        }
        Ok(())
    }
}

/// Trimmed value of an optional text field, `None` when absent or blank.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

// =============================================================================
// Filters
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Matches name, SKU or barcode.
    pub search: Option<String>,
    pub category_id: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    pub category_id: Option<String>,
    pub stock_status: Option<StockStatus>,
}

/// Optional `startDate` / `endDate` query parameters (`YYYY-MM-DD`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// =============================================================================
// Pagination
// =============================================================================

/// `page` / `limit` query parameters.
///
/// ## Rules
/// - `page` ≥ 1, default 1
/// - `limit` in 1..=100, default 10
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        if self.page < 1 {
            return Err(ValidationError::OutOfRange {
                field: "page".to_string(),
                min: 1,
                max: i64::MAX,
            });
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.limit) {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination metadata returned next to a page of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + request.limit - 1) / request.limit
        };
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            data,
            pagination: PageMeta::new(request, total),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, quantity: i64) -> SaleLineInput {
        SaleLineInput {
            product_id: product_id.to_string(),
            quantity,
            unit_price: Money::from_minor(25_000),
            discount: Money::zero(),
        }
    }

    fn sale(items: Vec<SaleLineInput>) -> SaleInput {
        SaleInput {
            items,
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            subtotal: Money::zero(),
            tax_amount: Money::zero(),
            discount_amount: Money::zero(),
            total: Money::zero(),
            notes: None,
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = sale(vec![]).validate().unwrap_err();
        assert_eq!(err.field(), "items");
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        assert!(sale(vec![line("p-1", 0)]).validate().is_err());
        assert!(sale(vec![line("p-1", -2)]).validate().is_err());
        assert!(sale(vec![line("p-1", 2)]).validate().is_ok());
    }

    #[test]
    fn test_oversized_cart_rejected() {
        let items = (0..=MAX_CART_ITEMS).map(|i| line(&format!("p-{}", i), 1)).collect();
        assert!(sale(items).validate().is_err());
    }

    #[test]
    fn test_product_ids_are_distinct_and_quantities_summed() {
        let input = sale(vec![line("p-1", 2), line("p-2", 1), line("p-1", 3)]);
        assert_eq!(input.product_ids(), vec!["p-1", "p-2"]);
        assert_eq!(input.requested_quantity("p-1"), 5);
    }

    #[test]
    fn test_adjustment_deserializes_type() {
        let input: StockAdjustmentInput = serde_json::from_str(
            r#"{"productId":"p-1","type":"OUT","quantity":60,"reason":"Rusak"}"#,
        )
        .unwrap();
        assert_eq!(input.kind, AdjustmentType::Out);
        assert_eq!(MovementType::from(input.kind), MovementType::Out);

        let sale_type = serde_json::from_str::<StockAdjustmentInput>(
            r#"{"productId":"p-1","type":"SALE","quantity":1,"reason":"x"}"#,
        );
        assert!(sale_type.is_err());
    }

    #[test]
    fn test_adjustment_requires_reason() {
        let input = StockAdjustmentInput {
            product_id: "p-1".to_string(),
            kind: AdjustmentType::In,
            quantity: 5,
            reason: "  ".to_string(),
            notes: None,
        };
        assert_eq!(input.validate().unwrap_err().field(), "reason");
    }

    #[test]
    fn test_page_request() {
        let page = PageRequest::default();
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset(), 0);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
        assert!(PageRequest::new(0, 10).validate().is_err());
        assert!(PageRequest::new(1, 101).validate().is_err());
        assert!(PageRequest::new(1, 100).validate().is_ok());
    }

    #[test]
    fn test_page_meta_total_pages() {
        assert_eq!(PageMeta::new(PageRequest::new(1, 10), 0).total_pages, 0);
        assert_eq!(PageMeta::new(PageRequest::new(1, 10), 10).total_pages, 1);
        assert_eq!(PageMeta::new(PageRequest::new(1, 10), 11).total_pages, 2);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some(" 899 ".to_string())), Some("899"));
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&None), None);
    }
}
