//! # Domain Types
//!
//! Core domain types used throughout Kasir POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Transaction   │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  number         │   │  product_id     │       │
//! │  │  stock ≥ 0      │   │  status         │   │  type, quantity │       │
//! │  │  category_id    │   │  items[]        │   │  reason         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Reference data: Category, Supplier, Customer, User, BarcodeLog        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4, immutable, used for relations
//! - A business key where one exists (sku, transaction_number, username)
//!
//! ## Soft Delete
//! Nothing here is ever hard-deleted. `is_active = false` hides a record
//! from default listings while keeping history (sales, movements) intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Enums
// =============================================================================

/// Role of a logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Manager,
    Cashier,
}

impl Role {
    /// Whether this role may edit the catalogue and adjust stock.
    pub fn can_manage_inventory(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Cashier => "CASHIER",
        }
    }
}

/// Lifecycle status of a sale.
///
/// Only `Completed` is produced today: checkout has no authorize-then-capture
/// step and there is no void/refund path. The other variants exist so that
/// rows written by other tools still decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TransactionStatus {
    Completed,
    Pending,
    Cancelled,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Cancelled => "CANCELLED",
            TransactionStatus::Refunded => "REFUNDED",
        }
    }

    /// Indonesian label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "Selesai",
            TransactionStatus::Pending => "Tertunda",
            TransactionStatus::Cancelled => "Dibatalkan",
            TransactionStatus::Refunded => "Dikembalikan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentStatus {
    Paid,
    Pending,
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    Debit,
    Credit,
    Qris,
    EWallet,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Debit => "DEBIT",
            PaymentMethod::Credit => "CREDIT",
            PaymentMethod::Qris => "QRIS",
            PaymentMethod::EWallet => "E_WALLET",
            PaymentMethod::Transfer => "TRANSFER",
        }
    }

    /// Indonesian label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Tunai",
            PaymentMethod::Debit => "Kartu Debit",
            PaymentMethod::Credit => "Kartu Kredit",
            PaymentMethod::Qris => "QRIS",
            PaymentMethod::EWallet => "E-Wallet",
            PaymentMethod::Transfer => "Transfer Bank",
        }
    }
}

/// Kind of entry in the stock ledger.
///
/// ## Effect on Stock
/// ```text
/// IN          stock + quantity
/// OUT         stock - quantity
/// SALE        stock - quantity   (written by checkout only)
/// ADJUSTMENT  stock = quantity   (absolute level, not a delta)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum MovementType {
    In,
    Out,
    Sale,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Sale => "SALE",
            MovementType::Adjustment => "ADJUSTMENT",
        }
    }
}

/// Stock level classification for inventory reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// Classifies a stock level against the product's minimum.
    pub fn classify(stock: i64, min_stock: i64) -> Self {
        if stock <= 0 {
            StockStatus::OutOfStock
        } else if stock <= min_stock {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "Tersedia",
            StockStatus::LowStock => "Stok Menipis",
            StockStatus::OutOfStock => "Habis",
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Reference Data
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryWithCount {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplierWithCount {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub supplier: Supplier,
    pub product_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Unique when present.
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// `{ id, name }` pair used for joined relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    /// Stock Keeping Unit, unique.
    pub sku: String,
    /// EAN-13 / UPC etc., unique when present.
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost: Money,
    /// On-hand quantity. Never negative; kept in step with the movement ledger.
    pub stock: i64,
    pub min_stock: i64,
    pub max_stock: Option<i64>,
    /// Selling unit ("pcs", "kg", "box").
    pub unit: String,
    pub category_id: String,
    pub supplier_id: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `quantity` units can be sold right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && self.stock >= quantity
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.stock, self.min_stock)
    }

    /// Value of the stock on hand at cost.
    pub fn stock_value(&self) -> Money {
        self.cost.multiply_quantity(self.stock)
    }
}

/// Product with its category and supplier joined in.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<NamedRef>,
    pub supplier: Option<NamedRef>,
    pub stock_status: StockStatus,
}

// =============================================================================
// Transaction
// =============================================================================

/// A sale. Created once at checkout and never edited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    /// Human-facing number printed on the receipt, e.g. `TRX202610161430050427`.
    pub transaction_number: String,
    pub status: TransactionStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub total: Money,
    pub notes: Option<String>,
    pub customer_id: Option<String>,
    /// Cashier.
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line of a sale.
///
/// Uses the snapshot pattern: name and SKU are frozen at checkout so the
/// receipt survives later product renames.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    /// Always `quantity × unit_price`.
    pub total_price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Transaction with items, customer and cashier joined in.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
    pub customer: Option<NamedRef>,
    pub cashier: NamedRef,
}

/// Row for transaction listings (no items).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionSummary {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub customer: Option<NamedRef>,
    pub cashier: NamedRef,
    pub item_count: i64,
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Append-only record of one change to a product's stock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Positive magnitude as provided; see [`MovementType`] for the effect.
    pub quantity: i64,
    pub reason: String,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Movement with the acting user and the product joined in.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockMovementDetail {
    #[serde(flatten)]
    pub movement: StockMovement,
    pub user: NamedRef,
    pub product: ProductRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductRef {
    pub id: String,
    pub name: String,
    pub sku: String,
}

/// Result of a stock adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockAdjustment {
    pub product: ProductDetail,
    pub movement: StockMovementDetail,
}

// =============================================================================
// Barcode Log
// =============================================================================

/// One barcode scan at the point of sale, found or not.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BarcodeLog {
    pub id: String,
    pub barcode: String,
    pub product_id: Option<String>,
    pub user_id: String,
    pub found: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_status_classify() {
        assert_eq!(StockStatus::classify(0, 10), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(10, 10), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(11, 10), StockStatus::InStock);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::EWallet).unwrap(),
            "\"E_WALLET\""
        );
        assert_eq!(
            serde_json::to_string(&MovementType::Adjustment).unwrap(),
            "\"ADJUSTMENT\""
        );
        let status: TransactionStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(status, TransactionStatus::Completed);
        assert_eq!(PaymentMethod::EWallet.as_str(), "E_WALLET");
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_manage_inventory());
        assert!(Role::Manager.can_manage_inventory());
        assert!(!Role::Cashier.can_manage_inventory());
    }

    #[test]
    fn test_movement_serializes_type_field() {
        let movement = StockMovement {
            id: "m-1".to_string(),
            product_id: "p-1".to_string(),
            user_id: "u-1".to_string(),
            movement_type: MovementType::Sale,
            quantity: 2,
            reason: "Penjualan TRX-1".to_string(),
            notes: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&movement).unwrap();
        assert_eq!(value["type"], "SALE");
        assert_eq!(value["productId"], "p-1");
    }

    #[test]
    fn test_user_hash_not_serialized() {
        let user = User {
            id: "u-1".to_string(),
            username: "kasir1".to_string(),
            name: "Kasir Satu".to_string(),
            role: Role::Cashier,
            password_hash: "$argon2id$secret".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["role"], "CASHIER");
    }
}
