//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kasir                                  │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<Json<T>, ApiError>                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ValidationError ──► CoreError ──► DbError ──┐                          │
//! │                                              ▼                          │
//! │                                          ApiError ──► IntoResponse      │
//! │                                                                         │
//! │  HTTP/1.1 400 Bad Request                                               │
//! │  { "error": "Stok Indomie Goreng tidak cukup ...",                     │
//! │    "code": "INSUFFICIENT_STOCK" }                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages are Indonesian because they are shown to cashiers as-is.
//! Internal failures are logged and answered with a generic message.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use kasir_core::{CoreError, ValidationError};
use kasir_db::DbError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned from handlers.
///
/// ## Serialization
/// ```json
/// { "error": "Produk tidak ditemukan", "code": "NOT_FOUND" }
/// ```
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or invalid session (401)
    Unauthorized,

    /// Role not allowed (403)
    Forbidden,

    /// Field validation failed (400)
    ValidationError,

    /// Malformed body or query string (400)
    InvalidInput,

    /// Cart references missing or inactive products (400)
    InvalidItems,

    /// Sale exceeds stock on hand (400)
    InsufficientStock,

    /// Stock adjustment below zero (400)
    NegativeStock,

    /// Client totals disagree with the lines (400)
    InvalidTotals,

    /// Resource not found (404)
    NotFound,

    /// Duplicate value or dependent rows (409)
    Conflict,

    /// Internal server error (500)
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::ValidationError
            | ErrorCode::InvalidInput
            | ErrorCode::InvalidItems
            | ErrorCode::InsufficientStock
            | ErrorCode::NegativeStock
            | ErrorCode::InvalidTotals => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: ErrorCode,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        ApiError::new(ErrorCode::Unauthorized, "Silakan login terlebih dahulu")
    }

    pub fn forbidden() -> Self {
        ApiError::new(
            ErrorCode::Forbidden,
            "Anda tidak memiliki akses untuk melakukan aksi ini",
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidInput, message)
    }

    /// Logs `cause` and returns the generic 500 error.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "Internal server error");
        ApiError::new(ErrorCode::InternalError, "Terjadi kesalahan pada server")
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            code: self.code,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Indonesian name of an entity reported by the database layer.
fn entity_label(entity: &str) -> &str {
    match entity {
        "Product" => "Produk",
        "Category" => "Kategori",
        "Supplier" => "Supplier",
        "Customer" => "Pelanggan",
        "Transaction" => "Transaksi",
        "User" => "Pengguna",
        "StockMovement" => "Riwayat stok",
        _ => "Data",
    }
}

fn field_label(field: &str) -> &str {
    match field {
        "sku" => "SKU",
        "barcode" => "Barcode",
        "email" => "Email",
        "username" => "Username",
        "name" => "Nama",
        other => other,
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::new(
                ErrorCode::NotFound,
                format!("{} tidak ditemukan", entity_label(&entity)),
            ),
            DbError::UniqueViolation { field, value } => {
                let message = if value == "unknown" {
                    format!("{} sudah digunakan", field_label(&field))
                } else {
                    format!("{} '{}' sudah digunakan", field_label(&field), value)
                };
                ApiError::new(ErrorCode::Conflict, message)
            }
            DbError::ForeignKeyViolation { message } => {
                warn!(%message, "Foreign key violation");
                ApiError::invalid_input("Referensi data tidak valid")
            }
            DbError::Conflict(detail) => {
                warn!(%detail, "Conflicting write rejected");
                ApiError::new(
                    ErrorCode::Conflict,
                    "Data sedang digunakan atau telah berubah, silakan periksa kembali",
                )
            }
            DbError::Core(core) => core.into(),
            other => ApiError::internal(other),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, "Produk tidak ditemukan")
            }
            CoreError::InvalidItems { .. } => ApiError::new(
                ErrorCode::InvalidItems,
                "Beberapa produk tidak ditemukan atau tidak aktif",
            ),
            CoreError::InsufficientStock {
                name,
                available,
                requested,
                ..
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Stok {} tidak cukup (tersedia {}, diminta {})",
                    name, available, requested
                ),
            ),
            CoreError::NegativeStock { current, .. } => ApiError::new(
                ErrorCode::NegativeStock,
                format!("Stok tidak boleh negatif (stok saat ini {})", current),
            ),
            CoreError::InvalidTotals { .. } => ApiError::new(
                ErrorCode::InvalidTotals,
                "Total transaksi tidak sesuai dengan item",
            ),
            CoreError::Validation(err) => err.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let message = match &err {
            ValidationError::Required { field } => format!("{} wajib diisi", field),
            ValidationError::TooLong { field, max } => {
                format!("{} maksimal {} karakter", field, max)
            }
            ValidationError::MustBePositive { field } => {
                format!("{} harus lebih dari 0", field)
            }
            ValidationError::OutOfRange { field, min, max } if *max == i64::MAX => {
                format!("{} minimal {}", field, min)
            }
            ValidationError::OutOfRange { field, min, max } => {
                format!("{} harus antara {} dan {}", field, min, max)
            }
            ValidationError::InvalidFormat { field, .. } => {
                format!("Format {} tidak valid", field)
            }
            ValidationError::Duplicate { field, value } => {
                return ApiError::new(
                    ErrorCode::Conflict,
                    format!("{} '{}' sudah digunakan", field_label(field), value),
                );
            }
        };
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected JSON body");
        ApiError::invalid_input("Format data tidak valid")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected query string");
        ApiError::invalid_input("Parameter tidak valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err: ApiError = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            name: "Indomie Goreng".to_string(),
            available: 3,
            requested: 5,
        }
        .into();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Stok Indomie Goreng tidak cukup (tersedia 3, diminta 5)");
    }

    #[test]
    fn test_db_errors_map_to_statuses() {
        let not_found: ApiError = DbError::not_found("Customer", "c-1").into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.message, "Pelanggan tidak ditemukan");

        let duplicate: ApiError = DbError::duplicate("sku", "IDM-001").into();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);
        assert_eq!(duplicate.message, "SKU 'IDM-001' sudah digunakan");

        let internal: ApiError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!internal.message.contains("disk"));
    }

    #[test]
    fn test_core_error_inside_db_error() {
        let err: ApiError = DbError::Core(CoreError::NegativeStock {
            current: 50,
            result: -10,
        })
        .into();
        assert_eq!(err.code, ErrorCode::NegativeStock);
    }

    #[test]
    fn test_validation_message() {
        let err: ApiError = ValidationError::Required {
            field: "reason".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "reason wajib diisi");
    }

    #[test]
    fn test_error_code_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_STOCK\"");
    }
}
