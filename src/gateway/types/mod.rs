//! Gateway types module
//!
//! ## Input Types
//! - [`CreateAccountRequest`], [`TransferRequest`]: JSON bodies
//! - [`ListAccountsQuery`], [`PageQuery`]: query strings
//! - [`ValidatedJson`], [`ValidatedQuery`]: extractors that run `validator` rules
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`]: Error responses, convertible from [`crate::LedgerError`]

pub mod request;
pub mod response;

pub use request::{
    CreateAccountRequest, ListAccountsQuery, PageQuery, TransferRequest, ValidatedJson,
    ValidatedQuery,
};
pub use response::{ApiError, ApiResponse, ApiResult, created, error_codes, ok};
