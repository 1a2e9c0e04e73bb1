//! HTTP handlers, one module per resource

pub mod account;
pub mod health;
pub mod transfer;

pub use account::{
    create_account, get_account, list_account_transfers, list_accounts, list_entries,
};
pub use health::{HealthResponse, health_check};
pub use transfer::{create_transfer, get_transfer};

use super::types::ApiError;

/// Path IDs are positive
pub(super) fn require_id(id: i64) -> Result<(), ApiError> {
    if id < 1 {
        return Err(ApiError::bad_request(format!("Invalid ID: {}", id)));
    }
    Ok(())
}
