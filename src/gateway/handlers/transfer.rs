//! Transfer handlers

use std::sync::Arc;

use axum::extract::{Path, State};

use super::require_id;
use super::super::state::AppState;
use super::super::types::{ApiResult, TransferRequest, ValidatedJson, ok};
use crate::core_types::{AccountId, TransferId};
use crate::error::{LedgerError, ValidationError};
use crate::models::{Transfer, TransferParams, TransferResult};

/// Transfer money between two accounts
///
/// POST /api/v1/transfers
///
/// Both accounts must exist and be held in the declared currency.
#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer committed", body = TransferResult, content_type = "application/json"),
        (status = 400, description = "Invalid parameters or currency mismatch"),
        (status = 404, description = "Account not found"),
        (status = 422, description = "Insufficient balance"),
        (status = 503, description = "Transfer cancelled")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<TransferRequest>,
) -> ApiResult<TransferResult> {
    check_account_currency(&state, req.from_account_id, &req.currency).await?;
    check_account_currency(&state, req.to_account_id, &req.currency).await?;

    let params = TransferParams::new(req.from_account_id, req.to_account_id, req.amount);
    ok(state.transfers.transfer_money(params).await?)
}

/// GET /api/v1/transfers/{id}
#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}",
    params(("id" = i64, Path, description = "Transfer ID")),
    responses(
        (status = 200, description = "Transfer", body = Transfer, content_type = "application/json"),
        (status = 404, description = "Transfer not found")
    ),
    tag = "Transfer"
)]
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TransferId>,
) -> ApiResult<Transfer> {
    require_id(id)?;
    ok(state.store.get_transfer(id).await?)
}

async fn check_account_currency(
    state: &AppState,
    account_id: AccountId,
    currency: &str,
) -> Result<(), LedgerError> {
    let account = state.store.get_account(account_id).await?;
    if account.currency != currency {
        return Err(ValidationError::CurrencyMismatch {
            account_id,
            expected: currency.to_string(),
            actual: account.currency,
        }
        .into());
    }
    Ok(())
}
