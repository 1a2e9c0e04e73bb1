//! Account handlers (create, get, list, per-account history)

use std::sync::Arc;

use axum::extract::{Path, State};

use super::require_id;
use super::super::state::AppState;
use super::super::types::{
    ApiResult, CreateAccountRequest, ListAccountsQuery, PageQuery, ValidatedJson,
    ValidatedQuery, created, ok,
};
use crate::core_types::AccountId;
use crate::models::{Account, CreateAccountParams, Entry, Transfer};

/// Open an account with zero balance
///
/// POST /api/v1/accounts
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = Account, content_type = "application/json"),
        (status = 400, description = "Empty owner or unsupported currency"),
        (status = 409, description = "Owner already has an account in this currency")
    ),
    tag = "Account"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateAccountRequest>,
) -> ApiResult<Account> {
    let account = state
        .store
        .create_account(CreateAccountParams {
            owner: req.owner,
            balance: 0,
            currency: req.currency,
        })
        .await?;
    created(account)
}

/// GET /api/v1/accounts/{id}
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account", body = Account, content_type = "application/json"),
        (status = 400, description = "Invalid account ID"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AccountId>,
) -> ApiResult<Account> {
    require_id(id)?;
    ok(state.store.get_account(id).await?)
}

/// GET /api/v1/accounts?owner=alice&page_id=1&page_size=5
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    params(ListAccountsQuery),
    responses(
        (status = 200, description = "Accounts of the owner, ordered by ID", body = Vec<Account>, content_type = "application/json"),
        (status = 400, description = "Invalid paging parameters")
    ),
    tag = "Account"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ListAccountsQuery>,
) -> ApiResult<Vec<Account>> {
    ok(state.store.list_accounts(&query.owner, query.page()?).await?)
}

/// GET /api/v1/accounts/{id}/entries?page_id=1&page_size=10
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/entries",
    params(("id" = i64, Path, description = "Account ID"), PageQuery),
    responses(
        (status = 200, description = "Entries of the account, ordered by ID", body = Vec<Entry>, content_type = "application/json"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account"
)]
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AccountId>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<Entry>> {
    require_id(id)?;
    state.store.get_account(id).await?;
    ok(state.store.list_entries(id, query.page()?).await?)
}

/// GET /api/v1/accounts/{id}/transfers?page_id=1&page_size=10
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/transfers",
    params(("id" = i64, Path, description = "Account ID"), PageQuery),
    responses(
        (status = 200, description = "Transfers in or out of the account", body = Vec<Transfer>, content_type = "application/json"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account"
)]
pub async fn list_account_transfers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AccountId>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<Vec<Transfer>> {
    require_id(id)?;
    state.store.get_account(id).await?;
    ok(state.store.list_transfers(id, query.page()?).await?)
}
