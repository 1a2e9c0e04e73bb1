//! Transfer Coordinator
//!
//! Moves money between two accounts as one all-or-nothing unit: one transfer
//! row, a debit entry, a credit entry and two balance deltas, all inside a
//! single [`run_in_transaction`] scope.
//!
//! # Lock order
//!
//! Balance deltas are applied to the lower account id first, whichever side
//! is the source. Every transfer therefore acquires its two row locks in the
//! same global order, so two transfers can never wait on each other in a cycle.
//! No application-level lock is taken; the storage engine's row locks are the
//! only blocking point.

use std::future::Future;
use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::error::{LedgerError, ValidationError};
use crate::models::{
    Account, AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, TransferParams,
    TransferResult,
};
use crate::store::{LedgerQueries, LedgerStore, run_in_transaction};

/// Knobs that change what the coordinator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPolicy {
    /// Fail the transfer (and roll back) if the source balance would go negative
    pub reject_overdraft: bool,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            reject_overdraft: true,
        }
    }
}

/// Reject caller errors before any storage access
pub fn validate_transfer(params: &TransferParams) -> Result<(), ValidationError> {
    if params.from_account_id == params.to_account_id {
        return Err(ValidationError::SameAccount);
    }
    if params.amount <= 0 {
        return Err(ValidationError::NonPositiveAmount);
    }
    for id in [params.from_account_id, params.to_account_id] {
        if id <= 0 {
            return Err(ValidationError::InvalidAccountId(id));
        }
    }
    Ok(())
}

/// Transfer Coordinator - atomic money movement over a [`LedgerStore`]
pub struct TransferCoordinator<S: LedgerStore + ?Sized> {
    store: Arc<S>,
    policy: TransferPolicy,
}

impl<S: LedgerStore + ?Sized> TransferCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_policy(store, TransferPolicy::default())
    }

    pub fn with_policy(store: Arc<S>, policy: TransferPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Transfer `amount` from one account to another.
    ///
    /// Not idempotent: every successful call records a new transfer. Any
    /// failure rolls the whole unit back and is returned unchanged; nothing is
    /// retried here.
    pub async fn transfer_money(
        &self,
        params: TransferParams,
    ) -> Result<TransferResult, LedgerError> {
        validate_transfer(&params)?;

        let span = info_span!(
            "transfer",
            trace_id = %Uuid::new_v4(),
            from = params.from_account_id,
            to = params.to_account_id,
            amount = params.amount,
        );
        let reject_overdraft = self.policy.reject_overdraft;

        let result = run_in_transaction(self.store.as_ref(), move |q| {
            Box::pin(execute_transfer(q, params, reject_overdraft))
        })
        .instrument(span.clone())
        .await;

        match &result {
            Ok(r) => info!(
                parent: &span,
                transfer_id = r.transfer.id,
                from_balance = r.from_account.balance,
                to_balance = r.to_account.balance,
                "Transfer committed"
            ),
            Err(e) => warn!(parent: &span, code = e.code(), error = %e, "Transfer failed"),
        }
        result
    }

    /// [`transfer_money`](Self::transfer_money) that gives up when `cancel`
    /// completes first. The in-flight transaction is dropped, which rolls it
    /// back, and [`LedgerError::Cancelled`] is returned.
    pub async fn transfer_money_until<C>(
        &self,
        params: TransferParams,
        cancel: C,
    ) -> Result<TransferResult, LedgerError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            result = self.transfer_money(params) => result,
            _ = cancel => {
                warn!(
                    from = params.from_account_id,
                    to = params.to_account_id,
                    "Transfer cancelled by caller, transaction rolled back"
                );
                Err(LedgerError::Cancelled)
            }
        }
    }
}

/// The unit of work run inside the transaction
async fn execute_transfer(
    q: &mut dyn LedgerQueries,
    params: TransferParams,
    reject_overdraft: bool,
) -> Result<TransferResult, LedgerError> {
    let TransferParams {
        from_account_id: from,
        to_account_id: to,
        amount,
    } = params;

    let transfer = q
        .create_transfer(CreateTransferParams {
            from_account_id: from,
            to_account_id: to,
            amount,
        })
        .await?;

    let from_entry = q
        .create_entry(CreateEntryParams {
            account_id: from,
            amount: -amount,
        })
        .await?;

    let to_entry = q
        .create_entry(CreateEntryParams {
            account_id: to,
            amount,
        })
        .await?;

    // Lower id first, regardless of direction
    let (from_account, to_account) = if from < to {
        let (from_account, to_account) = add_money(q, from, -amount, to, amount).await?;
        (from_account, to_account)
    } else {
        let (to_account, from_account) = add_money(q, to, amount, from, -amount).await?;
        (from_account, to_account)
    };

    if reject_overdraft && from_account.balance < 0 {
        debug!(
            account_id = from,
            balance = from_account.balance,
            "Debit would overdraw source account"
        );
        return Err(LedgerError::InsufficientBalance { account_id: from });
    }

    Ok(TransferResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}

/// Apply two balance deltas in the given order
async fn add_money(
    q: &mut dyn LedgerQueries,
    first_id: i64,
    first_amount: i64,
    second_id: i64,
    second_amount: i64,
) -> Result<(Account, Account), LedgerError> {
    let first = q
        .add_account_balance(AddAccountBalanceParams {
            account_id: first_id,
            amount: first_amount,
        })
        .await?;
    let second = q
        .add_account_balance(AddAccountBalanceParams {
            account_id: second_id,
            amount: second_amount,
        })
        .await?;
    Ok((first, second))
}
