//! Ledger Store
//!
//! Durable state for accounts, entries and transfers.
//!
//! # Contract
//!
//! - [`LedgerStore`]: plain single-row create/read/list operations plus
//!   [`LedgerStore::begin`] to open a transaction.
//! - [`LedgerQueries`]: the transaction-bound operations a unit of work may
//!   issue. None of their effects are visible to other callers until commit.
//! - [`run_in_transaction`]: scoped transaction. Commits on `Ok`, rolls back on
//!   `Err`, and rolls back on panic or cancellation because every
//!   [`LedgerTx`] rolls back when dropped unfinished.
//!
//! # Backends
//!
//! - [`PgLedgerStore`]: PostgreSQL via sqlx
//! - [`MemoryLedgerStore`]: in-process tables with per-row locks

pub mod memory;
#[cfg(test)]
pub mod mock;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::core_types::{AccountId, EntryId, TransferId};
use crate::error::LedgerError;
use crate::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, Page, Transfer,
};

/// Operations bound to one open transaction
#[async_trait]
pub trait LedgerQueries: Send {
    async fn create_transfer(&mut self, arg: CreateTransferParams)
    -> Result<Transfer, LedgerError>;

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, LedgerError>;

    /// Atomic `balance = balance + amount` returning the post-update row.
    ///
    /// Takes the account's row lock and holds it until the transaction ends.
    async fn add_account_balance(
        &mut self,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, LedgerError>;

    async fn get_account(&mut self, id: AccountId) -> Result<Account, LedgerError>;

    async fn get_entry(&mut self, id: EntryId) -> Result<Entry, LedgerError>;

    async fn get_transfer(&mut self, id: TransferId) -> Result<Transfer, LedgerError>;
}

/// An open transaction. Dropping it without `commit` rolls it back.
#[async_trait]
pub trait LedgerTx: Send {
    fn queries(&mut self) -> &mut dyn LedgerQueries;

    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError>;
}

/// Store capability consumed by the coordinator and the gateway
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError>;

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, LedgerError>;

    async fn get_account(&self, id: AccountId) -> Result<Account, LedgerError>;

    async fn get_entry(&self, id: EntryId) -> Result<Entry, LedgerError>;

    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, LedgerError>;

    async fn list_accounts(&self, owner: &str, page: Page) -> Result<Vec<Account>, LedgerError>;

    async fn list_entries(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Entry>, LedgerError>;

    /// Transfers where the account is either source or destination
    async fn list_transfers(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Transfer>, LedgerError>;

    async fn health_check(&self) -> Result<(), LedgerError>;
}

/// Run `work` inside one transaction.
///
/// - `Ok` from `work`: commit, then return the value
/// - `Err` from `work`: roll back, return the error unchanged, or
///   [`LedgerError::Rollback`] carrying both errors if the rollback failed
/// - panic or dropped future: the transaction handle is dropped and rolls back
pub async fn run_in_transaction<S, T, F>(store: &S, work: F) -> Result<T, LedgerError>
where
    S: LedgerStore + ?Sized,
    T: Send,
    F: for<'t> FnOnce(&'t mut dyn LedgerQueries) -> BoxFuture<'t, Result<T, LedgerError>> + Send,
{
    let mut tx = store.begin().await?;

    let outcome = work(tx.queries()).await;

    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => match tx.rollback().await {
            Ok(()) => Err(err),
            Err(rb_err) => {
                tracing::error!(error = %err, rollback_error = %rb_err, "Rollback failed");
                Err(LedgerError::Rollback {
                    cause: Box::new(err),
                    rollback: Box::new(rb_err),
                })
            }
        },
    }
}
