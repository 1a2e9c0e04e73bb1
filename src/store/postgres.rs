//! PostgreSQL Ledger Store
//!
//! Balance updates are a single `UPDATE ... SET balance = balance + $2`, so the
//! read-modify-write happens inside the engine under the row lock. Transactions
//! are sqlx [`Transaction`]s, which roll back when dropped without commit.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{LedgerQueries, LedgerStore, LedgerTx};
use crate::core_types::{AccountId, EntryId, TransferId};
use crate::error::LedgerError;
use crate::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, Page, Transfer,
};

const ACCOUNT_COLUMNS: &str = "id, owner, balance, currency, created_at";
const ENTRY_COLUMNS: &str = "id, account_id, amount, created_at";
const TRANSFER_COLUMNS: &str = "id, from_account_id, to_account_id, amount, created_at";

/// Ledger store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, LedgerError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn create_account(&self, arg: CreateAccountParams) -> Result<Account, LedgerError> {
        arg.validate()?;
        let sql = format!(
            "INSERT INTO accounts (owner, balance, currency) VALUES ($1, $2, $3) RETURNING {ACCOUNT_COLUMNS}"
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(&arg.owner)
            .bind(arg.balance)
            .bind(&arg.currency)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(
            account_id = account.id,
            owner = %account.owner,
            currency = %account.currency,
            "Account created"
        );
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| LedgerError::not_found("account", id))
    }

    async fn get_entry(&self, id: EntryId) -> Result<Entry, LedgerError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = $1");
        sqlx::query_as::<_, Entry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| LedgerError::not_found("entry", id))
    }

    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, LedgerError> {
        let sql = format!("SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = $1");
        sqlx::query_as::<_, Transfer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| LedgerError::not_found("transfer", id))
    }

    async fn list_accounts(&self, owner: &str, page: Page) -> Result<Vec<Account>, LedgerError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE owner = $1 ORDER BY id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, Account>(&sql)
            .bind(owner)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_entries(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Entry>, LedgerError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE account_id = $1 ORDER BY id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, Entry>(&sql)
            .bind(account_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_transfers(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Transfer>, LedgerError> {
        let sql = format!(
            r#"SELECT {TRANSFER_COLUMNS} FROM transfers
               WHERE from_account_id = $1 OR to_account_id = $1
               ORDER BY id LIMIT $2 OFFSET $3"#
        );
        let rows = sqlx::query_as::<_, Transfer>(&sql)
            .bind(account_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Open PostgreSQL transaction
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerQueries for PgTx {
    async fn create_transfer(
        &mut self,
        arg: CreateTransferParams,
    ) -> Result<Transfer, LedgerError> {
        let sql = format!(
            "INSERT INTO transfers (from_account_id, to_account_id, amount) VALUES ($1, $2, $3) RETURNING {TRANSFER_COLUMNS}"
        );
        let transfer = sqlx::query_as::<_, Transfer>(&sql)
            .bind(arg.from_account_id)
            .bind(arg.to_account_id)
            .bind(arg.amount)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(transfer)
    }

    async fn create_entry(&mut self, arg: CreateEntryParams) -> Result<Entry, LedgerError> {
        let sql = format!(
            "INSERT INTO entries (account_id, amount) VALUES ($1, $2) RETURNING {ENTRY_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, Entry>(&sql)
            .bind(arg.account_id)
            .bind(arg.amount)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(entry)
    }

    async fn add_account_balance(
        &mut self,
        arg: AddAccountBalanceParams,
    ) -> Result<Account, LedgerError> {
        let sql = format!(
            "UPDATE accounts SET balance = balance + $2 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(arg.account_id)
            .bind(arg.amount)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| LedgerError::not_found("account", arg.account_id))
    }

    async fn get_account(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| LedgerError::not_found("account", id))
    }

    async fn get_entry(&mut self, id: EntryId) -> Result<Entry, LedgerError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = $1");
        sqlx::query_as::<_, Entry>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| LedgerError::not_found("entry", id))
    }

    async fn get_transfer(&mut self, id: TransferId) -> Result<Transfer, LedgerError> {
        let sql = format!("SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = $1");
        sqlx::query_as::<_, Transfer>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| LedgerError::not_found("transfer", id))
    }
}

#[async_trait]
impl LedgerTx for PgTx {
    fn queries(&mut self) -> &mut dyn LedgerQueries {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
