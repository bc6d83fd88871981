use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::loyalty::error::LoyaltyError;
use crate::loyalty::models::{
    CounterProgress, LoyaltyAccount, LoyaltyTransaction, ServiceCounter, TransactionKind,
};
use crate::models::ServiceType;

const ACCOUNT_COLUMNS: &str = "id, client_id, tenant_id, total_points, tier, created_at, updated_at";

const COUNTER_PROGRESS_SQL: &str = "SELECT lsc.id, lsc.service_type_id, st.name AS service_name, \
     lsc.count, st.free_after_threshold, lsc.last_reset \
     FROM loyalty_service_counters lsc \
     JOIN service_types st ON lsc.service_type_id = st.id \
     WHERE lsc.account_id = $1 \
     ORDER BY st.name";

/// Repository for loyalty account rows
#[derive(Clone)]
pub struct AccountsRepository {
    pool: PgPool,
}

impl AccountsRepository {
    /// Create a new AccountsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn upsert_sql() -> String {
        format!(
            "INSERT INTO loyalty_accounts (id, client_id, tenant_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (client_id, tenant_id) \
             DO UPDATE SET updated_at = NOW() \
             RETURNING {}",
            ACCOUNT_COLUMNS
        )
    }

    /// Get or create the account for a (client, tenant) pair
    ///
    /// The single upsert statement is race-safe under the UNIQUE natural
    /// key: concurrent calls for the same pair all return the same row.
    pub async fn get_or_create(
        &self,
        client_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<LoyaltyAccount, LoyaltyError> {
        let account = sqlx::query_as::<_, LoyaltyAccount>(&Self::upsert_sql())
            .bind(Uuid::new_v4())
            .bind(client_id)
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get or create the account inside the caller's transaction
    ///
    /// The upsert also acquires the row lock, which serializes every
    /// mutating path for the same account until the transaction ends.
    pub async fn upsert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        client_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<LoyaltyAccount, LoyaltyError> {
        let account = sqlx::query_as::<_, LoyaltyAccount>(&Self::upsert_sql())
            .bind(Uuid::new_v4())
            .bind(client_id)
            .bind(tenant_id)
            .fetch_one(&mut **tx)
            .await?;

        Ok(account)
    }

    /// Lock an existing account row for the rest of the transaction
    pub async fn lock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        client_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<LoyaltyAccount>, LoyaltyError> {
        let account = sqlx::query_as::<_, LoyaltyAccount>(&format!(
            "SELECT {} FROM loyalty_accounts \
             WHERE client_id = $1 AND tenant_id = $2 \
             FOR UPDATE",
            ACCOUNT_COLUMNS
        ))
        .bind(client_id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(account)
    }

    /// Apply a signed points delta inside the caller's transaction
    ///
    /// Always paired with a ledger append in the same transaction so the
    /// balance and the transaction log cannot drift apart.
    pub async fn apply_delta(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account_id: Uuid,
        delta: i32,
    ) -> Result<LoyaltyAccount, LoyaltyError> {
        let account = sqlx::query_as::<_, LoyaltyAccount>(&format!(
            "UPDATE loyalty_accounts \
             SET total_points = total_points + $1, updated_at = NOW() \
             WHERE id = $2 \
             RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(delta)
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(LoyaltyError::AccountNotFound)?;

        Ok(account)
    }

    /// Find an account by its (client, tenant) pair without creating it
    pub async fn find_by_client(
        &self,
        client_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<LoyaltyAccount>, LoyaltyError> {
        let account = sqlx::query_as::<_, LoyaltyAccount>(&format!(
            "SELECT {} FROM loyalty_accounts WHERE client_id = $1 AND tenant_id = $2",
            ACCOUNT_COLUMNS
        ))
        .bind(client_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Find all of a client's accounts across tenants
    pub async fn find_all_for_client(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<LoyaltyAccount>, LoyaltyError> {
        let accounts = sqlx::query_as::<_, LoyaltyAccount>(&format!(
            "SELECT {} FROM loyalty_accounts WHERE client_id = $1 ORDER BY created_at",
            ACCOUNT_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }
}

/// Repository for per-service-type progress counters
#[derive(Clone)]
pub struct CountersRepository {
    pool: PgPool,
}

impl CountersRepository {
    /// Create a new CountersRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock or create the counter row for (account, service type)
    ///
    /// New counters start at 0; existing ones are returned locked for the
    /// rest of the transaction.
    pub async fn lock_or_create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account_id: Uuid,
        service_type_id: Uuid,
    ) -> Result<ServiceCounter, LoyaltyError> {
        let counter = sqlx::query_as::<_, ServiceCounter>(
            "INSERT INTO loyalty_service_counters (id, account_id, service_type_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (account_id, service_type_id) \
             DO UPDATE SET updated_at = NOW() \
             RETURNING id, account_id, service_type_id, count, last_reset, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(service_type_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(counter)
    }

    /// Persist an incremented count inside the caller's transaction
    pub async fn set_count(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        counter_id: Uuid,
        count: i32,
    ) -> Result<ServiceCounter, LoyaltyError> {
        let counter = sqlx::query_as::<_, ServiceCounter>(
            "UPDATE loyalty_service_counters \
             SET count = $1, updated_at = NOW() \
             WHERE id = $2 \
             RETURNING id, account_id, service_type_id, count, last_reset, created_at, updated_at",
        )
        .bind(count)
        .bind(counter_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(counter)
    }

    /// Reset the counter to 0 after a free visit, stamping the reset time
    pub async fn reset(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        counter_id: Uuid,
    ) -> Result<ServiceCounter, LoyaltyError> {
        let counter = sqlx::query_as::<_, ServiceCounter>(
            "UPDATE loyalty_service_counters \
             SET count = 0, last_reset = NOW(), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, account_id, service_type_id, count, last_reset, created_at, updated_at",
        )
        .bind(counter_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(counter)
    }

    /// All counters for an account, joined with their service types
    pub async fn progress_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<CounterProgress>, LoyaltyError> {
        let counters = sqlx::query_as::<_, CounterProgress>(COUNTER_PROGRESS_SQL)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(counters)
    }

    /// Same as `progress_for_account`, but inside the caller's transaction
    /// so the orchestrator's response reflects the state it just wrote
    pub async fn progress_for_account_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account_id: Uuid,
    ) -> Result<Vec<CounterProgress>, LoyaltyError> {
        let counters = sqlx::query_as::<_, CounterProgress>(COUNTER_PROGRESS_SQL)
            .bind(account_id)
            .fetch_all(&mut **tx)
            .await?;

        Ok(counters)
    }
}

/// Append-only repository for the points ledger
#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Create a new LedgerRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one ledger entry inside the caller's transaction
    ///
    /// `points` is the signed delta: positive for earn, negative for redeem.
    pub async fn append(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account_id: Uuid,
        kind: TransactionKind,
        points: i32,
        description: &str,
        reference: Option<(Uuid, &str)>,
    ) -> Result<LoyaltyTransaction, LoyaltyError> {
        let (reference_id, reference_type) = match reference {
            Some((ref_id, ref_type)) => (Some(ref_id), Some(ref_type)),
            None => (None, None),
        };

        let transaction = sqlx::query_as::<_, LoyaltyTransaction>(
            "INSERT INTO loyalty_transactions \
             (id, account_id, kind, points, description, reference_id, reference_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, account_id, kind, points, description, reference_id, reference_type, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(kind)
        .bind(points)
        .bind(description)
        .bind(reference_id)
        .bind(reference_type)
        .fetch_one(&mut **tx)
        .await?;

        Ok(transaction)
    }

    /// Most recent ledger entries for an account, newest first
    pub async fn recent_for_account(
        &self,
        account_id: Uuid,
        limit: i64,
    ) -> Result<Vec<LoyaltyTransaction>, LoyaltyError> {
        let transactions = sqlx::query_as::<_, LoyaltyTransaction>(
            "SELECT id, account_id, kind, points, description, reference_id, reference_type, created_at \
             FROM loyalty_transactions \
             WHERE account_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }
}

/// Read-side catalog lookups, always scoped to the calling tenant
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

const SERVICE_TYPE_SQL: &str = "SELECT id, tenant_id, name, description, price, points_awarded, \
     free_after_threshold, is_active, created_at, updated_at \
     FROM service_types \
     WHERE id = $1 AND tenant_id = $2";

impl CatalogRepository {
    /// Create a new CatalogRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a service type scoped to the calling tenant
    ///
    /// Returns None when the id does not exist or belongs to another tenant.
    pub async fn find_for_tenant(
        &self,
        service_type_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<ServiceType>, sqlx::Error> {
        let service_type = sqlx::query_as::<_, ServiceType>(SERVICE_TYPE_SQL)
            .bind(service_type_id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(service_type)
    }

    /// Same lookup inside the caller's transaction, so the orchestrator
    /// reads the catalog and writes its effects in one atomic unit
    pub async fn find_for_tenant_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        service_type_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<ServiceType>, sqlx::Error> {
        let service_type = sqlx::query_as::<_, ServiceType>(SERVICE_TYPE_SQL)
            .bind(service_type_id)
            .bind(tenant_id)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(service_type)
    }
}
