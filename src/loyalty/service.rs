use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::loyalty::{
    AccountsRepository, AccountSummary, AdjustPointsRequest, CardSummary, CatalogRepository,
    CountersRepository, LedgerRepository, LoyaltyAccount, LoyaltyError, ProcessServiceRequest,
    ServiceOutcome, ThresholdCounter, TransactionKind,
};
use crate::records::{NewServiceRecord, RecordsRepository};

/// Bounded retries for transactions aborted by serialization failures
const MAX_PROCESS_ATTEMPTS: u32 = 3;

/// Recent-transaction window for the staff card view
const STAFF_TRANSACTION_LIMIT: i64 = 50;

/// Recent-transaction window for the client card view
const CLIENT_TRANSACTION_LIMIT: i64 = 20;

/// Service for the loyalty ledger: accounts, counters, and orchestration
///
/// Every mutating operation runs in one database transaction and locks the
/// account row first, so same-account read-modify-write cycles never
/// interleave. Cross-account operations share nothing and run in parallel.
#[derive(Clone)]
pub struct LoyaltyService {
    pool: PgPool,
    accounts: AccountsRepository,
    counters: CountersRepository,
    ledger: LedgerRepository,
    catalog: CatalogRepository,
    records: RecordsRepository,
}

impl LoyaltyService {
    /// Create a new LoyaltyService
    pub fn new(
        pool: PgPool,
        accounts: AccountsRepository,
        counters: CountersRepository,
        ledger: LedgerRepository,
        catalog: CatalogRepository,
        records: RecordsRepository,
    ) -> Self {
        Self {
            pool,
            accounts,
            counters,
            ledger,
            catalog,
            records,
        }
    }

    /// Process a performed service through the loyalty cycle
    ///
    /// # Arguments
    /// * `tenant_id` - Tenant the staff member acts for
    /// * `staff_id` - Staff member who performed the service
    /// * `request` - Client, pet, and service type of the occurrence
    ///
    /// # Returns
    /// The outcome: updated account, counter progress, the created service
    /// record, whether the visit was free, the points earned, and a
    /// staff-facing status message
    ///
    /// Serialization conflicts are retried as a whole up to
    /// `MAX_PROCESS_ATTEMPTS` times before surfacing as `ConcurrencyConflict`.
    pub async fn process_service(
        &self,
        tenant_id: Uuid,
        staff_id: Uuid,
        request: ProcessServiceRequest,
    ) -> Result<ServiceOutcome, LoyaltyError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.process_service_once(tenant_id, staff_id, &request).await {
                Err(LoyaltyError::ConcurrencyConflict) if attempts < MAX_PROCESS_ATTEMPTS => {
                    tracing::warn!(
                        "Conflict processing service for client {}, attempt {}/{}",
                        request.client_id,
                        attempts,
                        MAX_PROCESS_ATTEMPTS
                    );
                }
                result => return result,
            }
        }
    }

    /// One attempt at the orchestrated operation, as a single transaction
    ///
    /// Catalog lookup, account and counter updates, ledger append, balance
    /// update, and record creation all commit together or not at all.
    async fn process_service_once(
        &self,
        tenant_id: Uuid,
        staff_id: Uuid,
        request: &ProcessServiceRequest,
    ) -> Result<ServiceOutcome, LoyaltyError> {
        let mut tx = self.pool.begin().await?;

        let service_type = self
            .catalog
            .find_for_tenant_tx(&mut tx, request.service_type_id, tenant_id)
            .await?
            .ok_or(LoyaltyError::ServiceTypeNotFound)?;

        // The upsert takes the account row lock that serializes every
        // same-account mutation until commit
        let mut account = self
            .accounts
            .upsert(&mut tx, request.client_id, tenant_id)
            .await?;

        // Free-after-N cycle, only for service types that configure one
        let mut is_free = false;
        let mut message = String::new();

        if let Some(threshold) = service_type.free_after_threshold {
            let counter = self
                .counters
                .lock_or_create(&mut tx, account.id, service_type.id)
                .await?;

            let outcome = ThresholdCounter::advance(counter.count, threshold);
            if outcome.is_free {
                self.counters.reset(&mut tx, counter.id).await?;
            } else {
                self.counters
                    .set_count(&mut tx, counter.id, outcome.new_count)
                    .await?;
            }

            is_free = outcome.is_free;
            message = ThresholdCounter::progress_message(&service_type.name, &outcome, threshold);
        }

        // Points accrual is skipped entirely on the free visit
        let mut points_earned = 0;
        if !is_free && service_type.points_awarded > 0 {
            self.ledger
                .append(
                    &mut tx,
                    account.id,
                    TransactionKind::Earn,
                    service_type.points_awarded,
                    &format!("Points for {}", service_type.name),
                    Some((service_type.id, "service")),
                )
                .await?;
            account = self
                .accounts
                .apply_delta(&mut tx, account.id, service_type.points_awarded)
                .await?;
            points_earned = service_type.points_awarded;
        }

        if message.is_empty() {
            message = format!("{} points earned for {}.", points_earned, service_type.name);
        }

        let price = if is_free {
            Decimal::ZERO
        } else {
            service_type.price
        };
        let record = self
            .records
            .insert(
                &mut tx,
                &NewServiceRecord {
                    pet_id: request.pet_id,
                    tenant_id,
                    service_type_id: service_type.id,
                    staff_id: Some(staff_id),
                    service_date: Utc::now(),
                    price,
                    notes: request.notes.clone(),
                    is_free,
                },
            )
            .await?;

        let counters = self
            .counters
            .progress_for_account_tx(&mut tx, account.id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Processed {} for client {} (free: {}, points: {})",
            service_type.name,
            request.client_id,
            is_free,
            points_earned
        );

        Ok(ServiceOutcome {
            account,
            counters,
            record,
            is_free,
            points_earned,
            message,
        })
    }

    /// Credit points to an account, creating it if needed
    ///
    /// The ledger append and the balance update commit together, so the
    /// denormalized total can never drift from the transaction log. Manual
    /// adjustments never touch service counters.
    pub async fn add_points(
        &self,
        tenant_id: Uuid,
        request: AdjustPointsRequest,
    ) -> Result<LoyaltyAccount, LoyaltyError> {
        if request.points <= 0 {
            return Err(LoyaltyError::ValidationError(
                "Points must be positive".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let account = self
            .accounts
            .upsert(&mut tx, request.client_id, tenant_id)
            .await?;

        let description = request
            .description
            .unwrap_or_else(|| "Points added manually".to_string());
        self.ledger
            .append(
                &mut tx,
                account.id,
                TransactionKind::Earn,
                request.points,
                &description,
                None,
            )
            .await?;
        let account = self
            .accounts
            .apply_delta(&mut tx, account.id, request.points)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Added {} points to account {} (client {})",
            request.points,
            account.id,
            request.client_id
        );
        Ok(account)
    }

    /// Deduct points from an existing account
    ///
    /// The balance is read under the row lock immediately before the check,
    /// so a concurrent redemption cannot drive the total below zero. On
    /// insufficient balance nothing is written.
    pub async fn redeem_points(
        &self,
        tenant_id: Uuid,
        request: AdjustPointsRequest,
    ) -> Result<LoyaltyAccount, LoyaltyError> {
        if request.points <= 0 {
            return Err(LoyaltyError::ValidationError(
                "Points must be positive".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let account = self
            .accounts
            .lock(&mut tx, request.client_id, tenant_id)
            .await?
            .ok_or(LoyaltyError::AccountNotFound)?;

        if account.total_points < request.points {
            // Dropping the transaction rolls back, leaving no partial deduction
            return Err(LoyaltyError::InsufficientBalance {
                available: account.total_points,
                requested: request.points,
            });
        }

        let description = request
            .description
            .unwrap_or_else(|| "Points redeemed".to_string());
        self.ledger
            .append(
                &mut tx,
                account.id,
                TransactionKind::Redeem,
                -request.points,
                &description,
                None,
            )
            .await?;
        let account = self
            .accounts
            .apply_delta(&mut tx, account.id, -request.points)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Redeemed {} points from account {} (client {})",
            request.points,
            account.id,
            request.client_id
        );
        Ok(account)
    }

    /// Staff view of a client's card, creating the account lazily
    pub async fn staff_client_summary(
        &self,
        tenant_id: Uuid,
        client_id: Uuid,
    ) -> Result<AccountSummary, LoyaltyError> {
        let account = self.accounts.get_or_create(client_id, tenant_id).await?;
        let service_counters = self.counters.progress_for_account(account.id).await?;
        let transactions = self
            .ledger
            .recent_for_account(account.id, STAFF_TRANSACTION_LIMIT)
            .await?;

        Ok(AccountSummary {
            account,
            service_counters,
            transactions,
        })
    }

    /// All of a client's cards across tenants, with counter progress
    pub async fn client_cards(&self, client_id: Uuid) -> Result<Vec<CardSummary>, LoyaltyError> {
        let accounts = self.accounts.find_all_for_client(client_id).await?;

        let mut cards = Vec::with_capacity(accounts.len());
        for account in accounts {
            let service_counters = self.counters.progress_for_account(account.id).await?;
            cards.push(CardSummary {
                account,
                service_counters,
            });
        }

        Ok(cards)
    }

    /// A client's card at one tenant, with recent transactions
    ///
    /// Unlike the staff view this never creates the account: a client who
    /// has no relationship with the tenant gets a not-found.
    pub async fn client_card(
        &self,
        client_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<AccountSummary, LoyaltyError> {
        let account = self
            .accounts
            .find_by_client(client_id, tenant_id)
            .await?
            .ok_or(LoyaltyError::AccountNotFound)?;

        let service_counters = self.counters.progress_for_account(account.id).await?;
        let transactions = self
            .ledger
            .recent_for_account(account.id, CLIENT_TRANSACTION_LIMIT)
            .await?;

        Ok(AccountSummary {
            account,
            service_counters,
            transactions,
        })
    }
}
