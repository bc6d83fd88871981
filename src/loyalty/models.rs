use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::records::ServiceRecord;

/// Kind of ledger entry: points flowing into or out of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Earn,
    Redeem,
}

impl TransactionKind {
    /// Convert kind to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Earn => "earn",
            TransactionKind::Redeem => "redeem",
        }
    }

    /// Parse kind from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "earn" => Ok(TransactionKind::Earn),
            "redeem" => Ok(TransactionKind::Redeem),
            _ => Err(format!("Invalid transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A client's points balance at one tenant clinic
///
/// `total_points` is maintained in lock-step with the transaction ledger:
/// it always equals the sum of the account's transaction deltas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyAccount {
    pub id: Uuid,
    pub client_id: Uuid,
    pub tenant_id: Uuid,
    pub total_points: i32,
    pub tier: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One append-only ledger entry
///
/// `points` is the signed delta: positive for earn, negative for redeem.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub points: i32,
    pub description: Option<String>,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Progress counter for one (account, service type) free-after-N cycle
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceCounter {
    pub id: Uuid,
    pub account_id: Uuid,
    pub service_type_id: Uuid,
    pub count: i32,
    pub last_reset: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Counter joined with its service type for display
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CounterProgress {
    pub id: Uuid,
    pub service_type_id: Uuid,
    pub service_name: String,
    pub count: i32,
    pub free_after_threshold: Option<i32>,
    pub last_reset: Option<DateTime<Utc>>,
}

/// Request DTO for processing a performed service through the loyalty cycle
#[derive(Debug, Deserialize, Validate)]
pub struct ProcessServiceRequest {
    pub client_id: Uuid,
    pub pet_id: Uuid,
    pub service_type_id: Uuid,
    pub notes: Option<String>,
}

/// Request DTO for manual point adjustments (earn and redeem)
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustPointsRequest {
    pub client_id: Uuid,
    #[validate(range(min = 1, message = "Points must be at least 1"))]
    pub points: i32,
    pub description: Option<String>,
}

/// Response DTO for a processed service
#[derive(Debug, Serialize)]
pub struct ServiceOutcome {
    pub account: LoyaltyAccount,
    pub counters: Vec<CounterProgress>,
    pub record: ServiceRecord,
    pub is_free: bool,
    pub points_earned: i32,
    pub message: String,
}

/// Response DTO for an account with its counters and recent transactions
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub account: LoyaltyAccount,
    pub service_counters: Vec<CounterProgress>,
    pub transactions: Vec<LoyaltyTransaction>,
}

/// Response DTO for the client card listing (no transaction history)
#[derive(Debug, Serialize)]
pub struct CardSummary {
    pub account: LoyaltyAccount,
    pub service_counters: Vec<CounterProgress>,
}
