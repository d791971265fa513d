//! Book borrowing request model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

/// Borrowing request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatus {
    Requested,
    Approved,
    Rejected,
}

impl BorrowingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowingStatus::Requested => "requested",
            BorrowingStatus::Approved => "approved",
            BorrowingStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for BorrowingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requested" => Ok(BorrowingStatus::Requested),
            "approved" => Ok(BorrowingStatus::Approved),
            "rejected" => Ok(BorrowingStatus::Rejected),
            _ => Err(format!("Invalid borrowing status: {}", s)),
        }
    }
}

// SQLx conversion for BorrowingStatus
impl sqlx::Type<Postgres> for BorrowingStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowingStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowingStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Which status changes the workflow accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any status may replace any other, content may always change
    #[default]
    Unrestricted,
    /// Only `requested -> approved | rejected`; content frozen once processed
    Strict,
}

impl TransitionPolicy {
    /// Whether a request in `from` may be moved to `to`
    pub fn allows(&self, from: BorrowingStatus, to: BorrowingStatus) -> bool {
        match self {
            TransitionPolicy::Unrestricted => true,
            TransitionPolicy::Strict => {
                from == to
                    || (from == BorrowingStatus::Requested
                        && matches!(to, BorrowingStatus::Approved | BorrowingStatus::Rejected))
            }
        }
    }

    /// Whether the book list of a request in `status` may be replaced
    pub fn allows_content_change(&self, status: BorrowingStatus) -> bool {
        match self {
            TransitionPolicy::Unrestricted => true,
            TransitionPolicy::Strict => status == BorrowingStatus::Requested,
        }
    }
}

/// One book line of a borrowing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingDetail {
    pub id: i32,
    pub request_id: i32,
    pub book_id: i32,
}

/// Detail line joined with the borrowed book's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingDetailLine {
    pub id: i32,
    pub request_id: i32,
    pub book_id: i32,
    pub book_name: String,
}

/// Borrowing request row from database (details loaded separately)
#[derive(Debug, Clone, FromRow)]
pub struct BorrowingRequestRow {
    pub id: i32,
    pub requested_by: i32,
    pub status: BorrowingStatus,
    pub requested_at: DateTime<Utc>,
    pub processed_by: Option<i32>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl BorrowingRequestRow {
    pub fn with_details(self, details: Vec<BorrowingDetail>) -> BorrowingRequest {
        BorrowingRequest {
            id: self.id,
            requested_by: self.requested_by,
            status: self.status,
            requested_at: self.requested_at,
            processed_by: self.processed_by,
            processed_at: self.processed_at,
            details,
        }
    }
}

/// Borrowing request with its detail lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingRequest {
    pub id: i32,
    /// Owning user
    pub requested_by: i32,
    pub status: BorrowingStatus,
    pub requested_at: DateTime<Utc>,
    /// User who last changed the status
    pub processed_by: Option<i32>,
    pub processed_at: Option<DateTime<Utc>>,
    pub details: Vec<BorrowingDetail>,
}

impl BorrowingRequest {
    pub fn book_ids(&self) -> Vec<i32> {
        self.details.iter().map(|d| d.book_id).collect()
    }
}

/// Create borrowing request body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBorrowing {
    #[validate(length(min = 1, message = "At least one book is required"))]
    pub book_ids: Vec<i32>,
}

/// Update borrowing request body
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBorrowing {
    pub status: Option<BorrowingStatus>,
    #[validate(length(min = 1, message = "At least one book is required"))]
    pub book_ids: Option<Vec<i32>>,
}

/// Changes handed to the store once the workflow accepted an update.
///
/// The store applies them only while the request is still in
/// `expected_status`, the status the workflow checked them against.
#[derive(Debug, Clone, PartialEq)]
pub struct BorrowingChanges {
    pub expected_status: BorrowingStatus,
    pub status: Option<BorrowingStatus>,
    pub book_ids: Option<Vec<i32>>,
    /// Set together with a status change
    pub processed: Option<(i32, DateTime<Utc>)>,
}

/// Result of a conditional store update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(BorrowingRequest),
    Missing,
    /// The request left `expected_status` before the write
    Stale,
}
