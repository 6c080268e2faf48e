//! Persistence contracts used by the agent.
//!
//! Three collaborators sit behind these traits: the airline records, the
//! per-session conversation log, and the idempotency ledger that keeps
//! side-effecting tool calls at-most-once.

use crate::conversation::Message;
use crate::domain::*;
use crate::tools::ToolOutcome;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("storage failure: {0}")]
    Backend(#[source] anyhow::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AirlineStore: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> StoreResult<User>;
    async fn get_user(&self, id: i64) -> StoreResult<User>;
    /// Exact match on the stored (lower-cased) email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn create_flight(&self, flight: &NewFlight) -> StoreResult<Flight>;
    async fn get_flight(&self, id: i64) -> StoreResult<Flight>;
    async fn search_flights(&self, query: &FlightQuery) -> StoreResult<Vec<Flight>>;

    async fn create_ticket(&self, ticket: &NewTicket) -> StoreResult<Ticket>;
    async fn get_ticket(&self, id: i64) -> StoreResult<Ticket>;
    async fn tickets_for_flight(
        &self,
        flight_id: i64,
        status: Option<TicketStatus>,
    ) -> StoreResult<Vec<Ticket>>;
    async fn update_ticket_status(&self, id: i64, status: TicketStatus) -> StoreResult<Ticket>;

    /// Creates the booking and marks the ticket booked. Fails with
    /// `Constraint` if the ticket already has a booking.
    async fn create_booking(&self, booking: &NewBooking) -> StoreResult<Booking>;
    async fn get_booking(&self, id: i64) -> StoreResult<Booking>;
    async fn booking_details(&self, id: i64) -> StoreResult<BookingDetails>;

    async fn create_transaction(&self, tx: &NewTransaction) -> StoreResult<Transaction>;

    /// Booking, charge and ticket status change as one atomic unit.
    async fn book_flight(&self, request: &BookFlight) -> StoreResult<Reservation>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Full message log for the session; empty for an unknown session.
    async fn load(&self, session_id: &str) -> anyhow::Result<Vec<Message>>;

    /// Append messages after everything already stored, as one unit.
    async fn append(&self, session_id: &str, messages: &[Message]) -> anyhow::Result<()>;
}

/// Outcomes of side-effecting tool calls, keyed by call position.
///
/// `fingerprint` identifies what was called (tool name and arguments). A
/// recorded outcome is only handed back for the same key and fingerprint.
#[async_trait]
pub trait IdempotencyLedger: Send + Sync {
    async fn recall(&self, key: &str, fingerprint: &str) -> anyhow::Result<Option<ToolOutcome>>;
    async fn record(&self, key: &str, fingerprint: &str, outcome: &ToolOutcome) -> anyhow::Result<()>;
}
