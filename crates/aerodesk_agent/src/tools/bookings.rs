use super::args;
use crate::tool_registry::TypedTool;
use aerodesk_core::{
    ActionResult, AirlineStore, BookFlight as BookFlightRequest, BookingStatus, NewBooking,
    NewTransaction, ToolInputSchema, TransactionStatus, AGENT_BOOKER,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// createBooking
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingArgs {
    #[serde(deserialize_with = "args::id")]
    pub user_id: i64,
    #[serde(deserialize_with = "args::id")]
    pub ticket_id: i64,
    #[serde(default, deserialize_with = "args::opt_parsed")]
    pub status: Option<BookingStatus>,
}

pub struct CreateBooking {
    store: Arc<dyn AirlineStore>,
}

impl CreateBooking {
    pub fn new(store: Arc<dyn AirlineStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TypedTool for CreateBooking {
    type Args = CreateBookingArgs;
    const NAME: &'static str = "createBooking";
    const DESCRIPTION: &'static str =
        "Book an available ticket for a customer. The ticket is marked booked.";
    const SIDE_EFFECTING: bool = true;

    fn parameters() -> ToolInputSchema {
        ToolInputSchema::object(
            json!({
                "userId": {"type": "integer"},
                "ticketId": {"type": "integer"},
                "status": {"type": "string", "enum": ["booked", "pending", "cancelled"]}
            }),
            &["userId", "ticketId"],
        )
    }

    async fn call(&self, args: CreateBookingArgs) -> ActionResult {
        let booking = NewBooking {
            user_id: args.user_id,
            ticket_id: args.ticket_id,
            status: args.status.unwrap_or(BookingStatus::Booked),
            booked_by: AGENT_BOOKER.to_string(),
        };
        match self.store.create_booking(&booking).await {
            Ok(booking) => ActionResult::success("Ticket booked successfully", &booking),
            Err(e) => e.into(),
        }
    }
}

// ============================================================================
// makeTransaction
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeTransactionArgs {
    #[serde(deserialize_with = "args::id")]
    pub user_id: i64,
    #[serde(deserialize_with = "args::id")]
    pub booking_id: i64,
    #[serde(deserialize_with = "args::amount")]
    pub charges: f64,
    #[serde(default, deserialize_with = "args::opt_parsed")]
    pub status: Option<TransactionStatus>,
}

pub struct MakeTransaction {
    store: Arc<dyn AirlineStore>,
}

impl MakeTransaction {
    pub fn new(store: Arc<dyn AirlineStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TypedTool for MakeTransaction {
    type Args = MakeTransactionArgs;
    const NAME: &'static str = "makeTransaction";
    const DESCRIPTION: &'static str = "Record a payment against an existing booking.";
    const SIDE_EFFECTING: bool = true;

    fn parameters() -> ToolInputSchema {
        ToolInputSchema::object(
            json!({
                "userId": {"type": "integer"},
                "bookingId": {"type": "integer"},
                "charges": {"type": "number", "exclusiveMinimum": 0},
                "status": {"type": "string", "enum": ["success", "pending", "failed"]}
            }),
            &["userId", "bookingId", "charges"],
        )
    }

    fn validate(args: &MakeTransactionArgs) -> Result<(), String> {
        args::require_positive("charges", args.charges)
    }

    async fn call(&self, args: MakeTransactionArgs) -> ActionResult {
        let tx = NewTransaction {
            user_id: args.user_id,
            booking_id: args.booking_id,
            charges: args.charges,
            status: args.status.unwrap_or(TransactionStatus::Success),
        };
        match self.store.create_transaction(&tx).await {
            Ok(tx) => ActionResult::success("Transaction recorded successfully", &tx),
            Err(e) => e.into(),
        }
    }
}

// ============================================================================
// getBookingDetails
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBookingDetailsArgs {
    #[serde(deserialize_with = "args::id")]
    pub booking_id: i64,
}

pub struct GetBookingDetails {
    store: Arc<dyn AirlineStore>,
}

impl GetBookingDetails {
    pub fn new(store: Arc<dyn AirlineStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TypedTool for GetBookingDetails {
    type Args = GetBookingDetailsArgs;
    const NAME: &'static str = "getBookingDetails";
    const DESCRIPTION: &'static str =
        "Fetch a booking with its ticket, flight and payments.";
    const SIDE_EFFECTING: bool = false;

    fn parameters() -> ToolInputSchema {
        ToolInputSchema::object(json!({"bookingId": {"type": "integer"}}), &["bookingId"])
    }

    async fn call(&self, args: GetBookingDetailsArgs) -> ActionResult {
        match self.store.booking_details(args.booking_id).await {
            Ok(details) => ActionResult::success("Booking details fetched successfully", &details),
            Err(e) => e.into(),
        }
    }
}

// ============================================================================
// bookFlight
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFlightArgs {
    #[serde(deserialize_with = "args::id")]
    pub user_id: i64,
    #[serde(deserialize_with = "args::id")]
    pub flight_id: i64,
    #[serde(deserialize_with = "args::id")]
    pub ticket_id: i64,
    #[serde(deserialize_with = "args::amount")]
    pub charges: f64,
}

/// Booking, payment and ticket status in one step.
pub struct BookFlight {
    store: Arc<dyn AirlineStore>,
}

impl BookFlight {
    pub fn new(store: Arc<dyn AirlineStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TypedTool for BookFlight {
    type Args = BookFlightArgs;
    const NAME: &'static str = "bookFlight";
    const DESCRIPTION: &'static str =
        "Book a ticket on a flight and charge the customer in one step. \
         The ticket must belong to the flight and be available.";
    const SIDE_EFFECTING: bool = true;

    fn parameters() -> ToolInputSchema {
        ToolInputSchema::object(
            json!({
                "userId": {"type": "integer"},
                "flightId": {"type": "integer"},
                "ticketId": {"type": "integer"},
                "charges": {"type": "number", "exclusiveMinimum": 0}
            }),
            &["userId", "flightId", "ticketId", "charges"],
        )
    }

    fn validate(args: &BookFlightArgs) -> Result<(), String> {
        args::require_positive("charges", args.charges)
    }

    async fn call(&self, args: BookFlightArgs) -> ActionResult {
        let request = BookFlightRequest {
            user_id: args.user_id,
            flight_id: args.flight_id,
            ticket_id: args.ticket_id,
            charges: args.charges,
        };
        match self.store.book_flight(&request).await {
            Ok(reservation) => ActionResult::success("Flight booked successfully", &reservation),
            Err(e) => e.into(),
        }
    }
}
