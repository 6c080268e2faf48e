use super::args;
use crate::tool_registry::TypedTool;
use aerodesk_core::{ActionResult, AirlineStore, NewTicket, TicketStatus, ToolInputSchema};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// createTicket
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketArgs {
    #[serde(deserialize_with = "args::id")]
    pub flight_id: i64,
    #[serde(rename = "type")]
    pub ticket_type: String,
    #[serde(deserialize_with = "args::amount")]
    pub price: f64,
    #[serde(default, deserialize_with = "args::opt_parsed")]
    pub status: Option<TicketStatus>,
}

pub struct CreateTicket {
    store: Arc<dyn AirlineStore>,
}

impl CreateTicket {
    pub fn new(store: Arc<dyn AirlineStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TypedTool for CreateTicket {
    type Args = CreateTicketArgs;
    const NAME: &'static str = "createTicket";
    const DESCRIPTION: &'static str = "Create a ticket on an existing flight.";
    const SIDE_EFFECTING: bool = true;

    fn parameters() -> ToolInputSchema {
        ToolInputSchema::object(
            json!({
                "flightId": {"type": "integer"},
                "type": {"type": "string", "description": "Ticket class, e.g. economy"},
                "price": {"type": "number", "exclusiveMinimum": 0},
                "status": {"type": "string", "enum": ["available", "booked", "cancelled"]}
            }),
            &["flightId", "type", "price"],
        )
    }

    fn validate(args: &CreateTicketArgs) -> Result<(), String> {
        args::require_text("type", &args.ticket_type)?;
        args::require_positive("price", args.price)
    }

    async fn call(&self, args: CreateTicketArgs) -> ActionResult {
        let ticket = NewTicket {
            flight_id: args.flight_id,
            ticket_type: args::normalize(&args.ticket_type),
            price: args.price,
            status: args.status.unwrap_or(TicketStatus::Available),
        };
        match self.store.create_ticket(&ticket).await {
            Ok(ticket) => ActionResult::success("Ticket created successfully", &ticket),
            Err(e) => e.into(),
        }
    }
}

// ============================================================================
// getAvailableTickets
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAvailableTicketsArgs {
    #[serde(deserialize_with = "args::id")]
    pub flight_id: i64,
}

pub struct GetAvailableTickets {
    store: Arc<dyn AirlineStore>,
}

impl GetAvailableTickets {
    pub fn new(store: Arc<dyn AirlineStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TypedTool for GetAvailableTickets {
    type Args = GetAvailableTicketsArgs;
    const NAME: &'static str = "getAvailableTickets";
    const DESCRIPTION: &'static str = "List the tickets still available on a flight.";
    const SIDE_EFFECTING: bool = false;

    fn parameters() -> ToolInputSchema {
        ToolInputSchema::object(json!({"flightId": {"type": "integer"}}), &["flightId"])
    }

    async fn call(&self, args: GetAvailableTicketsArgs) -> ActionResult {
        if let Err(e) = self.store.get_flight(args.flight_id).await {
            return e.into();
        }
        match self
            .store
            .tickets_for_flight(args.flight_id, Some(TicketStatus::Available))
            .await
        {
            Ok(tickets) if tickets.is_empty() => {
                ActionResult::success("No tickets available on this flight", &tickets)
            }
            Ok(tickets) => ActionResult::success("Tickets fetched successfully", &tickets),
            Err(e) => e.into(),
        }
    }
}

// ============================================================================
// updateTicketStatus
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketStatusArgs {
    #[serde(deserialize_with = "args::id")]
    pub ticket_id: i64,
    #[serde(deserialize_with = "args::parsed")]
    pub status: TicketStatus,
}

pub struct UpdateTicketStatus {
    store: Arc<dyn AirlineStore>,
}

impl UpdateTicketStatus {
    pub fn new(store: Arc<dyn AirlineStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TypedTool for UpdateTicketStatus {
    type Args = UpdateTicketStatusArgs;
    const NAME: &'static str = "updateTicketStatus";
    const DESCRIPTION: &'static str = "Set a ticket's status (available, booked or cancelled).";
    const SIDE_EFFECTING: bool = true;

    fn parameters() -> ToolInputSchema {
        ToolInputSchema::object(
            json!({
                "ticketId": {"type": "integer"},
                "status": {"type": "string", "enum": ["available", "booked", "cancelled"]}
            }),
            &["ticketId", "status"],
        )
    }

    async fn call(&self, args: UpdateTicketStatusArgs) -> ActionResult {
        match self.store.update_ticket_status(args.ticket_id, args.status).await {
            Ok(ticket) => ActionResult::success("Ticket updated successfully", &ticket),
            Err(e) => e.into(),
        }
    }
}
