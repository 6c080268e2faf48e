use super::args;
use crate::tool_registry::TypedTool;
use aerodesk_core::{
    ActionResult, AirlineStore, FlightAvailability, FlightQuery, NewFlight, TicketStatus,
    ToolInputSchema,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// createFlight
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlightArgs {
    pub name: String,
    pub departure: String,
    pub destination: String,
    pub company: String,
    #[serde(deserialize_with = "args::date")]
    pub flight_date: NaiveDate,
    #[serde(deserialize_with = "args::time")]
    pub departure_time: NaiveTime,
    #[serde(deserialize_with = "args::time")]
    pub arrival_time: NaiveTime,
}

pub struct CreateFlight {
    store: Arc<dyn AirlineStore>,
}

impl CreateFlight {
    pub fn new(store: Arc<dyn AirlineStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TypedTool for CreateFlight {
    type Args = CreateFlightArgs;
    const NAME: &'static str = "createFlight";
    const DESCRIPTION: &'static str =
        "Create a new flight. Dates use YYYY-MM-DD and times use HH:MM (24h).";
    const SIDE_EFFECTING: bool = true;

    fn parameters() -> ToolInputSchema {
        ToolInputSchema::object(
            json!({
                "name": {"type": "string", "description": "Flight name, e.g. 'emirates london to paris'"},
                "departure": {"type": "string", "description": "Departure city"},
                "destination": {"type": "string", "description": "Destination city"},
                "company": {"type": "string", "description": "Operating airline"},
                "flightDate": {"type": "string", "description": "YYYY-MM-DD"},
                "departureTime": {"type": "string", "description": "HH:MM"},
                "arrivalTime": {"type": "string", "description": "HH:MM"}
            }),
            &["name", "departure", "destination", "company", "flightDate", "departureTime", "arrivalTime"],
        )
    }

    fn validate(args: &CreateFlightArgs) -> Result<(), String> {
        args::require_text("name", &args.name)?;
        args::require_text("departure", &args.departure)?;
        args::require_text("destination", &args.destination)?;
        args::require_text("company", &args.company)
    }

    async fn call(&self, args: CreateFlightArgs) -> ActionResult {
        let flight = NewFlight {
            name: args::normalize(&args.name),
            company: args::normalize(&args.company),
            departure: args::normalize(&args.departure),
            destination: args::normalize(&args.destination),
            flight_date: args.flight_date,
            departure_time: args.departure_time,
            arrival_time: args.arrival_time,
        };
        match self.store.create_flight(&flight).await {
            Ok(flight) => ActionResult::success("Flight created successfully", &flight),
            Err(e) => e.into(),
        }
    }
}

// ============================================================================
// getFlightInfo
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFlightInfoArgs {
    pub destination: String,
    #[serde(default)]
    pub departure: Option<String>,
    #[serde(default, deserialize_with = "args::opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "args::opt_time")]
    pub time: Option<NaiveTime>,
}

pub struct GetFlightInfo {
    store: Arc<dyn AirlineStore>,
}

impl GetFlightInfo {
    pub fn new(store: Arc<dyn AirlineStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TypedTool for GetFlightInfo {
    type Args = GetFlightInfoArgs;
    const NAME: &'static str = "getFlightInfo";
    const DESCRIPTION: &'static str =
        "Search flights by destination, optionally narrowed by departure city, date (YYYY-MM-DD) \
         and departure time (HH:MM). Returns each flight with its available tickets and prices.";
    const SIDE_EFFECTING: bool = false;

    fn parameters() -> ToolInputSchema {
        ToolInputSchema::object(
            json!({
                "destination": {"type": "string"},
                "departure": {"type": "string"},
                "date": {"type": "string", "description": "YYYY-MM-DD"},
                "time": {"type": "string", "description": "Departure time, HH:MM"}
            }),
            &["destination"],
        )
    }

    fn validate(args: &GetFlightInfoArgs) -> Result<(), String> {
        args::require_text("destination", &args.destination)
    }

    async fn call(&self, args: GetFlightInfoArgs) -> ActionResult {
        let query = FlightQuery {
            destination: Some(args::normalize(&args.destination)),
            departure: args
                .departure
                .as_deref()
                .map(args::normalize)
                .filter(|s| !s.is_empty()),
            date: args.date,
            departure_time: args.time,
        };

        let flights = match self.store.search_flights(&query).await {
            Ok(flights) => flights,
            Err(e) => return e.into(),
        };

        let mut results = Vec::with_capacity(flights.len());
        for flight in flights {
            match self
                .store
                .tickets_for_flight(flight.id, Some(TicketStatus::Available))
                .await
            {
                Ok(tickets) => results.push(FlightAvailability { flight, tickets }),
                Err(e) => return e.into(),
            }
        }

        let message = if results.is_empty() {
            format!("No flights found to {}", args.destination.trim())
        } else {
            format!("Found {} flight(s)", results.len())
        };
        ActionResult::success(message, &results)
    }
}
