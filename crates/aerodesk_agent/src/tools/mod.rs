//! Airline operations exposed to the model.

pub mod args;
pub mod bookings;
pub mod flights;
pub mod tickets;
pub mod users;

use crate::tool_registry::{RegistryError, ToolRegistry};
use aerodesk_core::AirlineStore;
use std::sync::Arc;

pub use bookings::{BookFlight, CreateBooking, GetBookingDetails, MakeTransaction};
pub use flights::{CreateFlight, GetFlightInfo};
pub use tickets::{CreateTicket, GetAvailableTickets, UpdateTicketStatus};
pub use users::FindOrCreateUser;

/// Registry holding every airline tool, backed by `store`.
pub fn airline_registry(store: Arc<dyn AirlineStore>) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CreateFlight::new(store.clone())))?;
    registry.register(Arc::new(CreateTicket::new(store.clone())))?;
    registry.register(Arc::new(GetFlightInfo::new(store.clone())))?;
    registry.register(Arc::new(GetAvailableTickets::new(store.clone())))?;
    registry.register(Arc::new(UpdateTicketStatus::new(store.clone())))?;
    registry.register(Arc::new(FindOrCreateUser::new(store.clone())))?;
    registry.register(Arc::new(CreateBooking::new(store.clone())))?;
    registry.register(Arc::new(MakeTransaction::new(store.clone())))?;
    registry.register(Arc::new(GetBookingDetails::new(store.clone())))?;
    registry.register(Arc::new(BookFlight::new(store)))?;
    Ok(registry)
}
