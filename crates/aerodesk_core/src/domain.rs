//! Airline records and their write-side inputs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Status enums
// ============================================================================

/// Error returned when a status string matches no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status '{value}', expected one of: {expected}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

macro_rules! status_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            /// Case-insensitive; surrounding whitespace is ignored.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownStatus {
                        kind: $kind,
                        value: s.to_string(),
                        expected: [$($text),+].join(", "),
                    }),
                }
            }
        }
    };
}

status_enum!(TicketStatus, "ticket", {
    Available => "available",
    Booked => "booked",
    Cancelled => "cancelled",
});

status_enum!(BookingStatus, "booking", {
    Booked => "booked",
    Pending => "pending",
    Cancelled => "cancelled",
});

status_enum!(TransactionStatus, "transaction", {
    Success => "success",
    Pending => "pending",
    Failed => "failed",
});

// ============================================================================
// Records
// ============================================================================

/// Recorded as `booked_by` on bookings the agent makes.
pub const AGENT_BOOKER: &str = "AI";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub company: String,
    pub departure: String,
    pub destination: String,
    pub flight_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub flight_id: i64,
    pub ticket_type: String,
    pub price: f64,
    pub status: TicketStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub ticket_id: i64,
    pub status: BookingStatus,
    pub booked_by: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub booking_id: i64,
    pub charges: f64,
    pub status: TransactionStatus,
    pub created_at: i64,
}

/// A flight together with the tickets that can still be bought on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightAvailability {
    pub flight: Flight,
    pub tickets: Vec<Ticket>,
}

/// A booking resolved through its ticket to the flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub booking: Booking,
    pub ticket: Ticket,
    pub flight: Flight,
    pub transactions: Vec<Transaction>,
}

/// Result of the compound book-and-charge operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub booking: Booking,
    pub transaction: Transaction,
}

// ============================================================================
// Write-side inputs
// ============================================================================
//
// Inputs are expected to be normalised already (lower-cased free text,
// parsed dates). Adapters do that; the store only persists.

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFlight {
    pub name: String,
    pub company: String,
    pub departure: String,
    pub destination: String,
    pub flight_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub flight_id: i64,
    pub ticket_type: String,
    pub price: f64,
    pub status: TicketStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: i64,
    pub ticket_id: i64,
    pub status: BookingStatus,
    pub booked_by: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: i64,
    pub booking_id: i64,
    pub charges: f64,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookFlight {
    pub user_id: i64,
    pub flight_id: i64,
    pub ticket_id: i64,
    pub charges: f64,
}

/// Flight search filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightQuery {
    pub destination: Option<String>,
    pub departure: Option<String>,
    pub date: Option<NaiveDate>,
    pub departure_time: Option<NaiveTime>,
}

/// URL-safe slug: lower-case ASCII alphanumerics joined by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("Available".parse::<TicketStatus>().unwrap(), TicketStatus::Available);
        assert_eq!(" BOOKED ".parse::<BookingStatus>().unwrap(), BookingStatus::Booked);
        assert_eq!("failed".parse::<TransactionStatus>().unwrap(), TransactionStatus::Failed);
    }

    #[test]
    fn test_unknown_status_lists_expected_values() {
        let err = "sold".parse::<TicketStatus>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'sold'"));
        assert!(msg.contains("available, booked, cancelled"));
    }

    #[test]
    fn test_status_serde_matches_as_str() {
        let json = serde_json::to_string(&TicketStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        assert_eq!(TicketStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Emirates Karachi to Dubai"), "emirates-karachi-to-dubai");
        assert_eq!(slugify("  PK-301 / night  "), "pk-301-night");
        assert_eq!(slugify("***"), "");
    }
}
