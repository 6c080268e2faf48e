//! Deterministic demo dataset.
//!
//! Flight dates are offsets from `today` so the data never goes stale.
//! Running the seed twice is a no-op: the first demo user doubles as a marker.

use aerodesk_core::{
    AirlineStore, BookingStatus, NewBooking, NewFlight, NewTicket, NewTransaction, NewUser,
    StoreResult, TicketStatus, TransactionStatus, AGENT_BOOKER,
};
use chrono::{Days, NaiveDate, NaiveTime};

const USERS: &[(&str, &str)] = &[
    ("harrison chase", "harrison@example.com"),
    ("amina yusuf", "amina.yusuf@example.com"),
    ("li wei", "li.wei@example.com"),
    ("sofia rossi", "sofia.rossi@example.com"),
];

struct FlightSeed {
    name: &'static str,
    company: &'static str,
    departure: &'static str,
    destination: &'static str,
    days_ahead: u64,
    departs: (u32, u32),
    arrives: (u32, u32),
    prices: &'static [f64],
}

const FLIGHTS: &[FlightSeed] = &[
    FlightSeed {
        name: "emirates london to paris",
        company: "emirates",
        departure: "london",
        destination: "paris",
        days_ahead: 7,
        departs: (9, 0),
        arrives: (11, 15),
        prices: &[200.0, 245.5, 310.0],
    },
    FlightSeed {
        name: "emirates london to paris evening",
        company: "emirates",
        departure: "london",
        destination: "paris",
        days_ahead: 7,
        departs: (18, 30),
        arrives: (20, 45),
        prices: &[180.0],
    },
    FlightSeed {
        name: "emirates karachi to dubai",
        company: "emirates",
        departure: "karachi",
        destination: "dubai",
        days_ahead: 10,
        departs: (4, 20),
        arrives: (6, 0),
        prices: &[120.0, 150.0],
    },
    FlightSeed {
        name: "alaska seattle to anchorage",
        company: "alaska airlines",
        departure: "seattle",
        destination: "anchorage",
        days_ahead: 14,
        departs: (13, 5),
        arrives: (16, 40),
        prices: &[95.0, 140.0],
    },
    FlightSeed {
        name: "emirates dubai to new york",
        company: "emirates",
        departure: "dubai",
        destination: "new york",
        days_ahead: 21,
        departs: (2, 45),
        arrives: (8, 55),
        prices: &[480.0],
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub flights: usize,
    pub tickets: usize,
    pub bookings: usize,
}

impl SeedSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn clock(hm: (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hm.0, hm.1, 0).unwrap_or(NaiveTime::MIN)
}

pub async fn seed_demo_data(store: &dyn AirlineStore, today: NaiveDate) -> StoreResult<SeedSummary> {
    if store.find_user_by_email(USERS[0].1).await?.is_some() {
        tracing::info!("Demo data already present, skipping seed");
        return Ok(SeedSummary::default());
    }

    let mut summary = SeedSummary::default();

    let mut users = Vec::with_capacity(USERS.len());
    for (name, email) in USERS {
        let user = store
            .create_user(&NewUser {
                name: name.to_string(),
                email: email.to_string(),
            })
            .await?;
        users.push(user);
        summary.users += 1;
    }

    let mut last_ticket = None;
    for seed in FLIGHTS {
        let flight = store
            .create_flight(&NewFlight {
                name: seed.name.to_string(),
                company: seed.company.to_string(),
                departure: seed.departure.to_string(),
                destination: seed.destination.to_string(),
                flight_date: today.checked_add_days(Days::new(seed.days_ahead)).unwrap_or(today),
                departure_time: clock(seed.departs),
                arrival_time: clock(seed.arrives),
            })
            .await?;
        summary.flights += 1;

        for price in seed.prices {
            let ticket = store
                .create_ticket(&NewTicket {
                    flight_id: flight.id,
                    ticket_type: "economy".to_string(),
                    price: *price,
                    status: TicketStatus::Available,
                })
                .await?;
            last_ticket = Some(ticket);
            summary.tickets += 1;
        }
    }

    // One settled booking so booking lookups have something to find.
    if let (Some(ticket), Some(user)) = (last_ticket, users.get(1)) {
        let booking = store
            .create_booking(&NewBooking {
                user_id: user.id,
                ticket_id: ticket.id,
                status: BookingStatus::Booked,
                booked_by: AGENT_BOOKER.to_string(),
            })
            .await?;
        store
            .create_transaction(&NewTransaction {
                user_id: user.id,
                booking_id: booking.id,
                charges: ticket.price,
                status: TransactionStatus::Success,
            })
            .await?;
        summary.bookings += 1;
    }

    tracing::info!(
        "Seeded {} users, {} flights, {} tickets, {} bookings",
        summary.users,
        summary.flights,
        summary.tickets,
        summary.bookings
    );
    Ok(summary)
}
