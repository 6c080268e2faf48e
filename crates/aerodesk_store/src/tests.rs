use crate::seed::seed_demo_data;
use crate::sqlite::SqliteStore;
use aerodesk_core::{
    AirlineStore, BookFlight, BookingStatus, FlightQuery, IdempotencyLedger, Message, NewBooking,
    NewFlight, NewTicket, NewTransaction, NewUser, SessionStore, StoreError, TicketStatus,
    ToolCall, ToolOutcome, TransactionStatus,
};
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

async fn store() -> SqliteStore {
    SqliteStore::in_memory().await.expect("Failed to create store")
}

async fn paris_flight(store: &SqliteStore) -> i64 {
    store
        .create_flight(&NewFlight {
            name: "emirates london to paris".into(),
            company: "emirates".into(),
            departure: "london".into(),
            destination: "paris".into(),
            flight_date: date("2030-05-01"),
            departure_time: time("09:00"),
            arrival_time: time("11:15"),
        })
        .await
        .unwrap()
        .id
}

async fn ticket(store: &SqliteStore, flight_id: i64, price: f64) -> i64 {
    store
        .create_ticket(&NewTicket {
            flight_id,
            ticket_type: "economy".into(),
            price,
            status: TicketStatus::Available,
        })
        .await
        .unwrap()
        .id
}

async fn user(store: &SqliteStore, email: &str) -> i64 {
    store
        .create_user(&NewUser {
            name: "test user".into(),
            email: email.into(),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_flight_roundtrip_and_slug() {
    let store = store().await;
    let id = paris_flight(&store).await;
    let flight = store.get_flight(id).await.unwrap();
    assert_eq!(flight.slug, "emirates-london-to-paris");
    assert_eq!(flight.flight_date, date("2030-05-01"));
    assert_eq!(flight.departure_time, time("09:00"));
    assert_eq!(flight.arrival_time, time("11:15"));

    let err = store.get_flight(999).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "flight 999 not found");
}

#[tokio::test]
async fn test_search_flights_filters() {
    let store = store().await;
    paris_flight(&store).await;
    store
        .create_flight(&NewFlight {
            name: "karachi to dubai".into(),
            company: "emirates".into(),
            departure: "karachi".into(),
            destination: "dubai".into(),
            flight_date: date("2030-05-02"),
            departure_time: time("04:20"),
            arrival_time: time("06:00"),
        })
        .await
        .unwrap();

    let all = store.search_flights(&FlightQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let paris = store
        .search_flights(&FlightQuery {
            destination: Some("par".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(paris.len(), 1);
    assert_eq!(paris[0].destination, "paris");

    let at_nine = store
        .search_flights(&FlightQuery {
            destination: Some("paris".into()),
            departure_time: Some(time("09:00")),
            date: Some(date("2030-05-01")),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(at_nine.len(), 1);

    let wrong_day = store
        .search_flights(&FlightQuery {
            destination: Some("paris".into()),
            date: Some(date("2030-06-01")),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(wrong_day.is_empty());
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let store = store().await;
    paris_flight(&store).await;
    for pattern in ["%", "_", "p%s"] {
        let hits = store
            .search_flights(&FlightQuery {
                destination: Some(pattern.into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(hits.is_empty(), "{pattern} matched {hits:?}");
    }
}

#[tokio::test]
async fn test_ticket_requires_existing_flight() {
    let store = store().await;
    let err = store
        .create_ticket(&NewTicket {
            flight_id: 42,
            ticket_type: "economy".into(),
            price: 100.0,
            status: TicketStatus::Available,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "flight", .. }));
}

#[tokio::test]
async fn test_tickets_for_flight_by_status() {
    let store = store().await;
    let flight = paris_flight(&store).await;
    let cheap = ticket(&store, flight, 150.0).await;
    let dear = ticket(&store, flight, 300.0).await;
    store.update_ticket_status(dear, TicketStatus::Cancelled).await.unwrap();

    let available = store
        .tickets_for_flight(flight, Some(TicketStatus::Available))
        .await
        .unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, cheap);

    let all = store.tickets_for_flight(flight, None).await.unwrap();
    assert_eq!(all.len(), 2);

    let err = store
        .update_ticket_status(999, TicketStatus::Booked)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_duplicate_email_is_constraint() {
    let store = store().await;
    user(&store, "jane@example.com").await;
    let err = store
        .create_user(&NewUser {
            name: "other".into(),
            email: "jane@example.com".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));

    let found = store.find_user_by_email("jane@example.com").await.unwrap();
    assert!(found.is_some());
    assert!(store.find_user_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_booking_marks_ticket_and_rejects_second_booking() {
    let store = store().await;
    let flight = paris_flight(&store).await;
    let ticket_id = ticket(&store, flight, 200.0).await;
    let jane = user(&store, "jane@example.com").await;
    let bob = user(&store, "bob@example.com").await;

    let booking = store
        .create_booking(&NewBooking {
            user_id: jane,
            ticket_id,
            status: BookingStatus::Booked,
            booked_by: "AI".into(),
        })
        .await
        .unwrap();
    assert_eq!(booking.ticket_id, ticket_id);
    assert_eq!(
        store.get_ticket(ticket_id).await.unwrap().status,
        TicketStatus::Booked
    );

    let err = store
        .create_booking(&NewBooking {
            user_id: bob,
            ticket_id,
            status: BookingStatus::Booked,
            booked_by: "AI".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));
}

#[tokio::test]
async fn test_booking_details_include_transactions() {
    let store = store().await;
    let flight = paris_flight(&store).await;
    let ticket_id = ticket(&store, flight, 200.0).await;
    let jane = user(&store, "jane@example.com").await;

    let booking = store
        .create_booking(&NewBooking {
            user_id: jane,
            ticket_id,
            status: BookingStatus::Booked,
            booked_by: "AI".into(),
        })
        .await
        .unwrap();
    store
        .create_transaction(&NewTransaction {
            user_id: jane,
            booking_id: booking.id,
            charges: 200.0,
            status: TransactionStatus::Success,
        })
        .await
        .unwrap();

    let details = store.booking_details(booking.id).await.unwrap();
    assert_eq!(details.flight.id, flight);
    assert_eq!(details.ticket.id, ticket_id);
    assert_eq!(details.transactions.len(), 1);
    assert_eq!(details.transactions[0].charges, 200.0);

    let err = store
        .create_transaction(&NewTransaction {
            user_id: jane,
            booking_id: 999,
            charges: 10.0,
            status: TransactionStatus::Success,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "booking", .. }));
}

#[tokio::test]
async fn test_book_flight_is_atomic() {
    let store = store().await;
    let paris = paris_flight(&store).await;
    let other = paris_flight(&store).await;
    let ticket_id = ticket(&store, paris, 200.0).await;
    let jane = user(&store, "jane@example.com").await;

    // Ticket on a different flight: nothing is written.
    let err = store
        .book_flight(&BookFlight {
            user_id: jane,
            flight_id: other,
            ticket_id,
            charges: 200.0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));
    assert_eq!(
        store.get_ticket(ticket_id).await.unwrap().status,
        TicketStatus::Available
    );
    assert!(store.get_booking(1).await.unwrap_err().is_not_found());

    let reservation = store
        .book_flight(&BookFlight {
            user_id: jane,
            flight_id: paris,
            ticket_id,
            charges: 200.0,
        })
        .await
        .unwrap();
    assert_eq!(reservation.booking.booked_by, "AI");
    assert_eq!(reservation.transaction.booking_id, reservation.booking.id);
    assert_eq!(reservation.transaction.status, TransactionStatus::Success);
    assert_eq!(
        store.get_ticket(ticket_id).await.unwrap().status,
        TicketStatus::Booked
    );

    let err = store
        .book_flight(&BookFlight {
            user_id: jane,
            flight_id: paris,
            ticket_id,
            charges: 200.0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));
}

#[tokio::test]
async fn test_session_log_roundtrip() {
    let store = store().await;
    assert!(store.load("s1").await.unwrap().is_empty());

    let turn = vec![
        Message::human("book me to paris"),
        Message::agent(
            "",
            vec![ToolCall::new("c1", "getFlightInfo", json!({"destination": "paris"}))],
        ),
        Message::tool_result("c1", "Flights found", false),
        Message::agent("Found one.", vec![]),
    ];
    store.append("s1", &turn[..2]).await.unwrap();
    store.append("s1", &turn[2..]).await.unwrap();
    store.append("s2", &[Message::human("other")]).await.unwrap();

    let loaded = store.load("s1").await.unwrap();
    assert_eq!(loaded, turn);
    assert_eq!(store.session_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_ledger_keeps_first_outcome() {
    let store = store().await;
    let fp = r#"createBooking:{"ticketId":1,"userId":1}"#;
    assert!(store.recall("s1:0:c1", fp).await.unwrap().is_none());
    store
        .record("s1:0:c1", fp, &ToolOutcome::ok("Booking created".to_string()))
        .await
        .unwrap();
    store
        .record("s1:0:c1", fp, &ToolOutcome::ok("Booking created again".to_string()))
        .await
        .unwrap();
    let outcome = store.recall("s1:0:c1", fp).await.unwrap().unwrap();
    assert_eq!(outcome.content, "Booking created");
}

#[tokio::test]
async fn test_ledger_matches_on_fingerprint() {
    let store = store().await;
    store
        .record(
            "s1:0:c1",
            r#"createBooking:{"ticketId":1,"userId":1}"#,
            &ToolOutcome::ok("Booking created".to_string()),
        )
        .await
        .unwrap();
    let other = store
        .recall("s1:0:c1", r#"createBooking:{"ticketId":2,"userId":1}"#)
        .await
        .unwrap();
    assert!(other.is_none());
}

#[tokio::test]
async fn test_seed_is_deterministic_and_idempotent() {
    let store = store().await;
    let today = date("2030-01-01");
    let first = seed_demo_data(&store, today).await.unwrap();
    assert_eq!(first.users, 4);
    assert_eq!(first.flights, 5);
    assert_eq!(first.bookings, 1);

    let again = seed_demo_data(&store, today).await.unwrap();
    assert!(again.is_empty());

    let paris = store
        .search_flights(&FlightQuery {
            destination: Some("paris".into()),
            departure_time: Some(time("09:00")),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(paris.len(), 1);
    assert_eq!(paris[0].flight_date, date("2030-01-08"));
    let tickets = store
        .tickets_for_flight(paris[0].id, Some(TicketStatus::Available))
        .await
        .unwrap();
    assert_eq!(tickets.len(), 3);
}
