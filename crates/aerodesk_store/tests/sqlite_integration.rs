//! Integration tests for SqliteStore against a real database file.
//!
//! Uses tempfile::TempDir for isolated SQLite databases.

use std::sync::Arc;

use aerodesk_core::{AirlineStore, BookFlight, FlightQuery, Message, SessionStore, TicketStatus};
use aerodesk_store::{seed_demo_data, SqliteStore};
use chrono::NaiveDate;

async fn open(dir: &tempfile::TempDir) -> SqliteStore {
    let db_path = dir.path().join("aerodesk.db");
    SqliteStore::new(&db_path).await.unwrap()
}

/// Test 1: data written by one handle is visible after reopening the file
#[tokio::test]
async fn test_reopen_preserves_records_and_sessions() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let store = open(&dir).await;
        seed_demo_data(&store, NaiveDate::from_ymd_opt(2031, 3, 1).unwrap())
            .await
            .unwrap();
        store
            .append("s1", &[Message::human("hello"), Message::agent("hi there", vec![])])
            .await
            .unwrap();
    }

    let store = open(&dir).await;
    let flights = store.search_flights(&FlightQuery::default()).await.unwrap();
    assert_eq!(flights.len(), 5);
    let log = store.load("s1").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].text(), "hi there");
}

/// Test 2: concurrent appends to one session never share a sequence number
#[tokio::test]
async fn test_concurrent_appends_keep_every_message() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(open(&dir).await);

    let mut handles = Vec::new();
    for i in 0..8 {
        let s = store.clone();
        handles.push(tokio::spawn(async move {
            s.append("shared", &[Message::human(format!("msg {i}"))]).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    let log = store.load("shared").await.unwrap();
    assert_eq!(log.len(), 8);
}

/// Test 3: two customers racing for the last ticket, exactly one wins
#[tokio::test]
async fn test_racing_reservations_book_ticket_once() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(open(&dir).await);
    seed_demo_data(store.as_ref(), NaiveDate::from_ymd_opt(2031, 3, 1).unwrap())
        .await
        .unwrap();

    let flight = store
        .search_flights(&FlightQuery {
            destination: Some("paris".into()),
            ..Default::default()
        })
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    let ticket = store
        .tickets_for_flight(flight.id, Some(TicketStatus::Available))
        .await
        .unwrap()
        .remove(0);

    let mut handles = Vec::new();
    for user_id in [1_i64, 3] {
        let s = store.clone();
        let request = BookFlight {
            user_id,
            flight_id: flight.id,
            ticket_id: ticket.id,
            charges: ticket.price,
        };
        handles.push(tokio::spawn(async move { s.book_flight(&request).await }));
    }

    let mut wins = 0;
    for h in handles {
        if h.await.unwrap().is_ok() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(
        store.get_ticket(ticket.id).await.unwrap().status,
        TicketStatus::Booked
    );
}
