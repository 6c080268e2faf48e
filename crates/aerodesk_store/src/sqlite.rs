use aerodesk_core::{
    AirlineStore, BookFlight, Booking, BookingDetails, BookingStatus, Flight, FlightQuery,
    IdempotencyLedger, Message, NewBooking, NewFlight, NewTicket, NewTransaction, NewUser,
    Reservation, SessionStore, StoreError, StoreResult, Ticket, TicketStatus, ToolOutcome,
    Transaction, TransactionStatus, User, AGENT_BOOKER,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .after_connect(|conn, _meta| Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            }))
            .connect(&db_url)
            .await
            .with_context(|| format!("Failed to connect to SQLite database at {}", db_path.as_ref().display()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database. A single pooled connection is kept alive
    /// for the lifetime of the store, since every new `:memory:` connection
    /// would otherwise see an empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .after_connect(|conn, _meta| Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                Ok(())
            }))
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL DEFAULT 'user',
                created_at INTEGER NOT NULL
            );
            "#
        )
        .execute(&self.pool)
        .await
        .context("Failed to create users table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS flights (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                slug TEXT NOT NULL,
                company TEXT NOT NULL,
                departure TEXT NOT NULL,
                destination TEXT NOT NULL,
                flight_date TEXT NOT NULL,
                departure_time TEXT NOT NULL,
                arrival_time TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            "#
        )
        .execute(&self.pool)
        .await
        .context("Failed to create flights table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_flights_destination ON flights(destination)")
            .execute(&self.pool)
            .await
            .context("Failed to create flights destination index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                flight_id INTEGER NOT NULL,
                ticket_type TEXT NOT NULL,
                price REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'available',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY(flight_id) REFERENCES flights(id)
            );
            "#
        )
        .execute(&self.pool)
        .await
        .context("Failed to create tickets table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tickets_flight ON tickets(flight_id)")
            .execute(&self.pool)
            .await
            .context("Failed to create tickets flight index")?;

        // One booking per ticket.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                ticket_id INTEGER NOT NULL UNIQUE,
                status TEXT NOT NULL,
                booked_by TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id),
                FOREIGN KEY(ticket_id) REFERENCES tickets(id)
            );
            "#
        )
        .execute(&self.pool)
        .await
        .context("Failed to create bookings table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                booking_id INTEGER NOT NULL,
                charges REAL NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id),
                FOREIGN KEY(booking_id) REFERENCES bookings(id)
            );
            "#
        )
        .execute(&self.pool)
        .await
        .context("Failed to create transactions table")?;

        // === Conversation log (append-only, ordered by seq within a session) ===
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_messages (
                session_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                role TEXT NOT NULL,
                message_json TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (session_id, seq)
            );
            "#
        )
        .execute(&self.pool)
        .await
        .context("Failed to create session_messages table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tool_ledger (
                key TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                outcome_json TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (key, fingerprint)
            );
            "#
        )
        .execute(&self.pool)
        .await
        .context("Failed to create tool_ledger table")?;

        Ok(())
    }
}

// ============================================================================
// Row mapping
// ============================================================================

/// Map a sqlx error to the store taxonomy. Uniqueness and foreign-key
/// failures become `Constraint` so adapters can report them to the model.
fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Constraint(format!("{context}: duplicate value ({})", db.message()))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::Constraint(format!("{context}: referenced record does not exist"))
        }
        _ => StoreError::Backend(anyhow::Error::new(e).context(context)),
    }
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(anyhow::anyhow!("Corrupt {what} column: {err}"))
}

fn parse_date(raw: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| corrupt("date", e))
}

fn parse_time(raw: &str) -> StoreResult<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT).map_err(|e| corrupt("time", e))
}

fn user_from_row(row: &SqliteRow) -> StoreResult<User> {
    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: row.get("role"),
        created_at: row.get("created_at"),
    })
}

fn flight_from_row(row: &SqliteRow) -> StoreResult<Flight> {
    let flight_date: String = row.get("flight_date");
    let departure_time: String = row.get("departure_time");
    let arrival_time: String = row.get("arrival_time");
    Ok(Flight {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        company: row.get("company"),
        departure: row.get("departure"),
        destination: row.get("destination"),
        flight_date: parse_date(&flight_date)?,
        departure_time: parse_time(&departure_time)?,
        arrival_time: parse_time(&arrival_time)?,
    })
}

fn ticket_from_row(row: &SqliteRow) -> StoreResult<Ticket> {
    let status: String = row.get("status");
    Ok(Ticket {
        id: row.get("id"),
        flight_id: row.get("flight_id"),
        ticket_type: row.get("ticket_type"),
        price: row.get("price"),
        status: TicketStatus::from_str(&status).map_err(|e| corrupt("ticket status", e))?,
    })
}

fn booking_from_row(row: &SqliteRow) -> StoreResult<Booking> {
    let status: String = row.get("status");
    Ok(Booking {
        id: row.get("id"),
        user_id: row.get("user_id"),
        ticket_id: row.get("ticket_id"),
        status: BookingStatus::from_str(&status).map_err(|e| corrupt("booking status", e))?,
        booked_by: row.get("booked_by"),
        created_at: row.get("created_at"),
    })
}

fn transaction_from_row(row: &SqliteRow) -> StoreResult<Transaction> {
    let status: String = row.get("status");
    Ok(Transaction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        booking_id: row.get("booking_id"),
        charges: row.get("charges"),
        status: TransactionStatus::from_str(&status).map_err(|e| corrupt("transaction status", e))?,
        created_at: row.get("created_at"),
    })
}

const FLIGHT_COLUMNS: &str =
    "id, name, slug, company, departure, destination, flight_date, departure_time, arrival_time";
const TICKET_COLUMNS: &str = "id, flight_id, ticket_type, price, status";
const BOOKING_COLUMNS: &str = "id, user_id, ticket_id, status, booked_by, created_at";
const TRANSACTION_COLUMNS: &str = "id, user_id, booking_id, charges, status, created_at";

// ============================================================================
// AirlineStore
// ============================================================================

#[async_trait]
impl AirlineStore for SqliteStore {
    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        let now = Utc::now().timestamp();
        let result = sqlx::query("INSERT INTO users (name, email, role, created_at) VALUES (?, ?, 'user', ?)")
            .bind(&user.name)
            .bind(&user.email)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error("create user"))?;
        tracing::debug!("Created user {}", user.email);
        self.get_user(result.last_insert_rowid()).await
    }

    async fn get_user(&self, id: i64) -> StoreResult<User> {
        let row = sqlx::query("SELECT id, name, email, role, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get user"))?;
        match row {
            Some(row) => user_from_row(&row),
            None => Err(StoreError::not_found("user", id)),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, role, created_at FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find user"))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn create_flight(&self, flight: &NewFlight) -> StoreResult<Flight> {
        let now = Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO flights
                (name, slug, company, departure, destination, flight_date, departure_time, arrival_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&flight.name)
        .bind(aerodesk_core::slugify(&flight.name))
        .bind(&flight.company)
        .bind(&flight.departure)
        .bind(&flight.destination)
        .bind(flight.flight_date.format(DATE_FORMAT).to_string())
        .bind(flight.departure_time.format(TIME_FORMAT).to_string())
        .bind(flight.arrival_time.format(TIME_FORMAT).to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("create flight"))?;
        self.get_flight(result.last_insert_rowid()).await
    }

    async fn get_flight(&self, id: i64) -> StoreResult<Flight> {
        let row = sqlx::query(&format!("SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get flight"))?;
        match row {
            Some(row) => flight_from_row(&row),
            None => Err(StoreError::not_found("flight", id)),
        }
    }

    async fn search_flights(&self, query: &FlightQuery) -> StoreResult<Vec<Flight>> {
        let mut clauses = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(ref destination) = query.destination {
            clauses.push("instr(destination, ?) > 0");
            binds.push(destination.clone());
        }
        if let Some(ref departure) = query.departure {
            clauses.push("instr(departure, ?) > 0");
            binds.push(departure.clone());
        }
        if let Some(date) = query.date {
            clauses.push("flight_date = ?");
            binds.push(date.format(DATE_FORMAT).to_string());
        }
        if let Some(time) = query.departure_time {
            clauses.push("departure_time = ?");
            binds.push(time.format(TIME_FORMAT).to_string());
        }

        let mut sql = format!("SELECT {FLIGHT_COLUMNS} FROM flights");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY flight_date, departure_time, id LIMIT 50");

        let mut q = sqlx::query(&sql);
        for value in &binds {
            q = q.bind(value);
        }
        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("search flights"))?;
        rows.iter().map(flight_from_row).collect()
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> StoreResult<Ticket> {
        // Surface a missing flight as NotFound rather than a bare FK failure.
        self.get_flight(ticket.flight_id).await?;

        let now = Utc::now().timestamp();
        let result = sqlx::query(
            "INSERT INTO tickets (flight_id, ticket_type, price, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(ticket.flight_id)
        .bind(&ticket.ticket_type)
        .bind(ticket.price)
        .bind(ticket.status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("create ticket"))?;
        self.get_ticket(result.last_insert_rowid()).await
    }

    async fn get_ticket(&self, id: i64) -> StoreResult<Ticket> {
        let row = sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get ticket"))?;
        match row {
            Some(row) => ticket_from_row(&row),
            None => Err(StoreError::not_found("ticket", id)),
        }
    }

    async fn tickets_for_flight(
        &self,
        flight_id: i64,
        status: Option<TicketStatus>,
    ) -> StoreResult<Vec<Ticket>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {TICKET_COLUMNS} FROM tickets WHERE flight_id = ? AND status = ? ORDER BY price, id"
                ))
                .bind(flight_id)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {TICKET_COLUMNS} FROM tickets WHERE flight_id = ? ORDER BY price, id"
                ))
                .bind(flight_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_error("list tickets"))?;
        rows.iter().map(ticket_from_row).collect()
    }

    async fn update_ticket_status(&self, id: i64, status: TicketStatus) -> StoreResult<Ticket> {
        let result = sqlx::query("UPDATE tickets SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().timestamp())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("update ticket"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("ticket", id));
        }
        self.get_ticket(id).await
    }

    async fn create_booking(&self, booking: &NewBooking) -> StoreResult<Booking> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await.map_err(db_error("begin booking"))?;

        claim_ticket(&mut tx, booking.ticket_id, None, now).await?;
        ensure_user(&mut tx, booking.user_id).await?;

        let result = sqlx::query(
            "INSERT INTO bookings (user_id, ticket_id, status, booked_by, created_at) VALUES (?, ?, ?, ?, ?)"
        )
        .bind(booking.user_id)
        .bind(booking.ticket_id)
        .bind(booking.status.as_str())
        .bind(&booking.booked_by)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("create booking"))?;
        let booking_id = result.last_insert_rowid();

        tx.commit().await.map_err(db_error("commit booking"))?;
        tracing::debug!("Booking {} created for ticket {}", booking_id, booking.ticket_id);
        self.get_booking(booking_id).await
    }

    async fn get_booking(&self, id: i64) -> StoreResult<Booking> {
        let row = sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get booking"))?;
        match row {
            Some(row) => booking_from_row(&row),
            None => Err(StoreError::not_found("booking", id)),
        }
    }

    async fn booking_details(&self, id: i64) -> StoreResult<BookingDetails> {
        let booking = self.get_booking(id).await?;
        let ticket = self.get_ticket(booking.ticket_id).await?;
        let flight = self.get_flight(ticket.flight_id).await?;
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE booking_id = ? ORDER BY id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list transactions"))?;
        let transactions = rows.iter().map(transaction_from_row).collect::<StoreResult<Vec<_>>>()?;
        Ok(BookingDetails {
            booking,
            ticket,
            flight,
            transactions,
        })
    }

    async fn create_transaction(&self, tx: &NewTransaction) -> StoreResult<Transaction> {
        self.get_user(tx.user_id).await?;
        self.get_booking(tx.booking_id).await?;

        let result = sqlx::query(
            "INSERT INTO transactions (user_id, booking_id, charges, status, created_at) VALUES (?, ?, ?, ?, ?)"
        )
        .bind(tx.user_id)
        .bind(tx.booking_id)
        .bind(tx.charges)
        .bind(tx.status.as_str())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_error("create transaction"))?;
        self.get_transaction(result.last_insert_rowid()).await
    }

    async fn book_flight(&self, request: &BookFlight) -> StoreResult<Reservation> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await.map_err(db_error("begin reservation"))?;

        claim_ticket(&mut tx, request.ticket_id, Some(request.flight_id), now).await?;
        ensure_user(&mut tx, request.user_id).await?;

        let booking_id = sqlx::query(
            "INSERT INTO bookings (user_id, ticket_id, status, booked_by, created_at) VALUES (?, ?, 'booked', ?, ?)"
        )
        .bind(request.user_id)
        .bind(request.ticket_id)
        .bind(AGENT_BOOKER)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("create booking"))?
        .last_insert_rowid();

        let transaction_id = sqlx::query(
            "INSERT INTO transactions (user_id, booking_id, charges, status, created_at) VALUES (?, ?, ?, 'success', ?)"
        )
        .bind(request.user_id)
        .bind(booking_id)
        .bind(request.charges)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("create transaction"))?
        .last_insert_rowid();

        tx.commit().await.map_err(db_error("commit reservation"))?;
        tracing::info!(
            "Reserved ticket {} on flight {} for user {} (booking {}, transaction {})",
            request.ticket_id,
            request.flight_id,
            request.user_id,
            booking_id,
            transaction_id
        );

        Ok(Reservation {
            booking: self.get_booking(booking_id).await?,
            transaction: self.get_transaction(transaction_id).await?,
        })
    }
}

// ============================================================================
// Transaction helpers
// ============================================================================

/// Flip an available ticket to booked as the first write of a transaction.
///
/// Writing first takes the database write lock up front, so two racing
/// reservations queue on it instead of both reading "available". When no
/// row changes, the ticket is re-read to say why.
async fn claim_ticket(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    ticket_id: i64,
    flight_id: Option<i64>,
    now: i64,
) -> StoreResult<()> {
    let claimed = sqlx::query(
        "UPDATE tickets SET status = 'booked', updated_at = ? \
         WHERE id = ? AND status = 'available' AND (? IS NULL OR flight_id = ?)"
    )
    .bind(now)
    .bind(ticket_id)
    .bind(flight_id)
    .bind(flight_id)
    .execute(&mut **tx)
    .await
    .map_err(db_error("claim ticket"))?
    .rows_affected();
    if claimed == 1 {
        return Ok(());
    }

    let row = sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"))
        .bind(ticket_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("check ticket"))?;
    let ticket = match row {
        Some(row) => ticket_from_row(&row)?,
        None => return Err(StoreError::not_found("ticket", ticket_id)),
    };
    match flight_id {
        Some(flight_id) if ticket.flight_id != flight_id => {
            let flight_exists = sqlx::query("SELECT 1 FROM flights WHERE id = ?")
                .bind(flight_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(db_error("check flight"))?
                .is_some();
            if !flight_exists {
                return Err(StoreError::not_found("flight", flight_id));
            }
            Err(StoreError::Constraint(format!(
                "ticket {} belongs to flight {}, not flight {}",
                ticket.id, ticket.flight_id, flight_id
            )))
        }
        _ => Err(StoreError::Constraint(format!(
            "ticket {} is not available (status: {})",
            ticket.id, ticket.status
        ))),
    }
}

async fn ensure_user(tx: &mut sqlx::Transaction<'_, Sqlite>, user_id: i64) -> StoreResult<()> {
    let exists = sqlx::query("SELECT 1 FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("check user"))?
        .is_some();
    if exists {
        Ok(())
    } else {
        Err(StoreError::not_found("user", user_id))
    }
}

impl SqliteStore {
    pub async fn get_transaction(&self, id: i64) -> StoreResult<Transaction> {
        let row = sqlx::query(&format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get transaction"))?;
        match row {
            Some(row) => transaction_from_row(&row),
            None => Err(StoreError::not_found("transaction", id)),
        }
    }

    /// Number of sessions with at least one stored message.
    pub async fn session_count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(DISTINCT session_id) AS n FROM session_messages")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count sessions")?;
        Ok(row.get("n"))
    }
}

// ============================================================================
// SessionStore
// ============================================================================

#[async_trait]
impl SessionStore for SqliteStore {
    async fn load(&self, session_id: &str) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT message_json FROM session_messages WHERE session_id = ? ORDER BY seq"
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load session {session_id}"))?;

        rows.iter()
            .map(|row| {
                let json: String = row.get("message_json");
                serde_json::from_str(&json).context("Failed to deserialize stored message")
            })
            .collect()
    }

    async fn append(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await.context("Failed to begin session append")?;
        for message in messages {
            let json = serde_json::to_string(message).context("Failed to serialize message")?;
            // seq is computed inside the INSERT so the read and the write are one statement.
            sqlx::query(
                r#"
                INSERT INTO session_messages (session_id, seq, role, message_json, created_at)
                VALUES (?, (SELECT COALESCE(MAX(seq), 0) + 1 FROM session_messages WHERE session_id = ?), ?, ?, ?)
                "#
            )
            .bind(session_id)
            .bind(session_id)
            .bind(message.role())
            .bind(&json)
            .bind(now)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to append to session {session_id}"))?;
        }
        tx.commit().await.context("Failed to commit session append")?;
        tracing::debug!("Appended {} message(s) to session {}", messages.len(), session_id);
        Ok(())
    }
}

// ============================================================================
// IdempotencyLedger
// ============================================================================

#[async_trait]
impl IdempotencyLedger for SqliteStore {
    async fn recall(&self, key: &str, fingerprint: &str) -> Result<Option<ToolOutcome>> {
        let row = sqlx::query("SELECT outcome_json FROM tool_ledger WHERE key = ? AND fingerprint = ?")
            .bind(key)
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query tool_ledger")?;
        match row {
            Some(row) => {
                let json: String = row.get("outcome_json");
                Ok(Some(serde_json::from_str(&json).context("Failed to deserialize outcome")?))
            }
            None => Ok(None),
        }
    }

    async fn record(&self, key: &str, fingerprint: &str, outcome: &ToolOutcome) -> Result<()> {
        let json = serde_json::to_string(outcome).context("Failed to serialize outcome")?;
        // First writer wins; a replay never overwrites the original outcome.
        sqlx::query(
            "INSERT OR IGNORE INTO tool_ledger (key, fingerprint, outcome_json, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(key)
        .bind(fingerprint)
        .bind(&json)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to record tool outcome")?;
        Ok(())
    }
}
