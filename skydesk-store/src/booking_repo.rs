use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skydesk_core::models::{Billing, Booking, PayBilling, Ticket};
use skydesk_core::repository::{BillingFilter, BillingRepository, BookingFilter, BookingRepository};
use skydesk_core::{CoreError, CoreResult};
use skydesk_shared::{Page, PageRequest};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::database::{fetch_page, DbResultExt, PgStore};

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_number: String,
    flight_id: Uuid,
    contact_email: String,
    contact_phone: Option<String>,
    status: String,
    total_cents: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

/// Tickets are attached separately; see `attach_tickets`.
impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> CoreResult<Self> {
        Ok(Booking {
            id: row.id,
            booking_number: row.booking_number,
            flight_id: row.flight_id,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            status: row.status.parse()?,
            total_cents: row.total_cents,
            currency: row.currency,
            tickets: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, booking_number, flight_id, contact_email, contact_phone, status, \
     total_cents, currency, created_at, updated_at, cancelled_at";

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    booking_id: Uuid,
    passenger_id: Uuid,
    class_flight_id: Uuid,
    seat_id: Option<Uuid>,
    price_cents: i64,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Ticket {
            id: row.id,
            booking_id: row.booking_id,
            passenger_id: row.passenger_id,
            class_flight_id: row.class_flight_id,
            seat_id: row.seat_id,
            price_cents: row.price_cents,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BillingRow {
    id: Uuid,
    booking_id: Uuid,
    invoice_number: String,
    amount_cents: i64,
    currency: String,
    status: String,
    payment_method: Option<String>,
    transaction_ref: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    refunded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BillingRow> for Billing {
    type Error = CoreError;

    fn try_from(row: BillingRow) -> CoreResult<Self> {
        Ok(Billing {
            id: row.id,
            booking_id: row.booking_id,
            invoice_number: row.invoice_number,
            amount_cents: row.amount_cents,
            currency: row.currency,
            status: row.status.parse()?,
            payment_method: row.payment_method.map(|m| m.parse()).transpose()?,
            transaction_ref: row.transaction_ref,
            paid_at: row.paid_at,
            refunded_at: row.refunded_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const BILLING_COLUMNS: &str = "id, booking_id, invoice_number, amount_cents, currency, status, \
     payment_method, transaction_ref, paid_at, refunded_at, created_at, updated_at";

async fn attach_tickets(pool: &PgPool, bookings: &mut [Booking]) -> CoreResult<()> {
    if bookings.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();
    let rows = sqlx::query_as::<_, TicketRow>(
        r#"
        SELECT id, booking_id, passenger_id, class_flight_id, seat_id, price_cents
        FROM tickets
        WHERE booking_id = ANY($1)
        ORDER BY booking_id, ordinal
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await
    .db()?;

    let mut by_booking: HashMap<Uuid, Vec<Ticket>> = HashMap::new();
    for row in rows {
        by_booking.entry(row.booking_id).or_default().push(Ticket::from(row));
    }
    for booking in bookings.iter_mut() {
        booking.tickets = by_booking.remove(&booking.id).unwrap_or_default();
    }
    Ok(())
}

async fn load_booking(pool: &PgPool, row: Option<BookingRow>) -> CoreResult<Option<Booking>> {
    match row {
        Some(row) => {
            let mut bookings = [Booking::try_from(row)?];
            attach_tickets(pool, &mut bookings).await?;
            let [booking] = bookings;
            Ok(Some(booking))
        }
        None => Ok(None),
    }
}

async fn booking_exists(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> CoreResult<bool> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bookings WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .db()
}

/// Returns the seats of a just-cancelled booking, retires its tickets and
/// refunds or voids its billing.
pub(crate) async fn release_booking(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: Uuid,
    at: DateTime<Utc>,
) -> CoreResult<()> {
    sqlx::query(
        r#"
        UPDATE class_flights cf
        SET available_seats = cf.available_seats + t.seats, updated_at = $2
        FROM (
            SELECT class_flight_id, COUNT(*)::INT AS seats
            FROM tickets
            WHERE booking_id = $1 AND is_active
            GROUP BY class_flight_id
        ) t
        WHERE cf.id = t.class_flight_id
        "#,
    )
    .bind(booking_id)
    .bind(at)
    .execute(&mut **tx)
    .await
    .db()?;

    sqlx::query("UPDATE tickets SET is_active = FALSE WHERE booking_id = $1")
        .bind(booking_id)
        .execute(&mut **tx)
        .await
        .db()?;

    sqlx::query(
        r#"
        UPDATE billings
        SET status = CASE status WHEN 'PAID' THEN 'REFUNDED' WHEN 'UNPAID' THEN 'VOID' ELSE status END,
            refunded_at = CASE WHEN status = 'PAID' THEN $2 ELSE refunded_at END,
            updated_at = $2
        WHERE booking_id = $1
        "#,
    )
    .bind(booking_id)
    .bind(at)
    .execute(&mut **tx)
    .await
    .db()?;
    Ok(())
}

#[async_trait]
impl BookingRepository for PgStore {
    async fn create(&self, booking: &Booking, billing: &Billing) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.db()?;

        // Row lock: a concurrent cancel or status change waits for this sale, or wins before it.
        let open: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM flights
            WHERE id = $1 AND is_active AND status IN ('SCHEDULED', 'DELAYED')
            FOR SHARE
            "#,
        )
        .bind(booking.flight_id)
        .fetch_optional(&mut *tx)
        .await
        .db()?;
        if open.is_none() {
            return Err(CoreError::conflict(format!(
                "flight {} is no longer open for booking",
                booking.flight_id
            )));
        }

        for (class_flight_id, seats) in booking.seats_per_class() {
            let taken = sqlx::query(
                r#"
                UPDATE class_flights
                SET available_seats = available_seats - $2, updated_at = $3
                WHERE id = $1 AND is_active AND available_seats >= $2
                "#,
            )
            .bind(class_flight_id)
            .bind(seats)
            .bind(booking.created_at)
            .execute(&mut *tx)
            .await
            .db()?;
            if taken.rows_affected() == 0 {
                return Err(CoreError::conflict(format!(
                    "class flight {} has fewer than {} seats left",
                    class_flight_id, seats
                )));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (id, booking_number, flight_id, contact_email, contact_phone, status,
                                  total_cents, currency, created_at, updated_at, cancelled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_number)
        .bind(booking.flight_id)
        .bind(&booking.contact_email)
        .bind(&booking.contact_phone)
        .bind(booking.status.as_str())
        .bind(booking.total_cents)
        .bind(&booking.currency)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .bind(booking.cancelled_at)
        .execute(&mut *tx)
        .await
        .db()?;

        for (ordinal, ticket) in booking.tickets.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO tickets (id, booking_id, flight_id, passenger_id, class_flight_id,
                                     seat_id, price_cents, ordinal, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
                "#,
            )
            .bind(ticket.id)
            .bind(booking.id)
            .bind(booking.flight_id)
            .bind(ticket.passenger_id)
            .bind(ticket.class_flight_id)
            .bind(ticket.seat_id)
            .bind(ticket.price_cents)
            .bind(ordinal as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| match crate::database::map_db_error(e) {
                CoreError::Conflict(_) => CoreError::conflict(format!(
                    "seat or passenger of ticket {} is already booked on this flight",
                    ticket.id
                )),
                other => other,
            })?;
        }

        sqlx::query(
            r#"
            INSERT INTO billings (id, booking_id, invoice_number, amount_cents, currency, status,
                                  payment_method, transaction_ref, paid_at, refunded_at,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(billing.id)
        .bind(billing.booking_id)
        .bind(&billing.invoice_number)
        .bind(billing.amount_cents)
        .bind(&billing.currency)
        .bind(billing.status.as_str())
        .bind(billing.payment_method.map(|m| m.as_str()))
        .bind(&billing.transaction_ref)
        .bind(billing.paid_at)
        .bind(billing.refunded_at)
        .bind(billing.created_at)
        .bind(billing.updated_at)
        .execute(&mut *tx)
        .await
        .db()?;

        tx.commit().await.db()?;
        debug!("Stored booking {} with {} tickets", booking.booking_number, booking.tickets.len());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        load_booking(&self.pool, row).await
    }

    async fn find_by_number(&self, booking_number: &str) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE booking_number = $1",
            BOOKING_COLUMNS
        ))
        .bind(booking_number)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        load_booking(&self.pool, row).await
    }

    async fn list(&self, filter: &BookingFilter, page: PageRequest) -> CoreResult<Page<Booking>> {
        let filter = filter.clone();
        let mut result = fetch_page::<BookingRow, Booking, _>(
            &self.pool,
            BOOKING_COLUMNS,
            "FROM bookings WHERE TRUE",
            |qb| {
                if let Some(flight_id) = filter.flight_id {
                    qb.push(" AND flight_id = ").push_bind(flight_id);
                }
                if let Some(passenger_id) = filter.passenger_id {
                    qb.push(" AND id IN (SELECT booking_id FROM tickets WHERE passenger_id = ")
                        .push_bind(passenger_id)
                        .push(")");
                }
                if let Some(status) = filter.status {
                    qb.push(" AND status = ").push_bind(status.as_str());
                }
            },
            "created_at DESC, booking_number DESC",
            page,
        )
        .await?;
        attach_tickets(&self.pool, &mut result.items).await?;
        Ok(result)
    }

    async fn cancel(&self, id: Uuid, at: DateTime<Utc>) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.db()?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = 'CANCELLED', cancelled_at = $2, updated_at = $2
            WHERE id = $1 AND status <> 'CANCELLED'
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await
        .db()?;

        let row = match row {
            Some(row) => row,
            None if booking_exists(&mut tx, id).await? => {
                return Err(CoreError::conflict(format!("booking {} is already cancelled", id)));
            }
            None => return Err(CoreError::not_found("booking", id)),
        };

        release_booking(&mut tx, id, at).await?;

        tx.commit().await.db()?;

        load_booking(&self.pool, Some(row))
            .await?
            .ok_or_else(|| CoreError::not_found("booking", id))
    }

    async fn taken_seat_ids(&self, flight_id: Uuid) -> CoreResult<Vec<Uuid>> {
        sqlx::query_scalar(
            "SELECT seat_id FROM tickets WHERE flight_id = $1 AND is_active AND seat_id IS NOT NULL",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .db()
    }

    async fn booked_passenger_ids(&self, flight_id: Uuid) -> CoreResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT passenger_id FROM tickets WHERE flight_id = $1 AND is_active")
            .bind(flight_id)
            .fetch_all(&self.pool)
            .await
            .db()
    }

    async fn active_ids_for_flight(&self, flight_id: Uuid) -> CoreResult<Vec<Uuid>> {
        sqlx::query_scalar(
            "SELECT id FROM bookings WHERE flight_id = $1 AND status <> 'CANCELLED' ORDER BY created_at",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .db()
    }
}

#[async_trait]
impl BillingRepository for PgStore {
    async fn find(&self, id: Uuid) -> CoreResult<Option<Billing>> {
        let row = sqlx::query_as::<_, BillingRow>(&format!(
            "SELECT {} FROM billings WHERE id = $1",
            BILLING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        row.map(Billing::try_from).transpose()
    }

    async fn find_by_booking(&self, booking_id: Uuid) -> CoreResult<Option<Billing>> {
        let row = sqlx::query_as::<_, BillingRow>(&format!(
            "SELECT {} FROM billings WHERE booking_id = $1",
            BILLING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        row.map(Billing::try_from).transpose()
    }

    async fn list(&self, filter: &BillingFilter, page: PageRequest) -> CoreResult<Page<Billing>> {
        let status = filter.status;
        fetch_page::<BillingRow, Billing, _>(
            &self.pool,
            BILLING_COLUMNS,
            "FROM billings WHERE TRUE",
            |qb| {
                if let Some(status) = status {
                    qb.push(" AND status = ").push_bind(status.as_str());
                }
            },
            "created_at DESC, invoice_number DESC",
            page,
        )
        .await
    }

    async fn pay(&self, id: Uuid, payment: &PayBilling, at: DateTime<Utc>) -> CoreResult<Billing> {
        let mut tx = self.pool.begin().await.db()?;

        let row = sqlx::query_as::<_, BillingRow>(&format!(
            r#"
            UPDATE billings
            SET status = 'PAID', payment_method = $2, transaction_ref = $3, paid_at = $4, updated_at = $4
            WHERE id = $1 AND status = 'UNPAID'
            RETURNING {}
            "#,
            BILLING_COLUMNS
        ))
        .bind(id)
        .bind(payment.payment_method.as_str())
        .bind(&payment.transaction_ref)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await
        .db()?;

        let Some(row) = row else {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM billings WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .db()?;
            return Err(if exists {
                CoreError::conflict(format!("billing {} is not awaiting payment", id))
            } else {
                CoreError::not_found("billing", id)
            });
        };

        let confirmed = sqlx::query(
            "UPDATE bookings SET status = 'CONFIRMED', updated_at = $2 WHERE id = $1 AND status = 'PENDING'",
        )
        .bind(row.booking_id)
        .bind(at)
        .execute(&mut *tx)
        .await
        .db()?;
        if confirmed.rows_affected() == 0 {
            return Err(CoreError::conflict(format!(
                "booking {} is no longer pending",
                row.booking_id
            )));
        }

        tx.commit().await.db()?;
        Billing::try_from(row)
    }
}
