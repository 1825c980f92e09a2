use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skydesk_core::models::{ClassFlight, Flight, FlightStatus};
use skydesk_core::repository::{ClassFlightRepository, FlightFilter, FlightRepository};
use skydesk_core::{CoreError, CoreResult};
use skydesk_shared::{Page, PageRequest};
use tracing::debug;
use uuid::Uuid;

use crate::booking_repo::release_booking;
use crate::database::{fetch_page, DbResultExt, PgStore};

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    airline_id: Uuid,
    airplane_id: Uuid,
    origin_airport_id: Uuid,
    destination_airport_id: Uuid,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    status: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FlightRow> for Flight {
    type Error = CoreError;

    fn try_from(row: FlightRow) -> CoreResult<Self> {
        Ok(Flight {
            id: row.id,
            flight_number: row.flight_number,
            airline_id: row.airline_id,
            airplane_id: row.airplane_id,
            origin_airport_id: row.origin_airport_id,
            destination_airport_id: row.destination_airport_id,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            status: row.status.parse()?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const FLIGHT_COLUMNS: &str = "id, flight_number, airline_id, airplane_id, origin_airport_id, \
     destination_airport_id, departure_time, arrival_time, status, is_active, created_at, updated_at";

/// Statuses in which a flight still holds its airplane.
fn status_moved(flight: &Flight, expected: FlightStatus) -> CoreError {
    CoreError::conflict(format!(
        "flight {} is no longer {}; reload and retry",
        flight.flight_number, expected
    ))
}

const PENDING_STATUSES: &str = "('SCHEDULED', 'DELAYED', 'BOARDING')";

#[async_trait]
impl FlightRepository for PgStore {
    async fn insert(&self, flight: &Flight) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO flights (id, flight_number, airline_id, airplane_id, origin_airport_id,
                                 destination_airport_id, departure_time, arrival_time, status,
                                 is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(flight.id)
        .bind(&flight.flight_number)
        .bind(flight.airline_id)
        .bind(flight.airplane_id)
        .bind(flight.origin_airport_id)
        .bind(flight.destination_airport_id)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.status.as_str())
        .bind(flight.is_active)
        .bind(flight.created_at)
        .bind(flight.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {} FROM flights WHERE id = $1",
            FLIGHT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        row.map(Flight::try_from).transpose()
    }

    async fn list(&self, filter: &FlightFilter, page: PageRequest) -> CoreResult<Page<Flight>> {
        let filter = filter.clone();
        fetch_page::<FlightRow, Flight, _>(
            &self.pool,
            FLIGHT_COLUMNS,
            "FROM flights WHERE TRUE",
            |qb| {
                if !filter.include_inactive {
                    qb.push(" AND is_active");
                }
                if let Some(airline_id) = filter.airline_id {
                    qb.push(" AND airline_id = ").push_bind(airline_id);
                }
                if let Some(airplane_id) = filter.airplane_id {
                    qb.push(" AND airplane_id = ").push_bind(airplane_id);
                }
                if let Some(status) = filter.status {
                    qb.push(" AND status = ").push_bind(status.as_str());
                }
            },
            "departure_time, flight_number",
            page,
        )
        .await
    }

    async fn update(&self, flight: &Flight, expected: FlightStatus) -> CoreResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE flights
            SET airplane_id = $2, origin_airport_id = $3, destination_airport_id = $4,
                departure_time = $5, arrival_time = $6, status = $7, is_active = $8, updated_at = $9
            WHERE id = $1 AND status = $10
            "#,
        )
        .bind(flight.id)
        .bind(flight.airplane_id)
        .bind(flight.origin_airport_id)
        .bind(flight.destination_airport_id)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.status.as_str())
        .bind(flight.is_active)
        .bind(flight.updated_at)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .db()?;
        if updated.rows_affected() == 0 {
            return Err(status_moved(flight, expected));
        }
        Ok(())
    }

    async fn cancel_with_bookings(&self, flight: &Flight, expected: FlightStatus) -> CoreResult<usize> {
        let at = flight.updated_at;
        let mut tx = self.pool.begin().await.db()?;

        let updated = sqlx::query(
            "UPDATE flights SET status = $2, updated_at = $3 WHERE id = $1 AND status = $4",
        )
        .bind(flight.id)
        .bind(flight.status.as_str())
        .bind(at)
        .bind(expected.as_str())
        .execute(&mut *tx)
        .await
        .db()?;
        if updated.rows_affected() == 0 {
            return Err(status_moved(flight, expected));
        }

        let cancelled: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE bookings
            SET status = 'CANCELLED', cancelled_at = $2, updated_at = $2
            WHERE flight_id = $1 AND status <> 'CANCELLED'
            RETURNING id
            "#,
        )
        .bind(flight.id)
        .bind(at)
        .fetch_all(&mut *tx)
        .await
        .db()?;
        for booking_id in &cancelled {
            release_booking(&mut tx, *booking_id, at).await?;
        }

        tx.commit().await.db()?;
        debug!("Cancelled flight {} with {} bookings", flight.flight_number, cancelled.len());
        Ok(cancelled.len())
    }

    async fn list_for_airplane(
        &self,
        airplane_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CoreResult<Vec<Flight>> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            r#"
            SELECT {} FROM flights
            WHERE airplane_id = $1
              AND is_active
              AND status IN {}
              AND departure_time < $3
              AND arrival_time > $2
            ORDER BY departure_time
            "#,
            FLIGHT_COLUMNS, PENDING_STATUSES
        ))
        .bind(airplane_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .db()?;
        rows.into_iter().map(Flight::try_from).collect()
    }

    async fn search(
        &self,
        origin_airport_id: Uuid,
        destination_airport_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CoreResult<Vec<Flight>> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            r#"
            SELECT {} FROM flights
            WHERE origin_airport_id = $1
              AND destination_airport_id = $2
              AND is_active
              AND status IN ('SCHEDULED', 'DELAYED')
              AND departure_time >= $3
              AND departure_time < $4
            ORDER BY departure_time, flight_number
            "#,
            FLIGHT_COLUMNS
        ))
        .bind(origin_airport_id)
        .bind(destination_airport_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .db()?;
        rows.into_iter().map(Flight::try_from).collect()
    }

    async fn count_pending_by_airplane(&self, airplane_id: Uuid) -> CoreResult<i64> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM flights WHERE airplane_id = $1 AND is_active AND status IN {}",
            PENDING_STATUSES
        ))
        .bind(airplane_id)
        .fetch_one(&self.pool)
        .await
        .db()
    }
}

#[derive(sqlx::FromRow)]
struct ClassFlightRow {
    id: Uuid,
    flight_id: Uuid,
    seat_class_id: Uuid,
    price_cents: i64,
    currency: String,
    total_seats: i32,
    available_seats: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClassFlightRow> for ClassFlight {
    fn from(row: ClassFlightRow) -> Self {
        ClassFlight {
            id: row.id,
            flight_id: row.flight_id,
            seat_class_id: row.seat_class_id,
            price_cents: row.price_cents,
            currency: row.currency,
            total_seats: row.total_seats,
            available_seats: row.available_seats,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CLASS_FLIGHT_COLUMNS: &str = "id, flight_id, seat_class_id, price_cents, currency, \
     total_seats, available_seats, is_active, created_at, updated_at";

#[async_trait]
impl ClassFlightRepository for PgStore {
    async fn insert(&self, class_flight: &ClassFlight) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO class_flights (id, flight_id, seat_class_id, price_cents, currency,
                                       total_seats, available_seats, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(class_flight.id)
        .bind(class_flight.flight_id)
        .bind(class_flight.seat_class_id)
        .bind(class_flight.price_cents)
        .bind(&class_flight.currency)
        .bind(class_flight.total_seats)
        .bind(class_flight.available_seats)
        .bind(class_flight.is_active)
        .bind(class_flight.created_at)
        .bind(class_flight.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<ClassFlight>> {
        let row = sqlx::query_as::<_, ClassFlightRow>(&format!(
            "SELECT {} FROM class_flights WHERE id = $1",
            CLASS_FLIGHT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        Ok(row.map(ClassFlight::from))
    }

    async fn find_by_flight_and_class(
        &self,
        flight_id: Uuid,
        seat_class_id: Uuid,
    ) -> CoreResult<Option<ClassFlight>> {
        let row = sqlx::query_as::<_, ClassFlightRow>(&format!(
            "SELECT {} FROM class_flights WHERE flight_id = $1 AND seat_class_id = $2",
            CLASS_FLIGHT_COLUMNS
        ))
        .bind(flight_id)
        .bind(seat_class_id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        Ok(row.map(ClassFlight::from))
    }

    async fn list_by_flight(&self, flight_id: Uuid) -> CoreResult<Vec<ClassFlight>> {
        let rows = sqlx::query_as::<_, ClassFlightRow>(&format!(
            "SELECT {} FROM class_flights WHERE flight_id = $1 ORDER BY created_at",
            CLASS_FLIGHT_COLUMNS
        ))
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .db()?;
        Ok(rows.into_iter().map(ClassFlight::from).collect())
    }

    async fn update(&self, class_flight: &ClassFlight) -> CoreResult<ClassFlight> {
        // Resize relative to the stored pool so concurrent sales are never lost.
        let row = sqlx::query_as::<_, ClassFlightRow>(&format!(
            r#"
            UPDATE class_flights
            SET price_cents = $2,
                available_seats = available_seats + ($3 - total_seats),
                total_seats = $3,
                is_active = $4,
                updated_at = $5
            WHERE id = $1
              AND total_seats - available_seats <= $3
              AND ($4 OR NOT is_active OR total_seats = available_seats)
            RETURNING {}
            "#,
            CLASS_FLIGHT_COLUMNS
        ))
        .bind(class_flight.id)
        .bind(class_flight.price_cents)
        .bind(class_flight.total_seats)
        .bind(class_flight.is_active)
        .bind(class_flight.updated_at)
        .fetch_optional(&self.pool)
        .await
        .db()?;

        row.map(ClassFlight::from).ok_or_else(|| {
            CoreError::conflict(format!(
                "class flight {} has sold seats that this change would drop",
                class_flight.id
            ))
        })
    }
}
