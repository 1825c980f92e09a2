use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skydesk_core::models::{Airplane, Seat};
use skydesk_core::repository::{AirplaneFilter, AirplaneRepository, SeatFilter, SeatRepository};
use skydesk_core::{CoreError, CoreResult};
use skydesk_shared::{Page, PageRequest};
use uuid::Uuid;

use crate::database::{fetch_page, DbResultExt, PgStore};

#[derive(sqlx::FromRow)]
struct AirplaneRow {
    id: Uuid,
    airline_id: Uuid,
    registration_code: String,
    model: String,
    manufacturer: String,
    year_built: Option<i32>,
    status: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AirplaneRow> for Airplane {
    type Error = CoreError;

    fn try_from(row: AirplaneRow) -> CoreResult<Self> {
        Ok(Airplane {
            id: row.id,
            airline_id: row.airline_id,
            registration_code: row.registration_code,
            model: row.model,
            manufacturer: row.manufacturer,
            year_built: row.year_built,
            status: row.status.parse()?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const AIRPLANE_COLUMNS: &str = "id, airline_id, registration_code, model, manufacturer, \
     year_built, status, is_active, created_at, updated_at";

#[async_trait]
impl AirplaneRepository for PgStore {
    async fn insert(&self, airplane: &Airplane) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO airplanes (id, airline_id, registration_code, model, manufacturer,
                                   year_built, status, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(airplane.id)
        .bind(airplane.airline_id)
        .bind(&airplane.registration_code)
        .bind(&airplane.model)
        .bind(&airplane.manufacturer)
        .bind(airplane.year_built)
        .bind(airplane.status.as_str())
        .bind(airplane.is_active)
        .bind(airplane.created_at)
        .bind(airplane.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Airplane>> {
        let row = sqlx::query_as::<_, AirplaneRow>(&format!(
            "SELECT {} FROM airplanes WHERE id = $1",
            AIRPLANE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        row.map(Airplane::try_from).transpose()
    }

    async fn list(&self, filter: &AirplaneFilter, page: PageRequest) -> CoreResult<Page<Airplane>> {
        let filter = filter.clone();
        fetch_page::<AirplaneRow, Airplane, _>(
            &self.pool,
            AIRPLANE_COLUMNS,
            "FROM airplanes WHERE TRUE",
            |qb| {
                if !filter.include_inactive {
                    qb.push(" AND is_active");
                }
                if let Some(airline_id) = filter.airline_id {
                    qb.push(" AND airline_id = ").push_bind(airline_id);
                }
                if let Some(status) = filter.status {
                    qb.push(" AND status = ").push_bind(status.as_str());
                }
            },
            "registration_code",
            page,
        )
        .await
    }

    async fn update(&self, airplane: &Airplane) -> CoreResult<()> {
        sqlx::query(
            r#"
            UPDATE airplanes
            SET model = $2, manufacturer = $3, year_built = $4, status = $5, is_active = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(airplane.id)
        .bind(&airplane.model)
        .bind(&airplane.manufacturer)
        .bind(airplane.year_built)
        .bind(airplane.status.as_str())
        .bind(airplane.is_active)
        .bind(airplane.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn count_active_by_airline(&self, airline_id: Uuid) -> CoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM airplanes WHERE airline_id = $1 AND is_active")
            .bind(airline_id)
            .fetch_one(&self.pool)
            .await
            .db()
    }
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    airplane_id: Uuid,
    seat_class_id: Uuid,
    seat_row: i32,
    letter: String,
    seat_number: String,
    seat_position: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SeatRow> for Seat {
    type Error = CoreError;

    fn try_from(row: SeatRow) -> CoreResult<Self> {
        Ok(Seat {
            id: row.id,
            airplane_id: row.airplane_id,
            seat_class_id: row.seat_class_id,
            row: row.seat_row,
            letter: row.letter,
            seat_number: row.seat_number,
            position: row.seat_position.parse()?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SEAT_COLUMNS: &str = "id, airplane_id, seat_class_id, seat_row, letter, seat_number, \
     seat_position, is_active, created_at, updated_at";

#[async_trait]
impl SeatRepository for PgStore {
    async fn insert_many(&self, seats: &[Seat]) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.db()?;
        for seat in seats {
            sqlx::query(
                r#"
                INSERT INTO seats (id, airplane_id, seat_class_id, seat_row, letter, seat_number,
                                   seat_position, is_active, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(seat.id)
            .bind(seat.airplane_id)
            .bind(seat.seat_class_id)
            .bind(seat.row)
            .bind(&seat.letter)
            .bind(&seat.seat_number)
            .bind(seat.position.as_str())
            .bind(seat.is_active)
            .bind(seat.created_at)
            .bind(seat.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| match crate::database::map_db_error(e) {
                CoreError::Conflict(_) => {
                    CoreError::conflict(format!("seat {} already exists", seat.seat_number))
                }
                other => other,
            })?;
        }
        tx.commit().await.db()?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Seat>> {
        let row = sqlx::query_as::<_, SeatRow>(&format!("SELECT {} FROM seats WHERE id = $1", SEAT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .db()?;
        row.map(Seat::try_from).transpose()
    }

    async fn list_by_airplane(&self, airplane_id: Uuid, filter: &SeatFilter) -> CoreResult<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(&format!(
            r#"
            SELECT {} FROM seats
            WHERE airplane_id = $1
              AND ($2::UUID IS NULL OR seat_class_id = $2)
              AND (is_active OR $3)
            ORDER BY seat_row, letter
            "#,
            SEAT_COLUMNS
        ))
        .bind(airplane_id)
        .bind(filter.seat_class_id)
        .bind(filter.include_inactive)
        .fetch_all(&self.pool)
        .await
        .db()?;
        rows.into_iter().map(Seat::try_from).collect()
    }

    async fn update(&self, seat: &Seat) -> CoreResult<()> {
        sqlx::query(
            r#"
            UPDATE seats
            SET seat_class_id = $2, seat_position = $3, is_active = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(seat.id)
        .bind(seat.seat_class_id)
        .bind(seat.position.as_str())
        .bind(seat.is_active)
        .bind(seat.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn count_active(&self, airplane_id: Uuid, seat_class_id: Uuid) -> CoreResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM seats WHERE airplane_id = $1 AND seat_class_id = $2 AND is_active",
        )
        .bind(airplane_id)
        .bind(seat_class_id)
        .fetch_one(&self.pool)
        .await
        .db()
    }
}
