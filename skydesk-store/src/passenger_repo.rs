use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use skydesk_core::models::Passenger;
use skydesk_core::repository::{PassengerRepository, TextFilter};
use skydesk_core::{CoreError, CoreResult};
use skydesk_shared::{Masked, Page, PageRequest};
use uuid::Uuid;

use crate::database::{fetch_page, like_pattern, DbResultExt, PgStore};

#[derive(sqlx::FromRow)]
struct PassengerRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    date_of_birth: NaiveDate,
    nationality: Option<String>,
    passport_number: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PassengerRow> for Passenger {
    type Error = CoreError;

    fn try_from(row: PassengerRow) -> CoreResult<Self> {
        Ok(Passenger {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            date_of_birth: row.date_of_birth,
            nationality: row.nationality,
            passport_number: row.passport_number.map(Masked::from),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PASSENGER_COLUMNS: &str = "id, first_name, last_name, email, phone, date_of_birth, \
     nationality, passport_number, is_active, created_at, updated_at";

#[async_trait]
impl PassengerRepository for PgStore {
    async fn insert(&self, passenger: &Passenger) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO passengers (id, first_name, last_name, email, phone, date_of_birth,
                                    nationality, passport_number, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(passenger.id)
        .bind(&passenger.first_name)
        .bind(&passenger.last_name)
        .bind(&passenger.email)
        .bind(&passenger.phone)
        .bind(passenger.date_of_birth)
        .bind(&passenger.nationality)
        .bind(passenger.passport_number.as_ref().map(|p| p.inner().clone()))
        .bind(passenger.is_active)
        .bind(passenger.created_at)
        .bind(passenger.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Passenger>> {
        let row = sqlx::query_as::<_, PassengerRow>(&format!(
            "SELECT {} FROM passengers WHERE id = $1",
            PASSENGER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        row.map(Passenger::try_from).transpose()
    }

    async fn find_by_passport(&self, passport_number: &str) -> CoreResult<Option<Passenger>> {
        let row = sqlx::query_as::<_, PassengerRow>(&format!(
            "SELECT {} FROM passengers WHERE passport_number = $1",
            PASSENGER_COLUMNS
        ))
        .bind(passport_number)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        row.map(Passenger::try_from).transpose()
    }

    async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Passenger>> {
        let include_inactive = filter.include_inactive;
        let pattern = filter.q.as_deref().map(like_pattern);
        fetch_page::<PassengerRow, Passenger, _>(
            &self.pool,
            PASSENGER_COLUMNS,
            "FROM passengers WHERE TRUE",
            |qb| {
                if !include_inactive {
                    qb.push(" AND is_active");
                }
                if let Some(p) = &pattern {
                    qb.push(" AND (first_name ILIKE ")
                        .push_bind(p.clone())
                        .push(" OR last_name ILIKE ")
                        .push_bind(p.clone())
                        .push(" OR email ILIKE ")
                        .push_bind(p.clone())
                        .push(")");
                }
            },
            "last_name, first_name, id",
            page,
        )
        .await
    }

    async fn update(&self, passenger: &Passenger) -> CoreResult<()> {
        sqlx::query(
            r#"
            UPDATE passengers
            SET first_name = $2, last_name = $3, email = $4, phone = $5, date_of_birth = $6,
                nationality = $7, passport_number = $8, is_active = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(passenger.id)
        .bind(&passenger.first_name)
        .bind(&passenger.last_name)
        .bind(&passenger.email)
        .bind(&passenger.phone)
        .bind(passenger.date_of_birth)
        .bind(&passenger.nationality)
        .bind(passenger.passport_number.as_ref().map(|p| p.inner().clone()))
        .bind(passenger.is_active)
        .bind(passenger.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }
}
