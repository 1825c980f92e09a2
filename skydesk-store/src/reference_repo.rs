use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skydesk_core::models::{Airline, Airport, SeatClass};
use skydesk_core::repository::{AirlineRepository, AirportRepository, SeatClassRepository, TextFilter};
use skydesk_core::{CoreError, CoreResult};
use skydesk_shared::{Page, PageRequest};
use uuid::Uuid;

use crate::database::{fetch_page, like_pattern, DbResultExt, PgStore};

#[derive(sqlx::FromRow)]
struct AirlineRow {
    id: Uuid,
    code: String,
    name: String,
    country: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AirlineRow> for Airline {
    type Error = CoreError;

    fn try_from(row: AirlineRow) -> CoreResult<Self> {
        Ok(Airline {
            id: row.id,
            code: row.code,
            name: row.name,
            country: row.country,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const AIRLINE_COLUMNS: &str = "id, code, name, country, is_active, created_at, updated_at";

#[async_trait]
impl AirlineRepository for PgStore {
    async fn insert(&self, airline: &Airline) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO airlines (id, code, name, country, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(airline.id)
        .bind(&airline.code)
        .bind(&airline.name)
        .bind(&airline.country)
        .bind(airline.is_active)
        .bind(airline.created_at)
        .bind(airline.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Airline>> {
        let row = sqlx::query_as::<_, AirlineRow>(&format!(
            "SELECT {} FROM airlines WHERE id = $1",
            AIRLINE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        row.map(Airline::try_from).transpose()
    }

    async fn find_by_code(&self, code: &str) -> CoreResult<Option<Airline>> {
        let row = sqlx::query_as::<_, AirlineRow>(&format!(
            "SELECT {} FROM airlines WHERE code = $1",
            AIRLINE_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        row.map(Airline::try_from).transpose()
    }

    async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Airline>> {
        let include_inactive = filter.include_inactive;
        let pattern = filter.q.as_deref().map(like_pattern);
        fetch_page::<AirlineRow, Airline, _>(
            &self.pool,
            AIRLINE_COLUMNS,
            "FROM airlines WHERE TRUE",
            |qb| {
                if !include_inactive {
                    qb.push(" AND is_active");
                }
                if let Some(p) = &pattern {
                    qb.push(" AND (code ILIKE ")
                        .push_bind(p.clone())
                        .push(" OR name ILIKE ")
                        .push_bind(p.clone())
                        .push(")");
                }
            },
            "code",
            page,
        )
        .await
    }

    async fn update(&self, airline: &Airline) -> CoreResult<()> {
        sqlx::query(
            r#"
            UPDATE airlines
            SET name = $2, country = $3, is_active = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(airline.id)
        .bind(&airline.name)
        .bind(&airline.country)
        .bind(airline.is_active)
        .bind(airline.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct AirportRow {
    id: Uuid,
    iata_code: String,
    name: String,
    city: String,
    country: String,
    timezone: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AirportRow> for Airport {
    type Error = CoreError;

    fn try_from(row: AirportRow) -> CoreResult<Self> {
        Ok(Airport {
            id: row.id,
            iata_code: row.iata_code,
            name: row.name,
            city: row.city,
            country: row.country,
            timezone: row.timezone,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const AIRPORT_COLUMNS: &str =
    "id, iata_code, name, city, country, timezone, is_active, created_at, updated_at";

#[async_trait]
impl AirportRepository for PgStore {
    async fn insert(&self, airport: &Airport) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO airports (id, iata_code, name, city, country, timezone, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(airport.id)
        .bind(&airport.iata_code)
        .bind(&airport.name)
        .bind(&airport.city)
        .bind(&airport.country)
        .bind(&airport.timezone)
        .bind(airport.is_active)
        .bind(airport.created_at)
        .bind(airport.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Airport>> {
        let row = sqlx::query_as::<_, AirportRow>(&format!(
            "SELECT {} FROM airports WHERE id = $1",
            AIRPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        row.map(Airport::try_from).transpose()
    }

    async fn find_by_iata(&self, iata_code: &str) -> CoreResult<Option<Airport>> {
        let row = sqlx::query_as::<_, AirportRow>(&format!(
            "SELECT {} FROM airports WHERE iata_code = $1",
            AIRPORT_COLUMNS
        ))
        .bind(iata_code)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        row.map(Airport::try_from).transpose()
    }

    async fn list(&self, filter: &TextFilter, page: PageRequest) -> CoreResult<Page<Airport>> {
        let include_inactive = filter.include_inactive;
        let pattern = filter.q.as_deref().map(like_pattern);
        fetch_page::<AirportRow, Airport, _>(
            &self.pool,
            AIRPORT_COLUMNS,
            "FROM airports WHERE TRUE",
            |qb| {
                if !include_inactive {
                    qb.push(" AND is_active");
                }
                if let Some(p) = &pattern {
                    qb.push(" AND (iata_code ILIKE ")
                        .push_bind(p.clone())
                        .push(" OR name ILIKE ")
                        .push_bind(p.clone())
                        .push(" OR city ILIKE ")
                        .push_bind(p.clone())
                        .push(")");
                }
            },
            "iata_code",
            page,
        )
        .await
    }

    async fn update(&self, airport: &Airport) -> CoreResult<()> {
        sqlx::query(
            r#"
            UPDATE airports
            SET name = $2, city = $3, country = $4, timezone = $5, is_active = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(airport.id)
        .bind(&airport.name)
        .bind(&airport.city)
        .bind(&airport.country)
        .bind(&airport.timezone)
        .bind(airport.is_active)
        .bind(airport.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SeatClassRow {
    id: Uuid,
    code: String,
    name: String,
    description: Option<String>,
    rank: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SeatClassRow> for SeatClass {
    fn from(row: SeatClassRow) -> Self {
        SeatClass {
            id: row.id,
            code: row.code,
            name: row.name,
            description: row.description,
            rank: row.rank,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SEAT_CLASS_COLUMNS: &str =
    "id, code, name, description, rank, is_active, created_at, updated_at";

#[async_trait]
impl SeatClassRepository for PgStore {
    async fn insert(&self, seat_class: &SeatClass) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO seat_classes (id, code, name, description, rank, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(seat_class.id)
        .bind(&seat_class.code)
        .bind(&seat_class.name)
        .bind(&seat_class.description)
        .bind(seat_class.rank)
        .bind(seat_class.is_active)
        .bind(seat_class.created_at)
        .bind(seat_class.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<SeatClass>> {
        let row = sqlx::query_as::<_, SeatClassRow>(&format!(
            "SELECT {} FROM seat_classes WHERE id = $1",
            SEAT_CLASS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        Ok(row.map(SeatClass::from))
    }

    async fn find_by_code(&self, code: &str) -> CoreResult<Option<SeatClass>> {
        let row = sqlx::query_as::<_, SeatClassRow>(&format!(
            "SELECT {} FROM seat_classes WHERE code = $1",
            SEAT_CLASS_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .db()?;
        Ok(row.map(SeatClass::from))
    }

    async fn list(&self, include_inactive: bool) -> CoreResult<Vec<SeatClass>> {
        let rows = sqlx::query_as::<_, SeatClassRow>(&format!(
            "SELECT {} FROM seat_classes WHERE is_active OR $1 ORDER BY rank, code",
            SEAT_CLASS_COLUMNS
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .db()?;
        Ok(rows.into_iter().map(SeatClass::from).collect())
    }

    async fn update(&self, seat_class: &SeatClass) -> CoreResult<()> {
        sqlx::query(
            r#"
            UPDATE seat_classes
            SET name = $2, description = $3, rank = $4, is_active = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(seat_class.id)
        .bind(&seat_class.name)
        .bind(&seat_class.description)
        .bind(seat_class.rank)
        .bind(seat_class.is_active)
        .bind(seat_class.updated_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }
}
