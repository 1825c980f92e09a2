use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{required, string_enum};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AirplaneStatus {
    Active,
    Maintenance,
    Retired,
}

string_enum!(AirplaneStatus {
    Active => "ACTIVE",
    Maintenance => "MAINTENANCE",
    Retired => "RETIRED",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Airplane {
    pub id: Uuid,
    pub airline_id: Uuid,
    pub registration_code: String,
    pub model: String,
    pub manufacturer: String,
    pub year_built: Option<i32>,
    pub status: AirplaneStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAirplane {
    pub airline_id: Uuid,
    pub model: String,
    pub manufacturer: String,
    pub year_built: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAirplane {
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub year_built: Option<i32>,
    pub status: Option<AirplaneStatus>,
    pub is_active: Option<bool>,
}

fn check_year(year: Option<i32>) -> CoreResult<Option<i32>> {
    if let Some(y) = year {
        let latest = Utc::now().year() + 1;
        if !(1950..=latest).contains(&y) {
            return Err(CoreError::validation(format!(
                "year_built {} must be between 1950 and {}",
                y, latest
            )));
        }
    }
    Ok(year)
}

impl Airplane {
    /// Builds a new airplane; the registration code is assigned by the caller.
    pub fn new(req: &CreateAirplane, registration_code: String) -> CoreResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            airline_id: req.airline_id,
            registration_code,
            model: required("model", &req.model)?,
            manufacturer: required("manufacturer", &req.manufacturer)?,
            year_built: check_year(req.year_built)?,
            status: AirplaneStatus::Active,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, req: &UpdateAirplane) -> CoreResult<()> {
        if let Some(model) = &req.model {
            self.model = required("model", model)?;
        }
        if let Some(manufacturer) = &req.manufacturer {
            self.manufacturer = required("manufacturer", manufacturer)?;
        }
        if req.year_built.is_some() {
            self.year_built = check_year(req.year_built)?;
        }
        if let Some(status) = req.status {
            self.status = status;
        }
        if let Some(active) = req.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Whether the airplane can be assigned to new flights.
    pub fn is_operational(&self) -> bool {
        self.is_active && self.status == AirplaneStatus::Active
    }
}
