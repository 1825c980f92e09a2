use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{optional, required};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Airport {
    pub id: Uuid,
    pub iata_code: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub timezone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAirport {
    pub iata_code: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAirport {
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
    pub is_active: Option<bool>,
}

pub fn normalize_iata(code: &str) -> CoreResult<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::validation(format!(
            "IATA code '{}' must be exactly 3 letters",
            code
        )));
    }
    Ok(code)
}

impl Airport {
    pub fn new(req: &CreateAirport) -> CoreResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            iata_code: normalize_iata(&req.iata_code)?,
            name: required("name", &req.name)?,
            city: required("city", &req.city)?,
            country: required("country", &req.country)?,
            timezone: optional(req.timezone.as_deref()),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, req: &UpdateAirport) -> CoreResult<()> {
        if let Some(name) = &req.name {
            self.name = required("name", name)?;
        }
        if let Some(city) = &req.city {
            self.city = required("city", city)?;
        }
        if let Some(country) = &req.country {
            self.country = required("country", country)?;
        }
        if req.timezone.is_some() {
            self.timezone = optional(req.timezone.as_deref());
        }
        if let Some(active) = req.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}
