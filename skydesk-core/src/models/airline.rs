use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::required;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Airline {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub country: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAirline {
    pub code: String,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAirline {
    pub name: Option<String>,
    pub country: Option<String>,
    pub is_active: Option<bool>,
}

/// Airline designator: two or three upper-case letters or digits.
pub fn normalize_code(code: &str) -> CoreResult<String> {
    let code = code.trim().to_ascii_uppercase();
    let valid = (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        return Err(CoreError::validation(format!(
            "airline code '{}' must be 2-3 letters or digits",
            code
        )));
    }
    Ok(code)
}

impl Airline {
    pub fn new(req: &CreateAirline) -> CoreResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            code: normalize_code(&req.code)?,
            name: required("name", &req.name)?,
            country: required("country", &req.country)?,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, req: &UpdateAirline) -> CoreResult<()> {
        if let Some(name) = &req.name {
            self.name = required("name", name)?;
        }
        if let Some(country) = &req.country {
            self.country = required("country", country)?;
        }
        if let Some(active) = req.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}
