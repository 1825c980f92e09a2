use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{optional, required};
use crate::{CoreError, CoreResult};

/// A cabin/fare class such as ECONOMY or BUSINESS. Lower rank is more premium.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatClass {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub rank: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSeatClass {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub rank: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSeatClass {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rank: Option<i32>,
    pub is_active: Option<bool>,
}

pub fn normalize_code(code: &str) -> CoreResult<String> {
    let code = code.trim().to_ascii_uppercase();
    let valid = !code.is_empty()
        && code.len() <= 32
        && code.chars().all(|c| c.is_ascii_uppercase() || c == '_');
    if !valid {
        return Err(CoreError::validation(format!(
            "seat class code '{}' must be 1-32 characters of A-Z or '_'",
            code
        )));
    }
    Ok(code)
}

impl SeatClass {
    pub fn new(req: &CreateSeatClass) -> CoreResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            code: normalize_code(&req.code)?,
            name: required("name", &req.name)?,
            description: optional(req.description.as_deref()),
            rank: req.rank,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, req: &UpdateSeatClass) -> CoreResult<()> {
        if let Some(name) = &req.name {
            self.name = required("name", name)?;
        }
        if req.description.is_some() {
            self.description = optional(req.description.as_deref());
        }
        if let Some(rank) = req.rank {
            self.rank = rank;
        }
        if let Some(active) = req.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}
