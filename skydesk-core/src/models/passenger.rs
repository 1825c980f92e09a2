use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use skydesk_shared::Masked;
use uuid::Uuid;

use super::{optional, required};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passenger {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: NaiveDate,
    pub nationality: Option<String>,
    pub passport_number: Option<Masked<String>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePassenger {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: NaiveDate,
    pub nationality: Option<String>,
    pub passport_number: Option<Masked<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePassenger {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub passport_number: Option<Masked<String>>,
    pub is_active: Option<bool>,
}

pub fn normalize_email(email: &str) -> CoreResult<String> {
    let email = email.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(CoreError::validation(format!("'{}' is not a valid email address", email)));
    }
    Ok(email)
}

fn check_birth_date(date: NaiveDate) -> CoreResult<NaiveDate> {
    if date > Utc::now().date_naive() {
        return Err(CoreError::validation("date_of_birth must not be in the future"));
    }
    Ok(date)
}

fn normalize_nationality(value: Option<&str>) -> CoreResult<Option<String>> {
    match optional(value) {
        Some(n) => {
            let n = n.to_ascii_uppercase();
            if !(2..=3).contains(&n.len()) || !n.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CoreError::validation(format!("nationality '{}' must be 2-3 letters", n)));
            }
            Ok(Some(n))
        }
        None => Ok(None),
    }
}

fn normalize_passport(value: Option<&Masked<String>>) -> Option<Masked<String>> {
    optional(value.map(|p| p.inner().as_str())).map(|p| Masked(p.to_ascii_uppercase()))
}

impl Passenger {
    pub fn new(req: &CreatePassenger) -> CoreResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            first_name: required("first_name", &req.first_name)?,
            last_name: required("last_name", &req.last_name)?,
            email: normalize_email(&req.email)?,
            phone: optional(req.phone.as_deref()),
            date_of_birth: check_birth_date(req.date_of_birth)?,
            nationality: normalize_nationality(req.nationality.as_deref())?,
            passport_number: normalize_passport(req.passport_number.as_ref()),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, req: &UpdatePassenger) -> CoreResult<()> {
        if let Some(first) = &req.first_name {
            self.first_name = required("first_name", first)?;
        }
        if let Some(last) = &req.last_name {
            self.last_name = required("last_name", last)?;
        }
        if let Some(email) = &req.email {
            self.email = normalize_email(email)?;
        }
        if req.phone.is_some() {
            self.phone = optional(req.phone.as_deref());
        }
        if let Some(dob) = req.date_of_birth {
            self.date_of_birth = check_birth_date(dob)?;
        }
        if req.nationality.is_some() {
            self.nationality = normalize_nationality(req.nationality.as_deref())?;
        }
        if req.passport_number.is_some() {
            self.passport_number = normalize_passport(req.passport_number.as_ref());
        }
        if let Some(active) = req.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
