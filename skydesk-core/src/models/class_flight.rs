use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// A fare class offered on one flight, with its own seat pool and price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassFlight {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub seat_class_id: Uuid,
    pub price_cents: i64,
    pub currency: String,
    pub total_seats: i32,
    pub available_seats: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClassFlight {
    pub flight_id: Uuid,
    pub seat_class_id: Uuid,
    pub price_cents: i64,
    /// Defaults to every active seat of this class on the airplane.
    pub total_seats: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClassFlight {
    pub price_cents: Option<i64>,
    pub total_seats: Option<i32>,
    pub is_active: Option<bool>,
}

fn check_price(price_cents: i64) -> CoreResult<i64> {
    if price_cents < 0 {
        return Err(CoreError::validation("price_cents must not be negative"));
    }
    Ok(price_cents)
}

fn check_capacity(total: i32, capacity: i64) -> CoreResult<i32> {
    if total < 1 {
        return Err(CoreError::validation("total_seats must be at least 1"));
    }
    if total as i64 > capacity {
        return Err(CoreError::validation(format!(
            "total_seats {} exceeds the {} seats of this class on the airplane",
            total, capacity
        )));
    }
    Ok(total)
}

impl ClassFlight {
    /// `capacity` is the number of active airplane seats in this class.
    pub fn new(req: &CreateClassFlight, capacity: i64, currency: &str) -> CoreResult<Self> {
        let total = match req.total_seats {
            Some(total) => total,
            None => i32::try_from(capacity).unwrap_or(i32::MAX),
        };
        let total = check_capacity(total, capacity)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            flight_id: req.flight_id,
            seat_class_id: req.seat_class_id,
            price_cents: check_price(req.price_cents)?,
            currency: currency.to_string(),
            total_seats: total,
            available_seats: total,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn sold_seats(&self) -> i32 {
        self.total_seats - self.available_seats
    }

    pub fn apply(&mut self, req: &UpdateClassFlight, capacity: i64) -> CoreResult<()> {
        if let Some(price) = req.price_cents {
            self.price_cents = check_price(price)?;
        }
        if let Some(total) = req.total_seats {
            let total = check_capacity(total, capacity)?;
            let sold = self.sold_seats();
            if total < sold {
                return Err(CoreError::validation(format!(
                    "total_seats {} is below the {} seats already sold",
                    total, sold
                )));
            }
            self.available_seats = total - sold;
            self.total_seats = total;
        }
        if let Some(active) = req.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(total: Option<i32>) -> CreateClassFlight {
        CreateClassFlight {
            flight_id: Uuid::new_v4(),
            seat_class_id: Uuid::new_v4(),
            price_cents: 129_00,
            total_seats: total,
        }
    }

    #[test]
    fn test_total_defaults_to_capacity() {
        let class = ClassFlight::new(&request(None), 150, "USD").unwrap();
        assert_eq!(class.total_seats, 150);
        assert_eq!(class.available_seats, 150);
        assert!(ClassFlight::new(&request(Some(151)), 150, "USD").is_err());
        assert!(ClassFlight::new(&request(None), 0, "USD").is_err());
    }

    #[test]
    fn test_resize_keeps_sold_seats() {
        let mut class = ClassFlight::new(&request(Some(20)), 30, "USD").unwrap();
        class.available_seats = 15; // 5 sold

        class
            .apply(&UpdateClassFlight { total_seats: Some(10), ..Default::default() }, 30)
            .unwrap();
        assert_eq!(class.total_seats, 10);
        assert_eq!(class.available_seats, 5);

        let err = class.apply(&UpdateClassFlight { total_seats: Some(4), ..Default::default() }, 30);
        assert!(matches!(err, Err(CoreError::Validation(_))));
    }
}
