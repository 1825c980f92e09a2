use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;
use crate::{CoreError, CoreResult};

pub const MAX_ROW: i32 = 999;
pub const MAX_SEATS_PER_LAYOUT: usize = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatPosition {
    Window,
    Middle,
    Aisle,
}

string_enum!(SeatPosition {
    Window => "WINDOW",
    Middle => "MIDDLE",
    Aisle => "AISLE",
});

/// A physical seat on an airplane, e.g. `12A`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seat {
    pub id: Uuid,
    pub airplane_id: Uuid,
    pub seat_class_id: Uuid,
    pub row: i32,
    pub letter: String,
    pub seat_number: String,
    pub position: SeatPosition,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSeat {
    pub airplane_id: Uuid,
    pub seat_class_id: Uuid,
    pub row: i32,
    pub letter: String,
    pub position: SeatPosition,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSeat {
    pub seat_class_id: Option<Uuid>,
    pub position: Option<SeatPosition>,
    pub is_active: Option<bool>,
}

/// Bulk seat generation: rows `first_row..=last_row`, letters from `layout`
/// where `-` marks an aisle (`ABC-DEF`).
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSeatLayout {
    pub seat_class_id: Uuid,
    pub first_row: i32,
    pub last_row: i32,
    pub layout: String,
}

fn check_row(row: i32) -> CoreResult<i32> {
    if !(1..=MAX_ROW).contains(&row) {
        return Err(CoreError::validation(format!("row {} must be between 1 and {}", row, MAX_ROW)));
    }
    Ok(row)
}

fn check_letter(letter: char) -> CoreResult<char> {
    let letter = letter.to_ascii_uppercase();
    if !('A'..='K').contains(&letter) || letter == 'I' {
        return Err(CoreError::validation(format!("seat letter '{}' must be A-K (no I)", letter)));
    }
    Ok(letter)
}

/// Parses a cabin layout into `(letter, position)` pairs.
pub fn parse_layout(layout: &str) -> CoreResult<Vec<(char, SeatPosition)>> {
    let layout = layout.trim();
    if layout.is_empty() || layout.starts_with('-') || layout.ends_with('-') || layout.contains("--") {
        return Err(CoreError::validation(format!(
            "layout '{}' must be letters separated by single '-' aisles",
            layout
        )));
    }

    let chars: Vec<char> = layout.chars().collect();
    let mut seats = Vec::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' {
            continue;
        }
        let letter = check_letter(c)?;
        if seats.iter().any(|(l, _)| *l == letter) {
            return Err(CoreError::validation(format!("layout repeats letter '{}'", letter)));
        }
        let first = i == 0;
        let last = i == chars.len() - 1;
        let next_to_aisle = (i > 0 && chars[i - 1] == '-') || chars.get(i + 1) == Some(&'-');
        let position = if first || last {
            SeatPosition::Window
        } else if next_to_aisle {
            SeatPosition::Aisle
        } else {
            SeatPosition::Middle
        };
        seats.push((letter, position));
    }
    Ok(seats)
}

impl Seat {
    pub fn new(
        airplane_id: Uuid,
        seat_class_id: Uuid,
        row: i32,
        letter: char,
        position: SeatPosition,
    ) -> CoreResult<Self> {
        let row = check_row(row)?;
        let letter = check_letter(letter)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            airplane_id,
            seat_class_id,
            row,
            letter: letter.to_string(),
            seat_number: format!("{}{}", row, letter),
            position,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn from_request(req: &CreateSeat) -> CoreResult<Self> {
        let mut letters = req.letter.trim().chars();
        let letter = match (letters.next(), letters.next()) {
            (Some(c), None) => c,
            _ => return Err(CoreError::validation("letter must be a single character")),
        };
        Self::new(req.airplane_id, req.seat_class_id, req.row, letter, req.position)
    }

    /// Expands a layout request into seats for one airplane.
    pub fn expand_layout(airplane_id: Uuid, req: &GenerateSeatLayout) -> CoreResult<Vec<Self>> {
        check_row(req.first_row)?;
        check_row(req.last_row)?;
        if req.last_row < req.first_row {
            return Err(CoreError::validation("last_row must not be before first_row"));
        }
        let columns = parse_layout(&req.layout)?;
        let total = (req.last_row - req.first_row + 1) as usize * columns.len();
        if total > MAX_SEATS_PER_LAYOUT {
            return Err(CoreError::validation(format!(
                "layout would create {} seats, limit is {}",
                total, MAX_SEATS_PER_LAYOUT
            )));
        }

        let mut seats = Vec::with_capacity(total);
        for row in req.first_row..=req.last_row {
            for (letter, position) in &columns {
                seats.push(Self::new(airplane_id, req.seat_class_id, row, *letter, *position)?);
            }
        }
        Ok(seats)
    }

    pub fn apply(&mut self, req: &UpdateSeat) {
        if let Some(class_id) = req.seat_class_id {
            self.seat_class_id = class_id;
        }
        if let Some(position) = req.position {
            self.position = position;
        }
        if let Some(active) = req.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
    }
}
