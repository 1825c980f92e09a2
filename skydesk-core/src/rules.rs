use serde::Deserialize;

/// Tunables that shape scheduling, booking and listing behaviour.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Minimum ground time kept free around every flight of the same airplane.
    #[serde(default = "default_turnaround")]
    pub turnaround_minutes: i64,
    #[serde(default)]
    pub min_departure_lead_minutes: i64,
    #[serde(default = "default_max_passengers")]
    pub max_passengers_per_booking: usize,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_currency() -> String { "USD".to_string() }
fn default_turnaround() -> i64 { 30 }
fn default_max_passengers() -> usize { 9 }
fn default_page_size() -> u32 { 20 }
fn default_max_page_size() -> u32 { 100 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            turnaround_minutes: default_turnaround(),
            min_departure_lead_minutes: 0,
            max_passengers_per_booking: default_max_passengers(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl BusinessRules {
    pub fn page(&self, page: Option<u32>, size: Option<u32>) -> skydesk_shared::PageRequest {
        skydesk_shared::PageRequest::normalize(page, size, self.default_page_size, self.max_page_size)
    }
}
