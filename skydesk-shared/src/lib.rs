pub mod pii;
pub mod response;

pub use pii::Masked;
pub use response::{ApiResponse, Page, PageRequest};
