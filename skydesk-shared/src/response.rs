use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uniform envelope wrapping every HTTP response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::with_data(200, "OK", data)
    }

    pub fn created(data: T) -> Self {
        Self::with_data(201, "Created", data)
    }

    pub fn with_data(status: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            status,
            message: message.into(),
            data: Some(data),
            timestamp: Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(status: u16, message: impl Into<String>) -> Self {
        Self {
            success: true,
            status,
            message: message.into(),
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::message(status, message)
        }
    }
}

/// 1-based page request as received from query strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Clamp user input: page starts at 1, size within `1..=max`, zero means `default`.
    pub fn normalize(page: Option<u32>, size: Option<u32>, default: u32, max: u32) -> Self {
        let page = page.unwrap_or(1).max(1);
        let size = match size {
            None | Some(0) => default,
            Some(s) => s,
        };
        Self {
            page,
            size: size.clamp(1, max.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.size as u64
    }

    pub fn limit(&self) -> u64 {
        self.size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, size: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let size = request.size.max(1) as u64;
        Self {
            items,
            page: request.page,
            size: request.size,
            total_items,
            total_pages: total_items.div_ceil(size),
        }
    }

    /// Slice an already filtered and ordered collection.
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self::new(items, request, total)
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_normalization() {
        let req = PageRequest::normalize(None, None, 20, 100);
        assert_eq!(req, PageRequest::new(1, 20));

        let req = PageRequest::normalize(Some(0), Some(500), 20, 100);
        assert_eq!(req, PageRequest::new(1, 100));

        let req = PageRequest::normalize(Some(3), Some(10), 20, 100);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_page_from_vec() {
        let page = Page::from_vec((1..=25).collect::<Vec<i32>>(), PageRequest::new(3, 10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);

        let empty = Page::from_vec(Vec::<i32>::new(), PageRequest::new(1, 10));
        assert_eq!(empty.total_pages, 0);

        let labels = page.map(|n| format!("#{}", n));
        assert_eq!(labels.items[0], "#21");
        assert_eq!(labels.total_items, 25);
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::error(404, "Airline not found")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], 404);
        assert!(body.get("data").is_none());
    }
}
