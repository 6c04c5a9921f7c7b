use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Page-based pagination for list endpoints.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    25
}

impl PaginationParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be >= 1".to_string());
        }
        if !(1..=100).contains(&self.page_size) {
            return Err("page_size must be between 1 and 100".to_string());
        }
        Ok(())
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.page_size
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total_items: i64) -> Self {
        let total_pages = (total_items as u64).div_ceil(params.page_size as u64) as u32;
        Self {
            data,
            pagination: PaginationMeta {
                page: params.page,
                page_size: params.page_size,
                total_items,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: u32, page_size: u32) -> PaginationParams {
        PaginationParams { page, page_size }
    }

    #[test]
    fn test_offset_and_limit() {
        let p = params(3, 25);
        assert_eq!(p.offset(), 50);
        assert_eq!(p.limit(), 25);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(params(0, 25).validate().is_err());
        assert!(params(1, 0).validate().is_err());
        assert!(params(1, 101).validate().is_err());
        assert!(params(1, 100).validate().is_ok());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let response = PaginatedResponse::new(vec![1, 2, 3], &params(1, 25), 51);
        assert_eq!(response.pagination.total_pages, 3);
        assert_eq!(response.pagination.total_items, 51);
    }
}
