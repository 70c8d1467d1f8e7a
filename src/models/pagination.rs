//! 分页相关的数据结构

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            page_size: Some(20),
        }
    }
}

impl PaginationParams {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.map(|p| p as i64),
            page_size: per_page.map(|p| p as i64),
        }
    }

    pub fn get_offset(&self) -> i64 {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.get_limit();
        (page - 1) * page_size
    }

    pub fn get_limit(&self) -> i64 {
        self.page_size.unwrap_or(20).clamp(1, 100)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(
    PaginatedLockEntries = PaginatedResponse<crate::models::LockLedgerEntryResponse>,
    PaginatedStandings = PaginatedResponse<crate::models::RankedStanding>
)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: i64, page_size: i64, total: i64) -> Self {
        let total_pages = (total + page_size - 1) / page_size;
        Self {
            data,
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_limit() {
        let params = PaginationParams::new(Some(3), Some(25));
        assert_eq!(params.get_offset(), 50);
        assert_eq!(params.get_limit(), 25);
    }

    #[test]
    fn test_defaults_and_clamping() {
        let params = PaginationParams::new(None, None);
        assert_eq!(params.get_offset(), 0);
        assert_eq!(params.get_limit(), 20);

        let params = PaginationParams::new(Some(0), Some(10_000));
        assert_eq!(params.get_offset(), 0);
        assert_eq!(params.get_limit(), 100);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let resp = PaginatedResponse::new(vec![1, 2, 3], 1, 20, 41);
        assert_eq!(resp.total_pages, 3);
    }
}
