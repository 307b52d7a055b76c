use serde::Serialize;

use crate::core::config;
use crate::core::error::{AppError, AppResult};

/// One-based page request with a bounded page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: config::pagination::DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> AppResult<Self> {
        if page == 0 {
            return Err(AppError::Validation("page must be 1 or greater".to_string()));
        }
        if page_size == 0 || page_size > config::pagination::MAX_PAGE_SIZE {
            return Err(AppError::Validation(format!(
                "pageSize must be between 1 and {}",
                config::pagination::MAX_PAGE_SIZE
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// Slices an already materialized list.
    pub fn apply<T>(&self, items: Vec<T>) -> Pageable<T> {
        let total_items = items.len() as u64;
        let results = items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.page_size as usize)
            .collect();
        Pageable::new(*self, total_items, results)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable<T> {
    pub current_page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub results: Vec<T>,
}

impl<T> Pageable<T> {
    pub fn new(request: PageRequest, total_items: u64, results: Vec<T>) -> Self {
        Self {
            current_page: request.page,
            page_size: request.page_size,
            total_items,
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Pageable<U> {
        Pageable {
            current_page: self.current_page,
            page_size: self.page_size,
            total_items: self.total_items,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
