//! Pagination and execution.

use super::{DEFAULT_PAGE_SIZE, Selector};
use crate::client::GenericClient;
use crate::error::{DbError, DbResult};
use crate::record::Record;
use serde::Serialize;

/// Column alias produced by [`Selector::build_count`].
pub const COUNT_COLUMN: &str = "mCount";

/// Pagination summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u64,
    pub page_size: u64,
    pub count: u64,
    pub page_count: u64,
}

impl PageInfo {
    /// `page_count = ceil(count / page_size)`.
    pub fn new(page: u64, page_size: u64, count: u64) -> Self {
        let page_size = page_size.max(1);
        Self {
            page: page.max(1),
            page_size,
            count,
            page_count: count.div_ceil(page_size),
        }
    }
}

impl<C> Selector<'_, C> {
    /// Select the page to fetch. Pages start at 1; a size below 1 falls back to 20.
    pub fn set_page(&mut self, page: i64, page_size: i64) -> &mut Self {
        self.page = u64::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        self.page_size = u64::try_from(page_size)
            .ok()
            .filter(|s| *s >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        self
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// The cached row count, if [`Selector::get_count`] has run.
    pub fn cached_count(&self) -> Option<u64> {
        self.count
    }
}

impl<C: GenericClient> Selector<'_, C> {
    /// Run [`Selector::build_sql`] with the rewrite enabled.
    pub async fn get_list(&self) -> DbResult<Vec<Record>> {
        self.db.query_fragment(&self.build_sql(true)).await
    }

    /// Run [`Selector::build_page`] for the current page.
    pub async fn page_list(&self) -> DbResult<Vec<Record>> {
        self.db.query_fragment(&self.build_page()).await
    }

    /// Fetch the first matching row.
    pub async fn get_row(&self) -> DbResult<Option<Record>> {
        Ok(self
            .db
            .query_fragment(&self.build_row())
            .await?
            .into_iter()
            .next())
    }

    /// Run [`Selector::build_count`] and cache the result.
    pub async fn get_count(&mut self) -> DbResult<u64> {
        let row = self
            .db
            .query_fragment(&self.build_count())
            .await?
            .into_iter()
            .next();
        let count = match row {
            Some(row) => row
                .get_i64(COUNT_COLUMN)
                .ok_or_else(|| DbError::decode(COUNT_COLUMN, "missing or non-integer count"))?,
            None => 0,
        };
        let count = u64::try_from(count).unwrap_or(0);
        self.count = Some(count);
        Ok(count)
    }

    /// Count (once) and summarize the current page.
    pub async fn get_page_info(&mut self) -> DbResult<PageInfo> {
        let count = match self.count {
            Some(count) => count,
            None => self.get_count().await?,
        };
        Ok(PageInfo::new(self.page, self.page_size, count))
    }
}
