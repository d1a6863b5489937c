// City/State catalog access
// Paginated reads over the geographic tables backing the directory.

use crate::config::AppConfig;
use crate::supabase::{StoreError, SupabaseRest};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::debug;

const STATE_COLUMNS: &str = "state_slug";
const CITY_COLUMNS: &str = "state_slug,city_slug";

/// A state row as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StateRow {
    pub state_slug: String,
}

/// A city row as stored in the catalog. The (state, city) pair is unique.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CityRow {
    pub state_slug: String,
    pub city_slug: String,
}

/// Read-only client for the geographic catalog tables.
///
/// Pagination is offset-based and not snapshot isolated: rows written
/// concurrently with a fetch may be duplicated or skipped across page
/// boundaries. That risk is accepted; callers needing a stable view
/// should use the bounded single-read variants instead.
#[derive(Clone)]
pub struct CatalogStore {
    rest: SupabaseRest,
    page_size: usize,
}

impl CatalogStore {
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        Ok(CatalogStore {
            rest: SupabaseRest::new(config)?,
            page_size: config.page_size,
        })
    }

    /// Fetch every state in the catalog.
    pub async fn fetch_states(&self) -> Result<Vec<StateRow>, StoreError> {
        fetch_all_pages(self.page_size, |offset, limit| {
            self.read_page("states", STATE_COLUMNS, offset, limit)
        })
        .await
    }

    /// Fetch every city in the catalog.
    pub async fn fetch_cities(&self) -> Result<Vec<CityRow>, StoreError> {
        fetch_all_pages(self.page_size, |offset, limit| {
            self.read_page("cities", CITY_COLUMNS, offset, limit)
        })
        .await
    }

    /// Fetch at most `cap` states in one read, without paginating.
    pub async fn fetch_states_bounded(&self, cap: usize) -> Result<Vec<StateRow>, StoreError> {
        self.read_page("states", STATE_COLUMNS, 0, cap).await
    }

    /// Fetch at most `cap` cities in one read, without paginating.
    pub async fn fetch_cities_bounded(&self, cap: usize) -> Result<Vec<CityRow>, StoreError> {
        self.read_page("cities", CITY_COLUMNS, 0, cap).await
    }

    /// Fetch the cities of a single state. One filtered read; no state
    /// holds anywhere near a full page of cities.
    pub async fn fetch_cities_in_state(
        &self,
        state_slug: &str,
    ) -> Result<Vec<CityRow>, StoreError> {
        let filter = format!("eq.{state_slug}");
        let limit = self.page_size.to_string();
        let request = self.rest.get("cities").query(&[
            ("select", CITY_COLUMNS),
            ("state_slug", filter.as_str()),
            ("limit", limit.as_str()),
        ]);

        self.rest.send_rows(request).await
    }

    async fn read_page<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<T>, StoreError> {
        let offset_param = offset.to_string();
        let limit_param = limit.to_string();
        let request = self.rest.get(table).query(&[
            ("select", columns),
            ("offset", offset_param.as_str()),
            ("limit", limit_param.as_str()),
        ]);

        let rows: Vec<T> = self.rest.send_rows(request).await?;
        debug!(table, offset, rows = rows.len(), "catalog page read");
        Ok(rows)
    }
}

/// Accumulate every row of a table through repeated range reads.
///
/// Starts at offset 0 and advances by `page_size` until a read returns
/// fewer rows than requested (or none at all). The first failed read
/// aborts the whole fetch; no partial result is ever returned. An empty
/// table yields an empty vector, not an error.
pub async fn fetch_all_pages<T, F, Fut>(
    page_size: usize,
    mut read_page: F,
) -> Result<Vec<T>, StoreError>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>, StoreError>>,
{
    if page_size == 0 {
        return Err(StoreError::Internal("page size must be at least 1".into()));
    }

    let mut rows = Vec::new();
    let mut offset = 0;

    loop {
        let page = read_page(offset, page_size).await?;
        let page_len = page.len();
        rows.extend(page);

        // A short (or empty) page means the table is exhausted
        if page_len < page_size {
            break;
        }
        offset += page_size;
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn read_slice(rows: &[u32], offset: usize, limit: usize) -> Result<Vec<u32>, StoreError> {
        let end = (offset + limit).min(rows.len());
        let start = offset.min(rows.len());
        Ok(rows[start..end].to_vec())
    }

    #[tokio::test]
    async fn test_fetch_returns_all_rows_for_any_page_size() {
        for total in 0..=13usize {
            let rows: Vec<u32> = (0..total as u32).collect();

            for page_size in 1..=7usize {
                let fetched = fetch_all_pages(page_size, |offset, limit| {
                    read_slice(&rows, offset, limit)
                })
                .await
                .unwrap();

                // Exactly N rows, no duplicates, no gaps, in store order
                assert_eq!(fetched, rows, "total={total} page_size={page_size}");
            }
        }
    }

    #[tokio::test]
    async fn test_empty_table_yields_empty_result() {
        let rows: Vec<u32> = Vec::new();
        let fetched = fetch_all_pages(5, |offset, limit| read_slice(&rows, offset, limit))
            .await
            .unwrap();

        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn test_exact_multiple_issues_one_trailing_empty_read() {
        let rows: Vec<u32> = (0..10).collect();
        let reads = AtomicUsize::new(0);

        let fetched = fetch_all_pages(5, |offset, limit| {
            reads.fetch_add(1, Ordering::SeqCst);
            read_slice(&rows, offset, limit)
        })
        .await
        .unwrap();

        assert_eq!(fetched, rows);
        // 2 full pages, then the empty page that signals the end
        assert_eq!(reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_mid_fetch_failure_aborts_without_partial_rows() {
        let result: Result<Vec<u32>, StoreError> = fetch_all_pages(2, |offset, limit| async move {
            if offset >= 2 {
                Err(StoreError::Upstream("timeout".to_string()))
            } else {
                Ok((offset as u32..(offset + limit) as u32).collect())
            }
        })
        .await;

        let err = result.err().expect("fetch must fail");
        assert_eq!(err.to_string(), "timeout");
    }

    #[tokio::test]
    async fn test_zero_page_size_is_rejected() {
        let result = fetch_all_pages(0, |offset, limit| async move {
            let _ = (offset, limit);
            Ok(vec![0u32])
        })
        .await;

        assert!(matches!(result, Err(StoreError::Internal(_))));
    }

    #[test]
    fn test_city_row_deserializes_from_store_shape() {
        let rows: Vec<CityRow> = serde_json::from_str(
            r#"[{"state_slug":"california","city_slug":"los-angeles"},
                {"state_slug":"missouri","city_slug":"o'fallon"}]"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state_slug, "california");
        assert_eq!(rows[1].city_slug, "o'fallon");
    }
}
