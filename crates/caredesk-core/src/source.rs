use std::sync::Arc;

use async_trait::async_trait;
use caredesk_api::ApiClient;
use tracing::info;

use crate::schema::Record;
use crate::Result;

/// A complete collection snapshot as fetched
#[derive(Debug, Clone)]
pub struct Fetched<R> {
    pub records: Vec<R>,
    pub reported_total: Option<u64>,
}

impl<R> Fetched<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records,
            reported_total: None,
        }
    }
}

/// Where a list view gets its records
///
/// The backend is the real implementation; tests swap in mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSource<R: Record>: Send + Sync {
    async fn fetch_all(&self) -> Result<Fetched<R>>;
}

/// Fetches `GET /api/<R::COLLECTION>` without a status filter
#[derive(Debug, Clone)]
pub struct CollectionSource {
    client: Arc<ApiClient>,
}

impl CollectionSource {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<R: Record> RecordSource<R> for CollectionSource {
    async fn fetch_all(&self) -> Result<Fetched<R>> {
        let listing = self.client.list::<R>(R::COLLECTION, None).await?;
        info!("Fetched {} {}", listing.items.len(), R::COLLECTION);
        Ok(Fetched {
            reported_total: listing.reported_total,
            records: listing.items,
        })
    }
}
