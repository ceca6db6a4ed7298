//! Search service trait and implementations for bibliography lookup.

pub mod dblp;
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// An HTTP-level reply from the search endpoint.
///
/// An empty body on a 200 reply signals "no match"; non-200 statuses come
/// back here rather than as `Err` so the resolver can retry and classify
/// them.
#[derive(Debug, Clone)]
pub struct SearchReply {
    pub status: u16,
    pub body: String,
}

/// A bibliographic search endpoint accepting free-text `+`-joined queries.
pub trait SearchService: Send + Sync {
    /// Canonical name of this service (e.g. "DBLP"), for logs.
    fn name(&self) -> &str;

    /// Issue one query. `Err` is a transport-level failure (connect error,
    /// timeout); HTTP statuses are carried inside [`SearchReply`].
    fn search<'a>(
        &'a self,
        query: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<SearchReply, String>> + Send + 'a>>;
}
