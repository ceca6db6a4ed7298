//! Mock search service for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{SearchReply, SearchService};

/// A configurable mock reply for [`MockSearch`].
#[derive(Clone, Debug)]
pub enum MockReply {
    /// 200 with a record body.
    Hit(String),
    /// 200 with an empty body ("no match").
    Miss,
    /// A non-200 status with an empty body.
    Status(u16),
    /// Transport-level failure.
    Transport(String),
}

/// A hand-rolled mock implementing [`SearchService`] for tests.
///
/// Supports:
/// - A fixed reply (used for every call), **or**
/// - A sequence of replies (one per call, repeating the last if exhausted).
/// - Optional per-call latency.
/// - Call counting and query recording for assertions.
pub struct MockSearch {
    /// If non-empty, each call pops the next reply.
    replies: Mutex<Vec<MockReply>>,
    /// Fallback when the sequence is exhausted (or single-reply mode).
    fallback: MockReply,
    delay: Option<Duration>,
    call_count: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    /// Create a mock that always returns `reply`.
    pub fn new(reply: MockReply) -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            fallback: reply,
            delay: None,
            call_count: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns replies in order, repeating the last one.
    pub fn with_sequence(mut replies: Vec<MockReply>) -> Self {
        assert!(!replies.is_empty(), "sequence must have at least one reply");
        // Reverse so we can pop() from the front cheaply.
        replies.reverse();
        let fallback = replies.first().cloned().unwrap();
        Self {
            replies: Mutex::new(replies),
            fallback,
            delay: None,
            call_count: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Set simulated network latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `search()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every query string received, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn next_reply(&self) -> MockReply {
        let mut seq = self.replies.lock().unwrap();
        if let Some(reply) = seq.pop() {
            reply
        } else {
            self.fallback.clone()
        }
    }
}

impl SearchService for MockSearch {
    fn name(&self) -> &str {
        "mock"
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        _client: &'a reqwest::Client,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<SearchReply, String>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        let reply = self.next_reply();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }

            match reply {
                MockReply::Hit(body) => Ok(SearchReply { status: 200, body }),
                MockReply::Miss => Ok(SearchReply {
                    status: 200,
                    body: String::new(),
                }),
                MockReply::Status(status) => Ok(SearchReply {
                    status,
                    body: String::new(),
                }),
                MockReply::Transport(msg) => Err(msg),
            }
        })
    }
}
