//! Cursor-paginated retrieval of the agent presence timeline.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use sc_core::{PresenceEvent, TimeRange};

use crate::FetchError;

/// One page request against the timeline source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page, starting at the query start.
    Start { start_time: DateTime<Utc> },
    /// Follow-up page addressed by the previous page's cursor.
    Cursor { url: String },
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start { start_time } => write!(
                f,
                "first page (start_time={})",
                start_time.timestamp_micros()
            ),
            Self::Cursor { url } => write!(f, "page {url}"),
        }
    }
}

/// A page returned by the timeline source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelinePage {
    pub events: Vec<PresenceEvent>,
    /// Cursor for the next page, if the source has more.
    pub next_page: Option<String>,
    /// Where this page ends on the source's clock.
    pub end_time: Option<DateTime<Utc>>,
}

/// A paginated presence timeline.
pub trait TimelineSource {
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = Result<TimelinePage, FetchError>> + Send;
}

impl<T: TimelineSource + Sync> TimelineSource for &T {
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = Result<TimelinePage, FetchError>> + Send {
        (**self).fetch_page(request)
    }
}

/// Pulls every page covering a query range from a [`TimelineSource`].
#[derive(Debug)]
pub struct TimelineFetcher<S> {
    source: S,
    pages_fetched: AtomicUsize,
}

impl<S: TimelineSource> TimelineFetcher<S> {
    pub const fn new(source: S) -> Self {
        Self {
            source,
            pages_fetched: AtomicUsize::new(0),
        }
    }

    /// Pages fetched so far. Only ever increases.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched.load(Ordering::Relaxed)
    }

    /// Fetches all pages for `range` and returns their events in arrival order.
    ///
    /// Pagination stops when a page has no cursor, or when its end time lies
    /// after the range end. That last page is still kept. Any page error
    /// aborts the whole fetch.
    pub async fn fetch(&self, range: &TimeRange) -> Result<Vec<PresenceEvent>, FetchError> {
        let mut request = PageRequest::Start {
            start_time: range.start,
        };
        let mut events = Vec::new();

        loop {
            let page = self.source.fetch_page(&request).await?;
            let pages = self.pages_fetched.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::info!(
                pages,
                events = page.events.len(),
                end_time = ?page.end_time,
                "fetched timeline page"
            );
            events.extend(page.events);

            let Some(next_page) = page.next_page else {
                break;
            };
            // Without an end time there is nothing to compare against the range.
            let Some(end_time) = page.end_time else {
                break;
            };
            if end_time > range.end {
                break;
            }

            request = PageRequest::Cursor { url: next_page };
        }

        Ok(events)
    }
}
