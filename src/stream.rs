use std::collections::VecDeque;
use std::time::Duration;

use futures::{Stream, TryStreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{extract_cursor, list, ClientError, DatadogClient, ListKind};

/// What a paginated fetch does when a page request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageErrorPolicy {
    /// Log the failure and end the stream; no `Err` item is produced.
    #[default]
    Truncate,
    /// Yield the failure as the final item.
    Propagate,
}

#[derive(Debug, Clone)]
pub struct PageOptions {
    pub page_size: u32,
    pub max_items: usize,
    pub page_delay: Duration,
    pub on_error: PageErrorPolicy,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_items: 1000,
            page_delay: Duration::from_millis(50),
            on_error: PageErrorPolicy::Truncate,
        }
    }
}

impl PageOptions {
    pub fn with_max(max_items: usize) -> Self {
        Self {
            max_items,
            ..Self::default()
        }
    }
}

struct Pager {
    client: DatadogClient,
    kind: ListKind,
    query: String,
    hours: f64,
    options: PageOptions,
    buffered: VecDeque<Value>,
    cursor: Option<String>,
    seen: usize,
    pages: usize,
    done: bool,
}

impl Pager {
    async fn next_item(&mut self) -> Option<Result<Value, ClientError>> {
        loop {
            if self.seen >= self.options.max_items {
                return None;
            }
            if let Some(event) = self.buffered.pop_front() {
                self.seen += 1;
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fetch_page().await {
                self.done = true;
                match self.options.on_error {
                    PageErrorPolicy::Truncate => {
                        warn!(error = %e, items = self.seen, "pagination stopped early");
                        return None;
                    }
                    PageErrorPolicy::Propagate => return Some(Err(e)),
                }
            }
        }
    }

    async fn fetch_page(&mut self) -> Result<(), ClientError> {
        if self.pages > 0 && !self.options.page_delay.is_zero() {
            tokio::time::sleep(self.options.page_delay).await;
        }
        let resp = self
            .client
            .list_page(
                &self.kind,
                &self.query,
                self.hours,
                self.options.page_size,
                self.cursor.as_deref(),
            )
            .await?;
        self.pages += 1;

        let events = list::events(&resp.body);
        debug!(page = self.pages, events = events.len(), "page fetched");
        if events.is_empty() {
            self.done = true;
            return Ok(());
        }
        self.buffered.extend(events.iter().cloned());
        self.cursor = extract_cursor(&resp.body, &resp.headers);
        if self.cursor.is_none() {
            self.done = true;
        }
        Ok(())
    }
}

/// Lazily page through a list query, one event per item.
///
/// Stops at `max_items`, on an empty page, or when no continuation token comes back.
pub fn paginate(
    client: &DatadogClient,
    kind: ListKind,
    query: &str,
    hours: f64,
    options: PageOptions,
) -> impl Stream<Item = Result<Value, ClientError>> {
    let pager = Pager {
        client: client.clone(),
        kind,
        query: query.to_string(),
        hours,
        options,
        buffered: VecDeque::new(),
        cursor: None,
        seen: 0,
        pages: 0,
        done: false,
    };
    futures::stream::unfold(pager, |mut pager| async move {
        let item = pager.next_item().await?;
        Some((item, pager))
    })
}

pub async fn fetch_all(
    client: &DatadogClient,
    kind: ListKind,
    query: &str,
    hours: f64,
    options: PageOptions,
) -> Result<Vec<Value>, ClientError> {
    paginate(client, kind, query, hours, options)
        .try_collect()
        .await
}
