//! Pagination driver
//!
//! Turns a list operation plus an initial request into a lazy stream of
//! pages. The stream ends after the first page whose cursor is empty or
//! absent. A provider error is yielded as the stream's last element, so the
//! consumer always sees it and never mistakes it for a clean end of listing.
//! No retries happen here.

use futures::stream::{self, Stream};

use crate::descriptor::{ListOperation, ListRequest};
use crate::error::ProviderError;
use crate::partition::PartitionKey;
use crate::provider::ListProvider;

/// One page of raw provider items
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based position in the listing
    pub number: usize,
    pub items: Vec<serde_json::Value>,
    pub next_cursor: Option<String>,
}

struct Cursor {
    request: Box<dyn ListRequest>,
    next_number: usize,
}

/// Drive `operation` until the provider stops returning a cursor
pub fn fetch_all<'a>(
    provider: &'a dyn ListProvider,
    operation: &'a ListOperation,
    partition: &'a PartitionKey,
    request: Box<dyn ListRequest>,
) -> impl Stream<Item = Result<Page, ProviderError>> + Send + 'a {
    let start = Cursor {
        request,
        next_number: 1,
    };

    stream::try_unfold(Some(start), move |state| async move {
        let Some(Cursor {
            mut request,
            next_number,
        }) = state
        else {
            return Ok(None);
        };

        let params = request.to_params()?;
        let output = provider.list(operation, partition, &params).await?;

        let next_cursor = output.next_cursor.filter(|c| !c.is_empty());
        let page = Page {
            number: next_number,
            items: output.items,
            next_cursor: next_cursor.clone(),
        };

        let next_state = next_cursor.map(|cursor| {
            request.set_cursor(cursor);
            Cursor {
                request,
                next_number: next_number + 1,
            }
        });

        Ok(Some((page, next_state)))
    })
}
