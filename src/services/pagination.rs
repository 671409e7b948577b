//! Cursor-following pagination driver.
//!
//! Turns a page-fetch function into a lazy stream of pages. The stream ends
//! after the page that reports no further pages, or right after the first
//! failed fetch.

use std::future::Future;

use futures::stream::{self, Stream};

use crate::domain::errors::RemoteError;
use crate::domain::ports::Page;

/// Position of the driver within a collection.
enum PageCursor {
    Start,
    After(String),
    Done,
}

/// Stream every page of a collection, starting from the beginning.
///
/// `fetch` is called with `None` for the first page and with the previous
/// page's `end_cursor` afterwards. The stream is not restartable: once it
/// yields an error or the last page, it is exhausted.
///
/// A page that claims a successor but carries no cursor, or hands back the
/// cursor it was requested with, is reported as [`RemoteError::Malformed`]
/// rather than followed.
pub fn paginate<T, F, Fut>(fetch: F) -> impl Stream<Item = Result<Page<T>, RemoteError>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, RemoteError>>,
{
    stream::try_unfold(
        (fetch, PageCursor::Start),
        |(mut fetch, cursor)| async move {
            let after = match cursor {
                PageCursor::Done => return Ok(None),
                PageCursor::Start => None,
                PageCursor::After(cursor) => Some(cursor),
            };

            let page = fetch(after.clone()).await?;
            let next = next_cursor(&page, after.as_deref())?;
            Ok::<_, RemoteError>(Some((page, (fetch, next))))
        },
    )
}

fn next_cursor<T>(page: &Page<T>, requested: Option<&str>) -> Result<PageCursor, RemoteError> {
    if !page.has_next_page {
        return Ok(PageCursor::Done);
    }

    match page.end_cursor.as_deref() {
        None | Some("") => Err(RemoteError::Malformed(
            "page reports more results but carries no cursor".to_string(),
        )),
        Some(cursor) if Some(cursor) == requested => Err(RemoteError::Malformed(format!(
            "cursor {cursor} did not advance"
        ))),
        Some(cursor) => Ok(PageCursor::After(cursor.to_string())),
    }
}
