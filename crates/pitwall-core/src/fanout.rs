use std::future::Future;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::calendar::SeasonCalendar;
use crate::error::AppError;
use crate::models::RoundDescriptor;

/// Run `fetch` once per round of `calendar`, at most `concurrency` at a time.
///
/// Results come back in ascending round order whatever the completion order
/// of the requests. The first error stops the run; with `concurrency == 1`
/// no request is issued after it.
pub async fn per_round<T, F, Fut>(
    calendar: &SeasonCalendar,
    concurrency: usize,
    mut fetch: F,
) -> Result<Vec<(RoundDescriptor, T)>, AppError>
where
    F: FnMut(RoundDescriptor) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    stream::iter(calendar.rounds())
        .map(move |rd| {
            let pending = fetch(rd.clone());
            async move { pending.await.map(|value| (rd, value)) }
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}
