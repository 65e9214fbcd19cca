/*!
 * Bounded per-stage concurrency.
 *
 * Each workflow stage hands its task futures to `run_bounded`, which keeps at
 * most `limit` of them in flight and reports every completion to the caller.
 * The function returns only when all tasks are done, which is what gives the
 * workflow its barrier between stages.
 */

use futures::stream;
use futures_util::StreamExt;
use std::future::Future;

/// Drive `tasks` with at most `limit` running at once.
///
/// `on_complete` sees each output together with the number of completed tasks
/// and the total. Outputs are returned in completion order.
pub async fn run_bounded<T, Fut, F>(tasks: Vec<Fut>, limit: usize, mut on_complete: F) -> Vec<T>
where
    Fut: Future<Output = T>,
    F: FnMut(&T, usize, usize),
{
    let total = tasks.len();
    let mut outputs = Vec::with_capacity(total);
    let mut completed = 0;

    let mut pending = stream::iter(tasks).buffer_unordered(limit.max(1));
    while let Some(output) = pending.next().await {
        completed += 1;
        on_complete(&output, completed, total);
        outputs.push(output);
    }

    outputs
}
