//! Bounded fan-out over independent units of work.
//!
//! Each unit runs as its own Tokio task. No more than `limit` tasks are alive
//! at once. Every unit writes into the slot of its input index, so results come
//! back in input order whatever order the tasks finish in. A unit that never
//! finishes fails the whole run, so the output always has one result per item.

use std::future::Future;

use tokio::task::{JoinError, JoinSet};

/// Runs `work` over every item with at most `limit` units in flight.
///
/// `on_done` is called once per unit that completes successfully. The first
/// unit that returns `Err` stops the run: tasks still in flight are aborted and
/// the error is returned. A unit whose task was cancelled fails the run the
/// same way, through `E::from(JoinError)`; a panicking unit resumes its panic.
pub async fn fan_out<T, R, E, F, Fut>(
    items: Vec<T>,
    limit: usize,
    work: F,
    mut on_done: impl FnMut(),
) -> Result<Vec<R>, E>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    let limit = limit.max(1);
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(items.len()).collect();
    let mut tasks: JoinSet<(usize, Result<R, E>)> = JoinSet::new();

    for (idx, item) in items.into_iter().enumerate() {
        if tasks.len() >= limit {
            join_one(&mut tasks, &mut slots, &mut on_done).await?;
        }
        let unit = work(item);
        tasks.spawn(async move { (idx, unit.await) });
    }

    while !tasks.is_empty() {
        join_one(&mut tasks, &mut slots, &mut on_done).await?;
    }

    Ok(slots.into_iter().flatten().collect())
}

async fn join_one<R, E>(
    tasks: &mut JoinSet<(usize, Result<R, E>)>,
    slots: &mut [Option<R>],
    on_done: &mut impl FnMut(),
) -> Result<(), E>
where
    R: Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    match tasks.join_next().await {
        Some(Ok((idx, Ok(value)))) => {
            slots[idx] = Some(value);
            on_done();
            Ok(())
        }
        Some(Ok((_, Err(e)))) => {
            tasks.abort_all();
            Err(e)
        }
        Some(Err(join_err)) if join_err.is_panic() => {
            std::panic::resume_unwind(join_err.into_panic())
        }
        Some(Err(join_err)) => {
            tasks.abort_all();
            Err(E::from(join_err))
        }
        None => Ok(()),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
