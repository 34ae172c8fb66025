//! Bounded, fail-fast fan-out of blocking collaborator calls.

use std::{
    num::NonZeroUsize,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use crate::Result;

/// Run `operation` on every item with at most `limit` calls in flight.
///
/// Returns the first error received. Once an error is seen, workers stop
/// taking new items; calls already running are allowed to finish.
pub(crate) fn try_for_each<T, F>(items: &[T], limit: NonZeroUsize, operation: F) -> Result<()>
where
    T: Sync,
    F: Fn(&T) -> Result<()> + Sync,
{
    run(items, limit, true, operation)
}

/// Run `operation` on every item with at most `limit` calls in flight.
///
/// Every item is attempted regardless of failures, then the first error
/// received (if any) is returned.
pub(crate) fn attempt_all<T, F>(items: &[T], limit: NonZeroUsize, operation: F) -> Result<()>
where
    T: Sync,
    F: Fn(&T) -> Result<()> + Sync,
{
    run(items, limit, false, operation)
}

fn run<T, F>(items: &[T], limit: NonZeroUsize, fail_fast: bool, operation: F) -> Result<()>
where
    T: Sync,
    F: Fn(&T) -> Result<()> + Sync,
{
    match items {
        [] => return Ok(()),
        [item] => return operation(item),
        _ => {}
    }

    let workers = limit.get().min(items.len());

    let (jobs_sender, jobs) = flume::unbounded::<&T>();
    for item in items {
        // Can't fail, `jobs` is alive.
        let _ = jobs_sender.send(item);
    }
    drop(jobs_sender);

    let (results_sender, results) = flume::unbounded::<Result<()>>();
    let failed = AtomicBool::new(false);

    thread::scope(|scope| {
        for _ in 0..workers {
            let jobs = jobs.clone();
            let results_sender = results_sender.clone();
            let failed = &failed;
            let operation = &operation;

            scope.spawn(move || {
                while !(fail_fast && failed.load(Ordering::Relaxed)) {
                    let Ok(item) = jobs.try_recv() else {
                        break;
                    };

                    let result = operation(item);
                    if result.is_err() {
                        failed.store(true, Ordering::Relaxed);
                    }

                    if results_sender.send(result).is_err() {
                        break;
                    }
                }
            });
        }
        drop(results_sender);

        let mut first_error = None;

        for result in results.iter() {
            if let Err(error) = result {
                if fail_fast {
                    return Err(error);
                }
                first_error.get_or_insert(error);
            }
        }

        first_error.map_or(Ok(()), Err)
    })
}

#[cfg(test)]
mod test {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;
    use crate::Error;

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn empty() {
        let calls = AtomicUsize::new(0);

        try_for_each(&[] as &[u8], limit(4), |_| {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn runs_every_item() {
        let items: Vec<usize> = (0..50).collect();
        let sum = AtomicUsize::new(0);

        try_for_each(&items, limit(8), |item| {
            sum.fetch_add(*item, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();

        assert_eq!(sum.load(Ordering::Relaxed), (0..50).sum::<usize>());
    }

    #[test]
    fn respects_limit() {
        let items: Vec<usize> = (0..20).collect();
        let in_flight = AtomicUsize::new(0);
        let max_in_flight = AtomicUsize::new(0);

        try_for_each(&items, limit(3), |_| {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(current, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        assert!(max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn first_error_wins() {
        let items: Vec<usize> = (0..100).collect();
        let calls = AtomicUsize::new(0);

        let result = try_for_each(&items, limit(1), |item| {
            calls.fetch_add(1, Ordering::Relaxed);
            if *item == 3 {
                return Err(Error::NotFoundLocally);
            }
            Ok(())
        });

        assert!(matches!(result, Err(Error::NotFoundLocally)));
        // A single worker stops right after the failing item.
        assert_eq!(calls.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn attempt_all_keeps_going() {
        let items: Vec<usize> = (0..100).collect();
        let calls = AtomicUsize::new(0);

        let result = attempt_all(&items, limit(4), |item| {
            calls.fetch_add(1, Ordering::Relaxed);
            if *item % 10 == 0 {
                return Err(Error::Unsupported("tens"));
            }
            Ok(())
        });

        assert!(matches!(result, Err(Error::Unsupported("tens"))));
        assert_eq!(calls.load(Ordering::Relaxed), 100);
    }
}
