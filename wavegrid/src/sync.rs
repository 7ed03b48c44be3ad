//! Key-coalescing debouncer.
//!
//! Callers report dirty keys as they change; the flush callback runs once no
//! new key has arrived for the quiet period, with every key collected since
//! the last flush. Used for deferred cleanup and state saves.

use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// Handle to a running debouncer task.
///
/// Dropping the handle closes the channel; the task flushes whatever is
/// pending and exits.
#[derive(Debug)]
pub struct DebouncedSync<K> {
    tx: mpsc::UnboundedSender<K>,
    task: JoinHandle<()>,
}

impl<K> DebouncedSync<K>
where
    K: Eq + Hash + Send + 'static,
{
    /// Spawn the debouncer on the current tokio runtime.
    pub fn spawn<F>(quiet: Duration, flush: F) -> Self
    where
        F: FnMut(HashSet<K>) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(rx, quiet, flush));
        Self { tx, task }
    }

    /// Mark a key dirty. Returns false once the task has stopped.
    pub fn notify(&self, key: K) -> bool {
        self.tx.send(key).is_ok()
    }

    /// Flush pending keys and wait for the task to finish.
    pub async fn shutdown(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            log::warn!("Debounce task ended abnormally: {}", e);
        }
    }
}

async fn sleep_until_optional(deadline: Option<Instant>) {
    match deadline {
        Some(d) => sleep_until(d).await,
        None => std::future::pending::<()>().await,
    }
}

async fn run<K, F>(mut rx: mpsc::UnboundedReceiver<K>, quiet: Duration, mut flush: F)
where
    K: Eq + Hash,
    F: FnMut(HashSet<K>),
{
    let mut pending = HashSet::new();
    let mut deadline = None;
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(key) => {
                    pending.insert(key);
                    deadline = Some(Instant::now() + quiet);
                }
                None => break,
            },
            _ = sleep_until_optional(deadline) => {
                log::trace!("Debounce flush of {} keys", pending.len());
                flush(std::mem::take(&mut pending));
                deadline = None;
            }
        }
    }
    if !pending.is_empty() {
        log::trace!("Final debounce flush of {} keys", pending.len());
        flush(pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<HashSet<&'static str>>>>, impl FnMut(HashSet<&'static str>) + Send + 'static) {
        let flushes = Arc::new(Mutex::new(Vec::new()));
        let sink = flushes.clone();
        (flushes, move |keys| sink.lock().unwrap().push(keys))
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_coalesce_until_quiet() {
        let (flushes, flush) = recorder();
        let sync = DebouncedSync::spawn(Duration::from_millis(100), flush);

        sync.notify("a");
        sync.notify("b");
        tokio::time::sleep(Duration::from_millis(50)).await;
        sync.notify("a");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(flushes.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let recorded = flushes.lock().unwrap().clone();
        assert_eq!(recorded, vec![HashSet::from(["a", "b"])]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_flush_separately() {
        let (flushes, flush) = recorder();
        let sync = DebouncedSync::spawn(Duration::from_millis(10), flush);

        sync.notify("a");
        tokio::time::sleep(Duration::from_millis(20)).await;
        sync.notify("b");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(flushes.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending() {
        let (flushes, flush) = recorder();
        let sync = DebouncedSync::spawn(Duration::from_secs(60), flush);
        sync.notify("x");
        sync.shutdown().await;
        assert_eq!(flushes.lock().unwrap().clone(), vec![HashSet::from(["x"])]);
    }
}
