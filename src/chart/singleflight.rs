/// Per-key single-flight fetch sharing
///
/// At most one upstream call is in flight for a given key; every concurrent
/// caller for that key awaits the same call and receives a clone of its
/// result, success or failure.
use crate::errors::{FeedError, FeedResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct SingleFlight<K, T> {
    inflight: Arc<Mutex<HashMap<K, broadcast::Sender<FeedResult<T>>>>>,
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `operation` for `key`, or join the operation already in flight
    /// for it.
    ///
    /// The leading caller executes the future and fans its result out to
    /// everyone who joined in the meantime. If the leading call goes away
    /// without producing a result, joiners get [`FeedError::Cancelled`].
    pub async fn run<F>(&self, key: K, operation: F) -> FeedResult<T>
    where
        F: Future<Output = FeedResult<T>>,
    {
        let receiver = {
            let mut inflight = self.inflight.lock();
            match inflight.get(&key) {
                Some(sender) => Some(sender.subscribe()),
                None => {
                    let (sender, _) = broadcast::channel(1);
                    inflight.insert(key.clone(), sender);
                    None
                }
            }
        };

        if let Some(mut receiver) = receiver {
            return match receiver.recv().await {
                Ok(result) => result,
                Err(_) => Err(FeedError::Cancelled),
            };
        }

        // Leader path. The guard removes the in-flight entry even if the
        // future panics, so joiners never wait forever.
        let guard = FlightGuard {
            inflight: Arc::clone(&self.inflight),
            key,
        };

        let result = operation.await;

        if let Some(sender) = guard.finish() {
            let _ = sender.send(result.clone());
        }

        result
    }

    /// Number of keys currently in flight (diagnostics)
    pub fn inflight_count(&self) -> usize {
        self.inflight.lock().len()
    }
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

struct FlightGuard<K: Eq + Hash, T> {
    inflight: Arc<Mutex<HashMap<K, broadcast::Sender<FeedResult<T>>>>>,
    key: K,
}

impl<K: Eq + Hash + Clone, T> FlightGuard<K, T> {
    /// Remove the in-flight entry and hand back the sender for fan-out
    fn finish(self) -> Option<broadcast::Sender<FeedResult<T>>> {
        let sender = self.inflight.lock().remove(&self.key);
        std::mem::forget(self);
        sender
    }
}

impl<K: Eq + Hash, T> Drop for FlightGuard<K, T> {
    fn drop(&mut self) {
        // Dropping the sender wakes joiners with a closed-channel error
        self.inflight.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_call() {
        let flight: Arc<SingleFlight<&str, u32>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let make = |flight: Arc<SingleFlight<&'static str, u32>>, calls: Arc<AtomicUsize>| async move {
            flight
                .run("key", async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(30)).await;
                    Ok(7)
                })
                .await
        };

        let (a, b) = tokio::join!(
            make(Arc::clone(&flight), Arc::clone(&calls)),
            make(Arc::clone(&flight), Arc::clone(&calls))
        );

        assert_eq!(a.unwrap(), 7);
        assert_eq!(b.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flight.inflight_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_shared() {
        let flight: Arc<SingleFlight<&str, u32>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let make = |flight: Arc<SingleFlight<&'static str, u32>>, calls: Arc<AtomicUsize>| async move {
            flight
                .run("key", async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(30)).await;
                    Err(FeedError::Source("boom".to_string()))
                })
                .await
        };

        let (a, b) = tokio::join!(
            make(Arc::clone(&flight), Arc::clone(&calls)),
            make(Arc::clone(&flight), Arc::clone(&calls))
        );

        assert_eq!(a.unwrap_err(), FeedError::Source("boom".to_string()));
        assert_eq!(b.unwrap_err(), FeedError::Source("boom".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sequential_calls_run_separately() {
        let flight: SingleFlight<&str, u32> = SingleFlight::new();
        let calls = AtomicUsize::new(0);

        for expected in 1..=2 {
            let result = flight
                .run("key", async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(expected)
                })
                .await;
            assert_eq!(result.unwrap(), expected);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_share() {
        let flight: Arc<SingleFlight<&str, u32>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let run = |flight: Arc<SingleFlight<&'static str, u32>>,
                   calls: Arc<AtomicUsize>,
                   key: &'static str,
                   value: u32| async move {
            flight
                .run(key, async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(20)).await;
                    Ok(value)
                })
                .await
        };

        let (a, b) = tokio::join!(
            run(Arc::clone(&flight), Arc::clone(&calls), "a", 1),
            run(Arc::clone(&flight), Arc::clone(&calls), "b", 2)
        );

        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
