/// FetchSlot: generation-guarded state for one logical query slot
///
/// Every request allocates a new generation and immediately supersedes the
/// previous one. In-flight work is never aborted; its result is checked
/// against the current generation on completion and silently dropped when
/// it no longer matches, so no stale value is ever published after a newer
/// request has started.
use crate::chart::types::FetchState;
use crate::relay::Relay;
use parking_lot::Mutex;

/// Opaque token identifying one logical fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

pub struct FetchSlot<T: Clone> {
    inner: Mutex<SlotInner<T>>,
    changed: Relay<FetchState<T>>,
}

struct SlotInner<T> {
    state: FetchState<T>,
    generation: u64,
}

impl<T: Clone> FetchSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                state: FetchState::Idle,
                generation: 0,
            }),
            changed: Relay::new(),
        }
    }

    /// Start a new request: allocate the next generation, enter `Loading`
    /// and publish it. Any earlier generation still in flight is superseded
    /// from this point on.
    pub fn begin(&self) -> Generation {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = FetchState::Loading;
        let generation = Generation(inner.generation);
        self.changed.emit(&FetchState::Loading);
        generation
    }

    /// Apply a terminal state for `generation`.
    ///
    /// Returns false (and publishes nothing) when the generation has been
    /// superseded; the stale result is silently discarded.
    pub fn finish(&self, generation: Generation, state: FetchState<T>) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation.0 {
            return false;
        }
        inner.state = state.clone();
        self.changed.emit(&state);
        true
    }

    /// Republish the slot's composition without starting a new generation.
    ///
    /// For recompositions driven by a non-fetch input (e.g. a live value
    /// push) where the underlying series data is already current.
    pub fn apply(&self, state: FetchState<T>) {
        let mut inner = self.inner.lock();
        inner.state = state.clone();
        self.changed.emit(&state);
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.inner.lock().generation == generation.0
    }

    pub fn state(&self) -> FetchState<T> {
        self.inner.lock().state.clone()
    }

    /// State change notifications, published in generation order.
    ///
    /// Emission happens while the slot lock is held so observers see
    /// transitions in order; listeners must not call back into the slot.
    pub fn on_changed(&self) -> &Relay<FetchState<T>> {
        &self.changed
    }
}

impl<T: Clone> Default for FetchSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
