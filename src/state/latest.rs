use parking_lot::Mutex;
use std::sync::Arc;

/// Result slot for a background recomputation.
///
/// Each computation is tagged with the generation it was started for. A
/// result is stored only if no newer generation has been accepted or
/// reserved, so slow stale computations never overwrite fresher ones.
pub struct Latest<T> {
    slot: Mutex<Slot<T>>,
}

struct Slot<T> {
    generation: u64,
    value: Option<Arc<T>>,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(Slot {
                generation: 0,
                value: None,
            }),
        }
    }
}

impl<T> Latest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` if `generation` is newer than anything seen so far.
    pub fn offer(&self, generation: u64, value: T) -> bool {
        let mut slot = self.slot.lock();
        if generation <= slot.generation {
            return false;
        }
        slot.generation = generation;
        slot.value = Some(Arc::new(value));
        true
    }

    /// Clears the value and rejects every result older than `generation`.
    pub fn invalidate(&self, generation: u64) {
        let mut slot = self.slot.lock();
        if generation > slot.generation {
            slot.generation = generation;
        }
        slot.value = None;
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.lock().value.clone()
    }

    pub fn generation(&self) -> u64 {
        self.slot.lock().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_older_results_are_discarded() {
        let latest = Latest::new();
        assert!(latest.offer(2, "second"));
        assert!(!latest.offer(1, "first"));
        assert_eq!(latest.get().as_deref(), Some(&"second"));
        assert!(latest.offer(3, "third"));
        assert_eq!(latest.generation(), 3);
    }

    #[test]
    fn test_invalidate_blocks_in_flight_results() {
        let latest = Latest::new();
        latest.offer(1, 10);
        latest.invalidate(5);
        assert!(latest.get().is_none());
        assert!(!latest.offer(4, 40));
        assert!(latest.offer(6, 60));
        assert_eq!(latest.get().as_deref(), Some(&60));
    }
}
