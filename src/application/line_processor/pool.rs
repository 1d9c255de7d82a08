use super::LineProcessor;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

/// Free list of processors so buffers are reused across hunks.
///
/// Checked-out processors are reset and return to the pool when their
/// guard drops, including on early error returns.
pub struct LineProcessorPool<S> {
    idle: Mutex<Vec<LineProcessor<S>>>,
}

impl<S> Default for LineProcessorPool<S> {
    fn default() -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
        }
    }
}

impl<S: Clone + Send + Sync + 'static> LineProcessorPool<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checkout(&self) -> PooledProcessor<'_, S> {
        let mut processor = self.idle.lock().pop().unwrap_or_default();
        processor.reset();
        PooledProcessor {
            pool: self,
            processor,
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }
}

pub struct PooledProcessor<'a, S> {
    pool: &'a LineProcessorPool<S>,
    processor: LineProcessor<S>,
}

impl<S> Deref for PooledProcessor<'_, S> {
    type Target = LineProcessor<S>;

    fn deref(&self) -> &Self::Target {
        &self.processor
    }
}

impl<S> DerefMut for PooledProcessor<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.processor
    }
}

impl<S> Drop for PooledProcessor<'_, S> {
    fn drop(&mut self) {
        let processor = std::mem::take(&mut self.processor);
        self.pool.idle.lock().push(processor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processors_return_to_pool() {
        let pool: LineProcessorPool<u8> = LineProcessorPool::new();
        assert_eq!(pool.idle_count(), 0);
        {
            let _first = pool.checkout();
            let _second = pool.checkout();
            assert_eq!(pool.idle_count(), 0);
        }
        assert_eq!(pool.idle_count(), 2);

        let _reused = pool.checkout();
        assert_eq!(pool.idle_count(), 1);
    }
}
