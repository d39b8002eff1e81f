use std::sync::Arc;

use rigidframe_core::PhysicsError;

/// Worker threads owned by a world. Stepping runs inside [`JobPool::install`] so the
/// parallel phases use these workers and not the global rayon pool.
#[derive(Clone)]
pub struct JobPool {
    pool: Arc<rayon::ThreadPool>,
}

impl JobPool {
    /// `None` picks hardware parallelism minus one, at least one.
    pub fn new(threads: Option<usize>) -> Result<Self, PhysicsError> {
        let n = threads.unwrap_or_else(default_threads).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("rigidframe-job-{i}"))
            .build()
            .map_err(|e| PhysicsError::JobPool(e.to_string()))?;
        Ok(Self { pool: Arc::new(pool) })
    }

    pub fn num_threads(&self) -> usize { self.pool.current_num_threads() }

    pub fn install<R, F>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(f)
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get().saturating_sub(1).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn runs_on_requested_threads() {
        let pool = JobPool::new(Some(2)).unwrap();
        assert_eq!(pool.num_threads(), 2);
        let sum: u32 = pool.install(|| (1..=100u32).into_par_iter().sum());
        assert_eq!(sum, 5050);
    }

    #[test]
    fn default_leaves_a_core_for_the_caller() {
        let pool = JobPool::new(None).unwrap();
        assert!(pool.num_threads() >= 1);
    }
}
