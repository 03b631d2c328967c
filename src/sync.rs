#[cfg(feature = "loom")]
pub use loom::sync::atomic::{AtomicIsize, AtomicPtr, AtomicU32, AtomicU64, Ordering};
#[cfg(not(feature = "loom"))]
pub use std::sync::atomic::{AtomicIsize, AtomicPtr, AtomicU32, AtomicU64, Ordering};

#[cfg(not(feature = "loom"))]
pub use antidote::{Condvar, Mutex, MutexGuard};

#[cfg(feature = "loom")]
pub use loom::sync::MutexGuard;

#[cfg(feature = "loom")]
#[derive(Debug, Default)]
pub struct Mutex<T>(loom::sync::Mutex<T>);

#[cfg(feature = "loom")]
impl<T> Mutex<T> {
    pub fn new(t: T) -> Self {
        Self(loom::sync::Mutex::new(t))
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().unwrap()
    }
}

#[cfg(feature = "loom")]
pub struct Condvar(loom::sync::Condvar);

#[cfg(feature = "loom")]
impl Condvar {
    pub fn new() -> Self {
        Self(loom::sync::Condvar::new())
    }

    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.0.wait(guard).unwrap()
    }

    pub fn notify_all(&self) {
        self.0.notify_all()
    }
}

/// Spin for a bounded number of iterations, then give the time slice away.
///
/// Loom has no notion of a busy loop, so every iteration yields there.
///
/// 有限次自旋，之后让出时间片。
#[derive(Debug)]
#[cfg_attr(feature = "loom", allow(dead_code))]
pub(crate) struct Spin {
    limit: usize,
    step: usize,
}

impl Spin {
    #[inline]
    pub(crate) fn new(limit: usize) -> Self {
        Self { limit, step: 0 }
    }

    #[inline]
    pub(crate) fn wait(&mut self) {
        #[cfg(feature = "loom")]
        {
            loom::thread::yield_now();
        }

        #[cfg(not(feature = "loom"))]
        {
            if self.step < self.limit {
                self.step += 1;
                std::hint::spin_loop();
            } else {
                std::thread::yield_now();
            }
        }
    }
}
