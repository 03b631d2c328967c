use crate::registry::ReaderRegistry;
use crate::sync::{Condvar, Mutex};

/// Blocks the writer until every current reader has left.
///
/// The barrier has its own mutex rather than sharing the writer-exclusion
/// mutex: waiting on the writer mutex would release it for the duration of
/// the drain and admit a second writer.
///
/// Readers only touch the barrier when they bring the current count to zero
/// while a transition is pending, and then only for as long as it takes to
/// signal.
///
/// 阻塞写者，直到所有当前读者离开。
/// 屏障使用独立的互斥锁，而不是写者互斥锁：在写者互斥锁上等待会在排空期间
/// 释放它，从而放入第二个写者。
pub(crate) struct DrainBarrier {
    lock: Mutex<()>,
    cond: Condvar,
}

impl DrainBarrier {
    pub(crate) fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    /// Sleep until the current reader count is zero.
    ///
    /// The count is re-checked under the barrier mutex after every wake-up,
    /// so spurious wake-ups and readers that registered late are handled.
    ///
    /// 休眠直到当前读者数为零。每次唤醒后都在屏障锁下重新检查计数。
    pub(crate) fn wait_until_drained(&self, readers: &ReaderRegistry) {
        let mut guard = self.lock.lock();
        while readers.current_synced() > 0 {
            guard = self.cond.wait(guard);
        }
    }

    /// Wake the draining writer, if any.
    ///
    /// Taking the mutex orders this against the writer's check-then-wait, so
    /// the wake-up cannot fall between the two.
    ///
    /// 唤醒正在排空的写者（如果有）。
    pub(crate) fn notify(&self) {
        let _guard = self.lock.lock();
        self.cond.notify_all();
    }
}
