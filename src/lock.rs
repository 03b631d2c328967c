use crate::barrier::DrainBarrier;
use crate::epoch::EpochState;
use crate::guard::{ReadGuard, ReadToken, WriteGuard};
use crate::registry::ReaderRegistry;
use crate::state::{DEFAULT_SPIN_LIMIT, INITIAL_EPOCH};
use crate::sync::{Mutex, Spin};
use log::trace;

/// Builder for configuring an `RcuLock`.
///
/// - `initial_epoch`: the epoch the lock starts in (must be nonzero)
/// - `spin_limit`: busy iterations before a spinning reader yields its thread
///
/// # Example
/// ```
/// use rcu_epoch::RcuLock;
///
/// let lock = RcuLock::builder()
///     .initial_epoch(10)
///     .spin_limit(16)
///     .build();
/// assert_eq!(lock.current_epoch(), 10);
/// ```
///
/// 用于配置 `RcuLock` 的构建器。
#[derive(Debug, Clone)]
pub struct RcuLockBuilder {
    initial_epoch: u32,
    spin_limit: usize,
}

impl RcuLockBuilder {
    /// Create a new builder with default settings.
    /// 创建一个带有默认设置的新构建器。
    #[inline]
    pub fn new() -> Self {
        Self {
            initial_epoch: INITIAL_EPOCH,
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }

    /// Set the epoch the lock starts in.
    ///
    /// Default: `1`
    ///
    /// 设置锁的初始纪元。
    #[inline]
    pub fn initial_epoch(mut self, epoch: u32) -> Self {
        self.initial_epoch = epoch;
        self
    }

    /// Set how many times a reader busy-spins before it starts yielding while
    /// it waits for a writer to finish moving pending readers.
    ///
    /// The wait only ever spans a writer's move step, so it resolves in a
    /// handful of iterations in practice. `0` yields immediately.
    ///
    /// Default: `64`
    ///
    /// 设置读者在等待写者完成读者迁移时，开始让出 CPU 之前的忙等次数。
    #[inline]
    pub fn spin_limit(mut self, limit: usize) -> Self {
        self.spin_limit = limit;
        self
    }

    /// Build the `RcuLock`.
    ///
    /// # Panics
    /// Panics if the initial epoch is `0`, which is reserved.
    ///
    /// 构建 `RcuLock`。初始纪元为 `0` 时 panic。
    #[inline]
    pub fn build(self) -> RcuLock {
        RcuLock {
            epochs: EpochState::new(self.initial_epoch),
            readers: ReaderRegistry::new(),
            barrier: DrainBarrier::new(),
            writer: Mutex::new(()),
            spin_limit: self.spin_limit,
        }
    }
}

impl Default for RcuLockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Racy snapshot of the two reader counts, for diagnostics and tests.
///
/// At a quiescent point (no writer inside [`WriteGuard::wait`], every reader
/// between calls) `current + next` equals the number of open read sections.
///
/// 两个读者计数的快照（非原子），用于诊断与测试。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderCounts {
    /// Readers registered against the stable epoch.
    pub current: isize,
    /// Readers registered while a transition is pending.
    pub next: u32,
}

/// An epoch-based read-copy-update lock.
///
/// Readers never block: [`read_begin`](RcuLock::read_begin) and
/// [`read_end`](RcuLock::read_end) are a few atomic operations, with a short
/// bounded spin only while a writer is folding pending readers into the
/// current epoch. Writers are serialized by a mutex; after publishing a new
/// version of the protected data a writer calls [`WriteGuard::wait`], which
/// advances the epoch and sleeps until every reader that could still see the
/// old version has left.
///
/// **Typical Usage**:
/// ```
/// use rcu_epoch::RcuLock;
///
/// let lock = RcuLock::new();
///
/// // Reader
/// let token = lock.read_begin();
/// // ... dereference the protected structure ...
/// lock.read_end(token);
///
/// // Writer
/// let mut writer = lock.write_begin();
/// // ... publish the new version ...
/// let epoch = writer.wait();
/// // ... reclaim the old version ...
/// writer.end();
/// assert_eq!(epoch, 2);
/// ```
///
/// 基于纪元的读-复制-更新锁。
/// 读者从不阻塞；写者由互斥锁串行化。写者发布新版本后调用 [`WriteGuard::wait`]，
/// 它推进纪元并休眠，直到所有可能看到旧版本的读者都离开。
pub struct RcuLock {
    pub(crate) epochs: EpochState,
    pub(crate) readers: ReaderRegistry,
    pub(crate) barrier: DrainBarrier,
    writer: Mutex<()>,
    spin_limit: usize,
}

impl RcuLock {
    /// Create a lock starting at epoch `1`.
    /// 创建一个从纪元 `1` 开始的锁。
    #[inline]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuring the lock.
    /// 创建一个用于配置锁的构建器。
    #[inline]
    pub fn builder() -> RcuLockBuilder {
        RcuLockBuilder::new()
    }

    /// The stable epoch.
    #[inline]
    pub fn current_epoch(&self) -> u32 {
        self.epochs.current_epoch()
    }

    /// Snapshot of the reader counts. Not atomic across the two counts.
    #[inline]
    pub fn reader_counts(&self) -> ReaderCounts {
        ReaderCounts {
            current: self.readers.current(),
            next: self.epochs.next_readers(),
        }
    }

    /// Enter a read-side critical section.
    ///
    /// Never blocks on a writer. If a writer is mid-transition the reader is
    /// counted against the transition's target epoch and does not delay that
    /// writer. If a writer has just cleared its marker but not yet folded the
    /// pending readers into the current count, this spins until it has.
    ///
    /// Every call must be paired with exactly one [`read_end`](Self::read_end)
    /// on every control-flow path; a leaked token makes the next writer wait
    /// forever. Prefer [`read`](Self::read) where a scope fits.
    ///
    /// 进入读临界区。从不阻塞在写者上。
    /// 每次调用都必须在所有控制流路径上与一次 `read_end` 配对；泄漏的凭证会让下一个写者永远等待。
    pub fn read_begin(&self) -> ReadToken {
        let mut spin = Spin::new(self.spin_limit);
        loop {
            let writing = self.epochs.writing();
            let epoch = self.epochs.current_epoch();

            if writing.in_transition() {
                // The target epoch, not `epoch`: the bump may not be visible yet.
                if self.epochs.try_enter_next(writing) {
                    return ReadToken::pending(writing.marker);
                }
                continue;
            }

            if writing.moving() {
                spin.wait();
                continue;
            }

            self.readers.enter_current();
            return ReadToken::stable(epoch);
        }
    }

    /// Leave the read-side critical section opened by `token`.
    ///
    /// If this reader entered during a transition that is still in flight it
    /// leaves the pending count; the compare-exchange fails and the whole
    /// classification is retried if the writer finished the transition in the
    /// meantime. Otherwise it leaves the current count and, if it was the
    /// last reader a draining writer was waiting for, wakes that writer.
    ///
    /// 离开由 `token` 打开的读临界区。
    /// 如果读者在仍在进行的切换期间进入，则从待定计数中退出；若写者在此期间完成了切换，
    /// CAS 失败并重新分类。否则从当前计数中退出，若是写者等待的最后一个读者则唤醒写者。
    pub fn read_end(&self, token: ReadToken) {
        self.leave(&token);
    }

    /// Body of `read_end`, borrowed so `ReadGuard` can end its section from
    /// `Drop` while keeping the token as a plain field.
    pub(crate) fn leave(&self, token: &ReadToken) {
        let mut spin = Spin::new(self.spin_limit);
        loop {
            let writing = self.epochs.writing();

            if token.pending {
                if writing.marker == token.epoch {
                    if self.epochs.try_leave_next(writing) {
                        return;
                    }
                    continue;
                }
                // Transition finished; wait until this reader has been moved.
                if writing.moving() {
                    spin.wait();
                    continue;
                }
            }
            break;
        }

        if self.readers.leave_current() && self.epochs.writing_synced().in_transition() {
            self.barrier.notify();
        }
    }

    /// Enter a read-side critical section that ends when the guard is dropped.
    ///
    /// 进入一个在守卫 drop 时结束的读临界区。
    #[inline]
    pub fn read(&self) -> ReadGuard<'_> {
        ReadGuard::new(self)
    }

    /// Acquire exclusive writer access, blocking while another writer holds it.
    ///
    /// 获取独占写者访问；若其他写者持有则阻塞。
    #[inline]
    pub fn write_begin(&self) -> WriteGuard<'_> {
        WriteGuard::new(self, self.writer.lock())
    }

    /// Wait for every reader that entered before this call to leave.
    ///
    /// Shorthand for `write_begin`, [`WriteGuard::wait`], `end`. Returns the
    /// new epoch.
    ///
    /// 等待在此调用之前进入的所有读者离开。返回新纪元。
    pub fn synchronize(&self) -> u32 {
        let mut writer = self.write_begin();
        writer.wait()
    }

    /// Fold the readers that registered during the transition into the current
    /// count. Caller must hold the writer mutex and have finished draining.
    ///
    /// The marker is cleared first, which freezes the pending count. The count
    /// is then added to the current readers and taken out of the pending half
    /// with a subtract-and-verify, retried if it moved underneath. Adding
    /// rather than storing keeps readers that already registered against the
    /// new epoch.
    pub(crate) fn move_pending_readers(&self) {
        let mut pending = self.epochs.clear_marker();
        loop {
            self.readers.add_current(pending as isize);
            if self.epochs.take_next(pending) {
                break;
            }
            self.readers.sub_current(pending as isize);
            pending = self.epochs.next_readers();
        }

        debug_assert_eq!(
            self.epochs.next_readers(),
            0,
            "BUG: pending readers left behind after the move step"
        );
        trace!("moved {pending} pending reader(s) into the current epoch");
    }
}

impl Default for RcuLock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RcuLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcuLock")
            .field("epoch", &self.current_epoch())
            .field("readers", &self.reader_counts())
            .finish_non_exhaustive()
    }
}
