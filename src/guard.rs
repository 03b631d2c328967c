use crate::lock::RcuLock;
use crate::sync::MutexGuard;
use log::debug;

/// Proof of an open read-side critical section, returned by
/// [`RcuLock::read_begin`] and consumed by [`RcuLock::read_end`].
///
/// The token carries the epoch the reader entered under: the stable epoch,
/// or the target epoch of a transition that was in flight at entry. It also
/// remembers which reader count it was registered against, so `read_end`
/// classifies it the same way even if the transition completes in between.
///
/// A token is neither `Clone` nor `Copy`; each one is ended exactly once.
///
/// 读临界区的凭证，由 [`RcuLock::read_begin`] 返回，由 [`RcuLock::read_end`] 消费。
/// 它携带读者进入时的纪元（稳定纪元，或进入时正在进行的切换的目标纪元），
/// 并记住自己注册在哪一个读者计数上。
#[must_use = "every read_begin must be paired with read_end"]
#[derive(Debug, PartialEq, Eq)]
pub struct ReadToken {
    pub(crate) epoch: u32,
    /// Registered in the next-reader count of the transition to `epoch`.
    pub(crate) pending: bool,
}

impl ReadToken {
    #[inline]
    pub(crate) fn stable(epoch: u32) -> Self {
        Self {
            epoch,
            pending: false,
        }
    }

    #[inline]
    pub(crate) fn pending(epoch: u32) -> Self {
        Self {
            epoch,
            pending: true,
        }
    }

    /// The epoch this reader entered under. Never `0`.
    /// 读者进入时的纪元，永远不为 `0`。
    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Whether the reader entered while a writer was mid-transition.
    /// 读者是否在写者切换纪元的过程中进入。
    #[inline]
    pub fn entered_during_transition(&self) -> bool {
        self.pending
    }
}

/// Scoped read-side critical section. Ends the read when dropped, including
/// during unwinding.
///
/// 作用域化的读临界区。在 drop 时（包括栈展开时）结束读操作。
#[must_use]
pub struct ReadGuard<'a> {
    lock: &'a RcuLock,
    token: ReadToken,
}

impl<'a> ReadGuard<'a> {
    #[inline]
    pub(crate) fn new(lock: &'a RcuLock) -> Self {
        Self {
            lock,
            token: lock.read_begin(),
        }
    }

    /// The epoch this reader entered under.
    #[inline]
    pub fn epoch(&self) -> u32 {
        self.token.epoch()
    }
}

impl Drop for ReadGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.lock.leave(&self.token);
    }
}

impl std::fmt::Debug for ReadGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadGuard")
            .field("token", &self.token)
            .finish()
    }
}

/// Exclusive writer access to an [`RcuLock`].
///
/// Obtained from [`RcuLock::write_begin`]. While it is alive no other writer
/// can begin. The intended sequence is:
///
/// 1. publish the replacement version of the protected data,
/// 2. call [`wait`](WriteGuard::wait),
/// 3. reclaim the previous version,
/// 4. drop the guard (or call [`end`](WriteGuard::end)).
///
/// Reclaiming before `wait` returns is a use-after-free for any reader still
/// holding the old version.
///
/// 对 [`RcuLock`] 的独占写者访问。
/// 使用顺序：发布新版本，调用 `wait`，回收旧版本，最后释放守卫。
/// 在 `wait` 返回之前回收旧版本会导致仍持有旧版本的读者发生释放后使用。
#[must_use]
pub struct WriteGuard<'a> {
    lock: &'a RcuLock,
    _exclusive: MutexGuard<'a, ()>,
}

impl<'a> WriteGuard<'a> {
    #[inline]
    pub(crate) fn new(lock: &'a RcuLock, exclusive: MutexGuard<'a, ()>) -> Self {
        Self {
            lock,
            _exclusive: exclusive,
        }
    }

    /// Advance the epoch and block until no reader can still observe the
    /// version that was current before this call. Returns the new epoch.
    ///
    /// Readers that arrive while this call is draining are counted separately
    /// and do not delay it; once the drain finishes they are folded into the
    /// current readers of the new epoch.
    ///
    /// May be called more than once in the same write section; each call is a
    /// full transition.
    ///
    /// 推进纪元并阻塞，直到没有读者还能观察到调用前的版本。返回新纪元。
    /// 排空期间到达的读者单独计数，不会延长等待；排空结束后它们被并入新纪元的当前读者。
    pub fn wait(&mut self) -> u32 {
        let lock = self.lock;

        let draining = lock.readers.current_synced();
        let epoch = lock.epochs.advance_epoch();

        if draining > 0 {
            debug!("epoch {epoch}: draining {draining} reader(s) of the previous epoch");
            lock.barrier.wait_until_drained(&lock.readers);
            debug!("epoch {epoch}: drain complete");
        }

        lock.move_pending_readers();
        epoch
    }

    /// Release writer access. Equivalent to dropping the guard.
    /// 释放写者访问，等价于 drop 守卫。
    #[inline]
    pub fn end(self) {}
}

impl std::fmt::Debug for WriteGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteGuard")
            .field("epoch", &self.lock.current_epoch())
            .finish()
    }
}
