use crate::state::{NO_TRANSITION, Writing, next_epoch};
use crate::sync::{AtomicU32, AtomicU64, Ordering};
use log::{debug, trace};

/// The stable epoch plus the writing word of an [`RcuLock`](crate::RcuLock).
///
/// Only the writer (holding the writer mutex) changes the epoch or the marker.
/// Readers load both without synchronization beyond the atomics themselves.
///
/// 稳定纪元以及写标记字。
/// 只有写者（持有写者互斥锁时）会修改纪元或标记，读者只做原子读取。
#[derive(Debug)]
#[repr(align(64))]
pub(crate) struct EpochState {
    epoch: AtomicU32,
    /// See [`Writing`] for the layout.
    writing: AtomicU64,
}

impl EpochState {
    pub(crate) fn new(initial_epoch: u32) -> Self {
        assert!(
            initial_epoch != NO_TRANSITION,
            "epoch 0 is reserved and cannot be used as the initial epoch"
        );

        Self {
            epoch: AtomicU32::new(initial_epoch),
            writing: AtomicU64::new(Writing::IDLE.pack()),
        }
    }

    /// The stable epoch.
    /// 当前稳定纪元。
    #[inline]
    pub(crate) fn current_epoch(&self) -> u32 {
        self.epoch.load(Ordering::SeqCst)
    }

    #[inline]
    pub(crate) fn writing(&self) -> Writing {
        Writing::unpack(self.writing.load(Ordering::SeqCst))
    }

    /// Read-modify-write load of the writing word. Used by a reader that just
    /// emptied the current count, paired with the writer's
    /// [`ReaderRegistry::current_synced`](crate::registry::ReaderRegistry::current_synced),
    /// so at least one side observes the other.
    #[inline]
    pub(crate) fn writing_synced(&self) -> Writing {
        Writing::unpack(self.writing.fetch_add(0, Ordering::SeqCst))
    }

    #[inline]
    pub(crate) fn compare_exchange_writing(&self, current: Writing, new: Writing) -> bool {
        self.writing
            .compare_exchange(current.pack(), new.pack(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Readers registered against the in-flight transition.
    #[inline]
    pub(crate) fn next_readers(&self) -> u32 {
        self.writing().next
    }

    /// Register as a next reader, provided the word is still `seen`.
    /// 若写标记字仍为 `seen`，则注册为下一纪元读者。
    #[inline]
    pub(crate) fn try_enter_next(&self, seen: Writing) -> bool {
        debug_assert!(seen.in_transition());
        self.compare_exchange_writing(seen, seen.with_next(seen.next + 1))
    }

    /// Leave the next count, provided the word is still `seen`.
    /// 若写标记字仍为 `seen`，则从下一纪元读者数中退出。
    #[inline]
    pub(crate) fn try_leave_next(&self, seen: Writing) -> bool {
        debug_assert!(seen.in_transition());
        debug_assert!(seen.next > 0, "BUG: next reader count would go negative");
        self.compare_exchange_writing(seen, seen.with_next(seen.next - 1))
    }

    /// Subtract exactly `n` from the next count, failing if it changed since it
    /// was read. Used by the move step once the marker is cleared.
    ///
    /// 从下一纪元读者数中减去 `n`；如果读取之后它被修改过则失败。
    #[inline]
    pub(crate) fn take_next(&self, n: u32) -> bool {
        let seen = Writing::IDLE.with_next(n);
        self.compare_exchange_writing(seen, Writing::IDLE)
    }

    /// Start a transition: publish the target epoch as the marker, then bump
    /// the stable epoch to it. Returns the new epoch.
    ///
    /// The marker store is sequenced before the epoch store and both are
    /// `SeqCst`, so no reader sees the new epoch without the marker having
    /// been set first. The wrap from `u32::MAX` to `1` takes the same path.
    ///
    /// Caller must hold the writer mutex.
    ///
    /// 开始一次纪元切换：先把目标纪元发布为写标记，再把稳定纪元推进到它。
    /// 调用者必须持有写者互斥锁。
    pub(crate) fn advance_epoch(&self) -> u32 {
        let current = self.epoch.load(Ordering::SeqCst);
        let target = next_epoch(current);

        if target < current {
            debug!("epoch wrapped around: {current} -> {target}");
        }

        let previous = Writing::unpack(
            self.writing
                .swap(Writing::IDLE.with_marker(target).pack(), Ordering::SeqCst),
        );
        debug_assert_eq!(
            previous,
            Writing::IDLE,
            "BUG: epoch advanced while a previous transition was still pending"
        );

        self.epoch.store(target, Ordering::SeqCst);
        trace!("epoch advanced: {current} -> {target}");

        target
    }

    /// Clear the marker, keeping the pending reader count. Returns that count.
    ///
    /// Every change to the pending count is a compare-exchange conditional on
    /// the marker, so once this returns the count is frozen until the writer
    /// folds it into the current readers.
    ///
    /// 清除写标记并保留待定读者数，返回该数值。之后待定计数被冻结。
    pub(crate) fn clear_marker(&self) -> u32 {
        loop {
            let seen = self.writing();
            debug_assert!(seen.in_transition(), "BUG: clearing a marker that is not set");
            if self.compare_exchange_writing(seen, seen.with_marker(NO_TRANSITION)) {
                return seen.next;
            }
        }
    }
}
