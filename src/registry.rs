use crate::sync::{AtomicIsize, Ordering};

/// The current-reader counter: readers registered against the stable epoch.
///
/// Readers registered while a transition is pending ("next" readers) are
/// counted in the writing word of [`EpochState`](crate::epoch::EpochState),
/// next to the marker they registered against.
///
/// 当前读者计数器：在稳定纪元下注册的读者。
/// 切换期间注册的读者数保存在 `EpochState` 的写标记字中，与标记放在一起。
#[derive(Debug)]
#[repr(align(64))]
pub(crate) struct ReaderRegistry {
    current: AtomicIsize,
}

impl ReaderRegistry {
    pub(crate) fn new() -> Self {
        Self {
            current: AtomicIsize::new(0),
        }
    }

    #[inline]
    pub(crate) fn current(&self) -> isize {
        self.current.load(Ordering::SeqCst)
    }

    /// Like [`current`](Self::current), but as a read-modify-write so it reads
    /// the latest value in modification order and synchronizes with the
    /// readers' increments and decrements. The writer uses this for its
    /// snapshot and its drain check.
    ///
    /// 与 `current` 相同，但使用读-改-写以读取修改序中的最新值，并与读者的增减同步。
    #[inline]
    pub(crate) fn current_synced(&self) -> isize {
        self.current.fetch_add(0, Ordering::SeqCst)
    }

    #[inline]
    pub(crate) fn enter_current(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the current count. Returns `true` if it reached zero.
    /// 减少当前读者数，归零时返回 `true`。
    #[inline]
    pub(crate) fn leave_current(&self) -> bool {
        let previous = self.current.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(
            previous > 0,
            "BUG: current reader count went negative ({}). \
             This indicates an unpaired read_end or a library bug.",
            previous - 1
        );
        previous == 1
    }

    #[inline]
    pub(crate) fn add_current(&self, n: isize) {
        self.current.fetch_add(n, Ordering::SeqCst);
    }

    #[inline]
    pub(crate) fn sub_current(&self, n: isize) {
        self.current.fetch_sub(n, Ordering::SeqCst);
    }
}
