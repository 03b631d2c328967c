/// Epoch a freshly built lock starts in.
/// 新建锁的初始纪元。
pub(crate) const INITIAL_EPOCH: u32 = 1;

/// Marker value meaning "no transition in flight". Never a valid epoch.
/// 表示"没有正在进行的纪元切换"的标记值。它永远不是合法纪元。
pub(crate) const NO_TRANSITION: u32 = 0;

/// Default number of busy iterations before a spinning thread yields.
/// 自旋线程让出 CPU 之前的默认忙等次数。
pub(crate) const DEFAULT_SPIN_LIMIT: usize = 64;

const MARKER_SHIFT: u32 = 32;
const NEXT_MASK: u64 = u32::MAX as u64;

/// The epoch following `epoch`, skipping the reserved value `0` on overflow.
///
/// 紧随 `epoch` 之后的纪元，溢出时跳过保留值 `0`。
#[inline]
pub(crate) fn next_epoch(epoch: u32) -> u32 {
    match epoch.wrapping_add(1) {
        NO_TRANSITION => 1,
        next => next,
    }
}

/// Unpacked view of the writing word.
///
/// The writing marker and the number of readers that registered while the
/// transition was pending live in one `AtomicU64`: marker in the high half,
/// next-reader count in the low half. Registering into the pending count is
/// therefore conditional on the marker in a single compare-exchange.
///
/// 写标记字的解包视图。
///
/// 写标记与切换期间注册的读者数共享一个 `AtomicU64`：高 32 位是标记，
/// 低 32 位是下一纪元读者数。因此向待定计数注册与检查标记是同一次 CAS。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Writing {
    /// Target epoch of the in-flight transition, or `NO_TRANSITION`.
    pub(crate) marker: u32,
    /// Readers registered against `marker`.
    pub(crate) next: u32,
}

impl Writing {
    pub(crate) const IDLE: Writing = Writing {
        marker: NO_TRANSITION,
        next: 0,
    };

    #[inline]
    pub(crate) fn unpack(word: u64) -> Self {
        Self {
            marker: (word >> MARKER_SHIFT) as u32,
            next: (word & NEXT_MASK) as u32,
        }
    }

    #[inline]
    pub(crate) fn pack(self) -> u64 {
        ((self.marker as u64) << MARKER_SHIFT) | self.next as u64
    }

    #[inline]
    pub(crate) fn in_transition(self) -> bool {
        self.marker != NO_TRANSITION
    }

    /// Marker already cleared but pending readers not yet folded into the
    /// current count.
    #[inline]
    pub(crate) fn moving(self) -> bool {
        self.marker == NO_TRANSITION && self.next > 0
    }

    #[inline]
    pub(crate) fn with_next(self, next: u32) -> Self {
        Self { next, ..self }
    }

    #[inline]
    pub(crate) fn with_marker(self, marker: u32) -> Self {
        Self { marker, ..self }
    }
}
