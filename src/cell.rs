use crate::guard::ReadGuard;
use crate::lock::RcuLock;
use crate::sync::{AtomicPtr, Ordering};
use std::boxed::Box;
use std::ops::Deref;

/// A value protected by an [`RcuLock`], replaced copy-on-write.
///
/// `RcuCell<T>` follows the container contract of the lock: a writer
/// publishes the new value, waits for the readers of the old value to drain,
/// and only then hands the old value back to the caller. Readers get a
/// [`CellRef`] that dereferences to the value current at the time they
/// entered.
///
/// **Typical Usage**:
/// ```
/// use rcu_epoch::RcuCell;
///
/// let config = RcuCell::new(String::from("v1"));
///
/// // Reader
/// {
///     let current = config.read();
///     assert_eq!(*current, "v1");
/// }
///
/// // Writer: the old value comes back once no reader can see it.
/// let old = config.replace(String::from("v2"));
/// assert_eq!(old, "v1");
///
/// let updated = config.update(|s| format!("{s}-patched"));
/// assert_eq!(updated, "v2");
/// assert_eq!(*config.read(), "v2-patched");
/// ```
///
/// 受 [`RcuLock`] 保护、以写时复制方式替换的值。
/// 写者先发布新值，等待旧值的读者排空，之后才把旧值交还给调用者。
pub struct RcuCell<T> {
    lock: RcuLock,
    ptr: AtomicPtr<T>,
}

// SAFETY: the cell owns its value like a `Box<T>`. Shared access hands `&T`
// to readers on any thread (needs `T: Sync`) and moves values in and out
// through `replace` (needs `T: Send`).
unsafe impl<T: Send> Send for RcuCell<T> {}
unsafe impl<T: Send + Sync> Sync for RcuCell<T> {}

impl<T> RcuCell<T> {
    /// Create a cell guarded by a fresh default lock.
    /// 创建一个由默认锁保护的单元。
    #[inline]
    pub fn new(value: T) -> Self {
        Self::with_lock(RcuLock::new(), value)
    }

    /// Create a cell guarded by `lock`, e.g. one configured through
    /// [`RcuLock::builder`].
    #[inline]
    pub fn with_lock(lock: RcuLock, value: T) -> Self {
        Self {
            lock,
            ptr: AtomicPtr::new(Box::into_raw(Box::new(value))),
        }
    }

    /// The lock guarding this cell.
    #[inline]
    pub fn lock(&self) -> &RcuLock {
        &self.lock
    }

    /// Read the current value.
    ///
    /// The returned reference keeps the read-side critical section open until
    /// it is dropped, so the value it points at cannot be reclaimed under it.
    ///
    /// 读取当前值。返回的引用在被 drop 之前保持读临界区打开。
    #[inline]
    pub fn read(&self) -> CellRef<'_, T> {
        let guard = self.lock.read();
        // A reader the writer's snapshot did not count registered after it, and
        // so observes the pointer published before it.
        let ptr = self.ptr.load(Ordering::SeqCst);
        // SAFETY: `ptr` came from `Box::into_raw` and is only freed by
        // `replace` after `WriteGuard::wait` has drained every reader that may
        // have loaded it. `guard` keeps this reader registered.
        let value = unsafe { &*ptr };
        CellRef { value, guard }
    }

    /// Publish `value` and return the previous value once no reader can
    /// observe it any more. Blocks while other writers are active and while
    /// old readers drain.
    ///
    /// # Deadlocks
    /// Blocks forever if the calling thread holds a [`CellRef`] from this
    /// cell (or any open read section on its lock): the writer waits for
    /// that reader to leave, and it never will.
    ///
    /// 发布 `value`，并在没有读者能再观察到旧值后将其返回。
    pub fn replace(&self, value: T) -> T {
        let mut writer = self.lock.write_begin();
        let new_ptr = Box::into_raw(Box::new(value));
        let old_ptr = self.ptr.swap(new_ptr, Ordering::SeqCst);
        writer.wait();
        drop(writer);
        // SAFETY: `old_ptr` came from `Box::into_raw` and the drain above
        // guarantees no reader still holds it.
        *unsafe { Box::from_raw(old_ptr) }
    }

    /// Copy-on-write update: build the replacement from the current value,
    /// publish it, and return the previous value once it is unobserved.
    ///
    /// `f` runs while writer access is held, so concurrent updates are applied
    /// one after another and none is lost.
    ///
    /// # Deadlocks
    /// Blocks forever if the calling thread holds a [`CellRef`] from this
    /// cell (or any open read section on its lock): the writer waits for
    /// that reader to leave, and it never will.
    ///
    /// 写时复制更新：基于当前值构造替换值并发布，旧值不再被观察后返回。
    pub fn update<F>(&self, f: F) -> T
    where
        F: FnOnce(&T) -> T,
    {
        let mut writer = self.lock.write_begin();
        let current = self.ptr.load(Ordering::SeqCst);
        // SAFETY: only writers free values and we hold writer access.
        let new_ptr = Box::into_raw(Box::new(f(unsafe { &*current })));
        let old_ptr = self.ptr.swap(new_ptr, Ordering::SeqCst);
        debug_assert_eq!(old_ptr, current);
        writer.wait();
        drop(writer);
        // SAFETY: as in `replace`.
        *unsafe { Box::from_raw(old_ptr) }
    }

    /// Consume the cell and return the current value.
    #[inline]
    pub fn into_inner(self) -> T {
        let ptr = self.ptr.swap(std::ptr::null_mut(), Ordering::Relaxed);
        // SAFETY: `self` is owned, so there are no readers; `ptr` is non-null
        // until this point and `Drop` skips the null pointer left behind.
        *unsafe { Box::from_raw(ptr) }
    }
}

impl<T: Default> Default for RcuCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RcuCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcuCell")
            .field("value", &*self.read())
            .field("lock", &self.lock)
            .finish()
    }
}

impl<T> Drop for RcuCell<T> {
    /// At drop time no other thread can access the cell, so the last value is
    /// freed directly.
    /// 在 drop 时没有其他线程能访问该单元，因此直接释放最后的值。
    fn drop(&mut self) {
        let ptr = self.ptr.load(Ordering::Relaxed);
        if !ptr.is_null() {
            unsafe {
                drop(Box::from_raw(ptr));
            }
        }
    }
}

/// A reference into an [`RcuCell`], valid for as long as it lives.
///
/// 指向 [`RcuCell`] 内部值的引用，在其生命周期内有效。
#[must_use]
pub struct CellRef<'a, T> {
    value: &'a T,
    guard: ReadGuard<'a>,
}

impl<T> CellRef<'_, T> {
    /// The epoch this read entered under.
    #[inline]
    pub fn epoch(&self) -> u32 {
        self.guard.epoch()
    }
}

impl<T> Deref for CellRef<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.value
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for CellRef<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.value, f)
    }
}
