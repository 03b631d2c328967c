//! Epoch-based read-copy-update lock.
//!
//! [`RcuLock`] lets any number of readers access a shared structure without
//! taking a lock a writer holds, while writers replace the structure
//! copy-on-write and wait until every reader that could still see the old
//! version has left before reclaiming it.
//!
//! State is an epoch counter, a writing marker naming the target of an
//! in-flight transition, and two reader counts: readers that entered under
//! the stable epoch and readers that entered while a transition was pending.
//! A writer advances the epoch, sleeps until the first count drains, then
//! folds the second count into the first.
//!
//! ```
//! use rcu_epoch::RcuLock;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let lock = Arc::new(RcuLock::new());
//!
//! let reader = {
//!     let lock = lock.clone();
//!     thread::spawn(move || {
//!         for _ in 0..100 {
//!             let guard = lock.read();
//!             assert_ne!(guard.epoch(), 0);
//!         }
//!     })
//! };
//!
//! for _ in 0..10 {
//!     let mut writer = lock.write_begin();
//!     // publish a new version here
//!     writer.wait();
//!     // the previous version is now unobserved and can be reclaimed
//! }
//!
//! reader.join().unwrap();
//! assert_eq!(lock.current_epoch(), 11);
//! ```
//!
//! [`RcuCell`] packages the publish, drain, reclaim sequence for a single
//! boxed value.
//!
//! 基于纪元的读-复制-更新锁。读者不获取写者持有的任何锁；写者以写时复制方式替换数据，
//! 并在回收旧版本之前等待所有可能看到旧版本的读者离开。

mod barrier;
mod cell;
mod epoch;
mod guard;
mod lock;
mod registry;
mod state;
mod sync;

pub use cell::{CellRef, RcuCell};
pub use guard::{ReadGuard, ReadToken, WriteGuard};
pub use lock::{RcuLock, RcuLockBuilder, ReaderCounts};

#[cfg(all(test, not(feature = "loom")))]
mod tests;
