//! 边界情况测试模块
//! 测试纪元回绕、配置边界、panic 与跨线程结束读操作

use super::init_logger;
use crate::{RcuLock, ReaderCounts};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

fn quiescent() -> ReaderCounts {
    ReaderCounts {
        current: 0,
        next: 0,
    }
}

/// 测试1: 纪元从 u32::MAX 回绕到 1，跳过 0
#[test]
fn test_epoch_wraps_past_zero() {
    init_logger();
    let lock = RcuLock::builder().initial_epoch(u32::MAX).build();
    assert_eq!(lock.current_epoch(), u32::MAX);

    let old = lock.read_begin();
    assert_eq!(old.epoch(), u32::MAX);
    lock.read_end(old);

    assert_eq!(lock.synchronize(), 1);
    assert_eq!(lock.synchronize(), 2);

    let token = lock.read_begin();
    assert_eq!(token.epoch(), 2);
    lock.read_end(token);
}

/// 测试2: 回绕的切换期间进入的读者拿到纪元 1
#[test]
fn test_pending_reader_across_wraparound() {
    let lock = RcuLock::builder().initial_epoch(u32::MAX).build();
    assert_eq!(lock.epochs.advance_epoch(), 1);

    let token = lock.read_begin();
    assert_eq!(token.epoch(), 1);
    assert!(token.entered_during_transition());

    lock.move_pending_readers();
    lock.read_end(token);
    assert_eq!(lock.reader_counts(), quiescent());
}

/// 测试3: 初始纪元为 0 时 panic
#[test]
#[should_panic(expected = "epoch 0 is reserved")]
fn test_zero_initial_epoch_panics() {
    let _lock = RcuLock::builder().initial_epoch(0).build();
}

/// 测试4: spin_limit 为 0 时读者立即让出，行为不变
#[test]
fn test_zero_spin_limit() {
    init_logger();
    let lock = Arc::new(RcuLock::builder().spin_limit(0).build());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lock = lock.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let guard = lock.read();
                    assert_ne!(guard.epoch(), 0);
                }
            })
        })
        .collect();

    for _ in 0..50 {
        lock.synchronize();
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(lock.current_epoch(), 51);
    assert_eq!(lock.reader_counts(), quiescent());
}

/// 测试5: 读临界区内 panic 时 ReadGuard 仍然结束读操作
#[test]
fn test_read_guard_ends_during_unwind() {
    let lock = RcuLock::new();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _guard = lock.read();
        panic!("reader failed");
    }));
    assert!(result.is_err());

    assert_eq!(lock.reader_counts(), quiescent());
    // A leaked reader would block this forever.
    assert_eq!(lock.synchronize(), 2);
}

/// 测试6: 写区间内 panic 后写者互斥锁仍可用
#[test]
fn test_writer_panic_does_not_poison() {
    let lock = RcuLock::new();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut writer = lock.write_begin();
        writer.wait();
        panic!("writer failed");
    }));
    assert!(result.is_err());

    assert_eq!(lock.current_epoch(), 2);
    assert_eq!(lock.synchronize(), 3);
}

/// 测试7: 读凭证可以在另一个线程上结束
#[test]
fn test_token_ended_on_another_thread() {
    let lock = Arc::new(RcuLock::new());
    let token = lock.read_begin();

    let ender = {
        let lock = lock.clone();
        thread::spawn(move || lock.read_end(token))
    };
    ender.join().unwrap();

    assert_eq!(lock.reader_counts(), quiescent());
    assert_eq!(lock.synchronize(), 2);
}

/// 测试8: 读者在持有凭证期间经历多次不相关的切换
#[test]
fn test_reader_spanning_many_transitions() {
    let lock = RcuLock::new();

    // Entered during the transition to 2, then moved.
    lock.epochs.advance_epoch();
    let long = lock.read_begin();
    lock.move_pending_readers();

    // Later transitions drain it as a current reader; drive them by hand so
    // the test does not block on it.
    for expected in 3..10 {
        assert_eq!(lock.epochs.advance_epoch(), expected);
        let short = lock.read_begin();
        assert_eq!(short.epoch(), expected);
        assert!(short.entered_during_transition());
        lock.read_end(short);
        lock.move_pending_readers();
    }

    assert_eq!(
        lock.reader_counts(),
        ReaderCounts {
            current: 1,
            next: 0
        }
    );
    lock.read_end(long);
    assert_eq!(lock.reader_counts(), quiescent());
}

/// 测试9: 大量嵌套读者
#[test]
fn test_many_open_tokens() {
    let lock = RcuLock::new();
    let tokens: Vec<_> = (0..10_000).map(|_| lock.read_begin()).collect();
    assert_eq!(lock.reader_counts().current, 10_000);

    for token in tokens {
        lock.read_end(token);
    }
    assert_eq!(lock.reader_counts(), quiescent());
}
