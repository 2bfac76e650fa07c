//! 读写自旋锁
//!
//! 读者优先：读者只在写者持锁时等待，不会被等待中的写者阻塞，
//! 因此中断上下文中的读者不会因为本 CPU 上的写者排队而死锁。
//! 写者持锁期间屏蔽本地中断，读者不屏蔽。

use crate::intr_guard::IntrGuard;
use core::{
    hint,
    sync::atomic::{AtomicUsize, Ordering},
};

const WRITER: usize = 1;
const READER: usize = 2;

/// 读者优先的 raw 读写自旋锁。
#[derive(Debug)]
pub struct RawRwSpinLock {
    /// 最低位为写者标志，其余位为读者计数
    state: AtomicUsize,
    saved_flags: AtomicUsize,
}

impl RawRwSpinLock {
    /// 创建一个未上锁的实例。
    pub const fn new() -> Self {
        Self {
            state: AtomicUsize::new(0),
            saved_flags: AtomicUsize::new(0),
        }
    }

    fn try_add_reader(&self) -> bool {
        let state = self.state.load(Ordering::Relaxed);
        state & WRITER == 0
            && self
                .state
                .compare_exchange_weak(state, state + READER, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
    }
}

impl Default for RawRwSpinLock {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: 写者独占 state == WRITER，读者只在 WRITER 位清零时递增计数
unsafe impl lock_api::RawRwLock for RawRwSpinLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self::new();

    type GuardMarker = lock_api::GuardNoSend;

    fn lock_shared(&self) {
        while !self.try_add_reader() {
            hint::spin_loop();
        }
    }

    fn try_lock_shared(&self) -> bool {
        loop {
            let state = self.state.load(Ordering::Relaxed);
            if state & WRITER != 0 {
                return false;
            }
            if self
                .state
                .compare_exchange(state, state + READER, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    unsafe fn unlock_shared(&self) {
        self.state.fetch_sub(READER, Ordering::Release);
    }

    fn lock_exclusive(&self) {
        let guard = IntrGuard::new();
        while self
            .state
            .compare_exchange_weak(0, WRITER, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            hint::spin_loop();
        }
        self.saved_flags.store(guard.into_flags(), Ordering::Relaxed);
    }

    fn try_lock_exclusive(&self) -> bool {
        let guard = IntrGuard::new();
        if self
            .state
            .compare_exchange(0, WRITER, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.saved_flags.store(guard.into_flags(), Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    unsafe fn unlock_exclusive(&self) {
        let flags = self.saved_flags.load(Ordering::Relaxed);
        self.state.store(0, Ordering::Release);
        // SAFETY: flags 由写者在加锁时保存
        drop(unsafe { IntrGuard::from_flags(flags) });
    }

    fn is_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) != 0
    }

    fn is_locked_exclusive(&self) -> bool {
        self.state.load(Ordering::Relaxed) & WRITER != 0
    }
}

/// 读写自旋锁
pub type RwLock<T> = lock_api::RwLock<RawRwSpinLock, T>;

/// [`RwLock`] 读守卫
pub type RwLockReadGuard<'a, T> = lock_api::RwLockReadGuard<'a, RawRwSpinLock, T>;

/// [`RwLock`] 写守卫
pub type RwLockWriteGuard<'a, T> = lock_api::RwLockWriteGuard<'a, RawRwSpinLock, T>;
