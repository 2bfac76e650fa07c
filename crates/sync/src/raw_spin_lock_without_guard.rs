//! 不屏蔽中断的自旋锁
//!
//! 只能在普通上下文中使用：中断处理程序绝不能获取此类锁，
//! 否则可能在本地 CPU 上与持锁者形成死锁。

use core::{
    hint,
    sync::atomic::{AtomicBool, Ordering},
};

/// 不屏蔽中断的 raw 自旋锁。
#[derive(Debug)]
pub struct RawSpinLockWithoutGuard {
    locked: AtomicBool,
}

impl RawSpinLockWithoutGuard {
    /// 创建一个未上锁的实例。
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }
}

impl Default for RawSpinLockWithoutGuard {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: 只有 compare_exchange 成功的一方能进入临界区
unsafe impl lock_api::RawMutex for RawSpinLockWithoutGuard {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self::new();

    type GuardMarker = lock_api::GuardSend;

    fn lock(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.locked.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
    }

    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// 不屏蔽中断的互斥锁，用于串行化普通上下文中的长操作。
pub type SpinMutex<T> = lock_api::Mutex<RawSpinLockWithoutGuard, T>;

/// [`SpinMutex`] 的 RAII 守卫。
pub type SpinMutexGuard<'a, T> = lock_api::MutexGuard<'a, RawSpinLockWithoutGuard, T>;
