//! 屏蔽中断的自旋锁
//!
//! 基于原子操作实现自旋，结合 [`IntrGuard`] 在持锁期间屏蔽本地中断，
//! 因此同一把锁可以在普通上下文与中断上下文之间共享。

use crate::intr_guard::IntrGuard;
use core::{
    hint,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// 屏蔽本地中断的 raw 自旋锁。
///
/// 不可重入。持锁期间保存的中断状态存放在锁内部，于 `unlock` 时恢复。
#[derive(Debug)]
pub struct RawSpinLock {
    locked: AtomicBool,
    saved_flags: AtomicUsize,
}

impl RawSpinLock {
    /// 创建一个未上锁的 RawSpinLock。
    pub const fn new() -> Self {
        RawSpinLock {
            locked: AtomicBool::new(false),
            saved_flags: AtomicUsize::new(0),
        }
    }

    fn acquire(&self, guard: IntrGuard) {
        self.saved_flags.store(guard.into_flags(), Ordering::Relaxed);
    }
}

impl Default for RawSpinLock {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: 只有 compare_exchange 成功的一方能进入临界区，unlock 使用 Release 发布写入
unsafe impl lock_api::RawMutex for RawSpinLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = RawSpinLock::new();

    type GuardMarker = lock_api::GuardNoSend;

    fn lock(&self) {
        let guard = IntrGuard::new();
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.locked.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
        self.acquire(guard);
    }

    fn try_lock(&self) -> bool {
        let guard = IntrGuard::new();
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.acquire(guard);
            true
        } else {
            // guard 在此处 drop，立即恢复中断状态
            false
        }
    }

    unsafe fn unlock(&self) {
        let flags = self.saved_flags.load(Ordering::Relaxed);
        self.locked.store(false, Ordering::Release);
        // SAFETY: flags 由持锁者在 acquire 中保存，且尚未恢复
        drop(unsafe { IntrGuard::from_flags(flags) });
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// 提供对数据的互斥访问的自旋锁，持锁期间屏蔽本地中断。
///
/// # 注意
/// 不可重入；持锁期间中断被屏蔽，应避免长时间运行的操作。
pub type SpinLock<T> = lock_api::Mutex<RawSpinLock, T>;

/// [`SpinLock`] 的 RAII 守卫。
pub type SpinLockGuard<'a, T> = lock_api::MutexGuard<'a, RawSpinLock, T>;
