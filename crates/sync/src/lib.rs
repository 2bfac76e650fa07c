//! 同步原语
//!
//! 向 LLI 链路管理器及其后端提供锁原语：
//!
//! - [`SpinLock`] - 屏蔽本地中断的互斥自旋锁，可在中断上下文中使用
//! - [`RwLock`] - 读者优先的读写自旋锁，写者屏蔽本地中断
//! - [`SpinMutex`] - 不屏蔽中断的互斥自旋锁，仅用于普通上下文
//! - [`IntrGuard`] - 基于 RAII 的中断屏蔽保护器
//!
//! 所有锁均基于 `lock_api` 的 raw 锁接口实现，守卫类型由 `lock_api` 提供。
//!
//! # 架构依赖
//!
//! 此 crate 通过 [`ArchOps`] trait 抽象中断控制操作。
//! 使用前必须调用 [`register_arch_ops`] 注册实现。

#![no_std]

mod intr_guard;
mod raw_spin_lock;
mod raw_spin_lock_without_guard;
mod rwlock;

pub use intr_guard::IntrGuard;
pub use raw_spin_lock::{RawSpinLock, SpinLock, SpinLockGuard};
pub use raw_spin_lock_without_guard::{RawSpinLockWithoutGuard, SpinMutex, SpinMutexGuard};
pub use rwlock::{RawRwSpinLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use core::sync::atomic::{AtomicUsize, Ordering};

/// 架构相关的中断控制操作
///
/// 由平台代码实现并注册。
pub trait ArchOps: Send + Sync {
    /// 读取并禁用本地中断，返回之前的状态
    ///
    /// # Safety
    /// 调用者必须在之后以返回值调用 [`ArchOps::restore_interrupts`]
    unsafe fn read_and_disable_interrupts(&self) -> usize;

    /// 恢复中断状态
    ///
    /// # Safety
    /// flags 必须是之前 read_and_disable_interrupts 返回的值
    unsafe fn restore_interrupts(&self, flags: usize);

    /// 中断使能位在 flags 中的掩码
    fn interrupt_enable_mask(&self) -> usize;
}

static ARCH_OPS_DATA: AtomicUsize = AtomicUsize::new(0);
static ARCH_OPS_VTABLE: AtomicUsize = AtomicUsize::new(0);

/// 注册架构操作实现
///
/// # Safety
/// 必须在单线程环境下调用，且只能调用一次
pub unsafe fn register_arch_ops(ops: &'static dyn ArchOps) {
    let ptr = ops as *const dyn ArchOps;
    // SAFETY: fat pointer 的布局是 (data, vtable)
    let (data, vtable) = unsafe { core::mem::transmute::<*const dyn ArchOps, (usize, usize)>(ptr) };
    ARCH_OPS_VTABLE.store(vtable, Ordering::Release);
    ARCH_OPS_DATA.store(data, Ordering::Release);
}

/// 获取架构操作实例
///
/// # Panics
/// 如果尚未调用 [`register_arch_ops`] 注册实现，则 panic
#[inline]
pub(crate) fn arch_ops() -> &'static dyn ArchOps {
    let data = ARCH_OPS_DATA.load(Ordering::Acquire);
    let vtable = ARCH_OPS_VTABLE.load(Ordering::Acquire);
    if data == 0 {
        #[cfg(test)]
        {
            extern crate test_support;
            return &test_support::mock::arch::MOCK_ARCH_OPS;
        }
        #[cfg(not(test))]
        panic!("sync: ArchOps not registered, call register_arch_ops first");
    }
    // SAFETY: data 和 vtable 是通过 register_arch_ops 设置的有效指针
    unsafe { &*core::mem::transmute::<(usize, usize), *const dyn ArchOps>((data, vtable)) }
}
