//! 中断保护器
//!
//! 注意：禁用中断只能阻止**本地 CPU** 的“任务 vs 本地中断”并发，
//! 并不能阻止其他 CPU 的并行访问；多核共享数据仍需要配合自旋锁。

use crate::arch_ops;

/// 中断保护器，基于 RAII 实现中断屏蔽。
///
/// 创建时禁用本地中断并保存之前的状态，销毁时恢复。
///
/// 锁的实现需要跨越 `lock()` / `unlock()` 两次调用保存中断状态，
/// 可以用 [`IntrGuard::into_flags`] 把状态转存到锁内部，
/// 再用 [`IntrGuard::from_flags`] 重建保护器完成恢复。
///
/// # 示例
/// ```ignore
/// {
///     let _guard = IntrGuard::new(); // 禁用中断
///     // 临界区代码
/// } // 离开作用域，自动恢复中断状态
/// ```
#[must_use]
pub struct IntrGuard {
    flags: usize,
}

impl IntrGuard {
    /// 禁用本地中断并返回保护器。
    pub fn new() -> Self {
        // SAFETY: 保存的 flags 会在 drop 时原样恢复
        let flags = unsafe { arch_ops().read_and_disable_interrupts() };
        IntrGuard { flags }
    }

    /// 进入临界区前中断是否处于启用状态。
    pub fn was_enabled(&self) -> bool {
        self.flags & arch_ops().interrupt_enable_mask() != 0
    }

    /// 放弃自动恢复，取出保存的中断状态。
    ///
    /// 调用者负责之后通过 [`IntrGuard::from_flags`] 恢复。
    pub fn into_flags(self) -> usize {
        let flags = self.flags;
        core::mem::forget(self);
        flags
    }

    /// 用 [`IntrGuard::into_flags`] 取出的状态重建保护器。
    ///
    /// # Safety
    /// flags 必须来自同一 CPU 上尚未恢复的 [`IntrGuard::into_flags`]
    pub unsafe fn from_flags(flags: usize) -> Self {
        IntrGuard { flags }
    }
}

impl Default for IntrGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IntrGuard {
    fn drop(&mut self) {
        // SAFETY: flags 来自 read_and_disable_interrupts
        unsafe { arch_ops().restore_interrupts(self.flags) };
    }
}
