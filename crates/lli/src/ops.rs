//! 平台操作 trait 定义
//!
//! 链路管理器需要的中断控制与物理内存映射能力，通过 trait 抽象与平台解耦。
//! 平台代码实现这些 trait，并在创建 [`Lli`](crate::Lli) 时通过 [`LliPlatform`] 注入。

use alloc::sync::Arc;
use core::ptr::NonNull;

use crate::error::LliResult;

/// 中断处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    /// 中断已被处理
    Handled,
    /// 中断不属于此设备
    None,
}

/// 中断控制器操作
pub trait IrqOps: Send + Sync {
    /// 申请中断线，成功后中断线处于使能状态
    ///
    /// 平台在该中断到来时应调用 [`Lli::handle_irq`](crate::Lli::handle_irq)。
    /// 中断可能在本函数返回之前就到来：此时链路尚未发布，
    /// 管理器把它派发给正在注册的链路，注册失败回滚后则返回 [`IrqReturn::None`]。
    fn request_irq(&self, irq: usize, name: &str) -> LliResult<()>;

    /// 释放中断线
    fn free_irq(&self, irq: usize);

    /// 使能中断线
    fn enable_irq(&self, irq: usize);

    /// 屏蔽中断线，不等待正在执行的处理程序
    fn disable_irq_nosync(&self, irq: usize);
}

/// 物理内存映射操作
pub trait ShmemOps: Send + Sync {
    /// 页大小
    fn page_size(&self) -> usize;

    /// 以非缓存方式把物理区域映射到内核虚拟地址空间
    ///
    /// # Safety
    /// `paddr` 必须位于预留区域内，`size` 必须是页大小的整数倍
    unsafe fn map_noncached(&self, paddr: usize, size: usize) -> Option<NonNull<u8>>;

    /// 解除映射
    ///
    /// # Safety
    /// `vaddr` 与 `size` 必须来自一次尚未解除的 [`ShmemOps::map_noncached`]
    unsafe fn unmap(&self, vaddr: NonNull<u8>, size: usize);
}

/// 注入链路管理器的平台能力集合
#[derive(Clone)]
pub struct LliPlatform {
    /// 中断控制器
    pub irq: Arc<dyn IrqOps>,
    /// 物理内存映射器
    pub shmem: Arc<dyn ShmemOps>,
}

impl LliPlatform {
    /// 组合平台能力
    pub fn new(irq: Arc<dyn IrqOps>, shmem: Arc<dyn ShmemOps>) -> Self {
        Self { irq, shmem }
    }
}
