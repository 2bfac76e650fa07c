//! 电源管理锁服务
//!
//! 电源管理在让 modem 进入低功耗前调用 [`LinkPmOps::lock_link`] 持有链路，
//! 完成后调用 [`LinkPmOps::unlock_link`] 释放。两者只在
//! Unmounted 与 WaitForMount 之间转换，其余状态保持不变。

use alloc::sync::Arc;

use crate::manager::Lli;

/// 发起持有/释放请求的一方，目前只用于日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmOwner(pub usize);

/// 电源管理持有链路的接口
pub trait LinkPmOps: Send + Sync {
    /// 持有链路：Unmounted → WaitForMount
    fn lock_link(&self, owner: PmOwner);

    /// 释放链路：WaitForMount → Unmounted
    fn unlock_link(&self, owner: PmOwner);
}

/// 基于 [`Lli`] 的电源管理服务，由 [`Lli::pm_service`] 创建
///
/// 没有注册链路时两个操作都是空操作。
#[derive(Clone)]
pub struct PmService {
    lli: Arc<Lli>,
}

impl PmService {
    pub(crate) fn new(lli: Arc<Lli>) -> Self {
        Self { lli }
    }
}

impl LinkPmOps for PmService {
    fn lock_link(&self, owner: PmOwner) {
        if let Some(link) = self.lli.link() {
            if !link.lock_link() {
                log::debug!(
                    "[LLI] lock_link by {:#x} ignored in state {}",
                    owner.0,
                    link.link_status()
                );
            }
        }
    }

    fn unlock_link(&self, owner: PmOwner) {
        if let Some(link) = self.lli.link() {
            if !link.unlock_link() {
                log::debug!(
                    "[LLI] unlock_link by {:#x} ignored in state {}",
                    owner.0,
                    link.link_status()
                );
            }
        }
    }
}
