//! 链路管理器
//!
//! [`Lli`] 是整个系统唯一的链路管理器句柄，由平台初始化代码创建并传递给所有使用方。
//! 它持有至多一个已注册的 [`LinkDevice`]：第一次成功的 [`Lli::add_driver`] 创建它，
//! [`Lli::remove_driver`] 释放它。
//!
//! 面向上层的接口在没有注册驱动时都是空操作（读取类接口返回默认值），
//! 因为调用方可能合法地在驱动生命周期之外调用它们。

use alloc::sync::Arc;
use sync::{RwLock, SpinLock};

use crate::config::{LliConfig, MapPolicy};
use crate::driver::LliDriver;
use crate::error::{LliError, LliResult};
use crate::link::LinkDevice;
use crate::ops::{IrqReturn, LliPlatform};
use crate::pm::PmService;
use crate::signal::HandlerId;
use crate::state::LinkState;

/// [`Lli::add_driver`] 的成功结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// 新注册了链路
    Added,
    /// 已有链路，本次调用没有改变任何状态
    Existing,
}

/// 链路管理器
pub struct Lli {
    config: LliConfig,
    platform: LliPlatform,
    link: RwLock<Option<Arc<LinkDevice>>>,
    /// 已申请中断、尚未发布的链路
    pending: SpinLock<Option<Arc<LinkDevice>>>,
}

impl Lli {
    /// 以预留内存配置与平台能力创建管理器
    pub fn new(config: LliConfig, platform: LliPlatform) -> Self {
        Self {
            config,
            platform,
            link: RwLock::new(None),
            pending: SpinLock::new(None),
        }
    }

    /// 管理器配置
    pub fn config(&self) -> &LliConfig {
        &self.config
    }

    /// 当前注册的链路
    pub fn link(&self) -> Option<Arc<LinkDevice>> {
        self.link.read().clone()
    }

    /// 是否已注册链路
    pub fn is_registered(&self) -> bool {
        self.link.read().is_some()
    }

    // ========== 注册接口 ==========

    /// 注册链路硬件驱动
    ///
    /// 依次申请信号中断、检查预留内存、映射共享内存（[`MapPolicy::Eager`] 时）并发布链路。
    /// 任一步失败都会回滚之前的步骤。已有链路时直接返回 [`Registration::Existing`]。
    ///
    /// 申请中断之后、发布之前到来的信号中断由 [`Lli::handle_irq`] 派发给这条待发布的链路。
    pub fn add_driver(&self, driver: Arc<dyn LliDriver>, irq: usize) -> LliResult<Registration> {
        if self.is_registered() {
            return Ok(Registration::Existing);
        }

        let link = Arc::new(LinkDevice::new(
            driver,
            irq,
            &self.config,
            self.platform.clone(),
        ));

        *self.pending.lock() = Some(Arc::clone(&link));
        let ret = self.register_link(&link);
        self.clear_pending(&link);
        ret
    }

    fn clear_pending(&self, link: &Arc<LinkDevice>) {
        let mut pending = self.pending.lock();
        if pending.as_ref().is_some_and(|p| Arc::ptr_eq(p, link)) {
            *pending = None;
        }
    }

    fn register_link(&self, link: &Arc<LinkDevice>) -> LliResult<Registration> {
        let irq = link.irq();
        self.platform
            .irq
            .request_irq(irq, link.driver_name())
            .inspect_err(|e| log::error!("[LLI] failed to request irq {}: {}", irq, e))?;
        link.mark_irq_requested();

        if let Err(e) = self.setup_shmem(link) {
            self.platform.irq.free_irq(irq);
            return Err(e);
        }

        {
            let mut slot = self.link.write();
            if slot.is_none() {
                *slot = Some(Arc::clone(link));
                drop(slot);
                log::info!(
                    "[LLI] {} registered, signal irq {}, control surface ready",
                    link.driver_name(),
                    irq
                );
                return Ok(Registration::Added);
            }
        }

        // 并发注册时另一方先发布了链路
        link.unmap_shmem();
        self.platform.irq.free_irq(irq);
        Ok(Registration::Existing)
    }

    fn setup_shmem(&self, link: &LinkDevice) -> LliResult<()> {
        if !self.config.is_reserved() {
            log::error!("[LLI] phys_addr was not reserved by memblock");
            return Err(LliError::ReservedMemoryMissing);
        }
        if self.config.map_policy() == MapPolicy::Eager {
            link.map_shmem()
                .inspect_err(|e| log::error!("[LLI] failed to map shared memory: {}", e))?;
        }
        let vaddr = link.with_shmem(|mem| mem.as_ptr() as usize).unwrap_or(0);
        log::info!(
            "[LLI] alloc share IPC memory addr = {:#x}[{:#x}]",
            vaddr,
            link.phys_base()
        );
        Ok(())
    }

    /// 移除链路：释放中断、解除映射并清空槽位。返回是否存在被移除的链路。
    ///
    /// 不等待正在进行的控制操作结束，调用方负责保证此时没有并发操作。
    pub fn remove_driver(&self) -> bool {
        let Some(link) = self.link.write().take() else {
            return false;
        };
        self.platform.irq.free_irq(link.irq());
        link.unmap_shmem();
        log::info!("[LLI] {} removed", link.driver_name());
        true
    }

    // ========== 中断入口 ==========

    /// 平台中断派发入口，在中断上下文中调用
    ///
    /// 先查已发布的链路，再查正在注册的链路。
    pub fn handle_irq(&self, irq: usize) -> IrqReturn {
        let published = self.link.read().clone();
        if let Some(link) = published.filter(|link| link.irq() == irq) {
            return link.handle_irq();
        }
        let pending = self.pending.lock().clone();
        match pending {
            Some(link) if link.irq() == irq => link.handle_irq(),
            _ => IrqReturn::None,
        }
    }

    // ========== 上层接口 ==========

    fn with_link<R>(&self, default: R, f: impl FnOnce(&LinkDevice) -> R) -> R {
        match self.link() {
            Some(link) => f(&link),
            None => default,
        }
    }

    /// 共享内存物理基址
    pub fn phys_base(&self) -> Option<usize> {
        self.link().map(|link| link.phys_base())
    }

    /// 共享内存大小
    pub fn phys_size(&self) -> Option<usize> {
        self.link().map(|link| link.phys_size())
    }

    /// 链路是否挂起
    pub fn is_suspended(&self) -> bool {
        self.with_link(false, LinkDevice::is_suspended)
    }

    /// 当前链路状态；没有链路时为 [`LinkState::Unmounted`]
    pub fn link_status(&self) -> LinkState {
        self.with_link(LinkState::Unmounted, LinkDevice::link_status)
    }

    /// 设置链路状态
    pub fn set_link_status(&self, state: LinkState) {
        self.with_link((), |link| link.set_link_status(state))
    }

    /// 登记信号处理函数
    pub fn register_handler<F>(&self, handler: F) -> LliResult<HandlerId>
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.with_link(Err(LliError::NoDevice), |link| link.register_handler(handler))
    }

    /// 注销信号处理函数
    pub fn unregister_handler(&self, id: HandlerId) -> LliResult<()> {
        self.with_link(Err(LliError::NoDevice), |link| link.unregister_handler(id))
    }

    /// 发送边带信号
    pub fn send_signal(&self, cmd: u32) -> LliResult<()> {
        self.with_link(Ok(()), |link| link.send_signal(cmd))
    }

    /// 清除所有边带信号
    pub fn reset_signal(&self) -> LliResult<()> {
        self.with_link(Ok(()), LinkDevice::reset_signal)
    }

    /// 读取边带信号
    pub fn read_signal(&self) -> u32 {
        self.with_link(0, LinkDevice::read_signal)
    }

    /// 打印调试信息
    pub fn debug_info(&self) -> LliResult<()> {
        self.with_link(Ok(()), LinkDevice::debug_info)
    }

    /// 为首次挂载重置全部资源
    pub fn reset(&self) -> LliResult<()> {
        self.with_link(Ok(()), LinkDevice::reset)
    }

    /// 重新初始化
    pub fn reload(&self) -> LliResult<()> {
        self.with_link(Ok(()), LinkDevice::reload)
    }

    /// 挂起链路，由 modem 接口层调用
    pub fn suspend(&self) -> LliResult<()> {
        self.with_link(Ok(()), LinkDevice::suspend)
    }

    /// 恢复链路，由 modem 接口层调用
    pub fn resume(&self) -> LliResult<()> {
        self.with_link(Ok(()), LinkDevice::resume)
    }

    /// 打开链路中断
    pub fn intr_enable(&self) -> LliResult<()> {
        self.with_link(Ok(()), LinkDevice::intr_enable)
    }

    /// 使能信号中断线
    pub fn enable_irq(&self) {
        self.with_link((), LinkDevice::enable_irq)
    }

    /// 屏蔽信号中断线
    pub fn disable_irq(&self) {
        self.with_link((), LinkDevice::disable_irq)
    }

    /// 控制接口写端
    pub fn control_store(&self, buf: &str) -> LliResult<usize> {
        self.with_link(Err(LliError::NoDevice), |link| link.control_store(buf))
    }

    /// 控制接口读端
    pub fn control_show(&self) -> Option<alloc::string::String> {
        self.link().map(|link| link.control_show())
    }

    /// 创建供电源管理使用的服务对象
    pub fn pm_service(self: &Arc<Self>) -> PmService {
        PmService::new(Arc::clone(self))
    }
}
