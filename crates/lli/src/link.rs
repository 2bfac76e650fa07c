//! 链路设备
//!
//! [`LinkDevice`] 是一次成功注册的链路记录：持有驱动、信号中断线、共享内存映射、
//! 链路状态与处理函数槽。所有硬件操作都经由驱动完成，驱动未声明的操作直接跳过。
//!
//! # 并发约定
//!
//! - [`LinkDevice::handle_irq`] 运行在中断上下文，只触碰屏蔽中断的自旋锁与原子变量。
//! - 控制命令在设备锁内串行执行。
//! - `reset` / `reload` / `suspend` / `resume` 之间不做互斥，由调用方负责串行化。

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use sync::{SpinLock, SpinMutex};

use crate::config::{DUMP_PREFIX, DUMP_WINDOW_SIZE, LliConfig, MapPolicy, SIGNAL_SWEEP_BITS};
use crate::control::{ControlCommand, hex_dump_lines};
use crate::driver::{DriverCaps, LliDriver};
use crate::error::{LliError, LliResult};
use crate::ops::{IrqReturn, LliPlatform};
use crate::shmem::SharedMemory;
use crate::signal::{HandlerId, SignalSlot};
use crate::state::{LinkState, LinkStateCell};

/// 一条已注册的链路
pub struct LinkDevice {
    driver: Arc<dyn LliDriver>,
    caps: DriverCaps,
    irq: usize,
    phys_base: usize,
    shmem_size: usize,
    map_policy: MapPolicy,
    platform: LliPlatform,
    shmem: SpinLock<Option<SharedMemory>>,
    state: LinkStateCell,
    irq_active: AtomicBool,
    suspended: AtomicBool,
    mount_count: AtomicU32,
    signal: SignalSlot,
    /// 串行化控制命令，不在中断上下文中获取
    device_lock: SpinMutex<()>,
}

impl LinkDevice {
    pub(crate) fn new(
        driver: Arc<dyn LliDriver>,
        irq: usize,
        config: &LliConfig,
        platform: LliPlatform,
    ) -> Self {
        let caps = driver.capabilities();
        Self {
            driver,
            caps,
            irq,
            phys_base: config.phys_base(),
            shmem_size: config.shmem_size(),
            map_policy: config.map_policy(),
            platform,
            shmem: SpinLock::new(None),
            state: LinkStateCell::new(),
            irq_active: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
            mount_count: AtomicU32::new(0),
            signal: SignalSlot::new(),
            device_lock: SpinMutex::new(()),
        }
    }

    /// 驱动名
    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    /// 注册时缓存的驱动能力集
    pub fn capabilities(&self) -> DriverCaps {
        self.caps
    }

    /// 信号中断号
    pub fn irq(&self) -> usize {
        self.irq
    }

    /// 共享内存物理基址
    pub fn phys_base(&self) -> usize {
        self.phys_base
    }

    /// 共享内存大小
    pub fn phys_size(&self) -> usize {
        self.shmem_size
    }

    /// 映射策略
    pub fn map_policy(&self) -> MapPolicy {
        self.map_policy
    }

    // ========== 链路状态 ==========

    /// 当前链路状态
    pub fn link_status(&self) -> LinkState {
        self.state.get()
    }

    /// 设置链路状态
    pub fn set_link_status(&self, state: LinkState) {
        self.state.set(state);
    }

    /// 电源管理持有链路：Unmounted → WaitForMount
    pub fn lock_link(&self) -> bool {
        self.state.lock_link()
    }

    /// 电源管理释放链路：WaitForMount → Unmounted
    pub fn unlock_link(&self) -> bool {
        self.state.unlock_link()
    }

    /// 链路是否处于挂起状态（由后端维护）
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// 后端在挂起/恢复完成后更新
    pub fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::SeqCst);
    }

    /// 自上次 reset 以来的挂载次数
    pub fn mount_count(&self) -> u32 {
        self.mount_count.load(Ordering::SeqCst)
    }

    /// 后端在一次挂载完成后调用，返回新的计数
    pub fn note_mount(&self) -> u32 {
        self.mount_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    // ========== 共享内存 ==========

    /// 映射共享内存；已映射时直接返回
    pub fn map_shmem(&self) -> LliResult<()> {
        let mut shmem = self.shmem.lock();
        if shmem.is_none() {
            *shmem = Some(SharedMemory::map(
                &self.platform.shmem,
                self.phys_base,
                self.shmem_size,
            )?);
        }
        Ok(())
    }

    /// 解除共享内存映射；未映射时为空操作
    pub fn unmap_shmem(&self) {
        // 在锁外 drop，避免持锁解除映射
        let mapping = self.shmem.lock().take();
        drop(mapping);
    }

    /// 共享内存是否已映射
    pub fn is_mapped(&self) -> bool {
        self.shmem.lock().is_some()
    }

    /// 在已映射的共享内存上执行 `f`；未映射时返回 `None`
    pub fn with_shmem<R>(&self, f: impl FnOnce(&SharedMemory) -> R) -> Option<R> {
        self.shmem.lock().as_ref().map(f)
    }

    // ========== 驱动操作 ==========

    /// 调用一项驱动操作；驱动未声明该能力时跳过并返回 Ok
    fn call(
        &self,
        cap: DriverCaps,
        op: &str,
        f: impl FnOnce(&dyn LliDriver, &Self) -> LliResult<()>,
    ) -> LliResult<()> {
        if !self.caps.contains(cap) {
            log::debug!("[LLI] {}: {} not supported, skipped", self.driver.name(), op);
            return Ok(());
        }
        f(self.driver.as_ref(), self)
    }

    /// 重新初始化全部资源并清零挂载计数，不改变链路状态
    pub fn reset(&self) -> LliResult<()> {
        if !self.caps.contains(DriverCaps::INIT) {
            return Ok(());
        }
        let ret = self.driver.init(self);
        self.mount_count.store(0, Ordering::SeqCst);
        ret
    }

    /// 重新初始化，不改变挂载计数与链路状态
    pub fn reload(&self) -> LliResult<()> {
        self.call(DriverCaps::INIT, "init", |d, l| d.init(l))
    }

    /// 挂起链路
    pub fn suspend(&self) -> LliResult<()> {
        self.call(DriverCaps::SUSPEND, "suspend", |d, l| d.suspend(l))
    }

    /// 恢复链路
    pub fn resume(&self) -> LliResult<()> {
        self.call(DriverCaps::RESUME, "resume", |d, l| d.resume(l))
    }

    /// 发送边带信号
    pub fn send_signal(&self, cmd: u32) -> LliResult<()> {
        self.call(DriverCaps::SEND_SIGNAL, "send_signal", |d, l| d.send_signal(l, cmd))
    }

    /// 清除所有边带信号
    pub fn reset_signal(&self) -> LliResult<()> {
        self.call(DriverCaps::RESET_SIGNAL, "reset_signal", |d, l| d.reset_signal(l))
    }

    /// 读取边带信号；驱动不支持时返回 0
    pub fn read_signal(&self) -> u32 {
        if self.caps.contains(DriverCaps::READ_SIGNAL) {
            self.driver.read_signal(self)
        } else {
            0
        }
    }

    /// 打开链路中断
    pub fn intr_enable(&self) -> LliResult<()> {
        self.call(DriverCaps::INTR_ENABLE, "intr_enable", |d, l| d.intr_enable(l))
    }

    /// 打印调试信息
    pub fn debug_info(&self) -> LliResult<()> {
        self.call(DriverCaps::DEBUG_INFO, "debug_info", |d, l| d.debug_info(l))
    }

    /// 链路状态寄存器；驱动不支持时返回 0
    pub fn get_status(&self) -> u32 {
        if self.caps.contains(DriverCaps::GET_STATUS) {
            self.driver.get_status(self)
        } else {
            0
        }
    }

    // ========== 信号中断 ==========

    /// 中断线是否处于使能状态
    pub fn irq_active(&self) -> bool {
        self.irq_active.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_irq_requested(&self) {
        self.irq_active.store(true, Ordering::SeqCst);
    }

    /// 使能信号中断线；已使能时为空操作
    pub fn enable_irq(&self) {
        if !self.irq_active.swap(true, Ordering::SeqCst) {
            self.platform.irq.enable_irq(self.irq);
        }
    }

    /// 屏蔽信号中断线；已屏蔽时为空操作
    pub fn disable_irq(&self) {
        if self.irq_active.swap(false, Ordering::SeqCst) {
            self.platform.irq.disable_irq_nosync(self.irq);
        }
    }

    /// 登记信号处理函数，已有处理函数时返回 [`LliError::AlreadyRegistered`]
    pub fn register_handler<F>(&self, handler: F) -> LliResult<HandlerId>
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.signal.register(handler)
    }

    /// 注销信号处理函数
    pub fn unregister_handler(&self, id: HandlerId) -> LliResult<()> {
        self.signal.unregister(id)
    }

    /// 当前登记的处理函数句柄
    pub fn handler(&self) -> Option<HandlerId> {
        self.signal.current()
    }

    /// 信号中断服务例程
    ///
    /// 读取信号值（驱动不支持时为 0）并同步调用已登记的处理函数。
    /// 运行在中断上下文，不阻塞、不分配内存、不打印日志。
    pub fn handle_irq(&self) -> IrqReturn {
        let value = self.read_signal();
        self.signal.dispatch(value);
        IrqReturn::Handled
    }

    // ========== 控制接口 ==========

    /// 控制接口读端：返回驱动状态寄存器
    pub fn control_show(&self) -> String {
        format!("MIPI-LLI {:x}\n", self.get_status())
    }

    /// 控制接口写端：解析并在设备锁内执行一条命令，成功时返回消耗的字节数
    ///
    /// 未定义的命令在解析阶段被拒绝，不会产生任何副作用。
    pub fn control_store(&self, buf: &str) -> LliResult<usize> {
        let command = ControlCommand::parse(buf).inspect_err(|e| {
            if let LliError::UnsupportedCommand(code) = e {
                log::error!("[LLI] Un-support control command {}", code);
            }
        })?;

        let _guard = self.device_lock.lock();

        let per_command = self.map_policy == MapPolicy::PerCommand;
        if per_command {
            self.map_shmem()?;
        }

        let ret = self.run_command(command);

        if per_command {
            self.unmap_shmem();
        }

        ret.map(|_| buf.len())
    }

    fn run_command(&self, command: ControlCommand) -> LliResult<()> {
        log::debug!("[LLI] control command {:?}", command);
        match command {
            ControlCommand::DumpStatus => self.debug_info(),
            ControlCommand::Init => self.call(DriverCaps::INIT, "init", |d, l| d.init(l)),
            ControlCommand::SetMaster => {
                self.call(DriverCaps::SET_MASTER, "set_master", |d, l| d.set_master(l, true))
            }
            ControlCommand::LinkStartupMount => self.call(
                DriverCaps::LINK_STARTUP_MOUNT,
                "link_startup_mount",
                |d, l| d.link_startup_mount(l),
            ),
            ControlCommand::Exit => self.call(DriverCaps::EXIT, "exit", |d, l| d.exit(l)),
            ControlCommand::SignalSweep => {
                for bit in 0..SIGNAL_SWEEP_BITS {
                    self.send_signal(1 << bit)?;
                }
                Ok(())
            }
            ControlCommand::Loopback => {
                self.call(DriverCaps::LOOPBACK_TEST, "loopback_test", |d, l| {
                    d.loopback_test(l)
                })
            }
            ControlCommand::DumpLow | ControlCommand::DumpHigh => {
                let offset = command.dump_offset().ok_or(LliError::InvalidArgument)?;
                self.dump_shmem(offset)
            }
        }
    }

    /// 把 `offset` 起的一个转储窗口格式化为十六进制转储行
    ///
    /// 共享内存未映射时返回 [`LliError::NotMapped`]。
    pub fn dump_lines(&self, offset: usize) -> LliResult<Vec<String>> {
        let mut window = [0u8; DUMP_WINDOW_SIZE];
        self.with_shmem(|mem| mem.read_bytes(offset, &mut window))
            .ok_or(LliError::NotMapped)??;
        Ok(hex_dump_lines(DUMP_PREFIX, &window))
    }

    fn dump_shmem(&self, offset: usize) -> LliResult<()> {
        let lines = self.dump_lines(offset).inspect_err(|e| {
            if *e == LliError::NotMapped {
                log::warn!("[LLI] shared memory is not mapped");
            }
        })?;
        for line in lines {
            log::info!("{}", line);
        }
        Ok(())
    }
}

impl core::fmt::Debug for LinkDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LinkDevice")
            .field("driver", &self.driver.name())
            .field("irq", &self.irq)
            .field("phys_base", &format_args!("{:#x}", self.phys_base))
            .field("shmem_size", &self.shmem_size)
            .field("state", &self.state.get())
            .field("irq_active", &self.irq_active())
            .finish()
    }
}
