//! 链路管理器测试
//!
//! 使用 `test-support` 中的 Mock 中断控制器与共享内存映射器，
//! 配合一个记录调用序列的 [`MockDriver`]。

mod registration;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use sync::ArchOps;
use test_support::mock::irq::MockIrqChip;
use test_support::mock::shmem::MockShmem;

use crate::{
    DriverCaps, IrqOps, LinkDevice, LinkState, Lli, LliConfig, LliDriver, LliError, LliPlatform,
    LliResult, Registration, ShmemOps,
};

pub(super) const SIGNAL_IRQ: usize = 42;
pub(super) const RESERVED_BASE: usize = 0x9000_0000;

struct DummyArchOps;

impl ArchOps for DummyArchOps {
    unsafe fn read_and_disable_interrupts(&self) -> usize {
        0
    }

    unsafe fn restore_interrupts(&self, _flags: usize) {}

    fn interrupt_enable_mask(&self) -> usize {
        0
    }
}

static DUMMY_ARCH_OPS: DummyArchOps = DummyArchOps;
// 0 = uninit, 1 = initializing, 2 = ready
static SYNC_INIT: AtomicUsize = AtomicUsize::new(0);

pub(super) fn init_sync_arch_ops() {
    match SYNC_INIT.compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {
            // Safety: tests use a single global dummy ArchOps.
            unsafe { sync::register_arch_ops(&DUMMY_ARCH_OPS) };
            SYNC_INIT.store(2, Ordering::Release);
        }
        Err(_) => {
            while SYNC_INIT.load(Ordering::Acquire) != 2 {
                core::hint::spin_loop();
            }
        }
    }
}

impl IrqOps for MockIrqChip {
    fn request_irq(&self, irq: usize, _name: &str) -> LliResult<()> {
        if self.request(irq) {
            Ok(())
        } else {
            Err(LliError::IrqRequestFailed)
        }
    }

    fn free_irq(&self, irq: usize) {
        self.free(irq);
    }

    fn enable_irq(&self, irq: usize) {
        self.enable(irq);
    }

    fn disable_irq_nosync(&self, irq: usize) {
        self.disable(irq);
    }
}

impl ShmemOps for MockShmem {
    fn page_size(&self) -> usize {
        MockShmem::page_size(self)
    }

    unsafe fn map_noncached(&self, paddr: usize, size: usize) -> Option<NonNull<u8>> {
        // SAFETY: SharedMemory::map 已检查 size 非零
        NonNull::new(unsafe { self.map(paddr, size) } as *mut u8)
    }

    unsafe fn unmap(&self, vaddr: NonNull<u8>, size: usize) {
        // SAFETY: 由调用者保证
        unsafe { MockShmem::unmap(self, vaddr.as_ptr() as usize, size) }
    }
}

/// 记录调用序列的链路驱动
pub(super) struct MockDriver {
    caps: DriverCaps,
    calls: Mutex<Vec<&'static str>>,
    sent: Mutex<Vec<u32>>,
    /// [`LliDriver::read_signal`] 返回的值
    pub(super) signal: AtomicU32,
    /// [`LliDriver::get_status`] 返回的值
    pub(super) status: AtomicU32,
}

impl MockDriver {
    pub(super) fn new(caps: DriverCaps) -> Arc<Self> {
        Arc::new(Self {
            caps,
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            signal: AtomicU32::new(0),
            status: AtomicU32::new(0),
        })
    }

    pub(super) fn full() -> Arc<Self> {
        Self::new(DriverCaps::all())
    }

    pub(super) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub(super) fn sent(&self) -> Vec<u32> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) {
        self.calls.lock().unwrap().push(op);
    }
}

impl LliDriver for MockDriver {
    fn name(&self) -> &str {
        "mock-lli"
    }

    fn capabilities(&self) -> DriverCaps {
        self.caps
    }

    fn init(&self, _link: &LinkDevice) -> LliResult<()> {
        self.record("init");
        Ok(())
    }

    fn exit(&self, link: &LinkDevice) -> LliResult<()> {
        self.record("exit");
        link.set_link_status(LinkState::Unmounted);
        Ok(())
    }

    fn suspend(&self, link: &LinkDevice) -> LliResult<()> {
        self.record("suspend");
        link.set_suspended(true);
        Ok(())
    }

    fn resume(&self, link: &LinkDevice) -> LliResult<()> {
        self.record("resume");
        link.set_suspended(false);
        Ok(())
    }

    fn set_master(&self, _link: &LinkDevice, is_master: bool) -> LliResult<()> {
        self.record(if is_master { "set_master" } else { "set_slave" });
        Ok(())
    }

    fn link_startup_mount(&self, link: &LinkDevice) -> LliResult<()> {
        self.record("link_startup_mount");
        link.note_mount();
        link.set_link_status(LinkState::Mounted);
        Ok(())
    }

    fn send_signal(&self, _link: &LinkDevice, cmd: u32) -> LliResult<()> {
        self.sent.lock().unwrap().push(cmd);
        Ok(())
    }

    fn read_signal(&self, _link: &LinkDevice) -> u32 {
        self.signal.load(Ordering::SeqCst)
    }

    fn reset_signal(&self, _link: &LinkDevice) -> LliResult<()> {
        self.record("reset_signal");
        self.signal.store(0, Ordering::SeqCst);
        Ok(())
    }

    fn intr_enable(&self, _link: &LinkDevice) -> LliResult<()> {
        self.record("intr_enable");
        Ok(())
    }

    fn get_status(&self, _link: &LinkDevice) -> u32 {
        self.status.load(Ordering::SeqCst)
    }

    fn debug_info(&self, _link: &LinkDevice) -> LliResult<()> {
        self.record("debug_info");
        Ok(())
    }

    fn loopback_test(&self, _link: &LinkDevice) -> LliResult<()> {
        self.record("loopback_test");
        Err(LliError::IoError)
    }
}

/// 一套独立的 Mock 平台与管理器
pub(super) struct Harness {
    pub(super) irq: Arc<MockIrqChip>,
    pub(super) shmem: Arc<MockShmem>,
    pub(super) lli: Arc<Lli>,
}

impl Harness {
    pub(super) fn new(config: LliConfig) -> Self {
        init_sync_arch_ops();
        let irq = Arc::new(MockIrqChip::new());
        let shmem = Arc::new(MockShmem::new());
        let irq_ops: Arc<dyn IrqOps> = irq.clone();
        let shmem_ops: Arc<dyn ShmemOps> = shmem.clone();
        let lli = Arc::new(Lli::new(config, LliPlatform::new(irq_ops, shmem_ops)));
        Self { irq, shmem, lli }
    }

    /// 预留了 4 MiB、立即映射的配置
    pub(super) fn eager() -> Self {
        Self::new(LliConfig::new().with_reserved(RESERVED_BASE))
    }

    pub(super) fn register(&self, driver: &Arc<MockDriver>) -> LliResult<Registration> {
        self.lli.add_driver(driver.clone(), SIGNAL_IRQ)
    }

    /// 注册一个具备全部能力的驱动并返回它
    pub(super) fn with_full_driver(config: LliConfig) -> (Self, Arc<MockDriver>) {
        let harness = Self::new(config);
        let driver = MockDriver::full();
        assert_eq!(harness.register(&driver), Ok(Registration::Added));
        (harness, driver)
    }

    pub(super) fn link(&self) -> Arc<LinkDevice> {
        self.lli.link().expect("link should be registered")
    }
}
