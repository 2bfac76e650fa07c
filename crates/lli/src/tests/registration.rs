use alloc::sync::{Arc, Weak};
use core::sync::atomic::Ordering;
use std::sync::Mutex;

use test_support::mock::irq::MockIrqChip;
use test_support::mock::shmem::MockShmem;

use super::{Harness, MockDriver, RESERVED_BASE, SIGNAL_IRQ, init_sync_arch_ops};
use crate::{
    DriverCaps, IPC_MEMSIZE, IrqOps, IrqReturn, LinkState, Lli, LliConfig, LliDriver, LliError,
    LliPlatform, LliResult, Registration, ShmemOps,
};

#[test]
fn test_add_driver_maps_reserved_region() {
    let (h, _driver) = Harness::with_full_driver(LliConfig::new().with_reserved(RESERVED_BASE));

    assert!(h.lli.is_registered());
    assert_eq!(h.lli.phys_base(), Some(RESERVED_BASE));
    assert_eq!(h.lli.phys_size(), Some(4 * 1024 * 1024));
    assert_eq!(h.lli.phys_size(), Some(IPC_MEMSIZE));

    let link = h.link();
    assert!(link.is_mapped());
    assert!(link.irq_active());
    assert_eq!(link.irq(), SIGNAL_IRQ);
    assert_eq!(link.link_status(), LinkState::Unmounted);
    assert_eq!(h.irq.requested_line.load(Ordering::SeqCst), SIGNAL_IRQ);
    assert_eq!(h.shmem.last_paddr.load(Ordering::SeqCst), RESERVED_BASE);
    assert_eq!(h.shmem.live_mappings.load(Ordering::SeqCst), 1);
}

#[test]
fn test_add_driver_without_reserved_memory() {
    let h = Harness::new(LliConfig::new());
    let driver = MockDriver::full();

    assert_eq!(h.register(&driver), Err(LliError::ReservedMemoryMissing));
    assert!(!h.lli.is_registered());
    assert_eq!(h.lli.phys_base(), None);
    // 已申请的中断被释放
    assert_eq!(h.irq.request_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.irq.free_calls.load(Ordering::SeqCst), 1);
    assert!(!h.irq.is_requested());
    assert_eq!(h.shmem.map_calls.load(Ordering::SeqCst), 0);
    // 回滚后不再有待发布的链路接收中断
    assert_eq!(h.lli.handle_irq(SIGNAL_IRQ), IrqReturn::None);
}

#[test]
fn test_add_driver_irq_request_failure() {
    let h = Harness::eager();
    h.irq.fail_request.store(true, Ordering::SeqCst);
    let driver = MockDriver::full();

    assert_eq!(h.register(&driver), Err(LliError::IrqRequestFailed));
    assert!(!h.lli.is_registered());
    assert_eq!(h.irq.free_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.shmem.map_calls.load(Ordering::SeqCst), 0);

    // 失败不留下任何状态，之后可以重新注册
    assert_eq!(h.register(&driver), Ok(Registration::Added));
}

#[test]
fn test_add_driver_mapping_failure_rolls_back() {
    let h = Harness::eager();
    h.shmem.fail_map.store(true, Ordering::SeqCst);
    let driver = MockDriver::full();

    assert_eq!(h.register(&driver), Err(LliError::MappingFailed));
    assert!(!h.lli.is_registered());
    assert_eq!(h.irq.free_calls.load(Ordering::SeqCst), 1);
    assert!(!h.irq.is_requested());
    assert_eq!(h.shmem.live_mappings.load(Ordering::SeqCst), 0);
}

#[test]
fn test_second_add_driver_is_existing() {
    let (h, _first) = Harness::with_full_driver(LliConfig::new().with_reserved(RESERVED_BASE));
    let second = MockDriver::new(crate::DriverCaps::empty());

    assert_eq!(
        h.lli.add_driver(second, SIGNAL_IRQ + 1),
        Ok(Registration::Existing)
    );

    // 原有注册保持不变
    let link = h.link();
    assert_eq!(link.irq(), SIGNAL_IRQ);
    assert_eq!(link.capabilities(), crate::DriverCaps::all());
    assert_eq!(h.irq.request_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.shmem.map_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_remove_driver_releases_resources() {
    let (h, _driver) = Harness::with_full_driver(LliConfig::new().with_reserved(RESERVED_BASE));

    assert!(h.lli.remove_driver());
    assert!(!h.lli.is_registered());
    assert_eq!(h.irq.free_calls.load(Ordering::SeqCst), 1);
    assert!(!h.irq.is_requested());
    assert_eq!(h.shmem.live_mappings.load(Ordering::SeqCst), 0);

    assert!(!h.lli.remove_driver());
    assert_eq!(h.irq.free_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_consumer_api_without_driver() {
    let h = Harness::eager();

    assert_eq!(h.lli.phys_base(), None);
    assert_eq!(h.lli.phys_size(), None);
    assert!(!h.lli.is_suspended());
    assert_eq!(h.lli.link_status(), LinkState::Unmounted);
    h.lli.set_link_status(LinkState::Mounted);
    assert_eq!(h.lli.link_status(), LinkState::Unmounted);

    assert_eq!(h.lli.read_signal(), 0);
    assert_eq!(h.lli.send_signal(0x1), Ok(()));
    assert_eq!(h.lli.reset_signal(), Ok(()));
    assert_eq!(h.lli.debug_info(), Ok(()));
    assert_eq!(h.lli.reset(), Ok(()));
    assert_eq!(h.lli.reload(), Ok(()));
    assert_eq!(h.lli.suspend(), Ok(()));
    assert_eq!(h.lli.resume(), Ok(()));
    assert_eq!(h.lli.intr_enable(), Ok(()));
    h.lli.enable_irq();
    h.lli.disable_irq();
    assert_eq!(h.irq.enable_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.irq.disable_calls.load(Ordering::SeqCst), 0);

    assert_eq!(h.lli.register_handler(|_| {}).err(), Some(LliError::NoDevice));
    assert_eq!(h.lli.control_store("0"), Err(LliError::NoDevice));
    assert_eq!(h.lli.control_show(), None);
    assert_eq!(h.lli.handle_irq(SIGNAL_IRQ), crate::IrqReturn::None);
}

#[test]
fn test_reset_and_reload() {
    let (h, driver) = Harness::with_full_driver(LliConfig::new().with_reserved(RESERVED_BASE));
    let link = h.link();

    assert_eq!(h.lli.control_store("3"), Ok(1));
    assert_eq!(h.lli.control_store("3"), Ok(1));
    assert_eq!(link.mount_count(), 2);
    assert_eq!(h.lli.link_status(), LinkState::Mounted);

    assert_eq!(h.lli.reload(), Ok(()));
    assert_eq!(link.mount_count(), 2);

    assert_eq!(h.lli.reset(), Ok(()));
    assert_eq!(link.mount_count(), 0);
    // reset 不改变链路状态
    assert_eq!(h.lli.link_status(), LinkState::Mounted);

    assert_eq!(
        driver.calls(),
        ["link_startup_mount", "link_startup_mount", "init", "init"]
    );
}

#[test]
fn test_suspend_resume_delegate_to_driver() {
    let (h, driver) = Harness::with_full_driver(LliConfig::new().with_reserved(RESERVED_BASE));

    assert_eq!(h.lli.suspend(), Ok(()));
    assert!(h.lli.is_suspended());
    assert_eq!(h.lli.resume(), Ok(()));
    assert!(!h.lli.is_suspended());
    assert_eq!(h.lli.intr_enable(), Ok(()));
    assert_eq!(driver.calls(), ["suspend", "resume", "intr_enable"]);
}

#[test]
fn test_absent_capabilities_are_noops() {
    let h = Harness::eager();
    let driver = MockDriver::new(crate::DriverCaps::empty());
    assert_eq!(h.register(&driver), Ok(Registration::Added));

    driver.signal.store(0x10, Ordering::SeqCst);
    driver.status.store(0xab, Ordering::SeqCst);

    assert_eq!(h.lli.reset(), Ok(()));
    assert_eq!(h.lli.reload(), Ok(()));
    assert_eq!(h.lli.suspend(), Ok(()));
    assert_eq!(h.lli.resume(), Ok(()));
    assert_eq!(h.lli.send_signal(0x1), Ok(()));
    assert_eq!(h.lli.reset_signal(), Ok(()));
    assert_eq!(h.lli.debug_info(), Ok(()));
    assert_eq!(h.lli.read_signal(), 0);
    assert_eq!(h.lli.control_store("6"), Ok(1));
    assert_eq!(h.lli.control_show().as_deref(), Some("MIPI-LLI 0\n"));

    assert!(driver.calls().is_empty());
    assert!(driver.sent().is_empty());
}

/// 在自己的链路被发布之前，先让另一个驱动完成注册
struct RacingDriver {
    rival: Mutex<Option<(Arc<Lli>, Arc<MockDriver>)>>,
}

const RIVAL_IRQ: usize = SIGNAL_IRQ + 7;

impl LliDriver for RacingDriver {
    fn name(&self) -> &str {
        "racing-lli"
    }

    fn capabilities(&self) -> DriverCaps {
        if let Some((lli, rival)) = self.rival.lock().unwrap().take() {
            assert_eq!(lli.add_driver(rival, RIVAL_IRQ), Ok(Registration::Added));
        }
        DriverCaps::all()
    }
}

#[test]
fn test_lost_registration_race_rolls_back() {
    let h = Harness::eager();
    let racer = Arc::new(RacingDriver {
        rival: Mutex::new(Some((Arc::clone(&h.lli), MockDriver::full()))),
    });

    assert_eq!(
        h.lli.add_driver(racer, SIGNAL_IRQ),
        Ok(Registration::Existing)
    );

    // 先发布的链路保留
    let link = h.link();
    assert_eq!(link.irq(), RIVAL_IRQ);
    assert_eq!(link.driver_name(), "mock-lli");
    assert!(link.is_mapped());

    // 落败一方的中断与映射都已释放
    assert_eq!(h.irq.request_calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.irq.free_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.shmem.map_calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.shmem.live_mappings.load(Ordering::SeqCst), 1);
    assert_eq!(h.lli.handle_irq(SIGNAL_IRQ), IrqReturn::None);
}

/// request_irq 返回之前就触发一次中断的控制器
struct EarlyIrqChip {
    chip: MockIrqChip,
    lli: Mutex<Weak<Lli>>,
    early: Mutex<Option<IrqReturn>>,
}

impl IrqOps for EarlyIrqChip {
    fn request_irq(&self, irq: usize, name: &str) -> LliResult<()> {
        self.chip.request_irq(irq, name)?;
        let lli = self.lli.lock().unwrap().upgrade();
        if let Some(lli) = lli {
            *self.early.lock().unwrap() = Some(lli.handle_irq(irq));
        }
        Ok(())
    }

    fn free_irq(&self, irq: usize) {
        self.chip.free_irq(irq);
    }

    fn enable_irq(&self, irq: usize) {
        self.chip.enable_irq(irq);
    }

    fn disable_irq_nosync(&self, irq: usize) {
        self.chip.disable_irq_nosync(irq);
    }
}

#[test]
fn test_irq_before_publish_reaches_pending_link() {
    init_sync_arch_ops();
    let chip = Arc::new(EarlyIrqChip {
        chip: MockIrqChip::new(),
        lli: Mutex::new(Weak::new()),
        early: Mutex::new(None),
    });
    let irq_ops: Arc<dyn IrqOps> = chip.clone();
    let shmem_ops: Arc<dyn ShmemOps> = Arc::new(MockShmem::new());
    let lli = Arc::new(Lli::new(
        LliConfig::new().with_reserved(RESERVED_BASE),
        LliPlatform::new(irq_ops, shmem_ops),
    ));
    *chip.lli.lock().unwrap() = Arc::downgrade(&lli);

    let driver = MockDriver::full();
    driver.signal.store(0x4, Ordering::SeqCst);
    assert_eq!(
        lli.add_driver(driver, SIGNAL_IRQ),
        Ok(Registration::Added)
    );

    assert_eq!(*chip.early.lock().unwrap(), Some(IrqReturn::Handled));
    assert_eq!(lli.handle_irq(SIGNAL_IRQ), IrqReturn::Handled);
}
