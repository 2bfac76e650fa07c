//! 中断控制操作的 Mock 实现

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Mock 架构操作
///
/// 以一个全局布尔值模拟本地中断使能位，并统计屏蔽/恢复次数。
/// 测试并行执行时状态位会被交错修改，断言应只依赖单调递增的计数。
pub struct MockArchOps {
    pub interrupt_state: AtomicBool,
    pub disable_calls: AtomicUsize,
    pub restore_calls: AtomicUsize,
}

impl MockArchOps {
    pub const fn new() -> Self {
        Self {
            interrupt_state: AtomicBool::new(true),
            disable_calls: AtomicUsize::new(0),
            restore_calls: AtomicUsize::new(0),
        }
    }

    pub unsafe fn read_and_disable_interrupts(&self) -> usize {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        if self.interrupt_state.swap(false, Ordering::SeqCst) {
            self.interrupt_enable_mask()
        } else {
            0
        }
    }

    pub unsafe fn restore_interrupts(&self, flags: usize) {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        self.interrupt_state
            .store(flags & self.interrupt_enable_mask() != 0, Ordering::SeqCst);
    }

    pub fn interrupt_enable_mask(&self) -> usize {
        0x2 // SIE bit
    }
}

/// 全局 Mock 实例
pub static MOCK_ARCH_OPS: MockArchOps = MockArchOps::new();
