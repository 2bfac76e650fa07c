//! 中断控制器的 Mock 实现
//!
//! 只记录 request/free/enable/disable 的调用次数与线路状态，
//! 中断派发由测试直接调用链路管理器的中断入口完成。

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 表示“当前没有申请任何中断线”
pub const NO_LINE: usize = usize::MAX;

/// Mock 中断控制器
pub struct MockIrqChip {
    pub requested_line: AtomicUsize,
    pub line_enabled: AtomicBool,
    pub request_calls: AtomicUsize,
    pub free_calls: AtomicUsize,
    pub enable_calls: AtomicUsize,
    pub disable_calls: AtomicUsize,
    /// 为 true 时下一次 request 返回失败
    pub fail_request: AtomicBool,
}

impl MockIrqChip {
    pub const fn new() -> Self {
        Self {
            requested_line: AtomicUsize::new(NO_LINE),
            line_enabled: AtomicBool::new(false),
            request_calls: AtomicUsize::new(0),
            free_calls: AtomicUsize::new(0),
            enable_calls: AtomicUsize::new(0),
            disable_calls: AtomicUsize::new(0),
            fail_request: AtomicBool::new(false),
        }
    }

    /// 申请中断线，成功后线路处于使能状态
    pub fn request(&self, irq: usize) -> bool {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_request.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.requested_line.store(irq, Ordering::SeqCst);
        self.line_enabled.store(true, Ordering::SeqCst);
        true
    }

    pub fn free(&self, irq: usize) {
        self.free_calls.fetch_add(1, Ordering::SeqCst);
        if self.requested_line.load(Ordering::SeqCst) == irq {
            self.requested_line.store(NO_LINE, Ordering::SeqCst);
            self.line_enabled.store(false, Ordering::SeqCst);
        }
    }

    pub fn enable(&self, _irq: usize) {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        self.line_enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self, _irq: usize) {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        self.line_enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested_line.load(Ordering::SeqCst) != NO_LINE
    }
}

impl Default for MockIrqChip {
    fn default() -> Self {
        Self::new()
    }
}
