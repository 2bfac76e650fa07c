//! 链路状态
//!
//! 状态转换只发生在少数串行化的调用点（电源管理的 lock/unlock 与显式设置），
//! 因此读写使用 SeqCst 的 load/store 即可，不需要 CAS。

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

/// 链路状态
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// 未挂载（初始状态）
    Unmounted = 0,
    /// 等待挂载，电源管理已持有链路
    WaitForMount = 1,
    /// 已挂载，可以传输数据
    Mounted = 2,
    /// 已挂起
    Suspended = 3,
    /// 对端崩溃
    Crash = 4,
}

impl LinkState {
    /// 从原始值转换
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(LinkState::Unmounted),
            1 => Some(LinkState::WaitForMount),
            2 => Some(LinkState::Mounted),
            3 => Some(LinkState::Suspended),
            4 => Some(LinkState::Crash),
            _ => None,
        }
    }

    /// 状态名
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Unmounted => "unmounted",
            LinkState::WaitForMount => "wait-for-mount",
            LinkState::Mounted => "mounted",
            LinkState::Suspended => "suspended",
            LinkState::Crash => "crash",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 无锁的链路状态存储
#[derive(Debug)]
pub struct LinkStateCell {
    raw: AtomicU8,
}

impl LinkStateCell {
    /// 以 [`LinkState::Unmounted`] 初始化
    pub const fn new() -> Self {
        Self {
            raw: AtomicU8::new(LinkState::Unmounted as u8),
        }
    }

    /// 读取当前状态
    pub fn get(&self) -> LinkState {
        // 只有 set 会写入，值总是合法的
        LinkState::from_raw(self.raw.load(Ordering::SeqCst)).unwrap_or(LinkState::Crash)
    }

    /// 设置当前状态
    pub fn set(&self, state: LinkState) {
        self.raw.store(state as u8, Ordering::SeqCst);
    }

    /// Unmounted → WaitForMount，其余状态不变。返回是否发生了转换。
    pub fn lock_link(&self) -> bool {
        if self.get() == LinkState::Unmounted {
            self.set(LinkState::WaitForMount);
            true
        } else {
            false
        }
    }

    /// WaitForMount → Unmounted，其余状态不变。返回是否发生了转换。
    pub fn unlock_link(&self) -> bool {
        if self.get() == LinkState::WaitForMount {
            self.set(LinkState::Unmounted);
            true
        } else {
            false
        }
    }
}

impl Default for LinkStateCell {
    fn default() -> Self {
        Self::new()
    }
}
