//! 信号中断处理函数槽
//!
//! 最多登记一个消费者。中断路径只在自旋锁内复制一次 `Arc`，
//! 释放锁之后再调用处理函数，因此处理函数内部可以安全地注销自己。

use alloc::sync::Arc;
use core::num::NonZeroU64;
use core::sync::atomic::{AtomicU64, Ordering};
use sync::SpinLock;

use crate::error::{LliError, LliResult};

/// 信号处理函数，参数为本次读到的信号值
pub type SignalCallback = Arc<dyn Fn(u32) + Send + Sync>;

/// 登记成功后返回的句柄，注销时用于确认身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(NonZeroU64);

struct Registered {
    id: HandlerId,
    callback: SignalCallback,
}

/// 单消费者处理函数槽
pub struct SignalSlot {
    slot: SpinLock<Option<Registered>>,
    next_id: AtomicU64,
}

impl SignalSlot {
    /// 创建空槽
    pub fn new() -> Self {
        Self {
            slot: SpinLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// 登记处理函数。已有处理函数时拒绝，不会静默替换。
    pub fn register<F>(&self, callback: F) -> LliResult<HandlerId>
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        let callback: SignalCallback = Arc::new(callback);
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return Err(LliError::AlreadyRegistered);
        }
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = HandlerId(NonZeroU64::new(raw).ok_or(LliError::InvalidArgument)?);
        *slot = Some(Registered { id, callback });
        Ok(id)
    }

    /// 注销处理函数。`id` 必须是当前登记的那一个。
    pub fn unregister(&self, id: HandlerId) -> LliResult<()> {
        let mut slot = self.slot.lock();
        match slot.as_ref() {
            None => Err(LliError::NotRegistered),
            Some(current) if current.id != id => Err(LliError::HandlerMismatch),
            Some(_) => {
                *slot = None;
                Ok(())
            }
        }
    }

    /// 当前登记的句柄
    pub fn current(&self) -> Option<HandlerId> {
        self.slot.lock().as_ref().map(|r| r.id)
    }

    /// 是否有处理函数
    pub fn is_registered(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// 在中断上下文中派发信号值，返回是否调用了处理函数。
    pub fn dispatch(&self, value: u32) -> bool {
        let callback = self.slot.lock().as_ref().map(|r| Arc::clone(&r.callback));
        match callback {
            Some(callback) => {
                callback(value);
                true
            }
            None => false,
        }
    }
}

impl Default for SignalSlot {
    fn default() -> Self {
        Self::new()
    }
}
