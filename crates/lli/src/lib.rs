//! LLI 链路管理器
//!
//! 此 crate 管理 AP 与 modem 之间的低延迟互连链路（LLI），包括：
//!
//! - [`Lli`] - 链路管理器句柄，负责驱动注册与面向上层的接口
//! - [`LinkDevice`] - 一次成功注册的链路记录
//! - [`LliDriver`] trait - 链路硬件驱动接口，配合 [`DriverCaps`] 声明能力
//! - [`SharedMemory`] - 非缓存映射的 IPC 共享内存
//! - [`LinkState`] - 链路状态机
//! - [`SignalSlot`] - 边带信号中断的处理函数槽
//! - [`PmService`] - 电源管理锁服务
//! - [`ControlCommand`] - 诊断控制接口
//!
//! # 架构解耦
//!
//! 通过 trait 抽象与平台组件解耦：
//! - [`IrqOps`]: 中断线的申请、释放、使能与屏蔽
//! - [`ShmemOps`]: 预留物理内存的非缓存映射
//!
//! 平台实现通过 [`LliPlatform`] 在 [`Lli::new`] 时注入；
//! 信号中断到来时平台调用 [`Lli::handle_irq`]。

#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod collab;
pub mod config;
pub mod control;
pub mod driver;
pub mod error;
pub mod link;
pub mod manager;
pub mod ops;
pub mod pm;
pub mod shmem;
pub mod signal;
pub mod state;

#[cfg(test)]
mod tests;

// Re-export config
pub use config::{IPC_MEMSIZE, LliConfig, MapPolicy};

// Re-export error
pub use error::{LliError, LliResult};

// Re-export ops
pub use ops::{IrqOps, IrqReturn, LliPlatform, ShmemOps};

// Re-export driver
pub use driver::{DriverCaps, LliDriver};

// Re-export link
pub use link::LinkDevice;
pub use manager::{Lli, Registration};
pub use shmem::SharedMemory;
pub use signal::{HandlerId, SignalCallback, SignalSlot};
pub use state::{LinkState, LinkStateCell};

// Re-export pm / control
pub use control::{ControlCommand, hex_dump_lines};
pub use pm::{LinkPmOps, PmOwner, PmService};

// Re-export collaborators
pub use collab::{MacEngine, VoltageLevel, VoltageRegulator};
