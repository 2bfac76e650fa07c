//! 链路硬件驱动接口
//!
//! 硬件后端实现 [`LliDriver`]，并通过 [`LliDriver::capabilities`] 声明自己提供哪些操作。
//! 能力集在注册时读取一次并缓存在 [`LinkDevice`] 中；
//! 管理器只调用已声明的操作，未声明的操作被视为无副作用的空操作，而不是错误。

use bitflags::bitflags;

use crate::error::{LliError, LliResult};
use crate::link::LinkDevice;

bitflags! {
    /// 驱动能力集
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DriverCaps: u32 {
        /// 初始化链路
        const INIT = 1 << 0;
        /// 关闭链路
        const EXIT = 1 << 1;
        /// 挂起
        const SUSPEND = 1 << 2;
        /// 恢复
        const RESUME = 1 << 3;
        /// 设置主从角色
        const SET_MASTER = 1 << 4;
        /// 建链并挂载
        const LINK_STARTUP_MOUNT = 1 << 5;
        /// 发送边带信号
        const SEND_SIGNAL = 1 << 6;
        /// 读取边带信号
        const READ_SIGNAL = 1 << 7;
        /// 清除边带信号
        const RESET_SIGNAL = 1 << 8;
        /// 打开链路中断
        const INTR_ENABLE = 1 << 9;
        /// 读取链路状态寄存器
        const GET_STATUS = 1 << 10;
        /// 打印调试信息
        const DEBUG_INFO = 1 << 11;
        /// 环回测试
        const LOOPBACK_TEST = 1 << 12;
    }
}

/// 链路硬件驱动
///
/// 所有操作都有返回 [`LliError::NotSupported`] 的默认实现，
/// 后端只需实现自己在 [`LliDriver::capabilities`] 中声明的那些。
/// `link` 参数是调用方所属的链路设备，可用于访问共享内存或更新后端维护的状态。
pub trait LliDriver: Send + Sync {
    /// 驱动名，用于日志与中断申请
    fn name(&self) -> &str;

    /// 驱动提供的操作集合
    fn capabilities(&self) -> DriverCaps;

    /// 初始化链路
    fn init(&self, _link: &LinkDevice) -> LliResult<()> {
        Err(LliError::NotSupported)
    }

    /// 关闭链路
    fn exit(&self, _link: &LinkDevice) -> LliResult<()> {
        Err(LliError::NotSupported)
    }

    /// 挂起链路
    fn suspend(&self, _link: &LinkDevice) -> LliResult<()> {
        Err(LliError::NotSupported)
    }

    /// 恢复链路
    fn resume(&self, _link: &LinkDevice) -> LliResult<()> {
        Err(LliError::NotSupported)
    }

    /// 设置为主端（`true`）或从端
    fn set_master(&self, _link: &LinkDevice, _is_master: bool) -> LliResult<()> {
        Err(LliError::NotSupported)
    }

    /// 建链并挂载
    fn link_startup_mount(&self, _link: &LinkDevice) -> LliResult<()> {
        Err(LliError::NotSupported)
    }

    /// 向对端发送边带信号
    fn send_signal(&self, _link: &LinkDevice, _cmd: u32) -> LliResult<()> {
        Err(LliError::NotSupported)
    }

    /// 读取对端产生的边带信号；会在中断上下文中调用，不能阻塞
    fn read_signal(&self, _link: &LinkDevice) -> u32 {
        0
    }

    /// 清除所有边带信号
    fn reset_signal(&self, _link: &LinkDevice) -> LliResult<()> {
        Err(LliError::NotSupported)
    }

    /// 打开链路中断
    fn intr_enable(&self, _link: &LinkDevice) -> LliResult<()> {
        Err(LliError::NotSupported)
    }

    /// 读取链路状态寄存器
    fn get_status(&self, _link: &LinkDevice) -> u32 {
        0
    }

    /// 打印调试信息
    fn debug_info(&self, _link: &LinkDevice) -> LliResult<()> {
        Err(LliError::NotSupported)
    }

    /// 执行环回测试
    fn loopback_test(&self, _link: &LinkDevice) -> LliResult<()> {
        Err(LliError::NotSupported)
    }
}
