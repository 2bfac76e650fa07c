//! LLI 错误类型
//!
//! 各错误可通过 [`LliError::to_errno()`] 转换为与 POSIX 兼容的负数错误码。

use core::fmt;

/// LLI 错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LliError {
    // 登记相关
    /// 处理函数已登记 (-EBUSY)
    AlreadyRegistered,
    /// 没有登记的处理函数 (-ENOENT)
    NotRegistered,
    /// 注销的处理函数不是当前登记的那一个 (-EINVAL)
    HandlerMismatch,
    /// 尚未注册链路驱动 (-ENODEV)
    NoDevice,

    // 资源相关
    /// 申请信号中断失败 (-EBUSY)
    IrqRequestFailed,
    /// 共享内存的物理地址未预留 (-ENOMEM)
    ReservedMemoryMissing,
    /// 共享内存映射失败 (-ENOMEM)
    MappingFailed,
    /// 共享内存当前未映射 (-EFAULT)
    NotMapped,
    /// 访问超出共享内存范围 (-EFAULT)
    OutOfBounds,

    // 参数相关
    /// 无效参数 (-EINVAL)
    InvalidArgument,
    /// 不支持的控制命令 (-EINVAL)
    UnsupportedCommand(i32),

    // 驱动相关
    /// 驱动未提供该操作 (-EOPNOTSUPP)
    NotSupported,
    /// 硬件操作失败 (-EIO)
    IoError,
}

impl LliError {
    /// 转换为错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            LliError::NotRegistered => -2,
            LliError::IoError => -5,
            LliError::ReservedMemoryMissing | LliError::MappingFailed => -12,
            LliError::NotMapped | LliError::OutOfBounds => -14,
            LliError::AlreadyRegistered | LliError::IrqRequestFailed => -16,
            LliError::NoDevice => -19,
            LliError::HandlerMismatch
            | LliError::InvalidArgument
            | LliError::UnsupportedCommand(_) => -22,
            LliError::NotSupported => -95,
        }
    }
}

impl fmt::Display for LliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LliError::AlreadyRegistered => f.write_str("handler already registered"),
            LliError::NotRegistered => f.write_str("no handler registered"),
            LliError::HandlerMismatch => f.write_str("handler does not match the registered one"),
            LliError::NoDevice => f.write_str("no link driver registered"),
            LliError::IrqRequestFailed => f.write_str("failed to request signal irq"),
            LliError::ReservedMemoryMissing => f.write_str("phys_addr was not reserved"),
            LliError::MappingFailed => f.write_str("failed to map shared memory"),
            LliError::NotMapped => f.write_str("shared memory is not mapped"),
            LliError::OutOfBounds => f.write_str("access outside shared memory"),
            LliError::InvalidArgument => f.write_str("invalid argument"),
            LliError::UnsupportedCommand(cmd) => write!(f, "unsupported control command {}", cmd),
            LliError::NotSupported => f.write_str("operation not supported by driver"),
            LliError::IoError => f.write_str("hardware i/o error"),
        }
    }
}

/// LLI 操作结果
pub type LliResult<T> = Result<T, LliError>;
