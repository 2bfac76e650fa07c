//! 外部协作方接口
//!
//! 链路后端依赖的两个外部部件：供电调节器与安全认证的哈希/MAC 引擎。
//! 这里只定义接口与电压档位表，具体寄存器与算法由平台实现。

use crate::error::LliResult;

/// 供电电压档位
///
/// 档位码 0..=63 对应 0.60 V 到 1.23 V，步进 10 mV。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VoltageLevel(u8);

impl VoltageLevel {
    /// 0 档电压 (µV)
    pub const MIN_MICROVOLTS: u32 = 600_000;
    /// 步进 (µV)
    pub const STEP_MICROVOLTS: u32 = 10_000;
    /// 最大档位码
    pub const MAX_CODE: u8 = 63;
    /// 上电默认档位：1.00 V
    pub const DEFAULT: VoltageLevel = VoltageLevel(40);

    /// 由档位码构造，超出范围时返回 `None`
    pub const fn from_code(code: u8) -> Option<Self> {
        if code <= Self::MAX_CODE {
            Some(VoltageLevel(code))
        } else {
            None
        }
    }

    /// 由电压值构造，只接受恰好落在档位上的值
    pub const fn from_microvolts(uv: u32) -> Option<Self> {
        if uv < Self::MIN_MICROVOLTS {
            return None;
        }
        let delta = uv - Self::MIN_MICROVOLTS;
        if delta % Self::STEP_MICROVOLTS != 0 {
            return None;
        }
        let code = delta / Self::STEP_MICROVOLTS;
        if code > Self::MAX_CODE as u32 {
            return None;
        }
        Some(VoltageLevel(code as u8))
    }

    /// 档位码
    pub const fn code(&self) -> u8 {
        self.0
    }

    /// 对应电压 (µV)
    pub const fn microvolts(&self) -> u32 {
        Self::MIN_MICROVOLTS + self.0 as u32 * Self::STEP_MICROVOLTS
    }
}

impl Default for VoltageLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 供电调节器
pub trait VoltageRegulator: Send + Sync {
    /// 设置输出电压
    fn set_voltage(&self, level: VoltageLevel) -> LliResult<()>;

    /// 读取当前输出电压
    fn voltage(&self) -> LliResult<VoltageLevel>;

    /// 打开或关闭 buck 输出
    fn enable_buck(&self, on: bool) -> LliResult<()>;
}

/// 安全认证使用的哈希/MAC 引擎
///
/// 摘要、MAC 与密钥都是 32 字节。
pub trait MacEngine: Send + Sync {
    /// 计算消息摘要
    fn compute_hash(&self, msg: &[u8]) -> [u8; 32];

    /// 以当前密钥计算 MAC
    fn compute_mac(&self, msg: &[u8]) -> [u8; 32];

    /// 校验 MAC
    fn verify_mac(&self, msg: &[u8], mac: &[u8; 32]) -> bool;

    /// 由绑定数据与部分密钥派生下一轮密钥
    fn derive_next_secret(
        &self,
        binding: &[u8],
        partial: &[u8],
        page: u32,
        manufacturer_id: &[u8; 2],
    ) -> LliResult<[u8; 32]>;

    /// 设置当前密钥
    fn set_secret(&self, secret: &[u8; 32]);

    /// 设置器件 ROM ID
    fn set_rom_id(&self, rom_id: &[u8; 8]);
}
