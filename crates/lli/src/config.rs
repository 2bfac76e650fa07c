//! 配置常量与链路配置

/// 1 KiB
pub const SZ_1K: usize = 1024;
/// 1 MiB
pub const SZ_1M: usize = 1024 * SZ_1K;

/// IPC 共享内存大小，不应超过 4 MiB
pub const IPC_MEMSIZE: usize = 4 * SZ_1M;

/// 十六进制转储窗口大小
pub const DUMP_WINDOW_SIZE: usize = 512;
/// 控制命令 98 的转储起始偏移
pub const DUMP_WINDOW_LOW: usize = SZ_1K;
/// 控制命令 99 的转储起始偏移
pub const DUMP_WINDOW_HIGH: usize = SZ_1K + DUMP_WINDOW_SIZE;
/// 转储每行字节数
pub const DUMP_ROW_SIZE: usize = 16;
/// 转储行前缀
pub const DUMP_PREFIX: &str = "llimem: ";

/// 信号扫描测试覆盖的位数
pub const SIGNAL_SWEEP_BITS: u32 = 32;

/// 共享内存映射策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPolicy {
    /// 注册驱动时立即映射，移除驱动时解除
    Eager,
    /// 仅在执行控制命令期间映射，命令结束后立即解除
    PerCommand,
}

/// 链路配置
///
/// 描述启动早期预留的物理内存区域以及映射策略，
/// 在 [`Lli`](crate::Lli) 创建之前确定，之后不再改变。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LliConfig {
    phys_base: usize,
    shmem_size: usize,
    map_policy: MapPolicy,
}

impl LliConfig {
    /// 未预留物理内存、默认 4 MiB、立即映射的配置
    pub const fn new() -> Self {
        Self {
            phys_base: 0,
            shmem_size: IPC_MEMSIZE,
            map_policy: MapPolicy::Eager,
        }
    }

    /// 设置预留区域的物理基址（0 表示未预留）
    pub const fn with_reserved(mut self, phys_base: usize) -> Self {
        self.phys_base = phys_base;
        self
    }

    /// 设置共享内存大小
    pub const fn with_shmem_size(mut self, size: usize) -> Self {
        self.shmem_size = size;
        self
    }

    /// 设置映射策略
    pub const fn with_map_policy(mut self, policy: MapPolicy) -> Self {
        self.map_policy = policy;
        self
    }

    /// 预留区域物理基址
    pub const fn phys_base(&self) -> usize {
        self.phys_base
    }

    /// 共享内存大小
    pub const fn shmem_size(&self) -> usize {
        self.shmem_size
    }

    /// 映射策略
    pub const fn map_policy(&self) -> MapPolicy {
        self.map_policy
    }

    /// 物理内存是否已预留
    pub const fn is_reserved(&self) -> bool {
        self.phys_base != 0
    }
}

impl Default for LliConfig {
    fn default() -> Self {
        Self::new()
    }
}
