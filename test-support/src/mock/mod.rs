//! Mock 实现模块
//!
//! 这里不直接依赖 `sync` / `lli` crate（避免循环依赖）。
//! 各 crate 在 `cfg(test)` 下为这些类型实现自己的 trait。

pub mod arch;
pub mod irq;
pub mod shmem;
