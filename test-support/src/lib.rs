//! 测试支持 crate
//!
//! 提供 LLI 各 crate 单元测试使用的 Mock 平台实现

#![no_std]

extern crate alloc;

pub mod mock;
