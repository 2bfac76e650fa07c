//! 共享内存映射
//!
//! [`SharedMemory`] 持有一次非缓存映射，生命周期由 RAII 管理：
//! 创建即映射，drop 即解除映射。硬件对端写入的数据无需缓存维护即可观察到，
//! 因此所有访问都使用 volatile 读写。

use alloc::sync::Arc;
use core::ptr::NonNull;

use crate::error::{LliError, LliResult};
use crate::ops::ShmemOps;

/// 一段已映射的共享内存
pub struct SharedMemory {
    vaddr: NonNull<u8>,
    paddr: usize,
    size: usize,
    ops: Arc<dyn ShmemOps>,
}

// SAFETY: 映射本身不绑定线程，所有访问都是对设备内存的 volatile 操作
unsafe impl Send for SharedMemory {}
unsafe impl Sync for SharedMemory {}

impl SharedMemory {
    /// 映射 `[paddr, paddr + size)`。
    ///
    /// `size` 必须是页大小的非零整数倍；`paddr` 的范围由调用者保证。
    /// 映射失败不会重试。
    pub fn map(ops: &Arc<dyn ShmemOps>, paddr: usize, size: usize) -> LliResult<Self> {
        let page_size = ops.page_size();
        if size == 0 || page_size == 0 || size % page_size != 0 {
            return Err(LliError::InvalidArgument);
        }
        // SAFETY: size 已按页对齐，paddr 由调用者保证位于预留区域内
        let vaddr = unsafe { ops.map_noncached(paddr, size) }.ok_or(LliError::MappingFailed)?;
        Ok(Self {
            vaddr,
            paddr,
            size,
            ops: Arc::clone(ops),
        })
    }

    /// 映射的虚拟地址
    pub fn as_ptr(&self) -> *mut u8 {
        self.vaddr.as_ptr()
    }

    /// 映射的物理地址
    pub fn paddr(&self) -> usize {
        self.paddr
    }

    /// 映射大小（字节）
    pub fn size(&self) -> usize {
        self.size
    }

    fn check(&self, offset: usize, len: usize) -> LliResult<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(LliError::OutOfBounds),
        }
    }

    /// 读取一个字节
    pub fn read_u8(&self, offset: usize) -> LliResult<u8> {
        self.check(offset, 1)?;
        // SAFETY: offset 在映射范围内
        Ok(unsafe { self.as_ptr().add(offset).read_volatile() })
    }

    /// 写入一个字节
    pub fn write_u8(&self, offset: usize, value: u8) -> LliResult<()> {
        self.check(offset, 1)?;
        // SAFETY: offset 在映射范围内
        unsafe { self.as_ptr().add(offset).write_volatile(value) };
        Ok(())
    }

    /// 读取一个按 4 字节对齐的 u32
    pub fn read_u32(&self, offset: usize) -> LliResult<u32> {
        if offset % 4 != 0 {
            return Err(LliError::InvalidArgument);
        }
        self.check(offset, 4)?;
        // SAFETY: 映射按页对齐，offset 按 4 字节对齐且在范围内
        Ok(unsafe { (self.as_ptr().add(offset) as *const u32).read_volatile() })
    }

    /// 写入一个按 4 字节对齐的 u32
    pub fn write_u32(&self, offset: usize, value: u32) -> LliResult<()> {
        if offset % 4 != 0 {
            return Err(LliError::InvalidArgument);
        }
        self.check(offset, 4)?;
        // SAFETY: 同 read_u32
        unsafe { (self.as_ptr().add(offset) as *mut u32).write_volatile(value) };
        Ok(())
    }

    /// 从 `offset` 开始读取 `buf.len()` 个字节
    pub fn read_bytes(&self, offset: usize, buf: &mut [u8]) -> LliResult<()> {
        self.check(offset, buf.len())?;
        let base = self.as_ptr();
        for (i, byte) in buf.iter_mut().enumerate() {
            // SAFETY: offset + i 在映射范围内
            *byte = unsafe { base.add(offset + i).read_volatile() };
        }
        Ok(())
    }

    /// 从 `offset` 开始写入 `data`
    pub fn write_bytes(&self, offset: usize, data: &[u8]) -> LliResult<()> {
        self.check(offset, data.len())?;
        let base = self.as_ptr();
        for (i, byte) in data.iter().enumerate() {
            // SAFETY: offset + i 在映射范围内
            unsafe { base.add(offset + i).write_volatile(*byte) };
        }
        Ok(())
    }
}

impl Drop for SharedMemory {
    fn drop(&mut self) {
        // SAFETY: vaddr/size 来自 map 中成功的 map_noncached
        unsafe { self.ops.unmap(self.vaddr, self.size) };
    }
}

impl core::fmt::Debug for SharedMemory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedMemory")
            .field("vaddr", &self.vaddr)
            .field("paddr", &format_args!("{:#x}", self.paddr))
            .field("size", &self.size)
            .finish()
    }
}
