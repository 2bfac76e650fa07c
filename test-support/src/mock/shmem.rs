//! 共享内存映射的 Mock 实现
//!
//! 以堆上按页对齐的清零内存模拟非缓存映射，并统计映射数量以便检测泄漏。

use alloc::alloc::{Layout, alloc_zeroed, dealloc};
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Mock 页大小
pub const MOCK_PAGE_SIZE: usize = 4096;

/// Mock 共享内存映射器
pub struct MockShmem {
    pub map_calls: AtomicUsize,
    pub unmap_calls: AtomicUsize,
    /// 当前仍存活的映射数
    pub live_mappings: AtomicUsize,
    /// 最近一次映射请求的物理地址
    pub last_paddr: AtomicUsize,
    /// 为 true 时下一次映射返回失败
    pub fail_map: AtomicBool,
}

impl MockShmem {
    pub const fn new() -> Self {
        Self {
            map_calls: AtomicUsize::new(0),
            unmap_calls: AtomicUsize::new(0),
            live_mappings: AtomicUsize::new(0),
            last_paddr: AtomicUsize::new(0),
            fail_map: AtomicBool::new(false),
        }
    }

    pub fn page_size(&self) -> usize {
        MOCK_PAGE_SIZE
    }

    /// 模拟映射，返回虚拟地址；失败时返回 0
    ///
    /// # Safety
    /// size 必须非零，返回的地址只能以相同 size 传给 [`MockShmem::unmap`]
    pub unsafe fn map(&self, paddr: usize, size: usize) -> usize {
        self.map_calls.fetch_add(1, Ordering::SeqCst);
        self.last_paddr.store(paddr, Ordering::SeqCst);
        if self.fail_map.swap(false, Ordering::SeqCst) {
            return 0;
        }
        let Ok(layout) = Layout::from_size_align(size, MOCK_PAGE_SIZE) else {
            return 0;
        };
        // SAFETY: 调用者保证 size 非零
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return 0;
        }
        self.live_mappings.fetch_add(1, Ordering::SeqCst);
        ptr as usize
    }

    /// 释放模拟映射
    ///
    /// # Safety
    /// vaddr 与 size 必须来自一次尚未释放的 [`MockShmem::map`]
    pub unsafe fn unmap(&self, vaddr: usize, size: usize) {
        self.unmap_calls.fetch_add(1, Ordering::SeqCst);
        // SAFETY: map 时以同样的参数构造过 layout
        let layout = unsafe { Layout::from_size_align_unchecked(size, MOCK_PAGE_SIZE) };
        unsafe { dealloc(vaddr as *mut u8, layout) };
        self.live_mappings.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for MockShmem {
    fn default() -> Self {
        Self::new()
    }
}
