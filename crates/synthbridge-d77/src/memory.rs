//! Blocks allocated by the driver's own allocator.

use crate::ffi::Api;
use std::ptr::NonNull;
use std::sync::Arc;
use synthbridge_core::{Error, Result};

/// A block from `D77_AllocateMemory`, freed with `D77_FreeMemory` on drop.
pub(crate) struct EngineMemory {
    api: Arc<Api>,
    ptr: NonNull<u8>,
    len: usize,
}

// The block is plain memory owned by this handle; the driver keeps no
// thread affinity for it.
unsafe impl Send for EngineMemory {}

impl EngineMemory {
    pub fn allocate(api: &Arc<Api>, len: usize) -> Result<Self> {
        let size = u32::try_from(len)
            .map_err(|_| Error::Allocation(format!("{len} bytes exceeds the driver limit")))?;
        let raw = unsafe { (api.allocate_memory)(size) };
        let ptr = NonNull::new(raw.cast::<u8>())
            .ok_or_else(|| Error::Allocation(format!("driver refused {len} bytes")))?;
        Ok(Self {
            api: Arc::clone(api),
            ptr,
            len,
        })
    }

    /// Allocate a block holding a copy of `bytes`.
    pub fn copy_from(api: &Arc<Api>, bytes: &[u8]) -> Result<Self> {
        let mut block = Self::allocate(api, bytes.len())?;
        block.as_mut_slice().copy_from_slice(bytes);
        Ok(block)
    }

    /// Allocate a block holding `value`.
    pub fn with_value<T: Copy>(api: &Arc<Api>, value: T) -> Result<Self> {
        let block = Self::allocate(api, std::mem::size_of::<T>())?;
        unsafe { block.ptr.as_ptr().cast::<T>().write_unaligned(value) };
        Ok(block)
    }

    /// Read back a value stored with [`with_value`](Self::with_value).
    pub fn read<T: Copy>(&self) -> T {
        debug_assert!(self.len >= std::mem::size_of::<T>());
        unsafe { self.ptr.as_ptr().cast::<T>().read_unaligned() }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for EngineMemory {
    fn drop(&mut self) {
        // `len` fit in u32 when the block was allocated.
        unsafe { (self.api.free_memory)(self.ptr.as_ptr().cast(), self.len as u32) };
    }
}
