//! Heap arena for heap-mode fields.
//!
//! A heap-mode field stores a [`HANDLE_SIZE`](crate::field::HANDLE_SIZE)
//! handle in its record slot instead of the value itself. Handle `h` refers to
//! slot `h - 1` of a [`Heap`]; handle 0 is the null pointer. Bytes and string
//! values are kept sized exactly to their content, submessages as a full
//! record image of their descriptor's size.
//!
//! Allocation goes through `try_reserve_exact`, so running out of memory is
//! reported as [`Error::AllocationFailed`] rather than aborting.

use crate::error::{Error, Result};
use alloc::vec::Vec;
use core::mem;

/// An arena of owned byte buffers addressed by non-zero `u32` handles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Heap {
    slots: Vec<Option<Vec<u8>>>,
}

fn zeroed(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed)?;
    buf.resize(len, 0);
    Ok(buf)
}

impl Heap {
    /// Creates an empty arena.
    pub const fn new() -> Self {
        Heap { slots: Vec::new() }
    }

    /// Allocates `len` zeroed bytes and returns their handle.
    ///
    /// Freed slots are reused before the arena grows.
    pub fn alloc(&mut self, len: usize) -> Result<u32> {
        let buf = zeroed(len)?;
        let index = match self.slots.iter().position(Option::is_none) {
            Some(index) => index,
            None => {
                self.slots
                    .try_reserve(1)
                    .map_err(|_| Error::AllocationFailed)?;
                self.slots.push(None);
                self.slots.len() - 1
            }
        };
        let handle = u32::try_from(index + 1).map_err(|_| Error::AllocationFailed)?;
        self.slots[index] = Some(buf);
        codec_trace!(handle, len, "heap alloc");
        Ok(handle)
    }

    /// Allocates a copy of `value` and returns its handle.
    pub fn alloc_from(&mut self, value: &[u8]) -> Result<u32> {
        let handle = self.alloc(value.len())?;
        if let Some(buf) = self.get_mut(handle) {
            buf.copy_from_slice(value);
        }
        Ok(handle)
    }

    /// Returns the buffer behind `handle`, or `None` for null or freed handles.
    pub fn get(&self, handle: u32) -> Option<&[u8]> {
        let index = (handle as usize).checked_sub(1)?;
        self.slots.get(index)?.as_deref()
    }

    /// Mutable access to the buffer behind `handle`.
    pub fn get_mut(&mut self, handle: u32) -> Option<&mut Vec<u8>> {
        let index = (handle as usize).checked_sub(1)?;
        self.slots.get_mut(index)?.as_mut()
    }

    /// Resizes the buffer behind `handle` to exactly `len` bytes.
    ///
    /// Growing zero-fills. Fails with `InvalidDescriptor` for a dangling
    /// handle.
    pub fn resize(&mut self, handle: u32, len: usize) -> Result<()> {
        let buf = self.get_mut(handle).ok_or(Error::InvalidDescriptor)?;
        if len > buf.len() {
            buf.try_reserve_exact(len - buf.len())
                .map_err(|_| Error::AllocationFailed)?;
        }
        buf.resize(len, 0);
        buf.shrink_to_fit();
        Ok(())
    }

    /// Swaps the buffer behind a live `handle` with `value`, returning the
    /// old buffer. The handle stays live.
    pub fn replace(&mut self, handle: u32, value: Vec<u8>) -> Option<Vec<u8>> {
        self.get_mut(handle).map(|buf| mem::replace(buf, value))
    }

    /// Releases `handle`. Returns `false` if it was null or already free.
    pub fn free(&mut self, handle: u32) -> bool {
        let Some(index) = (handle as usize).checked_sub(1) else {
            return false;
        };
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                codec_trace!(handle, "heap free");
                true
            }
            _ => false,
        }
    }

    /// Number of live allocations.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
