//! # Buffer Allocator Contract
//!
//! The engine never grows or frees frame buffers on its own. Every change in
//! buffer size goes through a caller-supplied [`BufferAllocator`], so an
//! integrator on a constrained target can back frames with a static arena, a
//! pool, or the global heap.
//!
//! ## Contract
//!
//! | Requested size | Allocator must |
//! |----------------|----------------|
//! | `0` | release the buffer (empty, no capacity held) and return `Ok` |
//! | `n > 0` | leave the buffer at least `n` bytes long, or return [`ModbusError::Alloc`] |
//!
//! Each call fully supersedes the previous buffer for that purpose. Prior
//! contents are not preserved. The engine trims any surplus back to `n`.

use tracing::trace;

use crate::error::{ModbusError, ModbusResult};

/// What a buffer is going to hold.
///
/// Lets a single allocator manage several named buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferPurpose {
    /// Outgoing request frame built by a master
    MasterRequest,
    /// Outgoing response frame built by a slave
    SlaveResponse,
}

/// Capability the engine calls to resize its frame buffers.
pub trait BufferAllocator {
    /// Resize `buffer` to at least `size` bytes for `purpose`, or release it
    /// when `size == 0`.
    fn allocate(
        &mut self,
        buffer: &mut Vec<u8>,
        size: usize,
        purpose: BufferPurpose,
    ) -> ModbusResult<()>;
}

impl<T: BufferAllocator + ?Sized> BufferAllocator for &mut T {
    fn allocate(
        &mut self,
        buffer: &mut Vec<u8>,
        size: usize,
        purpose: BufferPurpose,
    ) -> ModbusResult<()> {
        (**self).allocate(buffer, size, purpose)
    }
}

impl<T: BufferAllocator + ?Sized> BufferAllocator for Box<T> {
    fn allocate(
        &mut self,
        buffer: &mut Vec<u8>,
        size: usize,
        purpose: BufferPurpose,
    ) -> ModbusResult<()> {
        (**self).allocate(buffer, size, purpose)
    }
}

/// Release `buffer` and its capacity.
#[inline]
fn release(buffer: &mut Vec<u8>) {
    buffer.clear();
    buffer.shrink_to_fit();
}

/// Allocator backed by the global heap.
///
/// Growth is fallible (`try_reserve_exact`), so an exhausted heap surfaces as
/// [`ModbusError::Alloc`] instead of an abort.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAllocator;

impl BufferAllocator for DefaultAllocator {
    fn allocate(
        &mut self,
        buffer: &mut Vec<u8>,
        size: usize,
        purpose: BufferPurpose,
    ) -> ModbusResult<()> {
        trace!("allocate {:?}: {} -> {} bytes", purpose, buffer.len(), size);

        buffer.clear();
        if size == 0 {
            release(buffer);
            return Ok(());
        }

        buffer.shrink_to(size);
        if buffer.try_reserve_exact(size).is_err() {
            release(buffer);
            return Err(ModbusError::Alloc);
        }
        buffer.resize(size, 0);
        Ok(())
    }
}

/// Allocator with a fixed byte budget per buffer.
///
/// Models a statically sized frame buffer: any request above `capacity`
/// fails with [`ModbusError::Alloc`] and releases the buffer.
///
/// # Example
///
/// ```rust
/// use voltage_modbus_master::allocator::{BoundedAllocator, BufferAllocator, BufferPurpose};
/// use voltage_modbus_master::ModbusError;
///
/// let mut alloc = BoundedAllocator::new(16);
/// let mut buf = Vec::new();
/// assert!(alloc.allocate(&mut buf, 8, BufferPurpose::MasterRequest).is_ok());
/// assert_eq!(
///     alloc.allocate(&mut buf, 17, BufferPurpose::MasterRequest),
///     Err(ModbusError::Alloc)
/// );
/// assert!(buf.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedAllocator {
    capacity: usize,
}

impl BoundedAllocator {
    /// Create an allocator that refuses buffers larger than `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Largest buffer this allocator will hand out.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl BufferAllocator for BoundedAllocator {
    fn allocate(
        &mut self,
        buffer: &mut Vec<u8>,
        size: usize,
        purpose: BufferPurpose,
    ) -> ModbusResult<()> {
        if size > self.capacity {
            trace!(
                "allocate {:?}: {} bytes exceeds budget of {}",
                purpose,
                size,
                self.capacity
            );
            release(buffer);
            return Err(ModbusError::Alloc);
        }
        DefaultAllocator.allocate(buffer, size, purpose)
    }
}
