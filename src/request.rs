//! Request buffer owned by a master engine
//!
//! The buffer holds a whole ADU. The PDU region starts `pdu_offset` bytes in
//! and is followed by whatever envelope bytes remain of `padding`:
//!
//! ```text
//! RTU:  [addr][ PDU ......... ][crc lo][crc hi]   pdu_offset = 1, padding = 3
//! TCP:  [tid ][pid ][len ][uid][ PDU ........ ]   pdu_offset = 7, padding = 7
//! PDU:  [ PDU ......................... ]         pdu_offset = 0, padding = 0
//! ```

use std::ops::Range;

/// Owned frame storage plus the envelope layout of the active transport.
///
/// The PDU is never stored as a separate pointer: [`pdu`](Self::pdu) and
/// [`pdu_mut`](Self::pdu_mut) derive it from the current layout each time, so
/// a reallocation can never leave a stale view behind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequestBuffer {
    pub(crate) data: Vec<u8>,
    pub(crate) pdu_offset: usize,
    pub(crate) padding: usize,
}

impl RequestBuffer {
    /// Empty, unallocated buffer with a bare-PDU layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a frame buffer is currently held.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        !self.data.is_empty()
    }

    /// Total allocated length in bytes (0 if unallocated).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when nothing is allocated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Envelope bytes preceding the PDU region as configured by the last
    /// `begin_request_*` call.
    #[inline]
    pub fn pdu_offset(&self) -> usize {
        self.pdu_offset
    }

    /// Envelope bytes reserved on top of the PDU payload.
    #[inline]
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Byte range of the PDU within [`frame`](Self::frame): starts at
    /// `pdu_offset`, ends before the trailing envelope bytes.
    pub fn pdu_range(&self) -> Option<Range<usize>> {
        if !self.is_allocated() {
            return None;
        }
        let trailing = self.padding.checked_sub(self.pdu_offset)?;
        let end = self.data.len().checked_sub(trailing)?;
        (self.pdu_offset <= end).then_some(self.pdu_offset..end)
    }

    /// PDU region view, absent when unallocated.
    #[inline]
    pub fn pdu(&self) -> Option<&[u8]> {
        let range = self.pdu_range()?;
        Some(&self.data[range])
    }

    /// Mutable PDU region view, absent when unallocated.
    #[inline]
    pub fn pdu_mut(&mut self) -> Option<&mut [u8]> {
        let range = self.pdu_range()?;
        Some(&mut self.data[range])
    }

    /// The whole frame, envelope included. Empty when unallocated.
    #[inline]
    pub fn frame(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    pub(crate) fn set_layout(&mut self, pdu_offset: usize, padding: usize) {
        self.pdu_offset = pdu_offset;
        self.padding = padding;
    }
}
