//! PDU writer over a caller-allocated region
//!
//! Request builders never own memory: they fill the PDU view of the engine's
//! request buffer in place, after the allocator has sized it.

use tracing::debug;

use crate::constants::{EXCEPTION_FLAG, EXCEPTION_PDU_LEN};
use crate::error::{ModbusError, ModbusResult};

/// Sequential writer over a fixed PDU region.
///
/// Writing past the end of the region fails with [`ModbusError::Length`]
/// rather than panicking.
#[derive(Debug)]
pub struct PduWriter<'a> {
    data: &'a mut [u8],
    len: usize,
}

impl<'a> PduWriter<'a> {
    /// Start writing at the beginning of `data`.
    #[inline]
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, len: 0 }
    }

    /// Push a single byte
    #[inline]
    pub fn push(&mut self, byte: u8) -> ModbusResult<&mut Self> {
        let slot = self.data.get_mut(self.len).ok_or(ModbusError::Length)?;
        *slot = byte;
        self.len += 1;
        Ok(self)
    }

    /// Push u16 in big-endian
    #[inline]
    pub fn push_u16(&mut self, value: u16) -> ModbusResult<&mut Self> {
        self.extend(&value.to_be_bytes())
    }

    /// Extend with a byte slice
    #[inline]
    pub fn extend(&mut self, bytes: &[u8]) -> ModbusResult<&mut Self> {
        let end = self.len + bytes.len();
        let dst = self
            .data
            .get_mut(self.len..end)
            .ok_or(ModbusError::Length)?;
        dst.copy_from_slice(bytes);
        self.len = end;
        Ok(self)
    }

    /// Bytes written so far
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if nothing was written
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ensure the region was filled exactly.
    ///
    /// A short write leaves stale bytes on the wire, so it is reported as
    /// [`ModbusError::Length`].
    pub fn finish(self) -> ModbusResult<()> {
        if self.len != self.data.len() {
            return Err(ModbusError::Length);
        }
        if let Some(&fc) = self.data.first() {
            debug!(
                "PDU built: FC={:02X} ({}), total_len={}",
                fc,
                function_code_description(fc),
                self.len
            );
        }
        Ok(())
    }
}

/// Get human-readable function code description
pub fn function_code_description(fc: u8) -> &'static str {
    match fc & !EXCEPTION_FLAG {
        0x01 => "Read Coils",
        0x02 => "Read Discrete Inputs",
        0x03 => "Read Holding Registers",
        0x04 => "Read Input Registers",
        0x05 => "Write Single Coil",
        0x06 => "Write Single Register",
        0x0F => "Write Multiple Coils",
        0x10 => "Write Multiple Registers",
        0x16 => "Mask Write Register",
        0x17 => "Read/Write Multiple Registers",
        _ => "Unknown Function",
    }
}

/// Whether a response PDU is an exception frame: high bit set on the
/// function code and exactly two bytes long.
#[inline]
pub fn is_exception_pdu(pdu: &[u8]) -> bool {
    pdu.len() == EXCEPTION_PDU_LEN && pdu[0] & EXCEPTION_FLAG != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_basic_operations() {
        let mut buf = [0u8; 5];
        let mut w = PduWriter::new(&mut buf);
        assert!(w.is_empty());

        w.push(0x03).unwrap().push_u16(0x0100).unwrap();
        w.push_u16(0x000A).unwrap();
        assert_eq!(w.len(), 5);
        w.finish().unwrap();

        assert_eq!(buf, [0x03, 0x01, 0x00, 0x00, 0x0A]);
    }

    #[test]
    fn test_writer_overflow() {
        let mut buf = [0u8; 2];
        let mut w = PduWriter::new(&mut buf);
        w.push(0x06).unwrap();
        assert_eq!(w.push_u16(0x1234).unwrap_err(), ModbusError::Length);
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn test_short_write_rejected() {
        let mut buf = [0u8; 3];
        let mut w = PduWriter::new(&mut buf);
        w.push(0x06).unwrap();
        assert_eq!(w.finish(), Err(ModbusError::Length));
    }

    #[test]
    fn test_exception_detection() {
        assert!(is_exception_pdu(&[0x83, 0x02]));
        assert!(!is_exception_pdu(&[0x83, 0x02, 0x00]));
        assert!(!is_exception_pdu(&[0x03, 0x02]));
        assert_eq!(function_code_description(0x83), "Read Holding Registers");
    }
}
