//! # Byte Order Helpers
//!
//! Fixed 16-bit reads and writes used by frame envelopes and codecs.
//!
//! Modbus mixes two orders on the wire:
//! - Big-endian (AB): MBAP header fields, addresses, quantities, register values
//! - Little-endian (BA): the RTU CRC16 trailer only
//!
//! All helpers operate on the first two bytes of the given slice and panic if
//! it is shorter, like slice indexing. Callers check frame lengths first.

/// Read a big-endian u16 from the first two bytes.
///
/// # Example
///
/// ```rust
/// use voltage_modbus_master::bytes::read_be16;
///
/// assert_eq!(read_be16(&[0x12, 0x34]), 0x1234);
/// ```
#[inline]
pub fn read_be16(src: &[u8]) -> u16 {
    u16::from_be_bytes([src[0], src[1]])
}

/// Read a little-endian u16 from the first two bytes.
#[inline]
pub fn read_le16(src: &[u8]) -> u16 {
    u16::from_le_bytes([src[0], src[1]])
}

/// Write `value` big-endian into the first two bytes.
#[inline]
pub fn write_be16(dst: &mut [u8], value: u16) {
    dst[..2].copy_from_slice(&value.to_be_bytes());
}

/// Write `value` little-endian into the first two bytes.
///
/// ```rust
/// use voltage_modbus_master::bytes::write_le16;
///
/// let mut buf = [0u8; 3];
/// write_le16(&mut buf[1..], 0xABCD);
/// assert_eq!(buf, [0x00, 0xCD, 0xAB]);
/// ```
#[inline]
pub fn write_le16(dst: &mut [u8], value: u16) {
    dst[..2].copy_from_slice(&value.to_le_bytes());
}

/// Read bit `index` from a packed coil field (LSB of byte 0 is bit 0).
#[inline]
pub fn read_bit(src: &[u8], index: usize) -> bool {
    src[index / 8] & (1 << (index % 8)) != 0
}

/// Set or clear bit `index` in a packed coil field.
#[inline]
pub fn write_bit(dst: &mut [u8], index: usize, value: bool) {
    let mask = 1 << (index % 8);
    if value {
        dst[index / 8] |= mask;
    } else {
        dst[index / 8] &= !mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_be_le_reads() {
        let data = [0x12, 0x34, 0x56];
        assert_eq!(read_be16(&data), 0x1234);
        assert_eq!(read_le16(&data), 0x3412);
        assert_eq!(read_be16(&data[1..]), 0x3456);
    }

    #[test]
    fn test_writes_touch_only_two_bytes() {
        let mut buf = [0xEEu8; 4];
        write_be16(&mut buf[1..], 0x0102);
        assert_eq!(buf, [0xEE, 0x01, 0x02, 0xEE]);

        write_le16(&mut buf[1..], 0x0102);
        assert_eq!(buf, [0xEE, 0x02, 0x01, 0xEE]);
    }

    #[test]
    fn test_bit_packing() {
        let mut field = [0u8; 2];
        write_bit(&mut field, 0, true);
        write_bit(&mut field, 2, true);
        write_bit(&mut field, 9, true);
        assert_eq!(field, [0b0000_0101, 0b0000_0010]);

        assert!(read_bit(&field, 2));
        assert!(!read_bit(&field, 1));
        assert!(read_bit(&field, 9));

        write_bit(&mut field, 2, false);
        assert_eq!(field[0], 0b0000_0001);
    }
}
