//! Modbus CRC16 (polynomial 0xA001 reflected, init 0xFFFF)

use crc::{Crc, CRC_16_MODBUS};

const CRC_MODBUS: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Compute the Modbus CRC16 over `data`.
///
/// The result goes on the wire little-endian, see [`crate::bytes::write_le16`].
///
/// ```rust
/// use voltage_modbus_master::crc::crc16;
///
/// // Read 10 holding registers from slave 1 at address 0
/// assert_eq!(crc16(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A]), 0xCDC5);
/// ```
#[inline]
pub fn crc16(data: &[u8]) -> u16 {
    CRC_MODBUS.checksum(data)
}

/// Check an RTU-style frame whose last two bytes hold the little-endian CRC
/// of everything before them. Frames shorter than 2 bytes never match.
#[inline]
pub fn check_frame_crc(frame: &[u8]) -> bool {
    if frame.len() < 2 {
        return false;
    }
    let (body, trailer) = frame.split_at(frame.len() - 2);
    crc16(body) == crate::bytes::read_le16(trailer)
}
