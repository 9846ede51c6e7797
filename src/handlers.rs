//! Built-in master response parsers
//!
//! These are ordinary dispatch table entries. Each receives the request and
//! response PDUs of one exchange, with function codes already known to agree,
//! and validates the response against the request before reporting data.

use tracing::debug;

use crate::allocator::BufferAllocator;
use crate::bytes::{read_be16, read_bit};
use crate::constants::{COIL_OFF, COIL_ON, FC_WRITE_MULTIPLE_COILS, FC_WRITE_SINGLE_COIL};
use crate::error::{ModbusError, ModbusResult};
use crate::master::{DataCallbackArgs, DataType, ModbusMaster};

/// Bytes needed to carry `count` items of `data_type`.
#[inline]
fn data_len(data_type: DataType, count: u16) -> usize {
    if data_type.is_bit() {
        usize::from(count).div_ceil(8)
    } else {
        usize::from(count) * 2
    }
}

/// Read coils, discrete inputs, holding registers, input registers.
///
/// Request: `[fc, index:2, count:2]`. Response: `[fc, byte count, data...]`.
/// Every item is reported through the data callback.
pub fn parse_response_01020304<C, A: BufferAllocator>(
    master: &mut ModbusMaster<C, A>,
    address: u8,
    function: u8,
    request: &[u8],
    response: &[u8],
) -> ModbusResult<()> {
    if request.len() != 5 || response.len() < 2 {
        return Err(ModbusError::Length);
    }

    let data_type = DataType::for_function(function).ok_or(ModbusError::Function)?;
    let index = read_be16(&request[1..]);
    let count = read_be16(&request[3..]);
    master.limits().check(function, index, count)?;

    let byte_count = usize::from(response[1]);
    if byte_count != data_len(data_type, count) || response.len() != 2 + byte_count {
        return Err(ModbusError::Length);
    }

    let data = &response[2..];
    for i in 0..count {
        let offset = usize::from(i);
        let value = if data_type.is_bit() {
            u16::from(read_bit(data, offset))
        } else {
            read_be16(&data[offset * 2..])
        };
        master.emit_data(&DataCallbackArgs {
            address,
            function,
            data_type,
            index: index + i,
            value,
        });
    }

    debug!(
        "FC{:02X} response from {}: {} {:?} item(s) at {}",
        function, address, count, data_type, index
    );
    Ok(())
}

/// Write single coil / write single register.
///
/// Both PDUs are `[fc, index:2, value:2]` and the response must echo the
/// request. The written value is reported through the data callback.
pub fn parse_response_0506<C, A: BufferAllocator>(
    master: &mut ModbusMaster<C, A>,
    address: u8,
    function: u8,
    request: &[u8],
    response: &[u8],
) -> ModbusResult<()> {
    if request.len() != 5 || response.len() != 5 {
        return Err(ModbusError::Length);
    }

    let data_type = DataType::for_function(function).ok_or(ModbusError::Function)?;
    let index = read_be16(&response[1..]);
    let mut value = read_be16(&response[3..]);

    if function == FC_WRITE_SINGLE_COIL {
        if value != COIL_ON && value != COIL_OFF {
            return Err(ModbusError::Range);
        }
        value = u16::from(value == COIL_ON);
    }

    if request[1..] != response[1..] {
        return Err(ModbusError::Mismatch);
    }

    master.emit_data(&DataCallbackArgs {
        address,
        function,
        data_type,
        index,
        value,
    });
    Ok(())
}

/// Write multiple coils / write multiple registers.
///
/// Request: `[fc, index:2, count:2, byte count, data...]`.
/// Response: `[fc, index:2, count:2]`, echoing the request header.
pub fn parse_response_1516<C, A: BufferAllocator>(
    master: &mut ModbusMaster<C, A>,
    address: u8,
    function: u8,
    request: &[u8],
    response: &[u8],
) -> ModbusResult<()> {
    if request.len() < 6 || response.len() != 5 {
        return Err(ModbusError::Length);
    }

    let byte_count = usize::from(request[5]);
    if request.len() != 6 + byte_count {
        return Err(ModbusError::Length);
    }

    let index = read_be16(&request[1..]);
    let count = read_be16(&request[3..]);
    master.limits().check(function, index, count)?;

    let data_type = if function == FC_WRITE_MULTIPLE_COILS {
        DataType::Coil
    } else {
        DataType::HoldingRegister
    };
    if byte_count != data_len(data_type, count) {
        return Err(ModbusError::Length);
    }

    if request[1..5] != response[1..5] {
        return Err(ModbusError::Mismatch);
    }

    debug!(
        "FC{:02X} response from {}: wrote {} item(s) at {}",
        function, address, count, index
    );
    Ok(())
}

/// Mask write register.
///
/// Both PDUs are `[fc, index:2, and mask:2, or mask:2]`; the response must
/// echo the request.
pub fn parse_response_22<C, A: BufferAllocator>(
    _master: &mut ModbusMaster<C, A>,
    _address: u8,
    _function: u8,
    request: &[u8],
    response: &[u8],
) -> ModbusResult<()> {
    if request.len() != 7 || response.len() != 7 {
        return Err(ModbusError::Length);
    }
    if request[1..] != response[1..] {
        return Err(ModbusError::Mismatch);
    }
    Ok(())
}
