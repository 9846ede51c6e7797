#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use voltage_modbus_master::{DataCallbackArgs, DefaultAllocator, ModbusMaster};

#[derive(Debug, Arbitrary)]
struct Exchange<'a> {
    request: &'a [u8],
    response: &'a [u8],
    fix_crc: bool,
}

fn on_data(_: &mut ModbusMaster, _: &DataCallbackArgs) {}

fn with_crc(frame: &[u8]) -> Vec<u8> {
    let mut out = frame.to_vec();
    out.extend_from_slice(&voltage_modbus_master::crc::crc16(frame).to_le_bytes());
    out
}

fuzz_target!(|input: Exchange<'_>| {
    let mut master = ModbusMaster::new(DefaultAllocator, on_data, None);
    if input.fix_crc {
        // Reach the payload parsers past the CRC check
        let _ = master.parse_response_rtu(&with_crc(input.request), &with_crc(input.response));
    } else {
        let _ = master.parse_response_rtu(input.request, input.response);
    }
});
