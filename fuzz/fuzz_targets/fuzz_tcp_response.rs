#![no_main]

use libfuzzer_sys::fuzz_target;
use voltage_modbus_master::{DataCallbackArgs, DefaultAllocator, ModbusException, ModbusMaster};

fn on_data(_: &mut ModbusMaster, _: &DataCallbackArgs) {}

fn on_exception(_: &mut ModbusMaster, _: u8, _: u8, _: ModbusException) {}

// Parse arbitrary bytes as the response to a fixed FC03 request.
fuzz_target!(|data: &[u8]| {
    let mut master = ModbusMaster::new(DefaultAllocator, on_data, Some(on_exception));
    if master
        .build_tcp_request(0x0001, 0x01, |m| m.build_request_03(0x0000, 10))
        .is_err()
    {
        return;
    }
    let _ = master.parse_pending_response_tcp(data);
});
