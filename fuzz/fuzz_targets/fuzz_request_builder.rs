#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use voltage_modbus_master::{BoundedAllocator, DataCallbackArgs, ModbusMaster};

#[derive(Debug, Arbitrary)]
enum Request {
    Read { function: u8, index: u16, count: u16 },
    WriteCoil { index: u16, value: bool },
    WriteRegister { index: u16, value: u16 },
    WriteCoils { index: u16, values: Vec<bool> },
    WriteRegisters { index: u16, values: Vec<u16> },
    MaskWrite { index: u16, and_mask: u16, or_mask: u16 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    capacity: u16,
    tcp: bool,
    request: Request,
}

fn on_data(_: &mut ModbusMaster<(), BoundedAllocator>, _: &DataCallbackArgs) {}

fuzz_target!(|input: Input| {
    let mut master = ModbusMaster::new(BoundedAllocator::new(input.capacity.into()), on_data, None);
    let build = |m: &mut ModbusMaster<(), BoundedAllocator>| match &input.request {
        Request::Read { function, index, count } => m.build_request_01020304(*function, *index, *count),
        Request::WriteCoil { index, value } => m.build_request_05(*index, *value),
        Request::WriteRegister { index, value } => m.build_request_06(*index, *value),
        Request::WriteCoils { index, values } => m.build_request_15(*index, values),
        Request::WriteRegisters { index, values } => m.build_request_16(*index, values),
        Request::MaskWrite { index, and_mask, or_mask } => {
            m.build_request_22(*index, *and_mask, *or_mask)
        }
    };

    let result = if input.tcp {
        master.build_tcp_request(1, 1, build)
    } else {
        master.build_rtu_request(1, build)
    };

    // Failed builds leave the buffer released
    if result.is_ok() {
        assert!(master.request().pdu().is_some());
    } else {
        assert!(!master.request().is_allocated());
    }
});
