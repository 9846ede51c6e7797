//! Request build and response parse throughput
//!
//! Run with `cargo bench --bench throughput`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use voltage_modbus_master::crc::crc16;
use voltage_modbus_master::{DataCallbackArgs, DefaultAllocator, ModbusMaster};

fn sum(m: &mut ModbusMaster<u64>, args: &DataCallbackArgs) {
    *m.context_mut() += u64::from(args.value);
}

fn master() -> ModbusMaster<u64> {
    ModbusMaster::new(DefaultAllocator, sum, None)
}

/// RTU response to a holding-register read of `count` registers at 0
fn rtu_read_response(address: u8, count: u16) -> Vec<u8> {
    let mut frame = vec![address, 0x03, (count * 2) as u8];
    for i in 0..count {
        frame.extend_from_slice(&i.to_be_bytes());
    }
    let crc = crc16(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

fn tcp_read_response(transaction: u16, unit: u8, count: u16) -> Vec<u8> {
    let byte_count = count * 2;
    let mut frame = transaction.to_be_bytes().to_vec();
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(&(byte_count + 3).to_be_bytes());
    frame.extend_from_slice(&[unit, 0x03, byte_count as u8]);
    for i in 0..count {
        frame.extend_from_slice(&i.to_be_bytes());
    }
    frame
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_request");
    let mut m = master();

    group.bench_function("rtu_fc03", |b| {
        b.iter(|| {
            m.build_rtu_request(black_box(1), |m| m.build_request_03(black_box(0), 10))
                .unwrap();
        })
    });

    group.bench_function("tcp_fc03", |b| {
        b.iter(|| {
            m.build_tcp_request(black_box(7), 1, |m| m.build_request_03(black_box(0), 10))
                .unwrap();
        })
    });

    let registers: Vec<u16> = (0..123).collect();
    group.bench_function("rtu_fc16_max", |b| {
        b.iter(|| {
            m.build_rtu_request(1, |m| m.build_request_16(0, black_box(&registers)))
                .unwrap();
        })
    });

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_response");

    for count in [1u16, 10, 64, 125] {
        group.throughput(Throughput::Elements(u64::from(count)));

        let mut m = master();
        m.build_rtu_request(1, |m| m.build_request_03(0, count)).unwrap();
        let response = rtu_read_response(1, count);
        group.bench_with_input(BenchmarkId::new("rtu_fc03", count), &response, |b, rsp| {
            b.iter(|| m.parse_pending_response_rtu(black_box(rsp)).unwrap())
        });

        let mut m = master();
        m.build_tcp_request(9, 1, |m| m.build_request_03(0, count))
            .unwrap();
        let response = tcp_read_response(9, 1, count);
        group.bench_with_input(BenchmarkId::new("tcp_fc03", count), &response, |b, rsp| {
            b.iter(|| m.parse_pending_response_tcp(black_box(rsp)).unwrap())
        });
    }

    group.finish();
}

fn bench_crc(c: &mut Criterion) {
    let frame = vec![0xA5u8; 256];
    let mut group = c.benchmark_group("crc16");
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("256_bytes", |b| b.iter(|| crc16(black_box(&frame))));
    group.finish();
}

criterion_group!(benches, bench_build, bench_parse, bench_crc);
criterion_main!(benches);
