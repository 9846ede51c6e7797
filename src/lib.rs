//! # Voltage Modbus Master - Allocator-Driven Modbus Frame Engine
//!
//! Builds Modbus request frames and parses response frames for the master
//! role, over bare PDU, RTU and TCP (MBAP) framing. The engine performs no
//! I/O and never grows memory on its own: every frame buffer is sized by a
//! caller-supplied [`BufferAllocator`], which makes it usable on targets
//! where the integrator controls every byte.
//!
//! ## Features
//!
//! - **Explicit buffers**: one request buffer per engine, resized only
//!   through the allocator
//! - **Transport-agnostic builders**: `begin_request_*` / `end_request_*`
//!   envelopes wrap any PDU builder
//! - **Pluggable codecs**: first-match function-code dispatch table, easy to
//!   shrink or override
//! - **Strict validation**: CRC, address, MBAP header and payload checks with
//!   a flat [`ModbusError`] taxonomy
//!
//! ## Supported Function Codes
//!
//! | Code | Function | Builder | Parser |
//! |------|----------|---------|--------|
//! | 0x01 | Read Coils | ✅ | ✅ |
//! | 0x02 | Read Discrete Inputs | ✅ | ✅ |
//! | 0x03 | Read Holding Registers | ✅ | ✅ |
//! | 0x04 | Read Input Registers | ✅ | ✅ |
//! | 0x05 | Write Single Coil | ✅ | ✅ |
//! | 0x06 | Write Single Register | ✅ | ✅ |
//! | 0x0F | Write Multiple Coils | ✅ | ✅ |
//! | 0x10 | Write Multiple Registers | ✅ | ✅ |
//! | 0x16 | Mask Write Register | ✅ | ✅ |
//!
//! ## Quick Start
//!
//! ```rust
//! use voltage_modbus_master::{
//!     DataCallbackArgs, DefaultAllocator, ModbusException, ModbusMaster, ModbusResult,
//! };
//!
//! fn on_data(master: &mut ModbusMaster<Vec<u16>>, args: &DataCallbackArgs) {
//!     master.context_mut().push(args.value);
//! }
//!
//! fn on_exception(_: &mut ModbusMaster<Vec<u16>>, address: u8, function: u8, code: ModbusException) {
//!     eprintln!("slave {} rejected FC{:02X}: {}", address, function, code);
//! }
//!
//! fn main() -> ModbusResult<()> {
//!     let mut master = ModbusMaster::new(DefaultAllocator, on_data, Some(on_exception));
//!
//!     // Read 1 holding register at 0x0000 from unit 1, transaction 7
//!     master.build_tcp_request(7, 1, |m| m.build_request_03(0x0000, 1))?;
//!     let frame = master.request().frame().to_vec();
//!     assert_eq!(frame, [0x00, 0x07, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x01]);
//!
//!     // ...send `frame`, receive the response...
//!     let response = [0x00, 0x07, 0x00, 0x00, 0x00, 0x05, 0x01, 0x03, 0x02, 0x12, 0x34];
//!     master.parse_pending_response_tcp(&response)?;
//!     assert_eq!(master.context(), &vec![0x1234]);
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// Modbus protocol constants based on official specification
pub mod constants;

/// Big/little-endian 16-bit helpers and coil bit packing
pub mod bytes;

/// Modbus CRC16
pub mod crc;

/// Slave exception codes
pub mod exception;

/// Buffer allocator contract and default implementations
pub mod allocator;

/// Request buffer and its envelope layout
pub mod request;

/// PDU writer used by request builders
pub mod pdu;

/// Quantity limits applied by builders and parsers
pub mod limits;

/// Master engine state and callbacks
pub mod master;

/// Function-code dispatch table
pub mod dispatch;

/// Built-in response parsers
pub mod handlers;

// Inherent impls on ModbusMaster, split by concern
mod build;
mod envelope;
mod parse;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Engine ===
pub use master::{DataCallback, DataCallbackArgs, DataType, ExceptionCallback, ModbusMaster};

// === Error handling ===
pub use error::{ModbusError, ModbusResult};
pub use exception::ModbusException;

// === Buffers ===
pub use allocator::{BoundedAllocator, BufferAllocator, BufferPurpose, DefaultAllocator};
pub use request::RequestBuffer;

// === Dispatch ===
pub use dispatch::{FunctionHandler, FunctionTable, MasterFunction, ResponseParser};

// === Configuration ===
pub use limits::RequestLimits;

// === PDU (advanced usage) ===
pub use pdu::PduWriter;

// === Protocol limits (commonly needed constants) ===
pub use constants::{
    MAX_PDU_SIZE, MAX_READ_COILS, MAX_READ_REGISTERS, MAX_WRITE_COILS, MAX_WRITE_REGISTERS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
