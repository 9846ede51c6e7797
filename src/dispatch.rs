//! # Function-Code Dispatch Table
//!
//! Routes a response PDU to the parser registered for its function code.
//!
//! Lookup is linear and first-match: entries are compared in table order and
//! the first one whose code matches wins. Codes do not have to be unique, so
//! an override is registered simply by placing it ahead of the default:
//!
//! ```rust
//! use voltage_modbus_master::{FunctionTable, ModbusMaster, ModbusResult};
//!
//! fn my_03(
//!     _master: &mut ModbusMaster,
//!     _address: u8,
//!     _function: u8,
//!     _request: &[u8],
//!     _response: &[u8],
//! ) -> ModbusResult<()> {
//!     Ok(())
//! }
//!
//! let mut table: FunctionTable = FunctionTable::default();
//! table.prepend(0x03, my_03);
//! assert_eq!(table.iter().next().map(|h| h.code), Some(0x03));
//! ```
//!
//! Integrators that want a smaller engine build the table from an explicit
//! list with [`FunctionTable::from_functions`] instead of the full default.

use std::fmt;

use crate::allocator::{BufferAllocator, DefaultAllocator};
use crate::constants::*;
use crate::error::ModbusResult;
use crate::handlers;
use crate::master::ModbusMaster;

/// Response parser: (engine, slave address, function code, request PDU,
/// response PDU) -> result.
pub type ResponseParser<C, A> = fn(&mut ModbusMaster<C, A>, u8, u8, &[u8], &[u8]) -> ModbusResult<()>;

/// One dispatch table entry.
pub struct FunctionHandler<C = (), A: BufferAllocator = DefaultAllocator> {
    /// Function code this entry answers to
    pub code: u8,
    /// Parser invoked for matching responses
    pub parse: ResponseParser<C, A>,
}

impl<C, A: BufferAllocator> FunctionHandler<C, A> {
    /// Create an entry.
    pub const fn new(code: u8, parse: ResponseParser<C, A>) -> Self {
        Self { code, parse }
    }
}

impl<C, A: BufferAllocator> Clone for FunctionHandler<C, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, A: BufferAllocator> Copy for FunctionHandler<C, A> {}

impl<C, A: BufferAllocator> fmt::Debug for FunctionHandler<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionHandler(0x{:02X})", self.code)
    }
}

/// Standard master functions with a built-in response parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MasterFunction {
    /// FC01
    ReadCoils,
    /// FC02
    ReadDiscreteInputs,
    /// FC03
    ReadHoldingRegisters,
    /// FC04
    ReadInputRegisters,
    /// FC05
    WriteSingleCoil,
    /// FC06
    WriteSingleRegister,
    /// FC15
    WriteMultipleCoils,
    /// FC16
    WriteMultipleRegisters,
    /// FC22
    MaskWriteRegister,
}

impl MasterFunction {
    /// Every built-in function, in default table order.
    pub const ALL: [MasterFunction; 9] = [
        Self::ReadCoils,
        Self::ReadDiscreteInputs,
        Self::ReadHoldingRegisters,
        Self::ReadInputRegisters,
        Self::WriteSingleCoil,
        Self::WriteSingleRegister,
        Self::WriteMultipleCoils,
        Self::WriteMultipleRegisters,
        Self::MaskWriteRegister,
    ];

    /// Function code on the wire.
    pub fn code(&self) -> u8 {
        match self {
            Self::ReadCoils => FC_READ_COILS,
            Self::ReadDiscreteInputs => FC_READ_DISCRETE_INPUTS,
            Self::ReadHoldingRegisters => FC_READ_HOLDING_REGISTERS,
            Self::ReadInputRegisters => FC_READ_INPUT_REGISTERS,
            Self::WriteSingleCoil => FC_WRITE_SINGLE_COIL,
            Self::WriteSingleRegister => FC_WRITE_SINGLE_REGISTER,
            Self::WriteMultipleCoils => FC_WRITE_MULTIPLE_COILS,
            Self::WriteMultipleRegisters => FC_WRITE_MULTIPLE_REGISTERS,
            Self::MaskWriteRegister => FC_MASK_WRITE_REGISTER,
        }
    }

    /// Look up a built-in function by code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    /// Table entry with the built-in parser for this function.
    pub fn handler<C, A: BufferAllocator>(&self) -> FunctionHandler<C, A> {
        let parse: ResponseParser<C, A> = match self {
            Self::ReadCoils
            | Self::ReadDiscreteInputs
            | Self::ReadHoldingRegisters
            | Self::ReadInputRegisters => handlers::parse_response_01020304,
            Self::WriteSingleCoil | Self::WriteSingleRegister => handlers::parse_response_0506,
            Self::WriteMultipleCoils | Self::WriteMultipleRegisters => {
                handlers::parse_response_1516
            }
            Self::MaskWriteRegister => handlers::parse_response_22,
        };
        FunctionHandler::new(self.code(), parse)
    }
}

/// Ordered function-code dispatch table.
pub struct FunctionTable<C = (), A: BufferAllocator = DefaultAllocator> {
    entries: Vec<FunctionHandler<C, A>>,
}

impl<C, A: BufferAllocator> FunctionTable<C, A> {
    /// Table with no entries: every response is rejected as unsupported.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Table holding the built-in parsers for `functions`, in the given order.
    pub fn from_functions(functions: &[MasterFunction]) -> Self {
        Self {
            entries: functions.iter().map(MasterFunction::handler).collect(),
        }
    }

    /// Append an entry. It only takes effect for codes no earlier entry
    /// answers to.
    pub fn push(&mut self, code: u8, parse: ResponseParser<C, A>) -> &mut Self {
        self.entries.push(FunctionHandler::new(code, parse));
        self
    }

    /// Insert an entry ahead of all others, overriding any existing entry for
    /// the same code.
    pub fn prepend(&mut self, code: u8, parse: ResponseParser<C, A>) -> &mut Self {
        self.entries.insert(0, FunctionHandler::new(code, parse));
        self
    }

    /// Drop every entry for `code`. Returns how many were removed.
    pub fn remove(&mut self, code: u8) -> usize {
        let before = self.entries.len();
        self.entries.retain(|h| h.code != code);
        before - self.entries.len()
    }

    /// First parser registered for `code`.
    pub fn find(&self, code: u8) -> Option<ResponseParser<C, A>> {
        self.entries
            .iter()
            .find(|h| h.code == code)
            .map(|h| h.parse)
    }

    /// Whether any entry answers to `code`.
    #[inline]
    pub fn supports(&self, code: u8) -> bool {
        self.entries.iter().any(|h| h.code == code)
    }

    /// Entries in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionHandler<C, A>> {
        self.entries.iter()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C, A: BufferAllocator> Default for FunctionTable<C, A> {
    /// All built-in parsers.
    fn default() -> Self {
        Self::from_functions(&MasterFunction::ALL)
    }
}

impl<C, A: BufferAllocator> Clone for FunctionTable<C, A> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<C, A: BufferAllocator> fmt::Debug for FunctionTable<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|h| h.code))
            .finish()
    }
}

impl<C, A: BufferAllocator> FromIterator<FunctionHandler<C, A>> for FunctionTable<C, A> {
    fn from_iter<I: IntoIterator<Item = FunctionHandler<C, A>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
