//! Master engine state
//!
//! A [`ModbusMaster`] builds request frames into an allocator-managed buffer
//! and parses the matching responses. It performs no I/O: moving bytes to and
//! from the device is left to the caller.
//!
//! # Request/response cycle
//!
//! ```rust
//! use voltage_modbus_master::{DataCallbackArgs, DefaultAllocator, ModbusMaster};
//!
//! fn on_data(master: &mut ModbusMaster<Vec<u16>>, args: &DataCallbackArgs) {
//!     master.context_mut().push(args.value);
//! }
//!
//! let mut master = ModbusMaster::new(DefaultAllocator, on_data, None);
//!
//! // Read 2 holding registers at 0x006B from slave 0x11
//! master
//!     .build_rtu_request(0x11, |m| m.build_request_03(0x006B, 2))
//!     .unwrap();
//! assert_eq!(master.request().frame()[..6], [0x11, 0x03, 0x00, 0x6B, 0x00, 0x02]);
//!
//! // ...send the frame, receive the answer...
//! let mut response = vec![0x11, 0x03, 0x04, 0x02, 0x2B, 0x00, 0x64];
//! let crc = voltage_modbus_master::crc::crc16(&response);
//! response.extend_from_slice(&crc.to_le_bytes());
//!
//! master.parse_pending_response_rtu(&response).unwrap();
//! assert_eq!(master.context(), &vec![0x022B, 0x0064]);
//! ```

use std::fmt;

use tracing::trace;

use crate::allocator::{BufferAllocator, BufferPurpose, DefaultAllocator};
use crate::constants::{
    FC_READ_COILS, FC_READ_DISCRETE_INPUTS, FC_READ_HOLDING_REGISTERS, FC_READ_INPUT_REGISTERS,
    FC_WRITE_MULTIPLE_COILS, FC_WRITE_MULTIPLE_REGISTERS, FC_WRITE_SINGLE_COIL,
    FC_WRITE_SINGLE_REGISTER,
};
use crate::dispatch::FunctionTable;
use crate::error::{ModbusError, ModbusResult};
use crate::exception::ModbusException;
use crate::limits::RequestLimits;
use crate::request::RequestBuffer;

/// Kind of data item reported to the data callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataType {
    /// Read/write single bit
    Coil,
    /// Read-only single bit
    DiscreteInput,
    /// Read/write 16-bit register
    HoldingRegister,
    /// Read-only 16-bit register
    InputRegister,
}

impl DataType {
    /// Data type addressed by a standard function code.
    pub fn for_function(function: u8) -> Option<Self> {
        match function {
            FC_READ_COILS | FC_WRITE_SINGLE_COIL | FC_WRITE_MULTIPLE_COILS => Some(Self::Coil),
            FC_READ_DISCRETE_INPUTS => Some(Self::DiscreteInput),
            FC_READ_HOLDING_REGISTERS | FC_WRITE_SINGLE_REGISTER | FC_WRITE_MULTIPLE_REGISTERS => {
                Some(Self::HoldingRegister)
            }
            FC_READ_INPUT_REGISTERS => Some(Self::InputRegister),
            _ => None,
        }
    }

    /// True for single-bit items.
    #[inline]
    pub fn is_bit(&self) -> bool {
        matches!(self, Self::Coil | Self::DiscreteInput)
    }
}

/// One decoded item handed to the data callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataCallbackArgs {
    /// Slave address (RTU) or unit id (TCP) the data came from
    pub address: u8,
    /// Function code of the exchange
    pub function: u8,
    /// Kind of item
    pub data_type: DataType,
    /// Register or coil address
    pub index: u16,
    /// Register value, or 0/1 for bits
    pub value: u16,
}

/// Called by response parsers for every decoded data item.
pub type DataCallback<C, A> = fn(&mut ModbusMaster<C, A>, &DataCallbackArgs);

/// Called for exception responses with (slave address, function code with the
/// high bit cleared, exception code).
pub type ExceptionCallback<C, A> = fn(&mut ModbusMaster<C, A>, u8, u8, ModbusException);

/// Modbus master engine state.
///
/// `C` is a caller-owned context handed through to callbacks; `A` is the
/// buffer allocator. Pass `&mut alloc` to lend an allocator instead of moving
/// it in.
///
/// Dropping the engine releases the request buffer through the allocator,
/// same as [`destroy`](Self::destroy).
pub struct ModbusMaster<C = (), A: BufferAllocator = DefaultAllocator> {
    pub(crate) allocator: A,
    pub(crate) data_callback: DataCallback<C, A>,
    pub(crate) exception_callback: Option<ExceptionCallback<C, A>>,
    pub(crate) functions: FunctionTable<C, A>,
    pub(crate) limits: RequestLimits,
    pub(crate) context: C,
    pub(crate) request: RequestBuffer,
}

impl<C: Default, A: BufferAllocator> ModbusMaster<C, A> {
    /// Initialize an engine with the default function table and limits, a
    /// default context, and no request allocated.
    pub fn new(
        allocator: A,
        data_callback: DataCallback<C, A>,
        exception_callback: Option<ExceptionCallback<C, A>>,
    ) -> Self {
        Self::with_context(allocator, C::default(), data_callback, exception_callback)
    }
}

impl<C, A: BufferAllocator> ModbusMaster<C, A> {
    /// Initialize an engine around an explicit context value.
    pub fn with_context(
        allocator: A,
        context: C,
        data_callback: DataCallback<C, A>,
        exception_callback: Option<ExceptionCallback<C, A>>,
    ) -> Self {
        Self {
            allocator,
            data_callback,
            exception_callback,
            functions: FunctionTable::default(),
            limits: RequestLimits::default(),
            context,
            request: RequestBuffer::new(),
        }
    }

    /// Replace the function table (builder style).
    pub fn with_functions(mut self, functions: FunctionTable<C, A>) -> Self {
        self.functions = functions;
        self
    }

    /// Replace the request limits (builder style).
    ///
    /// Limits outside `1..=` the protocol maximum are rejected with
    /// [`ModbusError::Count`].
    pub fn with_limits(mut self, limits: RequestLimits) -> ModbusResult<Self> {
        self.set_limits(limits)?;
        Ok(self)
    }

    /// Release the request buffer. The engine stays usable afterwards.
    pub fn destroy(&mut self) {
        // Releasing never fails under the allocator contract
        let _ = self.allocate_request(0);
    }

    /// Size the request buffer for a PDU of `pdu_size` bytes plus the
    /// envelope padding of the active transport. `0` releases the buffer.
    ///
    /// This is the only place the request buffer changes shape. Previous
    /// contents are not preserved. On failure the buffer is released and the
    /// allocator's error is returned.
    pub fn allocate_request(&mut self, pdu_size: usize) -> ModbusResult<()> {
        let size = if pdu_size == 0 {
            0
        } else {
            pdu_size + self.request.padding
        };

        let mut result = self.allocator.allocate(
            &mut self.request.data,
            size,
            BufferPurpose::MasterRequest,
        );

        // Allocators may hand out more than asked for, never less
        if result.is_ok() && self.request.data.len() < size {
            result = Err(ModbusError::Alloc);
        }
        if result.is_err() || size == 0 {
            self.request.data.clear();
        } else {
            self.request.data.truncate(size);
        }
        trace!(
            "request buffer: {} bytes (pdu offset {}, padding {})",
            self.request.len(),
            self.request.pdu_offset,
            self.request.padding
        );
        result
    }

    /// Current request buffer.
    #[inline]
    pub fn request(&self) -> &RequestBuffer {
        &self.request
    }

    /// Mutable PDU region of the request, for custom request builders.
    #[inline]
    pub fn request_pdu_mut(&mut self) -> Option<&mut [u8]> {
        self.request.pdu_mut()
    }

    /// Caller context.
    #[inline]
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable caller context.
    #[inline]
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Replace the caller context, returning the previous one.
    pub fn set_context(&mut self, context: C) -> C {
        std::mem::replace(&mut self.context, context)
    }

    /// Active function table.
    #[inline]
    pub fn functions(&self) -> &FunctionTable<C, A> {
        &self.functions
    }

    /// Mutable function table, to register or override handlers.
    #[inline]
    pub fn functions_mut(&mut self) -> &mut FunctionTable<C, A> {
        &mut self.functions
    }

    /// Replace the function table.
    pub fn set_functions(&mut self, functions: FunctionTable<C, A>) {
        self.functions = functions;
    }

    /// Active request limits.
    #[inline]
    pub fn limits(&self) -> &RequestLimits {
        &self.limits
    }

    /// Replace the request limits. Invalid limits leave the current ones in
    /// place.
    pub fn set_limits(&mut self, limits: RequestLimits) -> ModbusResult<()> {
        limits.validate()?;
        self.limits = limits;
        Ok(())
    }

    /// Allocator in use.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Hand a decoded item to the data callback.
    ///
    /// Used by response parsers, including caller-registered ones.
    #[inline]
    pub fn emit_data(&mut self, args: &DataCallbackArgs) {
        let callback = self.data_callback;
        callback(self, args);
    }

    /// Hand an exception to the exception callback, if one is registered.
    #[inline]
    pub(crate) fn emit_exception(&mut self, address: u8, function: u8, code: ModbusException) {
        if let Some(callback) = self.exception_callback {
            callback(self, address, function, code);
        }
    }
}

impl<C, A: BufferAllocator> Drop for ModbusMaster<C, A> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<C: fmt::Debug, A: BufferAllocator> fmt::Debug for ModbusMaster<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModbusMaster")
            .field("functions", &self.functions)
            .field("limits", &self.limits)
            .field("context", &self.context)
            .field("request", &self.request)
            .field("has_exception_callback", &self.exception_callback.is_some())
            .finish()
    }
}
