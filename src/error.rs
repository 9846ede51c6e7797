//! Error types for the Modbus master engine
//!
//! Every engine operation reports failure through [`ModbusError`]. Success,
//! including a well-formed exception response routed to the exception
//! callback, is `Ok(())`.

use thiserror::Error;

/// Result type used throughout the engine
pub type ModbusResult<T> = Result<T, ModbusError>;

/// Modbus engine errors
///
/// All variants are plain values so they can be compared, copied, and
/// formatted over `defmt` on targets without an allocator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModbusError {
    /// The allocator could not provide a buffer of the requested size
    #[error("Buffer allocation failed")]
    Alloc,

    /// A frame or region is too short, or a declared length disagrees with
    /// the actual one
    #[error("Invalid frame length")]
    Length,

    /// Computed CRC16 does not match the frame trailer
    #[error("CRC mismatch")]
    Crc,

    /// Broadcast request address, or request/response addresses differ
    #[error("Invalid slave address")]
    Address,

    /// Function codes differ, or no handler is registered for the code
    #[error("Unsupported or mismatched function code")]
    Function,

    /// MBAP protocol identifier is not zero
    #[error("Invalid MBAP protocol identifier")]
    BadProtocol,

    /// MBAP transaction identifiers differ between request and response
    #[error("Transaction identifier mismatch")]
    BadTransaction,

    /// Coil or register quantity outside protocol limits
    #[error("Invalid item count")]
    Count,

    /// Address range overflows the 16-bit space, or a value is out of range
    #[error("Value out of range")]
    Range,

    /// Write response does not echo the request
    #[error("Response does not match request")]
    Mismatch,
}

impl ModbusError {
    /// True for errors raised while validating transport framing.
    ///
    /// These usually point at line noise or a crossed exchange, so callers
    /// typically re-request; PDU-level errors point at a device or
    /// configuration problem instead.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            Self::Length | Self::Crc | Self::Address | Self::BadProtocol | Self::BadTransaction
        )
    }

    /// Short stable name, suitable for metrics labels and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloc => "alloc",
            Self::Length => "length",
            Self::Crc => "crc",
            Self::Address => "address",
            Self::Function => "function",
            Self::BadProtocol => "bad_protocol",
            Self::BadTransaction => "bad_transaction",
            Self::Count => "count",
            Self::Range => "range",
            Self::Mismatch => "mismatch",
        }
    }
}
