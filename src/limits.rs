//! # Request Limits Configuration
//!
//! Per-engine quantity limits applied by the built-in request builders and
//! response parsers. Different devices have different capabilities, so a
//! master talking to a small device can tighten them below the protocol
//! maximums.
//!
//! | Class | Functions | Protocol ceiling |
//! |---|---|---|
//! | bit reads | FC01, FC02 | 2000 |
//! | register reads | FC03, FC04 | 125 |
//! | coil writes | FC15 | 1968 |
//! | register writes | FC16 | 123 |

use crate::constants::{
    FC_READ_COILS, FC_READ_DISCRETE_INPUTS, FC_READ_HOLDING_REGISTERS, FC_READ_INPUT_REGISTERS,
    FC_WRITE_MULTIPLE_COILS, FC_WRITE_MULTIPLE_REGISTERS, MAX_READ_COILS, MAX_READ_REGISTERS,
    MAX_WRITE_COILS, MAX_WRITE_REGISTERS,
};
use crate::error::{ModbusError, ModbusResult};

/// Protocol ceiling for FC01/FC02 quantities.
pub const DEFAULT_MAX_READ_COILS: u16 = MAX_READ_COILS as u16;

/// Protocol ceiling for FC03/FC04 quantities.
pub const DEFAULT_MAX_READ_REGISTERS: u16 = MAX_READ_REGISTERS as u16;

/// Protocol ceiling for FC15 quantities.
pub const DEFAULT_MAX_WRITE_COILS: u16 = MAX_WRITE_COILS as u16;

/// Protocol ceiling for FC16 quantities.
pub const DEFAULT_MAX_WRITE_REGISTERS: u16 = MAX_WRITE_REGISTERS as u16;

/// Quantity limits for a master engine.
///
/// # Example
///
/// ```rust
/// use voltage_modbus_master::RequestLimits;
///
/// // A device that only answers 50 registers per read
/// let limits = RequestLimits::new().with_max_read_registers(50);
/// assert_eq!(limits.max_read_registers, 50);
/// assert!(limits.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Maximum coils/discrete inputs per read request.
    pub max_read_coils: u16,
    /// Maximum registers per read request.
    pub max_read_registers: u16,
    /// Maximum coils per write request.
    pub max_write_coils: u16,
    /// Maximum registers per write request.
    pub max_write_registers: u16,
}

impl RequestLimits {
    /// Create limits with the protocol maximums.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits for a conservative/slow device: 50 registers and 500 coils
    /// per request in either direction.
    pub fn conservative() -> Self {
        Self {
            max_read_coils: 500,
            max_read_registers: 50,
            max_write_coils: 500,
            max_write_registers: 50,
        }
    }

    /// Set maximum read coils.
    pub fn with_max_read_coils(mut self, count: u16) -> Self {
        self.max_read_coils = count;
        self
    }

    /// Set maximum read registers.
    pub fn with_max_read_registers(mut self, count: u16) -> Self {
        self.max_read_registers = count;
        self
    }

    /// Set maximum write coils.
    pub fn with_max_write_coils(mut self, count: u16) -> Self {
        self.max_write_coils = count;
        self
    }

    /// Set maximum write registers.
    pub fn with_max_write_registers(mut self, count: u16) -> Self {
        self.max_write_registers = count;
        self
    }

    /// Check every limit is between 1 and the protocol maximum.
    pub fn validate(&self) -> ModbusResult<()> {
        let pairs = [
            (self.max_read_coils, DEFAULT_MAX_READ_COILS),
            (self.max_read_registers, DEFAULT_MAX_READ_REGISTERS),
            (self.max_write_coils, DEFAULT_MAX_WRITE_COILS),
            (self.max_write_registers, DEFAULT_MAX_WRITE_REGISTERS),
        ];
        if pairs.iter().all(|&(limit, max)| (1..=max).contains(&limit)) {
            Ok(())
        } else {
            Err(ModbusError::Count)
        }
    }

    /// Quantity limit that applies to `function`, if it carries a quantity.
    pub fn max_count(&self, function: u8) -> Option<u16> {
        match function {
            FC_READ_COILS | FC_READ_DISCRETE_INPUTS => Some(self.max_read_coils),
            FC_READ_HOLDING_REGISTERS | FC_READ_INPUT_REGISTERS => Some(self.max_read_registers),
            FC_WRITE_MULTIPLE_COILS => Some(self.max_write_coils),
            FC_WRITE_MULTIPLE_REGISTERS => Some(self.max_write_registers),
            _ => None,
        }
    }

    /// Validate `count` items starting at `index` for `function`.
    ///
    /// Fails with [`ModbusError::Count`] for a zero or over-limit quantity and
    /// with [`ModbusError::Range`] when the last item would lie past 0xFFFF.
    pub fn check(&self, function: u8, index: u16, count: u16) -> ModbusResult<()> {
        let max = self.max_count(function).ok_or(ModbusError::Function)?;
        if count == 0 || count > max {
            return Err(ModbusError::Count);
        }
        check_range(index, count)
    }
}

/// Fail with [`ModbusError::Range`] if `index + count - 1` overflows u16.
#[inline]
pub fn check_range(index: u16, count: u16) -> ModbusResult<()> {
    if count == 0 || index.checked_add(count - 1).is_some() {
        Ok(())
    } else {
        Err(ModbusError::Range)
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_read_coils: DEFAULT_MAX_READ_COILS,
            max_read_registers: DEFAULT_MAX_READ_REGISTERS,
            max_write_coils: DEFAULT_MAX_WRITE_COILS,
            max_write_registers: DEFAULT_MAX_WRITE_REGISTERS,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = RequestLimits::default();
        assert_eq!(limits.max_read_coils, 2000);
        assert_eq!(limits.max_read_registers, 125);
        assert_eq!(limits.max_write_coils, 1968);
        assert_eq!(limits.max_write_registers, 123);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let limits = RequestLimits::new()
            .with_max_read_registers(60)
            .with_max_write_registers(40);

        assert_eq!(limits.max_read_registers, 60);
        assert_eq!(limits.max_write_registers, 40);
        assert!(RequestLimits::conservative().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_protocol_limits() {
        let too_big = RequestLimits::new().with_max_read_registers(126);
        assert_eq!(too_big.validate(), Err(ModbusError::Count));

        let zero = RequestLimits::new().with_max_write_coils(0);
        assert_eq!(zero.validate(), Err(ModbusError::Count));
    }

    #[test]
    fn test_check_count_and_range() {
        let limits = RequestLimits::new().with_max_read_registers(10);

        assert!(limits.check(FC_READ_HOLDING_REGISTERS, 0, 10).is_ok());
        assert_eq!(
            limits.check(FC_READ_HOLDING_REGISTERS, 0, 11),
            Err(ModbusError::Count)
        );
        assert_eq!(
            limits.check(FC_READ_INPUT_REGISTERS, 0, 0),
            Err(ModbusError::Count)
        );
        assert_eq!(
            limits.check(FC_READ_HOLDING_REGISTERS, 0xFFFF, 2),
            Err(ModbusError::Range)
        );
        assert!(limits.check(FC_READ_HOLDING_REGISTERS, 0xFFFF, 1).is_ok());
        assert_eq!(limits.check(0x05, 0, 1), Err(ModbusError::Function));
    }
}
