//! Built-in master request builders
//!
//! Each builder sizes the request buffer through the allocator and fills its
//! PDU view. They are transport-agnostic: run them between a
//! `begin_request_*` / `end_request_*` pair, or through
//! [`ModbusMaster::build_rtu_request`] and friends.

use crate::allocator::BufferAllocator;
use crate::bytes::write_bit;
use crate::constants::{
    COIL_OFF, COIL_ON, FC_MASK_WRITE_REGISTER, FC_READ_COILS, FC_READ_DISCRETE_INPUTS,
    FC_READ_HOLDING_REGISTERS, FC_READ_INPUT_REGISTERS, FC_WRITE_MULTIPLE_COILS,
    FC_WRITE_MULTIPLE_REGISTERS, FC_WRITE_SINGLE_COIL, FC_WRITE_SINGLE_REGISTER,
};
use crate::error::{ModbusError, ModbusResult};
use crate::master::ModbusMaster;
use crate::pdu::PduWriter;

impl<C, A: BufferAllocator> ModbusMaster<C, A> {
    /// Allocate a PDU of `pdu_len` bytes and fill it with `write`.
    ///
    /// Custom builders for function codes outside the built-in set can use
    /// this too. The PDU must be filled exactly.
    pub fn write_request<F>(&mut self, pdu_len: usize, write: F) -> ModbusResult<()>
    where
        F: FnOnce(&mut PduWriter<'_>) -> ModbusResult<()>,
    {
        self.allocate_request(pdu_len)?;
        let pdu = self.request.pdu_mut().ok_or(ModbusError::Alloc)?;
        let mut writer = PduWriter::new(pdu);
        write(&mut writer)?;
        writer.finish()
    }

    /// Read request for function codes 1 to 4: `[fc, index, count]`.
    pub fn build_request_01020304(
        &mut self,
        function: u8,
        index: u16,
        count: u16,
    ) -> ModbusResult<()> {
        if !matches!(
            function,
            FC_READ_COILS | FC_READ_DISCRETE_INPUTS | FC_READ_HOLDING_REGISTERS | FC_READ_INPUT_REGISTERS
        ) {
            return Err(ModbusError::Function);
        }
        self.limits.check(function, index, count)?;

        self.write_request(5, |w| {
            w.push(function)?.push_u16(index)?.push_u16(count)?;
            Ok(())
        })
    }

    /// Read coils (FC01).
    pub fn build_request_01(&mut self, index: u16, count: u16) -> ModbusResult<()> {
        self.build_request_01020304(FC_READ_COILS, index, count)
    }

    /// Read discrete inputs (FC02).
    pub fn build_request_02(&mut self, index: u16, count: u16) -> ModbusResult<()> {
        self.build_request_01020304(FC_READ_DISCRETE_INPUTS, index, count)
    }

    /// Read holding registers (FC03).
    pub fn build_request_03(&mut self, index: u16, count: u16) -> ModbusResult<()> {
        self.build_request_01020304(FC_READ_HOLDING_REGISTERS, index, count)
    }

    /// Read input registers (FC04).
    pub fn build_request_04(&mut self, index: u16, count: u16) -> ModbusResult<()> {
        self.build_request_01020304(FC_READ_INPUT_REGISTERS, index, count)
    }

    /// Write single coil (FC05). `true` is sent as 0xFF00.
    pub fn build_request_05(&mut self, index: u16, value: bool) -> ModbusResult<()> {
        let value = if value { COIL_ON } else { COIL_OFF };
        self.write_request(5, |w| {
            w.push(FC_WRITE_SINGLE_COIL)?.push_u16(index)?.push_u16(value)?;
            Ok(())
        })
    }

    /// Write single register (FC06).
    pub fn build_request_06(&mut self, index: u16, value: u16) -> ModbusResult<()> {
        self.write_request(5, |w| {
            w.push(FC_WRITE_SINGLE_REGISTER)?
                .push_u16(index)?
                .push_u16(value)?;
            Ok(())
        })
    }

    /// Write multiple coils (FC15). Bits are packed LSB first.
    pub fn build_request_15(&mut self, index: u16, values: &[bool]) -> ModbusResult<()> {
        let count = u16::try_from(values.len()).map_err(|_| ModbusError::Count)?;
        self.limits.check(FC_WRITE_MULTIPLE_COILS, index, count)?;

        let byte_count = u8::try_from(values.len().div_ceil(8)).map_err(|_| ModbusError::Count)?;
        self.write_request(6 + usize::from(byte_count), |w| {
            w.push(FC_WRITE_MULTIPLE_COILS)?
                .push_u16(index)?
                .push_u16(count)?
                .push(byte_count)?;
            for chunk in values.chunks(8) {
                let mut packed = [0u8];
                for (bit, &on) in chunk.iter().enumerate() {
                    write_bit(&mut packed, bit, on);
                }
                w.push(packed[0])?;
            }
            Ok(())
        })
    }

    /// Write multiple registers (FC16).
    pub fn build_request_16(&mut self, index: u16, values: &[u16]) -> ModbusResult<()> {
        let count = u16::try_from(values.len()).map_err(|_| ModbusError::Count)?;
        self.limits
            .check(FC_WRITE_MULTIPLE_REGISTERS, index, count)?;

        let byte_count = u8::try_from(values.len() * 2).map_err(|_| ModbusError::Count)?;
        self.write_request(6 + usize::from(byte_count), |w| {
            w.push(FC_WRITE_MULTIPLE_REGISTERS)?
                .push_u16(index)?
                .push_u16(count)?
                .push(byte_count)?;
            for &value in values {
                w.push_u16(value)?;
            }
            Ok(())
        })
    }

    /// Mask write register (FC22): `(current & and_mask) | (or_mask & !and_mask)`
    /// is applied by the slave.
    pub fn build_request_22(&mut self, index: u16, and_mask: u16, or_mask: u16) -> ModbusResult<()> {
        self.write_request(7, |w| {
            w.push(FC_MASK_WRITE_REGISTER)?
                .push_u16(index)?
                .push_u16(and_mask)?
                .push_u16(or_mask)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{BoundedAllocator, DefaultAllocator};
    use crate::limits::RequestLimits;
    use crate::master::DataCallbackArgs;

    fn ignore<A: BufferAllocator>(_: &mut ModbusMaster<(), A>, _: &DataCallbackArgs) {}

    fn master() -> ModbusMaster {
        ModbusMaster::new(DefaultAllocator, ignore, None)
    }

    fn pdu(m: &ModbusMaster) -> &[u8] {
        m.request().pdu().unwrap()
    }

    #[test]
    fn test_build_read_request() {
        let mut m = master();
        m.build_request_03(0x006B, 3).unwrap();
        assert_eq!(pdu(&m), &[0x03, 0x00, 0x6B, 0x00, 0x03]);

        m.build_request_02(0x00C4, 22).unwrap();
        assert_eq!(pdu(&m), &[0x02, 0x00, 0xC4, 0x00, 0x16]);
    }

    #[test]
    fn test_build_read_request_validation() {
        let mut m = master();
        assert_eq!(m.build_request_01020304(0x05, 0, 1), Err(ModbusError::Function));
        assert_eq!(m.build_request_03(0, 126), Err(ModbusError::Count));
        assert_eq!(m.build_request_01(0, 0), Err(ModbusError::Count));
        assert_eq!(m.build_request_04(0xFFF0, 0x20), Err(ModbusError::Range));
        assert!(m.build_request_01(0, 2000).is_ok());
    }

    #[test]
    fn test_limits_tighten_builders() {
        let mut m = master()
            .with_limits(RequestLimits::new().with_max_read_registers(10))
            .unwrap();
        assert_eq!(m.build_request_03(0, 11), Err(ModbusError::Count));
        assert!(m.build_request_03(0, 10).is_ok());
    }

    #[test]
    fn test_build_write_single_coil() {
        let mut m = master();
        m.build_request_05(0x00AC, true).unwrap();
        assert_eq!(pdu(&m), &[0x05, 0x00, 0xAC, 0xFF, 0x00]);
        m.build_request_05(0x00AC, false).unwrap();
        assert_eq!(pdu(&m), &[0x05, 0x00, 0xAC, 0x00, 0x00]);
    }

    #[test]
    fn test_build_write_single_register() {
        let mut m = master();
        m.build_request_06(0x0001, 0x0003).unwrap();
        assert_eq!(pdu(&m), &[0x06, 0x00, 0x01, 0x00, 0x03]);
    }

    #[test]
    fn test_build_write_multiple_coils() {
        let mut m = master();
        let coils = [
            true, false, true, true, false, false, true, true, true, false,
        ];
        m.build_request_15(0x0013, &coils).unwrap();
        assert_eq!(
            pdu(&m),
            &[0x0F, 0x00, 0x13, 0x00, 0x0A, 0x02, 0xCD, 0x01]
        );
        assert_eq!(m.build_request_15(0, &[]), Err(ModbusError::Count));
    }

    #[test]
    fn test_build_write_multiple_registers() {
        let mut m = master();
        m.build_request_16(0x0001, &[0x000A, 0x0102]).unwrap();
        assert_eq!(
            pdu(&m),
            &[0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02]
        );
        assert_eq!(
            m.build_request_16(0, &[0u16; 124]),
            Err(ModbusError::Count)
        );
    }

    #[test]
    fn test_oversize_write_rejected_at_protocol_ceiling() {
        let mut m = master();
        assert!(m
            .set_limits(RequestLimits::new().with_max_write_registers(200))
            .is_err());
        assert_eq!(m.build_request_16(0, &[0u16; 200]), Err(ModbusError::Count));
        assert!(!m.request().is_allocated());

        let full = [0x1234u16; 123];
        m.build_request_16(0, &full).unwrap();
        let pdu = pdu(&m);
        assert_eq!(pdu.len(), 6 + 246);
        assert_eq!(pdu[5], 246);
    }

    #[test]
    fn test_build_mask_write_register() {
        let mut m = master();
        m.build_request_22(0x0004, 0x00F2, 0x0025).unwrap();
        assert_eq!(pdu(&m), &[0x16, 0x00, 0x04, 0x00, 0xF2, 0x00, 0x25]);
    }

    #[test]
    fn test_builder_reports_allocation_failure() {
        let mut m = ModbusMaster::new(BoundedAllocator::new(6), ignore, None);
        m.begin_request_rtu();
        assert_eq!(m.build_request_03(0, 1), Err(ModbusError::Alloc));
        assert!(!m.request().is_allocated());

        m.begin_request_pdu();
        assert!(m.build_request_03(0, 1).is_ok());
    }
}
