//! # Transport Envelopes
//!
//! Each transport contributes a `begin_request_*` / `end_request_*` pair:
//!
//! | Transport | Begin (pdu offset, padding) | End stamps |
//! |-----------|-----------------------------|------------|
//! | PDU | (0, 0) | nothing |
//! | RTU | (1, 3) | slave address, CRC16 (little-endian) |
//! | TCP | (7, 7) | MBAP header: transaction id, protocol id 0, length, unit id |
//!
//! Begin only configures the request layout; it allocates nothing. Any PDU
//! builder then runs against the PDU view without knowing which transport is
//! active, and End finalizes the envelope around it.
//!
//! End takes the builder's result as an explicit argument and returns it
//! untouched if it is an error, so finalizing never masks a build failure.

use tracing::debug;

use crate::allocator::BufferAllocator;
use crate::bytes::{write_be16, write_le16};
use crate::constants::{
    MBAP_HEADER_LEN, RTU_MIN_FRAME_LEN, RTU_PADDING, RTU_PDU_OFFSET, TCP_PADDING,
};
use crate::crc::crc16;
use crate::error::{ModbusError, ModbusResult};
use crate::master::ModbusMaster;

impl<C, A: BufferAllocator> ModbusMaster<C, A> {
    /// Configure the request layout for a bare PDU.
    pub fn begin_request_pdu(&mut self) -> &mut Self {
        self.request.set_layout(0, 0);
        self
    }

    /// Finalize a bare PDU request.
    ///
    /// Returns `result` if it is an error, [`ModbusError::Length`] if no PDU
    /// was written, `Ok` otherwise.
    pub fn end_request_pdu(&mut self, result: ModbusResult<()>) -> ModbusResult<()> {
        result?;
        if self.request.is_empty() {
            return Err(ModbusError::Length);
        }
        Ok(())
    }

    /// Configure the request layout for an RTU frame.
    pub fn begin_request_rtu(&mut self) -> &mut Self {
        self.request.set_layout(RTU_PDU_OFFSET, RTU_PADDING);
        self
    }

    /// Finalize an RTU request: stamp the slave address in byte 0 and the
    /// CRC16 of everything before the trailer into the last two bytes.
    pub fn end_request_rtu(&mut self, address: u8, result: ModbusResult<()>) -> ModbusResult<()> {
        result?;
        let len = self.request.len();
        if len < RTU_MIN_FRAME_LEN {
            return Err(ModbusError::Length);
        }

        let frame = self.request.frame_mut();
        frame[0] = address;
        let crc = crc16(&frame[..len - 2]);
        write_le16(&mut frame[len - 2..], crc);

        debug!("RTU request finalized: address={}, len={}", address, len);
        Ok(())
    }

    /// Configure the request layout for a TCP (MBAP) frame.
    pub fn begin_request_tcp(&mut self) -> &mut Self {
        self.request.set_layout(TCP_PADDING, TCP_PADDING);
        self
    }

    /// Finalize a TCP request: stamp the MBAP header in the first seven bytes.
    pub fn end_request_tcp(
        &mut self,
        transaction: u16,
        unit: u8,
        result: ModbusResult<()>,
    ) -> ModbusResult<()> {
        result?;
        let len = self.request.len();
        if len < TCP_PADDING {
            return Err(ModbusError::Length);
        }
        let declared = u16::try_from(len - MBAP_HEADER_LEN).map_err(|_| ModbusError::Length)?;

        let frame = self.request.frame_mut();
        write_be16(&mut frame[0..], transaction);
        write_be16(&mut frame[2..], 0);
        write_be16(&mut frame[4..], declared);
        frame[6] = unit;

        debug!(
            "TCP request finalized: transaction={}, unit={}, len={}",
            transaction, unit, len
        );
        Ok(())
    }

    /// Build a bare PDU request: begin, run `build`, end.
    pub fn build_pdu_request<F>(&mut self, build: F) -> ModbusResult<()>
    where
        F: FnOnce(&mut Self) -> ModbusResult<()>,
    {
        let result = build(self.begin_request_pdu());
        self.end_request_pdu(result)
    }

    /// Build an RTU request for `address`: begin, run `build`, end.
    ///
    /// ```rust
    /// use voltage_modbus_master::{DataCallbackArgs, DefaultAllocator, ModbusMaster};
    ///
    /// fn ignore(_: &mut ModbusMaster, _: &DataCallbackArgs) {}
    ///
    /// let mut master = ModbusMaster::new(DefaultAllocator, ignore, None);
    /// master
    ///     .build_rtu_request(0x01, |m| m.build_request_03(0x0000, 10))
    ///     .unwrap();
    /// assert_eq!(
    ///     master.request().frame(),
    ///     &[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD]
    /// );
    /// ```
    pub fn build_rtu_request<F>(&mut self, address: u8, build: F) -> ModbusResult<()>
    where
        F: FnOnce(&mut Self) -> ModbusResult<()>,
    {
        let result = build(self.begin_request_rtu());
        self.end_request_rtu(address, result)
    }

    /// Build a TCP request: begin, run `build`, end.
    pub fn build_tcp_request<F>(&mut self, transaction: u16, unit: u8, build: F) -> ModbusResult<()>
    where
        F: FnOnce(&mut Self) -> ModbusResult<()>,
    {
        let result = build(self.begin_request_tcp());
        self.end_request_tcp(transaction, unit, result)
    }
}
