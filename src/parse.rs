//! # Response Parsing
//!
//! Validation runs outside-in and stops at the first violation:
//!
//! 1. Transport framing: RTU length, CRC and address, or TCP length,
//!    protocol id, transaction id and declared length.
//! 2. PDU: exception frames go to the exception callback, otherwise the
//!    function codes must agree and the dispatch table picks the parser.
//! 3. The parser validates the payload against the request and reports data.
//!
//! Every error is local to the call. The engine stays usable afterwards and
//! nothing is retried.

use tracing::{debug, warn};

use crate::allocator::BufferAllocator;
use crate::bytes::read_be16;
use crate::constants::{
    EXCEPTION_FLAG, MAX_MBAP_LENGTH, MBAP_HEADER_LEN, RTU_MIN_FRAME_LEN, TCP_MIN_FRAME_LEN,
    TCP_PADDING,
};
use crate::crc::check_frame_crc;
use crate::error::{ModbusError, ModbusResult};
use crate::exception::ModbusException;
use crate::master::ModbusMaster;
use crate::pdu::{function_code_description, is_exception_pdu};

/// Check both RTU frames and return the slave address.
fn check_rtu_frames(request: &[u8], response: &[u8]) -> ModbusResult<u8> {
    if request.len() < RTU_MIN_FRAME_LEN || response.len() < RTU_MIN_FRAME_LEN {
        return Err(ModbusError::Length);
    }

    if !check_frame_crc(request) || !check_frame_crc(response) {
        return Err(ModbusError::Crc);
    }

    let address = request[0];
    if address == 0 || address != response[0] {
        return Err(ModbusError::Address);
    }
    Ok(address)
}

/// Check both MBAP headers and return the responding unit id.
fn check_tcp_frames(request: &[u8], response: &[u8]) -> ModbusResult<u8> {
    if request.len() < TCP_MIN_FRAME_LEN || response.len() < TCP_MIN_FRAME_LEN {
        return Err(ModbusError::Length);
    }

    if read_be16(&request[2..]) != 0 || read_be16(&response[2..]) != 0 {
        return Err(ModbusError::BadProtocol);
    }

    if read_be16(&request[0..]) != read_be16(&response[0..]) {
        return Err(ModbusError::BadTransaction);
    }

    let declared_ok = |frame: &[u8]| {
        let declared = usize::from(read_be16(&frame[4..]));
        declared <= MAX_MBAP_LENGTH && declared == frame.len() - MBAP_HEADER_LEN
    };
    if !declared_ok(request) || !declared_ok(response) {
        return Err(ModbusError::Length);
    }

    // Unit ids are not cross-checked: MBAP correlates by transaction id
    Ok(response[6])
}

impl<C, A: BufferAllocator> ModbusMaster<C, A> {
    /// Parse the PDU of a response from slave `address` against the PDU of
    /// the request that produced it.
    ///
    /// A two-byte response with the high bit set on its function code is an
    /// exception frame: it is passed to the exception callback (if any) and
    /// the call succeeds.
    pub fn parse_response_pdu(
        &mut self,
        address: u8,
        request: &[u8],
        response: &[u8],
    ) -> ModbusResult<()> {
        let (Some(&request_fc), Some(&function)) = (request.first(), response.first()) else {
            return Err(ModbusError::Length);
        };

        if is_exception_pdu(response) {
            let exception = ModbusException::from(response[1]);
            let original = function & !EXCEPTION_FLAG;
            debug!(
                "Exception from {}: FC={:02X} ({}), {}",
                address,
                original,
                function_code_description(original),
                exception
            );
            self.emit_exception(address, original, exception);
            return Ok(());
        }

        if function != request_fc {
            warn!(
                "Function code mismatch: request {:02X}, response {:02X}",
                request_fc, function
            );
            return Err(ModbusError::Function);
        }

        let Some(parse) = self.functions.find(function) else {
            warn!("No parser registered for FC={:02X}", function);
            return Err(ModbusError::Function);
        };
        parse(self, address, function, request, response)
    }

    /// Parse an RTU response frame against its RTU request frame.
    ///
    /// Checks lengths, both CRCs, and that the request is not a broadcast
    /// and the addresses agree, then parses the PDUs.
    pub fn parse_response_rtu(&mut self, request: &[u8], response: &[u8]) -> ModbusResult<()> {
        let address = check_rtu_frames(request, response).inspect_err(|e| {
            warn!("RTU response rejected: {}", e);
        })?;

        self.parse_response_pdu(
            address,
            &request[1..request.len() - 2],
            &response[1..response.len() - 2],
        )
    }

    /// Parse a TCP response frame against its TCP request frame.
    ///
    /// Checks lengths, protocol ids, transaction ids and the declared MBAP
    /// lengths, then parses the PDUs with the response unit id as address.
    pub fn parse_response_tcp(&mut self, request: &[u8], response: &[u8]) -> ModbusResult<()> {
        let address = check_tcp_frames(request, response).inspect_err(|e| {
            warn!("TCP response rejected: {}", e);
        })?;

        self.parse_response_pdu(address, &request[TCP_PADDING..], &response[TCP_PADDING..])
    }

    /// [`parse_response_pdu`](Self::parse_response_pdu) against the PDU of
    /// the request currently held by the engine, whatever envelope it was
    /// built in.
    pub fn parse_pending_response_pdu(&mut self, address: u8, response: &[u8]) -> ModbusResult<()> {
        let pdu = self.request.pdu_range().ok_or(ModbusError::Length)?;
        self.with_pending_request(|m, request| m.parse_response_pdu(address, &request[pdu], response))
    }

    /// [`parse_response_rtu`](Self::parse_response_rtu) against the request
    /// currently held by the engine.
    pub fn parse_pending_response_rtu(&mut self, response: &[u8]) -> ModbusResult<()> {
        self.with_pending_request(|m, request| m.parse_response_rtu(request, response))
    }

    /// [`parse_response_tcp`](Self::parse_response_tcp) against the request
    /// currently held by the engine.
    pub fn parse_pending_response_tcp(&mut self, response: &[u8]) -> ModbusResult<()> {
        self.with_pending_request(|m, request| m.parse_response_tcp(request, response))
    }

    /// Detach the request frame for the duration of `f` so parsers and
    /// callbacks can borrow the engine mutably.
    ///
    /// Callbacks must not build a new request while a pending response is
    /// being parsed: the detached frame is put back afterwards.
    fn with_pending_request<F>(&mut self, f: F) -> ModbusResult<()>
    where
        F: FnOnce(&mut Self, &[u8]) -> ModbusResult<()>,
    {
        let request = std::mem::take(&mut self.request.data);
        let result = f(self, &request);
        self.request.data = request;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::DefaultAllocator;
    use crate::crc::crc16;
    use crate::master::DataCallbackArgs;

    #[derive(Debug, Default)]
    struct Seen {
        data: Vec<u16>,
        exceptions: Vec<(u8, u8, ModbusException)>,
    }

    fn on_data(m: &mut ModbusMaster<Seen>, args: &DataCallbackArgs) {
        m.context_mut().data.push(args.value);
    }

    fn on_exception(m: &mut ModbusMaster<Seen>, address: u8, function: u8, code: ModbusException) {
        m.context_mut().exceptions.push((address, function, code));
    }

    fn master() -> ModbusMaster<Seen> {
        ModbusMaster::new(DefaultAllocator, on_data, Some(on_exception))
    }

    fn rtu(body: &[u8]) -> Vec<u8> {
        let mut frame = body.to_vec();
        frame.extend_from_slice(&crc16(body).to_le_bytes());
        frame
    }

    fn tcp(transaction: u16, unit: u8, pdu: &[u8]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&transaction.to_be_bytes());
        frame.extend_from_slice(&[0, 0]);
        frame.extend_from_slice(&(pdu.len() as u16 + 1).to_be_bytes());
        frame.push(unit);
        frame.extend_from_slice(pdu);
        frame
    }

    const READ_REQ: [u8; 5] = [0x03, 0x00, 0x00, 0x00, 0x01];
    const READ_RSP: [u8; 4] = [0x03, 0x02, 0x12, 0x34];

    #[test]
    fn test_pdu_empty_frames() {
        let mut m = master();
        assert_eq!(m.parse_response_pdu(1, &[], &READ_RSP), Err(ModbusError::Length));
        assert_eq!(m.parse_response_pdu(1, &READ_REQ, &[]), Err(ModbusError::Length));
    }

    #[test]
    fn test_pdu_exception_routing() {
        let mut m = master();
        m.parse_response_pdu(7, &READ_REQ, &[0x83, 0x02]).unwrap();
        assert_eq!(
            m.context().exceptions,
            vec![(7, 0x03, ModbusException::IllegalDataAddress)]
        );
        assert!(m.context().data.is_empty());
    }

    #[test]
    fn test_pdu_exception_without_callback_is_ok() {
        fn ignore(_: &mut ModbusMaster, _: &DataCallbackArgs) {}
        let mut m = ModbusMaster::new(DefaultAllocator, ignore, None);
        assert!(m.parse_response_pdu(1, &READ_REQ, &[0x83, 0x02]).is_ok());
    }

    #[test]
    fn test_pdu_long_exception_is_function_mismatch() {
        let mut m = master();
        assert_eq!(
            m.parse_response_pdu(1, &READ_REQ, &[0x83, 0x02, 0x00]),
            Err(ModbusError::Function)
        );
        assert!(m.context().exceptions.is_empty());
    }

    #[test]
    fn test_pdu_unsupported_function() {
        let mut m = master();
        m.functions_mut().remove(0x03);
        assert_eq!(
            m.parse_response_pdu(1, &READ_REQ, &READ_RSP),
            Err(ModbusError::Function)
        );
        assert_eq!(
            m.parse_response_pdu(1, &[0x04], &READ_RSP),
            Err(ModbusError::Function)
        );
    }

    #[test]
    fn test_rtu_round_trip() {
        let mut m = master();
        let request = rtu(&[0x11, 0x03, 0x00, 0x00, 0x00, 0x01]);
        let response = rtu(&[0x11, 0x03, 0x02, 0x12, 0x34]);
        m.parse_response_rtu(&request, &response).unwrap();
        assert_eq!(m.context().data, vec![0x1234]);
    }

    #[test]
    fn test_rtu_checks_in_order() {
        let mut m = master();
        let request = rtu(&[0x11, 0x03, 0x00, 0x00, 0x00, 0x01]);

        assert_eq!(
            m.parse_response_rtu(&request, &[0x11, 0x03, 0x00]),
            Err(ModbusError::Length)
        );

        let mut bad_crc = rtu(&[0x11, 0x03, 0x02, 0x12, 0x34]);
        bad_crc[3] ^= 0x40;
        assert_eq!(
            m.parse_response_rtu(&request, &bad_crc),
            Err(ModbusError::Crc)
        );

        let other_slave = rtu(&[0x12, 0x03, 0x02, 0x12, 0x34]);
        assert_eq!(
            m.parse_response_rtu(&request, &other_slave),
            Err(ModbusError::Address)
        );

        let broadcast = rtu(&[0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        let broadcast_rsp = rtu(&[0x00, 0x03, 0x02, 0x12, 0x34]);
        assert_eq!(
            m.parse_response_rtu(&broadcast, &broadcast_rsp),
            Err(ModbusError::Address)
        );
    }

    #[test]
    fn test_rtu_request_crc_checked_too() {
        let mut m = master();
        let mut request = rtu(&[0x11, 0x03, 0x00, 0x00, 0x00, 0x01]);
        request[7] ^= 0xFF;
        let response = rtu(&[0x11, 0x03, 0x02, 0x12, 0x34]);
        assert_eq!(
            m.parse_response_rtu(&request, &response),
            Err(ModbusError::Crc)
        );
    }

    #[test]
    fn test_tcp_round_trip() {
        let mut m = master();
        let request = tcp(0x0102, 1, &READ_REQ);
        let response = tcp(0x0102, 1, &READ_RSP);
        m.parse_response_tcp(&request, &response).unwrap();
        assert_eq!(m.context().data, vec![0x1234]);
    }

    #[test]
    fn test_tcp_header_checks() {
        let mut m = master();
        let request = tcp(5, 1, &READ_REQ);

        assert_eq!(
            m.parse_response_tcp(&request, &request[..7]),
            Err(ModbusError::Length)
        );

        let mut bad_protocol = tcp(5, 1, &READ_RSP);
        bad_protocol[3] = 1;
        assert_eq!(
            m.parse_response_tcp(&request, &bad_protocol),
            Err(ModbusError::BadProtocol)
        );

        assert_eq!(
            m.parse_response_tcp(&request, &tcp(6, 1, &READ_RSP)),
            Err(ModbusError::BadTransaction)
        );

        let mut bad_length = tcp(5, 1, &READ_RSP);
        bad_length[5] += 1;
        assert_eq!(
            m.parse_response_tcp(&request, &bad_length),
            Err(ModbusError::Length)
        );
    }

    #[test]
    fn test_tcp_unit_id_taken_from_response() {
        let mut m = master();
        let request = tcp(9, 1, &READ_REQ);
        let response = tcp(9, 0x2A, &[0x83, 0x04]);
        m.parse_response_tcp(&request, &response).unwrap();
        assert_eq!(
            m.context().exceptions,
            vec![(0x2A, 0x03, ModbusException::ServerDeviceFailure)]
        );
    }

    #[test]
    fn test_pending_request_is_restored() {
        let mut m = master();
        m.build_tcp_request(3, 1, |m| m.build_request_03(0, 1)).unwrap();
        let sent = m.request().frame().to_vec();

        m.parse_pending_response_tcp(&tcp(3, 1, &READ_RSP)).unwrap();
        assert_eq!(m.context().data, vec![0x1234]);
        assert_eq!(m.request().frame(), sent.as_slice());

        assert_eq!(
            m.parse_pending_response_tcp(&tcp(4, 1, &READ_RSP)),
            Err(ModbusError::BadTransaction)
        );
        assert_eq!(m.request().frame(), sent.as_slice());
    }

    #[test]
    fn test_pending_pdu_parse_skips_envelope() {
        let mut m = master();
        assert_eq!(
            m.parse_pending_response_pdu(0x11, &READ_RSP),
            Err(ModbusError::Length)
        );

        m.build_rtu_request(0x11, |m| m.build_request_03(0, 1)).unwrap();
        m.parse_pending_response_pdu(0x11, &READ_RSP).unwrap();
        assert_eq!(m.context().data, vec![0x1234]);

        m.build_tcp_request(1, 0x11, |m| m.build_request_03(0, 1)).unwrap();
        m.parse_pending_response_pdu(0x11, &READ_RSP).unwrap();

        m.build_pdu_request(|m| m.build_request_03(0, 1)).unwrap();
        m.parse_pending_response_pdu(0x11, &READ_RSP).unwrap();
        assert_eq!(m.context().data, vec![0x1234; 3]);
    }

    #[test]
    fn test_tcp_declared_length_bounded() {
        fn accept_any(
            _: &mut ModbusMaster<Seen>,
            _: u8,
            _: u8,
            _: &[u8],
            _: &[u8],
        ) -> ModbusResult<()> {
            Ok(())
        }

        let mut m = master();
        m.functions_mut().prepend(0x03, accept_any);
        let request = tcp(1, 1, &READ_REQ);
        assert!(m.parse_response_tcp(&request, &tcp(1, 1, &[0x03; 253])).is_ok());

        // Consistent with the frame, but longer than any MBAP length
        let response = tcp(1, 1, &[0x03; 300]);
        assert_eq!(
            m.parse_response_tcp(&request, &response),
            Err(ModbusError::Length)
        );
    }
}
