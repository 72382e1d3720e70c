use crate::base::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::error;

/// Line feed terminating every command on the wire.
const SWEEP_COMMAND_TERMINATOR: u8 = b'\n';

/// Bit of the sync/error byte marking the first sample of a rotation.
const SWEEP_SCAN_SYNC_BIT: u8 = 0x01;

/// The size of an encoded command without argument.
pub const SWEEP_COMMAND_SIZE: usize = 3;

/// The size of an encoded command carrying a two byte argument.
pub const SWEEP_COMMAND_WITH_ARGS_SIZE: usize = 5;

/// The size of a response header.
pub const SWEEP_RESPONSE_HEADER_SIZE: usize = 5;

/// The size of the parameter following the header of information responses.
pub const SWEEP_RESPONSE_PARAM_SIZE: usize = 2;

/// The size of one sample packet of the acquisition stream.
pub const SWEEP_SCAN_PACKET_SIZE: usize = 7;

/// Encodes a command without argument: the two opcode bytes and the terminator.
pub fn encode_command(cmd: &[u8; 2]) -> [u8; SWEEP_COMMAND_SIZE] {
    [cmd[0], cmd[1], SWEEP_COMMAND_TERMINATOR]
}

/// Encodes a command with a two byte argument between opcode and terminator.
pub fn encode_command_with_args(
    cmd: &[u8; 2],
    args: &[u8; 2],
) -> [u8; SWEEP_COMMAND_WITH_ARGS_SIZE] {
    [cmd[0], cmd[1], args[0], args[1], SWEEP_COMMAND_TERMINATOR]
}

/// Checksum of a response header: the sum of both status bytes folded into
/// six bits and biased into printable ASCII.
///
/// Status pairs whose sums agree modulo 64 collide, so a corruption that
/// preserves the folded sum goes undetected. The device protocol accepts
/// this; the checksum guards against line noise, nothing stronger.
pub fn response_checksum(status1: u8, status2: u8) -> u8 {
    ((status1 as u16 + status2 as u16) & 0x3F) as u8 + 0x30
}

/// Checksum of a scan sample: the byte sum of everything before it, modulo 255.
pub fn scan_packet_checksum(bytes: &[u8]) -> u8 {
    let sum: u32 = bytes.iter().map(|b| u32::from(*b)).sum();
    (sum % 255) as u8
}

/// The five byte header opening every command response: the echoed opcode,
/// two status bytes and their checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub cmd_byte1: u8,
    pub cmd_byte2: u8,
    pub status_byte1: u8,
    pub status_byte2: u8,
    pub checksum: u8,
}

impl ResponseHeader {
    /// Decodes a header, verifying its status checksum.
    pub fn decode(bytes: &[u8; SWEEP_RESPONSE_HEADER_SIZE]) -> Result<ResponseHeader> {
        let header = ResponseHeader {
            cmd_byte1: bytes[0],
            cmd_byte2: bytes[1],
            status_byte1: bytes[2],
            status_byte2: bytes[3],
            checksum: bytes[4],
        };

        let calculated = response_checksum(header.status_byte1, header.status_byte2);
        if header.checksum != calculated {
            error!(
                "Response header checksum mismatch: received {:02X}, calculated {:02X}",
                header.checksum, calculated
            );
            return Err(Error::ProtocolError {
                description: "invalid response header checksum".to_owned(),
            });
        }

        Ok(header)
    }

    /// Returns `true` when the header echoes the given command opcode.
    #[inline]
    pub fn matches_command(&self, cmd: &[u8; 2]) -> bool {
        self.cmd_byte1 == cmd[0] && self.cmd_byte2 == cmd[1]
    }
}

/// The two byte parameter following the header of information responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseParam {
    pub param_byte1: u8,
    pub param_byte2: u8,
}

impl ResponseParam {
    pub fn decode(bytes: &[u8; SWEEP_RESPONSE_PARAM_SIZE]) -> ResponseParam {
        ResponseParam {
            param_byte1: bytes[0],
            param_byte2: bytes[1],
        }
    }

    /// Reads the parameter as the two digit ASCII decimal the device sends.
    pub fn as_decimal(&self) -> Result<i32> {
        if !self.param_byte1.is_ascii_digit() || !self.param_byte2.is_ascii_digit() {
            error!(
                "Response parameter is not a decimal: {:02X} {:02X}",
                self.param_byte1, self.param_byte2
            );
            return Err(Error::ProtocolError {
                description: format!(
                    "invalid decimal response parameter: {:02X} {:02X}",
                    self.param_byte1, self.param_byte2
                ),
            });
        }

        Ok(((self.param_byte1 - b'0') as i32) * 10 + (self.param_byte2 - b'0') as i32)
    }
}

/// A single seven byte sample from the acquisition stream.
///
/// The wire layout is a sync/error byte, the angle in the device's 12.4
/// fixed point degrees (little endian), the distance in centimeters
/// (little endian), a signal strength byte and an additive checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPacket {
    /// Bit 0 flags the first sample of a rotation, bits 1 to 7 flag communication errors.
    pub sync_error: u8,
    /// Angle in degrees in Q4 fixed point format.
    pub angle_deg_q4: u16,
    /// Distance in centimeters.
    pub dist_cm: u16,
    /// Signal strength indicator of the measurement (0-255).
    pub signal_strength: u8,
}

impl ScanPacket {
    /// Decodes a sample packet, verifying its checksum.
    pub fn decode(bytes: &[u8; SWEEP_SCAN_PACKET_SIZE]) -> Result<ScanPacket> {
        let calculated = scan_packet_checksum(&bytes[..6]);
        if bytes[6] != calculated {
            error!(
                "Scan packet checksum mismatch: received {:02X}, calculated {:02X}",
                bytes[6], calculated
            );
            return Err(Error::ProtocolError {
                description: "invalid scan packet checksum".to_owned(),
            });
        }

        Ok(ScanPacket {
            sync_error: bytes[0],
            angle_deg_q4: LittleEndian::read_u16(&bytes[1..3]),
            dist_cm: LittleEndian::read_u16(&bytes[3..5]),
            signal_strength: bytes[5],
        })
    }

    /// Returns `true` when this sample opens a new rotation.
    #[inline]
    pub fn is_sync(&self) -> bool {
        (self.sync_error & SWEEP_SCAN_SYNC_BIT) == SWEEP_SCAN_SYNC_BIT
    }

    /// Returns `true` when the device flagged a communication error for this sample.
    #[inline]
    pub fn has_communication_error(&self) -> bool {
        (self.sync_error & !SWEEP_SCAN_SYNC_BIT) != 0
    }

    /// Angle in milli-degrees, expanded from the Q4 fixed point value.
    #[inline]
    pub fn angle_millidegrees(&self) -> i32 {
        let degrees = (self.angle_deg_q4 >> 4) as i32;
        let sixteenths = (self.angle_deg_q4 & 0x0F) as i32;
        degrees * 1000 + sixteenths * 1000 / 16
    }
}

/// The two digit wire code for a motor speed setting, indexed in Hz.
pub fn speed_code(speed: i32) -> Result<&'static [u8; 2]> {
    let code: &'static [u8; 2] = match speed {
        0 => b"00",
        1 => b"01",
        2 => b"02",
        3 => b"03",
        4 => b"04",
        5 => b"05",
        6 => b"06",
        7 => b"07",
        8 => b"08",
        9 => b"09",
        10 => b"10",
        _ => {
            error!("Unsupported motor speed: {} Hz", speed);
            return Err(Error::ArgumentError {
                description: format!("invalid motor speed: {} Hz (supported: 0 to 10)", speed),
            });
        }
    };
    Ok(code)
}

/// The two digit wire code for a sample rate setting, indexed in Hz.
pub fn sample_rate_code(rate: i32) -> Result<&'static [u8; 2]> {
    match rate {
        500 => Ok(b"01"),
        750 => Ok(b"02"),
        1000 => Ok(b"03"),
        _ => {
            error!("Unsupported sample rate: {} Hz", rate);
            Err(Error::ArgumentError {
                description: format!(
                    "invalid sample rate: {} Hz (supported: 500, 750, 1000)",
                    rate
                ),
            })
        }
    }
}

/// The sample rate in Hz behind a rate code reported by the device.
pub fn sample_rate_from_code(code: i32) -> Result<i32> {
    match code {
        1 => Ok(500),
        2 => Ok(750),
        3 => Ok(1000),
        _ => {
            error!("Unknown sample rate code: {}", code);
            Err(Error::ProtocolError {
                description: format!("unknown sample rate code: {}", code),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(cmd: &[u8; 2], status: &[u8; 2]) -> [u8; SWEEP_RESPONSE_HEADER_SIZE] {
        [
            cmd[0],
            cmd[1],
            status[0],
            status[1],
            response_checksum(status[0], status[1]),
        ]
    }

    fn packet_bytes(
        sync_error: u8,
        angle_deg_q4: u16,
        dist_cm: u16,
        signal: u8,
    ) -> [u8; SWEEP_SCAN_PACKET_SIZE] {
        let mut bytes = [sync_error, 0, 0, 0, 0, signal, 0];
        LittleEndian::write_u16(&mut bytes[1..3], angle_deg_q4);
        LittleEndian::write_u16(&mut bytes[3..5], dist_cm);
        bytes[6] = scan_packet_checksum(&bytes[..6]);
        bytes
    }

    #[test]
    fn command_encode() {
        assert_eq!(encode_command(b"DS"), [0x44, 0x53, 0x0A]);
        assert_eq!(encode_command(b"MI"), [0x4D, 0x49, 0x0A]);

        assert_eq!(
            encode_command_with_args(b"MS", b"05"),
            [0x4D, 0x53, 0x30, 0x35, 0x0A]
        );
        assert_eq!(
            encode_command_with_args(b"LR", b"03"),
            [0x4C, 0x52, 0x30, 0x33, 0x0A]
        );
    }

    #[test]
    fn response_checksum_is_deterministic() {
        assert_eq!(response_checksum(b'0', b'0'), response_checksum(b'0', b'0'));
        // "00" status: 0x30 + 0x30 = 0x60, folded to 0x20, biased to 'P'
        assert_eq!(response_checksum(b'0', b'0'), b'P');
    }

    #[test]
    fn response_checksum_detects_changed_sums() {
        let reference = response_checksum(b'0', b'0');
        assert_ne!(response_checksum(b'1', b'0'), reference);
        assert_ne!(response_checksum(b'0', b'1'), reference);
    }

    #[test]
    fn response_checksum_collides_when_folded_sum_is_preserved() {
        // the six bit fold makes any +64 shift invisible
        assert_eq!(response_checksum(0x00, 0x40), response_checksum(0x00, 0x00));
        assert_eq!(response_checksum(0x40, 0x12), response_checksum(0x00, 0x12));
    }

    #[test]
    fn header_decode_accepts_valid_bytes() {
        let header = ResponseHeader::decode(&header_bytes(b"DS", b"00")).unwrap();
        assert_eq!(header.cmd_byte1, b'D');
        assert_eq!(header.cmd_byte2, b'S');
        assert!(header.matches_command(b"DS"));
        assert!(!header.matches_command(b"DX"));
    }

    #[test]
    fn header_decode_rejects_corrupted_status() {
        let mut bytes = header_bytes(b"DS", b"00");
        bytes[2] ^= 0x01;
        assert!(matches!(
            ResponseHeader::decode(&bytes),
            Err(Error::ProtocolError { .. })
        ));
    }

    #[test]
    fn param_decodes_ascii_decimals() {
        assert_eq!(ResponseParam::decode(b"00").as_decimal().unwrap(), 0);
        assert_eq!(ResponseParam::decode(b"07").as_decimal().unwrap(), 7);
        assert_eq!(ResponseParam::decode(b"10").as_decimal().unwrap(), 10);
    }

    #[test]
    fn param_rejects_non_digits() {
        assert!(matches!(
            ResponseParam::decode(b"A5").as_decimal(),
            Err(Error::ProtocolError { .. })
        ));
        assert!(matches!(
            ResponseParam::decode(b"5\n").as_decimal(),
            Err(Error::ProtocolError { .. })
        ));
    }

    #[test]
    fn scan_packet_decode() {
        let packet = ScanPacket::decode(&packet_bytes(0x01, 1440, 250, 199)).unwrap();
        assert!(packet.is_sync());
        assert!(!packet.has_communication_error());
        assert_eq!(packet.angle_deg_q4, 1440);
        assert_eq!(packet.dist_cm, 250);
        assert_eq!(packet.signal_strength, 199);
    }

    #[test]
    fn scan_packet_decode_rejects_corrupted_checksum() {
        let mut bytes = packet_bytes(0x00, 1440, 250, 199);
        bytes[6] = bytes[6].wrapping_add(1);
        assert!(matches!(
            ScanPacket::decode(&bytes),
            Err(Error::ProtocolError { .. })
        ));
    }

    #[test]
    fn scan_packet_flags() {
        let errored = ScanPacket::decode(&packet_bytes(0x02, 0, 0, 0)).unwrap();
        assert!(errored.has_communication_error());
        assert!(!errored.is_sync());

        // an error flag does not hide the sync bit
        let both = ScanPacket::decode(&packet_bytes(0x03, 0, 0, 0)).unwrap();
        assert!(both.has_communication_error());
        assert!(both.is_sync());
    }

    #[test]
    fn scan_packet_angle_conversion() {
        // 90 degrees flat: 90 << 4
        let packet = ScanPacket::decode(&packet_bytes(0x00, 90 << 4, 0, 0)).unwrap();
        assert_eq!(packet.angle_millidegrees(), 90_000);

        // 1 + 8/16 degrees
        let packet = ScanPacket::decode(&packet_bytes(0x00, (1 << 4) | 8, 0, 0)).unwrap();
        assert_eq!(packet.angle_millidegrees(), 1_500);

        // fractional sixteenths truncate: 1/16 degree is 62.5 milli-degrees
        let packet = ScanPacket::decode(&packet_bytes(0x00, 1, 0, 0)).unwrap();
        assert_eq!(packet.angle_millidegrees(), 62);
    }

    #[test]
    fn speed_codes_cover_the_supported_range() {
        let mut seen = Vec::new();
        for speed in 0..=10 {
            let code = speed_code(speed).unwrap();
            assert!(code.iter().all(|b| b.is_ascii_digit()));
            assert!(!seen.contains(&code), "duplicate code for {} Hz", speed);
            seen.push(code);
        }
        assert_eq!(speed_code(0).unwrap(), b"00");
        assert_eq!(speed_code(10).unwrap(), b"10");
    }

    #[test]
    fn speed_code_rejects_out_of_range_values() {
        assert!(matches!(
            speed_code(-1),
            Err(Error::ArgumentError { .. })
        ));
        assert!(matches!(
            speed_code(11),
            Err(Error::ArgumentError { .. })
        ));
    }

    #[test]
    fn sample_rate_codes_map_both_ways() {
        assert_eq!(sample_rate_code(500).unwrap(), b"01");
        assert_eq!(sample_rate_code(750).unwrap(), b"02");
        assert_eq!(sample_rate_code(1000).unwrap(), b"03");
        assert!(matches!(
            sample_rate_code(600),
            Err(Error::ArgumentError { .. })
        ));

        assert_eq!(sample_rate_from_code(1).unwrap(), 500);
        assert_eq!(sample_rate_from_code(2).unwrap(), 750);
        assert_eq!(sample_rate_from_code(3).unwrap(), 1000);
        assert!(matches!(
            sample_rate_from_code(4),
            Err(Error::ProtocolError { .. })
        ));
    }
}
