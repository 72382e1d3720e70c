//! # Sweep Driver
//!
//! `sweep` is a driver for Scanse Sweep 360 degree laser scanners.
//! It speaks the device's line based serial protocol and provides high-level access to
//! starting/stopping the acquisition stream, collecting whole rotations of samples,
//! and reading or adjusting the motor speed and sample rate.

extern crate byteorder;
extern crate log;
extern crate serialport;

pub mod base;
mod cmds;
mod internals;
mod protocol;
pub mod types;

pub use crate::base::{Channel, Error, Result};
pub use crate::types::{DeviceState, Sample, Scan};

use crate::cmds::*;
use crate::internals::*;
use crate::protocol::*;
use log::{error, trace, warn};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};

/// Major version of the driver interface. Bumped on incompatible changes.
pub const SWEEP_VERSION_MAJOR: i32 = 1;

/// Minor version of the driver interface. Bumped on compatible extensions.
pub const SWEEP_VERSION_MINOR: i32 = 3;

/// Returns the driver interface version, major in the high 16 bits and minor in the low 16 bits.
pub fn version() -> i32 {
    (SWEEP_VERSION_MAJOR << 16) | SWEEP_VERSION_MINOR
}

/// Returns `true` when the major component of `version()` matches the major
/// version this crate was compiled with.
pub fn is_abi_compatible() -> bool {
    version_major(version()) == SWEEP_VERSION_MAJOR
}

/// Major component of a packed interface version.
fn version_major(version: i32) -> i32 {
    version >> 16
}

/// Represents a connection to and control interface for a Sweep device.
///
/// The session tracks whether the acquisition stream is running and refuses
/// operations that make no sense in the current state. Every command is
/// validated against the device's echoed confirmation before the session
/// changes state. Dropping the device closes the underlying stream.
#[derive(Debug)]
pub struct SweepDevice<T: ?Sized> {
    channel: Channel<T>,
    state: DeviceState,
    motor_speed: Option<i32>,
    cached_sync_sample: Option<Sample>,
}

impl SweepDevice<dyn SerialPort> {
    /// Opens a serial port and constructs a device session over it.
    ///
    /// The port is configured for the device's 8N1 framing with no flow
    /// control and a one second read timeout.
    ///
    /// # Arguments
    ///
    /// * `port` - The serial port the device is attached to (e.g. "/dev/ttyUSB0").
    /// * `bitrate` - The bitrate of the serial link. The device runs at 115200.
    ///
    /// # Example
    /// ```ignore
    /// let mut device = sweep::SweepDevice::open("/dev/ttyUSB0", 115200)?;
    /// ```
    pub fn open(port: &str, bitrate: u32) -> Result<SweepDevice<dyn SerialPort>> {
        trace!("Opening device on {} at {} baud", port, bitrate);
        if bitrate == 0 {
            error!("Rejecting bitrate 0 for {}", port);
            return Err(Error::ArgumentError {
                description: "invalid bitrate: 0".to_owned(),
            });
        }

        let stream = serialport::new(port, bitrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(SWEEP_DEFAULT_TIMEOUT)
            .open()?;
        trace!("Opened serial port {} at {} baud", port, bitrate);

        Ok(SweepDevice::with_stream(stream))
    }

    /// Opens a device session on the default port (`/dev/ttyUSB0`) at the
    /// default bitrate.
    pub fn open_default() -> Result<SweepDevice<dyn SerialPort>> {
        trace!("Opening device on the default port");
        SweepDevice::open(SWEEP_DEFAULT_PORT, SWEEP_DEFAULT_BITRATE)
    }
}

impl<T: ?Sized> SweepDevice<T>
where
    T: Read + Write,
{
    /// Constructs a device session from an existing byte stream.
    ///
    /// The session starts out idle with no cached motor speed.
    ///
    /// # Arguments
    ///
    /// * `stream` - A boxed `Read + Write` object carrying the device's serial protocol.
    ///
    /// # Example
    /// ```ignore
    /// let serial_port = serialport::new("/dev/ttyUSB0", 115200).open()?;
    /// let mut device = sweep::SweepDevice::with_stream(serial_port);
    /// ```
    pub fn with_stream(stream: Box<T>) -> SweepDevice<T> {
        trace!("Creating new SweepDevice with stream");
        SweepDevice {
            channel: Channel::new(stream),
            state: DeviceState::Idle,
            motor_speed: None,
            cached_sync_sample: None,
        }
    }

    /// The session's view of the device's scanning state.
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Returns `true` while the acquisition stream is running.
    pub fn is_scanning(&self) -> bool {
        self.state == DeviceState::Scanning
    }

    /// The last motor speed setting observed on this session, in Hz.
    ///
    /// Populated by `get_motor_speed` and successful `set_motor_speed` calls
    /// and cleared by `reset`. Performs no I/O.
    pub fn cached_motor_speed(&self) -> Option<i32> {
        self.motor_speed
    }

    /// Starts the acquisition stream.
    ///
    /// Sends the start command and validates the device's confirmation before
    /// marking the session as scanning. Returns a `StateError` when the
    /// stream is already running.
    pub fn start_scanning(&mut self) -> Result<()> {
        trace!("Starting the acquisition stream");
        if self.state == DeviceState::Scanning {
            error!("start_scanning called while already scanning");
            return Err(Error::StateError {
                description: "device is already scanning".to_owned(),
            });
        }

        self.execute_command(SWEEP_CMD_DATA_ACQUISITION_START)?;
        self.state = DeviceState::Scanning;
        trace!("Acquisition stream started");
        Ok(())
    }

    /// Stops the acquisition stream.
    ///
    /// Returns a `StateError` when no stream is running. The session stays
    /// scanning if the device's confirmation cannot be validated. Any sample
    /// held over from the stopped stream is dropped.
    pub fn stop_scanning(&mut self) -> Result<()> {
        trace!("Stopping the acquisition stream");
        if self.state == DeviceState::Idle {
            error!("stop_scanning called while idle");
            return Err(Error::StateError {
                description: "device is not scanning".to_owned(),
            });
        }

        self.execute_command(SWEEP_CMD_DATA_ACQUISITION_STOP)?;
        self.state = DeviceState::Idle;
        self.cached_sync_sample = None;
        trace!("Acquisition stream stopped");
        Ok(())
    }

    /// Collects one full rotation of samples from the acquisition stream.
    ///
    /// Samples the device flagged as communication errors are skipped. The
    /// rotation ends at the sample carrying the next sync marker; that sample
    /// is held on the session and opens the rotation returned by the following
    /// call. One call consumes at most 4096 packets, skipped samples included,
    /// and returns whatever it has collected when that bound is reached. On
    /// error the partially collected rotation is discarded and the session
    /// remains scanning.
    ///
    /// Returns a `StateError` when the stream is not running.
    pub fn get_scan(&mut self) -> Result<Scan> {
        trace!("Collecting one rotation of samples");
        if self.state == DeviceState::Idle {
            error!("get_scan called while idle");
            return Err(Error::StateError {
                description: "device is not scanning".to_owned(),
            });
        }

        let mut samples: Vec<Sample> = Vec::with_capacity(SWEEP_MAX_SCAN_PACKETS);
        if let Some(sample) = self.cached_sync_sample.take() {
            trace!("Opening the rotation with the held sync sample");
            samples.push(sample);
        }
        let mut packets_read = 0;

        loop {
            let packet = self.read_scan_packet()?;
            packets_read += 1;

            if packet.has_communication_error() {
                warn!(
                    "Skipping sample flagged with communication error: {:02X}",
                    packet.sync_error
                );
            } else if packet.is_sync() && !samples.is_empty() {
                // first sample of the next rotation, held for the next call
                self.cached_sync_sample = Some(Sample {
                    angle: packet.angle_millidegrees(),
                    distance: packet.dist_cm as i32,
                    signal_strength: packet.signal_strength,
                });
                trace!("Rotation complete with {} samples", samples.len());
                break;
            } else {
                samples.push(Sample {
                    angle: packet.angle_millidegrees(),
                    distance: packet.dist_cm as i32,
                    signal_strength: packet.signal_strength,
                });
            }

            if packets_read >= SWEEP_MAX_SCAN_PACKETS {
                warn!(
                    "Read {} packets without completing a rotation, returning {} samples early",
                    packets_read,
                    samples.len()
                );
                break;
            }
        }

        Ok(Scan::new(samples))
    }

    /// Reads the device's current motor speed in Hz.
    ///
    /// Also refreshes the session's cached motor speed setting.
    pub fn get_motor_speed(&mut self) -> Result<i32> {
        trace!("Getting motor speed");
        self.write_command(SWEEP_CMD_MOTOR_INFORMATION)?;
        self.read_response_header(SWEEP_CMD_MOTOR_INFORMATION)?;
        let speed = self.read_response_param()?.as_decimal()?;
        trace!("Device reports motor speed {} Hz", speed);
        self.motor_speed = Some(speed);
        Ok(speed)
    }

    /// Adjusts the device's motor speed.
    ///
    /// The speed argument is validated before any I/O happens, and the cached
    /// motor speed is updated only once the device confirms the adjustment.
    ///
    /// # Arguments
    ///
    /// * `speed` - The desired motor speed in Hz. The device supports 0 to 10.
    pub fn set_motor_speed(&mut self, speed: i32) -> Result<()> {
        trace!("Setting motor speed to {} Hz", speed);
        let args = speed_code(speed)?;
        self.execute_command_with_args(SWEEP_CMD_MOTOR_SPEED_ADJUST, args)?;
        self.motor_speed = Some(speed);
        trace!("Motor speed set to {} Hz", speed);
        Ok(())
    }

    /// Reads the device's current sample rate in Hz.
    pub fn get_sample_rate(&mut self) -> Result<i32> {
        trace!("Getting sample rate");
        self.write_command(SWEEP_CMD_SAMPLE_RATE_INFORMATION)?;
        self.read_response_header(SWEEP_CMD_SAMPLE_RATE_INFORMATION)?;
        let code = self.read_response_param()?.as_decimal()?;
        let rate = sample_rate_from_code(code)?;
        trace!("Device reports sample rate {} Hz", rate);
        Ok(rate)
    }

    /// Adjusts the device's sample rate.
    ///
    /// The rate argument is validated before any I/O happens.
    ///
    /// # Arguments
    ///
    /// * `rate` - The desired sample rate in Hz. The device supports 500, 750 and 1000.
    pub fn set_sample_rate(&mut self, rate: i32) -> Result<()> {
        trace!("Setting sample rate to {} Hz", rate);
        let args = sample_rate_code(rate)?;
        self.execute_command_with_args(SWEEP_CMD_SAMPLE_RATE_ADJUST, args)?;
        trace!("Sample rate set to {} Hz", rate);
        Ok(())
    }

    /// Resets the device.
    ///
    /// The device reboots and comes back up idle, so the session returns to
    /// the idle state and forgets its cached motor speed and any sample held
    /// over from the previous acquisition.
    pub fn reset(&mut self) -> Result<()> {
        trace!("Resetting device");
        self.execute_command(SWEEP_CMD_RESET_DEVICE)?;
        self.state = DeviceState::Idle;
        self.motor_speed = None;
        self.cached_sync_sample = None;
        trace!("Device reset");
        Ok(())
    }

    /// send a command without argument
    fn write_command(&mut self, cmd: &[u8; 2]) -> Result<()> {
        trace!("Sending command {}{}", cmd[0] as char, cmd[1] as char);
        self.channel.write_exact(&encode_command(cmd))
    }

    /// send a command with a two byte argument
    fn write_command_with_args(&mut self, cmd: &[u8; 2], args: &[u8; 2]) -> Result<()> {
        trace!(
            "Sending command {}{} with args {}{}",
            cmd[0] as char,
            cmd[1] as char,
            args[0] as char,
            args[1] as char
        );
        self.channel.write_exact(&encode_command_with_args(cmd, args))
    }

    /// read a response header and validate its checksum and echoed opcode
    fn read_response_header(&mut self, cmd: &[u8; 2]) -> Result<ResponseHeader> {
        let mut bytes = [0u8; SWEEP_RESPONSE_HEADER_SIZE];
        self.channel.read_exact(&mut bytes)?;
        let header = ResponseHeader::decode(&bytes)?;
        if !header.matches_command(cmd) {
            error!(
                "Unexpected response opcode: expected {}{}, got {}{}",
                cmd[0] as char,
                cmd[1] as char,
                header.cmd_byte1 as char,
                header.cmd_byte2 as char
            );
            return Err(Error::ProtocolError {
                description: format!(
                    "unexpected response opcode: expected {}{}, got {}{}",
                    cmd[0] as char,
                    cmd[1] as char,
                    header.cmd_byte1 as char,
                    header.cmd_byte2 as char
                ),
            });
        }
        trace!(
            "Validated response header for {}{}",
            cmd[0] as char,
            cmd[1] as char
        );
        Ok(header)
    }

    /// read the two byte parameter of an information response
    fn read_response_param(&mut self) -> Result<ResponseParam> {
        let mut bytes = [0u8; SWEEP_RESPONSE_PARAM_SIZE];
        self.channel.read_exact(&mut bytes)?;
        Ok(ResponseParam::decode(&bytes))
    }

    /// read and validate one sample packet from the acquisition stream
    fn read_scan_packet(&mut self) -> Result<ScanPacket> {
        let mut bytes = [0u8; SWEEP_SCAN_PACKET_SIZE];
        self.channel.read_exact(&mut bytes)?;
        ScanPacket::decode(&bytes)
    }

    /// full round trip of a command without argument
    fn execute_command(&mut self, cmd: &[u8; 2]) -> Result<()> {
        self.write_command(cmd)?;
        self.read_response_header(cmd)?;
        Ok(())
    }

    /// full round trip of a command with a two byte argument
    fn execute_command_with_args(&mut self, cmd: &[u8; 2], args: &[u8; 2]) -> Result<()> {
        self.write_command_with_args(cmd, args)?;
        self.read_response_header(cmd)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_packs_major_and_minor() {
        let packed = version();
        assert_eq!(packed >> 16, SWEEP_VERSION_MAJOR);
        assert_eq!(packed & 0xFFFF, SWEEP_VERSION_MINOR);
    }

    #[test]
    fn abi_check_compares_the_major_component() {
        assert!(is_abi_compatible());

        assert_eq!(
            version_major((SWEEP_VERSION_MAJOR << 16) | 0x1234),
            SWEEP_VERSION_MAJOR
        );
        assert_ne!(
            version_major(((SWEEP_VERSION_MAJOR + 1) << 16) | SWEEP_VERSION_MINOR),
            SWEEP_VERSION_MAJOR
        );
    }
}
