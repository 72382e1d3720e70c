use std::time::Duration;

/// Default serial port the device enumerates on.
pub const SWEEP_DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default bitrate of the device's serial interface.
pub const SWEEP_DEFAULT_BITRATE: u32 = 115200;

/// Default timeout duration for waiting for responses from the device.
pub const SWEEP_DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on the packets consumed for one rotation, skipped samples
/// included, before giving up on ever seeing the next sync marker.
pub const SWEEP_MAX_SCAN_PACKETS: usize = 4096;
