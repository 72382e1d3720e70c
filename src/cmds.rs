// Commands without argument whose response is a bare confirmation header

/// Command code to start the data acquisition stream.
pub const SWEEP_CMD_DATA_ACQUISITION_START: &[u8; 2] = b"DS";

/// Command code to stop the data acquisition stream.
pub const SWEEP_CMD_DATA_ACQUISITION_STOP: &[u8; 2] = b"DX";

/// Command code to reset the device. The device reboots and comes back up idle.
pub const SWEEP_CMD_RESET_DEVICE: &[u8; 2] = b"RR";

// Commands without argument whose response carries a two byte parameter

/// Command code to query the current motor speed. The response parameter is the speed in Hz as two ASCII digits.
pub const SWEEP_CMD_MOTOR_INFORMATION: &[u8; 2] = b"MI";

/// Command code to query the current sample rate. The response parameter is a rate code from "01" to "03".
pub const SWEEP_CMD_SAMPLE_RATE_INFORMATION: &[u8; 2] = b"LI";

// Commands carrying a two byte argument

/// Command code to adjust the motor speed. Takes a two digit code from "00" to "10" (Hz).
pub const SWEEP_CMD_MOTOR_SPEED_ADJUST: &[u8; 2] = b"MS";

/// Command code to adjust the sample rate. Takes a two digit code from "01" to "03".
pub const SWEEP_CMD_SAMPLE_RATE_ADJUST: &[u8; 2] = b"LR";
