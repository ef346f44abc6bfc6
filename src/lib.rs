/// CRT Bridge - protocol layer for CRT-310 style card terminals
///
/// This library translates between host-side hex strings and the raw buffers
/// of a magnetic-stripe / IC card terminal, splits track payloads, and reports
/// every device operation through one uniform `DeviceResult`.
pub mod core;

// Re-export commonly used types
pub use crate::core::{
    apdu::{status_word, ApduReply, ApduRequest},
    config::TerminalConfig,
    device::{ApduProtocol, DeviceDriver, DeviceHandle, EjectMode, NativeReply, Operation, OutBuffer},
    hex::{hex_to_str, str_to_hex, HexError, PadSide, PaddingSpec},
    result::{normalize, DeviceResult, OperationError, StatusResult, STATUS_FAILED, STATUS_OK},
    terminal::{CardDetection, CardTerminal, ErrorCodeInfo, OpenInfo, PositionStatus, ResetInfo},
    track::{parse_tracks, TrackData, TRACK_DELIMITER, TRACK_SENTINEL},
};

// Common error type
pub type Result<T> = anyhow::Result<T>;
