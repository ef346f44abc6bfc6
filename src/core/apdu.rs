use serde::{Deserialize, Serialize};

use crate::core::device::OutBuffer;
use crate::core::hex::{hex_to_str, str_to_hex, HexError, PaddingSpec};

/// An encoded command ready for the transmit call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduRequest {
    bytes: Vec<u8>,
}

impl ApduRequest {
    /// Encode a hex command body. Odd lengths get a trailing zero nibble.
    pub fn from_hex(command_hex: &str) -> Result<Self, HexError> {
        let bytes = str_to_hex(command_hex, &PaddingSpec::none())?;
        Ok(Self { bytes })
    }

    /// Length parameter sent alongside the buffer
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Decoded response of an APDU exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApduReply {
    /// Uppercase hex of the response, status trailer included
    pub ex_data: String,
}

impl ApduReply {
    /// Decode the valid prefix of the device's output buffer
    pub fn from_output(output: &OutBuffer) -> Self {
        Self {
            ex_data: hex_to_str(output.valid()),
        }
    }
}

/// Trailing SW1/SW2 of a hex-encoded response, if it holds at least two bytes.
///
/// Interpreting the trailer is up to the caller.
pub fn status_word(response_hex: &str) -> Option<(u8, u8)> {
    if response_hex.len() < 4 || !response_hex.is_ascii() {
        return None;
    }
    let trailer = &response_hex[response_hex.len() - 4..];
    let sw = str_to_hex(trailer, &PaddingSpec::none()).ok()?;
    Some((sw[0], sw[1]))
}
