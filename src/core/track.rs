use serde::{Deserialize, Serialize};

/// Unit separator between track blocks in a read-track payload
pub const TRACK_DELIMITER: u8 = 0x1F;

/// Leading byte of a block that carries track data
pub const TRACK_SENTINEL: u8 = 0x59;

/// Decoded magnetic-stripe tracks. A track without data is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track3: Option<String>,
}

impl TrackData {
    /// Number of tracks that carried data
    pub fn present_count(&self) -> usize {
        [&self.track1, &self.track2, &self.track3]
            .iter()
            .filter(|t| t.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }
}

/// Split a read-track payload into its three tracks.
///
/// Only the first `declared_len` bytes of `buffer` are looked at. Everything
/// before the first delimiter is a status prefix and is skipped.
pub fn parse_tracks(buffer: &[u8], declared_len: usize) -> TrackData {
    let valid = if declared_len > buffer.len() {
        log::warn!(
            "Track payload declares {} bytes but only {} were returned",
            declared_len,
            buffer.len()
        );
        buffer
    } else {
        &buffer[..declared_len]
    };

    let mut blocks = valid.split(|&b| b == TRACK_DELIMITER).skip(1);

    TrackData {
        track1: blocks.next().and_then(track_text),
        track2: blocks.next().and_then(track_text),
        track3: blocks.next().and_then(track_text),
    }
}

fn track_text(block: &[u8]) -> Option<String> {
    match block.split_first() {
        Some((&TRACK_SENTINEL, payload)) => Some(String::from_utf8_lossy(payload).into_owned()),
        _ => None,
    }
}
