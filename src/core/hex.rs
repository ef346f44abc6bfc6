use thiserror::Error;

/// Errors raised while turning hex text into bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("Invalid hex digit '{character}' at position {position}")]
    InvalidHexDigit { character: char, position: usize },

    #[error("Padding target of {target_len} bytes cannot be allocated")]
    PaddingTooLarge { target_len: usize },
}

/// Side on which zero padding is injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadSide {
    Left,
    #[default]
    Right,
}

/// Zero padding applied before splitting hex text into bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaddingSpec {
    /// Desired output size in bytes. `None` only fixes odd lengths.
    pub target_len: Option<usize>,
    pub side: PadSide,
}

impl PaddingSpec {
    /// No padding beyond odd-length normalization
    pub fn none() -> Self {
        Self::default()
    }

    pub fn left(target_len: usize) -> Self {
        Self {
            target_len: Some(target_len),
            side: PadSide::Left,
        }
    }

    pub fn right(target_len: usize) -> Self {
        Self {
            target_len: Some(target_len),
            side: PadSide::Right,
        }
    }
}

/// Encode hex text into raw bytes.
///
/// An odd-length input gets one trailing `'0'` first. If the padding spec asks
/// for more bytes than the content provides, `'0'` characters are injected on
/// the requested side. Oversized input is never truncated. A target whose
/// buffer cannot be sized or allocated is rejected with `PaddingTooLarge`.
pub fn str_to_hex(input: &str, padding: &PaddingSpec) -> Result<Vec<u8>, HexError> {
    let digits = input.chars().count();
    let content_len = digits + digits % 2;
    let total_len = match padding.target_len {
        Some(target_len) => target_len
            .checked_mul(2)
            .ok_or(HexError::PaddingTooLarge { target_len })?
            .max(content_len),
        None => content_len,
    };
    let lead = match padding.side {
        PadSide::Left => total_len - content_len,
        PadSide::Right => 0,
    };

    // Padding characters are all '0', so a zeroed buffer already holds them.
    let mut out = Vec::new();
    out.try_reserve_exact(total_len / 2)
        .map_err(|_| HexError::PaddingTooLarge {
            target_len: total_len / 2,
        })?;
    out.resize(total_len / 2, 0u8);
    for (position, character) in input.chars().enumerate() {
        let nibble = character
            .to_digit(16)
            .ok_or(HexError::InvalidHexDigit {
                character,
                position,
            })? as u8;
        let slot = lead + position;
        if slot % 2 == 0 {
            out[slot / 2] |= nibble << 4;
        } else {
            out[slot / 2] |= nibble;
        }
    }

    Ok(out)
}

/// Render bytes as uppercase hex, two characters per byte, no separators
pub fn hex_to_str(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}
