//! Coded-frame classification.
//!
//! Decoders report the picture type of each decoded frame as a single tag
//! byte (`b'I'`, `b'P'`, `b'B'`, `b'?'`, ...). [`FrameType`] folds that signal
//! into the closed set the sampler searches over.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use thiserror::Error;

/// Picture type of an encoded video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameType {
    /// Bi-directionally predicted frame. This is the default search target.
    #[default]
    B,
    /// Intra-coded frame.
    I,
    /// Predicted frame.
    P,
    /// Any picture type the decoder could not, or did not, classify.
    Unknown,
}

impl FrameType {
    /// All variants in display order.
    pub const ALL: [FrameType; 4] = [FrameType::B, FrameType::I, FrameType::P, FrameType::Unknown];

    /// Classify a raw picture-type tag.
    ///
    /// Unrecognized tags map to [`FrameType::Unknown`]; classification never
    /// fails.
    ///
    /// ```
    /// use frame_compare::FrameType;
    ///
    /// assert_eq!(FrameType::from_tag(b'I'), FrameType::I);
    /// assert_eq!(FrameType::from_tag(b'?'), FrameType::Unknown);
    /// assert_eq!(FrameType::from_tag(b'S'), FrameType::Unknown);
    /// ```
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            b'B' => FrameType::B,
            b'I' => FrameType::I,
            b'P' => FrameType::P,
            _ => FrameType::Unknown,
        }
    }

    /// The canonical tag byte for this frame type.
    pub fn tag(self) -> u8 {
        match self {
            FrameType::B => b'B',
            FrameType::I => b'I',
            FrameType::P => b'P',
            FrameType::Unknown => b'?',
        }
    }

    /// Human-readable name, e.g. `"B-Type"`.
    pub fn name(self) -> &'static str {
        match self {
            FrameType::B => "B-Type",
            FrameType::I => "I-Type",
            FrameType::P => "P-Type",
            FrameType::Unknown => "Unknown",
        }
    }
}

impl Display for FrameType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Error returned when parsing a [`FrameType`] from an unrecognized string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown frame type '{0}' (expected B-Type, I-Type, P-Type or Unknown)")]
pub struct ParseFrameTypeError(String);

impl FromStr for FrameType {
    type Err = ParseFrameTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "b-type" | "b" => Ok(FrameType::B),
            "i-type" | "i" => Ok(FrameType::I),
            "p-type" | "p" => Ok(FrameType::P),
            "unknown" | "?" => Ok(FrameType::Unknown),
            _ => Err(ParseFrameTypeError(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FrameType;

    #[test]
    fn tags_round_trip_through_classification() {
        for frame_type in FrameType::ALL {
            assert_eq!(FrameType::from_tag(frame_type.tag()), frame_type);
        }
    }

    #[test]
    fn numeric_codes_match_ascii_tags() {
        assert_eq!(FrameType::from_tag(66), FrameType::B);
        assert_eq!(FrameType::from_tag(73), FrameType::I);
        assert_eq!(FrameType::from_tag(80), FrameType::P);
        assert_eq!(FrameType::from_tag(63), FrameType::Unknown);
        assert_eq!(FrameType::from_tag(0), FrameType::Unknown);
    }

    #[test]
    fn parse_accepts_names_and_short_forms() {
        assert_eq!("B-Type".parse::<FrameType>().unwrap(), FrameType::B);
        assert_eq!("i-type".parse::<FrameType>().unwrap(), FrameType::I);
        assert_eq!("P".parse::<FrameType>().unwrap(), FrameType::P);
        assert_eq!("Unknown".parse::<FrameType>().unwrap(), FrameType::Unknown);
        assert!("S-Type".parse::<FrameType>().is_err());
    }

    #[test]
    fn parse_error_names_the_input() {
        let error = "S-Type".parse::<FrameType>().unwrap_err();
        assert_eq!(
            error.to_string(),
            "unknown frame type 'S-Type' (expected B-Type, I-Type, P-Type or Unknown)"
        );
        let boxed: Box<dyn std::error::Error> = Box::new(error);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn display_uses_names() {
        assert_eq!(FrameType::B.to_string(), "B-Type");
        assert_eq!(FrameType::Unknown.to_string(), "Unknown");
    }
}
