//! Transmit slot variants and the `smartsense,txslots` annotation.

use core::fmt::{Display, Formatter};

/// Device-tree property listing the slots a node applies to.
pub const TXSLOTS_PROPERTY: &str = "smartsense,txslots";

/// Which physical transmit slot variant is populated.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TxSlot {
    /// Not detected, or the board has no strap.
    #[default]
    Unknown,
    A,
    B,
}

impl TxSlot {
    /// Position of the variant, starting at 1. `Unknown` is 0.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::A => 1,
            Self::B => 2,
        }
    }

    /// Tag this variant is listed under in an annotation.
    #[must_use]
    pub const fn letter(self) -> Option<u8> {
        slot_letter(self.ordinal())
    }

    /// Whether `annotation` lists this variant. `Unknown` matches nothing.
    #[must_use]
    pub fn is_listed_in(self, annotation: &[u8]) -> bool {
        self.letter()
            .is_some_and(|letter| annotation_lists(annotation, letter))
    }
}

impl Display for TxSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.letter() {
            Some(letter) => write!(f, "{}", char::from(letter.to_ascii_uppercase())),
            None => f.write_str("unknown"),
        }
    }
}

/// Maps slot ordinal `n` to `'a' + n - 1`.
#[must_use]
pub const fn slot_letter(ordinal: u8) -> Option<u8> {
    match ordinal {
        1..=26 => Some(b'a' + ordinal - 1),
        _ => None,
    }
}

/// Whether the NUL-terminated tag list `annotation` contains `letter`.
///
/// Tags are single characters, compared case-insensitively. Commas, spaces
/// and tabs between them are ignored.
#[must_use]
pub fn annotation_lists(annotation: &[u8], letter: u8) -> bool {
    annotation
        .iter()
        .take_while(|&&b| b != 0)
        .filter(|&&b| !matches!(b, b',' | b' ' | b'\t'))
        .any(|b| b.eq_ignore_ascii_case(&letter))
}
