//! Open-mode token classification.
//!
//! Maps `fopen`-style mode tokens onto the contract an open session must
//! honor. Five primary letters are recognized:
//!
//! | Letter | Meaning | Create | Truncate | Must exist | Append |
//! |--------|---------|--------|----------|------------|--------|
//! | `r` | open existing only | no | no | yes | no |
//! | `w` | create or replace, start empty | yes | yes | no | no |
//! | `a` | create or open, writes go to end | yes | no | no | yes |
//! | `x` | open only if not already existing | no | no | must not | no |
//! | `c` | open or create, preserve content | yes | no | no | no |
//!
//! A `+` modifier forces [`AccessClass::ReadWrite`]; without it, `r` is
//! read-only and everything else is write-only. The `t` and `b` flavor
//! characters are accepted and ignored.

use crate::{AccessClass, BlobFsError};

/// The contract derived from an open-mode token.
///
/// Classification is a pure function: the same token always yields the
/// same contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenMode {
    /// What the handle may do with its buffer.
    pub access: AccessClass,
    /// Create the object on flush when no version exists.
    pub create: bool,
    /// Start from an empty buffer even when a version exists.
    pub truncate: bool,
    /// Fail the open with `NotFound` when no version exists.
    pub must_exist: bool,
    /// Fail the open with `AlreadyExists` when a version exists.
    pub must_not_exist: bool,
    /// Every write lands at end-of-buffer regardless of cursor.
    pub append: bool,
}

impl OpenMode {
    /// Classify a raw mode token.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::UnknownMode`] when the primary letter is not one of
    /// `r`, `w`, `a`, `x`, `c`.
    pub fn classify(token: &str) -> Result<Self, BlobFsError> {
        let extended = token.contains('+');
        let primary: String = token.chars().filter(|c| !"tb+".contains(*c)).collect();

        let mut mode = match primary.as_str() {
            "r" => Self {
                access: AccessClass::ReadOnly,
                create: false,
                truncate: false,
                must_exist: true,
                must_not_exist: false,
                append: false,
            },
            "w" => Self {
                access: AccessClass::WriteOnly,
                create: true,
                truncate: true,
                must_exist: false,
                must_not_exist: false,
                append: false,
            },
            "a" => Self {
                access: AccessClass::WriteOnly,
                create: true,
                truncate: false,
                must_exist: false,
                must_not_exist: false,
                append: true,
            },
            "x" => Self {
                access: AccessClass::WriteOnly,
                create: false,
                truncate: false,
                must_exist: false,
                must_not_exist: true,
                append: false,
            },
            "c" => Self {
                access: AccessClass::WriteOnly,
                create: true,
                truncate: false,
                must_exist: false,
                must_not_exist: false,
                append: false,
            },
            _ => {
                return Err(BlobFsError::UnknownMode {
                    token: token.to_string(),
                });
            }
        };

        if extended {
            mode.access = AccessClass::ReadWrite;
        }

        Ok(mode)
    }
}
