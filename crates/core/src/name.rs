// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated event and user names.
//!
//! Events and users share one naming rule: ASCII letters and digits only,
//! 4 to 32 characters. Names are case-insensitive and fold to lowercase on
//! parse, so `Alice` and `alice` address the same world.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Minimum accepted name length.
pub const NAME_MIN_LEN: usize = 4;
/// Maximum accepted name length.
pub const NAME_MAX_LEN: usize = 32;

/// A validated, case-folded event or user name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Name(String);

/// Rejection reasons for [`Name::parse`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("name must be between {NAME_MIN_LEN} and {NAME_MAX_LEN} characters, got {0}")]
    Length(usize),

    #[error("name contains illegal character {0:?}")]
    IllegalChar(char),
}

impl Name {
    /// Validate `raw` and fold it to lowercase.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let len = raw.chars().count();
        if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
            return Err(NameError::Length(len));
        }
        if let Some(c) = raw.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(NameError::IllegalChar(c));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[path = "name_tests.rs"]
mod tests;
