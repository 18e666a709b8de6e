use std::fmt;

use serde::{Deserialize, Serialize};

const MIN_LEN: usize = 10;
const MAX_LEN: usize = 20;

/// Identifier of an image hosted by the upstream photo API.
///
/// Only ids made of ASCII letters, digits, `-` and `_` with a length of
/// 10 to 20 characters are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid image id")]
pub struct InvalidImageId;

impl ImageId {
    pub fn parse(value: &str) -> Result<Self, InvalidImageId> {
        let valid_len = (MIN_LEN..=MAX_LEN).contains(&value.len());
        let valid_chars = value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid_len && valid_chars {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidImageId)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ImageId {
    type Error = InvalidImageId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImageId> for String {
    fn from(id: ImageId) -> Self {
        id.0
    }
}
