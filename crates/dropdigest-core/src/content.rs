//! File content as produced by a read.

use serde::{Deserialize, Serialize};

/// How a file's content should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadMode {
    /// Untyped byte buffer.
    #[default]
    Binary,
    /// Decoded UTF-8 text.
    Text,
}

/// Content of one file, held only until it has been digested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Bytes(Vec<u8>),
    Text(String),
}

impl FileContent {
    /// Wrap raw bytes in the requested mode, decoding UTF-8 for text.
    pub fn from_bytes(bytes: Vec<u8>, mode: ReadMode) -> Result<Self, std::string::FromUtf8Error> {
        match mode {
            ReadMode::Binary => Ok(Self::Bytes(bytes)),
            ReadMode::Text => String::from_utf8(bytes).map(Self::Text),
        }
    }

    /// Raw bytes of the content, whichever mode it was read in.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    /// Length of the content in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Check if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The mode this content was read in.
    pub fn mode(&self) -> ReadMode {
        match self {
            Self::Bytes(_) => ReadMode::Binary,
            Self::Text(_) => ReadMode::Text,
        }
    }
}
