use std::fmt;

/// Any failure surfaced by the crate.
#[derive(Debug)]
pub enum SfxError {
    Decode(DecodeError),
    Graph(GraphError),
    Store(StoreError),
    Io(std::io::Error),
}

/// Failure to turn an import token back into a snapshot.
#[derive(Debug)]
pub enum DecodeError {
    Base64(base64::DecodeError),
    Utf8(std::string::FromUtf8Error),
    Json(serde_json::Error),
    NotAnObject,
}

/// The snapshot cannot be turned into a synthesis graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    InvalidVoiceCount { voices: f64 },
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
    NoSuchPreset { index: usize, len: usize },
    UnknownPreset { name: String },
    NoDataDir,
}

impl fmt::Display for SfxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SfxError::Decode(e) => write!(f, "Decode error: {e}"),
            SfxError::Graph(e) => write!(f, "Graph error: {e}"),
            SfxError::Store(e) => write!(f, "Store error: {e}"),
            SfxError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for SfxError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Base64(e) => write!(f, "invalid base64: {e}"),
            DecodeError::Utf8(e) => write!(f, "token is not UTF-8 text: {e}"),
            DecodeError::Json(e) => write!(f, "invalid snapshot JSON: {e}"),
            DecodeError::NotAnObject => write!(f, "snapshot JSON must be an object"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::InvalidVoiceCount { voices } => {
                write!(f, "voice count must be at least 1, got {voices}")
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Json(e) => write!(f, "invalid stored JSON: {e}"),
            StoreError::NoSuchPreset { index, len } => {
                write!(f, "no preset at index {index} (list has {len})")
            }
            StoreError::UnknownPreset { name } => write!(f, "no preset named {name:?}"),
            StoreError::NoDataDir => write!(f, "could not locate a data directory"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<base64::DecodeError> for DecodeError {
    fn from(e: base64::DecodeError) -> Self {
        DecodeError::Base64(e)
    }
}

impl From<std::string::FromUtf8Error> for DecodeError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        DecodeError::Utf8(e)
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Json(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

impl From<DecodeError> for SfxError {
    fn from(e: DecodeError) -> Self {
        SfxError::Decode(e)
    }
}

impl From<GraphError> for SfxError {
    fn from(e: GraphError) -> Self {
        SfxError::Graph(e)
    }
}

impl From<StoreError> for SfxError {
    fn from(e: StoreError) -> Self {
        SfxError::Store(e)
    }
}

impl From<std::io::Error> for SfxError {
    fn from(e: std::io::Error) -> Self {
        SfxError::Io(e)
    }
}
