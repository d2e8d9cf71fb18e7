use std::fmt;

pub type BlobResult<T> = Result<T, BlobError>;

/// Errors surfaced by the object-store layer.
#[derive(Debug)]
pub enum BlobError {
    /// No object is stored under the key.
    NotFound { key: String },

    /// The upload payload contained no bytes.
    EmptyPayload,

    /// The store location URL could not be parsed.
    InvalidUri { uri: String, reason: String },

    /// No URL signer is configured for the target store.
    SigningUnavailable,

    /// Presigned URL generation failed.
    Presign { reason: String },

    /// The upload byte stream failed before completion.
    Stream { reason: String },

    /// Backing store I/O failure.
    Storage { source: object_store::Error },
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobError::NotFound { key } => write!(f, "object not found: {}", key),
            BlobError::EmptyPayload => write!(f, "payload is empty"),
            BlobError::InvalidUri { uri, reason } => {
                write!(f, "invalid store uri '{}': {}", uri, reason)
            }
            BlobError::SigningUnavailable => {
                write!(f, "no url signer configured for this store")
            }
            BlobError::Presign { reason } => {
                write!(f, "presigned url generation failed: {}", reason)
            }
            BlobError::Stream { reason } => {
                write!(f, "upload stream failed: {}", reason)
            }
            BlobError::Storage { source } => write!(f, "object store error: {}", source),
        }
    }
}

impl std::error::Error for BlobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlobError::Storage { source } => Some(source),
            _ => None,
        }
    }
}

impl From<object_store::Error> for BlobError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => BlobError::NotFound { key: path },
            _ => BlobError::Storage { source: err },
        }
    }
}

impl From<url::ParseError> for BlobError {
    fn from(err: url::ParseError) -> Self {
        BlobError::InvalidUri {
            uri: String::new(),
            reason: err.to_string(),
        }
    }
}
