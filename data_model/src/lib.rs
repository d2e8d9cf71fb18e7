use std::fmt::{self, Display};

use jiff::Timestamp;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Separator between namespace and key in a composed storage key.
pub const STORAGE_KEY_SEPARATOR: &str = ":";

/// Prefix reserved for metadata record keys. Keeps the metadata keyspace
/// disjoint from the payload keyspace.
pub const METADATA_KEY_PREFIX: &str = "__meta:";

/// Content type applied when a request does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Characters percent-encoded when a namespace or key is embedded in a URL
/// path segment. Matches the conventional path-segment set, plus `%` so the
/// encoding stays reversible.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Returned when a namespace or key fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidIdentifier {
    pub field: &'static str,
}

impl Display for InvalidIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} must be a non-empty string", self.field)
    }
}

impl std::error::Error for InvalidIdentifier {}

/// Which physical object store holds a blob's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn from_public_flag(is_public: bool) -> Self {
        if is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// A validated `(namespace, key)` pair, the logical identity of a blob.
///
/// Components are opaque strings. They may contain the separator character;
/// the composed storage key is then ambiguous, which is an accepted
/// limitation of the addressing scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobKey {
    namespace: String,
    key: String,
}

impl BlobKey {
    pub fn new(
        namespace: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, InvalidIdentifier> {
        let namespace = namespace.into();
        let key = key.into();
        if namespace.is_empty() {
            return Err(InvalidIdentifier { field: "namespace" });
        }
        if key.is_empty() {
            return Err(InvalidIdentifier { field: "key" });
        }
        Ok(Self { namespace, key })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Physical object key under which the bytes are stored.
    pub fn storage_key(&self) -> String {
        format!("{}{}{}", self.namespace, STORAGE_KEY_SEPARATOR, self.key)
    }

    /// Key of the blob's metadata record.
    pub fn metadata_key(&self) -> String {
        format!(
            "{}{}{}{}",
            METADATA_KEY_PREFIX, self.namespace, STORAGE_KEY_SEPARATOR, self.key
        )
    }

    /// Gateway-relative download locator. Stable, carries no expiry;
    /// access control is whatever fronts the gateway.
    pub fn download_path(&self) -> String {
        format!(
            "/blob/download/{}/{}",
            encode_path_segment(&self.namespace),
            encode_path_segment(&self.key)
        )
    }
}

impl Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// The persisted descriptor of a blob.
///
/// Existence of this record is the authoritative signal that a blob exists.
/// The bytes may lag behind it on the presigned-upload path, and `size` /
/// `content_type` are the values declared at write time, never re-measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    pub namespace: String,
    pub key: String,
    pub size: u64,
    pub content_type: String,
    /// When the metadata record was written, not when the bytes landed.
    #[schema(value_type = String)]
    pub uploaded_at: Timestamp,
    /// Immutable for the life of the record. Selects the physical store.
    pub is_public: bool,
}

impl BlobMetadata {
    pub fn visibility(&self) -> Visibility {
        Visibility::from_public_flag(self.is_public)
    }
}
