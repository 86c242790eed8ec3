use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The named resource was not found in any search directory.
    #[error("cmap resource not found: {0}")]
    ResourceNotFound(String),
    /// A resource file exists but its content could not be deserialized.
    #[error("invalid cmap resource {name}: {reason}")]
    InvalidResource { name: String, reason: String },
    /// Operands on the stack do not match what a keyword expects.
    #[error("malformed operands for {keyword}: {reason}")]
    MalformedOperands { keyword: &'static str, reason: String },
    /// The CID has no Unicode mapping and none could be extrapolated.
    #[error("undefined cid {0}")]
    UndefinedCid(u32),
    /// Glyph name that cannot be converted to Unicode.
    #[error("invalid glyph name: {0}")]
    InvalidGlyphName(String),
    /// IO error
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
    /// Resource JSON payload could not be read or written.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(keyword: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedOperands {
            keyword,
            reason: reason.into(),
        }
    }

    /// `true` for errors that only mean "this resource does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ResourceNotFound(_))
    }
}
