use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown bone: {name}")]
    UnknownBone { name: String },

    #[error("unknown slot: {name}")]
    UnknownSlot { name: String },

    #[error("unknown skin: {name}")]
    UnknownSkin { name: String },

    #[error("unknown attachment '{name}' for slot '{slot}'")]
    UnknownAttachment { slot: String, name: String },

    /// An index stored in skeleton data points outside the list it refers to.
    #[error("{owner} references missing {kind} #{index}")]
    InvalidReference {
        owner: String,
        kind: &'static str,
        index: usize,
    },

    #[error("bone '{bone}' must come after its parent in the bone list")]
    InvalidHierarchy { bone: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    /// Corrupt or incompatible asset data. Reserved for loaders that build [`crate::SkeletonData`].
    #[error("invalid skeleton data: {message}")]
    DataFormat { message: String },
}

impl Error {
    pub(crate) fn reference(owner: impl Into<String>, kind: &'static str, index: usize) -> Self {
        Self::InvalidReference {
            owner: owner.into(),
            kind,
            index,
        }
    }
}
