use polyarch_base::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Pointer type tag is not registered for the slot's trait object type.
    #[error("unknown type id `{id}` for {registry}")]
    UnknownType { registry: &'static str, id: String },

    /// Tagged union discriminant is outside of the declared alternatives.
    #[error("unknown variant {which}, expected one of {alternatives} alternatives")]
    UnknownVariant { which: u64, alternatives: usize },

    #[error("archive format: {}", .0)]
    ArchiveFormat(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Ron(#[from] ron::Error),

    #[error(transparent)]
    RonSpanned(#[from] ron::error::SpannedError),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("cannot infer archive format from {}", .0)]
    UnknownFormat(String),
}

impl Error {
    /// True for errors coming from the archive backend itself rather than from
    /// type or variant resolution.
    pub fn is_archive_format(&self) -> bool {
        matches!(
            self,
            Error::ArchiveFormat(_)
                | Error::Json(_)
                | Error::Ron(_)
                | Error::RonSpanned(_)
                | Error::Bincode(_)
        )
    }
}
