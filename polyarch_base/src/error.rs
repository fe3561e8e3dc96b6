use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("type tag `{tag}` is registered twice in {registry} registry")]
    DuplicateTag {
        registry: &'static str,
        tag: &'static str,
    },
}
