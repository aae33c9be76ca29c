use thiserror::Error;

/// Result type for device tree operations.
pub type FdtResult<T> = Result<T, FdtError>;

/// Errors returned by [`DeviceTree`](crate::DeviceTree) operations.
///
/// `NotFound` is the only variant callers routinely recover from; the rest
/// mean the blob or the request is malformed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum FdtError {
    #[error("node or property not found")]
    NotFound,
    #[error("node already exists")]
    Exists,
    #[error("bad magic number")]
    BadMagic,
    #[error("unsupported blob version {0}")]
    BadVersion(u32),
    #[error("blob truncated")]
    Truncated,
    #[error("malformed structure block")]
    BadStructure,
    #[error("offset does not point at a node")]
    BadOffset,
    #[error("malformed path")]
    BadPath,
    #[error("bad property value")]
    BadValue,
    #[error("phandle space exhausted")]
    NoPhandles,
}
