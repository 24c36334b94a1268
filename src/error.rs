use thiserror::Error;

use crate::persistence::PersistenceError;
use crate::surface::SurfaceError;

/// Errors that can occur while fetching or decoding an image asset
#[derive(Error, Debug)]
pub enum LoadError {
    /// The bytes could not be fetched (network, 404, missing file)
    #[error("failed to fetch image: {0}")]
    Fetch(String),
    /// The bytes were fetched but could not be decoded as an image
    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// Errors that can occur while encoding the composition for export
#[derive(Error, Debug)]
pub enum ExportError {
    /// There is no base image loaded, so there is nothing to export
    #[error("nothing to export: no image loaded")]
    EmptySurface,
    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Top-level session failures. Out-of-range mutator inputs are not errors;
/// they clamp or no-op so the composition stays renderable.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The drawing surface could not be created. Fatal to the session.
    #[error("surface initialization failed: {0}")]
    SurfaceInit(#[from] SurfaceError),
    #[error("image load failed: {0}")]
    Load(#[from] LoadError),
    #[error("persistence operation failed: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}
