//! The external persistence collaborator: client/image/version CRUD and
//! blob storage, consumed behind a trait so the session never knows what
//! transport backs it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A client with the same identity already exists
    #[error("a client with this email already exists")]
    Conflict,
    #[error("not found: {0}")]
    NotFound(String),
    /// Network or storage failure; the caller surfaces it and the user
    /// retries manually
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version_id: String,
    pub prompt_used: String,
    pub model_used: String,
    pub generated_url: String,
    pub upscaled_url: Option<String>,
}

impl VersionRecord {
    /// The URL the studio should edit: the upscaled image when present,
    /// else the generated one.
    pub fn editable_url(&self) -> &str {
        self.upscaled_url.as_deref().unwrap_or(&self.generated_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub original_url: String,
    pub versions: Vec<VersionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetail {
    pub client: Client,
    pub images: Vec<ImageRecord>,
}

/// Operations the dashboard backend exposes. Failures are reported to the
/// user as dismissible messages; in-session state is never rolled back.
pub trait PersistenceService {
    fn create_client(
        &mut self,
        name: &str,
        email: &str,
        phone: &str,
        country_code: &str,
    ) -> Result<Client, PersistenceError>;

    fn list_clients(&self) -> Result<Vec<Client>, PersistenceError>;

    fn get_client_detail(&self, client_id: &str) -> Result<ClientDetail, PersistenceError>;

    /// Cascades to delete the client's stored media.
    fn delete_client(&mut self, email: &str) -> Result<(), PersistenceError>;

    fn add_image(&mut self, client_id: &str, image: &[u8]) -> Result<ImageRecord, PersistenceError>;

    fn add_version(
        &mut self,
        image_id: &str,
        model_used: &str,
        prompt_used: &str,
        generated_image: &[u8],
    ) -> Result<VersionRecord, PersistenceError>;

    /// Replaces a version's generated file, deleting the superseded one.
    fn replace_generated_image(
        &mut self,
        image_id: &str,
        version_id: &str,
        model_used: &str,
        prompt_used: &str,
        new_file: &[u8],
    ) -> Result<(), PersistenceError>;

    /// Stores the upscaled result for a version (deleting a prior one) and
    /// returns its URL.
    fn set_upscaled_image(
        &mut self,
        image_id: &str,
        version_id: &str,
        file: &[u8],
    ) -> Result<String, PersistenceError>;

    /// Returns the upscaled URL if present, else the generated URL.
    fn get_editable_image_url(
        &self,
        image_id: &str,
        version_id: &str,
    ) -> Result<String, PersistenceError>;
}
