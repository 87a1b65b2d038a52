//! Object management operations.
//!
//! [`ObjectManager`] runs validated [`ManageCommand`]s against the storage
//! gateway.  Multi-step actions are plain sequences of single-object calls:
//! a rename that fails after its copy leaves the object at both keys, and
//! two concurrent folder creations may both pass the existence probe.

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::command::ManageCommand;
use super::validation::{FolderName, ObjectKey};
use crate::config::Config;
use crate::errors::ApiError;
use crate::metrics::record_manage_action;
use crate::storage::backend::{StorageGateway, UrlMode};

/// Reason reported when a rename has nothing to do.
pub const IDENTICAL_KEYS_REASON: &str = "source and target are identical";

/// `{ url, key, expiresIn }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlIssued {
    pub url: String,
    pub key: String,
    pub expires_in: u64,
}

/// `{ deleted, key }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDeleted {
    pub deleted: bool,
    pub key: String,
}

/// `{ renamed: true, sourceKey, targetKey }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRenamed {
    pub renamed: bool,
    pub source_key: String,
    pub target_key: String,
}

/// `{ renamed: false, reason }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameSkipped {
    pub renamed: bool,
    pub reason: String,
}

/// `{ created, folderName, prefix }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCreated {
    pub created: bool,
    pub folder_name: String,
    pub prefix: String,
}

/// Success payload of a management action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ManageOutcome {
    SignedUrl(SignedUrlIssued),
    Deleted(ObjectDeleted),
    Renamed(ObjectRenamed),
    RenameSkipped(RenameSkipped),
    FolderCreated(FolderCreated),
}

/// Runs management actions against one bucket.
#[derive(Clone)]
pub struct ObjectManager {
    gateway: Arc<dyn StorageGateway>,
    upload_ttl_seconds: u64,
    download_ttl_seconds: u64,
}

impl ObjectManager {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        upload_ttl_seconds: u64,
        download_ttl_seconds: u64,
    ) -> Self {
        Self {
            gateway,
            upload_ttl_seconds,
            download_ttl_seconds,
        }
    }

    pub fn from_config(gateway: Arc<dyn StorageGateway>, config: &Config) -> Self {
        Self::new(
            gateway,
            config.signing.upload_ttl_seconds,
            config.signing.download_ttl_seconds,
        )
    }

    /// Run `command`, logging and counting the outcome.
    pub async fn execute(&self, command: ManageCommand) -> Result<ManageOutcome, ApiError> {
        let action = command.action();
        let keys = command_keys(&command);

        let result = match command {
            ManageCommand::CreateUploadUrl { key, content_type } => self
                .create_upload_url(&key, &content_type)
                .await
                .map(ManageOutcome::SignedUrl),
            ManageCommand::CreateDownloadUrl { key } => self
                .create_download_url(&key)
                .await
                .map(ManageOutcome::SignedUrl),
            ManageCommand::DeleteObject { key } => {
                self.delete_object(&key).await.map(ManageOutcome::Deleted)
            }
            ManageCommand::RenameObject { source, target } => {
                self.rename_object(&source, &target).await
            }
            ManageCommand::CreateFolder { folder } => self
                .create_folder(&folder)
                .await
                .map(ManageOutcome::FolderCreated),
        };

        match &result {
            Ok(_) => {
                record_manage_action(action.as_str(), "ok");
                info!(action = %action, keys = %keys, "management action completed");
            }
            Err(err) => {
                record_manage_action(action.as_str(), "error");
                if !err.is_client_error() {
                    error!(action = %action, keys = %keys, "management action failed: {err:?}");
                }
            }
        }
        result
    }

    /// Mint an upload URL bound to `content_type`.  The object may or may
    /// not exist; uploads overwrite.
    pub async fn create_upload_url(
        &self,
        key: &ObjectKey,
        content_type: &str,
    ) -> Result<SignedUrlIssued, ApiError> {
        let url = self
            .gateway
            .signed_url(
                key.as_str(),
                self.upload_ttl_seconds,
                UrlMode::upload(content_type),
            )
            .await?;
        debug!("upload url issued for {} ({})", key, content_type);
        Ok(SignedUrlIssued {
            url,
            key: key.to_string(),
            expires_in: self.upload_ttl_seconds,
        })
    }

    /// Mint a download URL for an existing object.
    pub async fn create_download_url(&self, key: &ObjectKey) -> Result<SignedUrlIssued, ApiError> {
        self.require_exists(key).await?;
        let url = self
            .gateway
            .signed_url(key.as_str(), self.download_ttl_seconds, UrlMode::Download)
            .await?;
        Ok(SignedUrlIssued {
            url,
            key: key.to_string(),
            expires_in: self.download_ttl_seconds,
        })
    }

    /// Delete an object.  Missing objects are not an error.
    pub async fn delete_object(&self, key: &ObjectKey) -> Result<ObjectDeleted, ApiError> {
        self.gateway.delete(key.as_str()).await?;
        Ok(ObjectDeleted {
            deleted: true,
            key: key.to_string(),
        })
    }

    /// Rename by copy then delete.
    ///
    /// Identical keys short-circuit without touching storage.  A missing
    /// source fails before the copy.  A failed delete leaves both keys.
    pub async fn rename_object(
        &self,
        source: &ObjectKey,
        target: &ObjectKey,
    ) -> Result<ManageOutcome, ApiError> {
        if source == target {
            return Ok(ManageOutcome::RenameSkipped(RenameSkipped {
                renamed: false,
                reason: IDENTICAL_KEYS_REASON.to_string(),
            }));
        }

        self.require_exists(source).await?;
        self.gateway.copy(source.as_str(), target.as_str()).await?;
        self.gateway.delete(source.as_str()).await?;

        Ok(ManageOutcome::Renamed(ObjectRenamed {
            renamed: true,
            source_key: source.to_string(),
            target_key: target.to_string(),
        }))
    }

    /// Materialize a folder with a zero-byte placeholder object.
    pub async fn create_folder(&self, folder: &FolderName) -> Result<FolderCreated, ApiError> {
        let placeholder = folder.placeholder_key();
        if self.gateway.exists(&placeholder).await? {
            return Err(ApiError::FolderAlreadyExists {
                folder: folder.as_str().to_string(),
            });
        }
        self.gateway
            .put(&placeholder, Bytes::new(), "text/plain")
            .await?;
        Ok(FolderCreated {
            created: true,
            folder_name: folder.as_str().to_string(),
            prefix: folder.prefix(),
        })
    }

    async fn require_exists(&self, key: &ObjectKey) -> Result<(), ApiError> {
        if self.gateway.exists(key.as_str()).await? {
            Ok(())
        } else {
            Err(ApiError::NoSuchKey {
                key: key.to_string(),
            })
        }
    }
}

/// Keys an action touches, for log lines.
fn command_keys(command: &ManageCommand) -> String {
    match command {
        ManageCommand::CreateUploadUrl { key, .. }
        | ManageCommand::CreateDownloadUrl { key }
        | ManageCommand::DeleteObject { key } => key.to_string(),
        ManageCommand::RenameObject { source, target } => format!("{source} -> {target}"),
        ManageCommand::CreateFolder { folder } => folder.placeholder_key(),
    }
}
