//! Parsing of management requests into typed commands.
//!
//! A request is a JSON object naming an `action` plus that action's fields.
//! Parsing happens in three steps, each with its own error: the body must
//! be a JSON object (`MalformedRequest`), the action must be one of the
//! known names (`UnsupportedAction`), and the action's fields must validate
//! (`InvalidArgument`).

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::validation::{FolderName, ObjectKey};
use crate::errors::ApiError;

/// Content type assumed for uploads that do not name one.
pub const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// The closed set of management actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateUploadUrl,
    CreateDownloadUrl,
    DeleteObject,
    RenameObject,
    CreateFolder,
}

impl Action {
    /// Wire name of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::CreateUploadUrl => "createUploadUrl",
            Action::CreateDownloadUrl => "createDownloadUrl",
            Action::DeleteObject => "deleteObject",
            Action::RenameObject => "renameObject",
            Action::CreateFolder => "createFolder",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createUploadUrl" => Ok(Action::CreateUploadUrl),
            "createDownloadUrl" => Ok(Action::CreateDownloadUrl),
            "deleteObject" => Ok(Action::DeleteObject),
            "renameObject" => Ok(Action::RenameObject),
            "createFolder" => Ok(Action::CreateFolder),
            other => Err(ApiError::UnsupportedAction {
                action: other.to_string(),
            }),
        }
    }
}

/// A validated management command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageCommand {
    CreateUploadUrl {
        key: ObjectKey,
        content_type: String,
    },
    CreateDownloadUrl {
        key: ObjectKey,
    },
    DeleteObject {
        key: ObjectKey,
    },
    RenameObject {
        source: ObjectKey,
        target: ObjectKey,
    },
    CreateFolder {
        folder: FolderName,
    },
}

impl ManageCommand {
    /// Parse a raw request body.  An empty body reads as `{}`.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::from_value(Value::Object(Map::new()));
        }
        let value: Value =
            serde_json::from_slice(body).map_err(|e| ApiError::MalformedRequest {
                message: e.to_string(),
            })?;
        Self::from_value(value)
    }

    /// Build a command from an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let Value::Object(fields) = value else {
            return Err(ApiError::MalformedRequest {
                message: "expected a JSON object".to_string(),
            });
        };

        let action = match fields.get("action") {
            Some(Value::String(name)) => name.parse::<Action>()?,
            Some(other) => {
                return Err(ApiError::UnsupportedAction {
                    action: other.to_string(),
                })
            }
            None => {
                return Err(ApiError::UnsupportedAction {
                    action: String::new(),
                })
            }
        };

        let command = match action {
            Action::CreateUploadUrl => ManageCommand::CreateUploadUrl {
                key: key_field(&fields, "key")?,
                content_type: string_field(&fields, "contentType")
                    .unwrap_or(DEFAULT_UPLOAD_CONTENT_TYPE)
                    .to_string(),
            },
            Action::CreateDownloadUrl => ManageCommand::CreateDownloadUrl {
                key: key_field(&fields, "key")?,
            },
            Action::DeleteObject => ManageCommand::DeleteObject {
                key: key_field(&fields, "key")?,
            },
            Action::RenameObject => ManageCommand::RenameObject {
                source: key_field(&fields, "sourceKey")?,
                target: key_field(&fields, "targetKey")?,
            },
            Action::CreateFolder => {
                let raw = string_field(&fields, "folderName")
                    .ok_or_else(|| ApiError::invalid("folderName is required"))?;
                ManageCommand::CreateFolder {
                    folder: FolderName::sanitize(raw)?,
                }
            }
        };
        Ok(command)
    }

    pub fn action(&self) -> Action {
        match self {
            ManageCommand::CreateUploadUrl { .. } => Action::CreateUploadUrl,
            ManageCommand::CreateDownloadUrl { .. } => Action::CreateDownloadUrl,
            ManageCommand::DeleteObject { .. } => Action::DeleteObject,
            ManageCommand::RenameObject { .. } => Action::RenameObject,
            ManageCommand::CreateFolder { .. } => Action::CreateFolder,
        }
    }
}

/// Non-empty string field, if present.
fn string_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    match fields.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn key_field(fields: &Map<String, Value>, name: &str) -> Result<ObjectKey, ApiError> {
    let raw = string_field(fields, name)
        .ok_or_else(|| ApiError::invalid(format!("{name} is required")))?;
    ObjectKey::parse(name, raw)
}
