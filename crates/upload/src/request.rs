//! Metadata describing the file to upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strongbox_protocol::{
    Classification, CompleteFileUploadRequest, CreateFileUploadRequest, Expiration,
    ResolutionStrategy,
};

use crate::error::UploadError;

/// What to upload and where: target folder, file name and node metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadRequest {
    pub parent_id: i64,
    pub name: String,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_strategy: Option<ResolutionStrategy>,
}

impl FileUploadRequest {
    pub fn new(parent_id: i64, name: impl Into<String>) -> Self {
        Self {
            parent_id,
            name: name.into(),
            classification: Classification::default(),
            notes: None,
            expire_at: None,
            resolution_strategy: None,
        }
    }

    pub fn classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the expiration. The Unix epoch disables expiration.
    pub fn expire_at(mut self, expire_at: DateTime<Utc>) -> Self {
        self.expire_at = Some(expire_at);
        self
    }

    pub fn resolution_strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.resolution_strategy = Some(strategy);
        self
    }

    /// Checks the fields the server would reject outright.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.parent_id <= 0 {
            return Err(UploadError::InvalidRequest(format!(
                "parent id must be positive, got {}",
                self.parent_id
            )));
        }
        if self.name.trim().is_empty() {
            return Err(UploadError::InvalidRequest("file name is empty".into()));
        }
        if self.name.contains(['/', '\\']) {
            return Err(UploadError::InvalidRequest(format!(
                "file name must not contain path separators: {}",
                self.name
            )));
        }
        Ok(())
    }

    /// Body of the create request.
    pub fn to_create_request(&self) -> CreateFileUploadRequest {
        CreateFileUploadRequest {
            parent_id: self.parent_id,
            name: self.name.clone(),
            classification: self.classification,
            notes: self.notes.clone(),
            expiration: self.expire_at.map(Expiration::at),
        }
    }

    /// Body of the complete request.
    pub fn to_complete_request(&self) -> CompleteFileUploadRequest {
        CompleteFileUploadRequest {
            file_name: self.name.clone(),
            resolution_strategy: self.resolution_strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_create_and_complete_bodies() {
        let expire = DateTime::from_timestamp(1_800_000_000, 0).unwrap();
        let req = FileUploadRequest::new(12, "report.pdf")
            .classification(Classification::Confidential)
            .notes("quarterly")
            .expire_at(expire)
            .resolution_strategy(ResolutionStrategy::Overwrite);

        let create = req.to_create_request();
        assert_eq!(create.parent_id, 12);
        assert_eq!(create.name, "report.pdf");
        assert_eq!(create.classification, Classification::Confidential);
        assert_eq!(create.notes.as_deref(), Some("quarterly"));
        let expiration = create.expiration.unwrap();
        assert!(expiration.enable_expiration);
        assert_eq!(expiration.expire_at, Some(expire));

        let complete = req.to_complete_request();
        assert_eq!(complete.file_name, "report.pdf");
        assert_eq!(
            complete.resolution_strategy,
            Some(ResolutionStrategy::Overwrite)
        );
    }

    #[test]
    fn epoch_expiration_is_disabled() {
        let req = FileUploadRequest::new(1, "a").expire_at(DateTime::from_timestamp(0, 0).unwrap());
        let expiration = req.to_create_request().expiration.unwrap();
        assert!(!expiration.enable_expiration);
    }

    #[test]
    fn defaults_are_minimal() {
        let req = FileUploadRequest::new(3, "x.bin");
        let create = req.to_create_request();
        assert_eq!(create.classification, Classification::Internal);
        assert!(create.notes.is_none());
        assert!(create.expiration.is_none());
        assert!(req.to_complete_request().resolution_strategy.is_none());
    }

    #[test]
    fn validate_rejects_bad_names_and_parents() {
        assert!(FileUploadRequest::new(1, "ok.txt").validate().is_ok());
        assert!(FileUploadRequest::new(0, "ok.txt").validate().is_err());
        assert!(FileUploadRequest::new(-5, "ok.txt").validate().is_err());
        assert!(FileUploadRequest::new(1, "  ").validate().is_err());
        assert!(FileUploadRequest::new(1, "dir/file").validate().is_err());
        assert!(FileUploadRequest::new(1, "dir\\file").validate().is_err());
    }
}
