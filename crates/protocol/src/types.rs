use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Confidentiality level of a node, sent as an integer on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Classification {
    Public,
    #[default]
    Internal,
    Confidential,
    StrictlyConfidential,
}

impl Classification {
    /// Returns the wire value (1–4).
    pub fn value(self) -> i32 {
        match self {
            Classification::Public => 1,
            Classification::Internal => 2,
            Classification::Confidential => 3,
            Classification::StrictlyConfidential => 4,
        }
    }
}

impl TryFrom<i32> for Classification {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Classification::Public),
            2 => Ok(Classification::Internal),
            3 => Ok(Classification::Confidential),
            4 => Ok(Classification::StrictlyConfidential),
            other => Err(ProtocolError::UnknownClassification(other)),
        }
    }
}

impl From<Classification> for i32 {
    fn from(c: Classification) -> Self {
        c.value()
    }
}

/// What the server does when the target name already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    #[default]
    #[serde(rename = "autorename")]
    AutoRename,
    Overwrite,
    Fail,
}

/// Expiration settings attached to a new file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expiration {
    pub enable_expiration: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
}

impl Expiration {
    /// Builds the expiration block for `expire_at`.
    ///
    /// The Unix epoch means "no expiration": the timestamp is still sent but
    /// `enableExpiration` is false.
    pub fn at(expire_at: DateTime<Utc>) -> Self {
        Self {
            enable_expiration: expire_at.timestamp_millis() != 0,
            expire_at: Some(expire_at),
        }
    }
}

/// Kind of a remote node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Room,
    Folder,
    File,
}

/// Remote node descriptor returned by the complete phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: i64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_wire_values() {
        assert_eq!(serde_json::to_string(&Classification::Public).unwrap(), "1");
        assert_eq!(
            serde_json::to_string(&Classification::StrictlyConfidential).unwrap(),
            "4"
        );
        let parsed: Classification = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Classification::Confidential);
    }

    #[test]
    fn classification_rejects_unknown_value() {
        assert!(serde_json::from_str::<Classification>("7").is_err());
        assert!(matches!(
            Classification::try_from(0),
            Err(ProtocolError::UnknownClassification(0))
        ));
    }

    #[test]
    fn resolution_strategy_names() {
        assert_eq!(
            serde_json::to_string(&ResolutionStrategy::AutoRename).unwrap(),
            "\"autorename\""
        );
        assert_eq!(
            serde_json::to_string(&ResolutionStrategy::Overwrite).unwrap(),
            "\"overwrite\""
        );
        assert_eq!(
            serde_json::to_string(&ResolutionStrategy::Fail).unwrap(),
            "\"fail\""
        );
    }

    #[test]
    fn expiration_epoch_is_disabled() {
        let exp = Expiration::at(DateTime::from_timestamp(0, 0).unwrap());
        assert!(!exp.enable_expiration);
        assert!(exp.expire_at.is_some());

        let exp = Expiration::at("2030-01-01T00:00:00Z".parse().unwrap());
        assert!(exp.enable_expiration);
    }

    #[test]
    fn node_parses_server_payload() {
        let json = r#"{
            "id": 42,
            "type": "file",
            "name": "report.pdf",
            "parentId": 7,
            "size": 5000000,
            "classification": 2,
            "createdAt": "2024-03-01T10:00:00Z",
            "unknownField": true
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.id, 42);
        assert_eq!(node.node_type, NodeType::File);
        assert_eq!(node.parent_id, Some(7));
        assert_eq!(node.size, Some(5_000_000));
        assert_eq!(node.classification, Some(Classification::Internal));
        assert!(node.notes.is_none());
    }
}
