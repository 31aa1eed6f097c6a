use serde::Deserialize;

use crate::errors::Result;
use crate::utils::interner::{CubismId, IdManager};

/// Target kind of art-mesh annotations.
pub const TARGET_ART_MESH: &str = "ArtMesh";

/// A free-form string attached to a model element by the author.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDataNode {
    pub target: String,
    pub id: CubismId,
    pub value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawNode {
    target: String,
    id: String,
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawUserData {
    #[serde(default)]
    user_data: Vec<RawNode>,
}

/// Decoded userdata3.json.
#[derive(Debug, Clone, Default)]
pub struct UserData {
    nodes: Vec<UserDataNode>,
}

impl UserData {
    pub fn parse(bytes: &[u8], ids: &IdManager) -> Result<Self> {
        let raw: RawUserData = serde_json::from_slice(bytes)?;
        let nodes = raw
            .user_data
            .into_iter()
            .map(|n| UserDataNode {
                id: ids.id(&n.id),
                target: n.target,
                value: n.value,
            })
            .collect();
        Ok(Self { nodes })
    }

    #[must_use]
    pub fn nodes(&self) -> &[UserDataNode] {
        &self.nodes
    }

    pub fn art_mesh_nodes(&self) -> impl Iterator<Item = &UserDataNode> {
        self.nodes.iter().filter(|n| n.target == TARGET_ART_MESH)
    }

    /// Value attached to `id`, if any.
    #[must_use]
    pub fn value(&self, id: CubismId) -> Option<&str> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.value.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_art_mesh_nodes() {
        let ids = IdManager::new();
        let json = br#"{
            "Version": 3,
            "Meta": { "UserDataCount": 2, "TotalUserDataSize": 10 },
            "UserData": [
                { "Target": "ArtMesh", "Id": "ArtMesh1", "Value": "hair" },
                { "Target": "Part", "Id": "PartArm", "Value": "arm" }
            ]
        }"#;
        let data = UserData::parse(json, &ids).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.art_mesh_nodes().count(), 1);
        assert_eq!(data.value(ids.id("PartArm")), Some("arm"));
        assert_eq!(data.value(ids.id("Unknown")), None);
    }
}
