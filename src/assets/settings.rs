use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CubismError, Result};

const ASSET: &str = "model3.json";

/// Parameter group name holding the eye-blink parameters.
pub const GROUP_EYE_BLINK: &str = "EyeBlink";
/// Parameter group name holding the lip-sync parameters.
pub const GROUP_LIP_SYNC: &str = "LipSync";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionRef {
    pub name: String,
    pub file: String,
}

/// One entry of a motion group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MotionRef {
    pub file: String,
    #[serde(default)]
    pub sound: Option<String>,
    /// Negative or absent keeps the motion file's own fade.
    #[serde(default)]
    pub fade_in_time: Option<f32>,
    #[serde(default)]
    pub fade_out_time: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionGroup {
    pub name: String,
    pub motions: Vec<MotionRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterGroup {
    pub target: String,
    pub name: String,
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HitArea {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawFileReferences {
    moc: String,
    #[serde(default)]
    textures: Vec<String>,
    #[serde(default)]
    physics: Option<String>,
    #[serde(default)]
    pose: Option<String>,
    #[serde(default)]
    user_data: Option<String>,
    #[serde(default)]
    display_info: Option<String>,
    #[serde(default)]
    expressions: Vec<ExpressionRef>,
    #[serde(default)]
    motions: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSettings {
    #[serde(default)]
    version: u32,
    file_references: RawFileReferences,
    #[serde(default)]
    groups: Vec<ParameterGroup>,
    #[serde(default)]
    hit_areas: Vec<HitArea>,
    #[serde(default)]
    layout: Map<String, Value>,
}

/// Decoded model3.json.
///
/// File paths are kept as written, relative to the settings file. Motion
/// groups and layout keys keep their document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSettings {
    pub version: u32,
    pub moc: String,
    pub textures: Vec<String>,
    pub physics: Option<String>,
    pub pose: Option<String>,
    pub user_data: Option<String>,
    pub display_info: Option<String>,
    pub expressions: Vec<ExpressionRef>,
    pub motion_groups: Vec<MotionGroup>,
    pub groups: Vec<ParameterGroup>,
    pub hit_areas: Vec<HitArea>,
    pub layout: Vec<(String, f32)>,
}

impl ModelSettings {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw: RawSettings = serde_json::from_slice(bytes)?;
        let refs = raw.file_references;

        let mut motion_groups = Vec::with_capacity(refs.motions.len());
        for (name, motions) in refs.motions {
            let motions: Vec<MotionRef> = serde_json::from_value(motions)
                .map_err(|e| CubismError::malformed(ASSET, format!("motion group '{name}': {e}")))?;
            motion_groups.push(MotionGroup { name, motions });
        }

        let layout = raw
            .layout
            .into_iter()
            .filter_map(|(key, value)| match value.as_f64() {
                Some(v) => Some((key, v as f32)),
                None => {
                    log::warn!("Ignoring non-numeric layout value for '{key}'");
                    None
                }
            })
            .collect();

        Ok(Self {
            version: raw.version,
            moc: refs.moc,
            textures: refs.textures,
            physics: non_empty(refs.physics),
            pose: non_empty(refs.pose),
            user_data: non_empty(refs.user_data),
            display_info: non_empty(refs.display_info),
            expressions: refs.expressions,
            motion_groups,
            groups: raw.groups,
            hit_areas: raw.hit_areas,
            layout,
        })
    }

    #[must_use]
    pub fn motion_group(&self, name: &str) -> Option<&MotionGroup> {
        self.motion_groups.iter().find(|g| g.name == name)
    }

    /// Number of motions in `group`, 0 when the group does not exist.
    #[must_use]
    pub fn motion_count(&self, group: &str) -> usize {
        self.motion_group(group).map_or(0, |g| g.motions.len())
    }

    #[must_use]
    pub fn parameter_group(&self, name: &str) -> Option<&ParameterGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    #[must_use]
    pub fn eye_blink_parameter_ids(&self) -> &[String] {
        self.parameter_group(GROUP_EYE_BLINK).map_or(&[], |g| g.ids.as_slice())
    }

    #[must_use]
    pub fn lip_sync_parameter_ids(&self) -> &[String] {
        self.parameter_group(GROUP_LIP_SYNC).map_or(&[], |g| g.ids.as_slice())
    }

    #[must_use]
    pub fn hit_area(&self, name: &str) -> Option<&HitArea> {
        self.hit_areas.iter().find(|a| a.name == name)
    }

    /// Layout pairs in the form [`ModelMatrix::setup_from_layout`] consumes.
    ///
    /// [`ModelMatrix::setup_from_layout`]: crate::math::ModelMatrix::setup_from_layout
    pub fn layout_entries(&self) -> impl Iterator<Item = (&str, f32)> + Clone {
        self.layout.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

fn non_empty(path: Option<String>) -> Option<String> {
    path.filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Version": 3,
        "FileReferences": {
            "Moc": "hiyori.moc3",
            "Textures": ["tex/texture_00.png"],
            "Physics": "hiyori.physics3.json",
            "Pose": "",
            "Expressions": [{ "Name": "smile", "File": "exp/smile.exp3.json" }],
            "Motions": {
                "Tap": [{ "File": "motions/tap.motion3.json", "FadeInTime": 0.3 }],
                "Idle": [
                    { "File": "motions/idle_00.motion3.json" },
                    { "File": "motions/idle_01.motion3.json", "Sound": "idle.wav" }
                ]
            }
        },
        "Groups": [
            { "Target": "Parameter", "Name": "EyeBlink", "Ids": ["ParamEyeLOpen", "ParamEyeROpen"] },
            { "Target": "Parameter", "Name": "LipSync", "Ids": ["ParamMouthOpenY"] }
        ],
        "HitAreas": [{ "Id": "HitAreaHead", "Name": "Head" }],
        "Layout": { "CenterX": 0.0, "Width": 2.0 }
    }"#;

    #[test]
    fn parses_references_and_groups() {
        let settings = ModelSettings::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(settings.version, 3);
        assert_eq!(settings.moc, "hiyori.moc3");
        assert_eq!(settings.physics.as_deref(), Some("hiyori.physics3.json"));
        assert_eq!(settings.pose, None);
        assert_eq!(settings.eye_blink_parameter_ids(), ["ParamEyeLOpen", "ParamEyeROpen"]);
        assert_eq!(settings.lip_sync_parameter_ids(), ["ParamMouthOpenY"]);
        assert_eq!(settings.hit_area("Head").map(|a| a.id.as_str()), Some("HitAreaHead"));
    }

    #[test]
    fn motion_groups_keep_document_order() {
        let settings = ModelSettings::parse(SAMPLE.as_bytes()).unwrap();
        let names: Vec<_> = settings.motion_groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Tap", "Idle"]);
        assert_eq!(settings.motion_count("Idle"), 2);
        assert_eq!(settings.motion_count("Missing"), 0);
        assert_eq!(settings.motion_group("Tap").unwrap().motions[0].fade_in_time, Some(0.3));
        assert_eq!(settings.motion_group("Idle").unwrap().motions[1].sound.as_deref(), Some("idle.wav"));
    }

    #[test]
    fn layout_keeps_order() {
        let settings = ModelSettings::parse(SAMPLE.as_bytes()).unwrap();
        let layout: Vec<_> = settings.layout_entries().collect();
        assert_eq!(layout, [("CenterX", 0.0), ("Width", 2.0)]);
    }

    #[test]
    fn missing_moc_is_an_error() {
        let result = ModelSettings::parse(br#"{ "FileReferences": {} }"#);
        assert!(matches!(result, Err(CubismError::Json(_))));
    }
}
