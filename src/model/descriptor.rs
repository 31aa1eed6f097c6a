use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::errors::{CubismError, Result};
use crate::model::drawable::Drawable;
use crate::model::model::{CanvasInfo, Model};
use crate::utils::interner::IdManager;

/// Builds a [`Model`] from the bytes referenced by `FileReferences.Moc`.
///
/// Decoding the binary moc format belongs to the deformation core; the runtime
/// only needs the parameter/part/drawable tables, so the loader is pluggable.
pub trait MocLoader {
    fn load_model(&self, moc: &[u8], ids: &IdManager) -> Result<Model>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterDescriptor {
    pub id: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

fn one() -> f32 {
    1.0
}

fn default_draw_order() -> i32 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartDescriptor {
    pub id: String,
    #[serde(default = "one")]
    pub opacity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DrawableDescriptor {
    pub id: String,
    #[serde(default)]
    pub vertices: Vec<[f32; 2]>,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default)]
    pub parent_part: Option<String>,
    #[serde(default = "default_draw_order")]
    pub draw_order: i32,
}

/// Serializable table form of a model: what a deformation core reports after
/// reading a moc file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelDescriptor {
    #[serde(default)]
    pub canvas: CanvasInfo,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub parts: Vec<PartDescriptor>,
    #[serde(default)]
    pub drawables: Vec<DrawableDescriptor>,
}

impl ModelDescriptor {
    /// Creates a model, rejecting duplicate ids and dangling part references.
    pub fn build(&self, ids: &IdManager) -> Result<Model> {
        let mut model = Model::new(ids.clone());
        model.set_canvas(self.canvas);

        for p in &self.parameters {
            let id = ids.id(&p.id);
            if model.find_parameter_index(id).is_some() {
                return Err(CubismError::InvalidModel(format!("duplicate parameter '{}'", p.id)));
            }
            model.add_parameter(id, p.min, p.max, p.default)?;
        }

        for p in &self.parts {
            let id = ids.id(&p.id);
            if model.find_part_index(id).is_some() {
                return Err(CubismError::InvalidModel(format!("duplicate part '{}'", p.id)));
            }
            model.add_part(id, p.opacity)?;
        }

        for d in &self.drawables {
            let parent = match &d.parent_part {
                Some(name) => {
                    let index = ids
                        .get(name)
                        .and_then(|id| model.find_part_index(id))
                        .ok_or_else(|| {
                            CubismError::InvalidModel(format!(
                                "drawable '{}' refers to unknown part '{name}'",
                                d.id
                            ))
                        })?;
                    Some(index)
                }
                None => None,
            };
            let vertices = d.vertices.iter().map(|&[x, y]| Vec2::new(x, y)).collect();
            let mut drawable = Drawable::new(ids.id(&d.id), vertices)
                .with_parent_part(parent)
                .with_draw_order(d.draw_order);
            drawable.set_opacity(d.opacity);
            model.add_drawable(drawable);
        }

        model.update();
        Ok(model)
    }
}

/// [`MocLoader`] for models stored as a JSON [`ModelDescriptor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorMocLoader;

impl MocLoader for DescriptorMocLoader {
    fn load_model(&self, moc: &[u8], ids: &IdManager) -> Result<Model> {
        let descriptor: ModelDescriptor = serde_json::from_slice(moc)
            .map_err(|e| CubismError::InvalidModel(e.to_string()))?;
        descriptor.build(ids)
    }
}
