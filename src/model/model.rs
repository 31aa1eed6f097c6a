use rustc_hash::FxHashMap;

use crate::errors::{CubismError, Result};
use crate::model::drawable::Drawable;
use crate::utils::interner::{CubismId, DrawableId, IdManager, ParameterId, PartId};

/// Canvas geometry reported by the model source.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CanvasInfo {
    pub size_in_pixels: [f32; 2],
    pub origin_in_pixels: [f32; 2],
    pub pixels_per_unit: f32,
}

impl Default for CanvasInfo {
    fn default() -> Self {
        Self {
            size_in_pixels: [1.0, 1.0],
            origin_in_pixels: [0.0, 0.0],
            pixels_per_unit: 1.0,
        }
    }
}

/// Recomputes drawable geometry from the current parameter vector.
///
/// This is the seam to the deformation core, which lives outside this crate.
/// It is invoked from [`Model::update`] once per frame.
pub trait DrawableDeformer: Send {
    fn deform(&mut self, parameters: &[f32], part_opacities: &[f32], drawables: &mut [Drawable]);
}

#[derive(Debug, Clone, Copy)]
struct ParameterRange {
    min: f32,
    max: f32,
    default: f32,
}

/// The parameter state of one loaded model.
///
/// Parameters and parts are addressed by index; indices are stable for the
/// lifetime of the model. Looking up the index of an id that the model does not
/// define registers a *virtual* slot past the real ones. Virtual slots behave
/// like parameters with range `[0, 1]` but are never clamped or saved, which is
/// how part-opacity curves and pose groups address parts by name.
pub struct Model {
    ids: IdManager,

    parameter_ids: Vec<ParameterId>,
    parameter_values: Vec<f32>,
    parameter_ranges: Vec<ParameterRange>,
    saved_parameters: Vec<f32>,
    parameter_lookup: FxHashMap<ParameterId, usize>,
    virtual_parameters: Vec<(ParameterId, f32)>,

    part_ids: Vec<PartId>,
    part_opacities: Vec<f32>,
    part_lookup: FxHashMap<PartId, usize>,
    virtual_parts: Vec<(PartId, f32)>,

    drawables: Vec<Drawable>,
    drawable_lookup: FxHashMap<DrawableId, usize>,

    model_opacity: f32,
    canvas: CanvasInfo,
    deformer: Option<Box<dyn DrawableDeformer>>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("parameters", &self.parameter_ids.len())
            .field("virtual_parameters", &self.virtual_parameters.len())
            .field("parts", &self.part_ids.len())
            .field("drawables", &self.drawables.len())
            .finish_non_exhaustive()
    }
}

impl Model {
    #[must_use]
    pub fn new(ids: IdManager) -> Self {
        Self {
            ids,
            parameter_ids: Vec::new(),
            parameter_values: Vec::new(),
            parameter_ranges: Vec::new(),
            saved_parameters: Vec::new(),
            parameter_lookup: FxHashMap::default(),
            virtual_parameters: Vec::new(),
            part_ids: Vec::new(),
            part_opacities: Vec::new(),
            part_lookup: FxHashMap::default(),
            virtual_parts: Vec::new(),
            drawables: Vec::new(),
            drawable_lookup: FxHashMap::default(),
            model_opacity: 1.0,
            canvas: CanvasInfo::default(),
            deformer: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn ids(&self) -> &IdManager {
        &self.ids
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Appends a real parameter; `default` is clamped into `[min, max]`.
    ///
    /// Fails once a virtual parameter has been registered, since virtual
    /// indices start right after the real ones.
    pub fn add_parameter(&mut self, id: ParameterId, min: f32, max: f32, default: f32) -> Result<usize> {
        if !self.virtual_parameters.is_empty() {
            return Err(CubismError::InvalidModel(format!(
                "parameter '{}' added after virtual parameters",
                self.ids.resolve(id)
            )));
        }
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let default = default.clamp(min, max);
        let index = self.parameter_ids.len();
        self.parameter_ids.push(id);
        self.parameter_values.push(default);
        self.parameter_ranges.push(ParameterRange { min, max, default });
        self.parameter_lookup.insert(id, index);
        Ok(index)
    }

    /// Same ordering rule as [`Model::add_parameter`].
    pub fn add_part(&mut self, id: PartId, opacity: f32) -> Result<usize> {
        if !self.virtual_parts.is_empty() {
            return Err(CubismError::InvalidModel(format!(
                "part '{}' added after virtual parts",
                self.ids.resolve(id)
            )));
        }
        let index = self.part_ids.len();
        self.part_ids.push(id);
        self.part_opacities.push(opacity);
        self.part_lookup.insert(id, index);
        Ok(index)
    }

    pub fn add_drawable(&mut self, drawable: Drawable) -> usize {
        let index = self.drawables.len();
        self.drawable_lookup.insert(drawable.id(), index);
        self.drawables.push(drawable);
        index
    }

    pub fn set_canvas(&mut self, canvas: CanvasInfo) {
        self.canvas = canvas;
    }

    pub fn set_deformer(&mut self, deformer: Box<dyn DrawableDeformer>) {
        self.deformer = Some(deformer);
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Number of real parameters.
    #[inline]
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.parameter_ids.len()
    }

    /// Real and virtual parameters together.
    #[inline]
    #[must_use]
    pub fn total_parameter_count(&self) -> usize {
        self.parameter_ids.len() + self.virtual_parameters.len()
    }

    #[must_use]
    pub fn parameter_ids(&self) -> &[ParameterId] {
        &self.parameter_ids
    }

    /// Real parameter values, in index order.
    #[must_use]
    pub fn parameter_values(&self) -> &[f32] {
        &self.parameter_values
    }

    #[must_use]
    pub fn find_parameter_index(&self, id: ParameterId) -> Option<usize> {
        self.parameter_lookup.get(&id).copied()
    }

    /// Index of `id`, registering a virtual parameter if the model lacks it.
    pub fn parameter_index(&mut self, id: ParameterId) -> usize {
        if let Some(index) = self.find_parameter_index(id) {
            return index;
        }
        let index = self.total_parameter_count();
        self.virtual_parameters.push((id, 0.0));
        self.parameter_lookup.insert(id, index);
        index
    }

    #[inline]
    #[must_use]
    pub fn is_virtual_parameter(&self, index: usize) -> bool {
        index >= self.parameter_ids.len()
    }

    #[must_use]
    pub fn parameter_id(&self, index: usize) -> Option<ParameterId> {
        self.parameter_ids.get(index).copied().or_else(|| {
            self.virtual_parameters
                .get(index - self.parameter_ids.len())
                .map(|(id, _)| *id)
        })
    }

    #[must_use]
    pub fn parameter_value(&self, index: usize) -> f32 {
        if let Some(v) = self.parameter_values.get(index) {
            return *v;
        }
        self.virtual_parameters
            .get(index - self.parameter_ids.len())
            .map_or(0.0, |(_, v)| *v)
    }

    /// Value of `id`, or 0 when the model has never seen it.
    #[must_use]
    pub fn parameter_value_by_id(&self, id: ParameterId) -> f32 {
        self.find_parameter_index(id)
            .map_or(0.0, |i| self.parameter_value(i))
    }

    #[must_use]
    pub fn parameter_minimum(&self, index: usize) -> f32 {
        self.parameter_ranges.get(index).map_or(0.0, |r| r.min)
    }

    #[must_use]
    pub fn parameter_maximum(&self, index: usize) -> f32 {
        self.parameter_ranges.get(index).map_or(1.0, |r| r.max)
    }

    #[must_use]
    pub fn parameter_default(&self, index: usize) -> f32 {
        self.parameter_ranges.get(index).map_or(0.0, |r| r.default)
    }

    /// Writes `value` blended by `weight` against the current value.
    ///
    /// Real parameters are clamped into their range before blending.
    pub fn set_parameter_value(&mut self, index: usize, value: f32, weight: f32) {
        if let Some(range) = self.parameter_ranges.get(index) {
            let value = value.clamp(range.min, range.max);
            let current = &mut self.parameter_values[index];
            *current = if weight == 1.0 {
                value
            } else {
                *current * (1.0 - weight) + value * weight
            };
            return;
        }

        let Some((_, current)) = self.virtual_parameters.get_mut(index - self.parameter_ids.len()) else {
            log::warn!("Parameter index {index} is out of range");
            return;
        };
        *current = if weight == 1.0 {
            value
        } else {
            *current * (1.0 - weight) + value * weight
        };
    }

    pub fn add_parameter_value(&mut self, index: usize, value: f32, weight: f32) {
        let current = self.parameter_value(index);
        self.set_parameter_value(index, current + value * weight, 1.0);
    }

    pub fn multiply_parameter_value(&mut self, index: usize, value: f32, weight: f32) {
        let current = self.parameter_value(index);
        self.set_parameter_value(index, current * (1.0 + (value - 1.0) * weight), 1.0);
    }

    pub fn set_parameter_value_by_id(&mut self, id: ParameterId, value: f32, weight: f32) {
        let index = self.parameter_index(id);
        self.set_parameter_value(index, value, weight);
    }

    pub fn add_parameter_value_by_id(&mut self, id: ParameterId, value: f32, weight: f32) {
        let index = self.parameter_index(id);
        self.add_parameter_value(index, value, weight);
    }

    pub fn multiply_parameter_value_by_id(&mut self, id: ParameterId, value: f32, weight: f32) {
        let index = self.parameter_index(id);
        self.multiply_parameter_value(index, value, weight);
    }

    /// Snapshots the real parameter values.
    pub fn save_parameters(&mut self) {
        self.saved_parameters.clear();
        self.saved_parameters.extend_from_slice(&self.parameter_values);
    }

    /// Restores the last snapshot taken by [`Model::save_parameters`].
    pub fn load_parameters(&mut self) {
        let count = self.saved_parameters.len().min(self.parameter_values.len());
        self.parameter_values[..count].copy_from_slice(&self.saved_parameters[..count]);
    }

    // ========================================================================
    // Parts
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.part_ids.len()
    }

    #[must_use]
    pub fn part_ids(&self) -> &[PartId] {
        &self.part_ids
    }

    #[must_use]
    pub fn part_opacities(&self) -> &[f32] {
        &self.part_opacities
    }

    #[must_use]
    pub fn find_part_index(&self, id: PartId) -> Option<usize> {
        self.part_lookup.get(&id).copied()
    }

    /// Index of `id`, registering a virtual part if the model lacks it.
    pub fn part_index(&mut self, id: PartId) -> usize {
        if let Some(index) = self.find_part_index(id) {
            return index;
        }
        let index = self.part_ids.len() + self.virtual_parts.len();
        self.virtual_parts.push((id, 0.0));
        self.part_lookup.insert(id, index);
        index
    }

    #[must_use]
    pub fn part_opacity(&self, index: usize) -> f32 {
        if let Some(v) = self.part_opacities.get(index) {
            return *v;
        }
        self.virtual_parts
            .get(index - self.part_ids.len())
            .map_or(0.0, |(_, v)| *v)
    }

    #[must_use]
    pub fn part_opacity_by_id(&self, id: PartId) -> f32 {
        self.find_part_index(id).map_or(0.0, |i| self.part_opacity(i))
    }

    pub fn set_part_opacity(&mut self, index: usize, opacity: f32) {
        if let Some(v) = self.part_opacities.get_mut(index) {
            *v = opacity;
            return;
        }
        match self.virtual_parts.get_mut(index - self.part_ids.len()) {
            Some((_, v)) => *v = opacity,
            None => log::warn!("Part index {index} is out of range"),
        }
    }

    pub fn set_part_opacity_by_id(&mut self, id: PartId, opacity: f32) {
        let index = self.part_index(id);
        self.set_part_opacity(index, opacity);
    }

    // ========================================================================
    // Drawables
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    #[must_use]
    pub fn find_drawable_index(&self, id: DrawableId) -> Option<usize> {
        self.drawable_lookup.get(&id).copied()
    }

    #[must_use]
    pub fn drawable(&self, index: usize) -> Option<&Drawable> {
        self.drawables.get(index)
    }

    pub fn drawable_mut(&mut self, index: usize) -> Option<&mut Drawable> {
        self.drawables.get_mut(index)
    }

    #[must_use]
    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    // ========================================================================
    // Model-wide state
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn model_opacity(&self) -> f32 {
        self.model_opacity
    }

    pub fn set_model_opacity(&mut self, opacity: f32) {
        self.model_opacity = opacity;
    }

    #[must_use]
    pub fn canvas(&self) -> &CanvasInfo {
        &self.canvas
    }

    /// Canvas width in model units.
    #[must_use]
    pub fn canvas_width(&self) -> f32 {
        self.canvas.size_in_pixels[0] / self.canvas.pixels_per_unit
    }

    /// Canvas height in model units.
    #[must_use]
    pub fn canvas_height(&self) -> f32 {
        self.canvas.size_in_pixels[1] / self.canvas.pixels_per_unit
    }

    /// Commits the frame.
    ///
    /// Clears the drawables' change flags from the previous frame, then lets the
    /// deformer rebuild geometry from the current parameters, so after this
    /// call the flags describe exactly what changed during this tick.
    pub fn update(&mut self) {
        for drawable in &mut self.drawables {
            drawable.reset_dynamic_flags();
        }
        if let Some(deformer) = self.deformer.as_mut() {
            deformer.deform(&self.parameter_values, &self.part_opacities, &mut self.drawables);
        }
    }

    /// Resolves an id for diagnostics.
    #[must_use]
    pub fn id_name(&self, id: CubismId) -> &str {
        self.ids.resolve(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_parameters_after_virtual_ones_are_rejected() {
        let ids = IdManager::new();
        let mut model = Model::new(ids.clone());
        assert_eq!(model.add_parameter(ids.id("ParamA"), 0.0, 1.0, 0.0).unwrap(), 0);

        let slot = model.parameter_index(ids.id("PartArm"));
        assert_eq!(slot, 1);

        let err = model.add_parameter(ids.id("ParamB"), 0.0, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, CubismError::InvalidModel(_)));
        assert_eq!(model.parameter_count(), 1);
        assert_eq!(model.total_parameter_count(), 2);
        assert_eq!(model.parameter_index(ids.id("PartArm")), slot);
        assert!(model.find_parameter_index(ids.id("ParamB")).is_none());
    }

    #[test]
    fn real_parts_after_virtual_ones_are_rejected() {
        let ids = IdManager::new();
        let mut model = Model::new(ids.clone());
        model.add_part(ids.id("PartBody"), 1.0).unwrap();
        assert_eq!(model.part_index(ids.id("PartGhost")), 1);

        let err = model.add_part(ids.id("PartArm"), 1.0).unwrap_err();
        assert!(matches!(err, CubismError::InvalidModel(_)));
        assert!(model.find_part_index(ids.id("PartArm")).is_none());
    }
}
