use crate::assets::json::{self, JsonView};
use crate::errors::Result;
use crate::model::Model;
use crate::utils::interner::{IdManager, PartId};

const ASSET: &str = "pose3.json";

/// Drive parameters at or below this count as hidden.
pub const EPSILON: f32 = 0.001;
pub const DEFAULT_FADE_IN_SECONDS: f32 = 0.5;
/// Crossover point of the background opacity curve.
pub const PHI: f32 = 0.5;
/// Upper bound of background visibility during a switch.
pub const BACK_OPACITY_THRESHOLD: f32 = 0.15;

/// A part in a pose group. Its visibility is driven by the parameter of the
/// same name; linked parts mirror its opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct PosePart {
    pub part_id: PartId,
    pub links: Vec<PartId>,
    parameter_index: Option<usize>,
    part_index: Option<usize>,
    link_indices: Vec<usize>,
}

impl PosePart {
    #[must_use]
    pub fn new(part_id: PartId, links: Vec<PartId>) -> Self {
        Self {
            part_id,
            links,
            parameter_index: None,
            part_index: None,
            link_indices: Vec::new(),
        }
    }

    fn resolve(&mut self, model: &mut Model) -> (usize, usize) {
        let parameter_index = model.parameter_index(self.part_id);
        let part_index = model.part_index(self.part_id);
        self.parameter_index = Some(parameter_index);
        self.part_index = Some(part_index);
        self.link_indices = self.links.iter().map(|id| model.part_index(*id)).collect();
        (parameter_index, part_index)
    }
}

/// Mutually exclusive part groups (pose3.json), e.g. alternative arm poses.
///
/// In each group exactly one part is shown: the first whose drive parameter
/// is non-zero. Switching fades the new part in while the old ones fade out
/// no faster than keeps the background mostly covered.
#[derive(Debug, Clone)]
pub struct Pose {
    groups: Vec<Vec<PosePart>>,
    fade_time_seconds: f32,
    initialized: bool,
}

impl Pose {
    #[must_use]
    pub fn new(groups: Vec<Vec<PosePart>>, fade_time_seconds: f32) -> Self {
        Self {
            groups,
            fade_time_seconds,
            initialized: false,
        }
    }

    pub fn parse(bytes: &[u8], ids: &IdManager) -> Result<Self> {
        let value = json::parse(bytes)?;
        let root = JsonView::new(&value);

        let fade_time_seconds = root
            .get("FadeInTime")
            .as_f32()
            .filter(|s| *s >= 0.0)
            .unwrap_or(DEFAULT_FADE_IN_SECONDS);

        let groups_view = root.require_array("Groups", ASSET)?;

        let mut groups = Vec::with_capacity(groups_view.len());
        for group in groups_view.items() {
            let mut parts = Vec::with_capacity(group.len());
            for part in group.items() {
                let part_id = ids.id(part.require_str("Id", ASSET)?);
                let links = part
                    .get("Link")
                    .items()
                    .filter_map(JsonView::as_str)
                    .map(|name| ids.id(name))
                    .collect();
                parts.push(PosePart::new(part_id, links));
            }
            groups.push(parts);
        }

        Ok(Self::new(groups, fade_time_seconds))
    }

    #[must_use]
    pub fn groups(&self) -> &[Vec<PosePart>] {
        &self.groups
    }

    #[must_use]
    pub fn fade_time_seconds(&self) -> f32 {
        self.fade_time_seconds
    }

    /// Shows the first part of every group and hides the rest.
    pub fn reset(&mut self, model: &mut Model) {
        for group in &mut self.groups {
            for (i, part) in group.iter_mut().enumerate() {
                let (parameter_index, part_index) = part.resolve(model);
                let visible = if i == 0 { 1.0 } else { 0.0 };
                model.set_part_opacity(part_index, visible);
                model.set_parameter_value(parameter_index, visible, 1.0);
            }
        }
        self.initialized = true;
    }

    pub fn update_parameters(&mut self, model: &mut Model, delta_seconds: f32) {
        if !self.initialized {
            self.reset(model);
        }
        let delta_seconds = delta_seconds.max(0.0);

        for group in &self.groups {
            self.do_fade(model, delta_seconds, group);
        }
        self.copy_part_opacities(model);
    }

    fn do_fade(&self, model: &mut Model, delta_seconds: f32, group: &[PosePart]) {
        let mut visible = None;
        let mut new_opacity = 1.0;

        for (i, part) in group.iter().enumerate() {
            let (Some(parameter_index), Some(part_index)) = (part.parameter_index, part.part_index) else {
                continue;
            };
            if model.parameter_value(parameter_index) > EPSILON {
                if visible.is_some() {
                    break;
                }
                visible = Some(i);

                if self.fade_time_seconds == 0.0 {
                    new_opacity = 1.0;
                    continue;
                }
                new_opacity = (model.part_opacity(part_index) + delta_seconds / self.fade_time_seconds).min(1.0);
            }
        }

        let visible = match visible {
            Some(i) => i,
            None => {
                new_opacity = 1.0;
                0
            }
        };

        for (i, part) in group.iter().enumerate() {
            let Some(part_index) = part.part_index else {
                continue;
            };
            if i == visible {
                model.set_part_opacity(part_index, new_opacity);
                continue;
            }

            let mut limit = if new_opacity < PHI {
                new_opacity * (PHI - 1.0) / PHI + 1.0
            } else {
                (1.0 - new_opacity) * PHI / (1.0 - PHI)
            };
            let back_opacity = (1.0 - limit) * (1.0 - new_opacity);
            if back_opacity > BACK_OPACITY_THRESHOLD {
                limit = 1.0 - BACK_OPACITY_THRESHOLD / (1.0 - new_opacity);
            }

            let opacity = model.part_opacity(part_index).min(limit);
            model.set_part_opacity(part_index, opacity);
        }
    }

    fn copy_part_opacities(&self, model: &mut Model) {
        for part in self.groups.iter().flatten() {
            let Some(part_index) = part.part_index else {
                continue;
            };
            let opacity = model.part_opacity(part_index);
            for &link in &part.link_indices {
                model.set_part_opacity(link, opacity);
            }
        }
    }
}
