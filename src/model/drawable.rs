use bitflags::bitflags;
use glam::{Vec2, Vec4};

use crate::utils::interner::DrawableId;

bitflags! {
    /// Per-drawable state published to the renderer every frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DynamicFlags: u8 {
        const IS_VISIBLE = 1 << 0;
        const VISIBILITY_DID_CHANGE = 1 << 1;
        const OPACITY_DID_CHANGE = 1 << 2;
        const DRAW_ORDER_DID_CHANGE = 1 << 3;
        const RENDER_ORDER_DID_CHANGE = 1 << 4;
        const VERTEX_POSITIONS_DID_CHANGE = 1 << 5;
        const BLEND_COLOR_DID_CHANGE = 1 << 6;
    }
}

impl DynamicFlags {
    /// Every `*_DID_CHANGE` bit.
    pub const CHANGE_MASK: DynamicFlags = DynamicFlags::IS_VISIBLE.complement();
}

/// Renderable mesh state owned by the model.
///
/// Geometry is produced by the external deformer; the runtime only reads it
/// (hit testing) and tracks which properties changed during the frame.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub(crate) id: DrawableId,
    vertex_positions: Vec<Vec2>,
    opacity: f32,
    draw_order: i32,
    render_order: i32,
    multiply_color: Vec4,
    screen_color: Vec4,
    parent_part_index: Option<usize>,
    flags: DynamicFlags,
}

impl Drawable {
    #[must_use]
    pub fn new(id: DrawableId, vertex_positions: Vec<Vec2>) -> Self {
        Self {
            id,
            vertex_positions,
            opacity: 1.0,
            draw_order: 500,
            render_order: 0,
            multiply_color: Vec4::ONE,
            screen_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            parent_part_index: None,
            flags: DynamicFlags::IS_VISIBLE,
        }
    }

    #[must_use]
    pub fn with_parent_part(mut self, part_index: Option<usize>) -> Self {
        self.parent_part_index = part_index;
        self
    }

    #[must_use]
    pub fn with_draw_order(mut self, draw_order: i32) -> Self {
        self.draw_order = draw_order;
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> DrawableId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn vertex_positions(&self) -> &[Vec2] {
        &self.vertex_positions
    }

    #[inline]
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    #[inline]
    #[must_use]
    pub fn draw_order(&self) -> i32 {
        self.draw_order
    }

    #[inline]
    #[must_use]
    pub fn render_order(&self) -> i32 {
        self.render_order
    }

    #[inline]
    #[must_use]
    pub fn multiply_color(&self) -> Vec4 {
        self.multiply_color
    }

    #[inline]
    #[must_use]
    pub fn screen_color(&self) -> Vec4 {
        self.screen_color
    }

    #[inline]
    #[must_use]
    pub fn parent_part_index(&self) -> Option<usize> {
        self.parent_part_index
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> DynamicFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.flags.contains(DynamicFlags::IS_VISIBLE)
    }

    pub fn set_vertex_positions(&mut self, positions: &[Vec2]) {
        if self.vertex_positions != positions {
            self.vertex_positions.clear();
            self.vertex_positions.extend_from_slice(positions);
            self.flags |= DynamicFlags::VERTEX_POSITIONS_DID_CHANGE;
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        if self.opacity != opacity {
            self.opacity = opacity;
            self.flags |= DynamicFlags::OPACITY_DID_CHANGE;
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.is_visible() != visible {
            self.flags.set(DynamicFlags::IS_VISIBLE, visible);
            self.flags |= DynamicFlags::VISIBILITY_DID_CHANGE;
        }
    }

    pub fn set_draw_order(&mut self, draw_order: i32) {
        if self.draw_order != draw_order {
            self.draw_order = draw_order;
            self.flags |= DynamicFlags::DRAW_ORDER_DID_CHANGE;
        }
    }

    pub fn set_render_order(&mut self, render_order: i32) {
        if self.render_order != render_order {
            self.render_order = render_order;
            self.flags |= DynamicFlags::RENDER_ORDER_DID_CHANGE;
        }
    }

    pub fn set_blend_colors(&mut self, multiply: Vec4, screen: Vec4) {
        if self.multiply_color != multiply || self.screen_color != screen {
            self.multiply_color = multiply;
            self.screen_color = screen;
            self.flags |= DynamicFlags::BLEND_COLOR_DID_CHANGE;
        }
    }

    pub(crate) fn reset_dynamic_flags(&mut self) {
        self.flags &= !DynamicFlags::CHANGE_MASK;
    }
}
