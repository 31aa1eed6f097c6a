use glam::{Mat4, Vec3};

/// 4x4 transform restricted to the 2D scale/translate operations the runtime
/// needs. Column-major, backed by [`glam::Mat4`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix44 {
    tr: Mat4,
}

impl Default for Matrix44 {
    fn default() -> Self {
        Self::new()
    }
}

impl Matrix44 {
    #[must_use]
    pub fn new() -> Self {
        Self { tr: Mat4::IDENTITY }
    }

    pub fn load_identity(&mut self) {
        self.tr = Mat4::IDENTITY;
    }

    #[inline]
    #[must_use]
    pub fn as_mat4(&self) -> &Mat4 {
        &self.tr
    }

    #[must_use]
    pub fn to_array(&self) -> [f32; 16] {
        self.tr.to_cols_array()
    }

    pub fn set_array(&mut self, tr: &[f32; 16]) {
        self.tr = Mat4::from_cols_array(tr);
    }

    #[inline]
    #[must_use]
    pub fn scale_x(&self) -> f32 {
        self.tr.x_axis.x
    }

    #[inline]
    #[must_use]
    pub fn scale_y(&self) -> f32 {
        self.tr.y_axis.y
    }

    #[inline]
    #[must_use]
    pub fn translate_x(&self) -> f32 {
        self.tr.w_axis.x
    }

    #[inline]
    #[must_use]
    pub fn translate_y(&self) -> f32 {
        self.tr.w_axis.y
    }

    #[inline]
    #[must_use]
    pub fn transform_x(&self, src: f32) -> f32 {
        self.scale_x() * src + self.translate_x()
    }

    #[inline]
    #[must_use]
    pub fn transform_y(&self, src: f32) -> f32 {
        self.scale_y() * src + self.translate_y()
    }

    #[inline]
    #[must_use]
    pub fn invert_transform_x(&self, src: f32) -> f32 {
        (src - self.translate_x()) / self.scale_x()
    }

    #[inline]
    #[must_use]
    pub fn invert_transform_y(&self, src: f32) -> f32 {
        (src - self.translate_y()) / self.scale_y()
    }

    /// Absolute translation.
    pub fn translate(&mut self, x: f32, y: f32) {
        self.tr.w_axis.x = x;
        self.tr.w_axis.y = y;
    }

    pub fn set_translate_x(&mut self, x: f32) {
        self.tr.w_axis.x = x;
    }

    pub fn set_translate_y(&mut self, y: f32) {
        self.tr.w_axis.y = y;
    }

    /// Absolute scale.
    pub fn scale(&mut self, x: f32, y: f32) {
        self.tr.x_axis.x = x;
        self.tr.y_axis.y = y;
    }

    pub fn translate_relative(&mut self, x: f32, y: f32) {
        self.tr *= Mat4::from_translation(Vec3::new(x, y, 0.0));
    }

    pub fn scale_relative(&mut self, x: f32, y: f32) {
        self.tr *= Mat4::from_scale(Vec3::new(x, y, 1.0));
    }

    pub fn multiply_by_matrix(&mut self, m: &Matrix44) {
        self.tr *= m.tr;
    }

    #[must_use]
    pub fn inverse(&self) -> Matrix44 {
        Matrix44 {
            tr: self.tr.inverse(),
        }
    }
}

/// Places a model's canvas into view space.
///
/// The canvas size (in model units) is fixed at creation; layout operations
/// then scale it uniformly and anchor one of its edges or its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelMatrix {
    matrix: Matrix44,
    width: f32,
    height: f32,
}

impl ModelMatrix {
    /// Creates a matrix for a canvas of `width`×`height` units, scaled to a
    /// height of 2.0 (the full view range).
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        let mut m = Self {
            matrix: Matrix44::new(),
            width,
            height,
        };
        m.set_height(2.0);
        m
    }

    #[inline]
    #[must_use]
    pub fn matrix(&self) -> &Matrix44 {
        &self.matrix
    }

    pub fn set_width(&mut self, w: f32) {
        let scale = w / self.width;
        self.matrix.scale(scale, scale);
    }

    pub fn set_height(&mut self, h: f32) {
        let scale = h / self.height;
        self.matrix.scale(scale, scale);
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.matrix.translate(x, y);
    }

    pub fn set_center_position(&mut self, x: f32, y: f32) {
        self.center_x(x);
        self.center_y(y);
    }

    pub fn top(&mut self, y: f32) {
        self.set_y(y);
    }

    pub fn bottom(&mut self, y: f32) {
        let h = self.height * self.matrix.scale_y();
        self.matrix.set_translate_y(y - h);
    }

    pub fn left(&mut self, x: f32) {
        self.set_x(x);
    }

    pub fn right(&mut self, x: f32) {
        let w = self.width * self.matrix.scale_x();
        self.matrix.set_translate_x(x - w);
    }

    pub fn center_x(&mut self, x: f32) {
        let w = self.width * self.matrix.scale_x();
        self.matrix.set_translate_x(x - w / 2.0);
    }

    pub fn center_y(&mut self, y: f32) {
        let h = self.height * self.matrix.scale_y();
        self.matrix.set_translate_y(y - h / 2.0);
    }

    pub fn set_x(&mut self, x: f32) {
        self.matrix.set_translate_x(x);
    }

    pub fn set_y(&mut self, y: f32) {
        self.matrix.set_translate_y(y);
    }

    /// Applies a model3.json `Layout` block.
    ///
    /// Size keys are applied before position keys so anchors see the final
    /// scale. Keys compare case-insensitively and ignore underscores, so both
    /// `CenterX` and `center_x` are accepted.
    pub fn setup_from_layout<'a, I>(&mut self, layout: I)
    where
        I: IntoIterator<Item = (&'a str, f32)> + Clone,
    {
        for (key, value) in layout.clone() {
            match normalize_layout_key(key).as_str() {
                "width" => self.set_width(value),
                "height" => self.set_height(value),
                _ => {}
            }
        }

        for (key, value) in layout {
            match normalize_layout_key(key).as_str() {
                "x" => self.set_x(value),
                "y" => self.set_y(value),
                "centerx" => self.center_x(value),
                "centery" => self.center_y(value),
                "top" => self.top(value),
                "bottom" => self.bottom(value),
                "left" => self.left(value),
                "right" => self.right(value),
                "width" | "height" => {}
                other => log::debug!("Ignoring unknown layout key '{other}'"),
            }
        }
    }
}

fn normalize_layout_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn transform_roundtrip() {
        let mut m = Matrix44::new();
        m.scale(2.0, 4.0);
        m.translate(1.0, -1.0);
        assert!(approx(m.transform_x(3.0), 7.0));
        assert!(approx(m.invert_transform_x(7.0), 3.0));
        assert!(approx(m.transform_y(1.0), 3.0));
        assert!(approx(m.invert_transform_y(3.0), 1.0));
    }

    #[test]
    fn relative_ops_compose() {
        let mut m = Matrix44::new();
        m.scale(2.0, 2.0);
        m.translate_relative(1.0, 1.0);
        assert!(approx(m.translate_x(), 2.0));
        m.scale_relative(0.5, 0.5);
        assert!(approx(m.scale_x(), 1.0));
    }

    #[test]
    fn model_matrix_layout_center() {
        let mut m = ModelMatrix::new(4.0, 4.0);
        assert!(approx(m.matrix().scale_x(), 0.5));

        m.setup_from_layout([("Width", 2.0), ("CenterX", 0.0), ("center_y", 0.0)]);
        assert!(approx(m.matrix().scale_x(), 0.5));
        assert!(approx(m.matrix().translate_x(), -1.0));
        assert!(approx(m.matrix().translate_y(), -1.0));
    }
}
