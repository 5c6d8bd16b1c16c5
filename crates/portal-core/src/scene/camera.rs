use glam::{Mat4, Vec3};

/// Orthographic camera framing the simulation quad
#[derive(Clone, Copy, Debug)]
pub struct OrthoCamera {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl OrthoCamera {
    /// View volume `x:[-0.5, 0.5] y:[-0.5, 0.5]`, near 0.1, far 10, one unit back
    ///
    /// A unit plane at z = 0 fills the frame exactly.
    pub fn unit_quad() -> Self {
        Self {
            left: -0.5,
            right: 0.5,
            bottom: -0.5,
            top: 0.5,
            near: 0.1,
            far: 10.0,
            position: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position - Vec3::Z, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

/// Perspective camera for the visible scene
#[derive(Clone, Copy, Debug)]
pub struct PerspectiveCamera {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub target: Vec3,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl PerspectiveCamera {
    pub fn new(aspect: f32) -> Self {
        Self {
            fov_y: 35f32.to_radians(),
            aspect,
            near: 0.1,
            far: 100.0,
            target: Vec3::ZERO,
            distance: 2.0,
            min_distance: 0.5,
            max_distance: 10.0,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Move towards (`factor > 1`) or away from (`factor < 1`) the target
    pub fn dolly(&mut self, factor: f32) {
        if factor > 0.0 {
            self.distance = (self.distance / factor).clamp(self.min_distance, self.max_distance);
        }
    }

    pub fn position(&self) -> Vec3 {
        self.target + Vec3::Z * self.distance
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.position(), self.target, Vec3::Y);
        let projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        projection * view
    }
}
