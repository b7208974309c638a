//! Orbit camera: view settings and the matrices derived from them each frame.

use glam::{Mat4, Vec3};

/// Near and far clip planes of the scene projection.
pub const NEAR_PLANE: f32 = 1.0;
pub const FAR_PLANE: f32 = 1000.0;

/// Orbit camera around the origin. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub pitch: f32,
    pub yaw: f32,
    pub distance: f32,
    /// Vertical field of view.
    pub fov: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            distance: 150.0,
            fov: 45.0,
        }
    }
}

/// Per-frame transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub projection: Mat4,
    /// Camera orientation without translation; the skybox is drawn with it.
    pub rotation: Mat4,
    pub view: Mat4,
    pub eye_position: Vec3,
}

impl FrameMatrices {
    pub fn new(view: &ViewSettings, width: u32, height: u32) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let projection = Mat4::perspective_rh(view.fov.to_radians(), aspect, NEAR_PLANE, FAR_PLANE);
        let rotation = Mat4::from_rotation_x(view.pitch.to_radians())
            * Mat4::from_rotation_y(view.yaw.to_radians());
        let view_matrix = Mat4::from_translation(Vec3::new(0.0, 0.0, -view.distance)) * rotation;
        let eye_position = view_matrix.inverse().w_axis.truncate();

        Self {
            projection,
            rotation,
            view: view_matrix,
            eye_position,
        }
    }

    pub fn skybox_view_projection(&self) -> Mat4 {
        self.projection * self.rotation
    }

    pub fn scene_view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}
