//! Scene geometry and the per-frame rotation/color driver.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::color::hsv_to_rgb;
use crate::detune::DetuneSnapshot;
use crate::params::{RenderConfig, SceneKind};

/// Vertex data (position + face color)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Static scene geometry for one demo variant
pub struct SceneMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl SceneMesh {
    pub fn new(kind: SceneKind) -> Self {
        match kind {
            SceneKind::Cube => Self::cube(),
            SceneKind::Triangle => Self::triangle(),
            SceneKind::Point | SceneKind::Noise => Self::point(),
        }
    }

    /// Unit cube: 6 faces x 4 vertices, one flat color per face,
    /// 36 indices (2 triangles per face)
    fn cube() -> Self {
        // Face corner positions, one face per row of four
        const FACES: [[[f32; 3]; 4]; 6] = [
            // Front (+Z)
            [
                [-1.0, -1.0, 1.0],
                [1.0, -1.0, 1.0],
                [1.0, 1.0, 1.0],
                [-1.0, 1.0, 1.0],
            ],
            // Back (-Z)
            [
                [-1.0, -1.0, -1.0],
                [-1.0, 1.0, -1.0],
                [1.0, 1.0, -1.0],
                [1.0, -1.0, -1.0],
            ],
            // Top (+Y)
            [
                [-1.0, 1.0, -1.0],
                [-1.0, 1.0, 1.0],
                [1.0, 1.0, 1.0],
                [1.0, 1.0, -1.0],
            ],
            // Bottom (-Y)
            [
                [-1.0, -1.0, -1.0],
                [1.0, -1.0, -1.0],
                [1.0, -1.0, 1.0],
                [-1.0, -1.0, 1.0],
            ],
            // Right (+X)
            [
                [1.0, -1.0, -1.0],
                [1.0, 1.0, -1.0],
                [1.0, 1.0, 1.0],
                [1.0, -1.0, 1.0],
            ],
            // Left (-X)
            [
                [-1.0, -1.0, -1.0],
                [-1.0, -1.0, 1.0],
                [-1.0, 1.0, 1.0],
                [-1.0, 1.0, -1.0],
            ],
        ];

        const FACE_COLORS: [[f32; 3]; 6] = [
            [1.0, 1.0, 1.0], // front: white
            [1.0, 0.0, 0.0], // back: red
            [0.0, 1.0, 0.0], // top: green
            [0.0, 0.0, 1.0], // bottom: blue
            [1.0, 1.0, 0.0], // right: yellow
            [1.0, 0.0, 1.0], // left: purple
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (face, color) in FACES.iter().zip(FACE_COLORS) {
            let base = vertices.len() as u16;
            for position in face {
                vertices.push(Vertex {
                    position: *position,
                    color,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self { vertices, indices }
    }

    fn triangle() -> Self {
        let vertices = vec![
            Vertex {
                position: [0.0, 1.0, 0.0],
                color: [1.0, 0.0, 0.0],
            },
            Vertex {
                position: [-1.0, -1.0, 0.0],
                color: [0.0, 1.0, 0.0],
            },
            Vertex {
                position: [1.0, -1.0, 0.0],
                color: [0.0, 0.0, 1.0],
            },
        ];
        Self {
            vertices,
            indices: vec![0, 1, 2],
        }
    }

    fn point() -> Self {
        let vertices = vec![Vertex {
            position: [0.0, 0.0, 0.0],
            color: [1.0, 1.0, 1.0],
        }];
        Self {
            vertices,
            indices: vec![0],
        }
    }
}

/// Rotation accumulator advanced once per animation frame
#[derive(Debug, Clone)]
pub struct RotationState {
    /// Monotonically non-decreasing while the driver runs
    pub angle: f32,
    /// Timestamp of the previous frame (seconds), None before the first
    previous_s: Option<f64>,
}

impl RotationState {
    pub fn new() -> Self {
        Self {
            angle: 0.0,
            previous_s: None,
        }
    }

    /// Advance by dt * intensity / divisor. The very first call observes
    /// dt = 0 (there is no previous frame to measure against).
    pub fn advance(&mut self, now_s: f64, intensity: f32, divisor: f32) -> f32 {
        let dt = match self.previous_s {
            Some(prev) => (now_s - prev).max(0.0) as f32,
            None => 0.0,
        };
        self.previous_s = Some(now_s);

        self.angle += dt * intensity / divisor;
        self.angle
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    pub mvp: Mat4,
    /// Grayscale background, deliberately unclamped
    pub background: [f32; 3],
}

/// Per-frame driver: couples the detune state to transform and color
pub struct SceneSystem {
    pub mesh: SceneMesh,
    pub kind: SceneKind,
    rotation: RotationState,
    config: RenderConfig,
}

impl SceneSystem {
    pub fn new(kind: SceneKind, config: RenderConfig) -> Self {
        Self {
            mesh: SceneMesh::new(kind),
            kind,
            rotation: RotationState::new(),
            config,
        }
    }

    /// Reset the rotation driver to a fresh session's state
    pub fn reset_rotation(&mut self) {
        self.rotation = RotationState::new();
    }

    /// Advance one animation frame.
    ///
    /// The background brightness comes from the detune intensity through
    /// the saturation-zero HSV path; the model spins by the accumulated
    /// angle about Z, then by a fraction of it about Y, in front of a
    /// fixed pulled-back view.
    pub fn frame(&mut self, now_s: f64, snap: DetuneSnapshot) -> FrameParams {
        let angle = self
            .rotation
            .advance(now_s, snap.detune_intensity, self.kind.angle_divisor());

        let model = Mat4::from_rotation_y(angle * self.config.y_angle_fraction)
            * Mat4::from_rotation_z(angle);
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -self.config.view_distance));
        let proj = Mat4::perspective_rh(
            self.config.fov_degrees.to_radians(),
            self.config.aspect_ratio(),
            self.config.near_plane,
            self.config.far_plane,
        );

        let value = snap.detune_intensity * self.config.intensity_to_value;
        let background = hsv_to_rgb(0.0, 0.0, value);

        FrameParams {
            mvp: proj * view * model,
            background,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(intensity: f32) -> DetuneSnapshot {
        DetuneSnapshot {
            spread: 2.0,
            detune_intensity: intensity,
        }
    }

    #[test]
    fn test_cube_mesh_topology() {
        let mesh = SceneMesh::new(SceneKind::Cube);
        assert_eq!(mesh.vertices.len(), 24); // 6 faces x 4 corners
        assert_eq!(mesh.indices.len(), 36); // 6 faces x 2 triangles x 3

        // Every index addresses a real vertex
        assert!(mesh.indices.iter().all(|&i| (i as usize) < 24));
    }

    #[test]
    fn test_cube_faces_share_one_color() {
        let mesh = SceneMesh::new(SceneKind::Cube);
        for face in mesh.vertices.chunks(4) {
            assert!(face.iter().all(|v| v.color == face[0].color));
        }
    }

    #[test]
    fn test_rotation_first_frame_is_frozen() {
        let mut rot = RotationState::new();

        // No previous frame to measure against, so the first call sees dt = 0
        let angle = rot.advance(123.456, 10.0, 1.0);
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn test_first_frame_at_time_zero_counts_as_seen() {
        let mut rot = RotationState::new();

        // A clock that starts at exactly 0.0 still marks the first frame
        assert_eq!(rot.advance(0.0, 1.0, 1.0), 0.0);

        // The second frame measures dt from it rather than freezing again
        let angle = rot.advance(1.0, 1.0, 1.0);
        assert!((angle - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_monotone_nondecreasing() {
        let mut rot = RotationState::new();
        let mut last = 0.0;
        let mut now = 1.0;

        for i in 0..500 {
            now += 0.016;
            let intensity = (i % 7) as f32 * 0.3; // includes zero frames
            let angle = rot.advance(now, intensity, 2.0);
            assert!(angle >= last, "angle regressed at frame {}", i);
            last = angle;
        }
    }

    #[test]
    fn test_zero_intensity_freezes_rotation() {
        let mut rot = RotationState::new();
        rot.advance(1.0, 0.0, 1.0);

        for i in 2..100 {
            let angle = rot.advance(i as f64, 0.0, 1.0);
            assert_eq!(angle, 0.0);
        }
    }

    #[test]
    fn test_rotation_scales_with_divisor() {
        let mut full = RotationState::new();
        let mut half = RotationState::new();
        full.advance(1.0, 2.0, 1.0);
        half.advance(1.0, 2.0, 2.0);

        let a1 = full.advance(2.0, 2.0, 1.0);
        let a2 = half.advance(2.0, 2.0, 2.0);
        assert!((a1 - 2.0 * a2).abs() < 1e-6);
    }

    #[test]
    fn test_frame_background_is_grayscale_from_intensity() {
        let config = RenderConfig::default();
        let mut scene = SceneSystem::new(SceneKind::Cube, config);

        let frame = scene.frame(1.0, snap(0.1));
        let expected = 0.1 * 5.0;
        assert!((frame.background[0] - expected).abs() < 1e-6);
        assert_eq!(frame.background[0], frame.background[1]);
        assert_eq!(frame.background[1], frame.background[2]);
    }

    #[test]
    fn test_frame_background_unclamped() {
        let config = RenderConfig::default();
        let mut scene = SceneSystem::new(SceneKind::Cube, config);

        // Extreme intensity pushes past 1.0 and is passed through as-is
        let frame = scene.frame(1.0, snap(100.0));
        assert_eq!(frame.background[0], 500.0);
    }

    #[test]
    fn test_frame_mvp_is_valid() {
        let config = RenderConfig::default();
        let mut scene = SceneSystem::new(SceneKind::Cube, config);
        scene.frame(1.0, snap(1.0));
        let frame = scene.frame(2.0, snap(1.0));

        assert_ne!(frame.mvp, Mat4::IDENTITY);
        assert!(frame.mvp.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
