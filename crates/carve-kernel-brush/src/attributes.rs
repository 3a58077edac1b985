//! Per-face texture attributes and the paraxial texture projection.

use bitflags::bitflags;
use carve_kernel_math::{Point2, Point3, Vec3};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Renderer-facing surface properties of a face.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct SurfaceFlags: u32 {
        /// Emits light.
        const LIGHT = 1 << 0;
        /// Slick to walk on.
        const SLICK = 1 << 1;
        /// Draws the skybox.
        const SKY = 1 << 2;
        /// Warping liquid surface.
        const WARP = 1 << 3;
        /// Rendered with alpha blending.
        const TRANS = 1 << 4;
        /// Excluded from lightmaps.
        const NO_LIGHTMAP = 1 << 5;
        /// Invisible in game but still solid.
        const NO_DRAW = 1 << 6;
    }
}

bitflags! {
    /// Game-facing content classification of the volume behind a face.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct ContentFlags: u32 {
        /// Blocks movement.
        const SOLID = 1 << 0;
        /// Water volume.
        const WATER = 1 << 1;
        /// Lava volume.
        const LAVA = 1 << 2;
        /// Player clip volume.
        const PLAYER_CLIP = 1 << 3;
        /// Detail geometry, ignored by vis.
        const DETAIL = 1 << 4;
        /// Trigger volume.
        const TRIGGER = 1 << 5;
    }
}

/// Texture placement and classification of one brush face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceAttributes {
    /// Name of the applied texture.
    pub texture_name: String,
    /// Texel offset along the projection axes.
    pub offset: Point2,
    /// Texel scale along the projection axes.
    pub scale: Point2,
    /// Texture rotation in degrees.
    pub rotation: f64,
    /// Surface flags.
    pub surface_flags: SurfaceFlags,
    /// Content flags.
    pub content_flags: ContentFlags,
}

impl FaceAttributes {
    /// Attributes with a texture name and neutral placement.
    pub fn with_texture(texture_name: impl Into<String>) -> Self {
        Self {
            texture_name: texture_name.into(),
            ..Self::default()
        }
    }
}

impl Default for FaceAttributes {
    fn default() -> Self {
        Self {
            texture_name: String::new(),
            offset: Point2::new(0.0, 0.0),
            scale: Point2::new(1.0, 1.0),
            rotation: 0.0,
            surface_flags: SurfaceFlags::empty(),
            content_flags: ContentFlags::SOLID,
        }
    }
}

/// A paraxial texture projection: the world axis pair best aligned with the
/// face plane, as the classic id-style editors project textures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureProjection {
    /// World-space direction of the texture U axis.
    pub u_axis: Vec3,
    /// World-space direction of the texture V axis.
    pub v_axis: Vec3,
}

impl TextureProjection {
    /// Select projection axes from the dominant component of the normal.
    pub fn paraxial(normal: &Vec3) -> Self {
        let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
        let (u_axis, v_axis) = if az >= ax && az >= ay {
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0))
        } else if ax >= ay {
            (Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -1.0))
        } else {
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0))
        };
        Self { u_axis, v_axis }
    }

    /// UV coordinates of a world point under `attrs`.
    pub fn uv(&self, point: &Point3, attrs: &FaceAttributes) -> Point2 {
        let u = point.coords.dot(&self.u_axis);
        let v = point.coords.dot(&self.v_axis);

        let (sin, cos) = attrs.rotation.to_radians().sin_cos();
        let ru = u * cos - v * sin;
        let rv = u * sin + v * cos;

        // Near-zero scales would blow the division up.
        let sx = if attrs.scale.x.abs() < 1e-3 { 1.0 } else { attrs.scale.x };
        let sy = if attrs.scale.y.abs() < 1e-3 { 1.0 } else { attrs.scale.y };

        Point2::new(ru / sx + attrs.offset.x, rv / sy + attrs.offset.y)
    }
}
