//! Per-object transform state
//!
//! Each runtime object carries a world matrix plus its decomposed local
//! translation, rotation quaternion, and scale. Decomposition strips scale
//! from the 3x3 block before converting the rotation, so non-uniform scales
//! survive a round trip. World matrices of parented objects are recomputed
//! from the parent immediately at construction time and re-propagated by the
//! graph whenever an ancestor changes.

use crate::foundation::math::{Mat4, Vec3};
use crate::foundation::quat::Quat;

/// World matrix and decomposed local transform of a runtime object
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    /// Combined world matrix
    pub world: Mat4,
    /// Local translation
    pub translation: Vec3,
    /// Local rotation
    pub rotation: Quat,
    /// Local scale
    pub scale: Vec3,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            world: Mat4::identity(),
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformState {
    /// Build from a descriptor's 16-element column-major matrix
    ///
    /// An absent matrix means identity. A zero-length basis column yields a
    /// zero scale on that axis; the rotation stays finite but is only
    /// meaningful for the remaining axes.
    pub fn from_descriptor_matrix(matrix: Option<&[f32; 16]>) -> Self {
        match matrix {
            Some(m) => Self::from_matrix(Mat4::from_column_slice(m)),
            None => Self::default(),
        }
    }

    /// Build from an explicit world matrix, decomposing into TRS
    pub fn from_matrix(world: Mat4) -> Self {
        let (translation, rotation, scale) = decompose(&world);
        Self {
            world,
            translation,
            rotation,
            scale,
        }
    }

    /// Recompose the local matrix from the decomposed TRS parts
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_rotation_matrix()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Decompose a world matrix into translation, rotation, and scale
///
/// The rotation is extracted after dividing each basis column by its length;
/// the result is undefined when the 3x3 block carries skew. A zero-length
/// column is left unscaled instead of divided, so degenerate matrices never
/// introduce NaNs.
pub fn decompose(m: &Mat4) -> (Vec3, Quat, Vec3) {
    let translation = Vec3::new(m.m14, m.m24, m.m34);

    let scale_x = Vec3::new(m.m11, m.m21, m.m31).magnitude();
    let scale_y = Vec3::new(m.m12, m.m22, m.m32).magnitude();
    let scale_z = Vec3::new(m.m13, m.m23, m.m33).magnitude();

    let inv = |s: f32| if s == 0.0 { 1.0 } else { 1.0 / s };
    let (ix, iy, iz) = (inv(scale_x), inv(scale_y), inv(scale_z));

    let rotation_matrix = Mat4::new(
        m.m11 * ix, m.m12 * iy, m.m13 * iz, 0.0,
        m.m21 * ix, m.m22 * iy, m.m23 * iz, 0.0,
        m.m31 * ix, m.m32 * iy, m.m33 * iz, 0.0,
        0.0,        0.0,        0.0,        1.0,
    );
    let rotation = Quat::from_rotation_matrix(&rotation_matrix);

    (translation, rotation, Vec3::new(scale_x, scale_y, scale_z))
}
