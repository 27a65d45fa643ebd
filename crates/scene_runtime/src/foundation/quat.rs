//! Orientation quaternions
//!
//! Pure value algebra over `{x, y, z, w}` orientation quaternions. Scene
//! transform decomposition depends on the exact branch behavior here, so this
//! is a bespoke type rather than a re-export of nalgebra's `UnitQuaternion`:
//! the matrix conversion pins a fixed tie-break order between the three
//! diagonal-dominant branches, and normalizing a zero quaternion yields the
//! all-zero sentinel, not identity.
//!
//! Unit length is an invariant maintained by every normalizing operation but
//! is not enforced on raw construction.

use crate::foundation::math::{Mat4, Vec3};
use thiserror::Error;

/// Tolerance used by [`Quat::try_from_rotation_matrix`] when checking that a
/// matrix block is orthonormal.
const ORTHONORMAL_EPSILON: f32 = 1e-4;

/// Errors from checked quaternion construction
#[derive(Debug, Error)]
pub enum QuatError {
    /// The upper-left 3x3 block of the input is not a pure rotation
    #[error("matrix is not orthonormal, cannot convert to a rotation quaternion")]
    InvalidRotationMatrix,
}

/// Orientation quaternion with 32-bit float components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W (scalar) component
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quat {
    /// Create a quaternion from raw components (no normalization)
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Unit quaternion for a rotation of `angle` radians about `axis`
    ///
    /// The result is always normalized.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let s = (angle * 0.5).sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, (angle * 0.5).cos()).normalized()
    }

    /// Convert the upper-left 3x3 block of `m` to a quaternion
    ///
    /// Assumes the block is a pure rotation matrix; this precondition is not
    /// checked (see [`Quat::try_from_rotation_matrix`] for the checked form).
    /// Uses the trace-based algorithm with a fixed branch order: trace
    /// positive, then `m11` dominant, then `m22` dominant, then `m33`. The
    /// order determines which of the sign-equivalent quaternions is returned
    /// for boundary matrices.
    pub fn from_rotation_matrix(m: &Mat4) -> Self {
        let m11 = m.m11;
        let m12 = m.m12;
        let m13 = m.m13;
        let m21 = m.m21;
        let m22 = m.m22;
        let m23 = m.m23;
        let m31 = m.m31;
        let m32 = m.m32;
        let m33 = m.m33;
        let tr = m11 + m22 + m33;

        if tr > 0.0 {
            let s = 0.5 / (tr + 1.0).sqrt();
            Self::new((m32 - m23) * s, (m13 - m31) * s, (m21 - m12) * s, 0.25 / s)
        } else if m11 > m22 && m11 > m33 {
            let s = 2.0 * (1.0 + m11 - m22 - m33).sqrt();
            Self::new(0.25 * s, (m12 + m21) / s, (m13 + m31) / s, (m32 - m23) / s)
        } else if m22 > m33 {
            let s = 2.0 * (1.0 + m22 - m11 - m33).sqrt();
            Self::new((m12 + m21) / s, 0.25 * s, (m23 + m32) / s, (m13 - m31) / s)
        } else {
            let s = 2.0 * (1.0 + m33 - m11 - m22).sqrt();
            Self::new((m13 + m31) / s, (m23 + m32) / s, 0.25 * s, (m21 - m12) / s)
        }
    }

    /// Checked variant of [`Quat::from_rotation_matrix`]
    ///
    /// Validates that the rows of the upper-left 3x3 block are unit length
    /// and mutually orthogonal before converting. This strengthens the
    /// unchecked precondition into an explicit error.
    pub fn try_from_rotation_matrix(m: &Mat4) -> Result<Self, QuatError> {
        let rows = [
            Vec3::new(m.m11, m.m12, m.m13),
            Vec3::new(m.m21, m.m22, m.m23),
            Vec3::new(m.m31, m.m32, m.m33),
        ];
        for (i, row) in rows.iter().enumerate() {
            if (row.magnitude() - 1.0).abs() > ORTHONORMAL_EPSILON {
                return Err(QuatError::InvalidRotationMatrix);
            }
            for other in &rows[i + 1..] {
                if row.dot(other).abs() > ORTHONORMAL_EPSILON {
                    return Err(QuatError::InvalidRotationMatrix);
                }
            }
        }
        Ok(Self::from_rotation_matrix(m))
    }

    /// Build the homogeneous rotation matrix for this quaternion
    pub fn to_rotation_matrix(self) -> Mat4 {
        let Self { x, y, z, w } = self;
        let x2 = x + x;
        let y2 = y + y;
        let z2 = z + z;
        let xx = x * x2;
        let xy = x * y2;
        let xz = x * z2;
        let yy = y * y2;
        let yz = y * z2;
        let zz = z * z2;
        let wx = w * x2;
        let wy = w * y2;
        let wz = w * z2;

        Mat4::new(
            1.0 - (yy + zz), xy - wz,         xz + wy,         0.0,
            xy + wz,         1.0 - (xx + zz), yz - wx,         0.0,
            xz - wy,         yz + wx,         1.0 - (xx + yy), 0.0,
            0.0,             0.0,             0.0,             1.0,
        )
    }

    /// Hamilton product `self * rhs` (non-commutative)
    pub fn multiply(self, rhs: Self) -> Self {
        // Components are read into locals up front, so `q.multiply(q)` is sound.
        let q1x = self.x;
        let q1y = self.y;
        let q1z = self.z;
        let q1w = self.w;
        let q2x = rhs.x;
        let q2y = rhs.y;
        let q2z = rhs.z;
        let q2w = rhs.w;
        Self::new(
            q1x * q2w + q1w * q2x + q1y * q2z - q1z * q2y,
            q1w * q2y - q1x * q2z + q1y * q2w + q1z * q2x,
            q1w * q2z + q1x * q2y - q1y * q2x + q1z * q2w,
            q1w * q2w - q1x * q2x - q1y * q2y - q1z * q2z,
        )
    }

    /// Scale to unit length
    ///
    /// A zero-magnitude input yields the all-zero quaternion. That is a
    /// distinguishable degenerate sentinel, not the identity rotation.
    pub fn normalized(self) -> Self {
        let l = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if l == 0.0 {
            Self::new(0.0, 0.0, 0.0, 0.0)
        } else {
            let inv = 1.0 / l;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        }
    }

    /// 4-component dot product
    pub fn dot(self, q: Self) -> f32 {
        self.x * q.x + self.y * q.y + self.z * q.z + self.w * q.w
    }

    /// Shortest-path linear interpolation from `from` to `to` at parameter `s`
    ///
    /// When the quaternions point into opposite hemispheres, `from` is negated
    /// first so the interpolation does not take the long way around. The
    /// result is renormalized.
    pub fn lerp(from: Self, to: Self, s: f32) -> Self {
        let mut fx = from.x;
        let mut fy = from.y;
        let mut fz = from.z;
        let mut fw = from.w;
        if from.dot(to) < 0.0 {
            fx = -fx;
            fy = -fy;
            fz = -fz;
            fw = -fw;
        }
        Self::new(
            fx + (to.x - fx) * s,
            fy + (to.y - fy) * s,
            fz + (to.z - fz) * s,
            fw + (to.w - fw) * s,
        )
        .normalized()
    }

    /// Rotation mapping direction `v1` onto direction `v2`
    ///
    /// Both inputs must be normalized. Near-antiparallel inputs build a
    /// half-turn about a stable perpendicular axis: the cross with a reference
    /// X axis, falling back to a reference Y axis when that cross is
    /// degenerate. Near-parallel inputs yield the identity.
    pub fn from_to(v1: Vec3, v2: Vec3) -> Self {
        let dot = v1.dot(&v2);
        if dot < -0.999999 {
            let mut a = Vec3::new(1.0, 0.0, 0.0).cross(&v1);
            if a.magnitude() < 0.000001 {
                a = Vec3::new(0.0, 1.0, 0.0).cross(&v1);
            }
            Self::from_axis_angle(a.normalize(), std::f32::consts::PI)
        } else if dot > 0.999999 {
            Self::identity()
        } else {
            let a = v1.cross(&v2);
            Self::new(a.x, a.y, a.z, 1.0 + dot).normalized()
        }
    }

    /// Euler angles (radians) for this quaternion
    ///
    /// Inverse of [`Quat::from_euler`]; the angles come out as `(x, y, z)`
    /// for the same YZX composition.
    pub fn to_euler(self) -> Vec3 {
        let a = -2.0 * (self.x * self.z - self.w * self.y);
        let b = self.w * self.w + self.x * self.x - self.y * self.y - self.z * self.z;
        let c = 2.0 * (self.x * self.y + self.w * self.z);
        let d = -2.0 * (self.y * self.z - self.w * self.x);
        let e = self.w * self.w - self.x * self.x + self.y * self.y - self.z * self.z;
        Vec3::new(d.atan2(e), a.atan2(b), c.asin())
    }

    /// Quaternion for Euler angles (radians), YZX composition
    ///
    /// Z is combined innermost, then Y, then X.
    pub fn from_euler(x: f32, y: f32, z: f32) -> Self {
        let c1 = (x * 0.5).cos();
        let s1 = (x * 0.5).sin();
        let c2 = (y * 0.5).cos();
        let s2 = (y * 0.5).sin();
        let c3 = (z * 0.5).cos();
        let s3 = (z * 0.5).sin();
        Self::new(
            s1 * c2 * c3 + c1 * s2 * s3,
            c1 * s2 * c3 + s1 * c2 * s3,
            c1 * c2 * s3 - s1 * s2 * c3,
            c1 * c2 * c3 - s1 * s2 * s3,
        )
    }

    /// Magnitude of the quaternion
    pub fn magnitude(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Rotate a vector by this quaternion
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Self::new(v.x, v.y, v.z, 0.0);
        let conj = Self::new(-self.x, -self.y, -self.z, self.w);
        let r = self.multiply(q).multiply(conj);
        Vec3::new(r.x, r.y, r.z)
    }
}

impl std::ops::Mul for Quat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.multiply(rhs)
    }
}
