//! Rigid-transform helpers shared by every tsrkit crate.
//!
//! Poses are [`Isometry3<f64>`]; the rotation is stored as a unit quaternion,
//! so the orthonormal, determinant +1 invariant holds by construction.
//!
//! Six-vector displacements use the `[x, y, z, roll, pitch, yaw]` layout with
//! the rotation convention `R = Rz(yaw) * Ry(pitch) * Rx(roll)`.

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3, Vector6};

/// A rigid transform in SE(3).
pub type Pose = Isometry3<f64>;

/// A per-axis displacement `[x, y, z, roll, pitch, yaw]`.
pub type Displacement = Vector6<f64>;

/// Build a rotation from roll-pitch-yaw (intrinsic XYZ / extrinsic ZYX).
pub fn rotation_from_rpy(roll: f64, pitch: f64, yaw: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_euler_angles(roll, pitch, yaw))
}

/// Build a pose from a translation and roll-pitch-yaw angles.
pub fn pose_from_xyz_rpy(xyz: [f64; 3], rpy: [f64; 3]) -> Pose {
    Pose::from_parts(
        Translation3::new(xyz[0], xyz[1], xyz[2]),
        rotation_from_rpy(rpy[0], rpy[1], rpy[2]),
    )
}

/// Extract `[roll, pitch, yaw]` from a rotation matrix.
///
/// `roll = atan2(R32, R33)`, `pitch = -asin(R31)`, `yaw = atan2(R21, R11)`
/// (1-based indices). At gimbal lock (`pitch = ±π/2`) roll and yaw are
/// degenerate and come out of the `atan2` of near-zero terms.
pub fn rpy_from_matrix(m: &Matrix3<f64>) -> Vector3<f64> {
    // Rounding can push |R31| a hair above 1.
    let sin_pitch = m[(2, 0)].clamp(-1.0, 1.0);
    Vector3::new(
        m[(2, 1)].atan2(m[(2, 2)]),
        -sin_pitch.asin(),
        m[(1, 0)].atan2(m[(0, 0)]),
    )
}

/// Convert a pose into its six-vector displacement (translation + RPY).
pub fn displacement_from_pose(pose: &Pose) -> Displacement {
    let t = pose.translation.vector;
    let rpy = rpy_from_matrix(pose.rotation.to_rotation_matrix().matrix());
    Displacement::new(t.x, t.y, t.z, rpy.x, rpy.y, rpy.z)
}

/// Build a pose from a six-vector displacement.
pub fn pose_from_displacement(d: &Displacement) -> Pose {
    pose_from_xyz_rpy([d[0], d[1], d[2]], [d[3], d[4], d[5]])
}

/// Build a pose from the 12-value text layout: a 3x3 rotation written
/// column-major followed by the translation.
pub fn pose_from_text_values(values: &[f64; 12]) -> Pose {
    let rotation = Matrix3::new(
        values[0], values[3], values[6], //
        values[1], values[4], values[7], //
        values[2], values[5], values[8],
    );
    Pose::from_parts(
        Translation3::new(values[9], values[10], values[11]),
        UnitQuaternion::from_matrix(&rotation),
    )
}

/// Inverse of [`pose_from_text_values`].
pub fn pose_to_text_values(pose: &Pose) -> [f64; 12] {
    let r = pose.rotation.to_rotation_matrix();
    let m = r.matrix();
    let t = pose.translation.vector;
    [
        m[(0, 0)],
        m[(1, 0)],
        m[(2, 0)],
        m[(0, 1)],
        m[(1, 1)],
        m[(2, 1)],
        m[(0, 2)],
        m[(1, 2)],
        m[(2, 2)],
        t.x,
        t.y,
        t.z,
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
