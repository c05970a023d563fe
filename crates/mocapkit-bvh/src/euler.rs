//! Euler decomposition and composition for arbitrary Tait-Bryan orders.

use std::f64::consts::PI;

use nalgebra::{Matrix3, Unit, UnitQuaternion, Vector3};

use crate::types::RotationOrder;

/// Below this cosine of the middle angle the two decomposition branches are
/// close enough that snapping between them is visible; we pick the branch
/// nearest the previous frame and report it.
const NEAR_GIMBAL_COS: f64 = 0.02;

/// Below this the decomposition is fully degenerate (middle angle at
/// exactly ±90°): the first and third angles are coupled and only their
/// combination is observable.
const HARD_GIMBAL_COS: f64 = 1e-9;

/// An orientation decomposed into three Euler angles (radians), in the
/// intrinsic application order of the `RotationOrder` used.
pub(crate) struct EulerDecomposition {
    pub angles: [f64; 3],
    /// True if the orientation was near gimbal lock and branch selection or
    /// angle coupling kicked in.
    pub near_gimbal: bool,
}

/// Decomposes `rotation` into intrinsic Euler angles for `order`.
///
/// `previous` is the previous frame's decomposition for the same node; near
/// gimbal lock the branch nearest to it is chosen so consecutive frames do
/// not jump between equivalent decompositions.
pub(crate) fn quat_to_euler(
    rotation: &UnitQuaternion<f64>,
    order: RotationOrder,
    previous: Option<[f64; 3]>,
) -> EulerDecomposition {
    let m = rotation.to_rotation_matrix().into_inner();
    let [i, j, k] = order.axes();
    let s = order.sign();

    let sin_middle = (s * m[(i, k)]).clamp(-1.0, 1.0);
    let middle = sin_middle.asin();
    let cos_middle = (1.0 - sin_middle * sin_middle).sqrt();

    if cos_middle <= HARD_GIMBAL_COS {
        // Fully locked: hold the previous third angle (zero without one) and
        // fold everything else into the first.
        let third = previous.map_or(0.0, |p| p[2]);
        let stripped = m * axis_rotation(k, -third);
        let first = (s * stripped[(k, j)]).atan2(stripped[(j, j)]);
        return EulerDecomposition {
            angles: [first, middle, third],
            near_gimbal: true,
        };
    }

    let first = (-s * m[(j, k)]).atan2(m[(k, k)]);
    let third = (-s * m[(i, j)]).atan2(m[(i, i)]);
    let principal = [first, middle, third];

    if cos_middle > NEAR_GIMBAL_COS {
        return EulerDecomposition {
            angles: principal,
            near_gimbal: false,
        };
    }

    // Near lock: the mirrored branch describes the same orientation; take
    // whichever continues the previous frame more smoothly.
    let mirrored = [
        wrap_angle(first + PI),
        if middle >= 0.0 { PI - middle } else { -PI - middle },
        wrap_angle(third + PI),
    ];
    let angles = match previous {
        Some(previous) if branch_distance(&mirrored, &previous) < branch_distance(&principal, &previous) => {
            mirrored
        }
        _ => principal,
    };
    EulerDecomposition {
        angles,
        near_gimbal: true,
    }
}

/// Composes intrinsic Euler angles (radians) back into an orientation.
pub(crate) fn euler_to_quat(order: RotationOrder, angles: [f64; 3]) -> UnitQuaternion<f64> {
    let [i, j, k] = order.axes();
    axis_quat(i, angles[0]) * axis_quat(j, angles[1]) * axis_quat(k, angles[2])
}

fn axis_unit(axis: usize) -> Unit<Vector3<f64>> {
    match axis {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        _ => Vector3::z_axis(),
    }
}

fn axis_quat(axis: usize, angle: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&axis_unit(axis), angle)
}

fn axis_rotation(axis: usize, angle: f64) -> Matrix3<f64> {
    axis_quat(axis, angle).to_rotation_matrix().into_inner()
}

/// Wraps an angle into (-π, π].
fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (-angle + PI).rem_euclid(2.0 * PI);
    PI - wrapped
}

fn branch_distance(candidate: &[f64; 3], previous: &[f64; 3]) -> f64 {
    candidate
        .iter()
        .zip(previous)
        .map(|(a, b)| wrap_angle(a - b).powi(2))
        .sum()
}
