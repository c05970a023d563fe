//! Rotation fitting: minimal single-pair alignment and least-squares bundle
//! alignment.

use nalgebra::{Matrix3, Rotation3, Unit, UnitQuaternion, Vector3};

/// Directions shorter than this are treated as zero length and excluded from
/// fits.
pub const DIRECTION_EPS: f64 = 1e-9;

/// Result of a single-pair fit.
pub struct PairFit {
    /// The fitted rotation.
    pub rotation: UnitQuaternion<f64>,
    /// True if the directions were anti-parallel and the rotation axis had
    /// to be chosen arbitrarily (perpendicular to `from`).
    pub antiparallel: bool,
}

/// Minimal-angle rotation mapping the unit direction `from` onto the unit
/// direction `to`.
///
/// Axis is the normalized cross product, angle the angle between the
/// directions. Parallel inputs yield the identity. Anti-parallel inputs leave
/// the axis undefined; any axis perpendicular to `from` is valid, and one is
/// picked deterministically with `antiparallel` set so callers can report it.
pub fn fit_pair(from: &Vector3<f64>, to: &Vector3<f64>) -> PairFit {
    match UnitQuaternion::rotation_between(from, to) {
        Some(rotation) => PairFit {
            rotation,
            antiparallel: false,
        },
        None => {
            let axis = perpendicular_to(from);
            PairFit {
                rotation: UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI),
                antiparallel: true,
            }
        }
    }
}

/// Least-squares rotation mapping each `rest` direction onto its `observed`
/// counterpart (Kabsch, via SVD of the cross-covariance matrix).
///
/// Inputs must be unit length. Returns `None` only if the SVD fails to
/// converge, which callers treat like a fully degenerate frame.
pub fn fit_bundle(pairs: &[(Vector3<f64>, Vector3<f64>)]) -> Option<UnitQuaternion<f64>> {
    let mut cross_covariance = Matrix3::zeros();
    for (rest, observed) in pairs {
        cross_covariance += observed * rest.transpose();
    }

    let svd = cross_covariance.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    // Guard against reflections: force det(R) = +1.
    let det = (u * v_t).determinant();
    let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, det.signum()));
    let rotation = u * correction * v_t;

    Some(UnitQuaternion::from_rotation_matrix(
        &Rotation3::from_matrix_unchecked(rotation),
    ))
}

/// A deterministic unit vector perpendicular to `v`.
fn perpendicular_to(v: &Vector3<f64>) -> Unit<Vector3<f64>> {
    let reference = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(v.cross(&reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_pair_quarter_turn() {
        // Rest (0,1,0) to observed (1,0,0) is exactly 90 degrees about -z.
        let fit = fit_pair(&Vector3::y(), &Vector3::x());
        assert!(!fit.antiparallel);
        assert_relative_eq!(fit.rotation.angle(), FRAC_PI_2, epsilon = 1e-12);
        let axis = fit.rotation.axis().unwrap();
        assert_relative_eq!(axis.into_inner(), -Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(fit.rotation * Vector3::y(), Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_pair_parallel_is_identity() {
        let fit = fit_pair(&Vector3::y(), &Vector3::y());
        assert!(!fit.antiparallel);
        assert_relative_eq!(fit.rotation.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pair_antiparallel_flagged() {
        let fit = fit_pair(&Vector3::y(), &(-Vector3::y()));
        assert!(fit.antiparallel);
        assert_relative_eq!(fit.rotation * Vector3::y(), -Vector3::y(), epsilon = 1e-12);
        // The chosen axis must be perpendicular to the rest direction.
        let axis = fit.rotation.axis().unwrap();
        assert_relative_eq!(axis.dot(&Vector3::y()), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bundle_recovers_known_rotation() {
        let expected = UnitQuaternion::from_euler_angles(0.3, -0.8, 1.2);
        let rests = [Vector3::x(), Vector3::y(), Vector3::new(0.0, 0.6, 0.8)];
        let pairs: Vec<_> = rests.iter().map(|r| (*r, expected * r)).collect();

        let fitted = fit_bundle(&pairs).unwrap();
        assert_relative_eq!(fitted.angle_to(&expected), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bundle_two_orthogonal_pairs_exact() {
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.7);
        let pairs = vec![
            (Vector3::x(), expected * Vector3::x()),
            (Vector3::y(), expected * Vector3::y()),
        ];
        let fitted = fit_bundle(&pairs).unwrap();
        assert_relative_eq!(fitted.angle_to(&expected), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bundle_never_reflects() {
        // Nearly coplanar bundles can push the SVD toward a reflection; the
        // determinant correction must keep the result a proper rotation.
        let pairs = vec![
            (Vector3::x(), Vector3::y()),
            (Vector3::y(), Vector3::x()),
        ];
        let fitted = fit_bundle(&pairs).unwrap();
        let det = fitted.to_rotation_matrix().matrix().determinant();
        assert_relative_eq!(det, 1.0, epsilon = 1e-9);
    }
}
