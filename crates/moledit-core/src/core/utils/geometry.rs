use nalgebra::{Point3, Rotation3, Unit, Vector3};
use std::f64::consts::{PI, TAU};

/// Lengths closer than this to their target (Angstroms) are left untouched.
pub const LENGTH_TOLERANCE: f64 = 1e-6;
/// Angles closer than this to their target (radians) are left untouched.
pub const ANGLE_TOLERANCE: f64 = 1e-9;
/// Below this norm a vector is treated as having no direction.
const DEGENERACY_EPSILON: f64 = 1e-12;
/// Below this sine of the `p1-pivot-p3` angle the plane normal is too noisy to use.
const COLLINEAR_SINE: f64 = 1e-8;

/// A degenerate geometric situation that was resolved by a fixed fallback rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryWarning {
    /// The two atoms of a length edit coincide; the +X direction was used.
    CoincidentAtoms,
    /// The three atoms of an angle edit are collinear; a perpendicular fallback axis was used.
    CollinearAngle,
    /// An arm or axis of an angle/dihedral edit has zero length; nothing was moved.
    ZeroLengthVector,
    /// An outer atom lies on the dihedral axis, so the dihedral is undefined; nothing was moved.
    UndefinedDihedral,
    /// The edited bond closes a ring, so the whole connected component was moved.
    RingClosure,
}

/// New positions for a fragment, as produced by one of the transform functions.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentTransform {
    /// The transformed positions, in the same order as the input fragment.
    pub positions: Vec<Point3<f64>>,
    /// The measured value before the transform (Angstroms or radians), if defined.
    pub previous: Option<f64>,
    /// `false` when the target was already met or the geometry was unusable.
    pub moved: bool,
    pub warning: Option<GeometryWarning>,
}

impl FragmentTransform {
    fn unchanged(
        fragment: &[Point3<f64>],
        previous: Option<f64>,
        warning: Option<GeometryWarning>,
    ) -> Self {
        Self {
            positions: fragment.to_vec(),
            previous,
            moved: false,
            warning,
        }
    }
}

pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (b - a).norm()
}

/// Unsigned angle between two vectors in radians, in `[0, π]`.
///
/// Uses `atan2(|a × b|, a · b)`, which stays accurate near 0 and π.
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.cross(b).norm().atan2(a.dot(b))
}

/// Angle `p1-pivot-p3` in radians, or `None` if either arm has zero length.
pub fn measure_angle(p1: &Point3<f64>, pivot: &Point3<f64>, p3: &Point3<f64>) -> Option<f64> {
    let v1 = p1 - pivot;
    let v2 = p3 - pivot;
    if v1.norm() < DEGENERACY_EPSILON || v2.norm() < DEGENERACY_EPSILON {
        return None;
    }
    Some(angle_between(&v1, &v2))
}

/// Signed dihedral `p1-p2-p3-p4` in radians, in `(-π, π]`.
///
/// Returns `None` if the axis `p2 → p3` has zero length or an outer atom lies on it.
pub fn measure_dihedral(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    p4: &Point3<f64>,
) -> Option<f64> {
    let axis_vec = p3 - p2;
    if axis_vec.norm() < DEGENERACY_EPSILON {
        return None;
    }
    let axis = axis_vec.normalize();

    let v1 = p1 - p2;
    let v2 = p4 - p3;
    let proj1 = v1 - axis * v1.dot(&axis);
    let proj2 = v2 - axis * v2.dot(&axis);
    if proj1.norm() < DEGENERACY_EPSILON || proj2.norm() < DEGENERACY_EPSILON {
        return None;
    }

    Some(wrap_angle(
        proj1.cross(&proj2).dot(&axis).atan2(proj1.dot(&proj2)),
    ))
}

/// Maps an angle in radians onto `(-π, π]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// A unit vector perpendicular to `v`.
///
/// `v` is crossed with the coordinate axis along which it has the smallest
/// absolute component (ties resolved towards X, then Y), so the result only
/// depends on `v`.
pub fn perpendicular_axis(v: &Vector3<f64>) -> Unit<Vector3<f64>> {
    let abs = v.abs();
    let basis = if abs.x <= abs.y && abs.x <= abs.z {
        Vector3::x()
    } else if abs.y <= abs.z {
        Vector3::y()
    } else {
        Vector3::z()
    };
    Unit::new_normalize(v.cross(&basis))
}

fn rotate_about_point(
    points: &[Point3<f64>],
    origin: &Point3<f64>,
    rotation: &Rotation3<f64>,
) -> Vec<Point3<f64>> {
    points
        .iter()
        .map(|p| origin + rotation * (p - origin))
        .collect()
}

/// Unweighted centroid of a point set, or `None` if it is empty.
pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Bounding sphere centred on the centroid: `(centre, radius)`.
pub fn bounding_sphere(points: &[Point3<f64>]) -> Option<(Point3<f64>, f64)> {
    let center = centroid(points)?;
    let radius = points
        .iter()
        .map(|p| distance(&center, p))
        .fold(0.0, f64::max);
    Some((center, radius))
}

/// Moves a fragment so that the `fixed`–`moving` distance equals `target`.
///
/// The moving atom is placed on the ray from `fixed` through its current
/// position, and every fragment position receives the same displacement, so
/// geometry inside the fragment is preserved exactly.
pub fn bond_length(
    fixed: &Point3<f64>,
    moving: &Point3<f64>,
    fragment: &[Point3<f64>],
    target: f64,
) -> FragmentTransform {
    let offset = moving - fixed;
    let current = offset.norm();
    if (current - target).abs() < LENGTH_TOLERANCE {
        return FragmentTransform::unchanged(fragment, Some(current), None);
    }

    let (direction, warning) = if current < DEGENERACY_EPSILON {
        (Vector3::x(), Some(GeometryWarning::CoincidentAtoms))
    } else {
        (offset / current, None)
    };

    let new_moving = fixed + direction * target;
    let displacement = new_moving - moving;

    FragmentTransform {
        positions: fragment.iter().map(|p| p + displacement).collect(),
        previous: Some(current),
        moved: true,
        warning,
    }
}

/// Rotates a fragment about `pivot` so that the angle `p1-pivot-p3` equals `target_radians`.
///
/// The rotation axis is the normal of the `p1, pivot, p3` plane. When the three
/// points are collinear, or so nearly collinear that the normal is dominated by
/// rounding, that normal does not exist and [`perpendicular_axis`] of
/// `p1 - pivot` is used instead; any such axis reaches the target.
pub fn angle(
    p1: &Point3<f64>,
    pivot: &Point3<f64>,
    p3: &Point3<f64>,
    fragment: &[Point3<f64>],
    target_radians: f64,
) -> FragmentTransform {
    let v1 = p1 - pivot;
    let v2 = p3 - pivot;
    let (n1, n2) = (v1.norm(), v2.norm());
    if n1 < DEGENERACY_EPSILON || n2 < DEGENERACY_EPSILON {
        return FragmentTransform::unchanged(
            fragment,
            None,
            Some(GeometryWarning::ZeroLengthVector),
        );
    }

    let current = angle_between(&v1, &v2);
    if (current - target_radians).abs() < ANGLE_TOLERANCE {
        return FragmentTransform::unchanged(fragment, Some(current), None);
    }

    let normal = v1.cross(&v2);
    let (raw_axis, warning) = if normal.norm() < COLLINEAR_SINE * n1 * n2 {
        (
            perpendicular_axis(&v1).into_inner(),
            Some(GeometryWarning::CollinearAngle),
        )
    } else {
        (normal, None)
    };
    // Keep the axis exactly perpendicular to the fixed arm.
    let u1 = v1 / n1;
    let axis = Unit::new_normalize(raw_axis - u1 * raw_axis.dot(&u1));

    let rotation = Rotation3::from_axis_angle(&axis, target_radians - current);

    FragmentTransform {
        positions: rotate_about_point(fragment, pivot, &rotation),
        previous: Some(current),
        moved: true,
        warning,
    }
}

/// Rotates a fragment about the `p2 → p3` axis so that the dihedral `p1-p2-p3-p4`
/// equals `target_radians`.
///
/// The rotation line passes through `p3`, the axis atom on the side of the moving
/// fragment.
pub fn dihedral(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    p4: &Point3<f64>,
    fragment: &[Point3<f64>],
    target_radians: f64,
) -> FragmentTransform {
    let axis_vec = p3 - p2;
    if axis_vec.norm() < DEGENERACY_EPSILON {
        return FragmentTransform::unchanged(
            fragment,
            None,
            Some(GeometryWarning::ZeroLengthVector),
        );
    }
    let Some(current) = measure_dihedral(p1, p2, p3, p4) else {
        return FragmentTransform::unchanged(
            fragment,
            None,
            Some(GeometryWarning::UndefinedDihedral),
        );
    };

    let delta = wrap_angle(target_radians - current);
    if delta.abs() < ANGLE_TOLERANCE {
        return FragmentTransform::unchanged(fragment, Some(current), None);
    }

    let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axis_vec), delta);

    FragmentTransform {
        positions: rotate_about_point(fragment, p3, &rotation),
        previous: Some(current),
        moved: true,
        warning: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_points_close(a: &Point3<f64>, b: &Point3<f64>) {
        assert!(distance(a, b) < EPS, "expected {b:?}, got {a:?}");
    }

    mod measurements {
        use super::*;

        #[test]
        fn angle_between_handles_parallel_and_antiparallel() {
            let x = Vector3::x();
            assert!((angle_between(&x, &(x * 3.0)) - 0.0).abs() < 1e-12);
            assert!((angle_between(&x, &-x) - PI).abs() < 1e-12);
            assert!((angle_between(&x, &Vector3::y()) - PI / 2.0).abs() < 1e-12);
        }

        #[test]
        fn measure_dihedral_is_signed() {
            let p1 = Point3::new(1.0, 0.0, 0.0);
            let p2 = Point3::new(0.0, 0.0, 0.0);
            let p3 = Point3::new(0.0, 0.0, 1.0);
            let p4_plus = Point3::new(0.0, 1.0, 1.0);
            let p4_minus = Point3::new(0.0, -1.0, 1.0);

            let plus = measure_dihedral(&p1, &p2, &p3, &p4_plus).unwrap();
            let minus = measure_dihedral(&p1, &p2, &p3, &p4_minus).unwrap();
            assert!((plus - PI / 2.0).abs() < 1e-12);
            assert!((minus + PI / 2.0).abs() < 1e-12);
        }

        #[test]
        fn measure_dihedral_is_none_for_atoms_on_the_axis() {
            let p = Point3::origin();
            let axis_end = Point3::new(0.0, 0.0, 1.0);
            let on_axis = Point3::new(0.0, 0.0, -1.0);
            let off_axis = Point3::new(1.0, 0.0, 1.0);
            assert!(measure_dihedral(&on_axis, &p, &axis_end, &off_axis).is_none());
            assert!(measure_dihedral(&off_axis, &p, &p, &off_axis).is_none());
        }

        #[test]
        fn wrap_angle_maps_into_half_open_range() {
            assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-12);
            assert!((wrap_angle(-PI) - PI).abs() < 1e-12);
            assert!((wrap_angle(1.5 * PI) + 0.5 * PI).abs() < 1e-12);
            assert!((wrap_angle(0.25) - 0.25).abs() < 1e-12);
        }

        #[test]
        fn perpendicular_axis_is_deterministic_and_perpendicular() {
            for v in [
                Vector3::new(-1.0, 0.0, 0.0),
                Vector3::new(0.0, 2.0, 0.0),
                Vector3::new(0.0, 0.0, 5.0),
                Vector3::new(1.0, 1.0, 1.0),
                Vector3::new(0.3, -2.0, 0.7),
            ] {
                let axis = perpendicular_axis(&v);
                assert!(axis.dot(&v).abs() < 1e-12);
                assert!((axis.norm() - 1.0).abs() < 1e-12);
                assert_eq!(axis, perpendicular_axis(&v));
            }
        }

        #[test]
        fn bounding_sphere_encloses_all_points() {
            let points = [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(1.0, 3.0, 0.0),
            ];
            let (center, radius) = bounding_sphere(&points).unwrap();
            assert_points_close(&center, &Point3::new(1.0, 1.0, 0.0));
            for p in &points {
                assert!(distance(&center, p) <= radius + 1e-12);
            }
            assert!(bounding_sphere(&[]).is_none());
        }
    }

    mod length {
        use super::*;

        #[test]
        fn reaches_target_for_varied_geometries() {
            let cases = [
                (Point3::new(0.0, 0.0, 0.0), Point3::new(1.5, 0.0, 0.0), 1.2),
                (Point3::new(1.0, -2.0, 0.5), Point3::new(2.0, 1.0, -1.0), 0.8),
                (Point3::new(-3.0, 4.0, 2.0), Point3::new(-3.1, 4.2, 2.05), 2.5),
                (Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 10.0), 1e-3),
            ];
            for (fixed, moving, target) in cases {
                let result = bond_length(&fixed, &moving, &[moving], target);
                assert!((distance(&fixed, &result.positions[0]) - target).abs() < EPS);
                assert!(result.moved);
                assert_eq!(result.warning, None);
            }
        }

        #[test]
        fn translates_the_whole_fragment_rigidly() {
            let fixed = Point3::new(0.0, 0.0, 0.0);
            let moving = Point3::new(1.5, 0.0, 0.0);
            let fragment = [moving, Point3::new(2.0, 1.0, 0.0), Point3::new(2.5, -1.0, 0.3)];

            let result = bond_length(&fixed, &moving, &fragment, 1.2);

            assert_points_close(&result.positions[0], &Point3::new(1.2, 0.0, 0.0));
            for (before, after) in fragment.iter().zip(&result.positions) {
                assert_points_close(&(before + Vector3::new(-0.3, 0.0, 0.0)), after);
            }
            assert!((result.previous.unwrap() - 1.5).abs() < 1e-12);
        }

        #[test]
        fn second_application_is_a_no_op() {
            let fixed = Point3::new(0.2, 0.1, -0.4);
            let moving = Point3::new(1.1, 0.9, 0.3);
            let first = bond_length(&fixed, &moving, &[moving], 1.7);
            let second = bond_length(&fixed, &first.positions[0], &first.positions, 1.7);

            assert!(!second.moved);
            assert_eq!(second.positions, first.positions);
        }

        #[test]
        fn coincident_atoms_fall_back_to_the_x_axis() {
            let p = Point3::new(1.0, 1.0, 1.0);
            let result = bond_length(&p, &p, &[p], 1.0);

            assert_eq!(result.warning, Some(GeometryWarning::CoincidentAtoms));
            assert_points_close(&result.positions[0], &Point3::new(2.0, 1.0, 1.0));
        }
    }

    mod angle_edits {
        use super::*;

        #[test]
        fn collinear_straight_angle_reaches_target() {
            let a = Point3::new(0.0, 0.0, 0.0);
            let b = Point3::new(1.0, 0.0, 0.0);
            let c = Point3::new(2.0, 0.0, 0.0);

            let result = angle(&a, &b, &c, &[c], 90f64.to_radians());

            assert_eq!(result.warning, Some(GeometryWarning::CollinearAngle));
            let measured = measure_angle(&a, &b, &result.positions[0]).unwrap();
            assert!((measured.to_degrees() - 90.0).abs() < EPS);
            assert!((distance(&b, &result.positions[0]) - 1.0).abs() < EPS);
        }

        #[test]
        fn collinear_zero_angle_reaches_target() {
            let a = Point3::new(2.0, 0.0, 0.0);
            let b = Point3::new(0.0, 0.0, 0.0);
            let c = Point3::new(1.0, 0.0, 0.0);

            let result = angle(&a, &b, &c, &[c], 120f64.to_radians());

            assert_eq!(result.warning, Some(GeometryWarning::CollinearAngle));
            let measured = measure_angle(&a, &b, &result.positions[0]).unwrap();
            assert!((measured.to_degrees() - 120.0).abs() < EPS);
        }

        #[test]
        fn nearly_collinear_angle_reaches_target() {
            let a = Point3::new(0.3, -0.2, 0.1);
            let b = Point3::new(1.3, 0.4, -0.5);
            let along = (b - a).normalize();
            let across = along.cross(&Vector3::z()).normalize();

            for sign in [1.0, -1.0] {
                for offset in [1e-13, 1e-12, 1e-11, 1e-10, 1e-9, 1e-8, 1e-7, 1e-6] {
                    let c = b + along * (1.2 * sign) + across * offset;
                    for target in [0.0f64, 90.0, 180.0] {
                        let result = angle(&a, &b, &c, &[c], target.to_radians());

                        let measured = measure_angle(&a, &b, &result.positions[0]).unwrap();
                        assert!(
                            (measured.to_degrees() - target).abs() < EPS,
                            "sign {sign}, offset {offset}, target {target}: got {}",
                            measured.to_degrees()
                        );
                        assert!((distance(&b, &result.positions[0]) - 1.2).abs() < EPS);
                    }
                }
            }
        }

        #[test]
        fn general_angle_rotates_fragment_about_pivot() {
            let a = Point3::new(1.0, 0.0, 0.0);
            let b = Point3::new(0.0, 0.0, 0.0);
            let c = Point3::new(0.0, 1.0, 0.0);
            let tail = Point3::new(0.0, 2.0, 0.5);

            let result = angle(&a, &b, &c, &[c, tail], 109.5f64.to_radians());

            assert_eq!(result.warning, None);
            let measured = measure_angle(&a, &b, &result.positions[0]).unwrap();
            assert!((measured.to_degrees() - 109.5).abs() < EPS);
            // distances to the pivot are preserved for every fragment atom
            assert!((distance(&b, &result.positions[1]) - distance(&b, &tail)).abs() < EPS);
            assert!(
                (distance(&result.positions[0], &result.positions[1]) - distance(&c, &tail)).abs()
                    < EPS
            );
        }

        #[test]
        fn angle_already_at_target_is_unchanged() {
            let a = Point3::new(1.0, 0.0, 0.0);
            let b = Point3::origin();
            let c = Point3::new(0.0, 1.0, 0.0);
            let result = angle(&a, &b, &c, &[c], PI / 2.0);
            assert!(!result.moved);
            assert_eq!(result.positions, vec![c]);
        }

        #[test]
        fn zero_length_arm_leaves_positions_unchanged() {
            let a = Point3::new(1.0, 0.0, 0.0);
            let b = Point3::origin();
            let result = angle(&a, &b, &b, &[b], PI / 2.0);
            assert!(!result.moved);
            assert_eq!(result.warning, Some(GeometryWarning::ZeroLengthVector));
            assert_eq!(result.previous, None);
        }
    }

    mod dihedral_edits {
        use super::*;

        fn butane_like() -> [Point3<f64>; 4] {
            [
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 1.5),
                Point3::new(1.0, 0.0, 1.5),
            ]
        }

        #[test]
        fn reaches_target_dihedral() {
            let [p1, p2, p3, p4] = butane_like();
            for target in [60.0f64, -60.0, 180.0, -179.0, 12.5] {
                let result = dihedral(&p1, &p2, &p3, &p4, &[p3, p4], target.to_radians());
                let measured =
                    measure_dihedral(&p1, &p2, &result.positions[0], &result.positions[1])
                        .unwrap();
                assert!(
                    wrap_angle(measured - target.to_radians()).abs() < 1e-9,
                    "target {target}, got {}",
                    measured.to_degrees()
                );
            }
        }

        #[test]
        fn rotation_is_anchored_at_the_near_axis_atom() {
            let [p1, p2, p3, p4] = butane_like();
            let result = dihedral(&p1, &p2, &p3, &p4, &[p3, p4], 90f64.to_radians());

            assert_points_close(&result.positions[0], &p3);
            assert!((distance(&p3, &result.positions[1]) - distance(&p3, &p4)).abs() < EPS);
            assert_points_close(&result.positions[1], &Point3::new(0.0, 1.0, 1.5));
        }

        #[test]
        fn targets_are_compared_modulo_full_turns() {
            let [p1, p2, p3, p4] = butane_like();
            let result = dihedral(&p1, &p2, &p3, &p4, &[p3, p4], 360f64.to_radians());
            assert!(!result.moved);
            assert!(result.previous.unwrap().abs() < 1e-12);
        }

        #[test]
        fn undefined_dihedral_is_reported_and_nothing_moves() {
            let [_, p2, p3, p4] = butane_like();
            let on_axis = Point3::new(0.0, 0.0, -1.0);
            let result = dihedral(&on_axis, &p2, &p3, &p4, &[p4], 1.0);
            assert!(!result.moved);
            assert_eq!(result.warning, Some(GeometryWarning::UndefinedDihedral));
        }

        #[test]
        fn zero_length_axis_is_reported_and_nothing_moves() {
            let [p1, p2, _, p4] = butane_like();
            let result = dihedral(&p1, &p2, &p2, &p4, &[p4], 1.0);
            assert!(!result.moved);
            assert_eq!(result.warning, Some(GeometryWarning::ZeroLengthVector));
        }
    }
}
