use super::*;
use crate::mesh::fixtures::cube;
use approx::assert_relative_eq;

fn offset_cube() -> Mesh {
    cube(DVec3::new(1.0, 0.5, 0.25), 1.0)
}

// =============================================================================
// SHORTCUTS
// =============================================================================

#[test]
fn test_union_with_empty_returns_other() {
    let a = cube(DVec3::ZERO, 1.0);
    assert_eq!(union(&Mesh::new(), &a).unwrap(), a);
    assert_eq!(union(&a, &Mesh::new()).unwrap(), a);
    assert!(intersection(&a, &Mesh::new()).unwrap().is_empty());
}

#[test]
fn test_disjoint_union_concatenates() {
    let a = cube(DVec3::ZERO, 0.5);
    let b = cube(DVec3::new(3.0, 0.0, 0.0), 0.5);
    let result = union(&a, &b).unwrap();
    assert_eq!(result.triangle_count(), 24);
    assert_eq!(result.shell_count(), 2);
    assert!(result.is_closed());
}

#[test]
fn test_disjoint_difference_and_intersection() {
    let a = cube(DVec3::ZERO, 0.5);
    let b = cube(DVec3::new(3.0, 0.0, 0.0), 0.5);
    assert_eq!(difference(&a, &b).unwrap(), a);
    assert!(intersection(&a, &b).unwrap().is_empty());
}

#[test]
fn test_non_finite_operand_fails() {
    let a = cube(DVec3::ZERO, 1.0);
    let mut b = cube(DVec3::ZERO, 1.0);
    b.translate(DVec3::new(f64::NAN, 0.0, 0.0));
    assert!(matches!(
        union(&a, &b),
        Err(MeshError::BooleanFailed { .. })
    ));
}

// =============================================================================
// OVERLAPPING OPERANDS
// =============================================================================

#[test]
fn test_union_overlapping_volume() {
    let result = union(&cube(DVec3::ZERO, 1.0), &offset_cube()).unwrap();
    // 8 + 8 - (1.0 * 1.5 * 1.75)
    assert_relative_eq!(result.volume(), 13.375, epsilon = 1e-6);
}

#[test]
fn test_difference_overlapping_volume() {
    let result = difference(&cube(DVec3::ZERO, 1.0), &offset_cube()).unwrap();
    assert_relative_eq!(result.volume(), 5.375, epsilon = 1e-6);
}

#[test]
fn test_intersection_overlapping_volume() {
    let result = intersection(&cube(DVec3::ZERO, 1.0), &offset_cube()).unwrap();
    assert_relative_eq!(result.volume(), 2.625, epsilon = 1e-6);
}

#[test]
fn test_union_with_itself_is_identity() {
    let a = cube(DVec3::ZERO, 1.0);
    let result = union(&a, &a).unwrap();
    assert_relative_eq!(result.volume(), a.volume(), epsilon = 1e-9);
    assert_eq!(result.triangle_count(), 12);
    assert!(result.is_closed());
}

// =============================================================================
// NESTED OPERANDS
// =============================================================================

#[test]
fn test_union_swallows_nested_operand() {
    let outer = cube(DVec3::ZERO, 1.0);
    let result = union(&outer, &cube(DVec3::ZERO, 0.5)).unwrap();
    assert_eq!(result.triangle_count(), 12);
    assert_relative_eq!(result.volume(), 8.0, epsilon = 1e-12);
}

#[test]
fn test_difference_of_nested_operand_leaves_cavity() {
    let outer = cube(DVec3::ZERO, 1.0);
    let result = difference(&outer, &cube(DVec3::ZERO, 0.5)).unwrap();
    assert_eq!(result.triangle_count(), 24);
    assert_eq!(result.shell_count(), 2);
    assert!(result.is_closed());
    assert_relative_eq!(result.volume(), 7.0, epsilon = 1e-12);
}

#[test]
fn test_intersection_of_nested_operand_is_inner() {
    let inner = cube(DVec3::ZERO, 0.5);
    let result = intersection(&cube(DVec3::ZERO, 1.0), &inner).unwrap();
    assert_relative_eq!(result.volume(), 1.0, epsilon = 1e-12);
    assert!(result.is_closed());
}
