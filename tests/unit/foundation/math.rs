use super::*;

#[test]
fn solves_small_system_with_pivoting() {
    // First pivot is zero, so the solver has to swap rows.
    let mut a = Matrix::from_rows(&[&[0.0, 2.0, 1.0], &[1.0, 1.0, 0.0], &[2.0, 0.0, 3.0]]);
    let mut b = vec![5.0, 3.0, 11.0];
    let x = solve_in_place(&mut a, &mut b).unwrap();
    for (got, want) in x.iter().zip([1.75, 1.25, 2.5]) {
        assert!((got - want).abs() < 1e-10);
    }
}

#[test]
fn singular_system_is_reported() {
    let mut a = Matrix::from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]);
    let mut b = vec![1.0, 2.0];
    assert!(solve_in_place(&mut a, &mut b).is_none());
}

#[test]
fn damped_step_only_moves_active_columns() {
    // Residual e = x0 + x1 - 1 at x = 0, i.e. e = -1.
    let j = Matrix::from_rows(&[&[1.0, 1.0]]);
    let dx = damped_least_squares_step(&j, &[-1.0], 0.0, &[1]).unwrap();
    assert_eq!(dx[0], 0.0);
    assert!((dx[1] - 1.0).abs() < 1e-12);
}

#[test]
fn set_block_places_sub_matrix() {
    let mut m = Matrix::zeros(3, 4);
    m.set_block(1, 2, &Matrix::identity(2));
    assert_eq!(m[(1, 2)], 1.0);
    assert_eq!(m[(2, 3)], 1.0);
    assert_eq!(m[(1, 3)], 0.0);
    assert_eq!(m.row(0), &[0.0; 4]);
}
