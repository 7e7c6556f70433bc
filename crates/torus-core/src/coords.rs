//! Coordinate mapping between 3D coordinates and plane-major linear indices.
//!
//! `x` varies fastest and `z` slowest: `index = z·(L·W) + y·W + x`. The same
//! convention applies to torus coordinates and to job-local coordinates, with
//! the job's (D, T, P) degrees standing in for (W, L, H).

use crate::types::Coord;

/// Plane-major linear index of `coord` within an extent of `dims`.
pub fn linear_index(coord: Coord, dims: [usize; 3]) -> usize {
    let [w, l, _] = dims;
    coord.z * (l * w) + coord.y * w + coord.x
}

/// Inverse of [`linear_index`].
pub fn coord_from_linear(index: usize, dims: [usize; 3]) -> Coord {
    let [w, l, _] = dims;
    let plane = l * w;
    let z = index / plane;
    let rem = index % plane;
    Coord::new(rem % w, rem / w, z)
}

/// Wrap-around distance along a single axis of size `size`.
pub fn axis_distance(a: usize, b: usize, size: usize) -> usize {
    let direct = a.abs_diff(b);
    direct.min(size - direct)
}

/// Torus L1 distance: per-axis wrap-around distance summed over the three axes.
pub fn torus_l1_distance(dims: [usize; 3], a: Coord, b: Coord) -> usize {
    a.axes()
        .into_iter()
        .zip(b.axes())
        .zip(dims)
        .map(|((p, q), size)| axis_distance(p, q, size))
        .sum()
}
