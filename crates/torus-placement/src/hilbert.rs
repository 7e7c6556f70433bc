//! Hilbert curve over an n-dimensional hypercube of side `2^order`.
//!
//! Uses Skilling's transpose formulation ("Programming the Hilbert curve",
//! AIP Conf. Proc. 707, 2004). A distance's bits are dealt round-robin onto
//! the axes (most significant first, axis 0 first), giving the transposed
//! form that the Gray-code steps operate on.

/// A Hilbert curve with `order` bits per axis over `dimensions` axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HilbertCurve {
    order: u32,
    dimensions: usize,
}

impl HilbertCurve {
    /// Both arguments are clamped so that `order >= 1`, `dimensions >= 1`
    /// and a distance (`order * dimensions` bits) fits in a `u64`.
    pub fn new(order: u32, dimensions: usize) -> Self {
        let dimensions = dimensions.clamp(1, 64);
        let max_order = (64 / dimensions).min(63) as u32;
        Self {
            order: order.clamp(1, max_order),
            dimensions,
        }
    }

    /// Smallest 3D curve whose side `2^order` covers every axis of `axes`.
    pub fn covering(axes: [usize; 3]) -> Self {
        let longest = axes.into_iter().max().unwrap_or(1);
        let mut order = 1;
        while (1usize << order) < longest {
            order += 1;
        }
        Self::new(order, 3)
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Position of `point` along the curve. Each coordinate must be `< 2^order`.
    pub fn distance_from_point(&self, point: &[u64]) -> u64 {
        let n = self.dimensions;
        let mut x = point.to_vec();
        let m = 1u64 << (self.order - 1);

        // Inverse undo.
        let mut q = m;
        while q > 1 {
            let p = q - 1;
            for i in 0..n {
                if x[i] & q != 0 {
                    x[0] ^= p;
                } else {
                    let t = (x[0] ^ x[i]) & p;
                    x[0] ^= t;
                    x[i] ^= t;
                }
            }
            q >>= 1;
        }

        // Gray encode.
        for i in 1..n {
            x[i] ^= x[i - 1];
        }
        let mut t = 0;
        let mut q = m;
        while q > 1 {
            if x[n - 1] & q != 0 {
                t ^= q - 1;
            }
            q >>= 1;
        }
        for xi in x.iter_mut() {
            *xi ^= t;
        }

        self.transpose_to_distance(&x)
    }

    /// Inverse of [`HilbertCurve::distance_from_point`].
    pub fn point_from_distance(&self, distance: u64) -> Vec<u64> {
        let n = self.dimensions;
        let mut x = self.distance_to_transpose(distance);
        let z = 1u64 << self.order;

        // Gray decode.
        let t = x[n - 1] >> 1;
        for i in (1..n).rev() {
            x[i] ^= x[i - 1];
        }
        x[0] ^= t;

        // Undo excess work.
        let mut q = 2;
        while q != z {
            let p = q - 1;
            for i in (0..n).rev() {
                if x[i] & q != 0 {
                    x[0] ^= p;
                } else {
                    let t = (x[0] ^ x[i]) & p;
                    x[0] ^= t;
                    x[i] ^= t;
                }
            }
            q <<= 1;
        }
        x
    }

    fn transpose_to_distance(&self, x: &[u64]) -> u64 {
        let mut h = 0u64;
        for bit in (0..self.order).rev() {
            for xi in x {
                h = (h << 1) | ((xi >> bit) & 1);
            }
        }
        h
    }

    fn distance_to_transpose(&self, h: u64) -> Vec<u64> {
        let n = self.dimensions;
        let total = self.order as usize * n;
        let mut x = vec![0u64; n];
        for pos in 0..total {
            // `pos` counts from the most significant of the `total` bits.
            let bit = (h >> (total - 1 - pos)) & 1;
            let axis = pos % n;
            x[axis] = (x[axis] << 1) | bit;
        }
        x
    }
}
