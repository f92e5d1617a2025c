//   Copyright 2026 equivar developers
//
//   Licensed under the Apache License, Version 2.0 (the "License");
//   you may not use this file except in compliance with the License.
//   You may obtain a copy of the License at
//
//       http://www.apache.org/licenses/LICENSE-2.0
//
//   Unless required by applicable law or agreed to in writing, software
//   distributed under the License is distributed on an "AS IS" BASIS,
//   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//   See the License for the specific language governing permissions and
//   limitations under the License.

//! Affine warping of image planes via bilinear interpolation

use ndarray::{Array2, ArrayView2};
use num_traits::float::Float;

/// An affine map over (row, column) pixel coordinates.
///
/// When interpreted as a pullback, it maps each output pixel to the
/// coordinate in the source image that should be sampled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineMap<A> {
    pub linear: [[A; 2]; 2],
    pub offset: [A; 2],
}

impl<A: Float> AffineMap<A> {
    /// Creates the identity map.
    #[inline(always)]
    pub fn identity() -> AffineMap<A> {
        AffineMap {
            linear: [[A::one(), A::zero()], [A::zero(), A::one()]],
            offset: [A::zero(), A::zero()],
        }
    }

    /// Maps the coordinate (r, c) through this affine map.
    #[inline(always)]
    pub fn apply(&self, r: A, c: A) -> (A, A) {
        (
            self.linear[0][0] * r + self.linear[0][1] * c + self.offset[0],
            self.linear[1][0] * r + self.linear[1][1] * c + self.offset[1],
        )
    }
}

/// Warps the image plane `x` by sampling each output pixel at the source
/// coordinate given by ``pullback``.
///
/// Samples are interpolated bilinearly from the four surrounding pixels.
/// Coordinates outside of the source image contribute zero (zero padding).
pub fn warp_bilinear<A: Float>(x: &ArrayView2<'_, A>, pullback: &AffineMap<A>) -> Array2<A> {
    let (height, width) = x.dim();
    let mut out = Array2::zeros((height, width));

    for ((r, c), value) in out.indexed_iter_mut() {
        let (src_r, src_c) = pullback.apply(A::from(r).unwrap(), A::from(c).unwrap());
        *value = sample_bilinear(x, src_r, src_c);
    }

    out
}

/// Samples `x` at the fractional coordinate (r, c) with zero padding.
pub fn sample_bilinear<A: Float>(x: &ArrayView2<'_, A>, r: A, c: A) -> A {
    if !(r.is_finite() && c.is_finite()) {
        return A::zero();
    }

    let r0 = r.floor();
    let c0 = c.floor();
    let dr = r - r0;
    let dc = c - c0;

    let ri = match r0.to_isize() {
        Some(val) => val,
        None => return A::zero(),
    };
    let ci = match c0.to_isize() {
        Some(val) => val,
        None => return A::zero(),
    };

    let one = A::one();
    pixel(x, ri, ci) * (one - dr) * (one - dc)
        + pixel(x, ri, ci + 1) * (one - dr) * dc
        + pixel(x, ri + 1, ci) * dr * (one - dc)
        + pixel(x, ri + 1, ci + 1) * dr * dc
}

#[inline(always)]
fn pixel<A: Float>(x: &ArrayView2<'_, A>, r: isize, c: isize) -> A {
    if r < 0 || c < 0 {
        return A::zero();
    }
    let (height, width) = x.dim();
    if r as usize >= height || c as usize >= width {
        return A::zero();
    }
    x[(r as usize, c as usize)]
}
