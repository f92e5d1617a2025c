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

//! Parameterized input transformations over tensor-valued data

use std::fmt::Display;

use ndarray::{Array3, ArrayD, ArrayViewD, Axis};
use thiserror::Error;

use crate::transforms::warp::{warp_bilinear, AffineMap};

/// A deterministic transformation of a tensor-valued input.
///
/// Geometric variants operate on the two trailing axes of the input,
/// which are interpreted as (height, width) of an image plane. All
/// leading axes (channels, feature maps) are transformed independently.
/// Transformations are immutable value types: they carry no state
/// between calls and can be cloned freely across parallel workers.
///
/// Each variant exposes the scalars that parameterize it through
/// [`parameters`](Transformation::parameters) in a fixed order.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformation {
    /// Returns its input unchanged; valid for any shape, no parameters
    Identity,
    /// Rotation around the image center, in degrees
    Rotation { degrees: f64 },
    /// Scaling of width and height around the image center.
    /// Factors must be non-zero.
    Scale { x: f64, y: f64 },
    /// Translation as a fraction of width and height
    Translation { x: f64, y: f64 },
    /// General affine transformation combining rotation, isotropic or
    /// anisotropic scaling (``[x, y]``), and translation (``[x, y]``)
    Affine {
        degrees: f64,
        scale: [f64; 2],
        translation: [f64; 2],
    },
}

#[derive(Error, Clone, Debug, PartialEq)]
pub enum TransformError {
    #[error("Input shape {shape:?} is not supported: at least two non-empty spatial dimensions are required")]
    InvalidInput { shape: Vec<usize> },
    #[error("Parameter range is undefined: the transformation set has no parameters")]
    EmptyRange,
    #[error("Transformation set must contain at least one member")]
    EmptySet,
}

impl Transformation {
    /// Returns the scalar parameters of this transformation in a fixed order.
    ///
    /// The identity has no parameters. Rotations report their angle in
    /// degrees, scalings and translations their (x, y) components, and
    /// affine transformations the concatenation
    /// ``[degrees, scale_x, scale_y, translation_x, translation_y]``.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            Transformation::Identity => Vec::new(),
            Transformation::Rotation { degrees } => vec![*degrees],
            Transformation::Scale { x, y } => vec![*x, *y],
            Transformation::Translation { x, y } => vec![*x, *y],
            Transformation::Affine {
                degrees,
                scale,
                translation,
            } => vec![*degrees, scale[0], scale[1], translation[0], translation[1]],
        }
    }

    /// Checks if this transformation can legally be applied to an input
    /// of the given shape. Never applies the transformation.
    pub fn valid_input(&self, shape: &[usize]) -> bool {
        match self {
            Transformation::Identity => true,
            _ => shape.len() >= 2 && shape[shape.len() - 2..].iter().all(|dim| *dim > 0),
        }
    }

    /// Applies this transformation to the input tensor.
    ///
    /// The result has the same shape as the input. Fails with
    /// [`TransformError::InvalidInput`] if the input shape is outside
    /// the support of this transformation.
    pub fn apply(&self, x: &ArrayViewD<'_, f64>) -> Result<ArrayD<f64>, TransformError> {
        if let Transformation::Identity = self {
            return Ok(x.to_owned());
        }
        if !self.valid_input(x.shape()) {
            return Err(TransformError::InvalidInput {
                shape: x.shape().to_vec(),
            });
        }

        let shape = x.shape().to_vec();
        let rank = shape.len();
        let (height, width) = (shape[rank - 2], shape[rank - 1]);
        let channels: usize = shape[..rank - 2].iter().product();
        let pullback = self.pullback(height, width);

        // freshly owned arrays are in standard layout, so the reshapes are infallible
        let flat = x.to_owned().into_shape((channels, height, width)).unwrap();
        let mut out = Array3::zeros((channels, height, width));
        for (channel, mut plane) in out.outer_iter_mut().enumerate() {
            plane.assign(&warp_bilinear(&flat.index_axis(Axis(0), channel), &pullback));
        }

        Ok(out.into_shape(shape).unwrap())
    }

    /// Constructs the pullback map from output pixels to source pixels
    /// for an image plane of the given size.
    ///
    /// The forward map rotates and scales around the center of the pixel
    /// grid and then translates; the pullback inverts it analytically.
    fn pullback(&self, height: usize, width: usize) -> AffineMap<f64> {
        let (degrees, scale, translation) = self.components();

        let center_r = (height as f64 - 1.0) / 2.0;
        let center_c = (width as f64 - 1.0) / 2.0;
        let shift_r = translation[1] * height as f64;
        let shift_c = translation[0] * width as f64;

        let (sin, cos) = degrees.to_radians().sin_cos();
        let (scale_c, scale_r) = (scale[0], scale[1]);

        let linear = [
            [cos / scale_r, sin / scale_r],
            [-sin / scale_c, cos / scale_c],
        ];
        let offset = [
            linear[0][0] * (-(center_r + shift_r)) + linear[0][1] * (-(center_c + shift_c)) + center_r,
            linear[1][0] * (-(center_r + shift_r)) + linear[1][1] * (-(center_c + shift_c)) + center_c,
        ];

        AffineMap { linear, offset }
    }

    fn components(&self) -> (f64, [f64; 2], [f64; 2]) {
        match self {
            Transformation::Identity => (0.0, [1.0, 1.0], [0.0, 0.0]),
            Transformation::Rotation { degrees } => (*degrees, [1.0, 1.0], [0.0, 0.0]),
            Transformation::Scale { x, y } => (0.0, [*x, *y], [0.0, 0.0]),
            Transformation::Translation { x, y } => (0.0, [1.0, 1.0], [*x, *y]),
            Transformation::Affine {
                degrees,
                scale,
                translation,
            } => (*degrees, *scale, *translation),
        }
    }
}

impl Display for Transformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transformation::Identity => write!(f, "id"),
            Transformation::Rotation { degrees } => write!(f, "rot({})", degrees),
            Transformation::Scale { x, y } => write!(f, "scale({},{})", x, y),
            Transformation::Translation { x, y } => write!(f, "trans({},{})", x, y),
            Transformation::Affine {
                degrees,
                scale,
                translation,
            } => write!(
                f,
                "affine(r={},s={},{},t={},{})",
                degrees, scale[0], scale[1], translation[0], translation[1]
            ),
        }
    }
}
