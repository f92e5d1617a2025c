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

//! Fully connected layer functions

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// A fully connected layer function consisting of a weight matrix
/// W: R^{m x n} and a bias vector b: R^m.
///
/// When applied to an input x, it computes f(x) = W @ x + b.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseFunc {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
}

impl DenseFunc {
    /// Creates a new layer function from a weight matrix and a bias vector.
    #[inline(always)]
    pub fn from_mats(weights: Array2<f64>, bias: Array1<f64>) -> DenseFunc {
        assert_eq!(
            weights.len_of(Axis(0)),
            bias.len_of(Axis(0)),
            "Dimensions mismatch of weights and bias: {} x {} and {}",
            weights.len_of(Axis(0)),
            weights.len_of(Axis(1)),
            bias.len_of(Axis(0))
        );
        DenseFunc { weights, bias }
    }

    /// Number of input features of this layer.
    #[inline(always)]
    pub fn indim(&self) -> usize {
        self.weights.len_of(Axis(1))
    }

    /// Number of output units of this layer.
    #[inline(always)]
    pub fn outdim(&self) -> usize {
        self.weights.len_of(Axis(0))
    }

    /// Evaluates this layer on a single input vector.
    pub fn apply(&self, x: &ArrayView1<'_, f64>) -> Array1<f64> {
        assert_eq!(
            x.len(),
            self.indim(),
            "Expected input of dimension {}, got {}",
            self.indim(),
            x.len()
        );
        self.weights.dot(x) + &self.bias
    }

    /// Evaluates this layer on a batch of inputs, one sample per row.
    pub fn apply_batch(&self, x: &ArrayView2<'_, f64>) -> Array2<f64> {
        assert_eq!(
            x.len_of(Axis(1)),
            self.indim(),
            "Expected input of dimension {}, got {}",
            self.indim(),
            x.len_of(Axis(1))
        );
        x.dot(&self.weights.t()) + &self.bias
    }
}
