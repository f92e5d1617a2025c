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

//! Variance based invariance measures

use ndarray::{Array2, Axis};

use crate::measure::eval::EvalVisitor;
use crate::measure::iter::ActivationsIterator;
use crate::measure::result::{LayerResult, MeasureResult};
use crate::measure::MeasureError;
use crate::model::network::ObservableLayers;

/// A statistic that reduces the activations recorded under a
/// transformation set to one value per unit per layer.
pub trait Measure {
    /// A stable identifier of this measure, used for experiment naming
    /// and result caching.
    fn id(&self) -> String;

    /// Evaluates this measure over all transformations of ``iterator``.
    fn eval<M: ObservableLayers>(
        &self,
        iterator: &ActivationsIterator<'_, M>,
        visitor: &mut dyn EvalVisitor,
    ) -> Result<MeasureResult, MeasureError>;
}

fn assemble_result<M: ObservableLayers>(
    measure_id: String,
    iterator: &ActivationsIterator<'_, M>,
    values: Vec<ndarray::Array1<f64>>,
) -> MeasureResult {
    let layers = iterator
        .activation_names()
        .into_iter()
        .zip(values)
        .map(|(name, values)| LayerResult { name, values })
        .collect();
    MeasureResult {
        measure_id,
        transformations_id: iterator.transformations().id(),
        parameter_range: iterator.transformations().parameter_range().ok(),
        layers,
    }
}

/// Measures how much each unit's activation varies across the
/// transformations of a set.
///
/// For each unit, the variance of its activation over the
/// transformations is computed per sample and then averaged over the
/// samples. A unit that is perfectly invariant to the set scores zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformationVariance;

impl Measure for TransformationVariance {
    fn id(&self) -> String {
        "TransformationVariance".to_string()
    }

    fn eval<M: ObservableLayers>(
        &self,
        iterator: &ActivationsIterator<'_, M>,
        visitor: &mut dyn EvalVisitor,
    ) -> Result<MeasureResult, MeasureError> {
        let set = iterator.transformations();
        let n_transformations = set.len();
        visitor.start_eval(
            &self.id(),
            &set.id(),
            n_transformations,
            iterator.num_samples(),
        );

        let mut sums: Vec<Array2<f64>> = Vec::new();
        let mut squares: Vec<Array2<f64>> = Vec::new();

        for index in 0..n_transformations {
            visitor.start_transformation(index, &set[index].parameters());
            let activations = iterator.activations(index)?;

            if sums.is_empty() {
                sums = activations
                    .layers
                    .iter()
                    .map(|layer| Array2::zeros(layer.raw_dim()))
                    .collect();
                squares = sums.clone();
            }
            for (pos, layer) in activations.layers.iter().enumerate() {
                sums[pos] += layer;
                squares[pos] += &layer.mapv(|value| value * value);
            }

            visitor.finish_transformation(index, activations.layers.len());
        }

        let scale = 1. / n_transformations as f64;
        let values = sums
            .into_iter()
            .zip(squares)
            .map(|(sum, square)| {
                let mean = sum * scale;
                // floating point rounding can push the variance of a
                // constant unit slightly below zero
                let variance =
                    (square * scale - &mean * &mean).mapv(|value| value.max(0.));
                variance.mean_axis(Axis(0)).unwrap()
            })
            .collect();

        let result = assemble_result(self.id(), iterator, values);
        visitor.finish_eval(&result);
        Ok(result)
    }
}

/// Measures how much each unit's activation varies across the input
/// samples, averaged over the transformations of a set.
///
/// Serves as a scale reference for [`TransformationVariance`]: a unit
/// whose transformation variance is large relative to its sample
/// variance responds more strongly to the transformation than to the
/// data itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleVariance;

impl Measure for SampleVariance {
    fn id(&self) -> String {
        "SampleVariance".to_string()
    }

    fn eval<M: ObservableLayers>(
        &self,
        iterator: &ActivationsIterator<'_, M>,
        visitor: &mut dyn EvalVisitor,
    ) -> Result<MeasureResult, MeasureError> {
        let set = iterator.transformations();
        let n_transformations = set.len();
        visitor.start_eval(
            &self.id(),
            &set.id(),
            n_transformations,
            iterator.num_samples(),
        );

        let mut sums: Vec<ndarray::Array1<f64>> = Vec::new();

        for index in 0..n_transformations {
            visitor.start_transformation(index, &set[index].parameters());
            let activations = iterator.activations(index)?;

            if sums.is_empty() {
                sums = activations
                    .layers
                    .iter()
                    .map(|layer| ndarray::Array1::zeros(layer.len_of(Axis(1))))
                    .collect();
            }
            for (pos, layer) in activations.layers.iter().enumerate() {
                sums[pos] += &layer.var_axis(Axis(0), 0.);
            }

            visitor.finish_transformation(index, activations.layers.len());
        }

        let scale = 1. / n_transformations as f64;
        let values = sums.into_iter().map(|sum| sum * scale).collect();

        let result = assemble_result(self.id(), iterator, values);
        visitor.finish_eval(&result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{arr1, Array4, ArrayD};

    use super::*;
    use crate::measure::eval::{eval, NoOpVis};
    use crate::model::network::{FeatureShape, Network};
    use crate::transforms::generator::UniformRotation;
    use crate::transforms::set::TransformationSet;
    use crate::transforms::transformation::Transformation;

    fn flatten_model() -> Network {
        let mut network = Network::new(FeatureShape::Image {
            channels: 1,
            height: 3,
            width: 3,
        });
        network.flatten().unwrap();
        network
    }

    fn counting_input() -> ArrayD<f64> {
        let mut x = Array4::<f64>::zeros((1, 1, 3, 3));
        for row in 0..3 {
            for col in 0..3 {
                x[[0, 0, row, col]] = (row * 3 + col + 1) as f64;
            }
        }
        x.into_dyn()
    }

    #[test]
    fn test_identity_set_has_zero_transformation_variance() {
        let network = flatten_model();
        let x = counting_input();
        let set = TransformationSet::new(
            "id2",
            vec![Transformation::Identity, Transformation::Identity],
        )
        .unwrap();
        let iterator = ActivationsIterator::new(&network, x.view(), set, 4).unwrap();

        let result = eval(&TransformationVariance, &iterator).unwrap();

        assert_eq!(result.measure_id, "TransformationVariance");
        assert_eq!(result.parameter_range, None);
        assert_relative_eq!(
            result.layers[0].values,
            ndarray::Array1::zeros(9),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_transformation_variance_under_shift() {
        let network = flatten_model();
        let x = counting_input();
        // shifting right by one pixel zero-fills the left column
        let set = TransformationSet::new(
            "shift",
            vec![
                Transformation::Identity,
                Transformation::Translation { x: 1. / 3., y: 0. },
            ],
        )
        .unwrap();
        let iterator = ActivationsIterator::new(&network, x.view(), set, 4).unwrap();

        let result = TransformationVariance.eval(&iterator, &mut NoOpVis).unwrap();

        assert_relative_eq!(
            result.layers[0].values,
            arr1(&[0.25, 0.25, 0.25, 4., 0.25, 0.25, 12.25, 0.25, 0.25]),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_constant_input_is_rotation_invariant() {
        let network = flatten_model();
        let x = Array4::<f64>::ones((2, 1, 3, 3)).into_dyn();
        let set = UniformRotation::new(4, 360.).generate();
        let iterator = ActivationsIterator::new(&network, x.view(), set, 4).unwrap();

        let result = eval(&TransformationVariance, &iterator).unwrap();

        assert_eq!(result.parameter_range, Some((0., 270.)));
        assert_relative_eq!(
            result.layers[0].values,
            ndarray::Array1::zeros(9),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_bias_only_layer_is_invariant() {
        use crate::model::dense::DenseFunc;
        use ndarray::{Array1, Array2};

        let mut network = Network::new(FeatureShape::Image {
            channels: 1,
            height: 3,
            width: 3,
        });
        network.flatten().unwrap();
        network
            .dense(DenseFunc::from_mats(
                Array2::zeros((4, 9)),
                Array1::from(vec![1., -2., 3., 0.]),
            ))
            .unwrap();

        let x = counting_input();
        let set = UniformRotation::new(8, 360.).generate();
        let iterator = ActivationsIterator::new(&network, x.view(), set, 4).unwrap();

        let result = eval(&TransformationVariance, &iterator).unwrap();

        // a unit that ignores its input cannot respond to the transformation
        assert_relative_eq!(
            result.layers[1].values,
            ndarray::Array1::zeros(4),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sample_variance() {
        let network = flatten_model();
        let mut x = Array4::<f64>::zeros((2, 1, 3, 3));
        for row in 0..3 {
            for col in 0..3 {
                x[[0, 0, row, col]] = (row * 3 + col) as f64;
                x[[1, 0, row, col]] = (row * 3 + col) as f64 + 2.;
            }
        }
        let x = x.into_dyn();
        let set = TransformationSet::new("id", vec![Transformation::Identity]).unwrap();
        let iterator = ActivationsIterator::new(&network, x.view(), set, 4).unwrap();

        let result = eval(&SampleVariance, &iterator).unwrap();

        // two samples two apart have a population variance of one
        assert_eq!(result.measure_id, "SampleVariance");
        assert_relative_eq!(
            result.layers[0].values,
            ndarray::Array1::ones(9),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sample_variance_of_identical_samples_is_zero() {
        let network = flatten_model();
        let x = Array4::<f64>::ones((4, 1, 3, 3)).into_dyn();
        let set = UniformRotation::new(3, 360.).generate();
        let iterator = ActivationsIterator::new(&network, x.view(), set, 2).unwrap();

        let result = eval(&SampleVariance, &iterator).unwrap();

        assert_relative_eq!(
            result.layers[0].values,
            ndarray::Array1::zeros(9),
            epsilon = 1e-9
        );
    }
}
