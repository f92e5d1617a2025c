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

use approx::assert_relative_eq;
use ndarray::{Array1, Array2, ArrayD};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use equivar::measure::eval::eval;
use equivar::measure::iter::ActivationsIterator;
use equivar::measure::variance::{Measure, SampleVariance, TransformationVariance};
use equivar::model::dense::DenseFunc;
use equivar::model::network::{FeatureShape, Network};
use equivar::transforms::generator::{
    AffineGenerator, UniformRotation, UniformScale, UniformTranslation,
};
use equivar::transforms::transformation::TransformError;

fn mlp(height: usize, width: usize, hidden: usize) -> Network {
    let indim = height * width;
    let mut network = Network::new(FeatureShape::Image {
        channels: 1,
        height,
        width,
    });
    network.flatten().unwrap();
    network
        .dense(DenseFunc::from_mats(
            Array2::random((hidden, indim), Uniform::new(-1., 1.)),
            Array1::random(hidden, Uniform::new(-0.5, 0.5)),
        ))
        .unwrap();
    network.relu().unwrap();
    network
        .dense(DenseFunc::from_mats(
            Array2::random((10, hidden), Uniform::new(-1., 1.)),
            Array1::zeros(10),
        ))
        .unwrap();
    network
}

#[test]
fn test_full_turn_excludes_wraparound() {
    let set = UniformRotation::new(4, 360.).generate();

    assert_eq!(set.len(), 4);
    assert_eq!(set.parameter_range(), Ok((0., 270.)));
}

#[test]
fn test_set_ids_reflect_configuration() {
    let first = UniformRotation::new(4, 360.).generate();
    let second = UniformRotation::new(4, 360.).generate();
    let other = UniformRotation::new(8, 360.).generate();

    assert_eq!(first.id(), second.id());
    assert_ne!(first.id(), other.id());
}

#[test]
fn test_copy_is_independent_and_equal() {
    let set = UniformRotation::new(6, 180.).generate();

    let copy = set.copy();

    assert_eq!(copy.id(), set.id());
    assert_eq!(copy.len(), set.len());
    assert_eq!(copy.parameter_range(), set.parameter_range());
    for (lhs, rhs) in copy.iter().zip(set.iter()) {
        assert_eq!(lhs, rhs);
    }
}

#[test]
fn test_input_domain() {
    let set = UniformRotation::new(4, 360.).generate();

    assert!(set.valid_input(&[28, 28]));
    assert!(set.valid_input(&[3, 32, 32]));
    assert!(set.valid_input(&[2, 3, 8, 8]));
    assert!(!set.valid_input(&[784]));
    assert!(!set.valid_input(&[1, 0, 28]));
    assert!(!set.valid_input(&[]));
}

#[test]
fn test_flat_inputs_rejected_before_evaluation() {
    let network = mlp(8, 8, 16);
    let set = UniformRotation::new(4, 360.).generate();
    let flat = Array2::<f64>::zeros((4, 64)).into_dyn();

    let result = ActivationsIterator::new(&network, flat.view(), set, 2);

    assert_eq!(
        result.err(),
        Some(TransformError::InvalidInput { shape: vec![64] })
    );
}

#[test]
fn test_pipeline_on_random_network() {
    let network = mlp(8, 8, 16);
    let inputs: ArrayD<f64> = ArrayD::random(
        ndarray::IxDyn(&[12, 1, 8, 8]),
        Uniform::new(0., 1.),
    );
    let set = UniformRotation::new(8, 360.).generate();
    let iterator = ActivationsIterator::new(&network, inputs.view(), set, 5).unwrap();

    let result = eval(&TransformationVariance, &iterator).unwrap();

    assert_eq!(result.layers.len(), 4);
    assert_eq!(
        result.layer_names(),
        vec!["0.flatten", "1.dense", "2.relu", "3.dense"]
    );
    assert_eq!(result.layers[0].values.len(), 64);
    assert_eq!(result.layers[1].values.len(), 16);
    assert_eq!(result.layers[3].values.len(), 10);
    for layer in &result.layers {
        assert!(layer.values.iter().all(|&value| value >= 0.));
    }
}

#[test]
fn test_rotation_by_zero_only_is_invariant() {
    let network = mlp(6, 6, 8);
    let inputs: ArrayD<f64> = ArrayD::random(
        ndarray::IxDyn(&[4, 1, 6, 6]),
        Uniform::new(0., 1.),
    );
    let set = UniformRotation::new(1, 360.).generate();
    let iterator = ActivationsIterator::new(&network, inputs.view(), set, 4).unwrap();

    let result = eval(&TransformationVariance, &iterator).unwrap();

    for layer in &result.layers {
        assert_relative_eq!(
            layer.values,
            Array1::zeros(layer.values.len()),
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_affine_combination_pipeline() {
    let network = mlp(6, 6, 8);
    let inputs: ArrayD<f64> = ArrayD::random(
        ndarray::IxDyn(&[3, 1, 6, 6]),
        Uniform::new(0., 1.),
    );
    let set = AffineGenerator::new()
        .rotation(UniformRotation::new(2, 180.))
        .scale(UniformScale::new(2, 0.8, 1.2))
        .translation(UniformTranslation::new(2, 0.1))
        .generate();

    // 2 angles x 2 factors x 2x2 offsets
    assert_eq!(set.len(), 16);

    let iterator = ActivationsIterator::new(&network, inputs.view(), set, 8).unwrap();
    let result = eval(&SampleVariance, &iterator).unwrap();

    assert_eq!(result.measure_id, SampleVariance.id());
    assert_eq!(result.layers.len(), 4);
    assert!(result.parameter_range.is_some());
}
