use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{Array1, Array2, Array4, ArrayD};

use equivar::measure::eval::eval;
use equivar::measure::iter::ActivationsIterator;
use equivar::measure::variance::{SampleVariance, TransformationVariance};
use equivar::model::dense::DenseFunc;
use equivar::model::network::{FeatureShape, Network};
use equivar::transforms::generator::UniformRotation;
use equivar::transforms::transformation::Transformation;

fn checkerboard(n: usize, height: usize, width: usize) -> ArrayD<f64> {
    let mut x = Array4::<f64>::zeros((n, 1, height, width));
    for sample in 0..n {
        for row in 0..height {
            for col in 0..width {
                x[[sample, 0, row, col]] = ((sample + row + col) % 2) as f64;
            }
        }
    }
    x.into_dyn()
}

fn mlp(indim: usize, hidden: usize) -> Network {
    let mut network = Network::new(FeatureShape::Image {
        channels: 1,
        height: 28,
        width: 28,
    });
    network.flatten().unwrap();
    network
        .dense(DenseFunc::from_mats(
            Array2::ones((hidden, indim)) * 0.01,
            Array1::zeros(hidden),
        ))
        .unwrap();
    network.relu().unwrap();
    network
}

pub fn warp_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("warp-28x28");
    group.sample_size(200);

    let x = checkerboard(1, 28, 28);
    let sample = x.index_axis(ndarray::Axis(0), 0);
    let rotation = Transformation::Rotation { degrees: 37.5 };
    let affine = Transformation::Affine {
        degrees: 37.5,
        scale: [0.9, 1.1],
        translation: [0.05, -0.05],
    };

    group.bench_function("rotation", |b| {
        b.iter(|| rotation.apply(black_box(&sample)).unwrap())
    });
    group.bench_function("affine", |b| {
        b.iter(|| affine.apply(black_box(&sample)).unwrap())
    });
}

pub fn variance_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("variance-mlp");
    group.sample_size(20);

    let network = mlp(784, 64);
    let inputs = checkerboard(32, 28, 28);
    let set = UniformRotation::new(8, 360.).generate();
    let iterator = ActivationsIterator::new(&network, inputs.view(), set, 16).unwrap();

    group.bench_function("transformation variance [784-64]", |b| {
        b.iter(|| eval(black_box(&TransformationVariance), &iterator).unwrap())
    });
    group.bench_function("sample variance [784-64]", |b| {
        b.iter(|| eval(black_box(&SampleVariance), &iterator).unwrap())
    });
}

criterion_group!(benches, warp_benchmark, variance_benchmark);
criterion_main!(benches);
