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

/*!
Measuring transformation invariance of neural network activations.

This crate provides tools to quantify how [invariant or equivariant](https://en.wikipedia.org/wiki/Equivariant_map)
the internal activations of a neural network are under a set of input
transformations such as rotations, scalings, and translations.

`equivar` supports the following operations:
 - construct validated sets of input transformations from declarative
   generators (uniformly spaced or randomly sampled rotations, scalings,
   translations, and their affine combinations)
 - apply every member transformation to tensor-valued inputs via a
   bilinear affine warp over the two trailing spatial axes
 - evaluate a network layer by layer, recording every intermediate
   activation (layers are read from `.npz` checkpoints in the universal
   format introduced by `numpy`)
 - compute per-layer, per-unit variance statistics over transformations
   and samples, with console or csv progress reporting
 - cache evaluation results on disk keyed by deterministic experiment ids

A corner stone of this crate is the [`TransformationSet`](crate::transforms::set::TransformationSet):
an ordered, non-empty collection of input transformations that share a
configuration scheme. Sets expose a stable [`id`](crate::transforms::set::TransformationSet::id)
used for experiment naming and result caching, a cheap
[`valid_input`](crate::transforms::set::TransformationSet::valid_input)
domain predicate, and an aggregate
[`parameter_range`](crate::transforms::set::TransformationSet::parameter_range)
that characterizes how strong the set is.

# Quick Start
The following example constructs four uniformly spaced rotations spanning
a full turn and queries the aggregate parameter range. The wrap-around
duplicate at 360° is excluded, so the sampled angles are 0°, 90°, 180°,
and 270°.
```rust
use equivar::transforms::generator::UniformRotation;

let set = UniformRotation::new(4, 360.0).generate();
assert_eq!(set.len(), 4);
assert_eq!(set.parameter_range().unwrap(), (0.0, 270.0));
```

To measure a network, combine a set with an [`ActivationsIterator`](crate::measure::iter::ActivationsIterator)
and a [`Measure`](crate::measure::variance::Measure):
```rust
use equivar::measure::eval::eval;
use equivar::measure::iter::ActivationsIterator;
use equivar::measure::variance::TransformationVariance;
use equivar::model::dense::DenseFunc;
use equivar::model::network::{FeatureShape, Network};
use equivar::transforms::generator::UniformRotation;
use ndarray::{Array1, Array2, Array4};

// a single dense layer over flattened 8x8 images
let mut model = Network::new(FeatureShape::Image { channels: 1, height: 8, width: 8 });
model.flatten().unwrap();
model.dense(DenseFunc::from_mats(Array2::eye(64), Array1::zeros(64))).unwrap();

let inputs = Array4::<f64>::zeros((16, 1, 8, 8)).into_dyn();
let set = UniformRotation::new(4, 360.0).generate();

let iterator = ActivationsIterator::new(&model, inputs.view(), set, 8).unwrap();
let result = eval(&TransformationVariance, &iterator).unwrap();
assert_eq!(result.layers.len(), 2);
```

# Invariance Measurement
A network is invariant to a transformation when its activations do not
change under that transformation of the input, and equivariant when the
activations change in a structured way matched to the transformation.
Both properties are measured per layer: an [activation iterator](crate::measure::iter)
feeds every transformed version of every input through the network and a
[measure](crate::measure::variance) reduces the recorded activations to
one statistic per unit. Repeated evaluations of the same experiment are
skipped through a filesystem [result cache](crate::measure::cache) keyed
by the ids of the measure and the transformation set.
*/

#![warn(
    missing_debug_implementations,
    //missing_docs,
    rust_2021_compatibility,
    // unreachable_pub
)]

pub mod measure;
pub mod model;
pub mod transforms;
