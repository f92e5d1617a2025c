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

//! Lazy evaluation of activations under each transformation

use log::debug;
use ndarray::{concatenate, Array2, ArrayD, ArrayViewD, Axis, Slice};

use crate::measure::MeasureError;
use crate::model::network::ObservableLayers;
use crate::transforms::set::TransformationSet;
use crate::transforms::transformation::TransformError;

/// The activations of every observed layer under one transformation,
/// evaluated over the full input batch.
#[derive(Debug, Clone)]
pub struct TransformationActivations {
    /// Position of the transformation in its set
    pub index: usize,
    /// Parameters of the transformation
    pub parameters: Vec<f64>,
    /// One samples x units matrix per observed layer
    pub layers: Vec<Array2<f64>>,
}

/// Lazily pairs a model with a batch of inputs and a transformation set.
///
/// Activations are only computed on demand, one transformation at a
/// time, so the peak memory footprint stays at one transformed copy of
/// the input batch plus the activations of a single transformation. The
/// inputs are borrowed for the lifetime of this iterator and never
/// mutated.
#[derive(Debug)]
pub struct ActivationsIterator<'a, M: ObservableLayers> {
    model: &'a M,
    inputs: ArrayViewD<'a, f64>,
    set: TransformationSet,
    batch_size: usize,
}

impl<'a, M: ObservableLayers> ActivationsIterator<'a, M> {
    /// Creates a new iterator over the activations of ``model`` on
    /// ``inputs`` under every member of ``set``.
    ///
    /// The first axis of ``inputs`` is the sample axis. Fails with
    /// [`TransformError::InvalidInput`] if any member of the set cannot
    /// be applied to samples of the given shape, before any activation
    /// is computed.
    pub fn new(
        model: &'a M,
        inputs: ArrayViewD<'a, f64>,
        set: TransformationSet,
        batch_size: usize,
    ) -> Result<ActivationsIterator<'a, M>, TransformError> {
        assert!(batch_size >= 1, "Batch size must be at least 1");
        assert!(
            inputs.ndim() >= 1 && inputs.len_of(Axis(0)) > 0,
            "Expected a non-empty batch of inputs"
        );
        if !set.valid_input(&inputs.shape()[1..]) {
            return Err(TransformError::InvalidInput {
                shape: inputs.shape()[1..].to_vec(),
            });
        }
        Ok(ActivationsIterator {
            model,
            inputs,
            set,
            batch_size,
        })
    }

    /// Names of the observed layers, in evaluation order.
    pub fn activation_names(&self) -> Vec<String> {
        self.model.activation_names()
    }

    /// The transformation set driving this iterator.
    pub fn transformations(&self) -> &TransformationSet {
        &self.set
    }

    /// Number of input samples.
    pub fn num_samples(&self) -> usize {
        self.inputs.len_of(Axis(0))
    }

    /// Computes the activations of every layer under the transformation
    /// at ``index``, batched over the inputs.
    pub fn activations(&self, index: usize) -> Result<TransformationActivations, MeasureError> {
        let transformation = &self.set[index];
        let n_samples = self.num_samples();
        let n_layers = self.model.activation_names().len();

        let mut per_layer: Vec<Vec<Array2<f64>>> = vec![Vec::new(); n_layers];

        let mut start = 0;
        while start < n_samples {
            let end = usize::min(start + self.batch_size, n_samples);
            let batch = self.inputs.slice_axis(Axis(0), Slice::from(start..end));

            let mut transformed = ArrayD::zeros(batch.raw_dim());
            for (pos, sample) in batch.outer_iter().enumerate() {
                let out = transformation.apply(&sample)?;
                transformed.index_axis_mut(Axis(0), pos).assign(&out);
            }

            let activations = self.model.forward_intermediates(&transformed.view())?;
            for (store, activation) in per_layer.iter_mut().zip(activations) {
                store.push(activation);
            }

            start = end;
        }

        let layers = per_layer
            .into_iter()
            .map(|chunks| {
                let views: Vec<_> = chunks.iter().map(|chunk| chunk.view()).collect();
                // chunks agree in the unit axis, so concatenation cannot fail
                concatenate(Axis(0), &views).unwrap()
            })
            .collect();

        debug!(
            "Evaluated {} samples under transformation {} of {}",
            n_samples, transformation, self.set
        );

        Ok(TransformationActivations {
            index,
            parameters: transformation.parameters(),
            layers,
        })
    }

    /// Iterates over the activations of every transformation in order.
    pub fn iter(&self) -> TransformationIter<'_, 'a, M> {
        TransformationIter {
            inner: self,
            index: 0,
        }
    }
}

/// Iterator over the per-transformation activations of an
/// [`ActivationsIterator`].
#[derive(Debug)]
pub struct TransformationIter<'i, 'a, M: ObservableLayers> {
    inner: &'i ActivationsIterator<'a, M>,
    index: usize,
}

impl<M: ObservableLayers> Iterator for TransformationIter<'_, '_, M> {
    type Item = Result<TransformationActivations, MeasureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.inner.set.len() {
            return None;
        }
        let item = self.inner.activations(self.index);
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.inner.set.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<M: ObservableLayers> ExactSizeIterator for TransformationIter<'_, '_, M> {}
