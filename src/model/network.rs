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

//! Layer sequences with observable intermediate activations

use std::fmt::Display;

use ndarray::{Array2, ArrayViewD, Axis};
use ndarray_npy::ReadNpzError;
use thiserror::Error;

use crate::model::dense::DenseFunc;

/// The shape of the features flowing between two layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureShape {
    /// An image stack of shape (channels, height, width)
    Image {
        channels: usize,
        height: usize,
        width: usize,
    },
    /// A flat feature vector
    Flat { dim: usize },
}

impl FeatureShape {
    /// Returns the total number of scalar features of this shape.
    pub fn size(&self) -> usize {
        match self {
            FeatureShape::Image {
                channels,
                height,
                width,
            } => channels * height * width,
            FeatureShape::Flat { dim } => *dim,
        }
    }

    /// Interprets a raw shape slice as a feature shape, if possible.
    pub fn from_shape(shape: &[usize]) -> Option<FeatureShape> {
        match *shape {
            [dim] => Some(FeatureShape::Flat { dim }),
            [channels, height, width] => Some(FeatureShape::Image {
                channels,
                height,
                width,
            }),
            _ => None,
        }
    }

    /// Checks if the raw shape slice describes exactly this shape.
    pub fn matches(&self, shape: &[usize]) -> bool {
        FeatureShape::from_shape(shape) == Some(*self)
    }
}

impl Display for FeatureShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureShape::Image {
                channels,
                height,
                width,
            } => write!(f, "[{}x{}x{}]", channels, height, width),
            FeatureShape::Flat { dim } => write!(f, "[{}]", dim),
        }
    }
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Shape mismatch: expected {expected} features, got {got}")]
    Dim { expected: usize, got: usize },
    #[error("Layer {layer} cannot be applied to features of shape {shape}")]
    IncompatibleLayer { layer: String, shape: String },
    #[error("Input shape {got} does not match network input {expected}")]
    Input { expected: String, got: String },
    #[error("Checkpoint could not be read: {0}")]
    Checkpoint(#[from] ReadNpzError),
}

/// A simple enum type to conveniently specify the layer structure of a
/// neural network.
#[derive(Debug, Clone)]
pub enum Layer {
    /// Reshapes an image stack into a flat feature vector
    Flatten,
    /// A fully connected linear layer
    Dense(DenseFunc),
    /// The rectified linear unit applied element-wise
    ReLU,
}

impl Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Flatten => write!(f, "Flatten"),
            Layer::Dense(func) => write!(f, "Dense ({}x{})", func.indim(), func.outdim()),
            Layer::ReLU => write!(f, "ReLU"),
        }
    }
}

/// Models that expose the activations of every layer.
///
/// This is the seam consumed by the
/// [activation iterator](crate::measure::iter::ActivationsIterator): it
/// only requires the names of the observed activations and a batched
/// forward pass that records every intermediate result.
pub trait ObservableLayers {
    /// Names of the observed activations, in evaluation order.
    fn activation_names(&self) -> Vec<String>;

    /// Evaluates the model on a batch of inputs (sample axis first) and
    /// returns the activations of every layer as samples x units matrices.
    fn forward_intermediates(&self, x: &ArrayViewD<'_, f64>) -> Result<Vec<Array2<f64>>, ModelError>;
}

/// A validated sequence of layers with tracked feature shapes.
///
/// Layers are queued up through the builder methods, which check that
/// each layer is compatible with the features produced so far. The
/// forward pass exposes every intermediate activation, which is the
/// basis for all measures in this crate.
#[derive(Clone, Debug)]
pub struct Network {
    input_shape: FeatureShape,
    current_shape: FeatureShape,
    /// All queued up layers together with the shape after the layer
    layers: Vec<(Layer, FeatureShape)>,
}

impl Network {
    /// Creates a new network with the specified input shape.
    pub fn new(input_shape: FeatureShape) -> Network {
        Network {
            input_shape,
            current_shape: input_shape,
            layers: Vec::new(),
        }
    }

    /// Adds a flatten layer to this network. Flattening an already flat
    /// feature vector is a no-op.
    pub fn flatten(&mut self) -> Result<(), ModelError> {
        self.current_shape = FeatureShape::Flat {
            dim: self.current_shape.size(),
        };
        self.layers.push((Layer::Flatten, self.current_shape));
        Ok(())
    }

    /// Adds a fully connected layer to this network.
    pub fn dense(&mut self, func: DenseFunc) -> Result<(), ModelError> {
        match self.current_shape {
            FeatureShape::Flat { dim } => {
                if func.indim() != dim {
                    return Err(ModelError::Dim {
                        expected: dim,
                        got: func.indim(),
                    });
                }
                self.current_shape = FeatureShape::Flat { dim: func.outdim() };
                self.layers.push((Layer::Dense(func), self.current_shape));
                Ok(())
            }
            FeatureShape::Image { .. } => Err(ModelError::IncompatibleLayer {
                layer: format!("Dense ({}x{})", func.indim(), func.outdim()),
                shape: self.current_shape.to_string(),
            }),
        }
    }

    /// Adds a ReLU activation layer to this network.
    pub fn relu(&mut self) -> Result<(), ModelError> {
        self.layers.push((Layer::ReLU, self.current_shape));
        Ok(())
    }

    /// Number of layers of this network.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn input_shape(&self) -> FeatureShape {
        self.input_shape
    }

    /// The shape of the features produced by the last layer.
    pub fn output_shape(&self) -> FeatureShape {
        self.current_shape
    }

    /// Returns the layers of this network.
    #[rustfmt::skip]
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
            .map(|(layer, _)| layer)
    }

    /// Evaluates the network on a batch of inputs (sample axis first)
    /// and returns the final activations as a samples x units matrix.
    pub fn forward(&self, x: &ArrayViewD<'_, f64>) -> Result<Array2<f64>, ModelError> {
        let mut activations = self.forward_intermediates_impl(x)?;
        match activations.pop() {
            Some(last) => Ok(last),
            None => Ok(self.input_matrix(x)?),
        }
    }

    fn input_matrix(&self, x: &ArrayViewD<'_, f64>) -> Result<Array2<f64>, ModelError> {
        if x.ndim() < 1 || !self.input_shape.matches(&x.shape()[1..]) {
            return Err(ModelError::Input {
                expected: self.input_shape.to_string(),
                got: format!("{:?}", x.shape()),
            });
        }
        let samples = x.len_of(Axis(0));
        // freshly owned arrays are in standard layout, so the reshape is infallible
        Ok(x.to_owned()
            .into_shape((samples, self.input_shape.size()))
            .unwrap())
    }

    fn forward_intermediates_impl(
        &self,
        x: &ArrayViewD<'_, f64>,
    ) -> Result<Vec<Array2<f64>>, ModelError> {
        let mut current = self.input_matrix(x)?;
        let mut activations = Vec::with_capacity(self.layers.len());

        for (layer, _) in &self.layers {
            match layer {
                Layer::Flatten => {}
                Layer::Dense(func) => current = func.apply_batch(&current.view()),
                Layer::ReLU => current = current.mapv(|value| value.max(0.)),
            }
            activations.push(current.clone());
        }

        Ok(activations)
    }
}

impl ObservableLayers for Network {
    fn activation_names(&self) -> Vec<String> {
        self.layers
            .iter()
            .enumerate()
            .map(|(idx, (layer, _))| {
                let kind = match layer {
                    Layer::Flatten => "flatten",
                    Layer::Dense(_) => "dense",
                    Layer::ReLU => "relu",
                };
                format!("{}.{}", idx, kind)
            })
            .collect()
    }

    fn forward_intermediates(&self, x: &ArrayViewD<'_, f64>) -> Result<Vec<Array2<f64>>, ModelError> {
        self.forward_intermediates_impl(x)
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:<30}   {:<16}", "Layer", "Shape")?;
        writeln!(f, "{:=<30}==={:=>16}", "=", "=")?;
        for (layer, shape) in &self.layers {
            writeln!(f, "{:<30}   {:>16}", layer.to_string(), shape.to_string())?;
        }
        Ok(())
    }
}
