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

//! Reading networks from npz checkpoints

use std::borrow::Borrow;
use std::fs::File;
use std::path::Path;

use log::info;
use ndarray_npy::{NpzReader, ReadNpyError, ReadNpzError};
use regex::Regex;

use crate::model::dense::DenseFunc;
use crate::model::network::{FeatureShape, Layer, ModelError, Network};

/// Reads a layer sequence from an npz checkpoint.
///
/// Each entry name encodes the position and kind of one layer:
/// ``{idx}.flatten.npy`` and ``{idx}.relu.npy`` are markers without
/// meaningful contents, while dense layers store their parameters under
/// ``{idx}.dense.weights.npy`` and ``{idx}.dense.bias.npy``. Entries
/// that match none of these patterns are ignored.
pub fn read_layers(path: &Path) -> Result<Vec<Layer>, ModelError> {
    let file = File::open(path)
        .map_err(ReadNpyError::from)
        .map_err(ReadNpzError::from)?;
    let mut npz = NpzReader::new(file)?;

    let pattern = Regex::new(r"^(\d+)\.(flatten|relu|dense\.weights)\.npy$").unwrap();

    let mut entries: Vec<(usize, String, String)> = Vec::new();
    for name in npz.names()? {
        if let Some(captures) = pattern.captures(&name) {
            let idx = captures[1].parse::<usize>().unwrap();
            entries.push((idx, captures[2].to_string(), name.clone()));
        }
    }
    entries.sort_by_key(|(idx, _, _)| *idx);

    let mut layers = Vec::with_capacity(entries.len());
    for (idx, kind, name) in entries {
        let layer = match kind.as_str() {
            "flatten" => Layer::Flatten,
            "relu" => Layer::ReLU,
            _ => {
                let weights = npz.by_name(&name)?;
                let bias = npz.by_name(&format!("{}.dense.bias.npy", idx))?;
                Layer::Dense(DenseFunc::from_mats(weights, bias))
            }
        };
        layers.push(layer);
    }

    info!("Read {} layers from {}", layers.len(), path.display());
    Ok(layers)
}

/// Builds a validated network over the given input shape from a layer
/// sequence, for example one read by [`read_layers`].
pub fn network_from_layers<I>(input_shape: FeatureShape, layers: I) -> Result<Network, ModelError>
where
    I: IntoIterator,
    I::Item: Borrow<Layer>,
{
    let mut network = Network::new(input_shape);
    for layer in layers {
        match layer.borrow() {
            Layer::Flatten => network.flatten()?,
            Layer::Dense(func) => network.dense(func.clone())?,
            Layer::ReLU => network.relu()?,
        }
    }
    Ok(network)
}

/// Reads a full network from an npz checkpoint.
pub fn read_network(path: &Path, input_shape: FeatureShape) -> Result<Network, ModelError> {
    let layers = read_layers(path)?;
    network_from_layers(input_shape, &layers)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use ndarray::{arr1, arr2, Array1, Array2, Array4};
    use ndarray_npy::NpzWriter;

    use super::*;
    use crate::model::network::ObservableLayers;

    fn write_checkpoint(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("0.flatten.npy", &Array1::<f64>::zeros(0))
            .unwrap();
        npz.add_array(
            "1.dense.weights.npy",
            &arr2(&[[1., 0., 0., 0.], [0., 0., 0., -1.]]),
        )
        .unwrap();
        npz.add_array("1.dense.bias.npy", &arr1(&[0., 1.])).unwrap();
        npz.add_array("2.relu.npy", &Array1::<f64>::zeros(0))
            .unwrap();
        npz.finish().unwrap();
        path
    }

    #[test]
    fn test_read_layers() {
        let path = write_checkpoint("equivar_test_read_layers.npz");

        let layers = read_layers(&path).unwrap();

        assert_eq!(layers.len(), 3);
        assert!(matches!(layers[0], Layer::Flatten));
        assert!(matches!(layers[2], Layer::ReLU));
        match &layers[1] {
            Layer::Dense(func) => {
                assert_eq!(func.indim(), 4);
                assert_eq!(func.outdim(), 2);
            }
            other => panic!("Expected dense layer, got {}", other),
        }

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_network_forward() {
        let path = write_checkpoint("equivar_test_read_network.npz");

        let network = read_network(
            &path,
            FeatureShape::Image {
                channels: 1,
                height: 2,
                width: 2,
            },
        )
        .unwrap();

        let mut x = Array4::<f64>::zeros((1, 1, 2, 2));
        x[[0, 0, 0, 0]] = 3.;
        x[[0, 0, 1, 1]] = 2.;
        let x = x.into_dyn();

        let out = network.forward(&x.view()).unwrap();
        assert_eq!(out, arr2(&[[3., 0.]]));
        assert_eq!(
            network.activation_names(),
            vec!["0.flatten", "1.dense", "2.relu"]
        );

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let result = read_layers(Path::new("/nonexistent/equivar.npz"));

        assert!(matches!(result, Err(ModelError::Checkpoint(_))));
    }

    #[test]
    fn test_incompatible_checkpoint() {
        let path = std::env::temp_dir().join("equivar_test_incompatible.npz");
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("0.dense.weights.npy", &Array2::<f64>::ones((2, 3)))
            .unwrap();
        npz.add_array("0.dense.bias.npy", &Array1::<f64>::zeros(2))
            .unwrap();
        npz.finish().unwrap();

        // dense layers require flat features
        let result = read_network(
            &path,
            FeatureShape::Image {
                channels: 1,
                height: 3,
                width: 1,
            },
        );
        assert!(matches!(result, Err(ModelError::IncompatibleLayer { .. })));

        fs::remove_file(path).unwrap();
    }
}
