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

//! Per-layer measure results and their export

use std::fmt::Display;
use std::path::Path;

use average::{Estimate, Max, Mean, Min};
use ndarray::Array1;
use serde::Serialize;

use crate::measure::MeasureError;

/// The per-unit values of one observed layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerResult {
    /// Name of the layer, e.g. ``1.dense``
    pub name: String,
    /// One value per unit of the layer
    pub values: Array1<f64>,
}

/// The outcome of evaluating a measure over a transformation set.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureResult {
    /// Identifier of the measure that produced this result
    pub measure_id: String,
    /// Identifier of the transformation set the measure was taken over
    pub transformations_id: String,
    /// Minimum and maximum parameter of the set, if any member carries
    /// parameters
    pub parameter_range: Option<(f64, f64)>,
    /// Per-unit values for every observed layer, in evaluation order
    pub layers: Vec<LayerResult>,
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    layer: String,
    units: usize,
    mean: f64,
    min: f64,
    max: f64,
}

impl MeasureResult {
    /// A deterministic identifier of this experiment, composed of the
    /// set id and the measure id. Suitable as a file stem for caching.
    pub fn experiment_id(&self) -> String {
        format!("{}_{}", self.transformations_id, self.measure_id)
    }

    /// Names of the observed layers, in evaluation order.
    pub fn layer_names(&self) -> Vec<String> {
        self.layers.iter().map(|layer| layer.name.clone()).collect()
    }

    fn summary(layer: &LayerResult) -> SummaryRow {
        let mut mean = Mean::new();
        let mut min = Min::new();
        let mut max = Max::new();
        for &value in layer.values.iter() {
            mean.add(value);
            min.add(value);
            max.add(value);
        }
        SummaryRow {
            layer: layer.name.clone(),
            units: layer.values.len(),
            mean: mean.mean(),
            min: min.min(),
            max: max.max(),
        }
    }

    /// Writes a per-layer summary (unit count, mean, min, max) as csv.
    pub fn write_csv(&self, path: &Path) -> Result<(), MeasureError> {
        let mut writer = csv::Writer::from_path(path)?;
        for layer in &self.layers {
            writer.serialize(MeasureResult::summary(layer))?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Display for MeasureResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} over {}", self.measure_id, self.transformations_id)?;
        if let Some((low, high)) = self.parameter_range {
            writeln!(f, "parameter range [{}, {}]", low, high)?;
        }
        writeln!(
            f,
            "{:<16}   {:>8}   {:>12}   {:>12}   {:>12}",
            "Layer", "Units", "Mean", "Min", "Max"
        )?;
        for layer in &self.layers {
            let row = MeasureResult::summary(layer);
            writeln!(
                f,
                "{:<16}   {:>8}   {:>12.6}   {:>12.6}   {:>12.6}",
                row.layer, row.units, row.mean, row.min, row.max
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use assertables::*;
    use ndarray::arr1;

    use super::*;

    fn result() -> MeasureResult {
        MeasureResult {
            measure_id: "TransformationVariance".to_string(),
            transformations_id: "UniformRotation(n=4,range=360)".to_string(),
            parameter_range: Some((0., 270.)),
            layers: vec![
                LayerResult {
                    name: "0.flatten".to_string(),
                    values: arr1(&[1., 3., 2.]),
                },
                LayerResult {
                    name: "1.dense".to_string(),
                    values: arr1(&[0., 4.]),
                },
            ],
        }
    }

    #[test]
    fn test_experiment_id() {
        assert_eq!(
            result().experiment_id(),
            "UniformRotation(n=4,range=360)_TransformationVariance"
        );
    }

    #[test]
    fn test_layer_names() {
        assert_eq!(result().layer_names(), vec!["0.flatten", "1.dense"]);
    }

    #[test]
    fn test_write_csv() {
        let path = std::env::temp_dir().join("equivar_test_result.csv");

        result().write_csv(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_contains!(contents, "layer,units,mean,min,max");
        assert_contains!(contents, "0.flatten,3,2.0,1.0,3.0");
        assert_contains!(contents, "1.dense,2,2.0,0.0,4.0");

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_display() {
        let printed = format!("{}", result());

        assert_contains!(printed, "TransformationVariance");
        assert_contains!(printed, "0.flatten");
        assert_contains!(printed, "[0, 270]");
    }
}
