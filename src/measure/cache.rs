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

//! Filesystem cache for measure results keyed by experiment ids

use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;
use ndarray_npy::{NpzReader, NpzWriter};
use regex::Regex;

use crate::measure::eval::NoOpVis;
use crate::measure::iter::ActivationsIterator;
use crate::measure::result::{LayerResult, MeasureResult};
use crate::measure::variance::Measure;
use crate::measure::MeasureError;
use crate::model::network::ObservableLayers;

/// The cache location of the experiment with the given id under ``dir``.
pub fn result_path(dir: &Path, experiment_id: &str) -> PathBuf {
    dir.join(format!("{}_result.npz", experiment_id))
}

/// Checks if a cached result exists for the given experiment id.
pub fn is_cached(dir: &Path, experiment_id: &str) -> bool {
    result_path(dir, experiment_id).is_file()
}

/// Writes the per-layer values of ``result`` as an npz archive.
///
/// Entry names encode the evaluation order and layer name as
/// ``{idx}.{name}.npy``, so the layer order survives the round trip.
pub fn write_result(result: &MeasureResult, path: &Path) -> Result<(), MeasureError> {
    let mut npz = NpzWriter::new(File::create(path)?);
    for (idx, layer) in result.layers.iter().enumerate() {
        npz.add_array(format!("{}.{}.npy", idx, layer.name), &layer.values)?;
    }
    npz.finish()?;
    Ok(())
}

/// Reads back per-layer values written by [`write_result`].
pub fn read_result(path: &Path) -> Result<Vec<LayerResult>, MeasureError> {
    let mut npz = NpzReader::new(File::open(path)?)?;
    let pattern = Regex::new(r"^(\d+)\.(.+)\.npy$").unwrap();

    let mut entries: Vec<(usize, String, String)> = Vec::new();
    for name in npz.names()? {
        if let Some(captures) = pattern.captures(&name) {
            let idx = captures[1].parse::<usize>().unwrap();
            entries.push((idx, captures[2].to_string(), name.clone()));
        }
    }
    entries.sort_by_key(|(idx, _, _)| *idx);

    let mut layers = Vec::with_capacity(entries.len());
    for (_, layer_name, entry) in entries {
        layers.push(LayerResult {
            name: layer_name,
            values: npz.by_name(&entry)?,
        });
    }
    Ok(layers)
}

/// Evaluates ``measure`` over ``iterator`` unless a cached result for
/// the same experiment exists under ``dir``.
///
/// Returns the result together with a flag that is true when the result
/// was read from the cache. Fresh results are written to the cache
/// before returning.
pub fn eval_cached<T, M>(
    measure: &T,
    iterator: &ActivationsIterator<'_, M>,
    dir: &Path,
) -> Result<(MeasureResult, bool), MeasureError>
where
    T: Measure,
    M: ObservableLayers,
{
    let set = iterator.transformations();
    let experiment_id = format!("{}_{}", set.id(), measure.id());
    let path = result_path(dir, &experiment_id);

    if path.is_file() {
        info!("Reading cached result from {}", path.display());
        let result = MeasureResult {
            measure_id: measure.id(),
            transformations_id: set.id(),
            parameter_range: set.parameter_range().ok(),
            layers: read_result(&path)?,
        };
        return Ok((result, true));
    }

    let result = measure.eval(iterator, &mut NoOpVis)?;
    write_result(&result, &path)?;
    info!("Cached result at {}", path.display());
    Ok((result, false))
}
