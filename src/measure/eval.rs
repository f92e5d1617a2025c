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

//! Progress reporting during measure evaluation

use core::fmt;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

use console::style;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::warn;
use serde::Serialize;

use crate::measure::iter::ActivationsIterator;
use crate::measure::result::MeasureResult;
use crate::measure::variance::Measure;
use crate::measure::MeasureError;
use crate::model::network::ObservableLayers;

/// Observer of a measure evaluation.
///
/// Measures call back into the visitor at the boundaries of the
/// evaluation and around each transformation, which allows progress
/// reporting without coupling the measures to any output format.
pub trait EvalVisitor {
    fn start_eval(
        &mut self,
        _measure_id: &str,
        _transformations_id: &str,
        _n_transformations: usize,
        _n_samples: usize,
    ) {
    }

    fn start_transformation(&mut self, _index: usize, _parameters: &[f64]) {}

    fn finish_transformation(&mut self, _index: usize, _n_layers: usize) {}

    fn finish_eval(&mut self, _result: &MeasureResult) {}
}

/// A visitor that reports nothing.
#[derive(Debug, Default)]
pub struct NoOpVis;

impl EvalVisitor for NoOpVis {}

/// Reports evaluation progress on the console, including a progress bar
/// over the transformations and a closing summary line.
pub struct EvalConsole {
    bar: ProgressBar,
    start: Instant,
}

impl EvalConsole {
    pub fn new() -> EvalConsole {
        EvalConsole {
            bar: ProgressBar::hidden(),
            start: Instant::now(),
        }
    }
}

impl Default for EvalConsole {
    fn default() -> Self {
        EvalConsole::new()
    }
}

impl fmt::Debug for EvalConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalConsole")
            .field("start", &self.start)
            .finish()
    }
}

impl EvalVisitor for EvalConsole {
    fn start_eval(
        &mut self,
        measure_id: &str,
        transformations_id: &str,
        n_transformations: usize,
        n_samples: usize,
    ) {
        println!(
            "{} {} over {} ({} samples)",
            style("Measuring").cyan().bold(),
            measure_id,
            transformations_id,
            n_samples
        );
        self.start = Instant::now();
        self.bar = ProgressBar::new(n_transformations as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                " {spinner:.cyan} [{elapsed_precise}] {wide_bar} {pos}/{len} transformations",
            )
            .unwrap()
            .progress_chars("=> "),
        );
    }

    fn finish_transformation(&mut self, _index: usize, _n_layers: usize) {
        self.bar.inc(1);
    }

    fn finish_eval(&mut self, result: &MeasureResult) {
        self.bar.finish_and_clear();
        println!(
            "{} {} in {}",
            style("Finished").green().bold(),
            result.experiment_id(),
            HumanDuration(self.start.elapsed())
        );
    }
}

#[derive(Debug, Serialize)]
struct CsvRow {
    transformation: usize,
    time_ms: u128,
    layers: usize,
}

/// Records per-transformation timings to a csv file.
pub struct EvalCsv {
    writer: csv::Writer<File>,
    current: Instant,
}

impl EvalCsv {
    pub fn new(path: &Path) -> Result<EvalCsv, MeasureError> {
        Ok(EvalCsv {
            writer: csv::Writer::from_path(path)?,
            current: Instant::now(),
        })
    }
}

impl fmt::Debug for EvalCsv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalCsv")
            .field("current", &self.current)
            .finish()
    }
}

impl EvalVisitor for EvalCsv {
    fn start_transformation(&mut self, _index: usize, _parameters: &[f64]) {
        self.current = Instant::now();
    }

    fn finish_transformation(&mut self, index: usize, n_layers: usize) {
        let row = CsvRow {
            transformation: index,
            time_ms: self.current.elapsed().as_millis(),
            layers: n_layers,
        };
        if let Err(err) = self.writer.serialize(row) {
            warn!("Could not write csv progress row: {}", err);
        }
    }

    fn finish_eval(&mut self, _result: &MeasureResult) {
        if let Err(err) = self.writer.flush() {
            warn!("Could not flush csv progress: {}", err);
        }
    }
}

/// Evaluates ``measure`` over the given iterator without any progress
/// reporting.
pub fn eval<T, M>(
    measure: &T,
    iterator: &ActivationsIterator<'_, M>,
) -> Result<MeasureResult, MeasureError>
where
    T: Measure,
    M: ObservableLayers,
{
    measure.eval(iterator, &mut NoOpVis)
}

/// Evaluates ``measure`` with console progress reporting.
pub fn eval_verbose<T, M>(
    measure: &T,
    iterator: &ActivationsIterator<'_, M>,
) -> Result<MeasureResult, MeasureError>
where
    T: Measure,
    M: ObservableLayers,
{
    measure.eval(iterator, &mut EvalConsole::new())
}

/// Evaluates ``measure`` while recording per-transformation timings to
/// a csv file at ``path``.
pub fn eval_csv<T, M>(
    measure: &T,
    iterator: &ActivationsIterator<'_, M>,
    path: &Path,
) -> Result<MeasureResult, MeasureError>
where
    T: Measure,
    M: ObservableLayers,
{
    let mut visitor = EvalCsv::new(path)?;
    measure.eval(iterator, &mut visitor)
}
