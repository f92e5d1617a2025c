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

//! Invariance measures over transformed activations

use ndarray_npy::{ReadNpzError, WriteNpzError};
use thiserror::Error;

use crate::model::network::ModelError;
use crate::transforms::transformation::TransformError;

pub mod cache;
pub mod eval;
pub mod iter;
pub mod result;
pub mod variance;

#[derive(Error, Debug)]
pub enum MeasureError {
    #[error("Transformation failed: {0}")]
    Transform(#[from] TransformError),
    #[error("Model evaluation failed: {0}")]
    Model(#[from] ModelError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not write npz archive: {0}")]
    WriteNpz(#[from] WriteNpzError),
    #[error("Could not read npz archive: {0}")]
    ReadNpz(#[from] ReadNpzError),
    #[error("Could not write csv output: {0}")]
    Csv(#[from] csv::Error),
}
