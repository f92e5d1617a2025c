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

//! Ordered, validated collections of input transformations

use std::fmt::Display;
use std::ops::Index;

use average::{Estimate, Max, Min};
use delegate::delegate;

use crate::transforms::transformation::{TransformError, Transformation};

/// An ordered, non-empty collection of [`Transformation`]s sharing a
/// configuration scheme.
///
/// A set owns its members outright. All members are immutable value
/// types, so [`copy`](TransformationSet::copy) yields an independent
/// instance that can be handed to a parallel worker without any shared
/// mutable state.
///
/// The [`id`](TransformationSet::id) is a deterministic function of the
/// set's configuration: two sets built with identical configuration
/// return equal ids, which makes the id suitable as a cache key for
/// results on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformationSet {
    descriptor: String,
    members: Vec<Transformation>,
}

impl TransformationSet {
    /// Creates a new set from a configuration descriptor and its members.
    ///
    /// Fails with [`TransformError::EmptySet`] if ``members`` is empty:
    /// an empty set has an undefined parameter range and is rejected at
    /// construction rather than left as an unsupported state.
    pub fn new(
        descriptor: impl Into<String>,
        members: Vec<Transformation>,
    ) -> Result<TransformationSet, TransformError> {
        if members.is_empty() {
            return Err(TransformError::EmptySet);
        }
        Ok(TransformationSet {
            descriptor: descriptor.into(),
            members,
        })
    }

    /// Returns the stable identifier of this set's configuration.
    pub fn id(&self) -> String {
        self.descriptor.clone()
    }

    /// Checks if every member transformation can legally be applied to
    /// an input of the given shape. Short-circuits without applying any
    /// transformation.
    pub fn valid_input(&self, shape: &[usize]) -> bool {
        self.members.iter().all(|t| t.valid_input(shape))
    }

    /// Produces an independent set with the same configuration.
    ///
    /// The result can be consumed by a parallel worker without observing
    /// or causing mutation of the original.
    pub fn copy(&self) -> TransformationSet {
        self.clone()
    }

    /// Returns the minimum and maximum over every parameter of every
    /// member transformation.
    ///
    /// Fails with [`TransformError::EmptyRange`] if no member carries
    /// any parameter (e.g. an identity-only set).
    pub fn parameter_range(&self) -> Result<(f64, f64), TransformError> {
        let mut min = Min::new();
        let mut max = Max::new();
        let mut empty = true;

        for transformation in &self.members {
            for parameter in transformation.parameters() {
                min.add(parameter);
                max.add(parameter);
                empty = false;
            }
        }

        if empty {
            return Err(TransformError::EmptyRange);
        }
        Ok((min.min(), max.max()))
    }

    delegate! {
        to self.members {
            /// Number of member transformations
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
            /// Iterates over the members in order
            pub fn iter(&self) -> std::slice::Iter<'_, Transformation>;
            pub fn get(&self, index: usize) -> Option<&Transformation>;
        }
    }
}

impl Index<usize> for TransformationSet {
    type Output = Transformation;

    fn index(&self, index: usize) -> &Transformation {
        &self.members[index]
    }
}

impl<'a> IntoIterator for &'a TransformationSet {
    type IntoIter = std::slice::Iter<'a, Transformation>;
    type Item = &'a Transformation;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

impl Display for TransformationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} members)", self.descriptor, self.members.len())
    }
}
