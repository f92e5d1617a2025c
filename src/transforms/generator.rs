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

//! Declarative generators for common transformation sets

use float_ord::FloatOrd;
use itertools::iproduct;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::transforms::set::TransformationSet;
use crate::transforms::transformation::Transformation;

/// ``n`` uniformly spaced rotation angles covering ``[0, degrees)``.
///
/// The sampling step is ``degrees / n`` and the wrap-around duplicate at
/// ``degrees`` is excluded: four rotations spanning 360° sample the
/// angles 0°, 90°, 180° and 270°.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformRotation {
    n: usize,
    degrees: f64,
}

impl UniformRotation {
    /// Creates a rotation sampler with ``n`` angles covering ``[0, degrees)``.
    pub fn new(n: usize, degrees: f64) -> UniformRotation {
        assert!(n >= 1, "Expected at least one rotation, got n={}", n);
        assert!(
            degrees > 0.,
            "Expected a positive angular range, got degrees={}",
            degrees
        );
        UniformRotation { n, degrees }
    }

    /// Returns the sampled angles in degrees, in ascending order.
    pub fn angles(&self) -> Vec<f64> {
        let step = self.degrees / self.n as f64;
        (0..self.n).map(|idx| step * idx as f64).collect()
    }

    /// Returns the stable identifier of this configuration.
    pub fn id(&self) -> String {
        format!("UniformRotation(n={},range={})", self.n, self.degrees)
    }

    /// Generates the rotation-only transformation set.
    pub fn generate(&self) -> TransformationSet {
        let members = self
            .angles()
            .into_iter()
            .map(|degrees| Transformation::Rotation { degrees })
            .collect();
        // n >= 1, so the set is never empty
        TransformationSet::new(self.id(), members).unwrap()
    }
}

/// ``n`` rotation angles drawn uniformly at random from ``[-degrees, degrees]``.
///
/// The angles are a pure function of the stored seed, so repeated calls
/// and copies of the resulting set share no random state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomRotation {
    n: usize,
    degrees: f64,
    seed: u64,
}

impl RandomRotation {
    pub fn new(n: usize, degrees: f64, seed: u64) -> RandomRotation {
        assert!(n >= 1, "Expected at least one rotation, got n={}", n);
        assert!(
            degrees > 0.,
            "Expected a positive angular range, got degrees={}",
            degrees
        );
        RandomRotation { n, degrees, seed }
    }

    /// Returns the sampled angles in degrees, in ascending order.
    pub fn angles(&self) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut angles: Vec<f64> = (0..self.n)
            .map(|_| rng.gen_range(-self.degrees..=self.degrees))
            .collect();
        angles.sort_unstable_by_key(|angle| FloatOrd(*angle));
        angles
    }

    pub fn id(&self) -> String {
        format!(
            "RandomRotation(n={},range={},seed={})",
            self.n, self.degrees, self.seed
        )
    }

    pub fn generate(&self) -> TransformationSet {
        let members = self
            .angles()
            .into_iter()
            .map(|degrees| Transformation::Rotation { degrees })
            .collect();
        TransformationSet::new(self.id(), members).unwrap()
    }
}

/// ``n`` isotropic scale factors evenly spaced over ``[min, max]``.
///
/// Both endpoints are included; a single sample degenerates to ``min``.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformScale {
    n: usize,
    min: f64,
    max: f64,
}

impl UniformScale {
    pub fn new(n: usize, min: f64, max: f64) -> UniformScale {
        assert!(n >= 1, "Expected at least one scale factor, got n={}", n);
        assert!(
            0. < min && min <= max,
            "Expected 0 < min <= max, got min={} and max={}",
            min,
            max
        );
        UniformScale { n, min, max }
    }

    /// Returns the sampled scale factors in ascending order.
    pub fn factors(&self) -> Vec<f64> {
        if self.n == 1 {
            return vec![self.min];
        }
        let step = (self.max - self.min) / (self.n - 1) as f64;
        (0..self.n).map(|idx| self.min + step * idx as f64).collect()
    }

    pub fn id(&self) -> String {
        format!("UniformScale(n={},min={},max={})", self.n, self.min, self.max)
    }

    pub fn generate(&self) -> TransformationSet {
        let members = self
            .factors()
            .into_iter()
            .map(|factor| Transformation::Scale {
                x: factor,
                y: factor,
            })
            .collect();
        TransformationSet::new(self.id(), members).unwrap()
    }
}

/// Translations on a uniform grid of ``n`` offsets per axis over
/// ``[-max, max]``, as fractions of width and height.
///
/// Both endpoints are included; a single sample per axis degenerates to
/// zero offset. The generated set contains ``n * n`` members.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformTranslation {
    n: usize,
    max: f64,
}

impl UniformTranslation {
    pub fn new(n: usize, max: f64) -> UniformTranslation {
        assert!(n >= 1, "Expected at least one offset per axis, got n={}", n);
        assert!(max > 0., "Expected a positive offset range, got max={}", max);
        UniformTranslation { n, max }
    }

    /// Returns the sampled offsets per axis in ascending order.
    pub fn offsets(&self) -> Vec<f64> {
        if self.n == 1 {
            return vec![0.];
        }
        let step = 2. * self.max / (self.n - 1) as f64;
        (0..self.n).map(|idx| -self.max + step * idx as f64).collect()
    }

    pub fn id(&self) -> String {
        format!("UniformTranslation(n={},max={})", self.n, self.max)
    }

    pub fn generate(&self) -> TransformationSet {
        let offsets = self.offsets();
        let members = iproduct!(offsets.clone(), offsets)
            .map(|(x, y)| Transformation::Translation { x, y })
            .collect();
        TransformationSet::new(self.id(), members).unwrap()
    }
}

/// Generator for affine transformation sets combining rotation, scaling,
/// and translation samplers.
///
/// Components are configured through the builder methods. A generator
/// with exactly one configured component produces the corresponding
/// single-kind transformations so that parameter vectors stay minimal;
/// combined configurations produce the cartesian product of all sampled
/// components as [`Transformation::Affine`] members. An unconfigured
/// generator degenerates to the identity-only set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AffineGenerator {
    rotation: Option<UniformRotation>,
    scale: Option<UniformScale>,
    translation: Option<UniformTranslation>,
}

impl AffineGenerator {
    pub fn new() -> AffineGenerator {
        AffineGenerator::default()
    }

    pub fn rotation(mut self, rotation: UniformRotation) -> AffineGenerator {
        self.rotation = Some(rotation);
        self
    }

    pub fn scale(mut self, scale: UniformScale) -> AffineGenerator {
        self.scale = Some(scale);
        self
    }

    pub fn translation(mut self, translation: UniformTranslation) -> AffineGenerator {
        self.translation = Some(translation);
        self
    }

    /// Returns the stable identifier of this configuration.
    pub fn id(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(rotation) = &self.rotation {
            parts.push(format!("r={}", rotation.id()));
        }
        if let Some(scale) = &self.scale {
            parts.push(format!("s={}", scale.id()));
        }
        if let Some(translation) = &self.translation {
            parts.push(format!("t={}", translation.id()));
        }
        format!("Affine({})", parts.join(","))
    }

    /// Generates the configured transformation set.
    pub fn generate(&self) -> TransformationSet {
        let members = match (&self.rotation, &self.scale, &self.translation) {
            (None, None, None) => vec![Transformation::Identity],
            (Some(rotation), None, None) => rotation
                .angles()
                .into_iter()
                .map(|degrees| Transformation::Rotation { degrees })
                .collect(),
            (None, Some(scale), None) => scale
                .factors()
                .into_iter()
                .map(|factor| Transformation::Scale {
                    x: factor,
                    y: factor,
                })
                .collect(),
            (None, None, Some(translation)) => {
                let offsets = translation.offsets();
                iproduct!(offsets.clone(), offsets)
                    .map(|(x, y)| Transformation::Translation { x, y })
                    .collect()
            }
            _ => {
                let angles = self
                    .rotation
                    .map(|rotation| rotation.angles())
                    .unwrap_or_else(|| vec![0.]);
                let factors = self
                    .scale
                    .map(|scale| scale.factors())
                    .unwrap_or_else(|| vec![1.]);
                let offsets = self
                    .translation
                    .map(|translation| translation.offsets())
                    .unwrap_or_else(|| vec![0.]);

                iproduct!(angles, factors, offsets.clone(), offsets)
                    .map(|(degrees, factor, x, y)| Transformation::Affine {
                        degrees,
                        scale: [factor, factor],
                        translation: [x, y],
                    })
                    .collect()
            }
        };
        TransformationSet::new(self.id(), members).unwrap()
    }
}
