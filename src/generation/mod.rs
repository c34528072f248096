//! # Generation Module
//!
//! Procedural terrain generation for the battle grid.
//!
//! Terrain is synthesized once at match setup by wave function collapse over
//! a small seed sample. The [`Generator`] trait keeps the grid independent of
//! the concrete algorithm, and [`SynthesisConfig`] carries everything a run
//! needs to be reproducible.

pub mod wave;
pub mod wfc;

pub use wave::*;
pub use wfc::*;

use crate::{config, TacticaResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for terrain synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Output width in tiles
    pub output_width: usize,
    /// Output height in tiles
    pub output_height: usize,
    /// Total runs allowed before a contradiction is reported (at least 1)
    pub max_attempts: u32,
}

impl SynthesisConfig {
    /// Creates a configuration for the default grid size.
    ///
    /// # Examples
    ///
    /// ```
    /// use tactica::SynthesisConfig;
    ///
    /// let config = SynthesisConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert_eq!(config.max_attempts, 1);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            output_width: config::DEFAULT_GRID_WIDTH as usize,
            output_height: config::DEFAULT_GRID_HEIGHT as usize,
            max_attempts: 1,
        }
    }

    /// Creates a configuration for testing with a small output.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            output_width: 6,
            output_height: 6,
            max_attempts: 1,
        }
    }

    /// Overrides the output dimensions.
    pub fn with_output_size(mut self, width: usize, height: usize) -> Self {
        self.output_width = width;
        self.output_height = height;
        self
    }

    /// Opts into retries after a contradiction.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &SynthesisConfig, rng: &mut StdRng) -> TacticaResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &SynthesisConfig) -> TacticaResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use crate::{TacticaError, TerrainMap, TerrainType};

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &SynthesisConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Creates the random stream for a retry after a contradiction.
    ///
    /// Attempt zero is the caller's own generator; later attempts each get a
    /// distinct stream derived from the config seed.
    pub fn attempt_rng(config: &SynthesisConfig, attempt: u32) -> StdRng {
        let mix = u64::from(attempt).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(config.seed ^ mix)
    }

    /// Parses a seed sample of terrain codes given as rows.
    ///
    /// # Examples
    ///
    /// ```
    /// use tactica::{generation::utils::parse_seed, TerrainType};
    ///
    /// let sample = parse_seed(&[vec![0, 1], vec![2, 0]]).unwrap();
    /// assert_eq!(sample.get(1, 0), Some(TerrainType::Sand));
    /// assert!(parse_seed(&[vec![0, 7], vec![0, 0]]).is_err());
    /// ```
    pub fn parse_seed(rows: &[Vec<u8>]) -> TacticaResult<TerrainMap> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width < 2 || height < 2 {
            return Err(TacticaError::InvalidSeed(format!(
                "sample must be at least 2x2, got {width}x{height}"
            )));
        }
        if rows.iter().any(|row| row.len() != width) {
            return Err(TacticaError::InvalidSeed(
                "sample rows must all have the same length".to_string(),
            ));
        }

        let rows = rows
            .iter()
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, &code)| {
                        TerrainType::from_code(code).ok_or_else(|| {
                            TacticaError::InvalidSeed(format!(
                                "unknown terrain value {code} at ({x}, {y})"
                            ))
                        })
                    })
                    .collect::<TacticaResult<Vec<_>>>()
            })
            .collect::<TacticaResult<Vec<_>>>()?;

        TerrainMap::from_rows(rows)
    }

    /// A grass meadow with a sand shore around a small pond.
    pub fn default_seed() -> Vec<Vec<u8>> {
        vec![
            vec![0, 0, 0, 0, 0, 0],
            vec![0, 0, 1, 1, 0, 0],
            vec![0, 1, 2, 2, 1, 0],
            vec![0, 1, 2, 2, 1, 0],
            vec![0, 0, 1, 1, 0, 0],
            vec![0, 0, 0, 0, 0, 0],
        ]
    }
}
