//! # Wave Function Collapse
//!
//! Overlapping-model terrain synthesis with 2x2 patterns.
//!
//! Every 2x2 window of the sample becomes a pattern weighted by how often it
//! occurs. The output is covered by an `(w - 1) x (h - 1)` lattice of
//! overlapping pattern placements; neighbouring placements must agree on the
//! row or column they share. Cells are observed lowest-entropy first and
//! constraints are propagated to a fixed point after every observation.

use super::{utils, Generator, SynthesisConfig, Wave};
use crate::{TacticaError, TacticaResult, TerrainMap, TerrainType};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet, VecDeque};

/// Lattice directions. Above and below refer to smaller and larger `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Left,
    Above,
    Below,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Above,
        Direction::Below,
    ];

    fn offset(self) -> (isize, isize) {
        match self {
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
            Direction::Above => (0, -1),
            Direction::Below => (0, 1),
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// A 2x2 block of terrain taken from the sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Values in row-major order: top-left, top-right, bottom-left, bottom-right
    pub cells: [TerrainType; 4],
    /// Occurrences in the sample
    pub frequency: u32,
    compatible: [Vec<usize>; 4],
}

impl Pattern {
    fn new(cells: [TerrainType; 4]) -> Self {
        Self {
            cells,
            frequency: 0,
            compatible: Default::default(),
        }
    }

    /// Pattern ids that may sit next to this one in `direction`.
    pub fn compatible(&self, direction: Direction) -> &[usize] {
        &self.compatible[direction.slot()]
    }

    /// Whether `other` may sit next to this pattern in `direction`.
    fn agrees_with(&self, other: &Pattern, direction: Direction) -> bool {
        let [tl, tr, bl, br] = self.cells;
        let [otl, otr, obl, obr] = other.cells;
        match direction {
            Direction::Right => tr == otl && br == obl,
            Direction::Left => tl == otr && bl == obr,
            Direction::Above => tl == obl && tr == obr,
            Direction::Below => bl == otl && br == otr,
        }
    }
}

/// Extracts every 2x2 window of the sample, ids in first-seen order, and
/// fills in the compatibility lists.
pub fn extract_patterns(sample: &TerrainMap) -> Vec<Pattern> {
    let mut patterns: Vec<Pattern> = Vec::new();
    let mut ids: HashMap<[TerrainType; 4], usize> = HashMap::new();

    for y in 0..sample.height().saturating_sub(1) {
        for x in 0..sample.width().saturating_sub(1) {
            let Some(key) = block_at(sample, x, y) else {
                continue;
            };
            let id = *ids.entry(key).or_insert_with(|| {
                patterns.push(Pattern::new(key));
                patterns.len() - 1
            });
            patterns[id].frequency += 1;
        }
    }

    for a in 0..patterns.len() {
        for direction in Direction::ALL {
            let compatible: Vec<usize> = (0..patterns.len())
                .filter(|&b| patterns[a].agrees_with(&patterns[b], direction))
                .collect();
            patterns[a].compatible[direction.slot()] = compatible;
        }
    }

    patterns
}

fn block_at(map: &TerrainMap, x: usize, y: usize) -> Option<[TerrainType; 4]> {
    Some([
        map.get(x, y)?,
        map.get(x + 1, y)?,
        map.get(x, y + 1)?,
        map.get(x + 1, y + 1)?,
    ])
}

/// Terrain generator driven by a seed sample.
///
/// # Examples
///
/// ```
/// use tactica::{generation::utils, Generator, SynthesisConfig, WfcSynthesizer};
///
/// let synthesizer = WfcSynthesizer::from_codes(&[vec![1, 1], vec![1, 1]]).unwrap();
/// let config = SynthesisConfig::new(3).with_output_size(5, 4);
/// let terrain = synthesizer.generate(&config, &mut utils::create_rng(&config)).unwrap();
/// assert_eq!((terrain.width(), terrain.height()), (5, 4));
/// assert!(terrain.is_uniform());
/// ```
#[derive(Debug, Clone)]
pub struct WfcSynthesizer {
    sample: TerrainMap,
}

impl WfcSynthesizer {
    /// Creates a synthesizer over the built-in meadow sample.
    pub fn new() -> Self {
        let sample = utils::parse_seed(&utils::default_seed())
            .unwrap_or_else(|_| TerrainMap::filled(2, 2, TerrainType::Grass));
        Self { sample }
    }

    /// Uses a custom sample, which must be at least 2x2.
    pub fn with_sample(sample: TerrainMap) -> TacticaResult<Self> {
        if sample.width() < 2 || sample.height() < 2 {
            return Err(TacticaError::InvalidSeed(format!(
                "sample must be at least 2x2, got {}x{}",
                sample.width(),
                sample.height()
            )));
        }
        Ok(Self { sample })
    }

    /// Parses a sample of terrain codes (0 grass, 1 sand, 2 water).
    pub fn from_codes(rows: &[Vec<u8>]) -> TacticaResult<Self> {
        Self::with_sample(utils::parse_seed(rows)?)
    }

    pub fn sample(&self) -> &TerrainMap {
        &self.sample
    }

    /// One full observe/propagate run.
    fn run(
        &self,
        patterns: &[Pattern],
        config: &SynthesisConfig,
        rng: &mut StdRng,
    ) -> TacticaResult<TerrainMap> {
        let mut wave = Wave::new(
            config.output_width - 1,
            config.output_height - 1,
            patterns.len(),
        );

        // Prune patterns that can never have a neighbour before observing.
        let everything: Vec<usize> = (0..wave.len()).collect();
        propagate(&mut wave, patterns, everything)?;

        while let Some(cell) = wave.lowest_entropy_cell() {
            let candidates = wave.candidates(cell);
            let weights = candidates.iter().map(|&id| patterns[id].frequency);
            let choice = WeightedIndex::new(weights)
                .map_err(|err| TacticaError::InvalidState(format!("pattern weights: {err}")))?;
            let chosen = candidates[choice.sample(rng)];

            wave.collapse(cell, chosen);
            propagate(&mut wave, patterns, vec![cell])?;
        }

        materialize(&wave, patterns, config)
    }
}

impl Default for WfcSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes candidates without support until nothing changes.
fn propagate(wave: &mut Wave, patterns: &[Pattern], changed: Vec<usize>) -> TacticaResult<()> {
    let mut worklist: VecDeque<usize> = changed.into();

    while let Some(cell) = worklist.pop_front() {
        let (x, y) = wave.position(cell);
        let sources = wave.candidates(cell);

        for direction in Direction::ALL {
            let (dx, dy) = direction.offset();
            let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
                continue;
            };
            if nx >= wave.width() || ny >= wave.height() {
                continue;
            }

            let neighbor = wave.index(nx, ny);
            let supported: HashSet<usize> = sources
                .iter()
                .flat_map(|&id| patterns[id].compatible(direction).iter().copied())
                .collect();

            let mut shrunk = false;
            for candidate in wave.candidates(neighbor) {
                if !supported.contains(&candidate) {
                    shrunk |= wave.ban(neighbor, candidate);
                }
            }

            if wave.count(neighbor) == 0 {
                log::debug!("Contradiction at lattice cell ({}, {})", nx, ny);
                return Err(TacticaError::GenerationContradiction { x: nx, y: ny });
            }
            if shrunk {
                worklist.push_back(neighbor);
            }
        }
    }

    Ok(())
}

/// Writes each collapsed pattern's block at its lattice offset.
fn materialize(
    wave: &Wave,
    patterns: &[Pattern],
    config: &SynthesisConfig,
) -> TacticaResult<TerrainMap> {
    let mut terrain = TerrainMap::filled(
        config.output_width,
        config.output_height,
        TerrainType::Grass,
    );

    for cell in 0..wave.len() {
        let (x, y) = wave.position(cell);
        let id = wave.collapsed_pattern(cell).ok_or_else(|| {
            TacticaError::InvalidState(format!("lattice cell ({x}, {y}) was never collapsed"))
        })?;
        let [tl, tr, bl, br] = patterns[id].cells;
        terrain.set(x, y, tl);
        terrain.set(x + 1, y, tr);
        terrain.set(x, y + 1, bl);
        terrain.set(x + 1, y + 1, br);
    }

    Ok(terrain)
}

impl Generator<TerrainMap> for WfcSynthesizer {
    fn generate(&self, config: &SynthesisConfig, rng: &mut StdRng) -> TacticaResult<TerrainMap> {
        if config.output_width < 2 || config.output_height < 2 {
            return Err(TacticaError::InvalidSize(format!(
                "output must be at least 2x2, got {}x{}",
                config.output_width, config.output_height
            )));
        }

        let patterns = extract_patterns(&self.sample);
        log::debug!(
            "Extracted {} patterns from a {}x{} sample",
            patterns.len(),
            self.sample.width(),
            self.sample.height()
        );

        let attempts = config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let result = if attempt == 0 {
                self.run(&patterns, config, rng)
            } else {
                self.run(&patterns, config, &mut utils::attempt_rng(config, attempt))
            };

            match result {
                Err(TacticaError::GenerationContradiction { x, y }) if attempt + 1 < attempts => {
                    log::warn!(
                        "Synthesis attempt {} hit a contradiction at ({}, {}), retrying",
                        attempt + 1,
                        x,
                        y
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn validate(&self, content: &TerrainMap, config: &SynthesisConfig) -> TacticaResult<()> {
        if content.width() != config.output_width || content.height() != config.output_height {
            return Err(TacticaError::InvalidSize(format!(
                "expected {}x{} terrain, got {}x{}",
                config.output_width,
                config.output_height,
                content.width(),
                content.height()
            )));
        }

        let known: HashSet<[TerrainType; 4]> = extract_patterns(&self.sample)
            .into_iter()
            .map(|pattern| pattern.cells)
            .collect();

        for y in 0..content.height().saturating_sub(1) {
            for x in 0..content.width().saturating_sub(1) {
                match block_at(content, x, y) {
                    Some(block) if known.contains(&block) => {}
                    _ => {
                        return Err(TacticaError::InvalidState(format!(
                            "block at ({x}, {y}) does not occur in the sample"
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "WfcSynthesizer"
    }
}
