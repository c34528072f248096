//! # Grid Module
//!
//! The authoritative tile store of the battle grid.
//!
//! The grid owns terrain and highlight state for every tile. It deliberately
//! knows nothing about units: occupancy lives in the [`UnitRegistry`] so the
//! grid can be rebuilt or re-terrained without touching the rosters.
//!
//! [`UnitRegistry`]: crate::UnitRegistry

use crate::{
    generation::{Generator, SynthesisConfig},
    GridCoordinate, TacticaError, TacticaResult,
};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Terrain types a tile can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerrainType {
    Grass,
    Sand,
    Water,
}

impl TerrainType {
    /// All terrain types in encoding order.
    pub const ALL: [TerrainType; 3] = [TerrainType::Grass, TerrainType::Sand, TerrainType::Water];

    /// Decodes a seed value (`0` grass, `1` sand, `2` water).
    pub fn from_code(code: u8) -> Option<TerrainType> {
        match code {
            0 => Some(TerrainType::Grass),
            1 => Some(TerrainType::Sand),
            2 => Some(TerrainType::Water),
            _ => None,
        }
    }

    /// Encodes the terrain as its seed value.
    pub fn code(self) -> u8 {
        match self {
            TerrainType::Grass => 0,
            TerrainType::Sand => 1,
            TerrainType::Water => 2,
        }
    }

    /// Gets the ASCII glyph used by text output.
    pub fn glyph(self) -> char {
        match self {
            TerrainType::Grass => '.',
            TerrainType::Sand => ':',
            TerrainType::Water => '~',
        }
    }
}

/// A single grid tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Grid coordinate, the tile's identity
    pub coordinate: GridCoordinate,
    /// Terrain written by the synthesizer
    pub terrain: TerrainType,
    /// Whether presentation currently allows clicking this tile
    pub interactable: bool,
}

impl Tile {
    /// Creates a grass tile that accepts interaction.
    pub fn new(coordinate: GridCoordinate) -> Self {
        Self {
            coordinate,
            terrain: TerrainType::Grass,
            interactable: true,
        }
    }
}

/// A dense terrain raster, as produced by terrain synthesis.
///
/// Cells are stored row-major with `y` selecting the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainMap {
    width: usize,
    height: usize,
    cells: Vec<TerrainType>,
}

impl TerrainMap {
    /// Creates a map filled with a single terrain type.
    pub fn filled(width: usize, height: usize, terrain: TerrainType) -> Self {
        Self {
            width,
            height,
            cells: vec![terrain; width * height],
        }
    }

    /// Builds a map from rows of terrain.
    ///
    /// Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<TerrainType>>) -> TacticaResult<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|row| row.len() != width) {
            return Err(TacticaError::InvalidSize(
                "terrain rows must all have the same length".to_string(),
            ));
        }

        Ok(Self {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Gets the terrain at `(x, y)`, if inside the map.
    pub fn get(&self, x: usize, y: usize) -> Option<TerrainType> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// Sets the terrain at `(x, y)`; out-of-range writes are dropped.
    pub fn set(&mut self, x: usize, y: usize, terrain: TerrainType) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = terrain;
        }
    }

    /// Iterates `(coordinate, terrain)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoordinate, TerrainType)> + '_ {
        self.cells.iter().enumerate().map(move |(i, terrain)| {
            let x = (i % self.width) as i32;
            let y = (i / self.width) as i32;
            (GridCoordinate::new(x, y), *terrain)
        })
    }

    /// Returns the map as rows of terrain.
    pub fn rows(&self) -> Vec<Vec<TerrainType>> {
        if self.width == 0 {
            return Vec::new();
        }
        self.cells.chunks(self.width).map(<[_]>::to_vec).collect()
    }

    /// Whether every cell holds the same terrain.
    pub fn is_uniform(&self) -> bool {
        self.cells.windows(2).all(|pair| pair[0] == pair[1])
    }
}

impl fmt::Display for TerrainMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|t| t.glyph()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Tile store keyed by grid coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridModel {
    width: u32,
    height: u32,
    tiles: HashMap<GridCoordinate, Tile>,
}

impl GridModel {
    /// Creates a grid of grass tiles.
    ///
    /// # Examples
    ///
    /// ```
    /// use tactica::{GridCoordinate, GridModel, TerrainType};
    ///
    /// let grid = GridModel::new(10, 10);
    /// let tile = grid.tile_at(GridCoordinate::new(4, 3)).unwrap();
    /// assert_eq!(tile.terrain, TerrainType::Grass);
    /// assert!(grid.tile_at(GridCoordinate::new(10, 0)).is_none());
    /// ```
    pub fn new(width: u32, height: u32) -> Self {
        let mut tiles = HashMap::with_capacity((width * height) as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let coordinate = GridCoordinate::new(x, y);
                tiles.insert(coordinate, Tile::new(coordinate));
            }
        }

        Self {
            width,
            height,
            tiles,
        }
    }

    /// Builds the grid and fills it with synthesized terrain.
    ///
    /// The generator's output size is forced to the grid size. Generation
    /// failures, including contradictions, are returned to the caller.
    pub fn initialize<G: Generator<TerrainMap>>(
        width: u32,
        height: u32,
        generator: &G,
        config: &SynthesisConfig,
        rng: &mut StdRng,
    ) -> TacticaResult<Self> {
        let mut grid = Self::new(width, height);
        let config = config
            .clone()
            .with_output_size(width as usize, height as usize);

        let terrain = generator.generate(&config, rng)?;
        generator.validate(&terrain, &config)?;
        grid.apply_terrain(&terrain);

        log::info!(
            "Initialized {}x{} grid using {}",
            width,
            height,
            generator.generator_type()
        );
        Ok(grid)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the coordinate lies on the grid.
    pub fn contains(&self, coord: GridCoordinate) -> bool {
        self.tiles.contains_key(&coord)
    }

    /// Gets the tile at a coordinate.
    pub fn tile_at(&self, coord: GridCoordinate) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    /// Maps a grid coordinate onto the ground plane used by presentation.
    pub fn world_position(&self, coord: GridCoordinate) -> [f32; 3] {
        [coord.x as f32, 0.0, coord.y as f32]
    }

    /// Writes terrain from a raster into the grid.
    ///
    /// Raster cells that fall outside the grid are ignored and grid tiles the
    /// raster does not cover keep their terrain.
    pub fn apply_terrain(&mut self, terrain: &TerrainMap) {
        for (coord, value) in terrain.iter() {
            if let Some(tile) = self.tiles.get_mut(&coord) {
                tile.terrain = value;
            }
        }
    }

    /// Snapshots the grid terrain as a raster.
    pub fn terrain_map(&self) -> TerrainMap {
        let mut map = TerrainMap::filled(
            self.width as usize,
            self.height as usize,
            TerrainType::Grass,
        );
        for tile in self.tiles.values() {
            map.set(
                tile.coordinate.x as usize,
                tile.coordinate.y as usize,
                tile.terrain,
            );
        }
        map
    }

    /// All coordinates in row-major order.
    pub fn coordinates(&self) -> Vec<GridCoordinate> {
        let mut coords: Vec<_> = self.tiles.keys().copied().collect();
        coords.sort_by_key(|c| (c.y, c.x));
        coords
    }

    /// Marks a tile as clickable or not; unknown coordinates are ignored.
    pub fn set_interactable(&mut self, coord: GridCoordinate, interactable: bool) {
        if let Some(tile) = self.tiles.get_mut(&coord) {
            tile.interactable = interactable;
        }
    }

    /// Sets the interactable flag of every tile at once.
    pub fn reset_interactable(&mut self, interactable: bool) {
        for tile in self.tiles.values_mut() {
            tile.interactable = interactable;
        }
    }

    /// Counts tiles per terrain type.
    pub fn terrain_counts(&self) -> HashMap<TerrainType, usize> {
        let mut counts = HashMap::new();
        for tile in self.tiles.values() {
            *counts.entry(tile.terrain).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = GridModel::new(10, 8);
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 8);
        assert_eq!(grid.coordinates().len(), 80);
        assert!(grid.contains(GridCoordinate::new(9, 7)));
        assert!(!grid.contains(GridCoordinate::new(-1, 0)));
    }

    #[test]
    fn test_coordinates_row_major() {
        let grid = GridModel::new(3, 2);
        let coords = grid.coordinates();
        assert_eq!(coords[0], GridCoordinate::new(0, 0));
        assert_eq!(coords[1], GridCoordinate::new(1, 0));
        assert_eq!(coords[3], GridCoordinate::new(0, 1));
    }

    #[test]
    fn test_world_position() {
        let grid = GridModel::new(10, 10);
        assert_eq!(grid.world_position(GridCoordinate::new(4, 7)), [4.0, 0.0, 7.0]);
    }

    #[test]
    fn test_apply_terrain_ignores_out_of_bounds() {
        let mut grid = GridModel::new(3, 3);
        let terrain = TerrainMap::filled(5, 2, TerrainType::Water);
        grid.apply_terrain(&terrain);

        assert_eq!(
            grid.tile_at(GridCoordinate::new(2, 1)).unwrap().terrain,
            TerrainType::Water
        );
        // Row 2 is outside the raster and keeps its terrain
        assert_eq!(
            grid.tile_at(GridCoordinate::new(0, 2)).unwrap().terrain,
            TerrainType::Grass
        );
        assert_eq!(grid.terrain_counts()[&TerrainType::Water], 6);
    }

    #[test]
    fn test_interactable_flags() {
        let mut grid = GridModel::new(4, 4);
        grid.reset_interactable(false);
        grid.set_interactable(GridCoordinate::new(1, 1), true);
        grid.set_interactable(GridCoordinate::new(40, 1), true);

        let clickable: Vec<_> = grid
            .coordinates()
            .into_iter()
            .filter(|c| grid.tile_at(*c).unwrap().interactable)
            .collect();
        assert_eq!(clickable, vec![GridCoordinate::new(1, 1)]);
    }

    #[test]
    fn test_terrain_map_rows_and_display() {
        let map = TerrainMap::from_rows(vec![
            vec![TerrainType::Grass, TerrainType::Sand],
            vec![TerrainType::Water, TerrainType::Grass],
        ])
        .unwrap();
        assert_eq!(map.get(1, 0), Some(TerrainType::Sand));
        assert_eq!(map.get(0, 1), Some(TerrainType::Water));
        assert_eq!(map.get(2, 0), None);
        assert_eq!(map.to_string(), ".:\n~.\n");
        assert!(!map.is_uniform());
    }

    #[test]
    fn test_terrain_map_rejects_ragged_rows() {
        let result = TerrainMap::from_rows(vec![
            vec![TerrainType::Grass, TerrainType::Sand],
            vec![TerrainType::Water],
        ]);
        assert!(matches!(result, Err(TacticaError::InvalidSize(_))));
    }

    #[test]
    fn test_terrain_codes() {
        for terrain in TerrainType::ALL {
            assert_eq!(TerrainType::from_code(terrain.code()), Some(terrain));
        }
        assert_eq!(TerrainType::from_code(7), None);
    }
}
