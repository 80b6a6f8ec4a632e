//! In-memory tile world
//!
//! `GridWorld` stands in for an emulator: a handful of rectangular maps with
//! walls and warp tiles, driven through the same [`World`] contract. Layouts
//! are plain serde data so they can be loaded from TOML.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OwlError, Result};
use crate::types::{Action, State};
use crate::world::{InputTiming, World};

const WALL: char = '#';

/// A tile on a specific map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub map: u32,
    pub x: u32,
    pub y: u32,
}

impl From<SpawnPoint> for State {
    fn from(point: SpawnPoint) -> Self {
        State::new(point.x, point.y, point.map)
    }
}

/// Stepping onto `(x, y)` moves the player to `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarpLayout {
    pub x: u32,
    pub y: u32,
    pub to: SpawnPoint,
}

/// One map: `rows[y]` holds the tiles of row `y`, `#` marks a wall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    pub id: u32,
    pub rows: Vec<String>,
    #[serde(default)]
    pub warps: Vec<WarpLayout>,
}

/// Complete description of a world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldLayout {
    pub start: SpawnPoint,
    pub maps: Vec<MapLayout>,
}

impl WorldLayout {
    /// Parse a layout from TOML
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| OwlError::Config(format!("invalid world layout: {e}")))
    }

    /// Read and parse a layout file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Built-in three map layout: a house, the town outside it, and a route
    pub fn demo() -> Self {
        let rows = |rows: &[&str]| -> Vec<String> {
            rows.iter().map(|r| (*r).to_string()).collect()
        };

        Self {
            start: SpawnPoint { map: 0, x: 2, y: 2 },
            maps: vec![
                MapLayout {
                    id: 0,
                    rows: rows(&["######", "#....#", "#....#", "#....#", "###.##"]),
                    warps: vec![WarpLayout {
                        x: 3,
                        y: 4,
                        to: SpawnPoint { map: 1, x: 4, y: 2 },
                    }],
                },
                MapLayout {
                    id: 1,
                    rows: rows(&[
                        "##########",
                        "#........#",
                        "#.##..##.#",
                        "#........#",
                        "#........#",
                        "#.##..##.#",
                        "#........#",
                        "####..####",
                    ]),
                    warps: vec![
                        WarpLayout {
                            x: 4,
                            y: 1,
                            to: SpawnPoint { map: 0, x: 3, y: 3 },
                        },
                        WarpLayout {
                            x: 4,
                            y: 7,
                            to: SpawnPoint { map: 2, x: 2, y: 1 },
                        },
                        WarpLayout {
                            x: 5,
                            y: 7,
                            to: SpawnPoint { map: 2, x: 2, y: 1 },
                        },
                    ],
                },
                MapLayout {
                    id: 2,
                    rows: rows(&[
                        "########",
                        "#..#...#",
                        "#......#",
                        "#.#....#",
                        "#......#",
                        "########",
                    ]),
                    warps: vec![WarpLayout {
                        x: 1,
                        y: 1,
                        to: SpawnPoint { map: 1, x: 4, y: 6 },
                    }],
                },
            ],
        }
    }
}

#[derive(Debug, Clone)]
struct TileMap {
    width: u32,
    height: u32,
    walls: HashSet<(u32, u32)>,
    warps: HashMap<(u32, u32), SpawnPoint>,
}

impl TileMap {
    fn from_layout(layout: &MapLayout) -> Result<Self> {
        let height = layout.rows.len();
        if height == 0 {
            return Err(OwlError::Config(format!("map {} has no rows", layout.id)));
        }

        let width = layout.rows[0].chars().count();
        if width == 0 {
            return Err(OwlError::Config(format!("map {} has empty rows", layout.id)));
        }

        let mut walls = HashSet::new();
        for (y, row) in layout.rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(OwlError::Config(format!(
                    "map {} row {y} has {} tiles, expected {width}",
                    layout.id,
                    row.chars().count()
                )));
            }
            for (x, tile) in row.chars().enumerate() {
                if tile == WALL {
                    walls.insert((to_coord(x)?, to_coord(y)?));
                }
            }
        }

        Ok(Self {
            width: to_coord(width)?,
            height: to_coord(height)?,
            walls,
            warps: HashMap::new(),
        })
    }

    fn is_floor(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && !self.walls.contains(&(x, y))
    }

    /// Tile reached by moving one step, if it is walkable
    fn neighbour(&self, x: u32, y: u32, action: Action) -> Option<(u32, u32)> {
        let (nx, ny) = match action {
            Action::Up => (x, y.checked_sub(1)?),
            Action::Down => (x, y.checked_add(1)?),
            Action::Left => (x.checked_sub(1)?, y),
            Action::Right => (x.checked_add(1)?, y),
        };
        self.is_floor(nx, ny).then_some((nx, ny))
    }
}

fn to_coord(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| OwlError::Config(format!("coordinate {value} out of range")))
}

/// Deterministic tile world implementing [`World`]
#[derive(Debug, Clone)]
pub struct GridWorld {
    maps: HashMap<u32, TileMap>,
    start: State,
    position: State,
    ticks: u64,
    inputs: u64,
}

impl GridWorld {
    /// Build a world from a layout, validating every map, warp, and the start tile
    pub fn new(layout: &WorldLayout) -> Result<Self> {
        if layout.maps.is_empty() {
            return Err(OwlError::Config("world layout has no maps".to_string()));
        }

        let mut maps = HashMap::new();
        for map in &layout.maps {
            if maps.insert(map.id, TileMap::from_layout(map)?).is_some() {
                return Err(OwlError::Config(format!("duplicate map id {}", map.id)));
            }
        }

        for map in &layout.maps {
            for warp in &map.warps {
                Self::check_floor(&maps, map.id, warp.x, warp.y, "warp")?;
                Self::check_floor(&maps, warp.to.map, warp.to.x, warp.to.y, "warp target")?;
            }
        }
        for map in &layout.maps {
            if let Some(tiles) = maps.get_mut(&map.id) {
                tiles
                    .warps
                    .extend(map.warps.iter().map(|w| ((w.x, w.y), w.to)));
            }
        }

        let start = layout.start;
        Self::check_floor(&maps, start.map, start.x, start.y, "start")?;

        Ok(Self {
            maps,
            start: start.into(),
            position: start.into(),
            ticks: 0,
            inputs: 0,
        })
    }

    /// World built from [`WorldLayout::demo`]
    pub fn demo() -> Result<Self> {
        Self::new(&WorldLayout::demo())
    }

    /// Load a layout file and build the world from it
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::new(&WorldLayout::from_file(path)?)
    }

    fn check_floor(
        maps: &HashMap<u32, TileMap>,
        map: u32,
        x: u32,
        y: u32,
        what: &str,
    ) -> Result<()> {
        let tiles = maps
            .get(&map)
            .ok_or_else(|| OwlError::Config(format!("{what} refers to unknown map {map}")))?;
        if tiles.is_floor(x, y) {
            Ok(())
        } else {
            Err(OwlError::Config(format!(
                "{what} ({x}, {y}) on map {map} is not a floor tile"
            )))
        }
    }

    /// Current position without going through the `World` trait
    pub fn position(&self) -> State {
        self.position
    }

    /// Put the player back on the start tile
    pub fn respawn(&mut self) {
        self.position = self.start;
    }

    /// Teleport to an arbitrary walkable tile
    pub fn place(&mut self, state: State) -> Result<()> {
        Self::check_floor(&self.maps, state.map_id, state.x, state.y, "placement")?;
        self.position = state;
        Ok(())
    }

    /// Ticks elapsed across all executed inputs
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of inputs executed
    pub fn inputs(&self) -> u64 {
        self.inputs
    }

    pub fn map_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.maps.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Count of walkable tiles over every map
    pub fn floor_tiles(&self) -> usize {
        self.maps
            .values()
            .map(|m| (m.width as usize * m.height as usize) - m.walls.len())
            .sum()
    }
}

impl World for GridWorld {
    fn read_state(&mut self) -> Result<State> {
        Ok(self.position)
    }

    fn execute(&mut self, action: Action, timing: InputTiming) -> Result<()> {
        self.inputs += 1;
        self.ticks += timing.total_ticks();

        let current = self.position;
        let Some(tiles) = self.maps.get(&current.map_id) else {
            return Err(OwlError::world(format!(
                "player is on unknown map {}",
                current.map_id
            )));
        };

        let Some((x, y)) = tiles.neighbour(current.x, current.y, action) else {
            return Ok(());
        };

        self.position = match tiles.warps.get(&(x, y)) {
            Some(target) => {
                debug!("Warp from {} to {:?}", State::new(x, y, current.map_id), target);
                (*target).into()
            }
            None => State::new(x, y, current.map_id),
        };

        Ok(())
    }
}
