use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::position::unit::{MovePoints, MOVE_POINT_SCALE};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Terrain {
    Plain,
    Hill,
    Mountain,
    Water,
}

impl Terrain {
    /// Cost of entering the tile orthogonally, or `None` if it cannot be entered at all.
    pub fn move_cost(self) -> Option<MovePoints> {
        match self {
            Terrain::Plain => Some(MOVE_POINT_SCALE),
            Terrain::Hill | Terrain::Water => Some(2 * MOVE_POINT_SCALE),
            Terrain::Mountain => None,
        }
    }

    pub fn is_passable(self) -> bool {
        self.move_cost().is_some()
    }

    pub fn attack_bonus(self) -> f64 {
        match self {
            Terrain::Hill => 0.1,
            Terrain::Water => -0.1,
            Terrain::Plain | Terrain::Mountain => 0.0,
        }
    }

    pub fn defense_bonus(self) -> f64 {
        match self {
            Terrain::Hill => 0.2,
            Terrain::Water => 0.1,
            Terrain::Plain | Terrain::Mountain => 0.0,
        }
    }

    pub(crate) fn symbol(self) -> char {
        match self {
            Terrain::Plain => '.',
            Terrain::Hill => '^',
            Terrain::Mountain => 'M',
            Terrain::Water => '~',
        }
    }
}

/// A fixed-size grid of terrain tiles, stored row by row.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Board {
    width: usize,
    height: usize,
    tiles: Vec<Terrain>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, Terrain::Plain)
    }

    pub fn filled(width: usize, height: usize, terrain: Terrain) -> Self {
        assert!(width > 0 && height > 0, "Board must have at least one tile");
        Board {
            width,
            height,
            tiles: vec![terrain; width * height],
        }
    }

    pub fn generate<R: Rng>(kind: MapKind, width: usize, height: usize, rng: &mut R) -> Self {
        let mut board = Board::new(width, height);
        match kind {
            MapKind::Plains => (),
            MapKind::Default => board.add_default_features(),
            MapKind::Hilly => board.add_hills(rng),
            MapKind::Watery => board.add_rivers(),
            MapKind::Mountainous => board.add_mountain_diagonal(),
            MapKind::Mixed => board.add_mixed_features(rng),
            MapKind::Random => {
                let kind = *[MapKind::Hilly, MapKind::Mixed]
                    .choose(rng)
                    .unwrap_or(&MapKind::Hilly);
                return Self::generate(kind, width, height, rng);
            }
        }
        board
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub(crate) fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width + x as usize
    }

    /// Panics if the coordinates are out of bounds
    pub fn terrain(&self, x: i32, y: i32) -> Terrain {
        assert!(self.in_bounds(x, y), "({}, {}) is outside the board", x, y);
        self.tiles[self.index(x, y)]
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Terrain> {
        if self.in_bounds(x, y) {
            Some(self.tiles[self.index(x, y)])
        } else {
            None
        }
    }

    pub fn set_terrain(&mut self, x: i32, y: i32, terrain: Terrain) {
        assert!(self.in_bounds(x, y), "({}, {}) is outside the board", x, y);
        let index = self.index(x, y);
        self.tiles[index] = terrain;
    }

    pub fn tiles(&self) -> impl Iterator<Item = (i32, i32, Terrain)> + '_ {
        self.tiles.iter().enumerate().map(move |(i, terrain)| {
            ((i % self.width) as i32, (i / self.width) as i32, *terrain)
        })
    }

    fn set_if_in_bounds(&mut self, x: i32, y: i32, terrain: Terrain) {
        if self.in_bounds(x, y) {
            self.set_terrain(x, y, terrain);
        }
    }

    // Hill rows along the top and bottom, a mountain diagonal and a central river
    fn add_default_features(&mut self) {
        let (w, h) = (self.width as i32, self.height as i32);
        for x in 0..w {
            self.set_terrain(x, 0, Terrain::Hill);
            self.set_terrain(x, h - 1, Terrain::Hill);
        }
        for i in (3..w.min(h) - 3).step_by(4) {
            self.set_terrain(i, i, Terrain::Mountain);
        }
        for y in 2..h - 2 {
            self.set_terrain(w / 2, y, Terrain::Water);
        }
    }

    fn add_hills<R: Rng>(&mut self, rng: &mut R) {
        let (w, h) = (self.width as i32, self.height as i32);
        for y in h / 2 - 1..=h / 2 + 1 {
            for x in 0..w {
                if rng.gen_bool(0.8) {
                    self.set_if_in_bounds(x, y, Terrain::Hill);
                }
            }
        }
        for _ in 0..(self.width * self.height) / 15 {
            let x = rng.gen_range(0..w);
            let y = rng.gen_range(0..h);
            if self.terrain(x, y) == Terrain::Plain {
                self.set_terrain(x, y, Terrain::Hill);
            }
        }
    }

    fn add_rivers(&mut self) {
        let (w, h) = (self.width as i32, self.height as i32);
        for x in 2..w - 2 {
            self.set_terrain(x, h / 2, Terrain::Water);
        }
        for y in 3..h - 3 {
            self.set_terrain(w / 3, y, Terrain::Water);
        }
    }

    fn add_mountain_diagonal(&mut self) {
        let n = self.width.min(self.height) as i32;
        for i in (0..n).filter(|i| i % 2 == 0) {
            self.set_terrain(i, i, Terrain::Mountain);
        }
    }

    fn add_mixed_features<R: Rng>(&mut self, rng: &mut R) {
        let (w, h) = (self.width as i32, self.height as i32);
        for y in h / 2 - 1..=h / 2 + 1 {
            for x in 0..w {
                if rng.gen_bool(0.7) {
                    self.set_if_in_bounds(x, y, Terrain::Hill);
                }
            }
        }
        let num_lakes = (self.width * self.height / 50).max(1);
        for _ in 0..num_lakes {
            let lake_x = rng.gen_range(0..=(w - 3).max(0));
            let lake_y = rng.gen_range(0..=(h - 3).max(0));
            for dy in 0..3 {
                for dx in 0..3 {
                    if rng.gen_bool(0.8) {
                        self.set_if_in_bounds(lake_x + dx, lake_y + dy, Terrain::Water);
                    }
                }
            }
        }
        let num_mountains = (self.width * self.height / 80).max(1);
        for _ in 0..num_mountains {
            let mount_x = rng.gen_range(0..=(w - 2).max(0));
            let mount_y = rng.gen_range(0..=(h - 2).max(0));
            for dy in 0..2 {
                for dx in 0..2 {
                    if rng.gen_bool(0.7) {
                        self.set_if_in_bounds(mount_x + dx, mount_y + dy, Terrain::Mountain);
                    }
                }
            }
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles.chunks(self.width) {
            for terrain in row {
                write!(f, "{}", terrain.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Terrain layouts the match setup can ask for
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum MapKind {
    Plains,
    Default,
    Hilly,
    Watery,
    Mountainous,
    Mixed,
    /// Either hilly or mixed
    Random,
}

impl FromStr for MapKind {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "plains" => Ok(MapKind::Plains),
            "default" => Ok(MapKind::Default),
            "hilly" => Ok(MapKind::Hilly),
            "watery" => Ok(MapKind::Watery),
            "mountainous" => Ok(MapKind::Mountainous),
            "mixed" => Ok(MapKind::Mixed),
            "random" => Ok(MapKind::Random),
            _ => Err(format!("Unknown map kind \"{}\"", input)),
        }
    }
}
