//! StreetWorld - a procedural panorama graph for simulation.
//!
//! The globe is split into square cells. A seeded fraction of cells are
//! "covered": inside them panoramas sit on a street grid (a panorama every
//! `spacing_m`, a street every `block` panoramas). Everything else is ocean.
//!
//! ```text
//!   col:  0   1   2   3   4   5
//! row 5   ●───●───●───●───●───●     ● open panorama
//!         │                   │     ○ closed (no imagery)
//! row 4   ●                   ●
//!         │                   │     N-S links on avenues (col % block == 0)
//! row 1   ○                   ●     E-W links on streets (row % block == 0)
//!                             │
//! row 0   ●───●───○   ●───●───●
//! ```
//!
//! Nothing is stored: node existence, ids and link headings are pure
//! functions of the seed and the node's grid position, so any region can be
//! regenerated identically.

use geo::{HaversineDistance, Point};
use panonav_env::{normalize_heading, Coordinate, PanoId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use uuid::Uuid;

const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Lower bound applied to `spacing_m`.
const MIN_SPACING_M: f64 = 1.0;

const SALT_CELL: u64 = 0x63656c6c;
const SALT_NODE: u64 = 0x6e6f6465;
const SALT_EDGE: u64 = 0x65646765;
const SALT_ID: u64 = 0x70616e6f;
const SALT_ORDER: u64 = 0x6f726472;

/// Configuration for a generated world.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Master seed
    pub seed: u64,

    /// Cell edge length in degrees
    pub cell_size_deg: f64,

    /// Fraction of cells with street imagery (0.0 - 1.0)
    pub coverage: f64,

    /// Cells beyond this absolute latitude are never covered
    pub max_abs_lat: f64,

    /// Distance between neighbouring panoramas in metres
    pub spacing_m: f64,

    /// Panoramas per block edge
    pub block: i32,

    /// Fraction of street positions without a panorama (0.0 - 1.0)
    pub closed_rate: f64,

    /// Standard deviation of link heading noise in degrees
    pub heading_noise_deg: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            cell_size_deg: 1.0,
            coverage: 0.3,
            max_abs_lat: 70.0,
            spacing_m: 20.0,
            block: 5,
            closed_rate: 0.1,
            heading_noise_deg: 1.5,
        }
    }
}

impl WorldConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.coverage = coverage.clamp(0.0, 1.0);
        self
    }

    pub fn with_closed_rate(mut self, closed_rate: f64) -> Self {
        self.closed_rate = closed_rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_heading_noise(mut self, sigma_deg: f64) -> Self {
        self.heading_noise_deg = sigma_deg.max(0.0);
        self
    }
}

/// Grid position of a panorama.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub cell_lat: i32,
    pub cell_lng: i32,
    pub row: i32,
    pub col: i32,
}

impl NodeKey {
    fn parts(&self) -> [i32; 4] {
        [self.cell_lat, self.cell_lng, self.row, self.col]
    }

    fn offset(&self, d_row: i32, d_col: i32) -> Self {
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
            ..*self
        }
    }
}

/// A link between two panoramas, label included.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldLink {
    pub to: NodeKey,
    pub heading: f64,
    pub label: String,
}

/// Lattice geometry of one cell.
#[derive(Debug, Clone, Copy)]
struct CellGrid {
    south: f64,
    west: f64,
    dlat: f64,
    dlng: f64,
    rows: i32,
    cols: i32,
}

/// The procedural world.
#[derive(Debug, Clone)]
pub struct StreetWorld {
    config: WorldConfig,
}

impl StreetWorld {
    pub fn new(config: WorldConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Nearest open panorama within `radius_m` of `center`, if any.
    ///
    /// Only the cell containing `center` is searched.
    pub fn nearest(&self, center: Coordinate, radius_m: f64) -> Option<(NodeKey, Coordinate)> {
        if !center.is_valid() || !(radius_m >= 0.0) {
            return None;
        }

        let size = self.config.cell_size_deg;
        let cell_lat = (center.lat / size).floor() as i32;
        let cell_lng = (center.lng / size).floor() as i32;
        if !self.is_covered(cell_lat, cell_lng) {
            return None;
        }

        let grid = self.grid(cell_lat, cell_lng);
        let row0 = ((center.lat - grid.south) / grid.dlat - 0.5).round() as i32;
        let col0 = ((center.lng - grid.west) / grid.dlng - 0.5).round() as i32;
        let reach = ((radius_m / self.spacing_m()).ceil() as i32)
            .saturating_add(1)
            .min(64);

        let origin = Point::new(center.lng, center.lat);
        let mut best: Option<(f64, NodeKey, Coordinate)> = None;

        for row in (row0 - reach)..=(row0 + reach) {
            for col in (col0 - reach)..=(col0 + reach) {
                let key = NodeKey { cell_lat, cell_lng, row, col };
                if !self.is_open(&key) {
                    continue;
                }
                let coordinate = self.coordinate_in(&grid, &key);
                let distance = origin.haversine_distance(&Point::new(coordinate.lng, coordinate.lat));
                if distance <= radius_m && best.map_or(true, |(d, _, _)| distance < d) {
                    best = Some((distance, key, coordinate));
                }
            }
        }

        best.map(|(_, key, coordinate)| (key, coordinate))
    }

    /// Position of a panorama.
    pub fn coordinate(&self, key: &NodeKey) -> Coordinate {
        let grid = self.grid(key.cell_lat, key.cell_lng);
        self.coordinate_in(&grid, key)
    }

    /// Opaque, seed-stable identifier of a panorama.
    pub fn pano_id(&self, key: &NodeKey) -> PanoId {
        let hi = mix(self.config.seed, SALT_ID, &key.parts());
        let lo = splitmix(hi);
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&hi.to_le_bytes());
        bytes[8..16].copy_from_slice(&lo.to_le_bytes());
        PanoId::new(Uuid::from_bytes(bytes).simple().to_string())
    }

    /// Returns true if a panorama exists at `key`.
    pub fn is_open(&self, key: &NodeKey) -> bool {
        let block = self.config.block.max(1);
        let on_street = key.row.rem_euclid(block) == 0 || key.col.rem_euclid(block) == 0;
        if !on_street {
            return false;
        }

        let grid = self.grid(key.cell_lat, key.cell_lng);
        if key.row < 0 || key.col < 0 || key.row >= grid.rows || key.col >= grid.cols {
            return false;
        }
        if !self.is_covered(key.cell_lat, key.cell_lng) {
            return false;
        }

        unit(mix(self.config.seed, SALT_NODE, &key.parts())) >= self.config.closed_rate
    }

    /// Links out of an open panorama, in provider order (not sorted).
    pub fn links(&self, key: &NodeKey) -> Vec<WorldLink> {
        if !self.is_open(key) {
            return Vec::new();
        }

        let block = self.config.block.max(1);
        let mut candidates: Vec<(i32, i32, f64, String)> = Vec::with_capacity(4);

        if key.col.rem_euclid(block) == 0 {
            let avenue = format!("Avenue {}", key.col / block + 1);
            candidates.push((1, 0, 0.0, avenue.clone()));
            candidates.push((-1, 0, 180.0, avenue));
        }
        if key.row.rem_euclid(block) == 0 {
            let street = format!("{} St", key.row / block + 1);
            candidates.push((0, 1, 90.0, street.clone()));
            candidates.push((0, -1, 270.0, street));
        }

        let mut links: Vec<WorldLink> = candidates
            .into_iter()
            .filter_map(|(d_row, d_col, bearing, label)| {
                let to = key.offset(d_row, d_col);
                if !self.is_open(&to) {
                    return None;
                }
                Some(WorldLink {
                    to,
                    heading: normalize_heading(bearing + self.edge_noise(key, &to)),
                    label,
                })
            })
            .collect();

        if !links.is_empty() {
            let shift = mix(self.config.seed, SALT_ORDER, &key.parts()) as usize % links.len();
            links.rotate_left(shift);
        }
        links
    }

    fn is_covered(&self, cell_lat: i32, cell_lng: i32) -> bool {
        let size = self.config.cell_size_deg;
        let mid_lat = (cell_lat as f64 + 0.5) * size;
        if mid_lat.abs() > self.config.max_abs_lat {
            return false;
        }
        unit(mix(self.config.seed, SALT_CELL, &[cell_lat, cell_lng])) < self.config.coverage
    }

    fn grid(&self, cell_lat: i32, cell_lng: i32) -> CellGrid {
        let size = self.config.cell_size_deg;
        let south = cell_lat as f64 * size;
        let mid_lat = south + size / 2.0;
        let spacing = self.spacing_m();
        let dlat = spacing / METERS_PER_DEG_LAT;
        let dlng = spacing / (METERS_PER_DEG_LAT * mid_lat.to_radians().cos().max(0.05));

        CellGrid {
            south,
            west: cell_lng as f64 * size,
            dlat,
            dlng,
            rows: (size / dlat).floor() as i32,
            cols: (size / dlng).floor() as i32,
        }
    }

    fn spacing_m(&self) -> f64 {
        self.config.spacing_m.max(MIN_SPACING_M)
    }

    fn coordinate_in(&self, grid: &CellGrid, key: &NodeKey) -> Coordinate {
        Coordinate::new(
            grid.south + (key.row as f64 + 0.5) * grid.dlat,
            grid.west + (key.col as f64 + 0.5) * grid.dlng,
        )
    }

    /// Heading noise shared by both directions of an edge.
    fn edge_noise(&self, a: &NodeKey, b: &NodeKey) -> f64 {
        let sigma = self.config.heading_noise_deg;
        if sigma <= 0.0 {
            return 0.0;
        }
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mut parts = lo.parts().to_vec();
        parts.extend_from_slice(&hi.parts()[2..]);

        let mut rng = ChaCha8Rng::seed_from_u64(mix(self.config.seed, SALT_EDGE, &parts));
        match Normal::new(0.0, sigma) {
            Ok(normal) => normal.sample(&mut rng),
            Err(_) => 0.0,
        }
    }
}

fn splitmix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

fn mix(seed: u64, salt: u64, parts: &[i32]) -> u64 {
    parts
        .iter()
        .fold(splitmix(seed ^ salt), |h, p| splitmix(h ^ (*p as u32 as u64)))
}

/// Maps a hash onto `[0, 1)`.
fn unit(h: u64) -> f64 {
    (h >> 11) as f64 / (1u64 << 53) as f64
}
