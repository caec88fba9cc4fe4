//! Region labelling, node detection and wall-face extraction.

use std::collections::{BTreeMap, HashMap, VecDeque};

use openbound_core::{CellCoord, Vec2, WallGrid, GRID_SIZE};

/// Identifier of a 4-connected open-floor region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u32);

impl RegionId {
    /// Creates a new region identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Identifier as a vector index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Dense lookup from cells to the region containing them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionMap {
    columns: u32,
    rows: u32,
    labels: Vec<Option<RegionId>>,
    region_count: u32,
}

impl RegionMap {
    /// Region containing the cell, or `None` for walls and unreachable border cells.
    #[must_use]
    pub fn region(&self, cell: CellCoord) -> Option<RegionId> {
        self.region_at(i64::from(cell.column()), i64::from(cell.row()))
    }

    /// Signed variant of [`RegionMap::region`].
    #[must_use]
    pub fn region_at(&self, column: i64, row: i64) -> Option<RegionId> {
        if column < 0 || row < 0 || column >= i64::from(self.columns) || row >= i64::from(self.rows)
        {
            return None;
        }
        self.labels[row as usize * self.columns as usize + column as usize]
    }

    /// Number of distinct regions.
    #[must_use]
    pub const fn region_count(&self) -> u32 {
        self.region_count
    }

    /// Number of columns covered by the map.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows covered by the map.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    fn label(&mut self, cell: CellCoord, region: RegionId) {
        let index = cell.row() as usize * self.columns as usize + cell.column() as usize;
        self.labels[index] = Some(region);
    }
}

/// Diagonal quadrant relative to a cell. Rows grow southwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Up and to the left.
    NorthWest,
    /// Up and to the right.
    NorthEast,
    /// Down and to the right.
    SouthEast,
    /// Down and to the left.
    SouthWest,
}

impl Quadrant {
    /// Quadrant a non-axis-aligned heading points into.
    ///
    /// Returns `None` when either component is zero.
    #[must_use]
    pub fn of(dx: i64, dy: i64) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (-1, -1) => Some(Self::NorthWest),
            (1, -1) => Some(Self::NorthEast),
            (1, 1) => Some(Self::SouthEast),
            (-1, 1) => Some(Self::SouthWest),
            _ => None,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::NorthWest => CornerMask::NORTH_WEST,
            Self::NorthEast => CornerMask::NORTH_EAST,
            Self::SouthEast => CornerMask::SOUTH_EAST,
            Self::SouthWest => CornerMask::SOUTH_WEST,
        }
    }
}

/// Bit set recording which diagonal neighbours of a node are walls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CornerMask(u8);

impl CornerMask {
    /// Wall up and to the left.
    pub const NORTH_WEST: u8 = 1;
    /// Wall up and to the right.
    pub const NORTH_EAST: u8 = 2;
    /// Wall down and to the right.
    pub const SOUTH_EAST: u8 = 4;
    /// Wall down and to the left.
    pub const SOUTH_WEST: u8 = 8;

    /// Reads the diagonal neighbours of `cell` from the grid.
    #[must_use]
    pub fn from_grid(grid: &WallGrid, cell: CellCoord) -> Self {
        let (x, y) = (i64::from(cell.column()), i64::from(cell.row()));
        let mut bits = 0;
        for (dx, dy, bit) in [
            (-1, -1, Self::NORTH_WEST),
            (1, -1, Self::NORTH_EAST),
            (1, 1, Self::SOUTH_EAST),
            (-1, 1, Self::SOUTH_WEST),
        ] {
            if grid.is_wall_at(x + dx, y + dy) {
                bits |= bit;
            }
        }
        Self(bits)
    }

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the wall in `quadrant` is present.
    #[must_use]
    pub const fn blocks(self, quadrant: Quadrant) -> bool {
        self.0 & quadrant.bit() != 0
    }
}

/// Side of an open cell that faces a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WallSide {
    /// Wall above the cell.
    North,
    /// Wall right of the cell.
    East,
    /// Wall below the cell.
    South,
    /// Wall left of the cell.
    West,
}

impl WallSide {
    /// Whether the face runs along the x axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::North | Self::South)
    }
}

/// Maximal straight wall face bordering open floor, in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionSegment {
    /// End with the smaller coordinate.
    pub start: Vec2,
    /// End with the larger coordinate.
    pub end: Vec2,
    /// Side of the open cells the face lies on.
    pub side: WallSide,
}

/// Raw per-region output of the compiler.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionLayout {
    /// Cells hosting convex-corner nodes, in discovery order.
    pub nodes: Vec<CellCoord>,
    /// Diagonal wall masks, parallel to `nodes`.
    pub corner_masks: Vec<CornerMask>,
    /// Merged wall faces bordering the region.
    pub collision_segments: Vec<CollisionSegment>,
}

/// Result of labelling a grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionCompilation {
    /// Region label of every cell.
    pub region_map: RegionMap,
    /// Per-region layouts indexed by [`RegionId::index`].
    pub layouts: Vec<RegionLayout>,
}

/// Partitions the interior of `grid` into 4-connected regions and extracts
/// their nodes and wall faces.
///
/// Only cells one step inside the border seed regions, so a sanitized grid is
/// expected.
#[must_use]
pub fn compile_regions(grid: &WallGrid) -> RegionCompilation {
    let mut region_map = RegionMap {
        columns: grid.columns(),
        rows: grid.rows(),
        labels: vec![None; grid.columns() as usize * grid.rows() as usize],
        region_count: 0,
    };
    let mut layouts = Vec::new();

    for column in 1..grid.columns().saturating_sub(1) {
        for row in 1..grid.rows().saturating_sub(1) {
            let seed = CellCoord::new(column, row);
            if grid.is_wall(seed) || region_map.region(seed).is_some() {
                continue;
            }
            let region = RegionId::new(region_map.region_count);
            region_map.region_count += 1;
            let cells = flood_fill(grid, &mut region_map, seed, region);
            layouts.push(layout_for(grid, &cells));
        }
    }

    RegionCompilation {
        region_map,
        layouts,
    }
}

fn flood_fill(
    grid: &WallGrid,
    region_map: &mut RegionMap,
    seed: CellCoord,
    region: RegionId,
) -> Vec<CellCoord> {
    let mut cells = Vec::new();
    let mut queue = VecDeque::from([seed]);
    region_map.label(seed, region);

    while let Some(cell) = queue.pop_front() {
        cells.push(cell);
        let (x, y) = (i64::from(cell.column()), i64::from(cell.row()));
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            if grid.is_wall_at(nx, ny) || region_map.region_at(nx, ny).is_some() {
                continue;
            }
            let neighbour = CellCoord::new(nx as u32, ny as u32);
            region_map.label(neighbour, region);
            queue.push_back(neighbour);
        }
    }

    cells.sort();
    cells
}

fn layout_for(grid: &WallGrid, cells: &[CellCoord]) -> RegionLayout {
    let mut layout = RegionLayout::default();
    let mut faces = Vec::new();

    for &cell in cells {
        let (x, y) = (i64::from(cell.column()), i64::from(cell.row()));
        let open = |dx: i64, dy: i64| !grid.is_wall_at(x + dx, y + dy);
        let (n, w, e, s) = (open(0, -1), open(-1, 0), open(1, 0), open(0, 1));

        if is_convex_corner(open) {
            layout.nodes.push(cell);
            layout.corner_masks.push(CornerMask::from_grid(grid, cell));
        }

        if !n {
            faces.push(RawFace::new((x, y), (x + 1, y), WallSide::North));
        }
        if !w {
            faces.push(RawFace::new((x, y + 1), (x, y), WallSide::West));
        }
        if !e {
            faces.push(RawFace::new((x + 1, y), (x + 1, y + 1), WallSide::East));
        }
        if !s {
            faces.push(RawFace::new((x + 1, y + 1), (x, y + 1), WallSide::South));
        }
    }

    layout.collision_segments = merge_faces(&faces);
    layout
}

/// A cell is a node when some diagonal neighbour is wall while both of the
/// orthogonal neighbours flanking it are open.
fn is_convex_corner(open: impl Fn(i64, i64) -> bool) -> bool {
    [(-1, -1), (1, -1), (-1, 1), (1, 1)]
        .into_iter()
        .any(|(dx, dy)| !open(dx, dy) && open(dx, 0) && open(0, dy))
}

#[derive(Clone, Copy, Debug)]
struct RawFace {
    a: (i64, i64),
    b: (i64, i64),
    side: WallSide,
}

impl RawFace {
    const fn new(a: (i64, i64), b: (i64, i64), side: WallSide) -> Self {
        Self { a, b, side }
    }
}

/// Collapses unit faces that touch end to end and face the same side.
fn merge_faces(faces: &[RawFace]) -> Vec<CollisionSegment> {
    let mut sets = DisjointSet::new(faces.len());
    let mut first_at: HashMap<(WallSide, (i64, i64)), usize> = HashMap::new();
    for (index, face) in faces.iter().enumerate() {
        for endpoint in [face.a, face.b] {
            match first_at.get(&(face.side, endpoint)) {
                Some(&other) => sets.union(index, other),
                None => {
                    let _ = first_at.insert((face.side, endpoint), index);
                }
            }
        }
    }

    let mut clusters: BTreeMap<usize, (WallSide, (i64, i64), (i64, i64))> = BTreeMap::new();
    for (index, face) in faces.iter().enumerate() {
        let root = sets.find(index);
        let low = (face.a.0.min(face.b.0), face.a.1.min(face.b.1));
        let high = (face.a.0.max(face.b.0), face.a.1.max(face.b.1));
        let _ = clusters
            .entry(root)
            .and_modify(|(_, min, max)| {
                *min = (min.0.min(low.0), min.1.min(low.1));
                *max = (max.0.max(high.0), max.1.max(high.1));
            })
            .or_insert((face.side, low, high));
    }

    clusters
        .into_values()
        .map(|(side, min, max)| CollisionSegment {
            start: Vec2::new(min.0 as f32, min.1 as f32) * GRID_SIZE,
            end: Vec2::new(max.0 as f32, max.1 as f32) * GRID_SIZE,
            side,
        })
        .collect()
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parent[index] != index {
            self.parent[index] = self.parent[self.parent[index]];
            index = self.parent[index];
        }
        index
    }

    fn union(&mut self, a: usize, b: usize) {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a != root_b {
            self.parent[root_a.max(root_b)] = root_a.min(root_b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_rooms_receive_distinct_regions() {
        let grid = WallGrid::from_ascii(
            "
            #######
            #..#..#
            #..#..#
            #######
            ",
        );
        let compilation = compile_regions(&grid);
        assert_eq!(compilation.region_map.region_count(), 2);
        let left = compilation.region_map.region(CellCoord::new(1, 1));
        let right = compilation.region_map.region(CellCoord::new(4, 2));
        assert!(left.is_some());
        assert!(right.is_some());
        assert_ne!(left, right);
        assert_eq!(compilation.region_map.region(CellCoord::new(3, 1)), None);
    }

    #[test]
    fn rectangular_room_has_no_nodes_and_four_faces() {
        let grid = WallGrid::from_ascii(
            "
            ######
            #....#
            #....#
            ######
            ",
        );
        let compilation = compile_regions(&grid);
        let layout = &compilation.layouts[0];
        assert!(layout.nodes.is_empty());
        assert_eq!(layout.collision_segments.len(), 4);
        let north = layout
            .collision_segments
            .iter()
            .find(|segment| segment.side == WallSide::North)
            .expect("north face");
        assert_eq!(north.start, Vec2::new(16.0, 16.0));
        assert_eq!(north.end, Vec2::new(80.0, 16.0));
    }

    #[test]
    fn pillar_corners_become_nodes_with_masks() {
        let grid = WallGrid::from_ascii(
            "
            #######
            #.....#
            #.....#
            #..#..#
            #.....#
            #.....#
            #######
            ",
        );
        let compilation = compile_regions(&grid);
        let layout = &compilation.layouts[0];
        let mut nodes = layout.nodes.clone();
        nodes.sort();
        assert_eq!(
            nodes,
            vec![
                CellCoord::new(2, 2),
                CellCoord::new(2, 4),
                CellCoord::new(4, 2),
                CellCoord::new(4, 4),
            ]
        );
        let index = layout
            .nodes
            .iter()
            .position(|cell| *cell == CellCoord::new(2, 2))
            .expect("node present");
        assert_eq!(layout.corner_masks[index].bits(), CornerMask::SOUTH_EAST);
        assert!(layout.corner_masks[index].blocks(Quadrant::SouthEast));
        assert!(!layout.corner_masks[index].blocks(Quadrant::NorthWest));
    }

    #[test]
    fn faces_merge_only_with_matching_sides() {
        let grid = WallGrid::from_ascii(
            "
            #######
            #.....#
            #.....#
            #..#..#
            #.....#
            #.....#
            #######
            ",
        );
        let compilation = compile_regions(&grid);
        let segments = &compilation.layouts[0].collision_segments;
        // Four outer walls plus the four faces of the pillar.
        assert_eq!(segments.len(), 8);
        assert!(segments.iter().any(|segment| segment.side == WallSide::South
            && segment.start == Vec2::new(48.0, 48.0)
            && segment.end == Vec2::new(64.0, 48.0)));
    }

    #[test]
    fn quadrant_ignores_axis_aligned_headings() {
        assert_eq!(Quadrant::of(3, 0), None);
        assert_eq!(Quadrant::of(0, -2), None);
        assert_eq!(Quadrant::of(2, 5), Some(Quadrant::SouthEast));
        assert_eq!(Quadrant::of(-1, -1), Some(Quadrant::NorthWest));
    }
}
