#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the overworld engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Grid data, pixel geometry and build errors
//! live here so every layer speaks the same vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Edge length of a single map tile on screen, measured in pixels.
pub const TILE_SIZE: i32 = 32;

/// Largest column or row count whose pixel extent still fits in an `i32`.
pub const MAX_GRID_EXTENT: u32 = (i32::MAX / TILE_SIZE) as u32;

/// Edge length of a single cell inside a source sprite sheet, measured in pixels.
pub const SOURCE_TILE_SIZE: u32 = 16;

/// Index of the house-sheet image used to materialise limit and trigger tiles.
pub const BLOCKER_IMAGE_INDEX: usize = 5;

/// Default trigger table binding each level to the limit-grid code that enters it.
pub const DEFAULT_LEVEL_TRIGGERS: [LevelTrigger; 6] = [
    LevelTrigger::new(LevelId::new(1), CellCode::new(104)),
    LevelTrigger::new(LevelId::new(2), CellCode::new(105)),
    LevelTrigger::new(LevelId::new(3), CellCode::new(106)),
    LevelTrigger::new(LevelId::new(4), CellCode::new(146)),
    LevelTrigger::new(LevelId::new(5), CellCode::new(542)),
    LevelTrigger::new(LevelId::new(6), CellCode::new(558)),
];

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Moves the player by the provided velocity, resolving collisions per axis.
    MovePlayer {
        /// Requested displacement for this frame in pixels.
        velocity: Velocity,
    },
    /// Flips the world's paused flag.
    TogglePause,
    /// Swaps the player's image set for the one registered under `avatar`.
    SetAvatar {
        /// Display identity the player should adopt.
        avatar: AvatarId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the paused flag changed.
    PauseToggled {
        /// Paused flag after the toggle.
        paused: bool,
    },
    /// Confirms that the player changed position during a move.
    PlayerMoved {
        /// Position before the move.
        from: PixelPoint,
        /// Position after collision resolution.
        to: PixelPoint,
    },
    /// Reports that a blocking tile cancelled movement along one axis.
    PlayerBlocked {
        /// Axis on which the tentative displacement was cancelled.
        axis: Axis,
        /// Position the player was held at.
        at: PixelPoint,
    },
    /// Reports that the player stepped onto a level-transition zone.
    LevelEntered {
        /// Level whose trigger layer the player entered.
        level: LevelId,
        /// Grid cell of the first trigger tile overlapped by the player.
        cell: CellCoord,
    },
    /// Confirms that the player adopted a new display identity.
    AvatarChanged {
        /// Identity now used for the player's image set.
        avatar: AvatarId,
    },
    /// Reports that an identity change referenced an unregistered image set.
    AvatarRejected {
        /// Identity that could not be applied.
        avatar: AvatarId,
    },
}

/// Horizontal or vertical axis of motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Motion along the x axis.
    Horizontal,
    /// Motion along the y axis.
    Vertical,
}

/// Integer value stored in a grid cell.
///
/// Tile layers interpret the code as an index into their sprite sheet, the
/// limit grid uses it to mark blocking tiles and level triggers, and the
/// player-start grid marks the spawn cell with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCode(i32);

impl CellCode {
    /// Marks a cell of a tile layer that holds no tile.
    pub const EMPTY: Self = Self(-1);

    /// Marks a movement-blocking cell of the limit grid.
    pub const BLOCKING: Self = Self(-1);

    /// Marks the player's start cell in the player-start grid.
    pub const SPAWN: Self = Self(1);

    /// Wraps a raw cell code.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Retrieves the raw value of the code.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Reports whether the code marks an empty tile-layer cell.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == Self::EMPTY.0
    }

    /// Interprets the code as a sprite-sheet index, if it is non-negative.
    #[must_use]
    pub fn image_index(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for CellCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Top-left pixel of the tile drawn for this cell.
    #[must_use]
    pub const fn to_pixel(&self) -> PixelPoint {
        PixelPoint::new(pixel_extent(self.column), pixel_extent(self.row))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Number of rows and columns shared by every grid of one world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDimensions {
    columns: u32,
    rows: u32,
}

impl GridDimensions {
    /// Creates a new dimensions descriptor.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns in each row.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total map width in pixels.
    #[must_use]
    pub const fn pixel_width(&self) -> i32 {
        pixel_extent(self.columns)
    }

    /// Total map height in pixels.
    #[must_use]
    pub const fn pixel_height(&self) -> i32 {
        pixel_extent(self.rows)
    }
}

/// Pixel length of `cells` tiles, saturating at `i32::MAX`.
const fn pixel_extent(cells: u32) -> i32 {
    if cells > MAX_GRID_EXTENT {
        i32::MAX
    } else {
        cells as i32 * TILE_SIZE
    }
}

impl fmt::Display for GridDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

/// Rectangular, row-major grid of cell codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    dimensions: GridDimensions,
    cells: Vec<CellCode>,
}

impl Grid {
    /// Assembles a grid from rows, rejecting rows of unequal length.
    pub fn from_rows(rows: Vec<Vec<CellCode>>) -> Result<Self, GridError> {
        let columns = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(columns * rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(GridError::Ragged {
                    row: index,
                    expected: columns,
                    found: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }

        let columns = checked_extent(columns)?;
        let row_count = checked_extent(rows.len())?;
        Ok(Self {
            dimensions: GridDimensions::new(columns, row_count),
            cells,
        })
    }

    /// Creates a grid of the provided size with every cell set to `code`.
    #[must_use]
    pub fn filled(dimensions: GridDimensions, code: CellCode) -> Self {
        let capacity_u64 = u64::from(dimensions.columns()) * u64::from(dimensions.rows());
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            dimensions,
            cells: vec![code; capacity],
        }
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Returns the code stored at `cell`, if it lies inside the grid.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<CellCode> {
        self.index(cell).and_then(|index| self.cells.get(index).copied())
    }

    /// Overwrites the code stored at `cell`; out-of-bounds writes are ignored.
    pub fn set(&mut self, cell: CellCoord, code: CellCode) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = code;
            }
        }
    }

    /// Iterates over every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellCode)> + '_ {
        let columns = self.dimensions.columns().max(1);
        self.cells.iter().enumerate().map(move |(index, code)| {
            let index = index as u32;
            (CellCoord::new(index % columns, index / columns), *code)
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.dimensions.columns() && cell.row() < self.dimensions.rows() {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.dimensions.columns()).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

fn checked_extent(len: usize) -> Result<u32, GridError> {
    u32::try_from(len)
        .ok()
        .filter(|extent| *extent <= MAX_GRID_EXTENT)
        .ok_or(GridError::TooLarge)
}

/// Errors raised while assembling a [`Grid`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// A row's length disagrees with the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Zero-based index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// The grid has more columns or rows than [`MAX_GRID_EXTENT`].
    #[error("grid exceeds the addressable cell range")]
    TooLarge,
}

/// Position measured in screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    /// Horizontal offset from the left edge.
    pub x: i32,
    /// Vertical offset from the top edge.
    pub y: i32,
}

impl PixelPoint {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle measured in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    origin: PixelPoint,
    width: i32,
    height: i32,
}

impl PixelRect {
    /// Creates a rectangle anchored at its top-left corner.
    #[must_use]
    pub const fn new(origin: PixelPoint, width: i32, height: i32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Square rectangle covering one tile anchored at `origin`.
    #[must_use]
    pub const fn tile(origin: PixelPoint) -> Self {
        Self::new(origin, TILE_SIZE, TILE_SIZE)
    }

    /// Top-left corner.
    #[must_use]
    pub const fn origin(&self) -> PixelPoint {
        self.origin
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Reports whether the rectangles share a region of positive area.
    ///
    /// Rectangles that only touch along an edge or a corner do not overlap.
    #[must_use]
    pub const fn overlaps(&self, other: &PixelRect) -> bool {
        self.origin.x < other.origin.x + other.width
            && other.origin.x < self.origin.x + self.width
            && self.origin.y < other.origin.y + other.height
            && other.origin.y < self.origin.y + self.height
    }
}

/// Per-frame displacement of the player, in pixels per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Velocity {
    /// Horizontal component; positive moves right.
    pub x: i32,
    /// Vertical component; positive moves down.
    pub y: i32,
}

impl Velocity {
    /// Velocity that leaves the player in place.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Creates a new velocity.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Reports whether both components are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// Directional input sampled for one frame; any subset may be held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DirectionalInput {
    /// Whether the up direction is held.
    pub up: bool,
    /// Whether the down direction is held.
    pub down: bool,
    /// Whether the left direction is held.
    pub left: bool,
    /// Whether the right direction is held.
    pub right: bool,
}

impl DirectionalInput {
    /// Input with no direction held.
    pub const NONE: Self = Self {
        up: false,
        down: false,
        left: false,
        right: false,
    };

    /// Converts the held directions into a velocity of `speed` pixels per axis.
    ///
    /// Opposing directions cancel out. Diagonals are the plain vector sum and
    /// are not normalised.
    #[must_use]
    pub const fn velocity(&self, speed: i32) -> Velocity {
        let x = (self.right as i32 - self.left as i32) * speed;
        let y = (self.down as i32 - self.up as i32) * speed;
        Velocity::new(x, y)
    }
}

/// Direction the player faces, selecting a row of its image set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing toward the bottom of the screen.
    #[default]
    Down,
    /// Facing toward the left edge.
    Left,
    /// Facing toward the right edge.
    Right,
    /// Facing toward the top of the screen.
    Up,
}

impl Facing {
    /// Row of the avatar sheet that holds this facing's frames.
    #[must_use]
    pub const fn sheet_row(self) -> usize {
        match self {
            Self::Down => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Up => 3,
        }
    }

    /// Derives the facing from a velocity's dominant axis; vertical wins ties.
    ///
    /// Returns `None` for a zero velocity.
    #[must_use]
    pub const fn from_velocity(velocity: Velocity) -> Option<Self> {
        if velocity.is_zero() {
            return None;
        }
        if velocity.x.abs() > velocity.y.abs() {
            if velocity.x > 0 {
                Some(Self::Right)
            } else {
                Some(Self::Left)
            }
        } else if velocity.y > 0 {
            Some(Self::Down)
        } else {
            Some(Self::Up)
        }
    }
}

/// Number of directional rows stored in every avatar sheet.
pub const AVATAR_SHEET_ROWS: usize = 4;

/// Identifier of a level reachable from the overworld.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(u8);

impl LevelId {
    /// Creates a new level identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.0)
    }
}

/// Binding between a level and the limit-grid code marking its entrance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelTrigger {
    level: LevelId,
    code: CellCode,
}

impl LevelTrigger {
    /// Creates a new trigger binding.
    #[must_use]
    pub const fn new(level: LevelId, code: CellCode) -> Self {
        Self { level, code }
    }

    /// Level entered through this trigger.
    #[must_use]
    pub const fn level(&self) -> LevelId {
        self.level
    }

    /// Limit-grid code that marks the trigger's tiles.
    #[must_use]
    pub const fn code(&self) -> CellCode {
        self.code
    }
}

/// Display identity of the player, naming the image set it is drawn with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvatarId(String);

impl AvatarId {
    /// Creates a new avatar identity.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the identity.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AvatarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Externally owned settings that persist across overworld rebuilds.
///
/// The overworld only reads these; menus and other adapters may change them
/// between frames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Identity the player should currently be drawn with.
    pub avatar: AvatarId,
}

impl PlayerSettings {
    /// Creates settings selecting the provided identity.
    #[must_use]
    pub fn new(avatar: AvatarId) -> Self {
        Self { avatar }
    }
}

/// Sprite sheets that back the static tile layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileSheet {
    /// Ground underneath houses.
    Terrain,
    /// Trees and bushes.
    Nature,
    /// Walkable floor.
    Floor,
    /// Houses; also supplies the blocker image.
    House,
    /// Water and water details.
    Water,
}

impl TileSheet {
    /// Every tile sheet in a fixed order.
    pub const ALL: [TileSheet; 5] = [
        TileSheet::Terrain,
        TileSheet::Nature,
        TileSheet::Floor,
        TileSheet::House,
        TileSheet::Water,
    ];
}

/// Identifies the layer a build failure originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerName {
    /// Terrain layer.
    Terrain,
    /// Nature layer.
    Nature,
    /// Floor layer.
    Floor,
    /// House layer.
    House,
    /// Water layer.
    Water,
    /// Water details layer.
    WaterDetail,
    /// Movement-limit layer.
    Limit,
    /// Trigger layer for one level.
    Trigger(LevelId),
    /// Player-start layer.
    PlayerStart,
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terrain => f.write_str("terrain"),
            Self::Nature => f.write_str("nature"),
            Self::Floor => f.write_str("floor"),
            Self::House => f.write_str("house"),
            Self::Water => f.write_str("water"),
            Self::WaterDetail => f.write_str("water details"),
            Self::Limit => f.write_str("limit"),
            Self::Trigger(level) => write!(f, "{level} trigger"),
            Self::PlayerStart => f.write_str("player start"),
        }
    }
}

/// Fatal failures that prevent a world from being built.
///
/// A build either produces a complete world or one of these errors; partial
/// worlds are never exposed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A grid file or sprite sheet was missing, corrupt or malformed.
    #[error("failed to load {asset}: {reason}")]
    AssetLoad {
        /// Human readable name of the asset.
        asset: String,
        /// Description of the failure.
        reason: String,
    },
    /// A cell code referenced an image the layer's sheet does not contain.
    #[error("{layer} cell {cell} selects image {code} but the sheet holds {sheet_len} images")]
    SheetIndexOutOfRange {
        /// Layer that referenced the image.
        layer: LayerName,
        /// Cell holding the offending code.
        cell: CellCoord,
        /// Offending code.
        code: CellCode,
        /// Number of images in the sheet.
        sheet_len: usize,
    },
    /// The player-start grid has no spawn cell.
    #[error("player start grid has no cell marked {}", CellCode::SPAWN)]
    MissingSpawn,
    /// A layer's grid disagrees with the canonical grid shape.
    #[error("{layer} grid is {found}, expected {expected}")]
    DimensionMismatch {
        /// Layer whose grid is misshapen.
        layer: LayerName,
        /// Canonical dimensions.
        expected: GridDimensions,
        /// Dimensions of the offending grid.
        found: GridDimensions,
    },
}
