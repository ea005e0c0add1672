//! Conversion of raw grids into positioned, drawable and collidable tiles.

use std::collections::BTreeMap;

use overworld_core::{
    BuildError, CellCode, CellCoord, Grid, GridDimensions, LayerName, LevelTrigger, PixelPoint,
    PixelRect, TileSheet, BLOCKER_IMAGE_INDEX,
};

/// Single static map tile: a position plus one image selected from a sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSprite {
    cell: CellCoord,
    position: PixelPoint,
    sheet: TileSheet,
    image: usize,
}

impl TileSprite {
    fn new(cell: CellCoord, sheet: TileSheet, image: usize) -> Self {
        Self {
            cell,
            position: cell.to_pixel(),
            sheet,
            image,
        }
    }

    /// Grid cell the tile was built from.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Top-left pixel of the tile.
    #[must_use]
    pub const fn position(&self) -> PixelPoint {
        self.position
    }

    /// Sheet the tile's image is taken from.
    #[must_use]
    pub const fn sheet(&self) -> TileSheet {
        self.sheet
    }

    /// Index of the tile's image within its sheet.
    #[must_use]
    pub const fn image(&self) -> usize {
        self.image
    }

    /// Collision rectangle covered by the tile.
    #[must_use]
    pub const fn rect(&self) -> PixelRect {
        PixelRect::tile(self.position)
    }
}

/// Kind of layer along with the rule that decides which cells produce tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Ground tiles drawn from the terrain sheet.
    Terrain,
    /// Trees and bushes drawn from the nature sheet.
    Nature,
    /// Walkable floor drawn from the floor sheet.
    Floor,
    /// Houses drawn from the house sheet.
    House,
    /// Water drawn from the water sheet.
    Water,
    /// Boats and other water decorations, drawn from the water sheet.
    WaterDetail,
    /// Blocking tiles taken from limit-grid cells holding [`CellCode::BLOCKING`].
    Limit,
    /// Entrance tiles taken from limit-grid cells holding the trigger's code.
    Trigger(LevelTrigger),
    /// Spawn point taken from the first player-start cell holding [`CellCode::SPAWN`].
    PlayerSpawn,
}

impl LayerKind {
    /// Layers drawn from a sheet indexed by their own grid's codes.
    pub const TILE_LAYERS: [LayerKind; 6] = [
        LayerKind::Terrain,
        LayerKind::Nature,
        LayerKind::Floor,
        LayerKind::House,
        LayerKind::Water,
        LayerKind::WaterDetail,
    ];

    /// Name used when reporting build failures.
    #[must_use]
    pub const fn name(&self) -> LayerName {
        match self {
            Self::Terrain => LayerName::Terrain,
            Self::Nature => LayerName::Nature,
            Self::Floor => LayerName::Floor,
            Self::House => LayerName::House,
            Self::Water => LayerName::Water,
            Self::WaterDetail => LayerName::WaterDetail,
            Self::Limit => LayerName::Limit,
            Self::Trigger(trigger) => LayerName::Trigger(trigger.level()),
            Self::PlayerSpawn => LayerName::PlayerStart,
        }
    }
}

/// Named collection of tiles built from one grid and one sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    kind: LayerKind,
    sprites: Vec<TileSprite>,
}

impl Layer {
    /// Kind the layer was built as.
    #[must_use]
    pub const fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Tiles in row-major build order.
    #[must_use]
    pub fn sprites(&self) -> &[TileSprite] {
        &self.sprites
    }

    /// Number of tiles in the layer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// Reports whether the layer holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// First tile, in build order, whose rectangle overlaps `rect`.
    #[must_use]
    pub fn first_overlap(&self, rect: &PixelRect) -> Option<&TileSprite> {
        self.sprites
            .iter()
            .find(|sprite| sprite.rect().overlaps(rect))
    }

    /// Reports whether any tile overlaps `rect`.
    #[must_use]
    pub fn overlaps(&self, rect: &PixelRect) -> bool {
        self.first_overlap(rect).is_some()
    }
}

/// Grids for every logical layer of one world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerGrids {
    /// Terrain codes.
    pub terrain: Grid,
    /// Nature codes.
    pub nature: Grid,
    /// Floor codes.
    pub floor: Grid,
    /// House codes; this grid defines the canonical shape.
    pub house: Grid,
    /// Water codes.
    pub water: Grid,
    /// Water detail codes.
    pub water_details: Grid,
    /// Limit and trigger codes.
    pub limits: Grid,
    /// Player start marker codes.
    pub player_start: Grid,
}

impl LayerGrids {
    /// Shape every other grid must share.
    #[must_use]
    pub const fn canonical_dimensions(&self) -> GridDimensions {
        self.house.dimensions()
    }

    fn for_kind(&self, kind: LayerKind) -> &Grid {
        match kind {
            LayerKind::Terrain => &self.terrain,
            LayerKind::Nature => &self.nature,
            LayerKind::Floor => &self.floor,
            LayerKind::House => &self.house,
            LayerKind::Water => &self.water,
            LayerKind::WaterDetail => &self.water_details,
            LayerKind::Limit | LayerKind::Trigger(_) => &self.limits,
            LayerKind::PlayerSpawn => &self.player_start,
        }
    }
}

/// Number of images available in each loaded tile sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetCatalog {
    lengths: BTreeMap<TileSheet, usize>,
}

impl SheetCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the catalog with `sheet` registered as holding `images` images.
    #[must_use]
    pub fn with_sheet(mut self, sheet: TileSheet, images: usize) -> Self {
        self.insert(sheet, images);
        self
    }

    /// Registers `sheet` as holding `images` images.
    pub fn insert(&mut self, sheet: TileSheet, images: usize) {
        let _ = self.lengths.insert(sheet, images);
    }

    /// Number of images in `sheet`, if it was loaded.
    #[must_use]
    pub fn len(&self, sheet: TileSheet) -> Option<usize> {
        self.lengths.get(&sheet).copied()
    }

    fn require(&self, sheet: TileSheet, layer: LayerName) -> Result<usize, BuildError> {
        self.len(sheet).ok_or_else(|| BuildError::AssetLoad {
            asset: format!("{sheet:?} sheet"),
            reason: format!("sheet required by the {layer} layer was not loaded"),
        })
    }
}

/// Result of building one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuiltLayer {
    /// Collection of tiles for a tile, limit or trigger layer.
    Tiles(Layer),
    /// Spawn cell for the player layer; `None` when the grid has no spawn marker.
    Spawn(Option<CellCoord>),
}

/// Builds the layer of the provided kind from its grid and sheet.
///
/// Cells are visited in row-major order over the canonical (house) grid
/// shape, so results are reproducible and the spawn's first-match rule is
/// well defined. A layer grid whose shape differs from the canonical one is
/// rejected rather than truncated.
pub fn build_layer(
    kind: LayerKind,
    grids: &LayerGrids,
    sheets: &SheetCatalog,
) -> Result<BuiltLayer, BuildError> {
    let grid = checked_grid(kind, grids)?;
    if kind == LayerKind::PlayerSpawn {
        return Ok(BuiltLayer::Spawn(
            grid.iter()
                .find(|(_, code)| *code == CellCode::SPAWN)
                .map(|(cell, _)| cell),
        ));
    }
    tile_layer(kind, grids, sheets).map(BuiltLayer::Tiles)
}

/// Builds the tiles of one layer; the player layer holds none.
pub(crate) fn tile_layer(
    kind: LayerKind,
    grids: &LayerGrids,
    sheets: &SheetCatalog,
) -> Result<Layer, BuildError> {
    let grid = checked_grid(kind, grids)?;
    match kind {
        LayerKind::Terrain => image_layer(kind, grid, TileSheet::Terrain, sheets),
        LayerKind::Nature => image_layer(kind, grid, TileSheet::Nature, sheets),
        LayerKind::Floor => image_layer(kind, grid, TileSheet::Floor, sheets),
        LayerKind::House => image_layer(kind, grid, TileSheet::House, sheets),
        LayerKind::Water | LayerKind::WaterDetail => {
            image_layer(kind, grid, TileSheet::Water, sheets)
        }
        LayerKind::Limit => marker_layer(kind, grid, CellCode::BLOCKING, sheets),
        LayerKind::Trigger(trigger) => marker_layer(kind, grid, trigger.code(), sheets),
        LayerKind::PlayerSpawn => Ok(Layer {
            kind,
            sprites: Vec::new(),
        }),
    }
}

fn checked_grid(kind: LayerKind, grids: &LayerGrids) -> Result<&Grid, BuildError> {
    let canonical = grids.canonical_dimensions();
    let grid = grids.for_kind(kind);
    if grid.dimensions() != canonical {
        return Err(BuildError::DimensionMismatch {
            layer: kind.name(),
            expected: canonical,
            found: grid.dimensions(),
        });
    }
    Ok(grid)
}

fn image_layer(
    kind: LayerKind,
    grid: &Grid,
    sheet: TileSheet,
    sheets: &SheetCatalog,
) -> Result<Layer, BuildError> {
    let sheet_len = sheets.require(sheet, kind.name())?;
    let mut sprites = Vec::new();
    for (cell, code) in grid.iter() {
        if code.is_empty() {
            continue;
        }
        let image = code
            .image_index()
            .filter(|index| *index < sheet_len)
            .ok_or(BuildError::SheetIndexOutOfRange {
                layer: kind.name(),
                cell,
                code,
                sheet_len,
            })?;
        sprites.push(TileSprite::new(cell, sheet, image));
    }
    Ok(Layer { kind, sprites })
}

fn marker_layer(
    kind: LayerKind,
    grid: &Grid,
    marker: CellCode,
    sheets: &SheetCatalog,
) -> Result<Layer, BuildError> {
    let sprites: Vec<_> = grid
        .iter()
        .filter(|(_, code)| *code == marker)
        .map(|(cell, _)| TileSprite::new(cell, TileSheet::House, BLOCKER_IMAGE_INDEX))
        .collect();

    if let Some(first) = sprites.first() {
        let sheet_len = sheets.require(TileSheet::House, kind.name())?;
        if BLOCKER_IMAGE_INDEX >= sheet_len {
            return Err(BuildError::SheetIndexOutOfRange {
                layer: kind.name(),
                cell: first.cell(),
                code: marker,
                sheet_len,
            });
        }
    }

    Ok(Layer { kind, sprites })
}
