//! Loading of grid files and sprite-sheet metadata from disk.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use overworld_core::{BuildError, CellCode, Grid, GridError, TileSheet};
use overworld_world::{AvatarCatalog, LayerGrids, SheetCatalog, WorldAssets};
use thiserror::Error;
use tracing::debug;

use crate::config::OverworldConfig;

/// Errors raised while reading a single asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The file could not be read.
    #[error("failed to read {}", .path.display())]
    Io {
        /// Location of the asset.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A grid cell is not an integer code.
    #[error("line {line}, column {column}: `{value}` is not an integer cell code")]
    Parse {
        /// One-based line of the offending cell.
        line: usize,
        /// One-based column of the offending cell.
        column: usize,
        /// Text found in the cell.
        value: String,
    },
    /// The grid's rows do not form a rectangle.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The sheet could not be decoded or does not slice into whole cells.
    #[error("sheet {} is unusable: {reason}", .path.display())]
    Image {
        /// Location of the sheet.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },
}

/// Source of grid data and sheet metadata consulted while building a world.
pub trait AssetSource {
    /// Reads the grid stored at `path`.
    fn load_grid(&self, path: &Path) -> Result<Grid, AssetError>;

    /// Counts the `source_tile`-sized images contained in the sheet at `path`.
    fn sheet_len(&self, path: &Path, source_tile: u32) -> Result<usize, AssetError>;
}

/// Asset source reading CSV grids and PNG sheets from the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileAssetSource;

impl AssetSource for FileAssetSource {
    fn load_grid(&self, path: &Path) -> Result<Grid, AssetError> {
        let contents = fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_grid(&contents)
    }

    fn sheet_len(&self, path: &Path, source_tile: u32) -> Result<usize, AssetError> {
        let (width, height) =
            image::image_dimensions(path).map_err(|error| AssetError::Image {
                path: path.to_path_buf(),
                reason: error.to_string(),
            })?;
        sheet_cells(width, height, source_tile).map_err(|reason| AssetError::Image {
            path: path.to_path_buf(),
            reason,
        })
    }
}

/// Parses comma-separated integer rows; blank lines are skipped.
pub fn parse_grid(contents: &str) -> Result<Grid, AssetError> {
    let mut rows = Vec::new();
    for (line_index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .split(',')
            .enumerate()
            .map(|(column_index, cell)| {
                let cell = cell.trim();
                cell.parse::<i32>()
                    .map(CellCode::new)
                    .map_err(|_| AssetError::Parse {
                        line: line_index + 1,
                        column: column_index + 1,
                        value: cell.to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(Grid::from_rows(rows)?)
}

/// Number of whole `source_tile` cells in a `width` x `height` sheet.
pub fn sheet_cells(width: u32, height: u32, source_tile: u32) -> Result<usize, String> {
    if source_tile == 0 {
        return Err("source tile size must be positive".to_owned());
    }
    if width % source_tile != 0 || height % source_tile != 0 {
        return Err(format!(
            "{width}x{height} pixels is not a multiple of the {source_tile} pixel cell"
        ));
    }
    let cells = u64::from(width / source_tile) * u64::from(height / source_tile);
    match usize::try_from(cells) {
        Ok(0) => Err("sheet holds no cells".to_owned()),
        Ok(cells) => Ok(cells),
        Err(_) => Err(format!("{cells} cells exceed the addressable range")),
    }
}

/// Loads every grid and sheet the configuration names.
///
/// Any failure is reported as [`BuildError::AssetLoad`] naming the asset, so a
/// world is never built from a partial set of assets.
pub fn load_world_assets<S>(source: &S, config: &OverworldConfig) -> Result<WorldAssets, BuildError>
where
    S: AssetSource + ?Sized,
{
    let grid = |path: &Path| {
        let grid = source.load_grid(path).map_err(|error| asset_error(path, &error))?;
        debug!(path = %path.display(), dimensions = %grid.dimensions(), "grid loaded");
        Ok::<_, BuildError>(grid)
    };
    let sheet_len = |path: &Path| {
        let len = source
            .sheet_len(path, config.source_tile_size)
            .map_err(|error| asset_error(path, &error))?;
        debug!(path = %path.display(), images = len, "sheet measured");
        Ok::<_, BuildError>(len)
    };

    let grids = LayerGrids {
        terrain: grid(&config.grids.terrain)?,
        nature: grid(&config.grids.nature)?,
        floor: grid(&config.grids.floor)?,
        house: grid(&config.grids.house)?,
        water: grid(&config.grids.water)?,
        water_details: grid(&config.grids.water_details)?,
        limits: grid(&config.grids.limits)?,
        player_start: grid(&config.grids.player_start)?,
    };

    let mut sheets = SheetCatalog::new();
    for sheet in TileSheet::ALL {
        sheets.insert(sheet, sheet_len(config.sheets.path(sheet))?);
    }

    let mut avatars = AvatarCatalog::new();
    for (avatar, path) in &config.avatars {
        avatars.insert(avatar.clone(), sheet_len(path)?);
    }

    Ok(WorldAssets {
        grids,
        sheets,
        avatars,
    })
}

fn asset_error(path: &Path, error: &AssetError) -> BuildError {
    let mut reason = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    BuildError::AssetLoad {
        asset: path.display().to_string(),
        reason,
    }
}
