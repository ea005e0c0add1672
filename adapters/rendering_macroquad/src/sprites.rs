use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use macroquad::{
    color::WHITE,
    math::{Rect, Vec2 as MacroquadVec2},
    texture::{self, DrawTextureParams, FilterMode, Texture2D},
};
use overworld_core::{PixelPoint, TILE_SIZE};
use overworld_rendering::{SheetKey, SheetRef, SheetSource};
use tracing::{debug, warn};

/// Texture handed back by a sheet loader together with its pixel size.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LoadedSheet {
    pub(crate) texture: Texture2D,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

#[derive(Clone, Copy, Debug)]
struct SlicedSheet {
    texture: Texture2D,
    columns: u32,
    rows: u32,
}

/// Cache of sprite sheets sliced into square source cells.
#[derive(Debug)]
pub(crate) struct SheetAtlas {
    sheets: HashMap<SheetKey, SlicedSheet>,
    source_tile: u32,
    reported: HashSet<(SheetKey, Option<usize>)>,
}

impl SheetAtlas {
    /// Loads every sheet from disk.
    pub(crate) fn from_sources(sources: &[SheetSource], source_tile: u32) -> Result<Self> {
        Self::from_sources_with_loader(sources, source_tile, &mut default_loader)
    }

    fn from_sources_with_loader(
        sources: &[SheetSource],
        source_tile: u32,
        loader: &mut impl FnMut(&SheetKey, &Path) -> Result<LoadedSheet>,
    ) -> Result<Self> {
        if source_tile == 0 {
            bail!("source tile size must be positive");
        }
        let mut sheets = HashMap::with_capacity(sources.len());
        for source in sources {
            let loaded = loader(&source.key, &source.path).with_context(|| {
                format!(
                    "failed to load sheet {:?} from {}",
                    source.key,
                    source.path.display()
                )
            })?;
            let sliced = SlicedSheet {
                texture: loaded.texture,
                columns: loaded.width / source_tile,
                rows: loaded.height / source_tile,
            };
            debug!(
                sheet = ?source.key,
                columns = sliced.columns,
                rows = sliced.rows,
                "sheet sliced"
            );
            if sheets.insert(source.key.clone(), sliced).is_some() {
                bail!("duplicate sheet entry for {:?}", source.key);
            }
        }
        Ok(Self {
            sheets,
            source_tile,
            reported: HashSet::new(),
        })
    }

    /// Number of sheets held by the atlas.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Draws image `index` of `sheet` scaled to one map tile.
    pub(crate) fn draw(&mut self, sheet: SheetRef<'_>, index: usize, position: PixelPoint) {
        let Some((texture, origin)) = self.locate(sheet, index) else {
            return;
        };
        let edge = self.source_tile as f32;
        let tile = TILE_SIZE as f32;
        texture::draw_texture_ex(
            texture,
            position.x as f32,
            position.y as f32,
            WHITE,
            DrawTextureParams {
                source: Some(Rect::new(origin.x, origin.y, edge, edge)),
                dest_size: Some(MacroquadVec2::new(tile, tile)),
                ..DrawTextureParams::default()
            },
        );
    }

    /// Resolves the texture and source-cell origin of an image.
    ///
    /// Unknown sheets and out-of-range indices are reported once each.
    fn locate(&mut self, sheet: SheetRef<'_>, index: usize) -> Option<(Texture2D, Vec2)> {
        let key = sheet.to_key();
        let Some(sliced) = self.sheets.get(&key) else {
            if self.reported.insert((key.clone(), None)) {
                warn!(sheet = ?key, "draw requested from an unloaded sheet");
            }
            return None;
        };
        let texture = sliced.texture;
        match cell_origin(sliced.columns, sliced.rows, self.source_tile, index) {
            Some(origin) => Some((texture, origin)),
            None => {
                if self.reported.insert((key.clone(), Some(index))) {
                    warn!(sheet = ?key, index, "image index outside of sheet");
                }
                None
            }
        }
    }
}

/// Top-left pixel of cell `index` in a row-major sheet.
fn cell_origin(columns: u32, rows: u32, source_tile: u32, index: usize) -> Option<Vec2> {
    let columns = usize::try_from(columns).ok().filter(|columns| *columns > 0)?;
    let column = index % columns;
    let row = index / columns;
    if row >= usize::try_from(rows).ok()? {
        return None;
    }
    let edge = source_tile as f32;
    Some(Vec2::new(column as f32 * edge, row as f32 * edge))
}

fn default_loader(_key: &SheetKey, path: &Path) -> Result<LoadedSheet> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read sheet asset at {}", path.display()))?;
    let texture = Texture2D::from_file_with_format(&bytes, None);
    texture.set_filter(FilterMode::Nearest);
    Ok(LoadedSheet {
        texture,
        width: texture.width() as u32,
        height: texture.height() as u32,
    })
}
