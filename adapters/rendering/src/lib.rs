#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for overworld adapters.

mod menu;

use anyhow::Result as AnyResult;
use overworld_core::{AvatarId, DirectionalInput, GridDimensions, PixelPoint, TileSheet};
use std::{error::Error, fmt, path::PathBuf, time::Duration};

pub use menu::{AvatarMenu, PauseMenu};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the overworld.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Directions held during the frame.
    pub directions: DirectionalInput,
    /// Whether the pause toggle was pressed on this frame.
    pub toggle_pause: bool,
    /// Whether a rebuild of the overworld was requested on this frame.
    pub reset: bool,
    /// Whether the menu should advance to the next entry.
    pub menu_next: bool,
    /// Whether the menu should return to the previous entry.
    pub menu_previous: bool,
}

/// Owned identifier of a sprite sheet loaded by a backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SheetKey {
    /// Sheet backing a static tile layer.
    Tile(TileSheet),
    /// Image set of one avatar identity.
    Avatar(AvatarId),
}

impl SheetKey {
    /// Borrows the key for a draw call.
    #[must_use]
    pub fn as_sheet_ref(&self) -> SheetRef<'_> {
        match self {
            Self::Tile(sheet) => SheetRef::Tile(*sheet),
            Self::Avatar(avatar) => SheetRef::Avatar(avatar),
        }
    }
}

/// Borrowed identifier of the sheet an image is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SheetRef<'a> {
    /// Sheet backing a static tile layer.
    Tile(TileSheet),
    /// Image set of one avatar identity.
    Avatar(&'a AvatarId),
}

impl SheetRef<'_> {
    /// Converts the borrowed identifier into an owned key.
    #[must_use]
    pub fn to_key(self) -> SheetKey {
        match self {
            Self::Tile(sheet) => SheetKey::Tile(sheet),
            Self::Avatar(avatar) => SheetKey::Avatar(avatar.clone()),
        }
    }
}

/// Location of a sheet a backend should load before the first frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetSource {
    /// Identifier draw calls refer to the sheet by.
    pub key: SheetKey,
    /// Image file holding the sheet.
    pub path: PathBuf,
}

/// Surface that frame content is issued against.
///
/// Drawing never fails: implementations skip and report images they cannot
/// resolve so the frame loop keeps running.
pub trait DrawTarget {
    /// Draws image `index` of `sheet` with its top-left corner at `position`.
    fn draw_image(&mut self, sheet: SheetRef<'_>, index: usize, position: PixelPoint);

    /// Fills a rectangle with a solid color.
    fn draw_panel(&mut self, origin: PixelPoint, width: i32, height: i32, color: Color);

    /// Draws a line of text with its baseline starting at `position`.
    fn draw_text(&mut self, text: &str, position: PixelPoint, size: f32, color: Color);
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Map shape; the window is sized to show every tile.
    pub dimensions: GridDimensions,
    /// Edge length of one cell in the source sheets, in pixels.
    pub source_tile_size: u32,
    /// Sheets the backend loads and slices before the first frame.
    pub sheets: Vec<SheetSource>,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    pub fn new<T>(
        window_title: T,
        clear_color: Color,
        dimensions: GridDimensions,
        source_tile_size: u32,
        sheets: Vec<SheetSource>,
    ) -> Result<Self, RenderingError>
    where
        T: Into<String>,
    {
        if dimensions.columns() == 0 || dimensions.rows() == 0 {
            return Err(RenderingError::EmptyMap { dimensions });
        }
        if source_tile_size == 0 {
            return Err(RenderingError::InvalidSourceTileSize);
        }
        Ok(Self {
            window_title: window_title.into(),
            clear_color,
            dimensions,
            source_tile_size,
            sheets,
        })
    }

    /// Window width in pixels.
    #[must_use]
    pub fn screen_width(&self) -> i32 {
        self.dimensions.pixel_width()
    }

    /// Window height in pixels.
    #[must_use]
    pub fn screen_height(&self) -> i32 {
        self.dimensions.pixel_height()
    }
}

/// Rendering backend capable of presenting the overworld.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_frame` closure receives the frame delta and the
    /// input captured by the adapter, and issues the frame's draw calls
    /// against the supplied target.
    fn run<F>(self, presentation: Presentation, update_frame: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut dyn DrawTarget) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// The map has no rows or no columns, so there is nothing to show.
    EmptyMap {
        /// Dimensions that failed validation.
        dimensions: GridDimensions,
    },
    /// Source cells must be at least one pixel wide.
    InvalidSourceTileSize,
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMap { dimensions } => {
                write!(f, "cannot present an empty {dimensions} map")
            }
            Self::InvalidSourceTileSize => f.write_str("source tile size must be positive"),
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_sizes_window_to_the_map() {
        let presentation = Presentation::new(
            "Overworld",
            Color::from_rgb_u8(0, 0, 0),
            GridDimensions::new(40, 22),
            16,
            Vec::new(),
        )
        .expect("non-empty map should succeed");

        assert_eq!(presentation.screen_width(), 1280);
        assert_eq!(presentation.screen_height(), 704);
    }

    #[test]
    fn presentation_rejects_empty_map_without_panicking() {
        let error = Presentation::new(
            "Overworld",
            Color::from_rgb_u8(0, 0, 0),
            GridDimensions::new(0, 5),
            16,
            Vec::new(),
        )
        .expect_err("empty map must be rejected");

        assert_eq!(
            error,
            RenderingError::EmptyMap {
                dimensions: GridDimensions::new(0, 5)
            }
        );
    }

    #[test]
    fn sheet_keys_borrow_and_own_symmetrically() {
        let key = SheetKey::Avatar(AvatarId::new("knight"));

        assert_eq!(key.as_sheet_ref().to_key(), key);
        assert_eq!(
            SheetRef::Tile(TileSheet::House).to_key(),
            SheetKey::Tile(TileSheet::House)
        );
    }

    #[test]
    fn lighten_moves_channels_towards_white() {
        let color = Color::new(0.0, 0.5, 1.0, 0.25).lighten(0.5);

        assert_eq!(color, Color::new(0.5, 0.75, 1.0, 0.25));
    }
}
