//! Manifest describing where an overworld's grids, sheets and avatars live.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs, io,
    path::{Path, PathBuf},
};

use overworld_core::{
    AvatarId, CellCode, LevelId, LevelTrigger, TileSheet, DEFAULT_LEVEL_TRIGGERS,
    SOURCE_TILE_SIZE, TILE_SIZE,
};
use serde::Deserialize;
use thiserror::Error;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;
const DEFAULT_AVATAR: &str = "player";

/// Errors raised while reading or validating a manifest.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest file could not be read.
    #[error("failed to read overworld manifest at {}", .path.display())]
    Read {
        /// Location of the manifest.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The manifest is not valid TOML or has unexpected fields.
    #[error("failed to parse overworld manifest toml contents")]
    Parse(#[from] toml::de::Error),
    /// The manifest declares a version this build does not understand.
    #[error("unsupported overworld manifest version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version found in the manifest.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
    /// Two level entries share a level or a trigger code.
    #[error("overworld manifest declares {what} more than once")]
    DuplicateLevel {
        /// Description of the duplicated value.
        what: String,
    },
    /// A numeric setting is outside its usable range.
    #[error("overworld manifest setting `{setting}` must be positive (found {value})")]
    NonPositive {
        /// Name of the setting.
        setting: &'static str,
        /// Offending value.
        value: i64,
    },
    /// The player would cover more than one tile per frame.
    #[error("overworld manifest setting `player_speed` must not exceed {max} (found {value})")]
    SpeedAboveTile {
        /// Offending speed in pixels per frame.
        value: i32,
        /// Largest accepted speed, one tile per frame.
        max: i32,
    },
    /// The starting avatar has no sheet entry.
    #[error("default avatar `{0}` has no entry under [avatars]")]
    UnknownAvatar(AvatarId),
}

/// Grid file locations for every layer.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridPaths {
    /// Terrain grid.
    pub terrain: PathBuf,
    /// Nature grid.
    pub nature: PathBuf,
    /// Floor grid.
    pub floor: PathBuf,
    /// House grid, which defines the canonical shape.
    pub house: PathBuf,
    /// Water grid.
    pub water: PathBuf,
    /// Water details grid.
    pub water_details: PathBuf,
    /// Limit and trigger grid.
    pub limits: PathBuf,
    /// Player start grid; the stock layout marks the spawn in the floor grid.
    pub player_start: PathBuf,
}

impl Default for GridPaths {
    fn default() -> Self {
        let grid = |name: &str| PathBuf::from(format!("levels/overworld/overworld_{name}.csv"));
        Self {
            terrain: grid("terrain"),
            nature: grid("nature"),
            floor: grid("floor"),
            house: grid("houses"),
            water: grid("water"),
            water_details: grid("water_details"),
            limits: grid("contraints"),
            player_start: grid("floor"),
        }
    }
}

impl GridPaths {
    fn resolve(&mut self, base: &Path) {
        for path in [
            &mut self.terrain,
            &mut self.nature,
            &mut self.floor,
            &mut self.house,
            &mut self.water,
            &mut self.water_details,
            &mut self.limits,
            &mut self.player_start,
        ] {
            *path = base.join(&*path);
        }
    }
}

/// Sprite sheet locations for the tile layers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetPaths {
    /// Terrain sheet.
    pub terrain: PathBuf,
    /// Nature sheet.
    pub nature: PathBuf,
    /// Floor sheet.
    pub floor: PathBuf,
    /// House sheet; also supplies the blocker image.
    pub house: PathBuf,
    /// Water sheet, shared by water and water details.
    pub water: PathBuf,
}

impl Default for SheetPaths {
    fn default() -> Self {
        let sheet = |name: &str| PathBuf::from(format!("assets/overworld/{name}.png"));
        Self {
            terrain: sheet("terrain"),
            nature: sheet("nature"),
            floor: sheet("floor"),
            house: sheet("house"),
            water: sheet("water"),
        }
    }
}

impl SheetPaths {
    /// Location of the provided sheet.
    #[must_use]
    pub fn path(&self, sheet: TileSheet) -> &Path {
        match sheet {
            TileSheet::Terrain => &self.terrain,
            TileSheet::Nature => &self.nature,
            TileSheet::Floor => &self.floor,
            TileSheet::House => &self.house,
            TileSheet::Water => &self.water,
        }
    }

    fn resolve(&mut self, base: &Path) {
        for path in [
            &mut self.terrain,
            &mut self.nature,
            &mut self.floor,
            &mut self.house,
            &mut self.water,
        ] {
            *path = base.join(&*path);
        }
    }
}

/// One entry of the level table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelConfig {
    /// Level entered through the trigger.
    pub level: LevelId,
    /// Limit-grid code marking the trigger's tiles.
    pub code: CellCode,
    /// Scene the external scene manager should open.
    pub scene: String,
}

fn default_levels() -> Vec<LevelConfig> {
    DEFAULT_LEVEL_TRIGGERS
        .iter()
        .map(|trigger| LevelConfig {
            level: trigger.level(),
            code: trigger.code(),
            scene: format!("level_{}", trigger.level().get()),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    version: u32,
    #[serde(default = "default_source_tile_size")]
    source_tile_size: u32,
    #[serde(default = "default_player_speed")]
    player_speed: i32,
    #[serde(default = "default_avatar")]
    avatar: AvatarId,
    #[serde(default)]
    grids: GridPaths,
    #[serde(default)]
    sheets: SheetPaths,
    #[serde(default = "default_avatars")]
    avatars: BTreeMap<AvatarId, PathBuf>,
    #[serde(default = "default_levels")]
    levels: Vec<LevelConfig>,
}

fn default_source_tile_size() -> u32 {
    SOURCE_TILE_SIZE
}

fn default_player_speed() -> i32 {
    overworld_system_movement::DEFAULT_PLAYER_SPEED
}

fn default_avatar() -> AvatarId {
    AvatarId::new(DEFAULT_AVATAR)
}

fn default_avatars() -> BTreeMap<AvatarId, PathBuf> {
    BTreeMap::from([(
        default_avatar(),
        PathBuf::from(format!("assets/overworld/players/{DEFAULT_AVATAR}.png")),
    )])
}

/// Validated overworld configuration with every path resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverworldConfig {
    /// Edge length of one cell in the source sheets, in pixels.
    pub source_tile_size: u32,
    /// Player speed in pixels per frame.
    pub player_speed: i32,
    /// Identity the player starts with when nothing else is selected.
    pub avatar: AvatarId,
    /// Grid file locations.
    pub grids: GridPaths,
    /// Tile sheet locations.
    pub sheets: SheetPaths,
    /// Avatar sheet locations keyed by identity.
    pub avatars: BTreeMap<AvatarId, PathBuf>,
    /// Level table in declaration order.
    pub levels: Vec<LevelConfig>,
}

impl Default for OverworldConfig {
    fn default() -> Self {
        Self {
            source_tile_size: default_source_tile_size(),
            player_speed: default_player_speed(),
            avatar: default_avatar(),
            grids: GridPaths::default(),
            sheets: SheetPaths::default(),
            avatars: default_avatars(),
            levels: default_levels(),
        }
    }
}

impl OverworldConfig {
    /// Returns the default manifest path relative to the repository root.
    #[must_use]
    pub fn default_manifest_path() -> PathBuf {
        PathBuf::from("overworld.toml")
    }

    /// Loads the manifest at `path`, resolving its paths against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).map_err(|source| ConfigError::Read {
            path: manifest_path.to_path_buf(),
            source,
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_toml_str(&contents, &base)
    }

    /// Parses manifest contents, resolving relative paths against `base`.
    pub fn from_toml_str(contents: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut manifest: Manifest = toml::from_str(contents)?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: manifest.version,
                expected: SUPPORTED_MANIFEST_VERSION,
            });
        }
        if manifest.source_tile_size == 0 {
            return Err(ConfigError::NonPositive {
                setting: "source_tile_size",
                value: 0,
            });
        }
        if manifest.player_speed <= 0 {
            return Err(ConfigError::NonPositive {
                setting: "player_speed",
                value: i64::from(manifest.player_speed),
            });
        }
        if manifest.player_speed > TILE_SIZE {
            return Err(ConfigError::SpeedAboveTile {
                value: manifest.player_speed,
                max: TILE_SIZE,
            });
        }
        if !manifest.avatars.contains_key(&manifest.avatar) {
            return Err(ConfigError::UnknownAvatar(manifest.avatar));
        }
        check_levels(&manifest.levels)?;

        manifest.grids.resolve(base);
        manifest.sheets.resolve(base);
        for path in manifest.avatars.values_mut() {
            *path = base.join(&*path);
        }

        Ok(Self {
            source_tile_size: manifest.source_tile_size,
            player_speed: manifest.player_speed,
            avatar: manifest.avatar,
            grids: manifest.grids,
            sheets: manifest.sheets,
            avatars: manifest.avatars,
            levels: manifest.levels,
        })
    }

    /// Trigger table derived from the level entries.
    #[must_use]
    pub fn triggers(&self) -> Vec<LevelTrigger> {
        self.levels
            .iter()
            .map(|entry| LevelTrigger::new(entry.level, entry.code))
            .collect()
    }

    /// `(level, scene)` pairs for the level transition system.
    pub fn scenes(&self) -> impl Iterator<Item = (LevelId, &str)> + '_ {
        self.levels
            .iter()
            .map(|entry| (entry.level, entry.scene.as_str()))
    }
}

fn check_levels(levels: &[LevelConfig]) -> Result<(), ConfigError> {
    let mut seen_levels = BTreeSet::new();
    let mut seen_codes = BTreeSet::new();
    for entry in levels {
        if !seen_levels.insert(entry.level) {
            return Err(ConfigError::DuplicateLevel {
                what: entry.level.to_string(),
            });
        }
        if !seen_codes.insert(entry.code) {
            return Err(ConfigError::DuplicateLevel {
                what: format!("trigger code {}", entry.code),
            });
        }
    }
    Ok(())
}
