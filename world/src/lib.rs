#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative overworld state management.
//!
//! A [`World`] is built in one step from loaded grids and sheet metadata and
//! is either complete or not produced at all. After that it only changes
//! through [`apply`], which reports every observable change as an
//! [`Event`].

mod layers;
mod player;

use std::collections::BTreeMap;

use overworld_core::{
    AvatarId, BuildError, CellCoord, Command, Event, GridDimensions, LevelId, LevelTrigger,
    PixelPoint, PixelRect, AVATAR_SHEET_ROWS,
};
use tracing::{debug, info, warn};

pub use layers::{
    build_layer, BuiltLayer, Layer, LayerGrids, LayerKind, SheetCatalog, TileSprite,
};
pub use player::{PlayerEntity, PlayerState, ANIMATION_PERIOD};

use player::blocked_axes;

/// Image counts of the sheets registered for each avatar identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AvatarCatalog {
    images: BTreeMap<AvatarId, usize>,
}

impl AvatarCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the catalog with `avatar` registered as holding `images` images.
    #[must_use]
    pub fn with_avatar(mut self, avatar: AvatarId, images: usize) -> Self {
        self.insert(avatar, images);
        self
    }

    /// Registers the sheet of `avatar` as holding `images` images.
    pub fn insert(&mut self, avatar: AvatarId, images: usize) {
        let _ = self.images.insert(avatar, images);
    }

    /// Registered identities in sorted order.
    pub fn identities(&self) -> impl Iterator<Item = &AvatarId> {
        self.images.keys()
    }

    /// Reports whether `avatar` has a usable image set.
    #[must_use]
    pub fn contains(&self, avatar: &AvatarId) -> bool {
        self.frames_per_facing(avatar).is_some()
    }

    /// Animation frames per facing row, if the sheet holds at least one per row.
    #[must_use]
    pub fn frames_per_facing(&self, avatar: &AvatarId) -> Option<usize> {
        let frames = self.images.get(avatar)? / AVATAR_SHEET_ROWS;
        (frames > 0).then_some(frames)
    }
}

/// Everything loaded from disk that a world is built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldAssets {
    /// Grids for every layer.
    pub grids: LayerGrids,
    /// Image counts of the tile sheets.
    pub sheets: SheetCatalog,
    /// Image counts of the avatar sheets.
    pub avatars: AvatarCatalog,
}

/// Build-time choices that are not part of the loaded assets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSettings {
    /// Trigger table; one trigger layer is built per entry.
    pub triggers: Vec<LevelTrigger>,
    /// Identity the player starts with.
    pub avatar: AvatarId,
}

/// Represents the authoritative overworld state.
#[derive(Clone, Debug)]
pub struct World {
    dimensions: GridDimensions,
    terrain: Layer,
    water: Layer,
    water_details: Layer,
    nature: Layer,
    floor: Layer,
    house: Layer,
    limit: Layer,
    triggers: Vec<Layer>,
    player: PlayerEntity,
    spawn: PixelPoint,
    paused: bool,
    avatars: AvatarCatalog,
    occupied_levels: Vec<LevelId>,
}

impl World {
    /// Builds a complete world, or reports the first failure encountered.
    pub fn build(assets: &WorldAssets, settings: &WorldSettings) -> Result<Self, BuildError> {
        let WorldAssets {
            grids,
            sheets,
            avatars,
        } = assets;
        let dimensions = grids.canonical_dimensions();

        let house = tiles(LayerKind::House, grids, sheets)?;
        let terrain = tiles(LayerKind::Terrain, grids, sheets)?;
        let water = tiles(LayerKind::Water, grids, sheets)?;
        let water_details = tiles(LayerKind::WaterDetail, grids, sheets)?;
        let nature = tiles(LayerKind::Nature, grids, sheets)?;
        let floor = tiles(LayerKind::Floor, grids, sheets)?;
        let limit = tiles(LayerKind::Limit, grids, sheets)?;
        let triggers = settings
            .triggers
            .iter()
            .map(|trigger| tiles(LayerKind::Trigger(*trigger), grids, sheets))
            .collect::<Result<Vec<_>, _>>()?;

        let spawn_cell = match build_layer(LayerKind::PlayerSpawn, grids, sheets)? {
            BuiltLayer::Spawn(Some(cell)) => cell,
            BuiltLayer::Spawn(None) | BuiltLayer::Tiles(_) => return Err(BuildError::MissingSpawn),
        };

        let frames_per_facing =
            avatars
                .frames_per_facing(&settings.avatar)
                .ok_or_else(|| BuildError::AssetLoad {
                    asset: format!("avatar sheet `{}`", settings.avatar),
                    reason: format!(
                        "no sheet with at least {AVATAR_SHEET_ROWS} images is registered for this identity"
                    ),
                })?;

        let spawn = spawn_cell.to_pixel();
        let player = PlayerEntity::spawn(spawn, settings.avatar.clone(), frames_per_facing);
        let occupied_levels: Vec<LevelId> = overlapped_levels(&triggers, &player.rect())
            .into_iter()
            .map(|(level, _)| level)
            .collect();
        if !occupied_levels.is_empty() {
            debug!(levels = ?occupied_levels, "player spawned on level triggers");
        }
        info!(
            %dimensions,
            spawn = %spawn_cell,
            avatar = %settings.avatar,
            "overworld built"
        );

        Ok(Self {
            dimensions,
            terrain,
            water,
            water_details,
            nature,
            floor,
            house,
            limit,
            triggers,
            player,
            spawn,
            paused: false,
            avatars: avatars.clone(),
            occupied_levels,
        })
    }

    fn detect_level_entries(&mut self, out_events: &mut Vec<Event>) {
        let overlapped = overlapped_levels(&self.triggers, &self.player.rect());
        for (level, cell) in &overlapped {
            if !self.occupied_levels.contains(level) {
                info!(%level, %cell, "player entered level trigger");
                out_events.push(Event::LevelEntered {
                    level: *level,
                    cell: *cell,
                });
            }
        }
        self.occupied_levels = overlapped.into_iter().map(|(level, _)| level).collect();
    }
}

/// Levels whose trigger layers `rect` overlaps, each with its first overlapped
/// tile, in trigger-table order.
fn overlapped_levels(triggers: &[Layer], rect: &PixelRect) -> Vec<(LevelId, CellCoord)> {
    let mut overlapped: Vec<(LevelId, CellCoord)> = Vec::new();
    for layer in triggers {
        let LayerKind::Trigger(trigger) = layer.kind() else {
            continue;
        };
        let level = trigger.level();
        if overlapped.iter().any(|(seen, _)| *seen == level) {
            continue;
        }
        if let Some(tile) = layer.first_overlap(rect) {
            overlapped.push((level, tile.cell()));
        }
    }
    overlapped
}

fn tiles(kind: LayerKind, grids: &LayerGrids, sheets: &SheetCatalog) -> Result<Layer, BuildError> {
    let layer = layers::tile_layer(kind, grids, sheets)?;
    debug!(layer = %kind.name(), sprites = layer.len(), "layer built");
    Ok(layer)
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::MovePlayer { velocity } => {
            if world.paused {
                return;
            }

            let resolution = world
                .player
                .advance(velocity, &world.limit, world.dimensions);
            for axis in blocked_axes(&resolution) {
                out_events.push(Event::PlayerBlocked {
                    axis,
                    at: resolution.to,
                });
            }
            if resolution.from != resolution.to {
                out_events.push(Event::PlayerMoved {
                    from: resolution.from,
                    to: resolution.to,
                });
            }
            world.detect_level_entries(out_events);
        }
        Command::TogglePause => {
            world.paused = !world.paused;
            info!(paused = world.paused, "pause toggled");
            out_events.push(Event::PauseToggled {
                paused: world.paused,
            });
        }
        Command::SetAvatar { avatar } => {
            if world.player.avatar() == &avatar {
                return;
            }
            match world.avatars.frames_per_facing(&avatar) {
                Some(frames_per_facing) => {
                    info!(%avatar, "player avatar changed");
                    world.player.set_avatar(avatar.clone(), frames_per_facing);
                    out_events.push(Event::AvatarChanged { avatar });
                }
                None => {
                    warn!(%avatar, "no image set registered for avatar; keeping current one");
                    out_events.push(Event::AvatarRejected { avatar });
                }
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use overworld_core::{GridDimensions, PixelPoint};

    use super::{AvatarCatalog, Layer, LayerKind, PlayerEntity, World};

    /// Shape shared by every grid of the world.
    #[must_use]
    pub fn dimensions(world: &World) -> GridDimensions {
        world.dimensions
    }

    /// Retrieves the layer of the provided kind.
    ///
    /// Returns `None` for [`LayerKind::PlayerSpawn`], which holds the player
    /// rather than tiles, and for trigger kinds absent from the trigger table.
    #[must_use]
    pub fn layer(world: &World, kind: LayerKind) -> Option<&Layer> {
        match kind {
            LayerKind::Terrain => Some(&world.terrain),
            LayerKind::Nature => Some(&world.nature),
            LayerKind::Floor => Some(&world.floor),
            LayerKind::House => Some(&world.house),
            LayerKind::Water => Some(&world.water),
            LayerKind::WaterDetail => Some(&world.water_details),
            LayerKind::Limit => Some(&world.limit),
            LayerKind::Trigger(_) => world.triggers.iter().find(|layer| layer.kind() == kind),
            LayerKind::PlayerSpawn => None,
        }
    }

    /// Trigger layers in trigger-table order.
    #[must_use]
    pub fn trigger_layers(world: &World) -> &[Layer] {
        &world.triggers
    }

    /// Provides read-only access to the player.
    #[must_use]
    pub fn player(world: &World) -> &PlayerEntity {
        &world.player
    }

    /// Pixel position the player was spawned at.
    #[must_use]
    pub fn spawn_point(world: &World) -> PixelPoint {
        world.spawn
    }

    /// Reports whether the world is paused.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Avatar identities the player may switch between.
    #[must_use]
    pub fn avatars(world: &World) -> &AvatarCatalog {
        &world.avatars
    }
}
