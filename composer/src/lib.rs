#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Composition of the overworld: asset loading, world lifecycle and the
//! per-frame draw and update order.
//!
//! [`Overworld`] owns the active [`World`] together with the systems that
//! drive it. Builds are all-or-nothing: a failed build or reset leaves no
//! partially constructed world behind.

pub mod assets;
pub mod config;

use overworld_core::{AvatarId, BuildError, Command, Event, LayerName, PlayerSettings};
use overworld_rendering::{DrawTarget, FrameInput, PauseMenu, SheetRef};
use overworld_system_level_transition::{LevelTransition, LevelTransitionRequest};
use overworld_system_movement::{self as movement, Movement};
use overworld_world::{self as world, query, Layer, LayerKind, World, WorldSettings};
use tracing::{debug, info};

pub use assets::{load_world_assets, AssetError, AssetSource, FileAssetSource};
pub use config::{ConfigError, OverworldConfig};

/// Tile layers drawn before the player, bottom first.
const UNDER_PLAYER: [LayerKind; 5] = [
    LayerKind::Terrain,
    LayerKind::Water,
    LayerKind::WaterDetail,
    LayerKind::Nature,
    LayerKind::Floor,
];

/// Layers drawn after the player.
const OVER_PLAYER: [LayerKind; 1] = [LayerKind::House];

/// Owns the active world, its systems, and the assets it is rebuilt from.
#[derive(Debug)]
pub struct Overworld<S> {
    source: S,
    config: OverworldConfig,
    state: State,
}

#[derive(Debug)]
struct State {
    world: World,
    movement: Movement,
    transitions: LevelTransition,
    pending: Vec<Event>,
    requested_avatar: AvatarId,
}

impl<S: AssetSource> Overworld<S> {
    /// Loads every asset named by `config` and builds the world.
    ///
    /// The player starts with the identity currently held in `settings`.
    pub fn build(
        source: S,
        config: OverworldConfig,
        settings: &PlayerSettings,
    ) -> Result<Self, BuildError> {
        let state = State::build(&source, &config, settings)?;
        Ok(Self {
            source,
            config,
            state,
        })
    }

    /// Rebuilds the world from scratch.
    ///
    /// The current world is replaced only once the new one is complete, so a
    /// failed reset leaves the previous world running.
    pub fn reset(&mut self, settings: &PlayerSettings) -> Result<(), BuildError> {
        let state = State::build(&self.source, &self.config, settings)?;
        self.state = state;
        info!("overworld reset");
        Ok(())
    }

    /// Flips the paused flag.
    pub fn toggle_pause(&mut self) {
        self.state.execute(Command::TogglePause);
    }

    /// Applies a changed display identity to the existing player in place.
    ///
    /// Only a change relative to the last requested identity is applied, so
    /// an identity without a registered image set is reported once rather
    /// than on every frame.
    pub fn check_identity_changed(&mut self, settings: &PlayerSettings) {
        if settings.avatar == self.state.requested_avatar {
            return;
        }
        self.state.requested_avatar = settings.avatar.clone();
        self.state.execute(Command::SetAvatar {
            avatar: settings.avatar.clone(),
        });
    }

    /// Runs one frame: identity check, draw, then update or menu.
    ///
    /// Every frame shows the state resolved by the previous one. Returns the
    /// level transitions requested during this frame.
    pub fn run_frame<M>(
        &mut self,
        input: &FrameInput,
        settings: &mut PlayerSettings,
        target: &mut dyn DrawTarget,
        menu: &mut M,
    ) -> Vec<LevelTransitionRequest>
    where
        M: PauseMenu + ?Sized,
    {
        self.check_identity_changed(settings);
        self.draw(target);

        if query::is_paused(&self.state.world) {
            menu.display(input, settings, target);
            return Vec::new();
        }
        self.state.advance(input)
    }

    /// Issues draw calls for the map in its fixed layer order.
    pub fn draw(&self, target: &mut dyn DrawTarget) {
        let world = &self.state.world;
        for kind in UNDER_PLAYER {
            draw_layer(query::layer(world, kind), target);
        }
        let player = query::player(world);
        target.draw_image(
            SheetRef::Avatar(player.avatar()),
            player.image_index(),
            player.position(),
        );
        for kind in OVER_PLAYER {
            draw_layer(query::layer(world, kind), target);
        }
    }

    /// Provides read-only access to the active world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.state.world
    }

    /// Reports whether player updates are suspended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        query::is_paused(&self.state.world)
    }

    /// Configuration the overworld was built from.
    #[must_use]
    pub fn config(&self) -> &OverworldConfig {
        &self.config
    }

    /// Sprite counts of every layer, in build order.
    #[must_use]
    pub fn layer_summary(&self) -> Vec<(LayerName, usize)> {
        let world = &self.state.world;
        let fixed = [
            LayerKind::House,
            LayerKind::Terrain,
            LayerKind::Water,
            LayerKind::WaterDetail,
            LayerKind::Nature,
            LayerKind::Floor,
            LayerKind::Limit,
        ];
        fixed
            .into_iter()
            .filter_map(|kind| query::layer(world, kind))
            .chain(query::trigger_layers(world))
            .map(|layer| (layer.kind().name(), layer.len()))
            .collect()
    }
}

fn draw_layer(layer: Option<&Layer>, target: &mut dyn DrawTarget) {
    let Some(layer) = layer else {
        return;
    };
    for sprite in layer.sprites() {
        target.draw_image(SheetRef::Tile(sprite.sheet()), sprite.image(), sprite.position());
    }
}

impl State {
    fn build<S: AssetSource>(
        source: &S,
        config: &OverworldConfig,
        settings: &PlayerSettings,
    ) -> Result<Self, BuildError> {
        let assets = load_world_assets(source, config)?;
        let world = World::build(
            &assets,
            &WorldSettings {
                triggers: config.triggers(),
                avatar: settings.avatar.clone(),
            },
        )?;
        debug!(
            speed = config.player_speed,
            levels = config.levels.len(),
            "overworld systems configured"
        );

        Ok(Self {
            world,
            movement: Movement::new(movement::Config::new(config.player_speed)),
            transitions: LevelTransition::new(config.scenes()),
            pending: Vec::new(),
            requested_avatar: settings.avatar.clone(),
        })
    }

    fn execute(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.pending);
    }

    fn advance(&mut self, input: &FrameInput) -> Vec<LevelTransitionRequest> {
        let observed = std::mem::take(&mut self.pending);
        let mut commands = Vec::new();
        self.movement
            .handle(&observed, input.directions, &mut commands);

        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        let mut requests = Vec::new();
        self.transitions.handle(&events, &mut requests);
        self.pending = events;
        requests
    }
}
