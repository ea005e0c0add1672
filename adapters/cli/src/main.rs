#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that opens the overworld map.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use overworld_composer::{FileAssetSource, Overworld, OverworldConfig};
use overworld_core::{AvatarId, PlayerSettings, TileSheet};
use overworld_rendering::{
    AvatarMenu, Color, Presentation, RenderingBackend, SheetKey, SheetSource,
};
use overworld_rendering_macroquad::MacroquadBackend;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the overworld.
#[derive(Debug, Parser)]
#[command(name = "overworld", about = "Walk the overworld map and enter its levels")]
struct CliArgs {
    /// Manifest describing grids, sheets, avatars and levels.
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,
    /// Avatar the player starts with, overriding the manifest.
    #[arg(long)]
    avatar: Option<String>,
    /// Wait for the display refresh before presenting each frame (default).
    #[arg(long, overrides_with = "no_vsync")]
    vsync: bool,
    /// Render as fast as possible instead of waiting for the display.
    #[arg(long, overrides_with = "vsync")]
    no_vsync: bool,
    /// Log frame timing once per second.
    #[arg(long)]
    show_fps: bool,
    /// Build the world, log its layers, and exit without opening a window.
    #[arg(long)]
    check: bool,
}

impl CliArgs {
    fn vsync(&self) -> bool {
        self.vsync || !self.no_vsync
    }
}

/// Entry point for the overworld command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let config = load_config(args.manifest.as_deref())?;
    let avatar = starting_avatar(&config, args.avatar.as_deref())?;
    let mut settings = PlayerSettings::new(avatar);
    let mut overworld = Overworld::build(FileAssetSource, config, &settings)
        .context("failed to build the overworld")?;

    for (layer, sprites) in overworld.layer_summary() {
        info!(%layer, sprites, "layer ready");
    }
    if args.check {
        return Ok(());
    }

    let presentation = Presentation::new(
        "Overworld",
        Color::from_rgb_u8(0, 0, 0),
        overworld_world::query::dimensions(overworld.world()),
        overworld.config().source_tile_size,
        sheet_sources(overworld.config()),
    )?;
    let mut menu = AvatarMenu::new(overworld.config().avatars.keys().cloned().collect());
    let backend = MacroquadBackend::new()
        .with_vsync(args.vsync())
        .with_show_fps(args.show_fps);

    backend.run(presentation, move |_dt, input, target| {
        if input.reset {
            if let Err(error) = overworld.reset(&settings) {
                error!(%error, "reset failed; keeping the current world");
            }
        }
        if input.toggle_pause {
            overworld.toggle_pause();
        }
        for request in overworld.run_frame(&input, &mut settings, target, &mut menu) {
            debug!(
                level = %request.level,
                scene = %request.scene,
                "no scene manager attached; staying on the overworld"
            );
        }
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Loads the manifest, falling back to the stock layout when the default
/// manifest is absent.
fn load_config(manifest: Option<&Path>) -> Result<OverworldConfig> {
    let path = match manifest {
        Some(path) => path.to_path_buf(),
        None => {
            let path = OverworldConfig::default_manifest_path();
            if !path.exists() {
                info!("no manifest found; using the stock asset layout");
                return Ok(OverworldConfig::default());
            }
            path
        }
    };
    OverworldConfig::load(&path)
        .with_context(|| format!("failed to load manifest {}", path.display()))
}

fn starting_avatar(config: &OverworldConfig, requested: Option<&str>) -> Result<AvatarId> {
    let Some(name) = requested else {
        return Ok(config.avatar.clone());
    };
    let avatar = AvatarId::new(name);
    if !config.avatars.contains_key(&avatar) {
        bail!("avatar `{avatar}` is not registered in the manifest");
    }
    Ok(avatar)
}

fn sheet_sources(config: &OverworldConfig) -> Vec<SheetSource> {
    let tiles = TileSheet::ALL.into_iter().map(|sheet| SheetSource {
        key: SheetKey::Tile(sheet),
        path: config.sheets.path(sheet).to_path_buf(),
    });
    let avatars = config.avatars.iter().map(|(avatar, path)| SheetSource {
        key: SheetKey::Avatar(avatar.clone()),
        path: path.clone(),
    });
    tiles.chain(avatars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_default_to_a_windowed_vsynced_run() {
        let args = CliArgs::try_parse_from(["overworld"]).expect("no flags should parse");

        assert!(args.manifest.is_none());
        assert!(args.vsync());
        assert!(!args.check);
    }

    #[test]
    fn flags_parse_overrides() {
        let args = CliArgs::try_parse_from([
            "overworld",
            "--manifest",
            "game/overworld.toml",
            "--avatar",
            "player",
            "--no-vsync",
            "--show-fps",
            "--check",
        ])
        .expect("flags should parse");

        assert_eq!(args.manifest, Some(PathBuf::from("game/overworld.toml")));
        assert_eq!(args.avatar.as_deref(), Some("player"));
        assert!(!args.vsync());
        assert!(args.show_fps && args.check);
    }

    #[test]
    fn last_vsync_flag_wins() {
        let args = CliArgs::try_parse_from(["overworld", "--no-vsync", "--vsync"])
            .expect("both vsync flags should parse");

        assert!(args.vsync());
    }

    #[test]
    fn unknown_avatar_override_is_rejected() {
        let config = OverworldConfig::default();

        assert_eq!(
            starting_avatar(&config, None).expect("manifest avatar"),
            config.avatar
        );
        assert!(starting_avatar(&config, Some("ghost")).is_err());
    }

    #[test]
    fn every_tile_sheet_and_avatar_is_presented() {
        let config = OverworldConfig::default();

        let sources = sheet_sources(&config);

        assert_eq!(sources.len(), TileSheet::ALL.len() + config.avatars.len());
        assert!(sources
            .iter()
            .any(|source| source.key == SheetKey::Avatar(config.avatar.clone())));
    }
}
