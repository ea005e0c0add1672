use std::{fs, path::Path};

use overworld_composer::{FileAssetSource, Overworld, OverworldConfig};
use overworld_core::{AvatarId, BuildError, LayerName, LevelId, PixelPoint, PlayerSettings};
use overworld_world::query;

const GRIDS: [(&str, &str); 7] = [
    ("terrain", "0,0\n0,0\n"),
    ("nature", "-1,-1\n-1,3\n"),
    ("floor", "1,-1\n-1,-1\n"),
    ("houses", "-1,2\n-1,-1\n"),
    ("water", "-1,-1\n-1,-1\n"),
    ("water_details", "-1,-1\n-1,-1\n"),
    ("contraints", "0,-1\n104,0\n"),
];

fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().expect("png has a parent")).expect("create sheet dir");
    image::RgbaImage::new(width, height)
        .save(path)
        .expect("write png");
}

fn write_tree(root: &Path) {
    let levels = root.join("levels/overworld");
    fs::create_dir_all(&levels).expect("create level dir");
    for (name, contents) in GRIDS {
        fs::write(levels.join(format!("overworld_{name}.csv")), contents).expect("write grid");
    }
    for sheet in ["terrain", "nature", "floor", "house", "water"] {
        write_png(&root.join(format!("assets/overworld/{sheet}.png")), 64, 32);
    }
    write_png(&root.join("assets/overworld/players/player.png"), 48, 64);
    fs::write(root.join("overworld.toml"), "version = 1\n").expect("write manifest");
}

#[test]
fn stock_layout_on_disk_builds_a_world() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_tree(dir.path());

    let config = OverworldConfig::load(dir.path().join("overworld.toml")).expect("load manifest");
    let overworld = Overworld::build(
        FileAssetSource,
        config,
        &PlayerSettings::new(AvatarId::new("player")),
    )
    .expect("build from disk");

    assert_eq!(query::spawn_point(overworld.world()), PixelPoint::new(0, 0));
    let summary = overworld.layer_summary();
    assert!(summary.contains(&(LayerName::House, 1)));
    assert!(summary.contains(&(LayerName::Nature, 1)));
    assert!(summary.contains(&(LayerName::Floor, 1)));
    assert!(summary.contains(&(LayerName::Limit, 1)));
    assert!(summary.contains(&(LayerName::Trigger(LevelId::new(1)), 1)));
}

#[test]
fn missing_grid_file_names_the_asset() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_tree(dir.path());
    let floor = dir.path().join("levels/overworld/overworld_floor.csv");
    fs::remove_file(&floor).expect("remove floor grid");

    let config = OverworldConfig::load(dir.path().join("overworld.toml")).expect("load manifest");
    let error = Overworld::build(
        FileAssetSource,
        config,
        &PlayerSettings::new(AvatarId::new("player")),
    )
    .expect_err("floor grid is missing");

    match error {
        BuildError::AssetLoad { asset, .. } => assert!(asset.contains("overworld_floor.csv")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn sheet_too_small_for_its_codes_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_tree(dir.path());
    write_png(&dir.path().join("assets/overworld/nature.png"), 16, 16);

    let config = OverworldConfig::load(dir.path().join("overworld.toml")).expect("load manifest");
    let error = Overworld::build(
        FileAssetSource,
        config,
        &PlayerSettings::new(AvatarId::new("player")),
    )
    .expect_err("nature code 3 exceeds a one-image sheet");

    assert!(matches!(
        error,
        BuildError::SheetIndexOutOfRange {
            layer: LayerName::Nature,
            sheet_len: 1,
            ..
        }
    ));
}
