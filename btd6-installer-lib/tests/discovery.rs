//! Integration tests for searching simulated volumes.
use btd6_installer_lib::{discover_candidates, CandidateInstallation, Config, InstallationTarget};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn finds_single_nested_install_across_volumes() {
    let layout = Config::default().layout;
    let c = tempdir().unwrap();
    let d = tempdir().unwrap();
    let e = tempdir().unwrap();

    // C: has an empty Steam library, D: has the game, E: has no prefixes at all.
    fs::create_dir_all(c.path().join("Program Files (x86)/Steam/steamapps/common/Other"))
        .unwrap();
    let game = d
        .path()
        .join("Program Files (x86)/Steam/steamapps/common/BloonsTD6");
    fs::create_dir_all(game.join("BloonsTD6_Data")).unwrap();
    fs::write(game.join("BloonsTD6.exe"), b"").unwrap();
    fs::write(game.join("BloonsTD6_Data/BloonsTD6.exe.config"), b"").unwrap();

    let volumes: Vec<PathBuf> = [&c, &d, &e].iter().map(|t| t.path().to_path_buf()).collect();
    let found: Vec<CandidateInstallation> = discover_candidates(volumes, &layout).collect();

    assert_eq!(found, vec![CandidateInstallation::new(game.join("BloonsTD6.exe"))]);
    let target = InstallationTarget::from_candidate(&found[0]).unwrap();
    assert_eq!(target.dir(), game.as_path());
}

#[test]
fn steam_results_precede_epic_on_the_same_volume() {
    let layout = Config::default().layout;
    let v = tempdir().unwrap();
    let steam = v
        .path()
        .join("Program Files (x86)/Steam/steamapps/common/BloonsTD6");
    let epic = v.path().join("Program Files/Epic Games/BloonsTD6");
    for dir in [&steam, &epic] {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("BloonsTD6.exe"), b"").unwrap();
    }

    let dirs: Vec<PathBuf> = discover_candidates(vec![v.path().to_path_buf()], &layout)
        .filter_map(|c| c.game_dir().map(|p| p.to_path_buf()))
        .collect();

    assert_eq!(dirs, vec![steam, epic]);
}

#[test]
fn missing_volume_contributes_nothing() {
    let layout = Config::default().layout;
    let d = tempdir().unwrap();
    let missing = d.path().join("not-mounted");

    assert_eq!(discover_candidates(vec![missing], &layout).count(), 0);
}
