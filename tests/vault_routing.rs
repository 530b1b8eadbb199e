//! End-to-end routing over a real vault directory

use assert_fs::TempDir;
use assert_fs::prelude::*;
use notemover::config::TriggerMode;
use notemover::{FsMover, RouteOutcome, Router, Settings, Trigger, Vault};
use predicates::prelude::*;

const LEGACY_SETTINGS: &str = r##"{
    "trigger_auto_manual": "Automatic",
    "use_regex_to_check_for_tags": false,
    "statusBar_trigger_indicator": true,
    "folder_tag_pattern": [
        {"folder": "Projects", "tag": "#project", "pattern": ""},
        {"folder": "Meetings", "tag": "", "pattern": "^Meeting"},
        {"folder": "Done", "rules": [{"frontmatterProperties": ["status: done"]}]}
    ],
    "use_regex_to_check_for_excluded_folder": false,
    "excluded_folder": [{"folder": "Archive"}]
}"##;

fn vault() -> TempDir {
    let temp = TempDir::new().unwrap();
    for dir in ["Projects", "Meetings", "Done", "Archive", "Inbox"] {
        temp.child(dir).create_dir_all().unwrap();
    }
    temp.child("settings.json").write_str(LEGACY_SETTINGS).unwrap();
    temp
}

fn settings(temp: &TempDir) -> Settings {
    Settings::load(Some(temp.child("settings.json").path())).unwrap()
}

#[test]
fn legacy_settings_load_as_groups() {
    let temp = vault();
    let settings = settings(&temp);

    assert_eq!(settings.trigger_auto_manual, TriggerMode::Automatic);
    assert!(settings.status_bar_trigger_indicator);
    assert_eq!(settings.groups.len(), 3);
    assert_eq!(settings.groups[0].rules[0].tags, vec!["#project"]);
    assert!(settings.groups[0].rules[0].patterns.is_empty());
    assert_eq!(settings.groups[1].rules[0].patterns, vec!["^Meeting"]);
    assert_eq!(settings.excluded[0].folder, "Archive");
}

#[test]
fn run_moves_matching_notes() {
    let temp = vault();
    temp.child("Plan.md")
        .write_str("Kickoff notes #project\n")
        .unwrap();
    temp.child("Inbox/Meeting 2024.md").write_str("agenda").unwrap();
    temp.child("Inbox/Finished.md")
        .write_str("---\nstatus: done\n---\nbody\n")
        .unwrap();
    temp.child("Inbox/Loose.md").write_str("nothing here").unwrap();

    let vault = Vault::new(temp.path());
    let router = Router::new(&settings(&temp), FsMover::new(temp.path()));
    let files = vault.files().unwrap();
    let results = router.route_all(&vault, &files);

    let moved = results.iter().filter(|(_, o)| o.is_moved()).count();
    assert_eq!(moved, 3);

    temp.child("Projects/Plan.md").assert(predicate::path::exists());
    temp.child("Meetings/Meeting 2024.md")
        .assert(predicate::path::exists());
    temp.child("Done/Finished.md").assert(predicate::path::exists());
    temp.child("Inbox/Loose.md").assert(predicate::path::exists());
    temp.child("Plan.md").assert(predicate::path::missing());
}

#[test]
fn dry_run_leaves_vault_untouched() {
    let temp = vault();
    temp.child("Plan.md").write_str("#project").unwrap();

    let vault = Vault::new(temp.path());
    let router = Router::new(&settings(&temp), FsMover::new(temp.path())).with_dry_run(true);
    let outcome = router
        .route_path(&vault, "Plan.md", &Trigger::Command)
        .unwrap();

    assert_eq!(
        outcome,
        RouteOutcome::WouldMove {
            folder: "Projects".to_string()
        }
    );
    temp.child("Plan.md").assert(predicate::path::exists());
}

#[test]
fn excluded_and_disabled_notes_stay() {
    let temp = vault();
    temp.child("Archive/Old.md").write_str("#project").unwrap();
    temp.child("Pinned.md")
        .write_str("---\nNoteMover: disable\ntags: [project]\n---\n")
        .unwrap();

    let vault = Vault::new(temp.path());
    let router = Router::new(&settings(&temp), FsMover::new(temp.path()));

    assert_eq!(
        router
            .route_path(&vault, "Archive/Old.md", &Trigger::Modified)
            .unwrap(),
        RouteOutcome::Excluded
    );
    assert_eq!(
        router
            .route_path(&vault, "Pinned.md", &Trigger::Command)
            .unwrap(),
        RouteOutcome::Disabled
    );
    temp.child("Archive/Old.md").assert(predicate::path::exists());
    temp.child("Pinned.md").assert(predicate::path::exists());
}

#[test]
fn collision_is_reported_without_moving() {
    let temp = vault();
    temp.child("Plan.md").write_str("#project").unwrap();
    temp.child("Projects/Plan.md").write_str("older").unwrap();

    let vault = Vault::new(temp.path());
    let router = Router::new(&settings(&temp), FsMover::new(temp.path()));
    let outcome = router
        .route_path(&vault, "Plan.md", &Trigger::Created)
        .unwrap();

    assert!(matches!(outcome, RouteOutcome::MoveFailed { .. }));
    temp.child("Plan.md").assert(predicate::path::exists());
    temp.child("Projects/Plan.md")
        .assert(predicate::str::contains("older").from_utf8().from_file_path());
}

#[test]
fn manual_mode_ignores_events_but_obeys_commands() {
    let temp = vault();
    temp.child("Plan.md").write_str("#project").unwrap();

    let mut settings = settings(&temp);
    settings.toggle_trigger();
    settings.save(Some(temp.child("settings.json").path())).unwrap();
    let settings = Settings::load(Some(temp.child("settings.json").path())).unwrap();
    assert_eq!(settings.trigger_auto_manual, TriggerMode::Manual);

    let vault = Vault::new(temp.path());
    let router = Router::new(&settings, FsMover::new(temp.path()));

    assert_eq!(
        router
            .route_path(&vault, "Plan.md", &Trigger::Modified)
            .unwrap(),
        RouteOutcome::TriggerManual
    );
    assert!(
        router
            .route_path(&vault, "Plan.md", &Trigger::Command)
            .unwrap()
            .is_moved()
    );
    temp.child("Projects/Plan.md").assert(predicate::path::exists());
}
