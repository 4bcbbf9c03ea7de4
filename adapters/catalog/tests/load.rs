use std::{fs, path::PathBuf, process};

use lucky_draw_catalog::{Catalog, CatalogError};
use lucky_draw_core::{OutcomeSource, ParticipantId, PrizeAmount};

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("lucky-draw-{}-{name}", process::id()));
    fs::write(&path, contents).expect("scratch file is writable");
    path
}

#[test]
fn loads_catalog_from_disk_and_serves_outcomes() {
    let path = scratch_file(
        "catalog.json",
        r#"{
            "A": {
                "name": "Central Team",
                "workers": [
                    { "name": "Ho Siu Lan", "employeeId": "EMP003003",
                      "prizeCounts": { "$1000": 1, "$100": 2 } }
                ]
            }
        }"#,
    );

    let catalog = Catalog::load(&path).expect("catalog loads");
    let _ = fs::remove_file(&path);

    let participant = catalog.find("HoSiuLan").expect("unique worker match");
    assert_eq!(participant.id(), &ParticipantId::new("CentralTeam-HoSiuLan"));
    assert_eq!(participant.display_name(), "Ho Siu Lan");
    assert_eq!(participant.selection().ticket_count, 3);

    let outcomes = catalog
        .outcome_list(participant.id())
        .expect("outcomes present");
    assert_eq!(outcomes.total_value(), 1200);
    assert_eq!(outcomes.get(2), Some(PrizeAmount::new(1000)));
}

#[test]
fn missing_file_reports_its_path() {
    let path = std::env::temp_dir().join("lucky-draw-definitely-missing.json");
    match Catalog::load(&path) {
        Err(CatalogError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}
