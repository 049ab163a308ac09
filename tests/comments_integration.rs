use std::fs;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use markview::app::{App, Clock};
use markview::comments::{HEADER_SIGNATURE, scan_comments};
use markview::pipeline::RenderOptions;
use markview::store::{JsonFileStore, RecentFiles};

const FIXTURE: &str = include_str!("fixtures/simple.md");

#[derive(Debug)]
struct StepClock(DateTime<Utc>);

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn app_in(dir: &std::path::Path, at: DateTime<Utc>) -> App<JsonFileStore> {
    let recent = RecentFiles::load(JsonFileStore::new(dir.join("recent.json"))).unwrap();
    App::new(RenderOptions::default(), recent).with_clock(Arc::new(StepClock(at)))
}

#[test]
fn test_review_session_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, FIXTURE).unwrap();
    let t0 = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();

    let mut app = app_in(dir.path(), t0);
    let mut model = app.open(&path);

    let first = "Quoted guidance";
    let start = FIXTURE.find(first).unwrap();
    let c1 = model.add_comment(start, start + first.len(), "Source?").unwrap();

    let source = fs::read_to_string(&path).unwrap();
    let second = "spread over two lines";
    let start = source.find(second).unwrap();
    let c2 = model.add_comment(start, start + second.len(), "Fine").unwrap();
    assert_eq!((c1.id.as_str(), c2.id.as_str()), ("COM-1", "COM-2"));

    let source = fs::read_to_string(&path).unwrap();
    assert_eq!(source.matches(HEADER_SIGNATURE).count(), 1);
    let spans = scan_comments(&source);
    assert_eq!(&source[spans[0].anchored_range()], first);
    assert_eq!(&source[spans[1].anchored_range()], second);

    model.update_comment("COM-1", "Cite the guide").unwrap();
    assert!(model.delete_comment("COM-2").unwrap());

    let bodies: Vec<_> = model
        .document()
        .comments
        .iter()
        .map(|c| (c.id.as_str(), c.body.as_str()))
        .collect();
    assert_eq!(bodies, [("COM-1", "Cite the guide")]);

    // The deleted COM-2 is not handed out again.
    let source = fs::read_to_string(&path).unwrap();
    let third = "Welcome";
    let start = source.find(third).unwrap();
    let c3 = model.add_comment(start, start + third.len(), "Hi").unwrap();
    assert_eq!(c3.id, "COM-3");
}

#[test]
fn test_recent_files_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, "# Notes\n").unwrap();
    let t0 = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();

    let mut app = app_in(dir.path(), t0);
    app.open(&path);
    drop(app);

    let app = app_in(dir.path(), t0);
    assert_eq!(app.recent_files().len(), 1);
    assert!(app.recent_files()[0].ends_with("notes.md"));
}
