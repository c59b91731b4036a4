//! Loading iconsets from directories and archives.

mod common;

use std::fs;

use common::*;
use iconset::{Iconset, IconsetErrorKind, LoadOptions};

#[test]
fn test_load_directory_bundle() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_dir(dir.path(), &bundle_files());

    let mut set = Iconset::new();
    let report = set.try_load(dir.path()).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.loaded(), ["smile", "wink", "still", "dot"]);

    assert_eq!(set.name(), "Faces");
    assert_eq!(set.version(), "1.0");
    assert_eq!(set.description(), "Test faces");
    assert_eq!(set.creation(), "2024-01-01");
    assert_eq!(set.home_url(), "https://example.org");
    assert_eq!(set.authors().len(), 1);
    assert_eq!(set.authors()[0].email.as_deref(), Some("alice@example.org"));
    assert_eq!(set.file_name(), Some(dir.path()));
    assert_eq!(
        set.info().get("http://example.org/extra").map(String::as_str),
        Some("payload")
    );
    assert_eq!(set.icon_names().collect::<Vec<_>>(), vec!["smile", "wink", "still", "dot"]);
}

#[test]
fn test_png_beats_gif() {
    let dir = tempfile::tempdir().unwrap();
    write_dir(dir.path(), &bundle_files());

    let mut set = Iconset::new();
    assert!(set.load_with_options(dir.path(), &LoadOptions::new()));

    let smile = set.icon("smile").unwrap();
    assert!(!smile.is_animated());
    assert_eq!(smile.image().pixel(0, 0), Some(RED));
}

#[test]
fn test_animation_and_collapse() {
    let dir = tempfile::tempdir().unwrap();
    write_dir(dir.path(), &bundle_files());

    let mut set = Iconset::new();
    assert!(set.load_with_options(dir.path(), &LoadOptions::new()));

    let wink = set.icon("wink").unwrap();
    assert!(wink.is_animated());
    assert_eq!(wink.animation().unwrap().frame_count(), 3);
    assert_eq!(wink.image().pixel(0, 0), Some(RED));

    let still = set.icon("still").unwrap();
    assert!(!still.is_animated());
    assert_eq!(still.image().pixel(0, 0), Some(BLUE));
}

#[test]
fn test_xpm_graphic() {
    let dir = tempfile::tempdir().unwrap();
    write_dir(dir.path(), &bundle_files());

    let mut set = Iconset::new();
    assert!(set.load_with_options(dir.path(), &LoadOptions::new()));

    let dot = set.icon("dot").unwrap();
    assert_eq!(dot.image().dimensions(), (2, 2));
    assert_eq!(dot.image().pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(dot.image().pixel(1, 0).map(|p| p[3]), Some(0));
}

#[test]
fn test_text_and_pattern() {
    let dir = tempfile::tempdir().unwrap();
    write_dir(dir.path(), &bundle_files());

    let mut set = Iconset::new();
    assert!(set.load_with_options(dir.path(), &LoadOptions::new()));

    let smile = set.icon("smile").unwrap();
    assert_eq!(smile.text().len(), 3);
    assert_eq!(smile.text().get("de"), Some(":-)"));
    let pattern = smile.pattern().unwrap();
    assert!(pattern.is_match("hello :)"));
    assert!(pattern.is_match("hello :-)"));
    assert!(!pattern.is_match("hello ;)"));

    assert!(set.icon("still").unwrap().pattern().is_none());
}

#[test]
fn test_directory_sound_is_absolute() {
    let dir = tempfile::tempdir().unwrap();
    write_dir(dir.path(), &bundle_files());

    let mut set = Iconset::new();
    assert!(set.load_with_options(dir.path(), &LoadOptions::new()));

    let sound = set.icon("smile").unwrap().sound().unwrap().to_path_buf();
    assert!(sound.is_absolute());
    assert!(sound.ends_with("smile.wav"));
    assert!(sound.exists());
    assert!(set.icon("wink").unwrap().sound().is_none());
}

#[test]
fn test_partial_failure_keeps_good_icons() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_dir(
        dir.path(),
        &[
            (
                "icondef.xml",
                br#"<icondef>
                  <icon><object mime="image/png">a.png</object><x xmlns="name">a</x></icon>
                  <icon><object mime="image/png">bad.png</object><x xmlns="name">bad</x></icon>
                  <icon><object mime="image/png">missing.png</object></icon>
                  <icon><object mime="image/png">c.png</object><x xmlns="name">c</x></icon>
                  <icon><object mime="image/tiff">t.tif</object><x xmlns="name">tiff</x></icon>
                </icondef>"#
                    .to_vec(),
            ),
            ("a.png", png(RED)),
            ("bad.png", b"not an image".to_vec()),
            ("c.png", png(GREEN)),
            ("t.tif", png(BLUE)),
        ],
    );

    let mut set = Iconset::new();
    let report = set.try_load_with_options(dir.path(), &LoadOptions::new()).unwrap();
    assert!(!report.is_complete());
    assert_eq!(report.loaded(), ["a", "c"]);
    assert_eq!(report.failed().len(), 3);
    assert_eq!(report.failed()[0], "bad");
    assert!(report.failed()[1].starts_with("icon_"));
    assert_eq!(report.failed()[2], "tiff");
    assert!(set.icon("tiff").is_none());

    assert_eq!(set.len(), 2);
    assert_eq!(set.file_name(), Some(dir.path()));

    let mut again = Iconset::new();
    assert!(!again.load(dir.path()));
    assert_eq!(again.len(), 2);
}

#[test]
fn test_hostile_xpm_header_fails_only_its_icon() {
    let dir = tempfile::tempdir().unwrap();
    write_dir(
        dir.path(),
        &[
            (
                "icondef.xml",
                br#"<icondef>
                  <icon><object mime="image/x-xpm">huge.xpm</object><x xmlns="name">huge</x></icon>
                  <icon><object mime="image/x-xpm">wide.xpm</object><x xmlns="name">wide</x></icon>
                  <icon><object mime="image/png">a.png</object><x xmlns="name">a</x></icon>
                </icondef>"#
                    .to_vec(),
            ),
            (
                "huge.xpm",
                b"/* XPM */ { \"1 1 18446744073709551615 1\", \"a c #FF0000\", \"a\" };".to_vec(),
            ),
            (
                "wide.xpm",
                b"/* XPM */ { \"100000 100000 1 1\", \"a c #FF0000\", \"a\" };".to_vec(),
            ),
            ("a.png", png(RED)),
        ],
    );

    let mut set = Iconset::new();
    let report = set.try_load_with_options(dir.path(), &LoadOptions::new()).unwrap();
    assert_eq!(report.loaded(), ["a"]);
    assert_eq!(report.failed(), ["huge", "wide"]);
    assert_eq!(set.len(), 1);
}

#[test]
fn test_unnamed_icons_get_increasing_names() {
    let dir = tempfile::tempdir().unwrap();
    write_dir(
        dir.path(),
        &[
            (
                "icondef.xml",
                br#"<icondef>
                  <icon><object mime="image/png">a.png</object></icon>
                  <icon><object mime="image/png">a.png</object></icon>
                </icondef>"#
                    .to_vec(),
            ),
            ("a.png", png(RED)),
        ],
    );

    let mut set = Iconset::new();
    assert!(set.load_with_options(dir.path(), &LoadOptions::new()));
    let names: Vec<String> = set.icon_names().map(String::from).collect();
    assert_eq!(names.len(), 2);

    let number = |name: &str| name.strip_prefix("icon_").unwrap().parse::<usize>().unwrap();
    assert!(number(&names[1]) > number(&names[0]));
}

#[test]
fn test_type_hint_forces_still_gif() {
    let dir = tempfile::tempdir().unwrap();
    write_dir(
        dir.path(),
        &[
            (
                "icondef.xml",
                br#"<icondef>
                  <icon>
                    <object mime="image/gif">anim.gif</object>
                    <x xmlns="type">image</x>
                    <x xmlns="name">flat</x>
                  </icon>
                </icondef>"#
                    .to_vec(),
            ),
            ("anim.gif", gif(&[RED, GREEN])),
        ],
    );

    let mut set = Iconset::new();
    assert!(set.load_with_options(dir.path(), &LoadOptions::new()));
    let flat = set.icon("flat").unwrap();
    assert!(!flat.is_animated());
    assert_eq!(flat.image().pixel(0, 0), Some(RED));
}

#[test]
fn test_manifest_errors_leave_set_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut set = Iconset::new();

    let err = set.try_load(dir.path()).unwrap_err();
    assert_eq!(err.kind(), IconsetErrorKind::ManifestMissing);

    fs::write(dir.path().join("icondef.xml"), b"<icondef><icon></icondef>").unwrap();
    let err = set.try_load(dir.path()).unwrap_err();
    assert_eq!(err.kind(), IconsetErrorKind::ManifestMalformed);

    fs::write(dir.path().join("icondef.xml"), b"<iconset/>").unwrap();
    assert!(!set.load(dir.path()));

    assert!(set.is_empty());
    assert_eq!(set.name(), "Unnamed");
    assert!(set.file_name().is_none());

    let err = set.try_load(dir.path().join("nowhere.tar")).unwrap_err();
    assert_eq!(err.kind(), IconsetErrorKind::UnsupportedSource);
}

#[test]
fn test_archive_under_stem_folder() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("faces.jisp");
    write_zip(&archive, "faces", &bundle_files());
    let unpack = dir.path().join("unpacked");

    let mut set = Iconset::new();
    let report = set
        .try_load_with_options(&archive, &LoadOptions::new().unpack_dir(&unpack))
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(report.sounds_skipped(), 0);
    assert_eq!(set.len(), 4);
    assert_eq!(set.file_name(), Some(archive.as_path()));

    let sound = set.icon("smile").unwrap().sound().unwrap().to_path_buf();
    assert!(sound.starts_with(&unpack));
    assert_eq!(fs::read(&sound).unwrap(), b"RIFF....WAVE");

    let absolute = std::path::absolute(&archive).unwrap();
    let expected = iconset::unpacked_sound_name(&absolute, "smile.wav");
    assert_eq!(sound.file_name().unwrap().to_str(), Some(expected.as_str()));
}

#[test]
fn test_archive_at_root_without_unpack_dir() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("Faces.ZIP");
    write_zip(&archive, "", &bundle_files());

    let mut set = Iconset::new();
    let report = set
        .try_load_with_options(&archive, &LoadOptions::new())
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(report.sounds_skipped(), 1);
    assert!(set.icon("smile").unwrap().sound().is_none());
    assert!(set.icon("wink").unwrap().is_animated());
}

#[test]
fn test_loading_twice_replaces_by_name() {
    let dir = tempfile::tempdir().unwrap();
    write_dir(dir.path(), &bundle_files());

    let mut set = Iconset::new();
    assert!(set.load_with_options(dir.path(), &LoadOptions::new()));
    let snapshot = set.clone();
    assert!(set.load_with_options(dir.path(), &LoadOptions::new()));

    assert_eq!(set.len(), 4);
    assert_eq!(set.authors().len(), 2);
    assert_eq!(snapshot.authors().len(), 1);
    assert!(!set.shares_data_with(&snapshot));
}
