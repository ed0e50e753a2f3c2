use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tracing_test::traced_test;
use xr_db::read::checksum;
use xr_db::scrambler::{Scrambler, ScramblerKey};
use xr_db::types::CHUNK_COMPRESSED;
use xr_db::{lzhuf, DbVersion};
use xr_vfs::text::HOST_LINE_SEPARATOR;
use xr_vfs::{
    DiffStatus, ExtractOptions, GlobPattern, LayerId, LayeredFs, ListMode, TextEncoding,
};

fn record(name: &str, size: u32, crc: u32, offset: u32) -> Vec<u8> {
    let mut out = ((name.len() + 16) as u16).to_le_bytes().to_vec();
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&offset.to_le_bytes());
    out
}

/// Write a 2947ru archive: DATA chunk first, scrambled + packed HEADER chunk after it.
fn write_archive(path: &Path, files: &[(&str, &[u8])]) {
    let mut data = Vec::new();
    let mut header = Vec::new();
    for (name, bytes) in files {
        let offset = 8 + data.len() as u32;
        data.extend_from_slice(bytes);
        header.extend(record(name, bytes.len() as u32, checksum(bytes), offset));
    }
    let packed = Scrambler::new(ScramblerKey::Ru).scramble(&lzhuf::encode(&header));

    let mut out = 0u32.to_le_bytes().to_vec();
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&data);
    out.extend_from_slice(&(1u32 | CHUNK_COMPRESSED).to_le_bytes());
    out.extend_from_slice(&(packed.len() as u32).to_le_bytes());
    out.extend_from_slice(&packed);
    fs::write(path, out).unwrap();
}

fn build_fs(dir: &Path, archives: &[(&str, &[(&str, &[u8])])]) -> LayeredFs {
    let mut layered = LayeredFs::new();
    for (name, files) in archives {
        let path = dir.join(name);
        write_archive(&path, files);
        layered.add_archive(&path, DbVersion::V2947Ru).unwrap();
    }
    layered
}

#[traced_test]
#[test]
fn overlay_resolution_law() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[
            ("gamedata.db0", &[("cfg\\x.ltx", "a=1\r\n".as_bytes())][..]),
            ("gamedata.db1", &[("cfg\\x.ltx", "a=2\r\n".as_bytes())][..]),
        ],
    );
    layered.seal();

    let pattern = GlobPattern::new("cfg/x.ltx").unwrap();
    let rows = layered.list(&pattern, ListMode::Merged);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].layer, LayerId::Archive(1));
    assert_eq!(layered.read("cfg/x.ltx").unwrap(), b"a=2\r\n");

    let resolved = layered.resolve("cfg/x.ltx").unwrap();
    assert_eq!(resolved.winner, LayerId::Archive(1));
    assert_eq!(resolved.layers, vec![LayerId::Archive(1), LayerId::Archive(0)]);

    // without the higher layer the older copy wins again
    let mut lower_only = build_fs(
        dir.path(),
        &[("gamedata.db0", &[("cfg\\x.ltx", "a=1\r\n".as_bytes())][..])],
    );
    lower_only.seal();
    assert_eq!(lower_only.read("cfg/x.ltx").unwrap(), b"a=1\r\n");
}

#[test]
fn overlay_directory_outranks_archives() {
    let dir = tempfile::tempdir().unwrap();
    let loose = dir.path().join("gamedata");
    fs::create_dir_all(loose.join("cfg")).unwrap();
    fs::write(loose.join("cfg/x.ltx"), b"a=3\n").unwrap();

    let mut layered = build_fs(
        dir.path(),
        &[("gamedata.db0", &[("cfg\\x.ltx", "a=1\r\n".as_bytes())][..])],
    );
    layered.set_overlay(&loose).unwrap();
    layered.seal();

    let resolved = layered.resolve("cfg/x.ltx").unwrap();
    assert_eq!(resolved.winner, LayerId::Overlay);
    assert_eq!(layered.read("cfg/x.ltx").unwrap(), b"a=3\n");

    let rows = layered.list(&GlobPattern::match_all(), ListMode::Merged);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].layer, LayerId::Overlay);
}

#[test]
fn per_layer_split_shows_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[
            (
                "gamedata.db0",
                &[
                    ("cfg\\x.ltx", "a=1\r\n".as_bytes()),
                    ("cfg\\old.ltx", "o=1\r\n".as_bytes()),
                ][..],
            ),
            ("gamedata.db1", &[("cfg\\x.ltx", "a=2\r\n".as_bytes())][..]),
        ],
    );
    layered.seal();

    let pattern = GlobPattern::new("cfg/x.ltx").unwrap();
    let rows = layered.list(&pattern, ListMode::PerLayer);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].layer, LayerId::Archive(0));
    assert_eq!(rows[1].layer, LayerId::Archive(1));
}

#[test]
fn extract_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[
            ("gamedata.db0", &[("cfg\\x.ltx", "a=1\r\n".as_bytes())][..]),
            ("gamedata.db1", &[("cfg\\x.ltx", "a=2\r\n".as_bytes())][..]),
        ],
    );
    layered.seal();

    let dest = dir.path().join("out");
    let pattern = GlobPattern::new("cfg/*").unwrap();
    let report = layered
        .extract(&pattern, &dest, &ExtractOptions::default())
        .unwrap();
    assert_eq!((report.checked, report.written, report.skipped), (1, 1, 0));
    assert!(report.failures.is_empty());

    let written = fs::read_to_string(dest.join("cfg/x.ltx")).unwrap();
    assert_eq!(written, format!("a=2{HOST_LINE_SEPARATOR}"));
}

#[test]
fn extract_is_idempotent_without_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[(
            "gamedata.db0",
            &[
                ("cfg\\x.ltx", "a=1\r\n".as_bytes()),
                ("cfg\\y.ltx", "b=2\r\n".as_bytes()),
            ][..],
        )],
    );
    layered.seal();

    let dest = dir.path().join("out");
    let pattern = GlobPattern::match_all();
    let first = layered
        .extract(&pattern, &dest, &ExtractOptions::default())
        .unwrap();
    assert_eq!((first.checked, first.written, first.skipped), (2, 2, 0));
    let contents = fs::read(dest.join("cfg/x.ltx")).unwrap();

    let second = layered
        .extract(&pattern, &dest, &ExtractOptions::default())
        .unwrap();
    assert_eq!((second.checked, second.written, second.skipped), (2, 0, 2));
    assert_eq!(fs::read(dest.join("cfg/x.ltx")).unwrap(), contents);
}

#[test]
fn extract_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[("gamedata.db0", &[("cfg\\x.ltx", "a=1\r\n".as_bytes())][..])],
    );
    layered.seal();

    let dest = dir.path().join("out");
    let options = ExtractOptions {
        dry_run: true,
        ..Default::default()
    };
    let report = layered
        .extract(&GlobPattern::match_all(), &dest, &options)
        .unwrap();
    assert_eq!((report.checked, report.written, report.skipped), (1, 1, 0));
    assert!(!dest.exists());
}

#[test]
fn extract_raw_keeps_source_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[("gamedata.db0", &[("cfg\\x.ltx", "a=1\r\n".as_bytes())][..])],
    );
    layered.seal();

    let dest = dir.path().join("out");
    let options = ExtractOptions {
        encoding: TextEncoding::Raw,
        ..Default::default()
    };
    layered
        .extract(&GlobPattern::match_all(), &dest, &options)
        .unwrap();
    assert_eq!(fs::read(dest.join("cfg/x.ltx")).unwrap(), b"a=1\r\n");
}

#[test]
fn extract_decodes_windows_1251() {
    // "Зона" in the archive's source encoding
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[("gamedata.db0", &[("text\\rus.txt", &[0xc7u8, 0xee, 0xed, 0xe0][..])][..])],
    );
    layered.seal();

    let dest = dir.path().join("out");
    layered
        .extract(&GlobPattern::match_all(), &dest, &ExtractOptions::default())
        .unwrap();
    assert_eq!(fs::read_to_string(dest.join("text/rus.txt")).unwrap(), "Зона");
}

#[traced_test]
#[test]
fn diff_reports_added_line() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[("gamedata.db0", &[("cfg\\x.ltx", "line1\r\nline2\r\n".as_bytes())][..])],
    );
    layered.seal();

    let os_root = dir.path().join("gamedata");
    fs::create_dir_all(os_root.join("cfg")).unwrap();
    fs::write(os_root.join("cfg/x.ltx"), b"line1\nline2\nline3\n").unwrap();

    let outcome = layered
        .diff(&GlobPattern::match_all(), &os_root, TextEncoding::Utf8)
        .unwrap();
    assert_eq!(outcome.summary(), "compared=1 modified=1 os_missing=0");

    let modified = &outcome.files[0];
    assert_eq!(modified.status, DiffStatus::Modified);
    let unified = modified.unified.as_deref().unwrap();
    assert!(unified.contains("--- gamedata.db0:cfg/x.ltx"));
    assert!(unified.contains("+++ OS:"));
    assert!(unified.contains("@@"));
    assert!(unified.contains("+line3"));
}

#[test]
fn diff_counts_missing_os_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[(
            "gamedata.db0",
            &[
                ("cfg\\x.ltx", "a=1\r\n".as_bytes()),
                ("mesh\\a.ogf", &[0x01u8, 0x02][..]),
            ][..],
        )],
    );
    layered.seal();

    let os_root = dir.path().join("empty");
    fs::create_dir_all(&os_root).unwrap();

    let outcome = layered
        .diff(&GlobPattern::match_all(), &os_root, TextEncoding::Utf8)
        .unwrap();
    // the binary mesh is not a text path and never enters the diff
    assert_eq!(outcome.summary(), "compared=0 modified=0 os_missing=1");
    assert_eq!(outcome.files[0].status, DiffStatus::OsMissing);
}

#[test]
fn diff_equal_sides_are_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[("gamedata.db0", &[("cfg\\x.ltx", "same\r\ncontent\r\n".as_bytes())][..])],
    );
    layered.seal();

    let os_root = dir.path().join("gamedata");
    fs::create_dir_all(os_root.join("cfg")).unwrap();
    fs::write(os_root.join("cfg/x.ltx"), b"same\ncontent\n").unwrap();

    let outcome = layered
        .diff(&GlobPattern::match_all(), &os_root, TextEncoding::Utf8)
        .unwrap();
    assert_eq!(outcome.summary(), "compared=1 modified=0 os_missing=0");
    assert_eq!(outcome.files[0].status, DiffStatus::Unchanged);
}

#[test]
fn unmatched_pattern_is_empty_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[("gamedata.db0", &[("cfg\\x.ltx", "a=1\r\n".as_bytes())][..])],
    );
    layered.seal();

    let pattern = GlobPattern::new("sounds/*.ogg").unwrap();
    assert!(layered.list(&pattern, ListMode::Merged).is_empty());
    assert_eq!(layered.count(&pattern), 0);

    let report = layered
        .extract(&pattern, &dir.path().join("out"), &ExtractOptions::default())
        .unwrap();
    assert_eq!((report.checked, report.written, report.skipped), (0, 0, 0));
}

#[test]
fn glob_filter_narrows_listing() {
    let dir = tempfile::tempdir().unwrap();
    let mut layered = build_fs(
        dir.path(),
        &[(
            "gamedata.db0",
            &[
                ("cfg\\system.ltx", "s\r\n".as_bytes()),
                ("scripts\\_g.script", "g\r\n".as_bytes()),
                ("textures\\ui.dds", &[0x00u8][..]),
            ][..],
        )],
    );
    layered.seal();

    assert_eq!(layered.count(&GlobPattern::new("*.ltx").unwrap()), 1);
    assert_eq!(layered.count(&GlobPattern::new("*.script").unwrap()), 1);
    assert_eq!(layered.count(&GlobPattern::match_all()), 3);

    let rows = layered.list(&GlobPattern::match_all(), ListMode::Merged);
    let paths: Vec<&str> = rows.iter().map(|r| r.path.as_str()).collect();
    // path-sorted regardless of record order
    assert_eq!(paths, vec!["cfg/system.ltx", "scripts/_g.script", "textures/ui.dds"]);
}
