//! End-to-end conversion tests.
//!
//! These drive the library and the `sgf2ebook` binary against the stock
//! template, with a small shell script standing in for `sgf-render`. The
//! script understands just enough of the real command line (`-n` and `-o`)
//! to write one SVG per call.

#![cfg(unix)]

use sgf2ebook::config::{self, BookConfig};
use sgf2ebook::convert::{self, ConvertError};
use sgf2ebook::templates::Templates;
use std::fs::{self, File};
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tempfile::TempDir;
use zip::{CompressionMethod, ZipArchive};

const FAKE_RENDERER: &str = r#"#!/bin/sh
out=""
move=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    -n) move="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf '<svg xmlns="http://www.w3.org/2000/svg"><!-- move %s --></svg>' "$move" > "$out"
"#;

const FAILING_RENDERER: &str = "#!/bin/sh\necho 'cannot draw board' >&2\nexit 3\n";

struct Renderers {
    working: PathBuf,
    failing: PathBuf,
}

/// Scripts are written once, before any test spawns a process, so no
/// executable is still open for writing when it is run.
fn renderers() -> &'static Renderers {
    static RENDERERS: OnceLock<Renderers> = OnceLock::new();
    RENDERERS.get_or_init(|| {
        let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("sgf2ebook-renderers");
        fs::create_dir_all(&dir).unwrap();
        let write_script = |name: &str, body: &str| {
            let path = dir.join(name);
            fs::write(&path, body).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        };
        Renderers {
            working: write_script("fake-sgf-render", FAKE_RENDERER),
            failing: write_script("failing-sgf-render", FAILING_RENDERER),
        }
    })
}

fn stock_template_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("epub_template")
}

/// Copy `fixtures/games/` to a temp directory and return it.
fn setup_games() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/games");
    copy_dir_recursive(&src, &tmp.path().join("games")).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

fn config_with_renderer(executable: &Path) -> BookConfig {
    let mut config = BookConfig::default();
    config.renderer.executable = executable.to_path_buf();
    config
}

fn entry_names(book: &Path) -> Vec<String> {
    let mut archive = ZipArchive::new(File::open(book).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn read_entry(book: &Path, name: &str) -> String {
    let mut archive = ZipArchive::new(File::open(book).unwrap()).unwrap();
    let mut text = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    text
}

// =============================================================================
// Library pipeline
// =============================================================================

#[test]
fn directory_converts_to_one_book_per_record() {
    let renderer = renderers();
    let tmp = setup_games();
    let games = tmp.path().join("games");
    let out = tmp.path().join("out");
    let config = config_with_renderer(&renderer.working);
    let templates = Templates::load(&stock_template_dir()).unwrap();

    let records = convert::discover_records(&games).unwrap();
    assert_eq!(
        records,
        vec![games.join("2023-test-cup-1.sgf"), games.join("archive/friendly.sgf")]
    );

    let report = convert::convert_batch(&records, &out, &config, &templates, false, None);
    assert!(report.is_success(), "{:?}", report.failed);

    let outputs: Vec<PathBuf> = report.converted.iter().map(|b| b.output.clone()).collect();
    assert_eq!(outputs, vec![out.join("Test_Cup_1.epub"), out.join("friendly.epub")]);
    assert_eq!(report.converted[0].move_count, 5);
    assert_eq!(report.converted[1].move_count, 4);
}

#[test]
fn stock_book_layout() {
    let renderer = renderers();
    let tmp = setup_games();
    let source = tmp.path().join("games/2023-test-cup-1.sgf");
    let out = tmp.path().join("out");
    let config = config_with_renderer(&renderer.working);
    let templates = Templates::load(&stock_template_dir()).unwrap();

    let book = convert::convert_batch(
        std::slice::from_ref(&source),
        &out,
        &config,
        &templates,
        false,
        None,
    )
    .converted
    .remove(0);

    let names = entry_names(&book.output);
    assert_eq!(names[0], "mimetype");
    assert_eq!(
        names.iter().filter(|n| n.starts_with("EPUB/Images/")).count(),
        5
    );
    assert_eq!(names.iter().filter(|n| n.starts_with("EPUB/Text/")).count(), 5);
    assert!(names.contains(&"META-INF/container.xml".to_string()));
    assert!(names.contains(&"EPUB/Styles/style.css".to_string()));
    assert_eq!(names.len(), 15);

    let mut archive = ZipArchive::new(File::open(&book.output).unwrap()).unwrap();
    let mut mimetype = archive.by_index(0).unwrap();
    assert_eq!(mimetype.compression(), CompressionMethod::Stored);
    let mut marker = String::new();
    mimetype.read_to_string(&mut marker).unwrap();
    assert_eq!(marker, "application/epub+zip");
}

#[test]
fn stock_pages_and_manifests() {
    let renderer = renderers();
    let tmp = setup_games();
    let source = tmp.path().join("games/2023-test-cup-1.sgf");
    let out = tmp.path().join("out");
    let config = config_with_renderer(&renderer.working);
    let templates = Templates::load(&stock_template_dir()).unwrap();

    let book = convert::convert_record(
        &source,
        &out,
        &config,
        &templates,
        &sgf2ebook::render::SgfRenderBackend::new(config.renderer.clone()),
    )
    .unwrap();

    let first = read_entry(&book.output, "EPUB/Text/page_001.html");
    assert!(first.contains("../Images/diagram_001.svg"));
    assert!(first.contains("Black opens on the star point."));

    let last = read_entry(&book.output, "EPUB/Text/page_005.html");
    assert!(last.contains("B+2"));
    assert!(last.contains("Honinbo Shusaku"));

    let svg = read_entry(&book.output, "EPUB/Images/diagram_004.svg");
    assert!(svg.contains("move 4"));

    let opf = read_entry(&book.output, "EPUB/content.opf");
    assert!(opf.contains(&book.uuid));
    assert!(!opf.contains("{{ modified }}"));
    assert!(opf.contains(r#"<meta property="dcterms:modified">20"#));
    assert_eq!(opf.matches("<itemref ").count(), 5);

    let ncx = read_entry(&book.output, "EPUB/toc.ncx");
    assert!(ncx.contains(&book.uuid));
    assert_eq!(ncx.matches("<navPoint ").count(), 5);
}

#[test]
fn failing_renderer_fails_record_without_output() {
    let renderer = renderers();
    let tmp = setup_games();
    let source = tmp.path().join("games/2023-test-cup-1.sgf");
    let out = tmp.path().join("out");
    let config = config_with_renderer(&renderer.failing);
    let templates = Templates::load(&stock_template_dir()).unwrap();

    let report = convert::convert_batch(
        std::slice::from_ref(&source),
        &out,
        &config,
        &templates,
        false,
        None,
    );
    assert_eq!(report.failed.len(), 1);
    match &report.failed[0].error {
        ConvertError::Render(err) => assert!(err.to_string().contains("cannot draw board")),
        other => panic!("expected render error, got {other:?}"),
    }
    assert!(!out.join("Test_Cup_1.epub").exists());
}

#[test]
fn config_file_next_to_records_is_applied() {
    let tmp = setup_games();
    let games = tmp.path().join("games");
    let config = config::load_config(&config::config_root(&games)).unwrap();
    assert_eq!(config.book.creator, "Fixture Club");
    assert_eq!(config.book.language, "en");
}

// =============================================================================
// Binary
// =============================================================================

fn sgf2ebook() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sgf2ebook"))
}

#[test]
fn missing_input_exits_with_one() {
    renderers();
    let tmp = TempDir::new().unwrap();
    let status = sgf2ebook()
        .args(["convert", "-i"])
        .arg(tmp.path().join("missing"))
        .arg("-o")
        .arg(tmp.path().join("out"))
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn missing_input_without_subcommand_exits_with_one() {
    renderers();
    let tmp = TempDir::new().unwrap();
    let output = sgf2ebook()
        .arg("-i")
        .arg(tmp.path().join("missing"))
        .arg("-o")
        .arg(tmp.path().join("out"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn binary_converts_without_subcommand() {
    let renderer = renderers();
    let tmp = setup_games();
    let out = tmp.path().join("out");
    let output = sgf2ebook()
        .arg("-i")
        .arg(tmp.path().join("games/2023-test-cup-1.sgf"))
        .arg("-o")
        .arg(&out)
        .arg("--template-dir")
        .arg(stock_template_dir())
        .arg("--renderer")
        .arg(&renderer.working)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(out.join("Test_Cup_1.epub").is_file());
}

#[test]
fn binary_converts_directory() {
    let renderer = renderers();
    let tmp = setup_games();
    let out = tmp.path().join("out");
    let output = sgf2ebook()
        .args(["convert", "-i"])
        .arg(tmp.path().join("games"))
        .arg("-o")
        .arg(&out)
        .arg("--template-dir")
        .arg(stock_template_dir())
        .arg("--renderer")
        .arg(&renderer.working)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(out.join("Test_Cup_1.epub").is_file());
    assert!(out.join("friendly.epub").is_file());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Converted 2 of 2 records"));
}

#[test]
fn binary_exits_with_one_when_a_record_fails() {
    let renderer = renderers();
    let tmp = setup_games();
    let status = sgf2ebook()
        .args(["convert", "-i"])
        .arg(tmp.path().join("games"))
        .arg("-o")
        .arg(tmp.path().join("out"))
        .arg("--template-dir")
        .arg(stock_template_dir())
        .arg("--renderer")
        .arg(&renderer.failing)
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn binary_check_lists_records() {
    renderers();
    let tmp = setup_games();
    let output = sgf2ebook()
        .args(["check", "-i"])
        .arg(tmp.path().join("games"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("001 Test Cup, round 1 (5 moves, 2 comments)"));
    assert!(stdout.contains("Output: friendly.epub"));
}

#[test]
fn binary_gen_config_is_valid_toml() {
    renderers();
    let output = sgf2ebook().arg("gen-config").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let value: toml::Value = toml::from_str(&text).unwrap();
    assert!(value.get("renderer").is_some());
}
