use std::io::Read;
use std::path::{Path, PathBuf};

/// Resolve a fixture file by name from tests/fixtures/
pub fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    assert!(path.exists(), "fixture not found: {}", path.display());
    path
}

/// Basic structural validation of an EPUB file
#[allow(dead_code)]
pub fn assert_valid_epub(path: &Path) {
    let file = std::fs::File::open(path).expect("open epub");
    let mut archive = zip::ZipArchive::new(file).expect("open zip");

    let mimetype = archive.by_index(0).expect("first entry");
    assert_eq!(mimetype.name(), "mimetype");
    assert_eq!(mimetype.compression(), zip::CompressionMethod::Stored);
    drop(mimetype);

    let mut mimetype = archive.by_name("mimetype").expect("mimetype entry");
    let mut content = String::new();
    mimetype.read_to_string(&mut content).expect("read mimetype");
    assert_eq!(content.trim(), "application/epub+zip");
    drop(mimetype);

    archive
        .by_name("META-INF/container.xml")
        .expect("container.xml");
}

/// Read one text entry out of an EPUB archive.
#[allow(dead_code)]
pub fn read_entry(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).expect("open epub");
    let mut archive = zip::ZipArchive::new(file).expect("open zip");
    let mut entry = archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("entry not found: {name}"));
    let mut content = String::new();
    entry.read_to_string(&mut content).expect("read entry");
    content
}

/// All entry names in an EPUB archive.
#[allow(dead_code)]
pub fn entry_names(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).expect("open epub");
    let archive = zip::ZipArchive::new(file).expect("open zip");
    archive.file_names().map(String::from).collect()
}
