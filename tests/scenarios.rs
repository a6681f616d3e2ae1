use folder_twins::progress::SilentObserver;
use folder_twins::report::{write_comparison_csv, write_duplicates_csv};
use folder_twins::{
    CompareMode, DuplicateFinder, EngineConfig, Fingerprinter, TreeComparator, Tristate, WorkPool,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn copy_tree(from: &Path, to: &Path) {
    for entry in walkdir::WalkDir::new(from) {
        let entry = entry.unwrap();
        let target = to.join(entry.path().strip_prefix(from).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

#[test]
fn test_hello_hello_world_makes_one_group() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    write(dir.path(), "b.txt", b"hello");
    write(dir.path(), "c.txt", b"world");

    let config = EngineConfig::default();
    let pool = WorkPool::from_config(&config).unwrap();
    let fingerprinter = Fingerprinter::new(config.chunk_size);
    let report = DuplicateFinder::new(&config, &pool, &fingerprinter)
        .find(dir.path(), &SilentObserver)
        .unwrap();

    assert_eq!(report.total_files, 3);
    assert_eq!(report.errors, 0);
    assert_eq!(report.groups.len(), 1);

    let group = &report.groups[0];
    assert_eq!(group.size(), 5);
    let members: Vec<_> = group.members().iter().map(|m| m.relative()).collect();
    assert_eq!(members, vec!["a.txt", "b.txt"]);
    assert_eq!(report.wasted_space(), 5);

    let mut csv = Vec::new();
    write_duplicates_csv(&report, &mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.starts_with("checksum,size,count,paths\n"));
    assert!(csv.contains(",5,2,"));
}

#[test]
fn test_nested_duplicates_and_exclusions() {
    let dir = tempdir().unwrap();
    write(dir.path(), "photos/2020/img.jpg", b"jpeg bytes");
    write(dir.path(), "backup/img.jpg", b"jpeg bytes");
    write(dir.path(), "backup/other.jpg", b"JPEG BYTES");
    write(dir.path(), "backup/.DS_Store", b"jpeg bytes");
    write(dir.path(), "photos/._img.jpg", b"jpeg bytes");

    let config = EngineConfig::default().with_workers(3);
    let pool = WorkPool::from_config(&config).unwrap();
    let fingerprinter = Fingerprinter::new(config.chunk_size);
    let report = DuplicateFinder::new(&config, &pool, &fingerprinter)
        .find(dir.path(), &SilentObserver)
        .unwrap();

    assert_eq!(report.total_files, 3);
    assert_eq!(report.groups.len(), 1);
    let members: Vec<_> = report.groups[0].members().iter().map(|m| m.relative()).collect();
    assert_eq!(members, vec!["backup/img.jpg", "photos/2020/img.jpg"]);
}

#[test]
fn test_two_tree_scenario() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    write(a.path(), "x.txt", b"1");
    write(b.path(), "x.txt", b"2");
    write(b.path(), "y.txt", b"1");

    let config = EngineConfig::default();
    let pool = WorkPool::from_config(&config).unwrap();
    let fingerprinter = Fingerprinter::new(config.chunk_size);

    for mode in [CompareMode::Bytes, CompareMode::Digest] {
        let report = TreeComparator::new(&config, &pool, &fingerprinter, mode)
            .include_identical(true)
            .compare(a.path(), b.path(), &SilentObserver)
            .unwrap();

        assert_eq!(report.outcomes.len(), 2);

        let x = &report.outcomes[0];
        assert_eq!(x.relative(), "x.txt");
        assert!(x.in_a() && x.in_b());
        assert_eq!(x.size_equal(), Tristate::True);
        assert_eq!(x.content_equal(), Tristate::False);

        let y = &report.outcomes[1];
        assert_eq!(y.relative(), "y.txt");
        assert!(!y.in_a() && y.in_b());
        assert_eq!(y.size_equal(), Tristate::Unknown);
        assert_eq!(y.content_equal(), Tristate::Unknown);

        assert_eq!(report.only_in_a, 0);
        assert_eq!(report.only_in_b, 1);
        assert_eq!(report.different(), 1);
    }
}

#[test]
fn test_tree_compared_with_its_copy() {
    let original = tempdir().unwrap();
    write(original.path(), "readme.md", b"# hi");
    write(original.path(), "src/main.rs", b"fn main() {}");
    write(original.path(), "src/lib.rs", b"pub mod a;");
    write(original.path(), "data/blob.bin", &vec![7u8; 300_000]);
    write(original.path(), "data/empty", b"");

    let copy = tempdir().unwrap();
    copy_tree(original.path(), copy.path());

    let config = EngineConfig::default().with_chunk_size(4096);
    let pool = WorkPool::from_config(&config).unwrap();
    let fingerprinter = Fingerprinter::new(config.chunk_size);

    let report = TreeComparator::new(&config, &pool, &fingerprinter, CompareMode::Bytes)
        .include_identical(true)
        .compare(original.path(), copy.path(), &SilentObserver)
        .unwrap();

    assert_eq!(report.only_in_a, 0);
    assert_eq!(report.only_in_b, 0);
    assert_eq!(report.common, 5);
    assert_eq!(report.outcomes.len(), 5);
    for outcome in &report.outcomes {
        assert_eq!(outcome.size_equal(), Tristate::True, "{}", outcome.relative());
        assert_eq!(outcome.content_equal(), Tristate::True, "{}", outcome.relative());
    }

    let filtered = TreeComparator::new(&config, &pool, &fingerprinter, CompareMode::Bytes)
        .compare(original.path(), copy.path(), &SilentObserver)
        .unwrap();
    assert!(filtered.outcomes.is_empty());
    assert_eq!(filtered.same_content, 5);
}

#[test]
fn test_size_mismatch_never_reads_content() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    write(a.path(), "grown.log", b"short");
    write(b.path(), "grown.log", b"much longer now");
    write(a.path(), "same.log", b"abc");
    write(b.path(), "same.log", b"abd");

    let config = EngineConfig::default();
    let pool = WorkPool::from_config(&config).unwrap();
    let fingerprinter = Fingerprinter::new(config.chunk_size);
    let report = TreeComparator::new(&config, &pool, &fingerprinter, CompareMode::Digest)
        .compare(a.path(), b.path(), &SilentObserver)
        .unwrap();

    assert_eq!(report.common, 2);
    assert_eq!(report.size_mismatches, 1);
    assert_eq!(report.content_checks, 1);

    let grown = report
        .outcomes
        .iter()
        .find(|o| o.relative() == "grown.log")
        .unwrap();
    assert_eq!(grown.size_equal(), Tristate::False);
    assert_eq!(grown.content_equal(), Tristate::Unknown);

    let mut csv = Vec::new();
    write_comparison_csv(&report, CompareMode::Digest, &mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.contains("grown.log,True,True,False,\n"));
    assert!(csv.contains("same.log,True,True,True,False\n"));
}
