use std::io::Write as _;

use capsule_archive::Archive;

fn build_zip(entries: &[(&str, &[u8])]) -> tempfile::TempPath {
    let file = tempfile::NamedTempFile::new().unwrap();
    {
        let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
        let options = zip::write::FileOptions::<()>::default();
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }
    file.into_temp_path()
}

#[test]
fn extracts_nested_directories_and_preserves_contents() {
    let zip_path = build_zip(&[
        ("lib/a.jar", b"jar-a"),
        ("lib/org.example/b.jar", b"jar-b"),
        ("META-INF/APP-MANIFEST.MF", b"Application-Class: Main\n"),
    ]);
    let mut archive = Archive::open(&zip_path).unwrap();
    let dest = tempfile::tempdir().unwrap();
    archive.extract_to(dest.path(), |_| true).unwrap();

    assert_eq!(std::fs::read(dest.path().join("lib/a.jar")).unwrap(), b"jar-a");
    assert_eq!(
        std::fs::read(dest.path().join("lib/org.example/b.jar")).unwrap(),
        b"jar-b"
    );
    assert!(dest.path().join("META-INF/APP-MANIFEST.MF").exists());
}

#[test]
fn filter_excludes_meta_inf_and_signature_entries() {
    let zip_path = build_zip(&[
        ("META-INF/CAPSULE.SF", b"signature"),
        ("app/Main.class", b"bytecode"),
    ]);
    let mut archive = Archive::open(&zip_path).unwrap();
    let dest = tempfile::tempdir().unwrap();
    archive
        .extract_to(dest.path(), |n| !capsule_archive::is_signature_entry(n))
        .unwrap();

    assert!(!dest.path().join("META-INF/CAPSULE.SF").exists());
    assert!(dest.path().join("app/Main.class").exists());
}

#[test]
fn rejects_zip_slip_parent_escape() {
    let zip_path = build_zip(&[("../../etc/passwd", b"pwned")]);
    let mut archive = Archive::open(&zip_path).unwrap();
    let dest = tempfile::tempdir().unwrap();
    let result = archive.extract_to(dest.path(), |_| true);
    assert!(result.is_err());
}

#[test]
fn rejects_zip_slip_absolute_path() {
    let zip_path = build_zip(&[("/tmp/evil.txt", b"pwned")]);
    let mut archive = Archive::open(&zip_path).unwrap();
    let dest = tempfile::tempdir().unwrap();
    let result = archive.extract_to(dest.path(), |_| true);
    assert!(result.is_err());
}

#[test]
fn modified_time_matches_file_metadata() {
    let zip_path = build_zip(&[("a.txt", b"1")]);
    let archive = Archive::open(&zip_path).unwrap();
    let expected = zip_path.metadata().unwrap().modified().unwrap();
    assert_eq!(archive.modified_time().unwrap(), expected);
}
