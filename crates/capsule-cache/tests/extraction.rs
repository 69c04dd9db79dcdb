use std::io::Write as _;
use std::thread;
use std::time::Duration;

use capsule_archive::Archive;
use capsule_cache::{AppCache, CacheContext};
use capsule_manifest::{Manifest, OsName, ResolutionContext};

fn ctx() -> ResolutionContext {
    ResolutionContext {
        os: OsName::current(),
        runtime_major: 17,
        mode: None,
    }
}

fn build_capsule(entries: &[(&str, &[u8])]) -> tempfile::TempPath {
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

fn open_and_parse(path: &std::path::Path) -> (Archive, Manifest) {
    let mut archive = Archive::open(path).unwrap();
    let manifest = Manifest::from_archive(&mut archive).unwrap();
    (archive, manifest)
}

#[test]
fn prepare_extracts_when_native_libs_declared() {
    let archive_path = build_capsule(&[
        (
            "META-INF/APP-MANIFEST.MF",
            b"Application-Class: com.example.Main\nNative-Dependencies-Linux: com.example:native:1.0\n",
        ),
        ("lib/native/libfoo.so", b"native-bytes"),
    ]);
    let (mut archive, manifest) = open_and_parse(&archive_path);
    let root = tempfile::tempdir().unwrap();
    let id = AppCache::id_for(&manifest, &ctx()).unwrap();

    let mut cx = CacheContext {
        archive: &mut archive,
        manifest: &manifest,
        ctx: &ctx(),
        reset: false,
    };
    let dest = AppCache::prepare(root.path(), &id, None, &mut cx).unwrap();
    let dest = dest.expect("native dependencies should trigger extraction");
    assert_eq!(
        std::fs::read(dest.join("lib/native/libfoo.so")).unwrap(),
        b"native-bytes"
    );
    assert!(dest.join(".extracted").exists());
}

#[test]
fn prepare_skips_extraction_when_nothing_requires_it() {
    let archive_path = build_capsule(&[(
        "META-INF/APP-MANIFEST.MF",
        b"Application-Class: com.example.Main\n",
    )]);
    let (mut archive, manifest) = open_and_parse(&archive_path);
    let root = tempfile::tempdir().unwrap();
    let id = AppCache::id_for(&manifest, &ctx()).unwrap();

    let mut cx = CacheContext {
        archive: &mut archive,
        manifest: &manifest,
        ctx: &ctx(),
        reset: false,
    };
    let dest = AppCache::prepare(root.path(), &id, None, &mut cx).unwrap();
    assert!(dest.is_none());
}

#[test]
fn prepare_is_idempotent_across_repeated_calls() {
    let archive_path = build_capsule(&[(
        "META-INF/APP-MANIFEST.MF",
        b"Application-Class: com.example.Main\nDependencies: org.example:app:1.0\n",
    )]);
    let root = tempfile::tempdir().unwrap();

    let (mut archive, manifest) = open_and_parse(&archive_path);
    let id = AppCache::id_for(&manifest, &ctx()).unwrap();
    let first = {
        let mut cx = CacheContext {
            archive: &mut archive,
            manifest: &manifest,
            ctx: &ctx(),
            reset: false,
        };
        AppCache::prepare(root.path(), &id, None, &mut cx)
            .unwrap()
            .unwrap()
    };
    std::fs::write(first.join("marker.txt"), b"still here").unwrap();

    // A second prepare call against an unchanged archive must not re-extract
    // (the marker written above should survive).
    thread::sleep(Duration::from_millis(10));
    let (mut archive2, manifest2) = open_and_parse(&archive_path);
    let second = {
        let mut cx = CacheContext {
            archive: &mut archive2,
            manifest: &manifest2,
            ctx: &ctx(),
            reset: false,
        };
        AppCache::prepare(root.path(), &id, None, &mut cx)
            .unwrap()
            .unwrap()
    };
    assert_eq!(first, second);
    assert!(second.join("marker.txt").exists());
}

#[test]
fn reset_deletes_the_extracted_directory() {
    let archive_path = build_capsule(&[(
        "META-INF/APP-MANIFEST.MF",
        b"Application-Class: com.example.Main\nDependencies: org.example:app:1.0\n",
    )]);
    let (mut archive, manifest) = open_and_parse(&archive_path);
    let root = tempfile::tempdir().unwrap();
    let id = AppCache::id_for(&manifest, &ctx()).unwrap();

    let dest = {
        let mut cx = CacheContext {
            archive: &mut archive,
            manifest: &manifest,
            ctx: &ctx(),
            reset: false,
        };
        AppCache::prepare(root.path(), &id, None, &mut cx)
            .unwrap()
            .unwrap()
    };
    assert!(dest.is_dir());
    AppCache::reset(root.path(), &id).unwrap();
    assert!(!dest.is_dir());
}
