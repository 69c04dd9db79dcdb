//! End-to-end scenarios driven through `Launcher::run` against in-memory
//! ZIP archives, with a fake `java` executable standing in for a real JVM
//! so the full pipeline (archive -> manifest -> cache -> runtime -> command
//! -> spawn) runs without requiring a JDK in the test environment.

#![cfg(unix)]

use std::io::Write as _;
use std::os::unix::fs::PermissionsExt as _;

use capsule_launcher::{ExitCode, Launcher, LauncherConfig};

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

/// A fake JDK home: `bin/java -version` reports a fixed version on stderr;
/// any other invocation records its argv (one per line) to `out_file` and
/// exits 0.
struct FakeJdk {
    _dir: tempfile::TempDir,
    home: std::path::PathBuf,
    out_file: std::path::PathBuf,
}

fn fake_jdk() -> FakeJdk {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let out_file = dir.path().join("argv.txt");
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then\n  echo 'openjdk version \"17.0.1\"' 1>&2\n  exit 0\nfi\nprintf '%s\\n' \"$*\" > {}\nexit 0\n",
        out_file.display()
    );
    let java_path = bin.join("java");
    std::fs::write(&java_path, script).unwrap();
    std::fs::set_permissions(&java_path, std::fs::Permissions::from_mode(0o755)).unwrap();
    FakeJdk {
        home: dir.path().to_path_buf(),
        out_file,
        _dir: dir,
    }
}

fn base_config(jdk: &FakeJdk) -> LauncherConfig {
    LauncherConfig {
        java_home: Some(jdk.home.clone()),
        ..Default::default()
    }
}

#[test]
fn main_class_only_spawns_with_expected_classpath_and_args() {
    let jdk = fake_jdk();
    let archive_path = build_capsule(&[
        (
            "META-INF/APP-MANIFEST.MF",
            b"Application-Class: foo.Main\n",
        ),
        ("a.jar", b"jar-a"),
        ("b.jar", b"jar-b"),
    ]);

    let config = base_config(&jdk);
    let exit = Launcher::run(
        std::path::Path::new(archive_path.to_str().unwrap()),
        &["hi".to_string(), "there".to_string()],
        &config,
    )
    .unwrap();
    assert_eq!(exit, ExitCode::SUCCESS);

    let recorded = std::fs::read_to_string(&jdk.out_file).unwrap();
    assert!(recorded.contains("foo.Main"));
    assert!(recorded.trim_end().ends_with("foo.Main hi there"));
    assert!(recorded.contains(archive_path.to_str().unwrap()));
    assert!(recorded.contains("a.jar"), "classpath should include the extracted a.jar: {recorded}");
    assert!(recorded.contains("b.jar"), "classpath should include the extracted b.jar: {recorded}");
}

#[test]
fn dependency_tree_action_exits_without_spawning() {
    let jdk = fake_jdk();
    let archive_path = build_capsule(&[(
        "META-INF/APP-MANIFEST.MF",
        b"Application-Class: foo.Main\n",
    )]);

    let mut config = base_config(&jdk);
    config.action_print_tree = true;
    let exit = Launcher::run(
        std::path::Path::new(archive_path.to_str().unwrap()),
        &[],
        &config,
    )
    .unwrap();
    assert_eq!(exit, ExitCode::SUCCESS);
    assert!(!jdk.out_file.exists(), "no child process should have been spawned");
}

#[test]
fn unknown_mode_is_a_structural_error_before_spawn() {
    let jdk = fake_jdk();
    let archive_path = build_capsule(&[(
        "META-INF/APP-MANIFEST.MF",
        b"Application-Class: foo.Main\n",
    )]);

    let mut config = base_config(&jdk);
    config.mode = Some("nonexistent-mode".to_string());
    let result = Launcher::run(
        std::path::Path::new(archive_path.to_str().unwrap()),
        &[],
        &config,
    );
    assert!(result.is_err());
    assert!(!jdk.out_file.exists());
}

#[test]
fn missing_entrypoint_is_an_error() {
    let jdk = fake_jdk();
    let archive_path = build_capsule(&[("META-INF/APP-MANIFEST.MF", b"Some-Other-Attr: x\n")]);

    let config = base_config(&jdk);
    let result = Launcher::run(
        std::path::Path::new(archive_path.to_str().unwrap()),
        &[],
        &config,
    );
    assert!(result.is_err());
}

#[test]
fn app_id_override_replaces_the_derived_cache_directory_name() {
    let jdk = fake_jdk();
    let cache_root = tempfile::tempdir().unwrap();
    std::env::set_var("CAPSULE_CACHE_DIR", cache_root.path());

    let archive_path = build_capsule(&[(
        "META-INF/APP-MANIFEST.MF",
        b"Application-Class: foo.Main\nJVM-Args: -Dfoo=$CAPSULE_DIR/lib\n",
    )]);

    let mut config = base_config(&jdk);
    config.app_id_override = Some("my-custom-id".to_string());
    let exit = Launcher::run(
        std::path::Path::new(archive_path.to_str().unwrap()),
        &[],
        &config,
    )
    .unwrap();
    std::env::remove_var("CAPSULE_CACHE_DIR");

    assert_eq!(exit, ExitCode::SUCCESS);
    assert!(cache_root.path().join("apps/my-custom-id").is_dir());
}

#[test]
fn rerunning_twice_produces_the_same_argv() {
    let jdk = fake_jdk();
    let archive_path = build_capsule(&[
        (
            "META-INF/APP-MANIFEST.MF",
            b"Application-Class: foo.Main\n",
        ),
        ("a.jar", b"jar-a"),
    ]);

    let config = base_config(&jdk);
    Launcher::run(
        std::path::Path::new(archive_path.to_str().unwrap()),
        &["x".to_string()],
        &config,
    )
    .unwrap();
    let first = std::fs::read_to_string(&jdk.out_file).unwrap();

    std::fs::remove_file(&jdk.out_file).unwrap();
    Launcher::run(
        std::path::Path::new(archive_path.to_str().unwrap()),
        &["x".to_string()],
        &config,
    )
    .unwrap();
    let second = std::fs::read_to_string(&jdk.out_file).unwrap();

    assert_eq!(first, second);
}
