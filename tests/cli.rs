use assert_cmd::prelude::*;
use chrono::Local;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

use jardecomp::ZipWriter;

fn jardecomp() -> Command {
    let mut cmd = Command::cargo_bin("jardecomp").unwrap();
    cmd.env_remove("JARDECOMP_CFR")
        .env_remove("JARDECOMP_JAVA")
        .env_remove("RUST_LOG");
    cmd
}

fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(Vec::new());
    for (name, data) in entries {
        writer.add_file(name, data, Local::now()).unwrap();
    }
    fs::write(path, writer.finish().unwrap()).unwrap();
}

#[test]
fn missing_decompiler_fails_before_touching_the_archive()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let jar = dir.path().join("App.jar");
    write_jar(&jar, &[("com/x/A.class", b"\xCA\xFE\xBA\xBE".as_slice())]);
    let before = fs::read(&jar)?;

    jardecomp()
        .current_dir(dir.path())
        .arg("--cfr")
        .arg(dir.path().join("missing-cfr.jar"))
        .arg("inplace")
        .arg(&jar)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("decompiler not found"));

    assert_eq!(fs::read(&jar)?, before);
    Ok(())
}

#[cfg(unix)]
#[test]
fn missing_target_exits_with_failure() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let cfr = dir.path().join("cfr.jar");
    fs::write(&cfr, b"")?;

    // `sh` stands in for the runtime; it is never started
    jardecomp()
        .current_dir(dir.path())
        .arg("--cfr")
        .arg(&cfr)
        .arg("--java")
        .arg("sh")
        .arg("export")
        .arg("nothing-here.jar")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("target archive not found"));

    assert!(!dir.path().join("nothing-here_extracted").exists());
    Ok(())
}

#[test]
fn unknown_mode_does_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    jardecomp()
        .current_dir(dir.path())
        .arg("explode")
        .arg("App.jar")
        .assert()
        .code(2);

    assert_eq!(fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn help_lists_every_mode() {
    jardecomp().arg("--help").assert().success().stdout(
        predicate::str::contains("inplace")
            .and(predicate::str::contains("export"))
            .and(predicate::str::contains("project")),
    );
}

#[cfg(unix)]
mod with_fake_cfr {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const FAKE_CFR: &str = r#"#!/bin/sh
out="$5"
mkdir -p "$out/com/x"
echo "class A {}" > "$out/com/x/A.java"
"#;

    /// Returns (cfr jar, fake java) inside `dir`.
    fn setup(dir: &Path) -> (PathBuf, PathBuf) {
        let cfr = dir.join("cfr.jar");
        fs::write(&cfr, b"").unwrap();
        let java = dir.join("fake-java");
        fs::write(&java, FAKE_CFR).unwrap();
        fs::set_permissions(&java, fs::Permissions::from_mode(0o755)).unwrap();
        (cfr, java)
    }

    fn class_files(root: &Path) -> usize {
        walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "class"))
            .count()
    }

    #[test]
    fn export_to_default_folder() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let (cfr, java) = setup(dir.path());
        let jar = dir.path().join("App.jar");
        write_jar(
            &jar,
            &[
                ("com/x/A.class", b"\xCA\xFE\xBA\xBE".as_slice()),
                ("res/a.txt", b"resource".as_slice()),
            ],
        );

        jardecomp()
            .current_dir(dir.path())
            .arg("--cfr")
            .arg(&cfr)
            .arg("--java")
            .arg(&java)
            .arg("export")
            .arg("App.jar")
            .assert()
            .success();

        let out = dir.path().join("App_extracted");
        assert!(out.join("com/x/A.java").is_file());
        assert_eq!(fs::read(out.join("res/a.txt"))?, b"resource");
        assert_eq!(class_files(&out), 0);
        Ok(())
    }

    #[test]
    fn project_layout_from_env_config() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let (cfr, java) = setup(dir.path());
        let jar = dir.path().join("App.jar");
        write_jar(
            &jar,
            &[
                ("com/x/A.class", b"\xCA\xFE\xBA\xBE".as_slice()),
                ("res/a.txt", b"resource".as_slice()),
            ],
        );

        jardecomp()
            .current_dir(dir.path())
            .env("JARDECOMP_CFR", &cfr)
            .env("JARDECOMP_JAVA", &java)
            .arg("project")
            .arg(&jar)
            .arg("-o")
            .arg("proj")
            .assert()
            .success();

        let root = dir.path().join("proj");
        assert!(root.join("src/main/java/com/x/A.java").is_file());
        assert!(root.join("src/main/resources/res/a.txt").is_file());
        assert!(root.join("build.gradle").is_file());
        assert_eq!(class_files(&root), 0);
        Ok(())
    }

    #[test]
    fn failing_decompiler_reports_stderr() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let (cfr, java) = setup(dir.path());
        fs::write(&java, "#!/bin/sh\necho 'cfr exploded' >&2\nexit 1\n")?;
        let jar = dir.path().join("App.jar");
        write_jar(&jar, &[("com/x/A.class", b"\xCA\xFE\xBA\xBE".as_slice())]);
        let before = fs::read(&jar)?;

        jardecomp()
            .current_dir(dir.path())
            .arg("--cfr")
            .arg(&cfr)
            .arg("--java")
            .arg(&java)
            .arg("inplace")
            .arg(&jar)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("cfr exploded"));

        assert_eq!(fs::read(&jar)?, before);
        Ok(())
    }
}
