use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;

const METADATA: &str = "description: Ultralytics YOLOv8s model\nstride: 32\ntask: detect\nimgsz: [640, 640]\nnames:\n  2: bicycle\n  0: person\n  1: car\n";

fn cmd() -> Command {
    Command::cargo_bin("detport").unwrap()
}

fn export_dir(root: &Path, metadata: &str) -> std::path::PathBuf {
    let dir = root.join("best_web_model");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("metadata.yaml"), metadata).unwrap();
    dir
}

#[test]
fn labels_from_export_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), METADATA);

    cmd()
        .arg("labels")
        .arg(&dir)
        .assert()
        .success()
        .stdout(contains("Wrote 3 labels"));

    assert_eq!(
        fs::read_to_string(dir.join("labels.txt")).unwrap(),
        "person\ncar\nbicycle\n"
    );
}

#[test]
fn labels_to_explicit_output() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), METADATA);
    let out = tmp.path().join("coco.txt");

    cmd()
        .arg("labels")
        .arg(dir.join("metadata.yaml"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out).unwrap(), "person\ncar\nbicycle\n");
}

#[test]
fn labels_gap_fails_without_output() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), "names:\n  0: cat\n  2: dog\n");

    cmd()
        .arg("labels")
        .arg(&dir)
        .assert()
        .failure()
        .stderr(contains("not contiguous"));

    assert!(!dir.join("labels.txt").exists());
}

#[test]
fn labels_allow_gaps() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), "names:\n  2: dog\n  0: cat\n");

    cmd()
        .args(["labels", "--allow-gaps"])
        .arg(&dir)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(dir.join("labels.txt")).unwrap(), "cat\ndog\n");
}

#[test]
fn labels_missing_names_is_malformed() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), "task: detect\n");

    cmd()
        .arg("labels")
        .arg(&dir)
        .assert()
        .failure()
        .stderr(contains("malformed metadata"));

    assert!(!dir.join("labels.txt").exists());
}

#[test]
fn labels_field_from_env() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), "classes:\n  0: a\n  1: b\n");

    cmd()
        .env("DETPORT_LABEL_FIELD", "classes")
        .arg("labels")
        .arg(&dir)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(dir.join("labels.txt")).unwrap(), "a\nb\n");
}

#[test]
fn inspect_card() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), METADATA);

    cmd()
        .arg("inspect")
        .arg(&dir)
        .assert()
        .success()
        .stdout(contains("Classes (3)"))
        .stdout(contains("640 x 640"))
        .stdout(contains("bicycle"));
}

#[test]
fn inspect_json() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), METADATA);

    let output = cmd()
        .args(["inspect", "--json"])
        .arg(&dir)
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["task"], "detect");
    assert_eq!(value["labels"][0], "person");
    assert_eq!(value["labels"][2], "bicycle");
}

#[test]
fn verify_match_and_mismatch() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), METADATA);
    let labels = dir.join("labels.txt");

    fs::write(&labels, "person\ncar\nbicycle\n").unwrap();
    cmd()
        .arg("verify")
        .arg(&dir)
        .arg(&labels)
        .assert()
        .success()
        .stdout(contains("matches"));

    fs::write(&labels, "person\nbicycle\ncar\n").unwrap();
    cmd()
        .arg("verify")
        .arg(&dir)
        .arg(&labels)
        .assert()
        .failure()
        .stderr(contains("line 2"));
}

#[test]
fn verify_rejects_crlf_line_endings() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), METADATA);
    let labels = dir.join("labels.txt");
    fs::write(&labels, "person\r\ncar\r\nbicycle\r\n").unwrap();

    cmd()
        .arg("verify")
        .arg(&dir)
        .arg(&labels)
        .assert()
        .failure()
        .stderr(contains("line 1"));
}

#[test]
fn verify_rejects_missing_trailing_newline() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), METADATA);
    let labels = dir.join("labels.txt");
    fs::write(&labels, "person\ncar\nbicycle").unwrap();

    cmd()
        .arg("verify")
        .arg(&dir)
        .arg(&labels)
        .assert()
        .failure()
        .stderr(contains("trailing newline"));
}

#[test]
fn verify_ignores_unrelated_metadata_fields() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = export_dir(tmp.path(), "stride: wide\nnames:\n  1: car\n  0: person\n");
    let labels = dir.join("labels.txt");
    fs::write(&labels, "person\ncar\n").unwrap();

    cmd()
        .arg("verify")
        .arg(&dir)
        .arg(&labels)
        .assert()
        .success()
        .stdout(contains("matches (2 labels)"));
}

#[test]
fn export_rejects_bad_imgsz() {
    cmd()
        .args(["export", "best.pt", "--imgsz", "0"])
        .assert()
        .failure()
        .stderr(contains("invalid image size"));
}

#[test]
fn export_missing_checkpoint() {
    let tmp = tempfile::tempdir().unwrap();
    cmd()
        .arg("export")
        .arg(tmp.path().join("best.pt"))
        .assert()
        .failure()
        .stderr(contains("file not found"));
}

#[cfg(unix)]
#[test]
fn export_with_fake_exporter() {
    let tmp = tempfile::tempdir().unwrap();
    let ckpt = tmp.path().join("yolov8s_best.pt");
    fs::write(&ckpt, b"weights").unwrap();
    let script = tmp.path().join("fake_yolo.sh");
    fs::write(
        &script,
        r#"for arg in "$@"; do
  case "$arg" in model=*) model="${arg#model=}" ;; esac
done
out="${model%.pt}_saved_model"
mkdir -p "$out"
printf 'names:\n  1: car\n  0: person\n' > "$out/metadata.yaml"
"#,
    )
    .unwrap();

    cmd()
        .arg("export")
        .arg(&ckpt)
        .args(["--format", "tflite", "--yolo-bin", "sh", "--yolo-arg"])
        .arg(&script)
        .assert()
        .success()
        .stdout(contains("Wrote 2 labels"));

    assert_eq!(
        fs::read_to_string(tmp.path().join("yolov8s_best_saved_model/labels.txt")).unwrap(),
        "person\ncar\n"
    );
}
