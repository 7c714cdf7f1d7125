use image::{ImageBuffer, Rgba};
use serde_json::{json, Value};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn run_compare(args: &[&str], envs: &[(&str, &Path)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_uidiff"));
    cmd.env_remove("UIDIFF_MOCK_SNAPSHOT")
        .env("XDG_CONFIG_HOME", std::env::temp_dir().join("uidiff-no-config"));
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.args(args).output().expect("failed to run uidiff")
}

fn parse_output(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("stdout should be valid JSON")
}

fn write_layout(path: &Path) {
    let layout = json!([
        {"text": "Submit", "bbox": {"x0": 10, "y0": 20, "x1": 90, "y1": 44}},
        {"text": "About", "bbox": {"x0": 200, "y0": 20, "x1": 250, "y1": 40}},
        {"text": "  ", "bbox": {"x0": 0, "y0": 0, "x1": 5, "y1": 5}},
        {"text": "Ghost", "bbox": {"x0": 300, "y0": 400, "x1": 360, "y1": 420}},
        {"text": "Pricing", "bbox": {"x0": 500, "y0": 20, "x1": 560, "y1": 40}},
        {"text": "Broken", "bbox": {"x0": 40, "y0": 30, "x1": 10, "y1": 50}}
    ]);
    std::fs::write(path, serde_json::to_string(&layout).unwrap()).unwrap();
}

fn write_snapshot(path: &Path) {
    let snapshot = json!({
        "url": "http://localhost:8000",
        "probes": [
            {"text": "Submit", "count": 1, "visible": true,
             "boundingBox": {"x": 12.4, "y": 18.0, "width": 80.0, "height": 24.0}},
            {"text": "About", "count": 2, "visible": false},
            {"text": "Ghost", "count": 0, "visible": false},
            {"text": "Pricing", "error": "Execution context was destroyed"}
        ]
    });
    std::fs::write(path, serde_json::to_string(&snapshot).unwrap()).unwrap();
}

#[test]
fn element_match_reports_every_status_against_snapshot() {
    let dir = tempdir().expect("tempdir");
    let layout = dir.path().join("layout.json");
    let snapshot = dir.path().join("snapshot.json");
    write_layout(&layout);
    write_snapshot(&snapshot);

    let output = run_compare(
        &[
            "compare",
            "--checks",
            "element-match",
            "--layout",
            layout.to_str().unwrap(),
            "--url",
            "http://localhost:8000",
        ],
        &[("UIDIFF_MOCK_SNAPSHOT", &snapshot)],
    );
    assert_eq!(output.status.code(), Some(1));

    let report = parse_output(&output.stdout);
    assert_eq!(report["mode"], "compare");
    assert_eq!(report["status"], "fail");
    assert!(report["pixelDiff"].is_null());
    assert!(report["similarity"].is_null());

    // Blank text and the inverted box are dropped during normalization.
    let results = report["matchResults"].as_array().unwrap();
    assert_eq!(results.len(), 4);

    assert_eq!(results[0]["text"], "Submit");
    assert_eq!(results[0]["status"], "found");
    assert_eq!(results[0]["expected"], json!({"x": 10, "y": 20}));
    assert_eq!(results[0]["delta"], json!({"x": 2, "y": -2}));

    assert_eq!(results[1]["status"], "not_visible");
    assert!(results[1]["actual"].is_null());
    assert_eq!(results[2]["status"], "not_found");
    assert_eq!(results[3]["status"], "error");
    assert!(results[3]["error"]
        .as_str()
        .unwrap()
        .contains("Execution context was destroyed"));

    let issues = report["issues"].as_array().unwrap();
    let texts: Vec<&str> = issues.iter().map(|i| i["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["About", "Ghost", "Pricing"]);

    let top = report["summary"]["topIssues"].as_array().unwrap();
    assert!(top
        .iter()
        .any(|i| i.as_str() == Some("'Ghost' not found on the page")));
}

#[test]
fn element_match_passes_when_every_element_is_found() {
    let dir = tempdir().expect("tempdir");
    let layout = dir.path().join("layout.yaml");
    let snapshot = dir.path().join("snapshot.json");
    std::fs::write(
        &layout,
        "- text: Submit\n  bbox: {x0: 10, y0: 20, x1: 90, y1: 44}\n",
    )
    .unwrap();
    write_snapshot(&snapshot);

    let output = run_compare(
        &[
            "compare",
            "--checks",
            "element-match",
            "--layout",
            layout.to_str().unwrap(),
            "--url",
            "http://localhost:8000",
            "--match-timeout-ms",
            "250",
        ],
        &[("UIDIFF_MOCK_SNAPSHOT", &snapshot)],
    );
    assert_eq!(output.status.code(), Some(0));

    let report = parse_output(&output.stdout);
    assert_eq!(report["status"], "pass");
    assert_eq!(report["issues"], json!([]));
    assert_eq!(report["summary"]["topIssues"][0], "UI parity check passed");
}

#[test]
fn combined_run_merges_element_and_image_checks() {
    let dir = tempdir().expect("tempdir");
    let layout = dir.path().join("layout.json");
    let snapshot = dir.path().join("snapshot.json");
    let ref_path = dir.path().join("ref.png");
    let actual_path = dir.path().join("actual.png");
    std::fs::write(
        &layout,
        r#"[{"text":"Submit","bbox":{"x0":10,"y0":20,"x1":90,"y1":44}}]"#,
    )
    .unwrap();
    write_snapshot(&snapshot);

    let img: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_pixel(16, 16, Rgba([40, 80, 120, 255]));
    img.save(&ref_path).unwrap();
    img.save(&actual_path).unwrap();

    let output = run_compare(
        &[
            "compare",
            "--layout",
            layout.to_str().unwrap(),
            "--url",
            "http://localhost:8000",
            "--reference",
            ref_path.to_str().unwrap(),
            "--actual",
            actual_path.to_str().unwrap(),
        ],
        &[("UIDIFF_MOCK_SNAPSHOT", &snapshot)],
    );
    assert_eq!(output.status.code(), Some(0));

    let report = parse_output(&output.stdout);
    assert_eq!(
        report["checks"],
        json!(["element-match", "pixel-diff", "similarity"])
    );
    assert_eq!(report["matchResults"][0]["status"], "found");
    assert_eq!(report["pixelDiff"]["diffPixelCount"], 0);
    assert_eq!(report["pixelDiff"]["totalPixels"], 256);
    assert_eq!(report["similarity"]["score"], 1.0);
    assert!(report.get("artifacts").is_none());
}

#[test]
fn diff_image_is_written_and_reported() {
    let dir = tempdir().expect("tempdir");
    let ref_path = dir.path().join("ref.png");
    let actual_path = dir.path().join("actual.png");
    let diff_path = dir.path().join("out").join("diff.png");

    let reference: ImageBuffer<Rgba<u8>, _> =
        ImageBuffer::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
    let mut actual = reference.clone();
    actual.put_pixel(4, 4, Rgba([0, 0, 0, 255]));
    reference.save(&ref_path).unwrap();
    actual.save(&actual_path).unwrap();

    let output = run_compare(
        &[
            "compare",
            "--checks",
            "pixel-diff",
            "--reference",
            ref_path.to_str().unwrap(),
            "--actual",
            actual_path.to_str().unwrap(),
            "--diff-image",
            diff_path.to_str().unwrap(),
        ],
        &[],
    );
    assert_eq!(output.status.code(), Some(1));

    let report = parse_output(&output.stdout);
    assert_eq!(report["pixelDiff"]["diffPixelCount"], 1);
    assert_eq!(
        report["artifacts"]["diffImage"],
        diff_path.to_str().unwrap()
    );

    let diff = image::open(&diff_path).expect("diff image").to_rgba8();
    assert_eq!(diff.dimensions(), (8, 8));
    assert_eq!(diff.get_pixel(4, 4), &Rgba([255, 0, 0, 255]));
}

#[test]
fn pretty_format_to_file_keeps_json_shape() {
    let dir = tempdir().expect("tempdir");
    let ref_path = dir.path().join("ref.png");
    let actual_path = dir.path().join("actual.png");
    let report_path = dir.path().join("report.json");

    let img: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
    img.save(&ref_path).unwrap();
    img.save(&actual_path).unwrap();

    let output = run_compare(
        &[
            "compare",
            "--checks",
            "pixel-diff,similarity",
            "--reference",
            ref_path.to_str().unwrap(),
            "--actual",
            actual_path.to_str().unwrap(),
            "--format",
            "pretty",
            "--output",
            report_path.to_str().unwrap(),
        ],
        &[],
    );
    assert_eq!(output.status.code(), Some(0));

    let written = std::fs::read_to_string(&report_path).unwrap();
    assert!(written.contains('\n'), "pretty JSON should be multi-line");
    let report: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(report["version"], "1.0.0");
    assert_eq!(report["thresholds"]["pixelThreshold"], 0.1);
}

#[test]
fn missing_snapshot_file_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let layout = dir.path().join("layout.json");
    write_layout(&layout);
    let missing = dir.path().join("nope.json");

    let output = run_compare(
        &[
            "compare",
            "--checks",
            "element-match",
            "--layout",
            layout.to_str().unwrap(),
            "--url",
            "http://localhost:8000",
        ],
        &[("UIDIFF_MOCK_SNAPSHOT", &missing)],
    );
    assert_eq!(output.status.code(), Some(2));
    let payload = parse_output(&output.stdout);
    assert_eq!(payload["mode"], "error");
}
