use std::fs;
use std::io::Read;
use std::process::{Command, Output};
use tempfile::TempDir;
use zip::ZipArchive;

fn run_command(args: &[&str]) -> Output {
    Command::new("cargo")
        .arg("run")
        .arg("--")
        .args(args)
        .env_remove("GOOGLE_AI_STUDIO_API_KEY")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_export_command_writes_pptx() {
    // Create temporary directory
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    // Deck JSON as a caller would post it; bullets are short on purpose
    let deck_path = temp_path.join("deck.json");
    let deck_json = r#"{
        "topic": "Borrow checker",
        "slides": [
            { "title": "Rules & limits", "bullets": ["One writer", "Many readers"] },
            { "title": "Lifetimes", "body": "Scopes\nRegions\nElision" }
        ]
    }"#;
    fs::write(&deck_path, deck_json).expect("Failed to write deck file");

    let output_path = temp_path.join("out").join("deck.pptx");

    // Augmentation is requested but no key is set, so this stays offline
    let output = run_command(&[
        "export",
        "-i",
        deck_path.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
        "--augment-images",
        "--style",
        "casual",
    ]);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output_path.exists(), "Output file was not created");

    let file = fs::File::open(&output_path).expect("Failed to open output file");
    let mut archive = ZipArchive::new(file).expect("Output is not a zip archive");
    assert!(archive.by_name("ppt/slides/slide2.xml").is_ok());
    assert!(archive.by_name("ppt/slides/slide3.xml").is_err());

    let mut first = String::new();
    archive
        .by_name("ppt/slides/slide1.xml")
        .unwrap()
        .read_to_string(&mut first)
        .unwrap();
    assert!(first.contains("Rules &amp; limits"), "Missing escaped title");
    assert!(first.contains("(fill in)"), "Missing padded bullet");
    assert!(first.contains("Trebuchet MS"), "Casual style not applied");
}

#[test]
fn test_export_rejects_deck_without_slides() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let deck_path = temp_dir.path().join("deck.json");
    fs::write(&deck_path, r#"{"topic": "Nothing", "slides": []}"#).expect("Failed to write deck");

    let output = run_command(&["export", "-i", deck_path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error (400)"), "stderr: {}", stderr);
}

#[test]
fn test_generate_without_key_reports_configuration_error() {
    let output = run_command(&["generate", "--topic", "Rust"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error (500)"), "stderr: {}", stderr);
    assert!(
        stderr.contains("Missing GOOGLE_AI_STUDIO_API_KEY"),
        "stderr: {}",
        stderr
    );
}
