use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use sysml_layout::{ConfigError, LayoutError};
use sysml_layout_cli::{Args, CliError, run};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Collects all .json files from a directory
fn collect_json_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args(input: &Path, output: &Path) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        diagram: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_fixtures() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let valid_fixtures = collect_json_files(fixtures_dir());

    assert!(
        !valid_fixtures.is_empty(),
        "No valid fixtures found in tests/fixtures/"
    );

    let mut failed_fixtures = Vec::new();

    for fixture_path in &valid_fixtures {
        let output_path = temp_dir.path().join(format!(
            "{}.layout.json",
            fixture_path.file_stem().unwrap().to_string_lossy()
        ));

        match run(&args(fixture_path, &output_path)) {
            Ok(()) => {
                let written = fs::read_to_string(&output_path).expect("output written");
                let document: serde_json::Value =
                    serde_json::from_str(&written).expect("output is JSON");
                assert!(document["bounds"].is_object(), "{}", fixture_path.display());
                assert!(document["nodes"].is_array(), "{}", fixture_path.display());
            }
            Err(e) => failed_fixtures.push((fixture_path.clone(), e)),
        }
    }

    if !failed_fixtures.is_empty() {
        eprintln!("\nValid fixtures that failed:");
        for (path, err) in &failed_fixtures {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!(
            "{} valid fixture(s) failed unexpectedly",
            failed_fixtures.len()
        );
    }
}

#[test]
fn e2e_smoke_test_error_fixtures() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let error_fixtures = collect_json_files(fixtures_dir().join("errors"));

    assert!(
        !error_fixtures.is_empty(),
        "No error fixtures found in tests/fixtures/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for fixture_path in &error_fixtures {
        let output_path = temp_dir.path().join(format!(
            "error_{}.json",
            fixture_path.file_stem().unwrap().to_string_lossy()
        ));

        if run(&args(fixture_path, &output_path)).is_ok() {
            unexpectedly_succeeded.push(fixture_path.clone());
        }
        assert!(!output_path.exists(), "{} wrote output", fixture_path.display());
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError fixtures that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error fixture(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn test_diagram_override() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = fixtures_dir().join("bdd_vehicle.json");
    let output = temp_dir.path().join("as_requirements.json");

    let mut overridden = args(&input, &output);
    overridden.diagram = Some("requirements".to_string());
    run(&overridden).expect("layout succeeds");

    let written = fs::read_to_string(&output).expect("output written");
    let document: serde_json::Value = serde_json::from_str(&written).expect("output is JSON");
    assert_eq!(document["diagram"], "requirements");
}

#[test]
fn test_unknown_diagram_override() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = fixtures_dir().join("bdd_vehicle.json");
    let output = temp_dir.path().join("out.json");

    let mut overridden = args(&input, &output);
    overridden.diagram = Some("uml".to_string());

    assert!(matches!(
        run(&overridden),
        Err(CliError::UnknownDiagram(kind)) if kind == "uml"
    ));
}

#[test]
fn test_config_file_applies() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[layout]\nmargin = 100.0\n").expect("write config");

    let input = fixtures_dir().join("bdd_vehicle.json");
    let default_output = temp_dir.path().join("default.json");
    let wide_output = temp_dir.path().join("wide.json");

    let empty_config = temp_dir.path().join("empty.toml");
    fs::write(&empty_config, "").expect("write config");

    let mut default_margin = args(&input, &default_output);
    default_margin.config = Some(empty_config.to_string_lossy().to_string());
    run(&default_margin).expect("layout succeeds");

    let mut wide_margin = args(&input, &wide_output);
    wide_margin.config = Some(config_path.to_string_lossy().to_string());
    run(&wide_margin).expect("layout succeeds");

    let width = |path: &Path| {
        let written = fs::read_to_string(path).expect("output written");
        let document: serde_json::Value = serde_json::from_str(&written).expect("output is JSON");
        document["bounds"]["width"].as_f64().expect("width")
    };
    let grown = width(&wide_output) - width(&default_output);
    assert!((grown - 160.0).abs() < 1e-3, "canvas grew by {grown}");
}

#[test]
fn test_invalid_config_value_is_rejected() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[layout]\nnodeSpacing = -5.0\n").expect("write config");

    let input = fixtures_dir().join("bdd_vehicle.json");
    let output = temp_dir.path().join("out.json");
    let mut configured = args(&input, &output);
    configured.config = Some(config_path.to_string_lossy().to_string());

    assert!(matches!(run(&configured), Err(CliError::Layout(_))));
    assert!(!output.exists());
}

#[test]
fn test_out_of_range_config_values_are_configuration_errors() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = fixtures_dir().join("bdd_vehicle.json");
    let output = temp_dir.path().join("out.json");

    let cases = [
        ("[layout]\nforceIterations = -5\n", "forceIterations"),
        ("[layout]\nlayeredCrossingPasses = -1\n", "layeredCrossingPasses"),
        ("[layout]\nroutingStyle = \"zigzag\"\n", "routingStyle"),
    ];
    for (index, (contents, key)) in cases.into_iter().enumerate() {
        let config_path = temp_dir.path().join(format!("config_{index}.toml"));
        fs::write(&config_path, contents).expect("write config");

        let mut configured = args(&input, &output);
        configured.config = Some(config_path.to_string_lossy().to_string());

        let result = run(&configured);
        assert!(
            matches!(
                &result,
                Err(CliError::Layout(LayoutError::InvalidConfiguration(
                    ConfigError::NegativeCount { .. } | ConfigError::UnknownRoutingStyle(_)
                )))
            ),
            "{key}: {result:?}"
        );
        assert!(!output.exists(), "{key} wrote output");
    }
}
