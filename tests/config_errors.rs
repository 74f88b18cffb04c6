// tests/config_errors.rs

use std::path::PathBuf;

use assetpipe::config::{ConfigFile, RawConfigFile, load_and_validate, load_or_default};
use assetpipe::errors::PipelineError;
use assetpipe::types::{AssetClass, ReloadPolicy};
use assetpipe_test_utils::builders::{AssetPathsBuilder, ConfigFileBuilder};

fn parse(toml_src: &str) -> Result<ConfigFile, PipelineError> {
    let raw: RawConfigFile = toml::from_str(toml_src)?;
    ConfigFile::try_from(raw)
}

fn assert_config_error(result: Result<ConfigFile, PipelineError>, needle: &str) {
    match result {
        Err(PipelineError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message '{msg}' lacks '{needle}'")
        }
        other => panic!("expected ConfigError mentioning '{needle}', got {other:?}"),
    }
}

#[test]
fn empty_file_yields_builtin_table() {
    let cfg = parse("").unwrap();

    let styles = cfg.paths.get(AssetClass::Styles);
    assert_eq!(styles.src, vec!["src/styles/**/*.scss"]);
    assert_eq!(styles.bundle.as_deref(), Some("main.min.css"));
    assert_eq!(styles.reload, ReloadPolicy::Inject);

    let images = cfg.paths.get(AssetClass::Images);
    assert!(images.incremental);
    assert_eq!(images.reload, ReloadPolicy::Never);

    assert_eq!(cfg.config.dest_root, PathBuf::from("dist"));
    assert_eq!(cfg.serve.port, 3000);
    assert_eq!(cfg.serve.reload_port, 35729);
}

#[test]
fn sections_override_single_fields() {
    let cfg = parse(
        r#"
        [serve]
        enabled = false

        [paths.scripts]
        src = ["assets/js/**/*.js"]
        reload = "none"

        [paths.markup.options]
        minify = false
        vars = { title = "Home" }
        "#,
    )
    .unwrap();

    assert!(!cfg.serve.enabled);
    let scripts = cfg.paths.get(AssetClass::Scripts);
    assert_eq!(scripts.src, vec!["assets/js/**/*.js"]);
    assert_eq!(scripts.dest, PathBuf::from("dist/js"));
    assert_eq!(scripts.reload, ReloadPolicy::Never);
}

#[test]
fn invalid_glob_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_paths(AssetClass::Styles, AssetPathsBuilder::new().src("src/[styles").build())
        .try_build();
    assert_config_error(result, "[paths.styles].src");
}

#[test]
fn empty_src_is_rejected() {
    assert_config_error(
        parse(
            r#"
            [paths.images]
            src = []
            "#,
        ),
        "at least one glob",
    );
}

#[test]
fn bundle_with_separator_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_paths(
            AssetClass::Scripts,
            AssetPathsBuilder::new().bundle("js/main.min.js").build(),
        )
        .try_build();
    assert_config_error(result, "plain file name");
}

#[test]
fn empty_dest_root_is_rejected() {
    let result = ConfigFileBuilder::new().dest_root("").try_build();
    assert_config_error(result, "dest_root");
}

#[test]
fn unknown_option_key_is_rejected() {
    assert_config_error(
        parse(
            r#"
            [paths.scripts.options]
            sourcemaps = true
            "#,
        ),
        "sourcemaps",
    );
}

#[test]
fn mistyped_option_is_rejected() {
    assert_config_error(
        parse(
            r#"
            [paths.images.options]
            jpeg_quality = "high"
            "#,
        ),
        "jpeg_quality",
    );
}

#[test]
fn unknown_reload_policy_is_a_toml_error() {
    let result = parse(
        r#"
        [paths.styles]
        reload = "sometimes"
        "#,
    );
    assert!(matches!(result, Err(PipelineError::TomlError(_))));
}

#[test]
fn explicit_missing_file_is_an_error_but_default_is_not() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("Custom.toml");
    assert!(matches!(
        load_or_default(&missing),
        Err(PipelineError::IoError(_))
    ));

    let path = dir.path().join("Assetpipe.toml");
    std::fs::write(&path, "[config]\ndest_root = \"public\"\n").unwrap();
    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.config.dest_root, PathBuf::from("public"));
}
