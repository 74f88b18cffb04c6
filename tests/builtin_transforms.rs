// tests/builtin_transforms.rs

mod common;
use crate::common::init_tracing;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use assetpipe::config::load_and_validate;
use assetpipe::dag::TaskKind;
use assetpipe::errors::TaskError;
use assetpipe::fs::RealFileSystem;
use assetpipe::pipeline::Pipeline;
use assetpipe::types::AssetClass;

const CONFIG: &str = r#"
[serve]
enabled = false

[paths.markup.options]
vars = { title = "Demo" }
"#;

fn write(root: &Path, rel: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn pipeline(root: &Path) -> Pipeline {
    init_tracing();
    write(root, "Assetpipe.toml", CONFIG);
    let cfg = load_and_validate(root.join("Assetpipe.toml")).unwrap();
    Pipeline::from_config(root, &cfg, Arc::new(RealFileSystem)).unwrap()
}

#[test]
fn styles_bundle_keeps_valid_file_and_reports_invalid_one() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/styles/a.scss", "$c: red;\n.a { color: $c; }\n");
    write(root, "src/styles/b.scss", ".b { color: red;\n");

    let report = pipeline(root).run(TaskKind::Transform(AssetClass::Styles));

    let css = fs::read_to_string(root.join("dist/css/main.min.css")).unwrap();
    assert!(css.contains(".a{color:red}"), "got {css}");
    assert!(!css.contains(".b"));

    assert_eq!(report.errors.len(), 1);
    match &report.errors[0] {
        TaskError::Transform(err) => {
            assert_eq!(err.step, "scss");
            assert!(err.file.ends_with("b.scss"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn styles_partials_resolve_through_their_importer() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/styles/main.scss", "$c: red;\n@import 'buttons';\n");
    write(root, "src/styles/_buttons.scss", ".btn { color: $c; }\n");

    let report = pipeline(root).run(TaskKind::Transform(AssetClass::Styles));
    assert!(report.is_success(), "{:?}", report.errors);

    let css = fs::read_to_string(root.join("dist/css/main.min.css")).unwrap();
    assert_eq!(css.matches(".btn").count(), 1, "got {css}");
    assert!(css.contains(".btn{color:red}"), "got {css}");
}

#[test]
fn scripts_are_minified_and_syntax_errors_reported() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = "function add(first, second) {\n  return first + second;\n}\nconsole.log(add(1, 2));\n";
    write(root, "src/scripts/app.js", source);
    write(root, "src/scripts/broken.js", "let = ;\n");

    let report = pipeline(root).run(TaskKind::Transform(AssetClass::Scripts));

    let js = fs::read_to_string(root.join("dist/js/main.min.js")).unwrap();
    assert!(js.contains("console.log"));
    assert!(js.len() < source.len());

    assert_eq!(report.errors.len(), 1);
    assert!(matches!(&report.errors[0], TaskError::Transform(e) if e.step == "js-minify"));
}

#[test]
fn markup_is_templated_and_minified() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "src/index.html",
        "<html>\n  <head><title>{{ title }}</title></head>\n  <body>\n    <!-- drop me -->\n    <h1>{{title}}</h1>\n  </body>\n</html>\n",
    );

    let report = pipeline(root).run(TaskKind::Transform(AssetClass::Markup));
    assert!(report.is_success(), "{:?}", report.errors);

    let html = fs::read_to_string(root.join("dist/index.html")).unwrap();
    assert!(html.contains("<title>Demo</title>"));
    assert!(html.contains("<h1>Demo</h1>"));
    assert!(!html.contains("drop me"));
    assert!(!html.contains("{{"));
}

#[test]
fn images_are_written_and_never_grow() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let src = root.join("src/images/icons/dot.png");
    fs::create_dir_all(src.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(32, 32, image::Rgb([200, 30, 30]))
        .save(&src)
        .unwrap();
    write(root, "src/images/readme.txt", "not an image");

    let pipeline = pipeline(root);
    let report = pipeline.run(TaskKind::Transform(AssetClass::Images));
    assert!(report.is_success(), "{:?}", report.errors);

    let out = root.join("dist/images/icons/dot.png");
    let original = fs::metadata(&src).unwrap().len();
    assert!(fs::metadata(&out).unwrap().len() <= original);
    assert_eq!(
        fs::read(root.join("dist/images/readme.txt")).unwrap(),
        b"not an image"
    );

    // Second run: destinations are newer than sources.
    let again = pipeline.run(TaskKind::Transform(AssetClass::Images));
    assert!(again.written.is_empty());
    assert_eq!(again.fresh, 2);
}
