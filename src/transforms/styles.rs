// src/transforms/styles.rs

//! SCSS compilation (grass) and CSS autoprefix/minify (lightningcss).

use std::collections::BTreeMap;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::errors::{PipelineError, Result, TransformError};
use crate::pipeline::{SourceFile, Transform};

/// Compile SCSS to CSS. `@use`/`@import` resolve relative to the source file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScssCompile;

impl Transform for ScssCompile {
    fn name(&self) -> &str {
        "scss"
    }

    fn apply(&self, file: SourceFile) -> std::result::Result<SourceFile, TransformError> {
        let mut options = grass::Options::default().quiet(true);
        if let Some(dir) = file.path.parent() {
            options = options.load_path(dir);
        }

        let css = grass::from_string(file.text(self.name())?.to_string(), &options)
            .map_err(|e| TransformError::new(self.name(), &file.path, e))?;
        Ok(file.with_contents(css))
    }
}

/// Parse CSS, add vendor prefixes for the configured browser targets, and
/// print it (minified unless disabled).
#[derive(Debug, Clone, Default)]
pub struct CssMinify {
    targets: Targets,
    minify: bool,
}

impl CssMinify {
    /// `targets` maps a browser name to its oldest supported major version.
    pub fn new(targets: &BTreeMap<String, u32>, minify: bool) -> Result<Self> {
        let mut browsers = Browsers::default();
        for (name, major) in targets.iter() {
            let version = Some(major << 16);
            match name.as_str() {
                "android" => browsers.android = version,
                "chrome" => browsers.chrome = version,
                "edge" => browsers.edge = version,
                "firefox" => browsers.firefox = version,
                "ie" => browsers.ie = version,
                "ios_saf" => browsers.ios_saf = version,
                "opera" => browsers.opera = version,
                "safari" => browsers.safari = version,
                "samsung" => browsers.samsung = version,
                other => {
                    return Err(PipelineError::ConfigError(format!(
                        "[paths.styles.options].targets: unknown browser '{other}'"
                    )));
                }
            }
        }

        let targets = if targets.is_empty() {
            Targets::default()
        } else {
            Targets::from(browsers)
        };

        Ok(Self { targets, minify })
    }
}

impl Transform for CssMinify {
    fn name(&self) -> &str {
        "css-minify"
    }

    fn apply(&self, file: SourceFile) -> std::result::Result<SourceFile, TransformError> {
        let code = {
            let fail =
                |e: &dyn std::fmt::Display| TransformError::new(self.name(), &file.path, e);

            let source = file.text(self.name())?;
            let mut sheet =
                StyleSheet::parse(source, ParserOptions::default()).map_err(|e| fail(&e))?;
            sheet
                .minify(MinifyOptions {
                    targets: self.targets,
                    ..MinifyOptions::default()
                })
                .map_err(|e| fail(&e))?;
            sheet
                .to_css(PrinterOptions {
                    minify: self.minify,
                    targets: self.targets,
                    ..PrinterOptions::default()
                })
                .map_err(|e| fail(&e))?
                .code
        };

        Ok(file.with_contents(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_nested_rules() {
        let file = SourceFile::new("a.scss", "$c: red;\n.a { .b { color: $c; } }\n");
        let out = ScssCompile.apply(file).unwrap();
        let css = String::from_utf8(out.contents).unwrap();
        assert!(css.contains(".a .b"));
        assert!(css.contains("red"));
    }

    #[test]
    fn scss_syntax_error_names_the_step() {
        let file = SourceFile::new("b.scss", ".a { color: ");
        let err = ScssCompile.apply(file).unwrap_err();
        assert_eq!(err.step, "scss");
        assert!(err.file.ends_with("b.scss"));
    }

    #[test]
    fn minifies_css() {
        let min = CssMinify::new(&BTreeMap::new(), true).unwrap();
        let out = min
            .apply(SourceFile::new("a.css", ".a {\n  color: #ff0000;\n}\n"))
            .unwrap();
        assert_eq!(String::from_utf8(out.contents).unwrap(), ".a{color:red}");
    }

    #[test]
    fn unknown_browser_is_a_config_error() {
        let mut targets = BTreeMap::new();
        targets.insert("netscape".to_string(), 4);
        assert!(CssMinify::new(&targets, true).is_err());
    }
}
