// src/transforms/mod.rs

//! Built-in transform chains, one per asset class.
//!
//! Each transform is a thin adapter over a third-party library:
//!
//! | class   | chain                          |
//! |---------|--------------------------------|
//! | styles  | `scss` → `css-minify`          |
//! | scripts | `js-minify`                    |
//! | images  | `image-optimize`               |
//! | markup  | `template` → `html-minify`     |
//!
//! Chains are configured from the opaque `[paths.<class>.options]` table.

pub mod images;
pub mod markup;
pub mod scripts;
pub mod styles;

use std::collections::BTreeMap;

use crate::errors::{PipelineError, Result};
use crate::pipeline::TransformChain;
use crate::types::AssetClass;

pub use images::ImageOptimize;
pub use markup::{HtmlMinify, Template};
pub use scripts::JsMinify;
pub use styles::{CssMinify, ScssCompile};

/// Build the default chain for `class` from its options table.
pub fn builtin_chain(class: AssetClass, options: &toml::Table) -> Result<TransformChain> {
    let opts = Options::new(class, options);

    let chain = match class {
        AssetClass::Styles => {
            opts.allow_only(&["targets", "minify"])?;
            let targets = opts.int_table("targets")?;
            let minify = opts.bool_or("minify", true)?;
            TransformChain::new()
                .then(ScssCompile)
                .then(CssMinify::new(&targets, minify)?)
        }
        AssetClass::Scripts => {
            opts.allow_only(&["mangle"])?;
            TransformChain::new().then(JsMinify {
                mangle: opts.bool_or("mangle", true)?,
            })
        }
        AssetClass::Images => {
            opts.allow_only(&["jpeg_quality"])?;
            let quality = opts.int_or("jpeg_quality", images::DEFAULT_JPEG_QUALITY.into())?;
            let quality = u8::try_from(quality)
                .ok()
                .filter(|q| (1..=100).contains(q))
                .ok_or_else(|| opts.error("jpeg_quality", "must be between 1 and 100"))?;
            TransformChain::new().then(ImageOptimize {
                jpeg_quality: quality,
            })
        }
        AssetClass::Markup => {
            opts.allow_only(&["vars", "minify"])?;
            let chain = TransformChain::new().then(Template::new(opts.string_table("vars")?));
            if opts.bool_or("minify", true)? {
                chain.then(HtmlMinify)
            } else {
                chain
            }
        }
    };

    Ok(chain)
}

/// Typed access to a class's options table.
struct Options<'a> {
    class: AssetClass,
    table: &'a toml::Table,
}

impl<'a> Options<'a> {
    fn new(class: AssetClass, table: &'a toml::Table) -> Self {
        Self { class, table }
    }

    fn error(&self, key: &str, msg: &str) -> PipelineError {
        PipelineError::ConfigError(format!(
            "[paths.{}.options].{key} {msg}",
            self.class
        ))
    }

    fn allow_only(&self, keys: &[&str]) -> Result<()> {
        for key in self.table.keys() {
            if !keys.contains(&key.as_str()) {
                return Err(self.error(key, "is not a recognized option"));
            }
        }
        Ok(())
    }

    fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.table.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| self.error(key, "must be a boolean")),
        }
    }

    fn int_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.table.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_integer()
                .ok_or_else(|| self.error(key, "must be an integer")),
        }
    }

    fn int_table(&self, key: &str) -> Result<BTreeMap<String, u32>> {
        let mut out = BTreeMap::new();
        let Some(value) = self.table.get(key) else {
            return Ok(out);
        };
        let table = value
            .as_table()
            .ok_or_else(|| self.error(key, "must be a table"))?;
        for (name, v) in table.iter() {
            let n = v
                .as_integer()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| self.error(key, "values must be non-negative integers"))?;
            out.insert(name.clone(), n);
        }
        Ok(out)
    }

    fn string_table(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();
        let Some(value) = self.table.get(key) else {
            return Ok(out);
        };
        let table = value
            .as_table()
            .ok_or_else(|| self.error(key, "must be a table"))?;
        for (name, v) in table.iter() {
            let s = v
                .as_str()
                .ok_or_else(|| self.error(key, "values must be strings"))?;
            out.insert(name.clone(), s.to_string());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> toml::Table {
        src.parse().unwrap()
    }

    #[test]
    fn default_chains_have_expected_steps() {
        let empty = toml::Table::new();
        let names = |class| builtin_chain(class, &empty).unwrap();
        assert_eq!(names(AssetClass::Styles).names(), vec!["scss", "css-minify"]);
        assert_eq!(names(AssetClass::Scripts).names(), vec!["js-minify"]);
        assert_eq!(names(AssetClass::Images).names(), vec!["image-optimize"]);
        assert_eq!(names(AssetClass::Markup).names(), vec!["template", "html-minify"]);
    }

    #[test]
    fn rejects_unknown_and_mistyped_options() {
        let err = builtin_chain(AssetClass::Scripts, &table("sourcemaps = true")).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(_)));

        let err = builtin_chain(AssetClass::Markup, &table("minify = \"yes\"")).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(_)));

        let err = builtin_chain(AssetClass::Images, &table("jpeg_quality = 0")).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(_)));
    }

    #[test]
    fn markup_minify_can_be_disabled() {
        let chain = builtin_chain(AssetClass::Markup, &table("minify = false")).unwrap();
        assert_eq!(chain.names(), vec!["template"]);
    }
}
