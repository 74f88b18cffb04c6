// src/transforms/markup.rs

//! `{{ name }}` variable substitution and HTML minification.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::errors::TransformError;
use crate::pipeline::{SourceFile, Transform};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][\w.-]*)\s*\}\}").expect("placeholder regex is valid")
});

/// Replace `{{ name }}` placeholders with configured values. An unknown name
/// rejects the file.
#[derive(Debug, Clone, Default)]
pub struct Template {
    vars: BTreeMap<String, String>,
}

impl Template {
    pub fn new(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }
}

impl Transform for Template {
    fn name(&self) -> &str {
        "template"
    }

    fn apply(&self, file: SourceFile) -> Result<SourceFile, TransformError> {
        let text = file.text(self.name())?;

        if let Some(missing) = PLACEHOLDER
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .find(|name| !self.vars.contains_key(name))
        {
            return Err(TransformError::new(
                self.name(),
                &file.path,
                format!("undefined variable '{missing}'"),
            ));
        }

        let out = PLACEHOLDER
            .replace_all(text, |c: &Captures| self.vars[&c[1]].clone())
            .into_owned();
        Ok(file.with_contents(out))
    }
}

/// Minify HTML, including inline `<style>` and `<script>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMinify;

impl Transform for HtmlMinify {
    fn name(&self) -> &str {
        "html-minify"
    }

    fn apply(&self, file: SourceFile) -> Result<SourceFile, TransformError> {
        let mut cfg = minify_html::Cfg::new();
        cfg.keep_closing_tags = true;
        cfg.keep_html_and_head_opening_tags = true;
        cfg.keep_comments = false;
        cfg.minify_css = true;
        cfg.minify_js = true;
        cfg.remove_bangs = true;
        cfg.remove_processing_instructions = true;

        let out = minify_html::minify(&file.contents, &cfg);
        Ok(file.with_contents(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_variables() {
        let t = Template::new(vars(&[("title", "Home"), ("site.name", "Demo")]));
        let out = t
            .apply(SourceFile::new("index.html", "<title>{{title}} | {{ site.name }}</title>"))
            .unwrap();
        assert_eq!(
            String::from_utf8(out.contents).unwrap(),
            "<title>Home | Demo</title>"
        );
    }

    #[test]
    fn unknown_variable_fails() {
        let t = Template::new(BTreeMap::new());
        let err = t
            .apply(SourceFile::new("index.html", "<p>{{ nope }}</p>"))
            .unwrap_err();
        assert_eq!(err.step, "template");
        assert!(err.cause.contains("nope"));
    }

    #[test]
    fn strips_comments_and_whitespace() {
        let html = "<html>\n  <body>\n    <!-- note -->\n    <p>hi</p>\n  </body>\n</html>\n";
        let out = HtmlMinify.apply(SourceFile::new("a.html", html)).unwrap();
        let text = String::from_utf8(out.contents).unwrap();
        assert!(!text.contains("note"));
        assert!(text.len() < html.len());
        assert!(text.contains("<p>hi</p>"));
    }
}
