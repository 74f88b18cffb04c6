// src/transforms/scripts.rs

//! JavaScript minification via oxc.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::errors::TransformError;
use crate::pipeline::{SourceFile, Transform};

/// Parse, compress, optionally mangle, and print a classic (non-module)
/// script. Syntax errors reject the file.
#[derive(Debug, Clone, Copy)]
pub struct JsMinify {
    pub mangle: bool,
}

impl Default for JsMinify {
    fn default() -> Self {
        Self { mangle: true }
    }
}

impl JsMinify {
    fn minify(&self, source: &str) -> Result<String, String> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
        if let Some(err) = ret.errors.first() {
            return Err(err.to_string());
        }
        if ret.panicked {
            return Err("parser gave up".to_string());
        }

        let mut program = ret.program;
        let options = MinifierOptions {
            mangle: self.mangle.then(MangleOptions::default),
            compress: Some(CompressOptions::smallest()),
        };
        let ret = Minifier::new(options).minify(&allocator, &mut program);

        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                comments: CommentOptions::disabled(),
                ..CodegenOptions::default()
            })
            .with_scoping(ret.scoping)
            .build(&program)
            .code;
        Ok(code)
    }
}

impl Transform for JsMinify {
    fn name(&self) -> &str {
        "js-minify"
    }

    fn apply(&self, file: SourceFile) -> Result<SourceFile, TransformError> {
        let code = self
            .minify(file.text(self.name())?)
            .map_err(|e| TransformError::new(self.name(), &file.path, e))?;
        Ok(file.with_contents(code))
    }
}
