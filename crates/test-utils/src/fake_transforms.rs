//! Small transforms for exercising the task harness without real compilers.

use assetpipe::errors::TransformError;
use assetpipe::pipeline::{SourceFile, Transform, TransformChain, from_fn};

/// Upper-cases text; fails on any file containing `marker`.
pub fn failing_on(marker: &'static str) -> impl Transform + 'static {
    from_fn("fake-compile", move |file: SourceFile| {
        let text = file.text("fake-compile")?;
        if text.contains(marker) {
            return Err(TransformError::new(
                "fake-compile",
                &file.path,
                format!("syntax error near '{marker}'"),
            ));
        }
        let out = text.to_uppercase();
        Ok(file.with_contents(out))
    })
}

/// Strips all ASCII whitespace.
pub fn squash() -> impl Transform + 'static {
    from_fn("squash", |file: SourceFile| {
        let out: Vec<u8> = file
            .contents
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        Ok(file.with_contents(out))
    })
}

/// `failing_on(marker)` followed by `squash()`.
pub fn compile_chain(marker: &'static str) -> TransformChain {
    TransformChain::new().then(failing_on(marker)).then(squash())
}
