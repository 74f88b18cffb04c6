#![allow(dead_code)]

use std::sync::Arc;

use assetpipe::config::ConfigFile;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::pipeline::Pipeline;

pub use assetpipe_test_utils::{init_tracing, with_timeout};

/// Pipeline rooted at "." over an in-memory filesystem, with the builtin
/// chains replaced by `chains`.
pub fn mock_pipeline(
    cfg: &ConfigFile,
    fs: &MockFileSystem,
    chains: Vec<(assetpipe::types::AssetClass, assetpipe::pipeline::TransformChain)>,
) -> Pipeline {
    let fs: Arc<dyn assetpipe::fs::FileSystem> = Arc::new(fs.clone());
    Pipeline::with_chains(".", cfg, fs, chains.into_iter().collect())
        .expect("pipeline builds from a valid config")
}
