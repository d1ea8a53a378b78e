use std::path::PathBuf;

use anyhow::Context;
use phong_sandbox::{SandboxApp, SandboxConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = SandboxConfig::discover(config_path.as_deref())
        .context("Failed to load configuration")?;

    SandboxApp::new(config)?.run()
}
