// ABOUTME: Engine-level commands: version and info.
// ABOUTME: Print what the engine reports about itself.

use super::connect;
use dockside::error::Result;
use dockside::output::Output;

pub async fn version(output: &Output) -> Result<()> {
    let api = connect()?;
    output.data(&api.client_version().await?)
}

pub async fn info(output: &Output) -> Result<()> {
    let api = connect()?;
    output.data(&api.server_info().await?)
}
