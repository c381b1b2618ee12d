use anyhow::Result;
use tracing::info;

pub fn execute() -> Result<()> {
    info!("{}", version());
    Ok(())
}

fn version() -> String {
    format!("flight version {}", env!("CARGO_PKG_VERSION"))
}
