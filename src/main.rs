use anyhow::Context;
use tracing::{error, info};

use agent_bridge::logger::init_logger;
use agent_bridge::prelude::*;

/// `agent-bridge <agent-command> [args...]`
fn main() -> anyhow::Result<()> {
    let config = Configuration::from_env().context("invalid configuration")?;
    init_logger(&config)?;

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut agent = AgentProcess::launch_argv(&argv)
        .context("usage: agent-bridge <agent-command> [args...]")?;
    let channel = agent.channel()?;

    let client = Client::from_config(&config)?;
    let mut bridge = Bridge::new(ServerApi::new(&config, client), channel);

    let result = bridge.run();
    // closes the agent's stdin
    drop(bridge);

    match result {
        Ok(summary) => {
            info!(?summary, "finish");
            agent.wait()?;
            Ok(())
        }
        Err(e) => {
            error!("failure: {e}");
            Err(e).context("bridge aborted")
        }
    }
}
