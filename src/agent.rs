use std::{
    io::BufReader,
    process::{Child, ChildStdin, ChildStdout, ExitStatus, Stdio},
};

use anyhow::{self, Context};
use tracing::{info, warn};

use crate::channel::AgentChannel;

/// Channel over the pipes of a spawned agent.
pub type ProcessChannel = AgentChannel<ChildStdin, BufReader<ChildStdout>>;

/// The agent child process.
///
/// stdin/stdout carry the protocol, stderr is inherited so the agent can print diagnostics.
/// The child is killed on drop unless [`AgentProcess::wait`] reaped it.
#[derive(Debug)]
pub struct AgentProcess {
    child: Child,
    command: String,
    reaped: bool,
}

fn create_process(command: &str, args: &[String]) -> anyhow::Result<Child> {
    std::process::Command::new(command)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("command '{command}' not found"))
}

impl AgentProcess {
    pub fn launch(command: &str, args: &[String]) -> anyhow::Result<AgentProcess> {
        let child = create_process(command, args).context("could not create agent process")?;
        info!(pid = child.id(), command, ?args, "agent launched");
        Ok(AgentProcess {
            child,
            command: command.to_string(),
            reaped: false,
        })
    }

    /// Launch from a full command line: executable first, then its arguments.
    pub fn launch_argv(argv: &[String]) -> anyhow::Result<AgentProcess> {
        let Some((command, args)) = argv.split_first() else {
            anyhow::bail!("no agent command given");
        };
        Self::launch(command, args)
    }

    /// OS process id of the agent.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Take the agent's stdin and stdout.
    pub fn channel(&mut self) -> anyhow::Result<ProcessChannel> {
        let stdin = self.child.stdin.take().context("agent stdin already taken")?;
        let stdout = self
            .child
            .stdout
            .take()
            .context("agent stdout already taken")?;
        Ok(AgentChannel::new(stdin, BufReader::new(stdout)))
    }

    /// Wait for the agent to exit. Its stdin must be closed first (drop the channel).
    pub fn wait(&mut self) -> anyhow::Result<ExitStatus> {
        drop(self.child.stdin.take());
        let status = self
            .child
            .wait()
            .with_context(|| format!("could not wait for '{}'", self.command))?;
        self.reaped = true;
        info!(command = %self.command, %status, "agent exited");
        Ok(status)
    }
}

impl Drop for AgentProcess {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(e) = self.child.kill() {
            warn!("could not kill agent '{}': {e}", self.command);
        }
        let _ = self.child.wait();
    }
}
