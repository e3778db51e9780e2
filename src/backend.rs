//! Controls the lifecycle of the backend server: whether it is running,
//! starting it, and where to reach it.

use anyhow::{bail, Context};
use std::{future::Future, net::IpAddr, str::FromStr};
use tokio::process::Command;

/// Lifecycle state reported by a [`BackendController`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BackendState {
    Running,
    Stopped,
    Unknown,
}

/// Something that can tell whether the backend is up and power it on.
pub trait BackendController: Send + Sync {
    fn status(&self) -> impl Future<Output = anyhow::Result<BackendState>> + Send;

    fn start(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// The address clients should connect to, if it has one yet.
    fn public_address(&self) -> impl Future<Output = anyhow::Result<Option<IpAddr>>> + Send;
}

/// A backend managed elsewhere, always at the same address.
#[derive(Debug, Clone)]
pub struct StaticBackend {
    address: IpAddr,
}

impl StaticBackend {
    pub fn new(address: IpAddr) -> Self {
        Self { address }
    }
}

impl BackendController for StaticBackend {
    async fn status(&self) -> anyhow::Result<BackendState> {
        Ok(BackendState::Running)
    }

    async fn start(&self) -> anyhow::Result<()> {
        tracing::info!("Backend at {} is managed externally; not starting it", self.address);
        Ok(())
    }

    async fn public_address(&self) -> anyhow::Result<Option<IpAddr>> {
        Ok(Some(self.address))
    }
}

/// Shell command templates used by [`CommandBackend`].
///
/// `{instance}` and `{region}` are substituted before running.
#[derive(Debug, Clone)]
pub struct BackendCommands {
    /// Prints `running`, `stopped`, or anything else for unknown.
    pub status: String,
    pub start: String,
    /// Prints the public IP, or nothing if there is none.
    pub address: String,
}

/// A backend driven through external commands, such as a cloud provider's CLI.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    instance: String,
    region: String,
    commands: BackendCommands,
}

impl CommandBackend {
    pub fn new(instance: String, region: String, commands: BackendCommands) -> Self {
        Self {
            instance,
            region,
            commands,
        }
    }

    fn render(&self, template: &str) -> String {
        template
            .replace("{instance}", &self.instance)
            .replace("{region}", &self.region)
    }

    /// Runs a command template through `sh -c`, returning its trimmed stdout.
    async fn run(&self, template: &str) -> anyhow::Result<String> {
        let command = self.render(template);
        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run `{command}`"))?;

        if !output.status.success() {
            bail!(
                "`{command}` exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let stdout = String::from_utf8(output.stdout)
            .with_context(|| format!("`{command}` printed invalid UTF-8"))?;
        Ok(stdout.trim().to_owned())
    }
}

impl BackendController for CommandBackend {
    async fn status(&self) -> anyhow::Result<BackendState> {
        let output = self.run(&self.commands.status).await?;
        Ok(BackendState::from_str(&output.to_lowercase()).unwrap_or(BackendState::Unknown))
    }

    async fn start(&self) -> anyhow::Result<()> {
        self.run(&self.commands.start).await?;
        tracing::info!("Starting instance {}", self.instance);
        Ok(())
    }

    async fn public_address(&self) -> anyhow::Result<Option<IpAddr>> {
        let output = self.run(&self.commands.address).await?;
        // Cloud CLIs print `None` or `null` for a missing address.
        if output.is_empty() || output.eq_ignore_ascii_case("none") || output == "null" {
            return Ok(None);
        }
        output
            .parse()
            .map(Some)
            .with_context(|| format!("invalid backend address {output:?}"))
    }
}

/// The controllers selectable from the command line.
#[derive(Debug, Clone)]
pub enum Backend {
    Static(StaticBackend),
    Command(CommandBackend),
}

impl BackendController for Backend {
    async fn status(&self) -> anyhow::Result<BackendState> {
        match self {
            Self::Static(backend) => backend.status().await,
            Self::Command(backend) => backend.status().await,
        }
    }

    async fn start(&self) -> anyhow::Result<()> {
        match self {
            Self::Static(backend) => backend.start().await,
            Self::Command(backend) => backend.start().await,
        }
    }

    async fn public_address(&self) -> anyhow::Result<Option<IpAddr>> {
        match self {
            Self::Static(backend) => backend.public_address().await,
            Self::Command(backend) => backend.public_address().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(status: &str, start: &str, address: &str) -> CommandBackend {
        CommandBackend::new(
            "i-0123".to_owned(),
            "ap-southeast-2".to_owned(),
            BackendCommands {
                status: status.to_owned(),
                start: start.to_owned(),
                address: address.to_owned(),
            },
        )
    }

    #[test]
    fn parses_states() {
        assert_eq!("running".parse::<BackendState>().unwrap(), BackendState::Running);
        assert_eq!("stopped".parse::<BackendState>().unwrap(), BackendState::Stopped);
        assert!("pending".parse::<BackendState>().is_err());
        assert_eq!(BackendState::Stopped.as_ref(), "stopped");
    }

    #[test]
    fn substitutes_placeholders() {
        let backend = commands("aws ec2 describe --id {instance} --region {region}", "", "");
        assert_eq!(
            backend.render(&backend.commands.status),
            "aws ec2 describe --id i-0123 --region ap-southeast-2"
        );
    }

    #[tokio::test]
    async fn command_backend_reads_stdout() {
        let backend = commands("echo RUNNING", "true", "echo ' 10.1.2.3 '");
        assert_eq!(backend.status().await.unwrap(), BackendState::Running);
        backend.start().await.unwrap();
        assert_eq!(
            backend.public_address().await.unwrap(),
            Some("10.1.2.3".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn command_backend_maps_unknown_and_missing() {
        let backend = commands("echo pending", "exit 3", "echo None");
        assert_eq!(backend.status().await.unwrap(), BackendState::Unknown);
        assert!(backend.start().await.is_err());
        assert_eq!(backend.public_address().await.unwrap(), None);

        let backend = commands("echo stopped", "true", "echo not-an-ip");
        assert_eq!(backend.status().await.unwrap(), BackendState::Stopped);
        assert!(backend.public_address().await.is_err());
    }

    #[tokio::test]
    async fn static_backend_is_always_running() {
        let backend = Backend::Static(StaticBackend::new("192.0.2.7".parse().unwrap()));
        assert_eq!(backend.status().await.unwrap(), BackendState::Running);
        backend.start().await.unwrap();
        assert_eq!(
            backend.public_address().await.unwrap(),
            Some("192.0.2.7".parse().unwrap())
        );
    }
}
