// Package backends - apt-get/dpkg and Homebrew

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::port::{CommandOutcome, CommandRunner, ShellCommand};

/// Whether commands are actually executed
///
/// Passed by value to every operation. Operations that must run even in
/// dry-run derive a forced-live copy instead of flipping shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionContext {
    dry_run: bool,
}

impl ExecutionContext {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn live() -> Self {
        Self::new(false)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn forced_live(&self) -> Self {
        Self::live()
    }
}

/// Package operation with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOp {
    List(Vec<String>),
    Install(Vec<String>),
    Remove(Vec<String>),
    Update,
    Upgrade,
    Clean,
}

impl PackageOp {
    pub fn name(&self) -> &'static str {
        match self {
            PackageOp::List(_) => "list",
            PackageOp::Install(_) => "install",
            PackageOp::Remove(_) => "remove",
            PackageOp::Update => "update",
            PackageOp::Upgrade => "upgrade",
            PackageOp::Clean => "clean",
        }
    }
}

/// Supported package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageBackend {
    AptGet,
    Brew,
}

impl fmt::Display for PackageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PackageBackend {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "apt-get" | "aptget" | "apt" => Some(PackageBackend::AptGet),
            "brew" => Some(PackageBackend::Brew),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PackageBackend::AptGet => "apt-get",
            PackageBackend::Brew => "brew",
        }
    }

    /// Command for `op`, and the context it must run under
    ///
    /// # Errors
    /// - AppError::Validation when install/remove get no packages
    pub fn plan(&self, op: &PackageOp, ctx: ExecutionContext) -> Result<(ShellCommand, ExecutionContext)> {
        let (line, ctx) = match (self, op) {
            (PackageBackend::AptGet, PackageOp::List(pkgs)) => {
                (with_packages("dpkg -l", pkgs), ctx.forced_live())
            }
            (PackageBackend::Brew, PackageOp::List(pkgs)) => {
                (with_packages("brew list", pkgs), ctx.forced_live())
            }
            (_, PackageOp::Install(pkgs)) | (_, PackageOp::Remove(pkgs)) if pkgs.is_empty() => {
                return Err(AppError::Validation(format!(
                    "{} {} needs at least one package",
                    self.name(),
                    op.name()
                )));
            }
            (PackageBackend::AptGet, PackageOp::Install(pkgs)) => {
                (with_packages("apt-get -y install", pkgs), ctx)
            }
            (PackageBackend::Brew, PackageOp::Install(pkgs)) => {
                (with_packages("brew install", pkgs), ctx)
            }
            (PackageBackend::AptGet, PackageOp::Remove(pkgs)) => {
                (with_packages("apt-get -y remove", pkgs), ctx)
            }
            (PackageBackend::Brew, PackageOp::Remove(pkgs)) => {
                (with_packages("brew remove", pkgs), ctx)
            }
            (PackageBackend::AptGet, PackageOp::Update) => ("apt-get update".to_string(), ctx),
            (PackageBackend::Brew, PackageOp::Update) => ("brew update".to_string(), ctx),
            // dry-run upgrades run a harmless query instead
            (PackageBackend::AptGet, PackageOp::Upgrade) => {
                let line = if ctx.is_dry_run() {
                    "apt-get -s upgrade"
                } else {
                    "apt-get -y upgrade"
                };
                (line.to_string(), ctx.forced_live())
            }
            (PackageBackend::Brew, PackageOp::Upgrade) => {
                let line = if ctx.is_dry_run() {
                    "brew outdated"
                } else {
                    "brew upgrade"
                };
                (line.to_string(), ctx.forced_live())
            }
            (PackageBackend::AptGet, PackageOp::Clean) => ("apt-get clean".to_string(), ctx),
            (PackageBackend::Brew, PackageOp::Clean) => ("brew cleanup".to_string(), ctx),
        };

        let mut command = ShellCommand::new(line);
        // mutating apt-get calls must not prompt
        if *self == PackageBackend::AptGet && !matches!(op, PackageOp::List(_) | PackageOp::Clean) {
            command = command.with_env("DEBIAN_FRONTEND", "noninteractive");
        }
        Ok((command, ctx))
    }
}

fn with_packages(base: &str, pkgs: &[String]) -> String {
    if pkgs.is_empty() {
        base.to_string()
    } else {
        format!("{base} {}", shell_words::join(pkgs))
    }
}

/// What every package backend can do
#[async_trait]
pub trait PackageOperations: Send + Sync {
    async fn list(&self, ctx: ExecutionContext, pkgs: &[String]) -> Result<CommandOutcome>;
    async fn install(&self, ctx: ExecutionContext, pkgs: &[String]) -> Result<CommandOutcome>;
    async fn remove(&self, ctx: ExecutionContext, pkgs: &[String]) -> Result<CommandOutcome>;
    async fn update(&self, ctx: ExecutionContext) -> Result<CommandOutcome>;
    async fn upgrade(&self, ctx: ExecutionContext) -> Result<CommandOutcome>;
    async fn clean(&self, ctx: ExecutionContext) -> Result<CommandOutcome>;
}

/// Runs a backend's commands through a CommandRunner
pub struct PackageManager {
    backend: PackageBackend,
    runner: Arc<dyn CommandRunner>,
}

impl PackageManager {
    pub fn new(backend: PackageBackend, runner: Arc<dyn CommandRunner>) -> Self {
        Self { backend, runner }
    }

    pub fn backend(&self) -> PackageBackend {
        self.backend
    }

    /// Plan and run one operation, honouring dry-run
    pub async fn execute(&self, op: PackageOp, ctx: ExecutionContext) -> Result<CommandOutcome> {
        let (command, ctx) = self.backend.plan(&op, ctx)?;

        if ctx.is_dry_run() {
            info!(backend = %self.backend, command = %command.line, "Dry run, not executing");
            return Ok(CommandOutcome::Skipped);
        }

        info!(backend = %self.backend, command = %command.line, "Running package command");
        let outcome = self.runner.run(&command).await?;
        if !outcome.is_success() {
            warn!(backend = %self.backend, command = %command.line, outcome = ?outcome, "Package command failed");
        }
        Ok(outcome)
    }
}

#[async_trait]
impl PackageOperations for PackageManager {
    async fn list(&self, ctx: ExecutionContext, pkgs: &[String]) -> Result<CommandOutcome> {
        self.execute(PackageOp::List(pkgs.to_vec()), ctx).await
    }

    async fn install(&self, ctx: ExecutionContext, pkgs: &[String]) -> Result<CommandOutcome> {
        self.execute(PackageOp::Install(pkgs.to_vec()), ctx).await
    }

    async fn remove(&self, ctx: ExecutionContext, pkgs: &[String]) -> Result<CommandOutcome> {
        self.execute(PackageOp::Remove(pkgs.to_vec()), ctx).await
    }

    async fn update(&self, ctx: ExecutionContext) -> Result<CommandOutcome> {
        self.execute(PackageOp::Update, ctx).await
    }

    async fn upgrade(&self, ctx: ExecutionContext) -> Result<CommandOutcome> {
        self.execute(PackageOp::Upgrade, ctx).await
    }

    async fn clean(&self, ctx: ExecutionContext) -> Result<CommandOutcome> {
        self.execute(PackageOp::Clean, ctx).await
    }
}
