// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod destroy;
pub mod director;
pub mod lbs;
pub mod state;
pub mod up;

use anyhow::Result;
use bbl_adapters::{ProxiedConnector, SubprocessRunner};
use bbl_core::{BblError, Iaas, IaasCredentials};
use bbl_engine::{Engine, EngineConfig};
use bbl_storage::StateStore;
use clap::Subcommand;
use tokio_util::sync::CancellationToken;

use crate::output::{self, OutputFormat};
use crate::Cli;

pub type CliEngine = Engine<SubprocessRunner, ProxiedConnector>;

#[derive(Subcommand)]
pub enum Command {
    /// Create the environment, or bring it up to date
    Up(up::UpArgs),
    /// Tear the environment down and delete its state
    Destroy(destroy::DestroyArgs),
    /// Regenerate the jumpbox SSH key and the IaaS key pair
    Rotate,
    /// Print shell exports for the bosh CLI
    PrintEnv,
    /// SSH to the jumpbox, or through it to the director
    Ssh(director::SshArgs),
    /// Show the load balancer outputs
    Lbs {
        #[arg(long = "output", short = 'o', value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Attach load balancers
    CreateLbs(lbs::CreateLbsArgs),
    /// Replace the load balancer certificate
    UpdateLbs(lbs::UpdateLbsArgs),
    /// Remove the load balancers
    DeleteLbs,
    /// Print the cloud-config for the current environment
    CloudConfig,
    /// Print the runtime-config uploaded to the director
    RuntimeConfig,
    /// Print the jumpbox address
    JumpboxAddress,
    /// Print the director address
    DirectorAddress,
    /// Print the director username
    DirectorUsername,
    /// Print the director password
    DirectorPassword,
    /// Print the director CA certificate
    DirectorCaCert,
    /// Print the jumpbox SSH private key
    SshKey,
    /// Print the environment name
    EnvId,
    /// Print the provisioner outputs as JSON
    Outputs,
    /// Print the bbl version
    Version,
}

fn open_engine(cli: &Cli, cancel: CancellationToken) -> Result<CliEngine, BblError> {
    let store = StateStore::open(&cli.state_dir)?;
    let mut config = EngineConfig::new(SubprocessRunner::new(), ProxiedConnector::new());
    config.terraform_binary = cli.terraform_binary.clone();
    config.bosh_binary = cli.bosh_binary.clone();
    config.cancel = cancel;
    Ok(Engine::new(store, config))
}

/// Credentials given on this invocation for the requested or stored IaaS.
fn credentials(cli: &Cli, stored: Option<Iaas>) -> Result<Option<IaasCredentials>, BblError> {
    match cli.iaas.or(stored) {
        Some(iaas) => cli.credentials.for_iaas(iaas),
        None => Ok(None),
    }
}

pub async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    if matches!(cli.command, Command::Version) {
        println!("bbl {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let engine = open_engine(&cli, cancel)?;

    match &cli.command {
        Command::Up(args) => up::up(&engine, &cli, args).await?,
        Command::Destroy(args) => destroy::destroy(engine, &cli, args).await?,
        Command::Rotate => up::rotate(&engine).await?,
        Command::PrintEnv => director::print_env(&engine)?,
        Command::Ssh(args) => director::ssh(&engine, args).await?,
        Command::Lbs { format } => output::print_values(&engine.lbs()?, *format)?,
        Command::CreateLbs(args) => lbs::create(&engine, args).await?,
        Command::UpdateLbs(args) => lbs::update(&engine, args).await?,
        Command::DeleteLbs => lbs::delete(&engine).await?,
        Command::CloudConfig => output::print_document(&engine.cloud_config()?),
        Command::RuntimeConfig => output::print_document(&engine.runtime_config()?),
        Command::JumpboxAddress => state::print(&engine, state::Field::JumpboxAddress)?,
        Command::DirectorAddress => state::print(&engine, state::Field::DirectorAddress)?,
        Command::DirectorUsername => state::print(&engine, state::Field::DirectorUsername)?,
        Command::DirectorPassword => state::print(&engine, state::Field::DirectorPassword)?,
        Command::DirectorCaCert => state::print(&engine, state::Field::DirectorCaCert)?,
        Command::SshKey => state::print(&engine, state::Field::SshKey)?,
        Command::EnvId => state::print(&engine, state::Field::EnvId)?,
        Command::Outputs => {
            println!("{}", serde_json::to_string_pretty(&engine.state()?.latest_tf_output)?)
        }
        Command::Version => {}
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
