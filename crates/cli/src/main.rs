// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bbl: bootstrap a BOSH director and its network on any supported IaaS

mod color;
mod commands;
mod credentials;
mod exit_error;
mod output;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use bbl_core::Iaas;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;
use crate::credentials::CredentialArgs;

#[derive(Parser)]
#[command(
    name = "bbl",
    version,
    about = "Bootstrap a BOSH director and its network on a cloud",
    styles = color::styles()
)]
pub(crate) struct Cli {
    /// Directory holding the environment state
    #[arg(long, short = 's', env = "BBL_STATE_DIR", default_value = ".", global = true)]
    pub state_dir: PathBuf,

    /// Infrastructure to target: aws, gcp, azure, openstack, cloudstack or vsphere
    #[arg(long, env = "BBL_IAAS", global = true)]
    pub iaas: Option<Iaas>,

    /// Log at debug level, including tool output
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    #[arg(long, env = "BBL_TERRAFORM_BINARY", default_value = "terraform", global = true)]
    pub terraform_binary: String,

    #[arg(long, env = "BBL_BOSH_BINARY", default_value = "bosh", global = true)]
    pub bosh_binary: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Logs go to stderr; stdout carries only command output.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug,hyper=info,hyper_util=info,russh=info")
    } else {
        EnvFilter::try_from_env("BBL_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();
}

/// Ctrl-C stops the run after the current external command returns.
fn cancel_on_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping");
            cancel.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::from(exit_error::USAGE) } else { ExitCode::SUCCESS };
        }
    };
    init_logging(cli.debug);

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    match commands::run(cli, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(hint) = exit_error::hint(&err) {
                eprintln!("{}", color::context(hint));
            }
            ExitCode::from(exit_error::exit_code(&err))
        }
    }
}
