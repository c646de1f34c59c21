// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;
use bbl_engine::UpOptions;
use clap::Args;

use super::{credentials, CliEngine};
use crate::color;
use crate::Cli;

#[derive(Args)]
pub struct UpArgs {
    /// Name for a new environment; generated when omitted
    #[arg(long, env = "BBL_ENV_ID")]
    pub name: Option<String>,

    /// Provision the network only, without a jumpbox or director
    #[arg(long)]
    pub no_director: bool,
}

pub async fn up(engine: &CliEngine, cli: &Cli, args: &UpArgs) -> Result<()> {
    let stored = engine.state()?;
    let options = UpOptions {
        iaas: cli.iaas,
        env_id: args.name.clone(),
        credentials: credentials(cli, stored.iaas)?,
        no_director: args.no_director,
    };
    let state = engine.up(options).await?;
    eprintln!("Environment {} is up", color::header(&state.env_id));
    Ok(())
}

pub async fn rotate(engine: &CliEngine) -> Result<()> {
    let state = engine.rotate().await?;
    eprintln!("Rotated keys for {}", color::header(&state.env_id));
    Ok(())
}
