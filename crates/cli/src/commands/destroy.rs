// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{BufRead, Write};

use anyhow::Result;
use bbl_engine::DestroyOptions;
use clap::Args;

use super::{credentials, CliEngine};
use crate::color;
use crate::Cli;

#[derive(Args)]
pub struct DestroyArgs {
    /// Do not ask for confirmation
    #[arg(long, short = 'n')]
    pub no_confirm: bool,

    /// Destroy even if the director still manages deployments
    #[arg(long)]
    pub skip_deployment_check: bool,
}

/// Whether `answer` agrees to the prompt.
pub fn confirmed(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn ask(env_id: &str, input: &mut impl BufRead) -> Result<bool> {
    eprint!(
        "{} ",
        color::warn(&format!(
            "Are you sure you want to delete infrastructure for {env_id}? This operation cannot be undone!"
        ))
    );
    std::io::stderr().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(confirmed(&answer))
}

pub async fn destroy(engine: CliEngine, cli: &Cli, args: &DestroyArgs) -> Result<()> {
    let state = engine.state()?;
    if state.is_provisioned()
        && !args.no_confirm
        && !ask(&state.env_id, &mut std::io::stdin().lock())?
    {
        eprintln!("Not destroying {}", color::header(&state.env_id));
        return Ok(());
    }

    let options = DestroyOptions {
        credentials: credentials(cli, state.iaas)?,
        skip_deployment_check: args.skip_deployment_check,
    };
    engine.destroy(options).await?;
    eprintln!("Destroyed {}", color::header(&state.env_id));
    Ok(())
}

#[cfg(test)]
#[path = "destroy_tests.rs"]
mod tests;
