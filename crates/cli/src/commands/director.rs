// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;
use bbl_engine::SshTarget;
use clap::Args;

use super::CliEngine;
use crate::output;

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct SshTargetArgs {
    /// Open a shell on the jumpbox
    #[arg(long)]
    pub jumpbox: bool,

    /// Open a shell on the director, through the jumpbox
    #[arg(long)]
    pub director: bool,
}

#[derive(Args)]
pub struct SshArgs {
    #[command(flatten)]
    pub target: SshTargetArgs,

    /// Run this command instead of an interactive shell
    #[arg(long)]
    pub cmd: Option<String>,
}

impl SshTargetArgs {
    pub fn target(&self) -> SshTarget {
        if self.director {
            SshTarget::Director
        } else {
            SshTarget::Jumpbox
        }
    }
}

pub fn print_env(engine: &CliEngine) -> Result<()> {
    for (name, value) in engine.print_env()? {
        println!("{}", output::shell_export(name, &value));
    }
    Ok(())
}

pub async fn ssh(engine: &CliEngine, args: &SshArgs) -> Result<()> {
    engine.ssh(args.target.target(), args.cmd.clone()).await?;
    Ok(())
}
