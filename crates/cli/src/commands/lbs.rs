// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use anyhow::Result;
use bbl_core::{BblError, Lb, LbType, Secret};
use clap::Args;

use super::CliEngine;
use crate::color;

#[derive(Args)]
pub struct CreateLbsArgs {
    /// Load balancer type: concourse or cf
    #[arg(long = "type")]
    pub lb_type: LbType,

    /// Certificate file, required for cf
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Private key file, required for cf
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Certificate chain file
    #[arg(long)]
    pub chain: Option<PathBuf>,

    /// System domain for cf DNS records
    #[arg(long)]
    pub domain: Option<String>,
}

#[derive(Args)]
pub struct UpdateLbsArgs {
    /// Certificate file
    #[arg(long)]
    pub cert: PathBuf,

    /// Private key file
    #[arg(long)]
    pub key: PathBuf,

    /// Certificate chain file
    #[arg(long)]
    pub chain: Option<PathBuf>,
}

fn read_file(flag: &str, path: &Path) -> Result<String, BblError> {
    std::fs::read_to_string(path)
        .map_err(|e| BblError::UserInput(format!("--{flag}: cannot read {}: {e}", path.display())))
}

fn read_optional(flag: &str, path: Option<&Path>) -> Result<String, BblError> {
    path.map_or_else(|| Ok(String::new()), |path| read_file(flag, path))
}

impl CreateLbsArgs {
    pub fn to_lb(&self) -> Result<Lb, BblError> {
        Ok(Lb {
            lb_type: self.lb_type,
            cert: read_optional("cert", self.cert.as_deref())?,
            key: Secret::new(read_optional("key", self.key.as_deref())?),
            chain: read_optional("chain", self.chain.as_deref())?,
            domain: self.domain.clone().unwrap_or_default(),
        })
    }
}

pub async fn create(engine: &CliEngine, args: &CreateLbsArgs) -> Result<()> {
    let state = engine.create_lbs(args.to_lb()?).await?;
    eprintln!("Created {} load balancers for {}", state.lb.lb_type, color::header(&state.env_id));
    Ok(())
}

pub async fn update(engine: &CliEngine, args: &UpdateLbsArgs) -> Result<()> {
    let cert = read_file("cert", &args.cert)?;
    let key = Secret::new(read_file("key", &args.key)?);
    let chain = read_optional("chain", args.chain.as_deref())?;
    let state = engine.update_lbs(cert, key, chain).await?;
    eprintln!("Updated load balancers for {}", color::header(&state.env_id));
    Ok(())
}

pub async fn delete(engine: &CliEngine) -> Result<()> {
    let state = engine.delete_lbs().await?;
    eprintln!("No load balancers attached to {}", color::header(&state.env_id));
    Ok(())
}

#[cfg(test)]
#[path = "lbs_tests.rs"]
mod tests;
