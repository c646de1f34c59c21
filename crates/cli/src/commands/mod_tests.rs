// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bbl_core::LbType;
use bbl_engine::SshTarget;
use clap::Parser;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("bbl").chain(args.iter().copied()))
}

#[yare::parameterized(
    ca_cert   = { "director-ca-cert" },
    env_id    = { "env-id" },
    ssh_key   = { "ssh-key" },
    print_env = { "print-env" },
    delete    = { "delete-lbs" },
    runtime   = { "runtime-config" },
)]
fn subcommands_use_kebab_case(name: &str) {
    assert!(parse(&[name]).is_ok(), "{name}");
}

#[test]
fn ssh_needs_exactly_one_target() {
    assert!(parse(&["ssh"]).is_err());
    assert!(parse(&["ssh", "--jumpbox", "--director"]).is_err());

    let cli = parse(&["ssh", "--director", "--cmd", "uptime"]).unwrap();
    let Command::Ssh(args) = cli.command else { panic!("expected ssh") };
    assert_eq!(args.target.target(), SshTarget::Director);
    assert_eq!(args.cmd.as_deref(), Some("uptime"));
}

#[test]
fn lb_type_is_validated_while_parsing() {
    assert!(parse(&["create-lbs", "--type", "haproxy"]).is_err());
    let cli = parse(&["create-lbs", "--type", "concourse"]).unwrap();
    let Command::CreateLbs(args) = cli.command else { panic!("expected create-lbs") };
    assert_eq!(args.lb_type, LbType::Concourse);
}

#[test]
fn unknown_iaas_is_rejected() {
    assert!(parse(&["up", "--iaas", "digitalocean"]).is_err());
}

#[test]
fn global_flags_follow_the_subcommand() {
    let cli = parse(&["destroy", "--no-confirm", "--state-dir", "/tmp/env", "--debug"]).unwrap();
    assert_eq!(cli.state_dir, std::path::PathBuf::from("/tmp/env"));
    assert!(cli.debug);
    let Command::Destroy(args) = cli.command else { panic!("expected destroy") };
    assert!(args.no_confirm && !args.skip_deployment_check);
}
