// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The up/destroy state machine.
//!
//! Every phase consults [`State`] to decide whether it still has work to
//! do, and the state is checkpointed as soon as each external tool returns,
//! whatever its outcome. Re-running a failed command resumes from the last
//! checkpoint.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use bbl_adapters::{BoshCli, CommandSpec, DirectorConnector, DirectorError, Runner, Terraform};
use bbl_core::{
    generate_env_id, validate_env_id, BblError, Iaas, IaasCredentials, Lb, LbType, Secret, State,
};
use bbl_storage::StateStore;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{self, ConfigApplier};
use crate::deployer::{self, Deployer};
use crate::provisioner::Provisioner;
use crate::{iaas, keypair};

const DIRECTOR_KEY_FILE: &str = "director-jumpbox.key";

/// Collaborators injected into an [`Engine`].
#[derive(Clone)]
pub struct EngineConfig<R, C> {
    pub runner: R,
    pub connector: C,
    pub terraform_binary: String,
    pub bosh_binary: String,
    pub ssh_binary: String,
    pub cancel: CancellationToken,
}

impl<R, C> EngineConfig<R, C> {
    pub fn new(runner: R, connector: C) -> Self {
        Self {
            runner,
            connector,
            terraform_binary: "terraform".to_string(),
            bosh_binary: "bosh".to_string(),
            ssh_binary: "ssh".to_string(),
            cancel: CancellationToken::new(),
        }
    }
}

/// What the user asked `up` for. Unset fields keep the stored values.
#[derive(Debug, Clone, Default)]
pub struct UpOptions {
    pub iaas: Option<Iaas>,
    pub env_id: Option<String>,
    pub credentials: Option<IaasCredentials>,
    pub no_director: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DestroyOptions {
    pub credentials: Option<IaasCredentials>,
    pub skip_deployment_check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SshTarget {
    Jumpbox,
    Director,
}

pub struct Engine<R, C> {
    store: StateStore,
    provisioner: Provisioner<R>,
    deployer: Deployer<R>,
    configs: ConfigApplier<C>,
    runner: R,
    ssh_binary: String,
    cancel: CancellationToken,
}

fn log_phase<T>(phase: &'static str, start: Instant, result: &Result<T, BblError>) {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(_) => tracing::info!(phase, elapsed_ms, "completed"),
        Err(e) if e.is_cancelled() => tracing::warn!(phase, elapsed_ms, "interrupted"),
        Err(e) => tracing::error!(phase, error = %e, elapsed_ms, "failed"),
    }
}

/// Fold invocation options into `state`.
fn merge_options(state: &mut State, options: UpOptions) -> Result<(), BblError> {
    if let Some(requested) = options.iaas {
        match state.iaas {
            Some(stored) if stored != requested => {
                return Err(BblError::UserInput(format!(
                    "the environment runs on {stored}; it cannot be switched to {requested}"
                )));
            }
            _ => state.iaas = Some(requested),
        }
    }
    merge_credentials(state, options.credentials)?;

    match options.env_id {
        Some(env_id) if state.env_id.is_empty() => {
            validate_env_id(&env_id)?;
            state.env_id = env_id;
        }
        Some(env_id) if env_id != state.env_id => {
            return Err(BblError::UserInput(format!(
                "the state directory holds environment {:?}, not {env_id:?}",
                state.env_id
            )));
        }
        Some(_) => {}
        None if state.env_id.is_empty() => {
            state.env_id = generate_env_id(Utc::now(), &mut rand::thread_rng());
            tracing::info!(env_id = %state.env_id, "generated env id");
        }
        None => {}
    }

    if options.no_director {
        if state.director.deployed {
            return Err(BblError::UserInput(
                "--no-director cannot be used on an environment that has a director".into(),
            ));
        }
        state.no_director = true;
    }
    Ok(())
}

/// Credentials from this invocation replace the stored ones for the same
/// IaaS.
fn merge_credentials(
    state: &mut State,
    credentials: Option<IaasCredentials>,
) -> Result<(), BblError> {
    let Some(credentials) = credentials else {
        return Ok(());
    };
    let given = credentials.iaas();
    match state.iaas {
        Some(iaas) if iaas != given => {
            return Err(BblError::UserInput(format!(
                "credentials are for {given} but the environment runs on {iaas}"
            )));
        }
        Some(_) => {}
        None => state.iaas = Some(given),
    }
    state.iaas_credentials = Some(credentials);
    Ok(())
}

fn validate_lb(state: &State, lb: &Lb) -> Result<(), BblError> {
    let iaas = state
        .iaas
        .ok_or_else(|| BblError::UserInput("no environment found; run `bbl up` first".into()))?;
    if lb.lb_type == LbType::None {
        return Err(BblError::UserInput("--type must be \"concourse\" or \"cf\"".into()));
    }
    iaas::validate_lb(iaas, lb.lb_type)?;
    if lb.lb_type == LbType::Cf && (lb.cert.is_empty() || lb.key.is_empty()) {
        return Err(BblError::UserInput("cf load balancers need --cert and --key".into()));
    }
    if lb.lb_type != LbType::Cf && !lb.domain.is_empty() {
        return Err(BblError::UserInput(
            "--domain is only supported for cf load balancers".into(),
        ));
    }
    Ok(())
}

impl<R: Runner, C: DirectorConnector> Engine<R, C> {
    pub fn new(store: StateStore, config: EngineConfig<R, C>) -> Self {
        let EngineConfig { runner, connector, terraform_binary, bosh_binary, ssh_binary, cancel } =
            config;
        Self {
            store,
            provisioner: Provisioner::new(Terraform::new(runner.clone(), terraform_binary)),
            deployer: Deployer::new(BoshCli::new(runner.clone(), bosh_binary)),
            configs: ConfigApplier::new(connector),
            runner,
            ssh_binary,
            cancel,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// The stored state, checked for cross-field consistency.
    pub fn state(&self) -> Result<State, BblError> {
        let state = self.store.get()?;
        state.check_invariants()?;
        Ok(state)
    }

    fn checkpoint(&self, state: &State) -> Result<(), BblError> {
        self.store.set(state).map_err(|e| {
            tracing::error!(error = %e, "failed to checkpoint state");
            BblError::from(e)
        })
    }

    fn check_cancelled(&self) -> Result<(), BblError> {
        if self.cancel.is_cancelled() {
            return Err(BblError::Cancelled);
        }
        Ok(())
    }

    /// Log and checkpoint after a phase, then surface its result.
    fn settle<T>(
        &self,
        phase: &'static str,
        start: Instant,
        state: &State,
        result: Result<T, BblError>,
    ) -> Result<T, BblError> {
        log_phase(phase, start, &result);
        let saved = self.checkpoint(state);
        let value = result?;
        saved?;
        Ok(value)
    }

    /// Bring the environment to its steady state.
    pub async fn up(&self, options: UpOptions) -> Result<State, BblError> {
        let mut state = self.state()?;
        merge_options(&mut state, options)?;
        self.converge(&mut state).await?;
        Ok(state)
    }

    async fn converge(&self, state: &mut State) -> Result<(), BblError> {
        let span = tracing::info_span!("up", env_id = %state.env_id);
        self.converge_phases(state).instrument(span).await
    }

    async fn converge_phases(&self, state: &mut State) -> Result<(), BblError> {
        let started = Instant::now();
        let start = Instant::now();
        let validated = iaas::validate_credentials(state).and_then(|()| match state.iaas {
            Some(iaas) => iaas::validate_lb(iaas, state.lb.lb_type),
            None => Err(BblError::UserInput("--iaas must be provided".into())),
        });
        log_phase("validate-creds", start, &validated);
        validated?;
        self.checkpoint(state)?;

        if keypair::sync(state)? {
            self.checkpoint(state)?;
        }

        self.check_cancelled()?;
        let start = Instant::now();
        let result = self.provisioner.apply(&self.store, state, &self.cancel).await;
        self.settle("tf-apply", start, state, result)?;

        if state.no_director {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::info!(elapsed_ms, "up complete without a director");
            return Ok(());
        }

        self.check_cancelled()?;
        let start = Instant::now();
        let result = self.deployer.create_jumpbox(&self.store, state, &self.cancel).await;
        self.settle("create-jumpbox", start, state, result)?;

        self.check_cancelled()?;
        let start = Instant::now();
        let result = self.deployer.create_director(&self.store, state, &self.cancel).await;
        self.settle("create-director", start, state, result)?;

        self.check_cancelled()?;
        let start = Instant::now();
        let result = self.configs.apply(&self.store, state).await;
        self.configs.disconnect().await;
        self.settle("apply-configs", start, state, result)?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(elapsed_ms, "up complete");
        Ok(())
    }

    /// Fail when the director still manages deployments. An unreachable
    /// director only warns.
    async fn check_deployments(&self, state: &State) -> Result<(), BblError> {
        let target = config::director_target(state)?;
        let result = self.configs.deployments(&target).await;
        self.configs.disconnect().await;
        match result {
            Ok(names) if names.is_empty() => Ok(()),
            Ok(names) => Err(BblError::UserInput(format!(
                "the director still manages deployments: {}; delete them first or pass \
                 --skip-deployment-check",
                names.join(", ")
            ))),
            Err(e @ (DirectorError::Proxy(_) | DirectorError::Unreachable { .. })) => {
                tracing::warn!(error = %e, "director unreachable, skipping deployment check");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Tear everything down and remove the state directory.
    pub async fn destroy(self, options: DestroyOptions) -> Result<(), BblError> {
        let mut state = self.state()?;
        if !state.is_provisioned() {
            tracing::info!("nothing provisioned; removing state");
            self.store.destroy()?;
            return Ok(());
        }
        merge_credentials(&mut state, options.credentials)?;

        let span = tracing::info_span!("destroy", env_id = %state.env_id);
        self.teardown(&mut state, options.skip_deployment_check).instrument(span).await?;
        self.store.destroy()?;
        Ok(())
    }

    async fn teardown(&self, state: &mut State, skip_deployment_check: bool) -> Result<(), BblError> {
        let started = Instant::now();
        let start = Instant::now();
        let validated = iaas::validate_credentials(state);
        log_phase("validate-creds", start, &validated);
        validated?;

        if state.director.deployed && !skip_deployment_check {
            self.check_deployments(state).await?;
        }

        self.check_cancelled()?;
        let start = Instant::now();
        let result = self.deployer.delete_director(&self.store, state, &self.cancel).await;
        self.settle("delete-director", start, state, result)?;

        self.check_cancelled()?;
        let start = Instant::now();
        let result = self.deployer.delete_jumpbox(&self.store, state, &self.cancel).await;
        self.settle("delete-jumpbox", start, state, result)?;

        self.check_cancelled()?;
        let start = Instant::now();
        let result = self.provisioner.destroy(&self.store, state, &self.cancel).await;
        self.settle("tf-destroy", start, state, result)?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(elapsed_ms, "destroy complete");
        Ok(())
    }

    /// Regenerate the jumpbox SSH key (and the cloud key pair where one is
    /// uploaded), then converge.
    pub async fn rotate(&self) -> Result<State, BblError> {
        let mut state = self.state()?;
        if !state.is_provisioned() {
            return Err(BblError::UserInput("no environment found; run `bbl up` first".into()));
        }
        let variables =
            deployer::drop_vars_store_key(state.jumpbox.variables.expose(), "jumpbox_ssh")?;
        state.jumpbox.variables = Secret::new(variables);
        if let Some(iaas) = state.iaas {
            if iaas::row(iaas).needs_keypair {
                state.key_pair = keypair::generate()?;
                tracing::info!(%iaas, "rotated key pair");
            }
        }
        self.checkpoint(&state)?;
        self.converge(&mut state).await?;
        Ok(state)
    }

    /// Attach load balancers of `lb.lb_type`, then converge.
    pub async fn create_lbs(&self, lb: Lb) -> Result<State, BblError> {
        let mut state = self.state()?;
        validate_lb(&state, &lb)?;
        if state.lb.lb_type != LbType::None && state.lb.lb_type != lb.lb_type {
            return Err(BblError::UserInput(format!(
                "{} load balancers already exist; delete them first",
                state.lb.lb_type
            )));
        }
        state.lb = lb;
        self.checkpoint(&state)?;
        self.converge(&mut state).await?;
        Ok(state)
    }

    /// Replace the certificate of the existing load balancers.
    pub async fn update_lbs(
        &self,
        cert: String,
        key: Secret,
        chain: String,
    ) -> Result<State, BblError> {
        let mut state = self.state()?;
        if state.lb.lb_type == LbType::None {
            return Err(BblError::UserInput("no load balancers to update".into()));
        }
        let lb = Lb { cert, key, chain, ..state.lb.clone() };
        validate_lb(&state, &lb)?;
        if lb == state.lb {
            tracing::info!("load balancer certificate unchanged");
            return Ok(state);
        }
        state.lb = lb;
        self.checkpoint(&state)?;
        self.converge(&mut state).await?;
        Ok(state)
    }

    pub async fn delete_lbs(&self) -> Result<State, BblError> {
        let mut state = self.state()?;
        if state.lb.lb_type == LbType::None {
            tracing::info!("no load balancers to delete");
            return Ok(state);
        }
        state.lb = Lb::default();
        self.checkpoint(&state)?;
        self.converge(&mut state).await?;
        Ok(state)
    }

    /// Provisioner outputs describing the load balancers.
    pub fn lbs(&self) -> Result<BTreeMap<String, serde_json::Value>, BblError> {
        let state = self.state()?;
        if state.lb.lb_type == LbType::None {
            return Err(BblError::UserInput("no load balancers found".into()));
        }
        Ok(state
            .latest_tf_output
            .into_iter()
            .filter(|(name, _)| iaas::is_lb_output(name))
            .collect())
    }

    pub fn cloud_config(&self) -> Result<String, BblError> {
        config::cloud_config(&self.state()?)
    }

    pub fn runtime_config(&self) -> Result<String, BblError> {
        config::runtime_config(&self.store)
    }

    /// The jumpbox private key, written under `vars/`.
    fn jumpbox_key_file(&self, state: &State) -> Result<PathBuf, BblError> {
        let key = deployer::jumpbox_private_key(state)?
            .ok_or_else(|| BblError::UserInput("no jumpbox has been deployed".into()))?;
        deployer::write_jumpbox_key(&self.store, &key)
    }

    /// Variables a `bosh` CLI needs to reach the director.
    pub fn print_env(&self) -> Result<Vec<(&'static str, String)>, BblError> {
        let state = self.state()?;
        if !state.director.deployed {
            return Err(BblError::UserInput("no director has been deployed".into()));
        }
        let key_path = self.jumpbox_key_file(&state)?;
        let director = &state.director;
        Ok(vec![
            ("BOSH_CLIENT", director.username.clone()),
            ("BOSH_CLIENT_SECRET", director.password.expose().to_string()),
            ("BOSH_CA_CERT", director.ssl_ca.clone()),
            ("BOSH_ENVIRONMENT", director.address.clone()),
            ("BOSH_ALL_PROXY", deployer::all_proxy(&state.jumpbox.url, &key_path)),
            ("JUMPBOX_PRIVATE_KEY", key_path.display().to_string()),
        ])
    }

    /// Interactive `ssh` to the jumpbox, or through it to the director.
    pub async fn ssh(&self, target: SshTarget, command: Option<String>) -> Result<(), BblError> {
        let state = self.state()?;
        let host = state
            .jumpbox_host()
            .ok_or_else(|| BblError::UserInput("no jumpbox has been deployed".into()))?;
        let jumpbox_key = self.jumpbox_key_file(&state)?;

        let mut args: Vec<String> = vec![
            "-o".into(),
            "StrictHostKeyChecking=no".into(),
            "-o".into(),
            "ServerAliveInterval=300".into(),
        ];
        match target {
            SshTarget::Jumpbox => {
                args.extend([
                    "-i".into(),
                    jumpbox_key.display().to_string(),
                    format!("jumpbox@{host}"),
                ]);
            }
            SshTarget::Director => {
                let ip = state.output_str("director__internal_ip").filter(|_| state.director.deployed);
                let ip = ip.ok_or_else(|| BblError::UserInput("no director has been deployed".into()))?;
                let key = deployer::vars_store_value(
                    state.director.variables.expose(),
                    &["jumpbox_ssh", "private_key"],
                )?
                .ok_or_else(|| {
                    BblError::InvariantViolation("the director SSH key is missing from state".into())
                })?;
                let director_key = deployer::write_key(&self.store, DIRECTOR_KEY_FILE, &key)?;
                args.extend([
                    "-o".into(),
                    format!(
                        "ProxyCommand=ssh -o StrictHostKeyChecking=no -i {} -W %h:%p jumpbox@{host}",
                        jumpbox_key.display()
                    ),
                    "-i".into(),
                    director_key.display().to_string(),
                    format!("jumpbox@{ip}"),
                ]);
            }
        }
        args.extend(command);

        let spec = CommandSpec::new("ssh", &self.ssh_binary).args(args).interactive();
        let out = self.runner.run(spec, &self.cancel).await?;
        if out.interrupted {
            return Err(BblError::Cancelled);
        }
        if !out.success() {
            return Err(BblError::ExternalTool {
                tool: "ssh".into(),
                exit_code: out.exit_code,
                tail: out.tail,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
