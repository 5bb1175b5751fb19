// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Everything the lifecycle controller needs from the outside world.
//!
//! [`DaemonRuntime`] is the seam between the state machine and the real
//! daemon. [`SyncthingRuntime`] is the production implementation; tests
//! drive the controller with a scripted runtime instead.

use reqwest::blocking::Client;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::admin::{AdminApi, AdminClient, Endpoint};
use crate::cancel::CancelToken;
use crate::config_xml::ConfigXml;
use crate::error::{Error, Result};
use crate::notifier::Notifier;
use crate::process::{
    run_once, terminate, DaemonCommand, DaemonMatch, DaemonProcess, ExitCallback, KillPolicy,
    LaunchSpec,
};
use crate::settings::DaemonSettings;

const DEVICE_ID_TIMEOUT: Duration = Duration::from_secs(10);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
const RESET_TIMEOUT: Duration = Duration::from_secs(300);
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);
const HEALTH_PATH: &str = "/rest/noauth/health";

/// What a startup task should do before the daemon is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupPlan {
    /// One-shot reset to run first.
    pub reset: Option<DaemonCommand>,
    /// Launch the long-running daemon afterwards.
    pub serve: bool,
}

impl StartupPlan {
    pub const SERVE: StartupPlan = StartupPlan {
        reset: None,
        serve: true,
    };

    pub fn reset(command: DaemonCommand, serve: bool) -> Self {
        Self {
            reset: Some(command),
            serve,
        }
    }
}

/// A launched daemon owned by the controller.
pub trait RunningDaemon: Send {
    fn pid(&self) -> Option<u32>;
    /// Stop the daemon and wait for its wrapper thread.
    fn kill(&mut self);
}

impl RunningDaemon for DaemonProcess {
    fn pid(&self) -> Option<u32> {
        Some(DaemonProcess::pid(self))
    }

    fn kill(&mut self) {
        DaemonProcess::kill(self);
    }
}

pub trait DaemonRuntime: Send + Sync {
    /// Blocking preparation on the startup thread. Returns `None` when the
    /// plan does not launch the daemon.
    fn prepare(&self, plan: StartupPlan, cancel: &CancelToken) -> Result<Option<Endpoint>>;

    fn launch(&self, on_exit: ExitCallback) -> Result<Box<dyn RunningDaemon>>;

    /// True once the admin API answers.
    fn probe(&self, endpoint: &Endpoint) -> bool;

    /// Bind an admin client with its config loaded.
    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn AdminApi>>;
}

pub struct SyncthingRuntime {
    settings: DaemonSettings,
    config: ConfigXml,
    notifier: Arc<dyn Notifier>,
    output_log: PathBuf,
    policy: KillPolicy,
    probe: Client,
}

impl SyncthingRuntime {
    pub fn new(
        settings: DaemonSettings,
        notifier: Arc<dyn Notifier>,
        output_log: impl Into<PathBuf>,
    ) -> Result<Self> {
        let probe = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            config: ConfigXml::new(settings.home_dir()),
            settings,
            notifier,
            output_log: output_log.into(),
            policy: KillPolicy::default(),
            probe,
        })
    }

    fn spec(&self, command: DaemonCommand) -> LaunchSpec {
        LaunchSpec::new(&self.settings, command)
    }

    fn elevate(&self) -> Option<&[String]> {
        (self.settings.use_root && !self.settings.elevate_command.is_empty())
            .then_some(self.settings.elevate_command.as_slice())
    }

    fn ensure_config(&self) -> Result<()> {
        if self.config.exists() {
            return Ok(());
        }
        tracing::info!("no config in {}, generating", self.config.home().display());
        fs::create_dir_all(self.config.home())?;
        run_once(&self.spec(DaemonCommand::Generate), GENERATE_TIMEOUT)
            .map_err(|e| Error::ConfigUnreadable(format!("generate failed: {e}")))?;
        Ok(())
    }

    fn device_id(&self) -> Option<String> {
        match run_once(&self.spec(DaemonCommand::DeviceId), DEVICE_ID_TIMEOUT) {
            Ok(out) => {
                let id = out.stdout.trim().to_string();
                tracing::info!("local device ID {}", id);
                (!id.is_empty()).then_some(id)
            }
            Err(e) => {
                tracing::warn!("failed to query device ID: {}", e);
                None
            }
        }
    }
}

impl DaemonRuntime for SyncthingRuntime {
    fn prepare(&self, plan: StartupPlan, cancel: &CancelToken) -> Result<Option<Endpoint>> {
        cancel.check()?;
        if !terminate(
            &DaemonMatch::for_spec(&self.spec(DaemonCommand::Serve)),
            None,
            self.elevate(),
            &self.policy,
        ) {
            tracing::warn!("stray daemon processes survived termination");
        }

        if let Some(reset) = plan.reset {
            cancel.check()?;
            tracing::info!("running {}", reset.as_str());
            run_once(&self.spec(reset), RESET_TIMEOUT)?;
        }
        if !plan.serve {
            return Ok(None);
        }

        cancel.check()?;
        self.ensure_config()?;
        self.config.migrate_if_needed()?;
        let gui = self.config.read()?;

        cancel.check()?;
        let device_id = self.device_id();
        Ok(Some(Endpoint {
            url: gui.url(),
            api_key: gui.api_key,
            device_id,
        }))
    }

    fn launch(&self, on_exit: ExitCallback) -> Result<Box<dyn RunningDaemon>> {
        let spec = self
            .spec(DaemonCommand::Serve)
            .with_output_log(&self.output_log);
        Ok(Box::new(DaemonProcess::spawn(&spec, self.policy, on_exit)?))
    }

    fn probe(&self, endpoint: &Endpoint) -> bool {
        let url = format!("{}{}", endpoint.url.trim_end_matches('/'), HEALTH_PATH);
        self.probe
            .get(url)
            .send()
            .is_ok_and(|r| r.status().is_success())
    }

    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn AdminApi>> {
        let client = AdminClient::new(endpoint, Arc::clone(&self.notifier))?;
        client.load_config()?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
