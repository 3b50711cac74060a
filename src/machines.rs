//! Waking, sleeping and querying home machines.
//!
//! Machines are found through the Tailscale API, woken with Wake-on-LAN and
//! driven through plain `ssh` commands.

use std::{process::Output, time::Duration};

use reqwest::Client;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{
    config,
    error::{GatewayError, Result},
};

/// A machine the gateway knows how to drive.
#[derive(Debug)]
pub struct MachineProfile {
    /// Tailscale hostname.
    pub name: &'static str,
    /// Variable holding the machine's MAC address.
    pub mac_variable: &'static str,
    pub wake_commands: &'static [&'static str],
    pub sleep_commands: &'static [&'static str],
    pub battery_commands: &'static [&'static str],
}

pub const PROFILES: &[MachineProfile] = &[
    MachineProfile {
        name: "macbook",
        mac_variable: "MAC_MACBOOK",
        wake_commands: &["caffeinate -u -t 1"],
        sleep_commands: &["pmset sleepnow"],
        battery_commands: &["pmset -g batt | grep -o '[0-9]\\+%' | sed 's/%//'"],
    },
    MachineProfile {
        name: "arch",
        mac_variable: "MAC_ARCH",
        wake_commands: &["DISPLAY=:0 xset dpms 0 0 600", "DISPLAY=:0 xset dpms force on"],
        sleep_commands: &[
            "DISPLAY=:0 xset dpms 0 0 5",
            "DISPLAY=:0 i3lock -n -c 000000 >/dev/null 2>&1 &",
        ],
        battery_commands: &["cat /sys/class/power_supply/BAT1/capacity"],
    },
];

pub fn profile(name: &str) -> Option<&'static MachineProfile> {
    PROFILES.iter().find(|p| p.name == name)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailnetDevices {
    #[serde(default)]
    pub devices: Vec<TailnetDevice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailnetDevice {
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub name: String,
}

/// First address of the device whose hostname is `name`.
pub fn machine_ip(name: &str, tailnet: &TailnetDevices) -> Option<String> {
    tailnet
        .devices
        .iter()
        .filter(|d| d.hostname == name)
        .find_map(|d| d.addresses.first().filter(|a| !a.is_empty()).cloned())
}

/// A machine ready to receive commands.
#[derive(Debug, Clone)]
struct Target {
    profile: &'static MachineProfile,
    ip: String,
    mac: String,
    user: String,
}

#[derive(Debug, Clone)]
pub struct MachineManager {
    http: Client,
    api_url: String,
    api_key: Option<String>,
    tailnet: String,
    ssh_user: Option<String>,
    /// Limit for each `ssh` and `wakeonlan` run.
    command_timeout: Duration,
}

impl MachineManager {
    pub fn new(
        http: Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
        tailnet: impl Into<String>,
        ssh_user: Option<String>,
    ) -> Self {
        MachineManager {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
            tailnet: tailnet.into(),
            ssh_user,
            command_timeout: config::http_timeout(),
        }
    }

    pub fn from_config(http: Client) -> Self {
        Self::new(
            http,
            config::tailscale_api_url(),
            config::tailscale_api_key(),
            config::tailnet(),
            config::ssh_user(),
        )
    }

    pub async fn wake(&self, name: &str) -> Result<String> {
        let target = self.locate(name).await?;
        self.execute(&target, target.profile.wake_commands).await
    }

    pub async fn sleep(&self, name: &str) -> Result<String> {
        let target = self.locate(name).await?;
        self.execute(&target, target.profile.sleep_commands).await
    }

    pub async fn battery(&self, name: &str) -> Result<String> {
        let target = self.locate(name).await?;
        let level = self.execute(&target, target.profile.battery_commands).await?;
        info!("Battery of {}: {}", name, level);
        Ok(level)
    }

    async fn locate(&self, name: &str) -> Result<Target> {
        if name.is_empty() {
            return Err(GatewayError::Validation("name is required".to_string()));
        }

        let profile =
            profile(name).ok_or_else(|| GatewayError::NotFound(format!("machine '{name}'")))?;

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GatewayError::configuration(name, "TS_API_KEY is not set"))?;
        let mac = config::machine_mac(profile.mac_variable).ok_or_else(|| {
            GatewayError::configuration(name, format!("{} is not set", profile.mac_variable))
        })?;
        let user = self
            .ssh_user
            .clone()
            .ok_or_else(|| GatewayError::configuration(name, "SSH_USER is not set"))?;

        let url = format!("{}/tailnet/{}/devices", self.api_url, self.tailnet);
        let response = self.http.get(&url).bearer_auth(api_key).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, body });
        }
        let tailnet: TailnetDevices = response.json().await?;
        debug!("Tailnet holds {} devices", tailnet.devices.len());

        let ip = machine_ip(name, &tailnet)
            .ok_or_else(|| GatewayError::NotFound(format!("address of machine '{name}'")))?;
        info!("Found IP address for {}: {}", name, ip);

        Ok(Target {
            profile,
            ip,
            mac,
            user,
        })
    }

    /// Wakes the machine, then runs every command; returns the last output.
    async fn execute(&self, target: &Target, commands: &[&str]) -> Result<String> {
        send_wol(&target.mac, self.command_timeout).await?;

        let mut last = String::new();
        for command in commands {
            last = send_command(command, &target.user, &target.ip, self.command_timeout).await?;
        }
        Ok(last)
    }
}

/// Runs `program` to completion, killing it once `limit` has passed.
///
/// # Errors
///
/// - `Io` when the program cannot be spawned
/// - `Command` when it runs longer than `limit`
pub async fn run_command(program: &str, args: &[&str], limit: Duration) -> Result<Output> {
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);

    match tokio::time::timeout(limit, command.output()).await {
        Ok(output) => Ok(output?),
        Err(_) => {
            warn!("{} did not finish within {:?}, killed", program, limit);
            Err(GatewayError::Command(format!(
                "{program} timed out after {limit:?}"
            )))
        }
    }
}

async fn send_command(command: &str, user: &str, host: &str, limit: Duration) -> Result<String> {
    let destination = format!("{user}@{host}");
    let output = run_command("ssh", &[destination.as_str(), command], limit).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("SSH command '{}' failed on {}: {}", command, host, stderr.trim());
        return Err(GatewayError::Command(format!(
            "ssh {user}@{host} '{command}' exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    info!("Command '{}' executed on {}@{}", command, user, host);
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

async fn send_wol(mac: &str, limit: Duration) -> Result<()> {
    let output = run_command("wakeonlan", &[mac], limit).await?;

    if !output.status.success() {
        return Err(GatewayError::Command(format!(
            "wake-on-lan for {mac} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    debug!("Wake-on-LAN packet sent to {}", mac);
    Ok(())
}
