// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Linux sensors backed by sysfs and NetworkManager.
//!
//! - power: `/sys/class/power_supply` (no battery at all counts as charging,
//!   device-scoped peripheral batteries are ignored)
//! - power saving: `/sys/firmware/acpi/platform_profile` set to `low-power`
//! - network: `/sys/class/net`, with `nmcli` for metered flag and SSID
//! - global sync: absence of the `sync.paused` marker in the state dir

use sg_core::{ConditionSensors, SensorSnapshot, Transport};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const NMCLI: &str = "nmcli";

/// The active network connection as seen by the sensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkState {
    pub interface: String,
    pub transport: Transport,
    pub metered: bool,
    pub ssid: Option<String>,
}

/// Sensors reading the running system.
#[derive(Debug, Clone)]
pub struct SystemSensors {
    sysfs_root: PathBuf,
    pause_marker: PathBuf,
    network_manager: bool,
}

impl SystemSensors {
    /// Sensors for this machine; `pause_marker` disables global sync when present.
    pub fn new(pause_marker: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys"),
            pause_marker: pause_marker.into(),
            network_manager: true,
        }
    }

    /// Sensors reading a sysfs tree rooted elsewhere, without NetworkManager.
    pub fn with_sysfs_root(root: impl Into<PathBuf>, pause_marker: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: root.into(),
            pause_marker: pause_marker.into(),
            network_manager: false,
        }
    }

    pub fn pause_marker(&self) -> &Path {
        &self.pause_marker
    }

    /// True when on external power, or when the machine has no battery.
    pub fn charging(&self) -> bool {
        let Ok(entries) = fs::read_dir(self.sysfs_root.join("class/power_supply")) else {
            return true;
        };
        let mut has_battery = false;
        for entry in entries.flatten() {
            let dir = entry.path();
            // Peripheral batteries (mice, keyboards) say nothing about system power.
            if read_trimmed(&dir.join("scope")).as_deref() == Some("Device") {
                continue;
            }
            match read_trimmed(&dir.join("type")).as_deref() {
                Some("Battery") => {
                    has_battery = true;
                    if matches!(
                        read_trimmed(&dir.join("status")).as_deref(),
                        Some("Charging") | Some("Full")
                    ) {
                        return true;
                    }
                }
                Some(_) => {
                    if read_trimmed(&dir.join("online")).as_deref() == Some("1") {
                        return true;
                    }
                }
                None => {}
            }
        }
        !has_battery
    }

    pub fn power_saving(&self) -> bool {
        read_trimmed(&self.sysfs_root.join("firmware/acpi/platform_profile")).as_deref()
            == Some("low-power")
    }

    pub fn global_sync_enabled(&self) -> bool {
        !self.pause_marker.exists()
    }

    /// The preferred active interface, if any is up.
    pub fn active_interface(&self) -> Option<(String, Transport)> {
        let entries = fs::read_dir(self.sysfs_root.join("class/net")).ok()?;
        let mut candidates: Vec<(String, Transport)> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let dir = entry.path();
                if !interface_up(&dir) {
                    return None;
                }
                classify_interface(&dir, &name).map(|t| (name, t))
            })
            .collect();
        candidates.sort_by(|a, b| {
            transport_rank(a.1)
                .cmp(&transport_rank(b.1))
                .then_with(|| a.0.cmp(&b.0))
        });
        candidates.into_iter().next()
    }

    pub fn network(&self) -> Option<NetworkState> {
        let (interface, transport) = self.active_interface()?;
        let (metered, ssid) = if self.network_manager {
            let metered = nmcli(&["-g", "GENERAL.METERED", "device", "show", &interface])
                .map(|out| parse_metered(&out))
                .unwrap_or(false);
            let ssid = if transport == Transport::Wifi {
                nmcli(&[
                    "-t", "-f", "ACTIVE,SSID", "device", "wifi", "list", "ifname", &interface,
                    "--rescan", "no",
                ])
                .and_then(|out| parse_active_ssid(&out))
            } else {
                None
            };
            (metered, ssid)
        } else {
            (false, None)
        };
        Some(NetworkState {
            interface,
            transport,
            metered,
            ssid,
        })
    }
}

impl ConditionSensors for SystemSensors {
    fn snapshot(&self) -> SensorSnapshot {
        let network = self.network();
        SensorSnapshot {
            charging: self.charging(),
            power_saving: self.power_saving(),
            transport: network.as_ref().map(|n| n.transport),
            metered: network.as_ref().is_some_and(|n| n.metered),
            ssid: network.and_then(|n| n.ssid),
            global_sync_enabled: self.global_sync_enabled(),
        }
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn interface_up(dir: &Path) -> bool {
    match read_trimmed(&dir.join("operstate")).as_deref() {
        Some("up") => true,
        Some("unknown") => read_trimmed(&dir.join("carrier")).as_deref() == Some("1"),
        _ => false,
    }
}

fn uevent_devtype(dir: &Path) -> Option<String> {
    let uevent = fs::read_to_string(dir.join("uevent")).ok()?;
    uevent
        .lines()
        .find_map(|l| l.strip_prefix("DEVTYPE="))
        .map(str::to_string)
}

/// Map a `/sys/class/net/<name>` entry to a transport; virtual devices map to `None`.
pub fn classify_interface(dir: &Path, name: &str) -> Option<Transport> {
    if name == "lo" {
        return None;
    }
    let devtype = uevent_devtype(dir);
    if dir.join("wireless").exists()
        || dir.join("phy80211").exists()
        || devtype.as_deref() == Some("wlan")
    {
        return Some(Transport::Wifi);
    }
    if devtype.as_deref() == Some("wwan") || name.starts_with("wwan") {
        return Some(Transport::Cellular);
    }
    if name.starts_with("bnep") {
        return Some(Transport::BluetoothPan);
    }
    if dir.join("device").exists() {
        return Some(Transport::Ethernet);
    }
    None
}

fn transport_rank(t: Transport) -> u8 {
    match t {
        Transport::Ethernet => 0,
        Transport::Wifi => 1,
        Transport::BluetoothPan => 2,
        Transport::Cellular => 3,
    }
}

fn nmcli(args: &[&str]) -> Option<String> {
    let output = Command::new(NMCLI).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse `nmcli -g GENERAL.METERED` output (`yes`, `no (guessed)`, ...).
pub fn parse_metered(output: &str) -> bool {
    output.trim().starts_with("yes")
}

/// Parse `nmcli -t -f ACTIVE,SSID device wifi list` output.
pub fn parse_active_ssid(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let ssid = line.strip_prefix("yes:")?;
        let ssid = ssid.replace("\\:", ":").replace("\\\\", "\\");
        (!ssid.is_empty()).then_some(ssid)
    })
}

#[cfg(test)]
#[path = "sensors_tests.rs"]
mod tests;
