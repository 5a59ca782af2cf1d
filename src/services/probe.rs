//! Keyboard probing from the kernel input device list.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::HardwareProbe;
use crate::constants::DEFAULT_HARDWARE_MODEL;
use crate::models::ProbedKeyboard;

/// `EV_KEY` bit of the event capability bitmap.
const EV_KEY: u64 = 1 << 1;
/// `EV_REP` bit of the event capability bitmap.
const EV_REP: u64 = 1 << 20;

/// One device block of `/proc/bus/input/devices`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputDevice {
    /// Bus id (hex, as printed)
    pub bus: String,
    /// Vendor id (hex, as printed)
    pub vendor: String,
    /// Product id (hex, as printed)
    pub product: String,
    /// Device name
    pub name: String,
    /// Physical path
    pub phys: String,
    /// Unique id reported by the device
    pub uniq: String,
    /// Handlers attached to the device
    pub handlers: Vec<String>,
    /// Event capability bitmap
    pub ev: u64,
}

impl InputDevice {
    /// A keyboard has a `kbd` handler and key plus autorepeat events.
    #[must_use]
    pub fn is_keyboard(&self) -> bool {
        self.handlers.iter().any(|h| h == "kbd") && self.ev & (EV_KEY | EV_REP) == EV_KEY | EV_REP
    }

    /// Stable identifier of the physical device.
    #[must_use]
    pub fn unique_key(&self) -> String {
        let base = format!("{}:{}:{}", self.bus, self.vendor, self.product);
        if !self.uniq.is_empty() {
            format!("{base}/{}", self.uniq)
        } else if !self.phys.is_empty() {
            format!("{base}/{}", self.phys)
        } else {
            base
        }
    }
}

/// Parses the contents of `/proc/bus/input/devices`.
#[must_use]
pub fn parse_input_devices(content: &str) -> Vec<InputDevice> {
    let mut devices = Vec::new();
    let mut current: Option<InputDevice> = None;

    for line in content.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            devices.extend(current.take());
            continue;
        }

        let Some((tag, rest)) = line.split_once(": ") else {
            continue;
        };
        let device = current.get_or_insert_with(InputDevice::default);

        match tag {
            "I" => {
                for field in rest.split_whitespace() {
                    match field.split_once('=') {
                        Some(("Bus", v)) => device.bus = v.to_string(),
                        Some(("Vendor", v)) => device.vendor = v.to_string(),
                        Some(("Product", v)) => device.product = v.to_string(),
                        _ => {}
                    }
                }
            }
            "N" => {
                device.name = rest
                    .strip_prefix("Name=")
                    .unwrap_or(rest)
                    .trim_matches('"')
                    .to_string();
            }
            "P" => device.phys = rest.strip_prefix("Phys=").unwrap_or_default().to_string(),
            "U" => device.uniq = rest.strip_prefix("Uniq=").unwrap_or_default().to_string(),
            "H" => {
                device.handlers = rest
                    .strip_prefix("Handlers=")
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
            }
            "B" => {
                if let Some(ev) = rest.strip_prefix("EV=") {
                    device.ev = u64::from_str_radix(ev, 16).unwrap_or(0);
                }
            }
            _ => {}
        }
    }
    devices.extend(current);

    devices
}

/// Probes keyboards listed by the kernel under a target root.
///
/// The kernel does not report a keyboard model or X11 layout, so both come
/// from configuration overrides when set.
#[derive(Debug, Clone)]
pub struct InputDevicesProbe {
    devices_path: PathBuf,
    model: Option<String>,
    x11_layout: Option<String>,
}

impl InputDevicesProbe {
    /// Creates a probe reading `<root>/proc/bus/input/devices`.
    #[must_use]
    pub fn new(root: &Path, model: Option<String>, x11_layout: Option<String>) -> Self {
        Self {
            devices_path: root.join("proc/bus/input/devices"),
            model,
            x11_layout,
        }
    }

    fn keyboards(&self) -> Vec<InputDevice> {
        match fs::read_to_string(&self.devices_path) {
            Ok(content) => parse_input_devices(&content)
                .into_iter()
                .filter(InputDevice::is_keyboard)
                .collect(),
            Err(e) => {
                warn!(
                    "Cannot read input devices from {}: {}",
                    self.devices_path.display(),
                    e
                );
                Vec::new()
            }
        }
    }
}

impl HardwareProbe for InputDevicesProbe {
    fn probe(&self) -> ProbedKeyboard {
        let keyboards = self.keyboards();
        info!("Probed keyboards: {:?}", keyboards);

        let probed = ProbedKeyboard {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_HARDWARE_MODEL.to_string()),
            x11_layout: self.x11_layout.clone().unwrap_or_default(),
            unique_key: keyboards
                .first()
                .map(InputDevice::unique_key)
                .unwrap_or_default(),
        };
        info!("kb_model: <{}>", probed.model);
        info!("Xkblayout: <{}>", probed.x11_layout);

        probed
    }

    fn probe_manual_all(&self) -> Vec<String> {
        self.keyboards().iter().map(InputDevice::unique_key).collect()
    }
}
