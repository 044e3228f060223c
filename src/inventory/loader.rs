//! Integration Report Loader
//!
//! Turns the JSON integration report exported by the Lutron app into a flat
//! list of [`DeviceDescriptor`]s. The report looks like:
//!
//! ```text
//! {
//!   "LIPIdList": {
//!     "Zones":   [ { "ID": 2, "Name": "Kitchen", "Area": { "Name": "Main" } } ],
//!     "Devices": [ { "ID": 1, "Name": "Smart Bridge",
//!                    "Buttons": [ { "Number": 3, "Name": "Dinner" } ] } ]
//!   }
//! }
//! ```
//!
//! ## Mapping Rules
//!
//! - Every zone becomes a `light`
//! - A device other than ID 1 with buttons becomes a `sensor` listing its
//!   button numbers
//! - Buttons on device ID 1 (the bridge itself) become `scene`s, except the
//!   unnamed ones still called `"Button N"`
//! - Devices without buttons are skipped

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Integration ID of the bridge itself
pub const BRIDGE_INTEGRATION_ID: u32 = 1;

/// Name prefix of bridge buttons that have not been given a scene name
const UNNAMED_BUTTON_PREFIX: &str = "Button ";

/// Errors that can occur while loading a report.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The report file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The report is not valid JSON or has the wrong shape
    #[error("invalid integration report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct IntegrationReport {
    #[serde(rename = "LIPIdList")]
    lip_id_list: Option<LipIdList>,
}

#[derive(Debug, Deserialize)]
struct LipIdList {
    #[serde(rename = "Zones")]
    zones: Option<Vec<Zone>>,
    #[serde(rename = "Devices")]
    devices: Option<Vec<Device>>,
}

#[derive(Debug, Deserialize)]
struct Zone {
    #[serde(rename = "ID")]
    id: u32,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Area")]
    area: Option<Area>,
}

#[derive(Debug, Deserialize)]
struct Device {
    #[serde(rename = "ID")]
    id: u32,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Area")]
    area: Option<Area>,
    #[serde(rename = "Buttons")]
    buttons: Option<Vec<ReportButton>>,
}

#[derive(Debug, Deserialize)]
struct Area {
    #[serde(rename = "Name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReportButton {
    #[serde(rename = "Number")]
    number: u32,
    #[serde(rename = "Name")]
    name: String,
}

/// What kind of entity a descriptor addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Light,
    Sensor,
    Scene,
}

/// One addressable entity found in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<u32>,
}

/// Reads and maps an integration report file.
pub fn load_integration_report(
    path: impl AsRef<Path>,
) -> Result<Vec<DeviceDescriptor>, InventoryError> {
    let text = std::fs::read_to_string(path)?;
    parse_integration_report(&text)
}

/// Maps an integration report held in memory.
///
/// A report without `LIPIdList` is logged and yields no devices.
pub fn parse_integration_report(json: &str) -> Result<Vec<DeviceDescriptor>, InventoryError> {
    let report: IntegrationReport = serde_json::from_str(json)?;

    let Some(list) = report.lip_id_list else {
        warn!("'LIPIdList' not found in the Integration Report. No devices will be loaded.");
        return Ok(Vec::new());
    };

    let mut devices = Vec::new();
    for zone in list.zones.unwrap_or_default() {
        devices.push(DeviceDescriptor {
            id: zone.id,
            name: zone.name,
            kind: DeviceKind::Light,
            area_name: zone.area.and_then(|a| a.name),
            buttons: None,
            scene_id: None,
        });
    }

    for device in list.devices.unwrap_or_default() {
        let Some(buttons) = device.buttons else {
            continue;
        };

        if device.id == BRIDGE_INTEGRATION_ID {
            push_scenes(&mut devices, device.id, buttons);
        } else {
            devices.push(DeviceDescriptor {
                id: device.id,
                name: device.name,
                kind: DeviceKind::Sensor,
                area_name: device.area.and_then(|a| a.name),
                buttons: Some(buttons.iter().map(|b| b.number).collect()),
                scene_id: None,
            });
        }
    }

    Ok(devices)
}

fn push_scenes(devices: &mut Vec<DeviceDescriptor>, bridge_id: u32, buttons: Vec<ReportButton>) {
    for button in buttons {
        if button.name.starts_with(UNNAMED_BUTTON_PREFIX) {
            continue;
        }
        info!(scene = button.number, name = %button.name, "Found scene");
        devices.push(DeviceDescriptor {
            id: bridge_id,
            name: button.name,
            kind: DeviceKind::Scene,
            area_name: None,
            buttons: None,
            scene_id: Some(button.number),
        });
    }
}
