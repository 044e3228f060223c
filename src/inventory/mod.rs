//! Device Inventory Module
//!
//! Reads the integration report exported from the Lutron app and lists the
//! integration IDs worth talking to. This is a one-shot transformation with
//! no connection to the live session beyond supplying the IDs later passed to
//! `write`, `query` and `read`.
//!
//! ## Example
//!
//! ```
//! use lipbridge::inventory::{parse_integration_report, DeviceKind};
//!
//! let report = r#"{"LIPIdList":{"Zones":[{"ID":2,"Name":"Kitchen"}]}}"#;
//! let devices = parse_integration_report(report).unwrap();
//! assert_eq!(devices[0].kind, DeviceKind::Light);
//! ```

pub mod loader;

// Re-export commonly used types
pub use loader::{
    load_integration_report, parse_integration_report, DeviceDescriptor, DeviceKind,
    InventoryError, BRIDGE_INTEGRATION_ID,
};
