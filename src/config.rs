/*! Device-address configuration table.

A static map from a small integer device id to four endpoints
(controller ip/port, local listen ip/port), overridable from a JSON
file. Grounded on
`examples/original_source/config/constants.py`'s `DEVICE_CONFIG` dict
(the built-in fallback table, reproduced verbatim below) and
`src/traffic_control/config/config.py`'s `TCConfig` (the
`get_tc_id`/`get_tc_ip`/`get_tc_port`/`get_backserver_ip`/`get_backserver_port`
accessor surface, collapsed here into a single [`Endpoints`] struct).
*/
use std::collections::HashMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// The four endpoints associated with one device id.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    /// Controller's UDP ip.
    pub controller_ip: Ipv4Addr,
    /// Controller's UDP port.
    pub controller_port: u16,
    /// Local bind ip for this gateway.
    #[serde(default = "default_local_ip")]
    pub local_ip: Ipv4Addr,
    /// Local bind port for this gateway.
    pub local_port: u16,
}

fn default_local_ip() -> Ipv4Addr {
    Ipv4Addr::UNSPECIFIED
}

/// The full device-id → endpoints table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceTable(HashMap<u32, Endpoints>);

impl DeviceTable {
    /// The built-in table, matching `config/constants.py`'s `DEVICE_CONFIG`.
    #[must_use]
    pub fn builtin() -> Self {
        let mut map = HashMap::new();
        map.insert(
            3,
            Endpoints {
                controller_ip: Ipv4Addr::new(192, 168, 13, 89),
                controller_port: 7002,
                local_ip: Ipv4Addr::UNSPECIFIED,
                local_port: 8889,
            },
        );
        DeviceTable(map)
    }

    /// Load a table from a JSON file, falling back to [`Self::builtin`]
    /// when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::builtin());
        };
        let text = fs::read_to_string(path)?;
        let table: DeviceTable = serde_json::from_str(&text).map_err(|e| {
            crate::error::Error::MalformedField {
                field: "device_table".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(table)
    }

    /// Look up a device id's endpoints.
    #[must_use]
    pub fn get(&self, device_id: u32) -> Option<&Endpoints> {
        self.0.get(&device_id)
    }
}

/// Render a device id as its controller id, e.g. `3 -> "TC003"`.
#[must_use]
pub fn controller_id(device_id: u32) -> String {
    format!("TC{device_id:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_has_device_three() {
        let table = DeviceTable::builtin();
        let ep = table.get(3).unwrap();
        assert_eq!(ep.controller_ip, Ipv4Addr::new(192, 168, 13, 89));
        assert_eq!(ep.controller_port, 7002);
    }

    #[test]
    fn controller_id_is_zero_padded() {
        assert_eq!(controller_id(3), "TC003");
        assert_eq!(controller_id(42), "TC042");
    }

    #[test]
    fn load_from_json_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");
        fs::write(
            &path,
            r#"{"7":{"controller_ip":"10.0.0.5","controller_port":7100,"local_ip":"0.0.0.0","local_port":9000}}"#,
        )
        .unwrap();
        let table = DeviceTable::load(Some(&path)).unwrap();
        let ep = table.get(7).unwrap();
        assert_eq!(ep.controller_port, 7100);
        assert!(table.get(3).is_none());
    }
}
