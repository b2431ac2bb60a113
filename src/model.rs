use serde::{Deserialize, Serialize};

/// Sensor-type partition of a gateway's nodes. Codes match the catalog's `sensor_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    /// ESP weather stations.
    Weather,
    /// LoRa water-level gauges.
    WaterLevel,
    /// WM water meters.
    WaterMeter,
}

impl SensorType {
    pub const ALL: [SensorType; 3] = [
        SensorType::Weather,
        SensorType::WaterLevel,
        SensorType::WaterMeter,
    ];

    pub fn code(self) -> i16 {
        match self {
            SensorType::Weather => 1,
            SensorType::WaterLevel => 2,
            SensorType::WaterMeter => 3,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(SensorType::Weather),
            2 => Some(SensorType::WaterLevel),
            3 => Some(SensorType::WaterMeter),
            _ => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            SensorType::Weather => "weather",
            SensorType::WaterLevel => "water-level",
            SensorType::WaterMeter => "water-meter",
        }
    }

    pub fn sheet_title(self) -> &'static str {
        match self {
            SensorType::Weather => "Weather stations",
            SensorType::WaterLevel => "Water level",
            SensorType::WaterMeter => "Water meters",
        }
    }
}

/// Derivation-rule category of a sensor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    Battery,
    CumulativeMeter,
    #[default]
    Generic,
}

impl NodeClass {
    /// Unknown or missing tags fall back to the generic class.
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag.map(str::trim).filter(|t| !t.is_empty()) else {
            return NodeClass::Generic;
        };
        match tag.to_ascii_lowercase().as_str() {
            "battery" | "battery_voltage" | "voltage" => NodeClass::Battery,
            "meter" | "cumulative_meter" | "cumulative" => NodeClass::CumulativeMeter,
            _ => NodeClass::Generic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gateway {
    pub gateway_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorNode {
    pub node_id: String,
    pub name: String,
    pub sensor_type: SensorType,
    #[serde(default)]
    pub node_class: NodeClass,
}
