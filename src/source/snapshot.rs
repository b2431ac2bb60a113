use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::DataSource;
use crate::error::{ReportError, ReportResult};
use crate::health::RawReading;
use crate::model::{Gateway, SensorNode, SensorType};

/// On-disk JSON form of a catalog plus its raw readings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub gateways: Vec<SnapshotGateway>,
    #[serde(default)]
    pub readings: Vec<SnapshotSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotGateway {
    pub gateway_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<SensorNode>,
}

/// Samples are `[epoch_seconds, value]`; `null` and `-9999` both mean failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSeries {
    pub gateway_id: String,
    pub node_id: String,
    #[serde(default)]
    pub samples: Vec<(i64, Option<f64>)>,
}

/// In-memory data source, loaded from a JSON snapshot or built up directly.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    gateways: Vec<SnapshotGateway>,
    readings: HashMap<(String, String), Vec<RawReading>>,
}

impl SnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(file: SnapshotFile) -> Self {
        let mut source = Self {
            gateways: file.gateways,
            readings: HashMap::new(),
        };
        for series in file.readings {
            let raw = series
                .samples
                .iter()
                .map(|(epoch_seconds, value)| RawReading {
                    epoch_seconds: *epoch_seconds,
                    value: *value,
                })
                .collect();
            source.push_readings(&series.gateway_id, &series.node_id, raw);
        }
        source
    }

    pub fn load(path: &Path) -> ReportResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ReportError::source(format!("failed to read snapshot {}: {err}", path.display()))
        })?;
        let file: SnapshotFile = serde_json::from_str(&raw).map_err(|err| {
            ReportError::source(format!("failed to parse snapshot {}: {err}", path.display()))
        })?;
        Ok(Self::from_file(file))
    }

    pub fn with_gateway(mut self, gateway_id: &str) -> Self {
        self.ensure_gateway(gateway_id);
        self
    }

    pub fn with_node(mut self, gateway_id: &str, node: SensorNode) -> Self {
        self.ensure_gateway(gateway_id).nodes.push(node);
        self
    }

    pub fn with_readings(mut self, gateway_id: &str, node_id: &str, readings: Vec<RawReading>) -> Self {
        self.push_readings(gateway_id, node_id, readings);
        self
    }

    fn ensure_gateway(&mut self, gateway_id: &str) -> &mut SnapshotGateway {
        let idx = match self.gateways.iter().position(|g| g.gateway_id == gateway_id) {
            Some(idx) => idx,
            None => {
                self.gateways.push(SnapshotGateway {
                    gateway_id: gateway_id.to_string(),
                    name: None,
                    nodes: Vec::new(),
                });
                self.gateways.len() - 1
            }
        };
        &mut self.gateways[idx]
    }

    fn push_readings(&mut self, gateway_id: &str, node_id: &str, readings: Vec<RawReading>) {
        let entry = self
            .readings
            .entry((gateway_id.to_string(), node_id.to_string()))
            .or_default();
        entry.extend(readings);
        entry.sort_by_key(|r| r.epoch_seconds);
    }
}

impl DataSource for SnapshotSource {
    fn gateway(&mut self, gateway_id: &str) -> ReportResult<Gateway> {
        self.gateways
            .iter()
            .find(|g| g.gateway_id == gateway_id)
            .map(|g| Gateway {
                gateway_id: g.gateway_id.clone(),
                name: g.name.clone(),
            })
            .ok_or_else(|| ReportError::source(format!("gateway not found: {gateway_id}")))
    }

    fn sensor_nodes(
        &mut self,
        gateway: &Gateway,
        sensor_type: SensorType,
    ) -> ReportResult<Vec<SensorNode>> {
        let entry = self
            .gateways
            .iter()
            .find(|g| g.gateway_id == gateway.gateway_id)
            .ok_or_else(|| {
                ReportError::source(format!("gateway not found: {}", gateway.gateway_id))
            })?;
        Ok(entry
            .nodes
            .iter()
            .filter(|n| n.sensor_type == sensor_type)
            .cloned()
            .collect())
    }

    fn readings(
        &mut self,
        gateway_id: &str,
        node_id: &str,
        start_epoch: i64,
        end_epoch: i64,
    ) -> ReportResult<Option<Vec<RawReading>>> {
        let Some(all) = self
            .readings
            .get(&(gateway_id.to_string(), node_id.to_string()))
        else {
            return Ok(None);
        };
        let window: Vec<RawReading> = all
            .iter()
            .filter(|r| r.epoch_seconds >= start_epoch && r.epoch_seconds <= end_epoch)
            .copied()
            .collect();
        if window.is_empty() {
            return Ok(None);
        }
        Ok(Some(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeClass;

    fn node(id: &str, sensor_type: SensorType) -> SensorNode {
        SensorNode {
            node_id: id.to_string(),
            name: format!("{id} name"),
            sensor_type,
            node_class: NodeClass::Generic,
        }
    }

    #[test]
    fn parses_json_snapshot_with_null_and_sentinel_samples() {
        let raw = serde_json::json!({
            "gateways": [{
                "gateway_id": "gw-1",
                "nodes": [
                    { "node_id": "n1", "name": "Rain gauge", "sensor_type": "weather" },
                    { "node_id": "n2", "name": "Meter A", "sensor_type": "water_meter",
                      "node_class": "cumulative_meter" }
                ]
            }],
            "readings": [
                { "gateway_id": "gw-1", "node_id": "n1",
                  "samples": [[100, 1.5], [200, null], [300, -9999]] }
            ]
        });
        let file: SnapshotFile = serde_json::from_value(raw).expect("parse");
        let mut source = SnapshotSource::from_file(file);

        let gateway = source.gateway("gw-1").expect("gateway");
        let meters = source
            .sensor_nodes(&gateway, SensorType::WaterMeter)
            .expect("nodes");
        assert_eq!(meters.len(), 1);
        assert_eq!(meters[0].node_class, NodeClass::CumulativeMeter);

        let readings = source.readings("gw-1", "n1", 0, 1_000).expect("readings").expect("some");
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[1].value, None);
        assert_eq!(readings[2].value, Some(-9999.0));
    }

    #[test]
    fn readings_outside_window_are_absent() {
        let mut source = SnapshotSource::new()
            .with_node("gw", node("n1", SensorType::Weather))
            .with_readings("gw", "n1", vec![RawReading::new(500, 1.0)]);

        assert!(source.readings("gw", "n1", 0, 499).expect("ok").is_none());
        assert!(source.readings("gw", "n1", 500, 500).expect("ok").is_some());
        assert!(source.readings("gw", "n2", 0, 1_000).expect("ok").is_none());
    }

    #[test]
    fn unknown_gateway_is_an_error() {
        let mut source = SnapshotSource::new().with_gateway("gw");
        let err = source.gateway("missing").unwrap_err();
        assert!(matches!(err, ReportError::Source(_)));
    }

    #[test]
    fn nodes_are_filtered_by_type_in_catalog_order() {
        let mut source = SnapshotSource::new()
            .with_node("gw", node("b", SensorType::Weather))
            .with_node("gw", node("x", SensorType::WaterLevel))
            .with_node("gw", node("a", SensorType::Weather));
        let gateway = source.gateway("gw").expect("gateway");
        let ids: Vec<String> = source
            .sensor_nodes(&gateway, SensorType::Weather)
            .expect("nodes")
            .into_iter()
            .map(|n| n.node_id)
            .collect();
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }
}
