use chrono::{DateTime, TimeZone, Utc};
use postgres::{Client, NoTls};

use super::DataSource;
use crate::error::{ReportError, ReportResult};
use crate::health::RawReading;
use crate::model::{Gateway, NodeClass, SensorNode, SensorType};

const GATEWAY_QUERY: &str = r#"
    SELECT gateway_id, name
    FROM gateways
    WHERE gateway_id = $1
"#;

const SENSOR_NODES_QUERY: &str = r#"
    SELECT node_id, name, node_class
    FROM sensor_nodes
    WHERE gateway_id = $1
      AND sensor_type = $2
      AND deleted_at IS NULL
    ORDER BY node_id
"#;

// Exclusive upper bound one second past `end_epoch`.
const READINGS_QUERY: &str = r#"
    SELECT ts, value
    FROM readings
    WHERE gateway_id = $1
      AND node_id = $2
      AND ts >= $3
      AND ts < $4
    ORDER BY ts
"#;

pub struct PgDataSource {
    client: Client,
}

impl PgDataSource {
    pub fn connect(database_url: &str) -> ReportResult<Self> {
        let client = Client::connect(database_url, NoTls)
            .map_err(|err| ReportError::source(format!("failed to connect to database: {err}")))?;
        Ok(Self { client })
    }
}

fn epoch_to_utc(epoch_seconds: i64) -> ReportResult<DateTime<Utc>> {
    Utc.timestamp_opt(epoch_seconds, 0)
        .single()
        .ok_or_else(|| ReportError::source(format!("epoch out of range: {epoch_seconds}")))
}

impl DataSource for PgDataSource {
    fn gateway(&mut self, gateway_id: &str) -> ReportResult<Gateway> {
        let row = self
            .client
            .query_opt(GATEWAY_QUERY, &[&gateway_id])?
            .ok_or_else(|| ReportError::source(format!("gateway not found: {gateway_id}")))?;
        Ok(Gateway {
            gateway_id: row.try_get(0)?,
            name: row.try_get(1)?,
        })
    }

    fn sensor_nodes(
        &mut self,
        gateway: &Gateway,
        sensor_type: SensorType,
    ) -> ReportResult<Vec<SensorNode>> {
        let rows = self.client.query(
            SENSOR_NODES_QUERY,
            &[&gateway.gateway_id, &sensor_type.code()],
        )?;
        let mut nodes = Vec::with_capacity(rows.len());
        for row in rows {
            let class_tag: Option<String> = row.try_get(2)?;
            nodes.push(SensorNode {
                node_id: row.try_get(0)?,
                name: row.try_get(1)?,
                sensor_type,
                node_class: NodeClass::from_tag(class_tag.as_deref()),
            });
        }
        Ok(nodes)
    }

    fn readings(
        &mut self,
        gateway_id: &str,
        node_id: &str,
        start_epoch: i64,
        end_epoch: i64,
    ) -> ReportResult<Option<Vec<RawReading>>> {
        let start = epoch_to_utc(start_epoch)?;
        let end_exclusive = epoch_to_utc(end_epoch + 1)?;
        let rows = self
            .client
            .query(READINGS_QUERY, &[&gateway_id, &node_id, &start, &end_exclusive])?;
        if rows.is_empty() {
            return Ok(None);
        }
        let mut readings = Vec::with_capacity(rows.len());
        for row in rows {
            let ts: DateTime<Utc> = row.try_get(0)?;
            readings.push(RawReading {
                epoch_seconds: ts.timestamp(),
                value: row.try_get(1)?,
            });
        }
        Ok(Some(readings))
    }
}
