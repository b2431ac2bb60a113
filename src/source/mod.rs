pub mod pg;
pub mod snapshot;

use crate::error::ReportResult;
use crate::health::RawReading;
use crate::model::{Gateway, SensorNode, SensorType};

pub use self::pg::PgDataSource;
pub use self::snapshot::SnapshotSource;

/// Catalog and reading access for a report run. Errors are fatal for the run; an absent series is
/// `Ok(None)`, never an error.
pub trait DataSource {
    fn gateway(&mut self, gateway_id: &str) -> ReportResult<Gateway>;

    /// Nodes of one sensor-type, in catalog order.
    fn sensor_nodes(
        &mut self,
        gateway: &Gateway,
        sensor_type: SensorType,
    ) -> ReportResult<Vec<SensorNode>>;

    /// Raw readings with `start_epoch <= ts <= end_epoch`, in time order.
    fn readings(
        &mut self,
        gateway_id: &str,
        node_id: &str,
        start_epoch: i64,
        end_epoch: i64,
    ) -> ReportResult<Option<Vec<RawReading>>>;
}
