pub mod alertmanager;

pub use alertmanager::{
    AlertAnnotations, AlertBatch, AlertLabels, AlertRecord, AlertStatus, PartitionedAlerts,
};
