//! The aggregated record: one per cycle, the unit of persistence and alerting.

use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;
use std::collections::BTreeMap;

/// Flattened `"<sensor>_<field>"` values plus the local time they were taken.
///
/// Built once by the aggregator and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    timestamp: String,
    values: BTreeMap<String, f64>,
}

impl Record {
    pub fn new<I, K>(taken_at: DateTime<Local>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            timestamp: format_timestamp(taken_at),
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// ISO-8601 with microseconds and the local offset.
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_rfc3339() {
        let record = Record::new(Local::now(), [("pms5003_pm2_5", 12.0)]);
        assert!(DateTime::parse_from_rfc3339(record.timestamp()).is_ok());
        assert_eq!(record.get("pms5003_pm2_5"), Some(12.0));
        assert_eq!(record.get("mhz19_co2"), None);
    }
}
