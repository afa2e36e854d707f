//! Decoded reading types.
//!
//! A [`Reading`] is the output of one successful decode: a caller-supplied
//! epoch timestamp plus the measurements found in the frame, in the order
//! they occurred. Field order matters because the outbound JSON mirrors
//! the frame layout, so the values live in a `Vec` rather than a map.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A decoded measurement value.
///
/// A divisor of 1 in the field table keeps the raw value an integer;
/// any other divisor produces a float. The distinction is preserved all
/// the way into the JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Unscaled integer reading (divisor 1).
    Integer(i64),

    /// Scaled fractional reading.
    Float(f64),
}

impl Value {
    /// Get the value as f64 regardless of variant.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }

    /// Get the value as i64 if it is an integer reading.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Float(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// One decoded live-data frame: timestamp plus named measurements.
///
/// Serializes to a flat JSON object with `Timestamp` first, then each
/// measurement under its registry name, in frame occurrence order:
///
/// ```json
/// {"Timestamp": 1700000000, "Indoor Temperature": 20.0, "Indoor Humidity": 45}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    timestamp: i64,
    values: Vec<(&'static str, Value)>,
}

impl Reading {
    /// Create an empty reading at the given epoch-seconds timestamp.
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            values: Vec::new(),
        }
    }

    /// Epoch seconds assigned by the caller at decode time.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Append a measurement, preserving insertion order.
    pub fn push(&mut self, name: &'static str, value: Value) {
        self.values.push((name, value));
    }

    /// Look up a measurement by name.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Iterate over measurements in frame occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Value)> + '_ {
        self.values.iter().copied()
    }

    /// Number of decoded measurements (the timestamp does not count).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the reading carries only a timestamp.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("Timestamp", &self.timestamp)?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        let v = Value::Integer(45);
        assert_eq!(v.as_i64(), Some(45));
        assert_eq!(v.as_f64(), 45.0);

        let v = Value::Float(20.5);
        assert_eq!(v.as_i64(), None);
        assert_eq!(v.as_f64(), 20.5);
    }

    #[test]
    fn test_reading_order_preserved() {
        let mut reading = Reading::new(100);
        reading.push("Outdoor Temperature", Value::Float(18.4));
        reading.push("Indoor Temperature", Value::Float(21.0));

        let names: Vec<&str> = reading.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Outdoor Temperature", "Indoor Temperature"]);
        assert_eq!(reading.get("Indoor Temperature"), Some(Value::Float(21.0)));
        assert_eq!(reading.get("Wind Speed"), None);
    }

    #[test]
    fn test_json_shape() {
        let mut reading = Reading::new(1700000000);
        reading.push("Indoor Temperature", Value::Float(20.0));
        reading.push("Indoor Humidity", Value::Integer(45));

        let json = serde_json::to_string(&reading).unwrap();
        assert_eq!(
            json,
            r#"{"Timestamp":1700000000,"Indoor Temperature":20.0,"Indoor Humidity":45}"#
        );
    }

    #[test]
    fn test_empty_reading_is_valid() {
        let reading = Reading::new(42);
        assert!(reading.is_empty());
        assert_eq!(reading.len(), 0);
        assert_eq!(
            serde_json::to_string(&reading).unwrap(),
            r#"{"Timestamp":42}"#
        );
    }
}
