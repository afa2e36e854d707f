//! Live-data field registry.
//!
//! The Ecowitt live-data frame is a sequence of `(code, value)` pairs.
//! This module holds the immutable table mapping each one-byte field code
//! to its decoding rule: measurement name, value width in bytes, and the
//! divisor that converts the raw fixed-point integer into its physical
//! unit.
//!
//! The table is built once at startup and passed by reference into the
//! codec; it is never a global and never mutated.

/// Decoding rule for one live-data field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Protocol field code (unique key within the registry).
    pub code: u8,

    /// Measurement name, used as the JSON output key.
    pub name: &'static str,

    /// Number of big-endian bytes encoding the raw value (1, 2 or 4).
    pub length: usize,

    /// Raw value is divided by this to obtain the reported value.
    /// A divisor of 1 keeps the reading an integer.
    pub divisor: u32,
}

impl FieldSpec {
    const fn new(code: u8, name: &'static str, length: usize, divisor: u32) -> Self {
        Self {
            code,
            name,
            length,
            divisor,
        }
    }
}

/// Field table from the Ecowitt "Data Exchange TCP Protocol" document.
///
/// Covers GW1000/1100/1900/2000-family gateways. Sorted by code so the
/// registry can binary-search.
const LIVE_DATA_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(1, "Indoor Temperature", 2, 10),
    FieldSpec::new(2, "Outdoor Temperature", 2, 10),
    FieldSpec::new(6, "Indoor Humidity", 1, 1),
    FieldSpec::new(7, "Outdoor Humidity", 1, 1),
    FieldSpec::new(8, "Absolute Pressure", 2, 10), // hPa
    FieldSpec::new(9, "Relative Pressure", 2, 10),
    FieldSpec::new(10, "Wind Direction", 2, 1), // degrees
    FieldSpec::new(11, "Wind Speed", 2, 10),    // m/s
    FieldSpec::new(12, "Gust Speed", 2, 10),
    FieldSpec::new(21, "Light", 4, 10), // Lux
    FieldSpec::new(22, "UV", 2, 1),     // uW/m2
    FieldSpec::new(23, "UV Index", 1, 1), // 0-15
    FieldSpec::new(25, "Maximum Wind Speed", 2, 10),
    FieldSpec::new(26, "Temperature 1", 2, 10),
    FieldSpec::new(27, "Temperature 2", 2, 10),
    FieldSpec::new(28, "Temperature 3", 2, 10),
    FieldSpec::new(29, "Temperature 4", 2, 10),
    FieldSpec::new(30, "Temperature 5", 2, 10),
    FieldSpec::new(31, "Temperature 6", 2, 10),
    FieldSpec::new(32, "Temperature 7", 2, 10),
    FieldSpec::new(33, "Temperature 8", 2, 10),
    FieldSpec::new(34, "Humidity 1", 1, 1),
    FieldSpec::new(35, "Humidity 2", 1, 1),
    FieldSpec::new(36, "Humidity 3", 1, 1),
    FieldSpec::new(37, "Humidity 4", 1, 1),
    FieldSpec::new(38, "Humidity 5", 1, 1),
    FieldSpec::new(39, "Humidity 6", 1, 1),
    FieldSpec::new(40, "Humidity 7", 1, 1),
    FieldSpec::new(41, "Humidity 8", 1, 1),
    FieldSpec::new(44, "Soil Moisture 1", 1, 1),
    FieldSpec::new(46, "Soil Moisture 2", 1, 1),
    FieldSpec::new(48, "Soil Moisture 3", 1, 1),
    FieldSpec::new(50, "Soil Moisture 4", 1, 1),
    FieldSpec::new(52, "Soil Moisture 5", 1, 1),
    FieldSpec::new(54, "Soil Moisture 6", 1, 1),
    FieldSpec::new(56, "Soil Moisture 7", 1, 1),
    FieldSpec::new(58, "Soil Moisture 8", 1, 1),
];

/// Immutable table mapping field codes to decoding rules.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    specs: &'static [FieldSpec],
}

impl FieldRegistry {
    /// Build the registry for the live-data command.
    pub fn live_data() -> Self {
        let registry = Self {
            specs: LIVE_DATA_FIELDS,
        };
        debug_assert!(registry.is_sorted_by_code());
        registry
    }

    /// Look up the decoding rule for a field code.
    pub fn get(&self, code: u8) -> Option<&FieldSpec> {
        self.specs
            .binary_search_by_key(&code, |spec| spec.code)
            .ok()
            .map(|idx| &self.specs[idx])
    }

    /// Check whether a field code is known.
    pub fn contains(&self, code: u8) -> bool {
        self.get(code).is_some()
    }

    /// Iterate over all field specs in code order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.specs.iter()
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    fn is_sorted_by_code(&self) -> bool {
        self.specs.windows(2).all(|w| w[0].code < w[1].code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_sorted_and_unique() {
        let registry = FieldRegistry::live_data();
        assert!(registry.is_sorted_by_code());
        assert_eq!(registry.len(), 37);
    }

    #[test]
    fn test_lookup_known_codes() {
        let registry = FieldRegistry::live_data();

        let spec = registry.get(1).unwrap();
        assert_eq!(spec.name, "Indoor Temperature");
        assert_eq!(spec.length, 2);
        assert_eq!(spec.divisor, 10);

        let spec = registry.get(21).unwrap();
        assert_eq!(spec.name, "Light");
        assert_eq!(spec.length, 4);

        let spec = registry.get(58).unwrap();
        assert_eq!(spec.name, "Soil Moisture 8");
        assert_eq!(spec.divisor, 1);
    }

    #[test]
    fn test_lookup_unknown_codes() {
        let registry = FieldRegistry::live_data();

        // Gaps in the table: soil moisture uses only even codes 44-58
        assert!(!registry.contains(45));
        assert!(!registry.contains(0));
        assert!(!registry.contains(255));
    }

    #[test]
    fn test_lengths_are_valid() {
        let registry = FieldRegistry::live_data();
        for spec in registry.iter() {
            assert!(matches!(spec.length, 1 | 2 | 4), "field {}", spec.code);
            assert!(spec.divisor >= 1, "field {}", spec.code);
        }
    }
}
