use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// A typed configuration value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ConfigValue {
    Float(f32),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
}

/// Key/value settings handed to a plugin's `init`.
///
/// Lookups never fail: a key that is missing, or that holds a value of a
/// different type, yields the default supplied by the caller unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FilterConfig {
    values: BTreeMap<String, ConfigValue>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(String::from(key), value);
    }

    pub fn with_float(mut self, key: &str, value: f32) -> Self {
        self.set(key, ConfigValue::Float(value));
        self
    }

    pub fn with_float_array(mut self, key: &str, values: &[f32]) -> Self {
        self.set(key, ConfigValue::FloatArray(values.to_vec()));
        self
    }

    pub fn with_int_array(mut self, key: &str, values: &[i32]) -> Self {
        self.set(key, ConfigValue::IntArray(values.to_vec()));
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        match self.values.get(key) {
            Some(ConfigValue::Float(v)) => *v,
            _ => default,
        }
    }

    /// Reads an integer. Stored as a one-element int array, or a float with
    /// no fractional part.
    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.values.get(key) {
            Some(ConfigValue::IntArray(v)) if v.len() == 1 => v[0],
            Some(ConfigValue::Float(v)) if libm::truncf(*v) == *v => *v as i32,
            _ => default,
        }
    }

    pub fn get_float_array(&self, key: &str, defaults: &[f32]) -> Vec<f32> {
        match self.values.get(key) {
            Some(ConfigValue::FloatArray(v)) => v.clone(),
            Some(ConfigValue::IntArray(v)) => v.iter().map(|&x| x as f32).collect(),
            _ => defaults.to_vec(),
        }
    }

    pub fn get_int_array(&self, key: &str, defaults: &[i32]) -> Vec<i32> {
        match self.values.get(key) {
            Some(ConfigValue::IntArray(v)) => v.clone(),
            _ => defaults.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_missing_keys_yield_defaults() {
        let config = FilterConfig::new();
        assert_eq!(config.get_float("intensity", 5.0), 5.0);
        assert_eq!(config.get_float_array("left_mix", &[1.0, 0.0]), vec![1.0, 0.0]);
        assert_eq!(config.get_int_array("taps", &[3, 4]), vec![3, 4]);
        assert_eq!(config.get_int("block_size_log2", 9), 9);
    }

    #[test]
    fn test_present_keys_override() {
        let config = FilterConfig::new()
            .with_float("intensity", 2.5)
            .with_float_array("left_mix", &[0.5, 0.5])
            .with_int_array("block_size_log2", &[10]);

        assert_eq!(config.get_float("intensity", 5.0), 2.5);
        assert_eq!(config.get_float_array("left_mix", &[1.0, 0.0]), vec![0.5, 0.5]);
        assert_eq!(config.get_int("block_size_log2", 9), 10);
    }

    #[test]
    fn test_wrong_type_falls_back() {
        let config = FilterConfig::new().with_float_array("intensity", &[1.0, 2.0]);
        assert_eq!(config.get_float("intensity", 5.0), 5.0);
    }

    #[test]
    fn test_int_array_widens_to_float_array() {
        let config = FilterConfig::new().with_int_array("gains", &[-3, 6]);
        assert_eq!(config.get_float_array("gains", &[]), vec![-3.0, 6.0]);
    }

    #[test]
    fn test_fractional_float_is_not_an_int() {
        let config = FilterConfig::new().with_float("block_size_log2", 9.5);
        assert_eq!(config.get_int("block_size_log2", 8), 8);
    }
}
