use std::sync::Arc;

/// Process-wide naming configuration.
///
/// Built once (usually by the context) and passed by reference to whatever validates or
/// resolves names, so no code path reaches for ambient globals.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    name_max_len: usize,
    coords_name: Arc<str>,
}

impl Config {
    /// Default upper bound on the length of an attribute or dimension name, in bytes.
    pub const DEFAULT_NAME_MAX_LEN: usize = 256;
    /// Default reserved name of the coordinates pseudo-attribute.
    pub const DEFAULT_COORDS_NAME: &'static str = "__coords";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name_max_len(mut self, name_max_len: usize) -> Self {
        self.name_max_len = name_max_len;
        self
    }

    pub fn with_coords_name<S: Into<Arc<str>>>(mut self, coords_name: S) -> Self {
        self.coords_name = coords_name.into();
        self
    }

    pub fn name_max_len(&self) -> usize {
        self.name_max_len
    }

    /// The reserved name under which the coordinates pseudo-attribute can be requested.
    pub fn coords_name(&self) -> &str {
        &self.coords_name
    }

    /// Whether `name` is non-empty and no longer than [`Config::name_max_len`].
    pub fn is_valid_name(&self, name: &str) -> bool {
        !name.is_empty() && name.len() <= self.name_max_len
    }

    /// Parse a configuration from a JSON document. Missing keys keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> tessel_error::TesselResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name_max_len: Self::DEFAULT_NAME_MAX_LEN,
            coords_name: Self::DEFAULT_COORDS_NAME.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.name_max_len(), 256);
        assert_eq!(config.coords_name(), "__coords");
    }

    #[test]
    fn name_validation() {
        let config = Config::new().with_name_max_len(3);
        assert!(config.is_valid_name("abc"));
        assert!(!config.is_valid_name("abcd"));
        assert!(!config.is_valid_name(""));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json() {
        let config = Config::from_json(r#"{"coords_name": "coords"}"#).unwrap();
        assert_eq!(config.coords_name(), "coords");
        assert_eq!(config.name_max_len(), Config::DEFAULT_NAME_MAX_LEN);
    }
}
