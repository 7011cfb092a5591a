#![forbid(unsafe_code)]

//! Configuration for [`MulticastDelegate`](crate::MulticastDelegate).

/// Construction-time settings for a multicast registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastConfig {
    /// Label attached to log events from this registry. Default: `"multicast"`.
    pub name: &'static str,
    /// Entry capacity reserved up front. Default: 0.
    pub initial_capacity: usize,
}

impl Default for MulticastConfig {
    fn default() -> Self {
        Self {
            name: "multicast",
            initial_capacity: 0,
        }
    }
}

impl MulticastConfig {
    /// Default configuration with the given log label.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Set the log label.
    #[must_use]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Reserve room for `capacity` listeners.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MulticastConfig::default();
        assert_eq!(config.name, "multicast");
        assert_eq!(config.initial_capacity, 0);
    }

    #[test]
    fn builders() {
        let config = MulticastConfig::new("on_health_changed").with_initial_capacity(4);
        assert_eq!(config.name, "on_health_changed");
        assert_eq!(config.initial_capacity, 4);
        assert_eq!(config.with_name("renamed").name, "renamed");
    }
}
