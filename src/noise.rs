pub const DEFAULT_NOISE_PATTERNS: [&str; 4] = [
    "gralloc4",
    "register: id=",
    "unregister: id=",
    "flushmediametrics",
];

/// Case-insensitive substring denylist applied before lines reach the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseFilter {
    patterns: Vec<String>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_PATTERNS)
    }
}

impl NoiseFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| pattern.as_ref().to_lowercase())
            .filter(|pattern| !pattern.trim().is_empty())
            .collect::<Vec<String>>();
        Self { patterns }
    }

    pub fn disabled() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_noise(&self, line: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let lowered = line.to_lowercase();
        self.patterns
            .iter()
            .any(|pattern| lowered.contains(pattern.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::NoiseFilter;

    #[test]
    fn default_patterns_drop_known_hardware_noise() {
        let filter = NoiseFilter::default();
        assert!(filter.is_noise("D/gralloc4( 512): buffer allocated"));
        assert!(filter.is_noise("I/Media: FlushMediaMetrics done"));
        assert!(!filter.is_noise("I/ActivityManager: Start proc com.example"));
    }

    #[test]
    fn matching_ignores_case_on_both_sides() {
        let filter = NoiseFilter::new(["HeartBeat"]);
        assert!(filter.is_noise("... HEARTBEAT tick ..."));
        assert!(filter.is_noise("heartbeat"));
        assert!(!filter.is_noise("heart beat"));
    }

    #[test]
    fn blank_patterns_are_discarded() {
        let filter = NoiseFilter::new(["", "  ", "\t"]);
        assert!(filter.patterns().is_empty());
        assert!(!filter.is_noise("plain line"));
        assert!(!filter.is_noise("I/Tag  (  42):  aligned  columns"));
        assert!(!NoiseFilter::disabled().is_noise("gralloc4"));
    }
}
