pub const DEFAULT_REFUSAL_MARKER: &str = "I'm sorry";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefusalRule {
    marker: String,
}

impl Default for RefusalRule {
    fn default() -> Self {
        Self::new(DEFAULT_REFUSAL_MARKER)
    }
}

impl RefusalRule {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn matches(&self, message: &str) -> bool {
        !self.marker.is_empty() && message.contains(&self.marker)
    }
}
