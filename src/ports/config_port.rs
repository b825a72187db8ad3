//! Configuration access port trait.

use crate::domain::error::SigtraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Trimmed, non-empty value or `ConfigMissing`.
    fn require_string(&self, section: &str, key: &str) -> Result<String, SigtraderError> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SigtraderError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}
