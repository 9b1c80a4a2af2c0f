//! Reader configuration

/// Default maximum nesting depth for arrays and maps
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// Limits applied while decoding possibly hostile input
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SecurityOptions {
    /// Maximum array/map nesting depth
    pub max_depth: usize,
}

impl SecurityOptions {
    /// Tighter preset for data from untrusted peers
    #[must_use]
    pub fn untrusted_data() -> Self {
        Self::default().with_max_depth(64)
    }

    /// Replace the maximum nesting depth
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for SecurityOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
