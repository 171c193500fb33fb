//! Pagination defaults.
//!
//! Defaults are resolved once per [`Pager`](crate::Pager) construction. They can be
//! built in code or loaded from a TOML file:
//!
//! ```toml
//! [pagination]
//! default_size = 25
//! default_each_side = 2
//! default_need_total = false
//! max_size = 200
//! ```

use crate::error::{PageError, PageResult};
use serde::Deserialize;
use std::path::Path;

/// Page size used when nothing is configured.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Default pagination settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PagerConfig {
    /// Page size when the request does not override it.
    pub default_size: i64,
    /// Look-ahead width on each side of the current page.
    pub default_each_side: i64,
    /// Whether a total count is required by default.
    pub default_need_total: bool,
    /// Upper bound for request-supplied page sizes. `None` means unbounded.
    pub max_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    pagination: PagerConfig,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            default_each_side: 0,
            default_need_total: false,
            max_size: None,
        }
    }
}

impl PagerConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default page size.
    pub fn with_size(mut self, size: i64) -> Self {
        self.default_size = size;
        self
    }

    /// Set the default look-ahead width.
    pub fn with_each_side(mut self, each_side: i64) -> Self {
        self.default_each_side = each_side;
        self
    }

    /// Require a total count by default.
    pub fn with_need_total(mut self, need_total: bool) -> Self {
        self.default_need_total = need_total;
        self
    }

    /// Bound request-supplied page sizes.
    pub fn with_max_size(mut self, max_size: i64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Clamp a request-supplied page size to `max_size`.
    pub fn clamp_size(&self, size: i64) -> i64 {
        match self.max_size {
            Some(max) if size > max => max,
            _ => size,
        }
    }

    /// Parse the `[pagination]` table of a TOML document.
    pub fn from_toml_str(raw: &str) -> PageResult<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        file.pagination.validate()?;
        Ok(file.pagination)
    }

    /// Load the `[pagination]` table from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> PageResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PageError::Config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> PageResult<()> {
        if self.default_size < 1 {
            return Err(PageError::Config(format!(
                "default_size must be >= 1, got {}",
                self.default_size
            )));
        }
        if self.default_each_side < 0 {
            return Err(PageError::Config(format!(
                "default_each_side must be >= 0, got {}",
                self.default_each_side
            )));
        }
        if let Some(max) = self.max_size {
            if max < self.default_size {
                return Err(PageError::Config(format!(
                    "max_size ({max}) is smaller than default_size ({})",
                    self.default_size
                )));
            }
        }
        Ok(())
    }
}
