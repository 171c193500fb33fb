//! Per-request pagination state.

use crate::config::PagerConfig;
use serde::{Deserialize, Serialize};

/// Immutable pagination request state.
///
/// Every modifier returns a new `Pager`. `page` and `size` are clamped to at
/// least 1 and `each_side` to at least 0.
///
/// # Example
/// ```ignore
/// use seekpage::Pager;
///
/// let pager = Pager::new(1, 10).with_each_side(2);
/// let third = pager.next(2);
/// assert_eq!(third.page(), 3);
/// assert!(third.verify(Some(&pager)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PagerRepr")]
pub struct Pager {
    page: i64,
    size: i64,
    each_side: i64,
    need_total: bool,
    cursor_name: Option<String>,
}

/// Client-supplied pager state, clamped on the way in.
#[derive(Deserialize)]
struct PagerRepr {
    page: i64,
    size: i64,
    #[serde(default)]
    each_side: i64,
    #[serde(default)]
    need_total: bool,
    #[serde(default)]
    cursor_name: Option<String>,
}

impl From<PagerRepr> for Pager {
    fn from(raw: PagerRepr) -> Self {
        Self {
            page: raw.page.max(1),
            size: raw.size.max(1),
            each_side: raw.each_side.max(0),
            need_total: raw.need_total,
            cursor_name: raw.cursor_name,
        }
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::from_config(&PagerConfig::default())
    }
}

impl Pager {
    /// Page `page` of `size` rows, no look-ahead, no total.
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
            each_side: 0,
            need_total: false,
            cursor_name: None,
        }
    }

    /// First page with configured defaults.
    pub fn from_config(config: &PagerConfig) -> Self {
        Self::new(1, config.default_size)
            .with_each_side(config.default_each_side)
            .with_need_total(config.default_need_total)
    }

    /// Configured defaults overridden by request values.
    ///
    /// A request size larger than `config.max_size` is clamped down.
    pub fn from_request(
        config: &PagerConfig,
        page: Option<i64>,
        size: Option<i64>,
        cursor_name: Option<String>,
    ) -> Self {
        let mut pager = Self::from_config(config);
        if let Some(page) = page {
            pager = pager.with_page(page);
        }
        if let Some(size) = size {
            pager = pager.with_size(config.clamp_size(size));
        }
        match cursor_name {
            Some(name) => pager.with_cursor_name(name),
            None => pager,
        }
    }

    /// Current page (1-based).
    pub fn page(&self) -> i64 {
        self.page
    }

    /// Rows per page.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Look-ahead width on each side of the current page.
    pub fn each_side(&self) -> i64 {
        self.each_side
    }

    /// Whether a total count is required.
    pub fn need_total(&self) -> bool {
        self.need_total
    }

    /// Cursor storage name, if cursor pagination is used.
    pub fn cursor_name(&self) -> Option<&str> {
        self.cursor_name.as_deref()
    }

    /// `true` iff a cursor name is set.
    pub fn use_cursor(&self) -> bool {
        self.cursor_name.is_some()
    }

    /// Rows skipped before the current page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.size
    }

    /// Move forward `step` pages.
    pub fn next(&self, step: i64) -> Self {
        self.with_page(self.page.saturating_add(step))
    }

    /// Move back `step` pages (never below page 1).
    pub fn prev(&self, step: i64) -> Self {
        self.with_page(self.page.saturating_sub(step))
    }

    /// Jump to `page`.
    pub fn with_page(&self, page: i64) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Set the page size.
    pub fn with_size(&self, size: i64) -> Self {
        Self {
            size: size.max(1),
            ..self.clone()
        }
    }

    /// Set the look-ahead width.
    pub fn with_each_side(&self, each_side: i64) -> Self {
        Self {
            each_side: each_side.max(0),
            ..self.clone()
        }
    }

    /// Require (or not) a total count.
    pub fn with_need_total(&self, need_total: bool) -> Self {
        Self {
            need_total,
            ..self.clone()
        }
    }

    /// Use cursor pagination, storing cursors under `name`.
    pub fn with_cursor_name(&self, name: impl Into<String>) -> Self {
        Self {
            cursor_name: Some(name.into()),
            ..self.clone()
        }
    }

    /// Drop the cursor name.
    pub fn without_cursor(&self) -> Self {
        Self {
            cursor_name: None,
            ..self.clone()
        }
    }

    /// `true` iff `other` is present and every field except `page` matches.
    ///
    /// Used to detect that a client round-tripped pagination state unmodified
    /// except for page navigation.
    pub fn verify(&self, other: Option<&Pager>) -> bool {
        match other {
            Some(other) => {
                self.size == other.size
                    && self.each_side == other.each_side
                    && self.need_total == other.need_total
                    && self.cursor_name == other.cursor_name
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_on_construction() {
        let p = Pager::new(0, -5).with_each_side(-3);
        assert_eq!(p.page(), 1);
        assert_eq!(p.size(), 1);
        assert_eq!(p.each_side(), 0);
    }

    #[test]
    fn next_and_prev_return_new_values() {
        let p = Pager::new(2, 10);
        let n = p.next(3);
        assert_eq!(n.page(), 5);
        assert_eq!(p.page(), 2);
        assert_eq!(p.prev(5).page(), 1);
        assert_eq!(n.prev(1).page(), 4);
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(Pager::new(1, 10).offset(), 0);
        assert_eq!(Pager::new(3, 10).offset(), 20);
    }

    #[test]
    fn verify_ignores_page_only() {
        let p = Pager::new(1, 10).with_each_side(2).with_cursor_name("users");
        assert!(p.verify(Some(&p.next(4))));
        assert!(!p.verify(Some(&p.with_size(20))));
        assert!(!p.verify(Some(&p.with_each_side(1))));
        assert!(!p.verify(Some(&p.with_need_total(true))));
        assert!(!p.verify(Some(&p.without_cursor())));
        assert!(!p.verify(None));
    }

    #[test]
    fn use_cursor_tracks_name() {
        let p = Pager::new(1, 10);
        assert!(!p.use_cursor());
        let c = p.with_cursor_name("feed");
        assert!(c.use_cursor());
        assert_eq!(c.cursor_name(), Some("feed"));
    }

    #[test]
    fn resolves_config_then_request() {
        let cfg = PagerConfig::new()
            .with_size(25)
            .with_each_side(2)
            .with_need_total(true)
            .with_max_size(50);
        let p = Pager::from_request(&cfg, Some(4), Some(500), None);
        assert_eq!(p.page(), 4);
        assert_eq!(p.size(), 50);
        assert_eq!(p.each_side(), 2);
        assert!(p.need_total());

        let d = Pager::from_request(&cfg, None, None, Some("c".to_string()));
        assert_eq!(d.page(), 1);
        assert_eq!(d.size(), 25);
        assert!(d.use_cursor());
    }

    #[test]
    fn round_trips_through_json() {
        let p = Pager::new(3, 20).with_each_side(1).with_cursor_name("x");
        let json = serde_json::to_string(&p).unwrap();
        let back: Pager = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn deserializing_clamps_tampered_values() {
        let p: Pager = serde_json::from_str(r#"{"page":-4,"size":0,"each_side":-1}"#).unwrap();
        assert_eq!(p, Pager::new(1, 1));
    }
}
