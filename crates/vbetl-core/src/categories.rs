//! Raw-to-canonical category lookup tables.
//!
//! The vendor reports browsers, devices and network zones with free-form
//! names. Reports collapse them into a handful of labels; anything the table
//! does not know lands in the map's fallback bucket so no count is dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMap {
    pub mapping: BTreeMap<String, String>,
    /// Label for unmapped, blank or missing keys.
    pub fallback: String,
}

impl CategoryMap {
    #[must_use]
    pub fn new(pairs: &[(&str, &str)], fallback: &str) -> Self {
        Self {
            mapping: pairs
                .iter()
                .map(|(raw, label)| ((*raw).to_string(), (*label).to_string()))
                .collect(),
            fallback: fallback.to_string(),
        }
    }

    /// Canonical label for a raw key. Keys are trimmed before lookup.
    #[must_use]
    pub fn label(&self, raw: Option<&str>) -> &str {
        raw.map(str::trim)
            .filter(|k| !k.is_empty())
            .and_then(|k| self.mapping.get(k))
            .map_or(self.fallback.as_str(), String::as_str)
    }

    #[must_use]
    pub fn video_device() -> Self {
        Self::new(
            &[("PC", "Desktop"), ("Mobile Device", "Mobile")],
            "Other Device",
        )
    }

    #[must_use]
    pub fn video_browser() -> Self {
        Self::new(
            &[
                ("Chrome", "Chrome"),
                ("Chrome Mobile", "Chrome"),
                ("Microsoft Edge", "Microsoft Edge"),
                ("Microsoft Edge mobile", "Microsoft Edge"),
            ],
            "Other Browser",
        )
    }

    #[must_use]
    pub fn webcast_browser() -> Self {
        Self::new(
            &[
                ("Chrome", "Chrome"),
                ("Chrome mobile", "Chrome"),
                ("Chrome Mobile", "Chrome"),
                ("Microsoft Edge", "Edge"),
                ("Microsoft Edge mobile", "Edge"),
                ("Android WebView", "Other"),
                ("Apple Mail", "Other"),
                ("Firefox", "Other"),
                ("Mozilla", "Other"),
                ("Opera", "Other"),
                ("Safari", "Other"),
                ("Safari mobile", "Other"),
            ],
            "Other",
        )
    }

    #[must_use]
    pub fn webcast_device() -> Self {
        Self::new(&[("PC", "PC"), ("Mobile Device", "Mobile")], "Other")
    }

    #[must_use]
    pub fn webcast_zone() -> Self {
        Self::new(
            &[
                ("APAC", "APAC"),
                ("APAC CS", "APAC"),
                ("APAC Cloud VDI's & Surface Device's", "APAC"),
                ("America", "America"),
                ("America CS", "America"),
                ("America Cloud VDI's & Surface Device's", "America"),
                ("EMEA", "EMEA"),
                ("EMEA CS", "EMEA"),
                ("EMEA Cloud VDI's & Surface Device's", "EMEA"),
                ("Swiss", "Swiss"),
                ("Swiss CS", "Swiss"),
                ("Swiss Cloud VDI's & Surface Device's", "Swiss"),
                ("DefaultZone", "Other"),
                ("Z - Fallback", "Other"),
            ],
            "Other",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_map_to_labels() {
        let map = CategoryMap::video_device();
        assert_eq!(map.label(Some("PC")), "Desktop");
        assert_eq!(map.label(Some("Mobile Device")), "Mobile");
    }

    #[test]
    fn unknown_and_missing_keys_use_fallback() {
        let map = CategoryMap::video_browser();
        assert_eq!(map.label(Some("Netscape")), "Other Browser");
        assert_eq!(map.label(None), "Other Browser");
        assert_eq!(map.label(Some("   ")), "Other Browser");
    }

    #[test]
    fn keys_are_trimmed_before_lookup() {
        let map = CategoryMap::webcast_zone();
        assert_eq!(map.label(Some("  EMEA CS ")), "EMEA");
    }

    #[test]
    fn several_raw_keys_collapse_into_one_label() {
        let map = CategoryMap::webcast_browser();
        assert_eq!(map.label(Some("Chrome mobile")), "Chrome");
        assert_eq!(map.label(Some("Chrome Mobile")), "Chrome");
        assert_eq!(map.label(Some("Microsoft Edge mobile")), "Edge");
    }
}
