const PLACEHOLDERS: [&str; 4] = ["", "tbd", "null", "unknown"];

/// True for an absent cell or a placeholder such as `"TBD"` or `"\u{a0}Unknown "`.
pub fn is_missing(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(raw) => {
            let cleaned = raw.replace('\u{a0}', "");
            let normalized = cleaned.trim().to_lowercase();
            PLACEHOLDERS.contains(&normalized.as_str())
        }
    }
}

pub fn is_present(value: Option<&str>) -> bool {
    !is_missing(value)
}
