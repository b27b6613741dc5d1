const ACCEPTED_COUNTRIES: [&str; 8] = [
    "united states",
    "usa",
    "us",
    "puerto rico",
    "guam",
    "u.s. virgin islands",
    "american samoa",
    "northern mariana islands",
];

/// US or a US territory. An absent country is never acceptable.
pub fn is_acceptable(country: Option<&str>) -> bool {
    country
        .map(|c| c.trim().to_lowercase())
        .is_some_and(|c| ACCEPTED_COUNTRIES.contains(&c.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_us_and_territories() {
        for country in [
            "United States",
            "USA",
            " us ",
            "Puerto Rico",
            "GUAM",
            "U.S. Virgin Islands",
            "American Samoa",
            "Northern Mariana Islands",
        ] {
            assert!(is_acceptable(Some(country)), "{} should be accepted", country);
        }
    }

    #[test]
    fn test_rejects_foreign_and_absent() {
        assert!(!is_acceptable(Some("Canada")));
        assert!(!is_acceptable(Some("Mexico")));
        assert!(!is_acceptable(Some("")));
        assert!(!is_acceptable(Some("United States Minor Outlying Islands")));
        assert!(!is_acceptable(None));
    }
}
