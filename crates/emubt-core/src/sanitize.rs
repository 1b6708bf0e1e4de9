//! Symbol name sanitizer
//!
//! The sanitized name is both the CSV filename suffix and the key used to
//! match CSV files back to `<symbol>` elements.

/// Placeholder used for a missing or empty name
pub const UNNAMED: &str = "unnamed";

/// Replace every character outside `[A-Za-z0-9._-]` with `_`
pub fn sanitize(name: &str) -> String {
    if name.is_empty() {
        return UNNAMED.to_string();
    }

    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_spaces() {
        assert_eq!(sanitize("Gain Table"), "Gain_Table");
    }

    #[test]
    fn test_sanitize_empty() {
        assert_eq!(sanitize(""), "unnamed");
    }

    #[test]
    fn test_sanitize_keeps_allowed() {
        assert_eq!(sanitize("map-1.v2_x"), "map-1.v2_x");
    }

    #[test]
    fn test_sanitize_per_character() {
        assert_eq!(sanitize("a/b:c"), "a_b_c");
        assert_eq!(sanitize("été"), "_t_");
    }

    #[test]
    fn test_sanitize_idempotent() {
        for name in ["", "Gain Table", "x//y", "ünï cøde", "plain", "__"] {
            let once = sanitize(name);
            assert_eq!(sanitize(&once), once);
        }
    }
}
