//! Fixed enumeration of the network's line identifiers and line groups.
//!
//! Statistics count healthy lines against [`ALL_LINES`] rather than against the
//! lines seen in the current alert batch, so an empty batch reports the whole
//! network as in good service.

/// Every line identifier of the network.
pub const ALL_LINES: &[&str] = &[
    "1", "2", "3", "4", "5", "6", "7", "A", "C", "E", "B", "D", "F", "M", "G", "J", "Z", "L", "N",
    "Q", "R", "W", "S",
];

/// Named line groups selectable by the line facet, keyed by group name.
pub const LINE_GROUPS: &[(&str, &[&str])] = &[
    ("123", &["1", "2", "3"]),
    ("456", &["4", "5", "6"]),
    ("7", &["7"]),
    ("ACE", &["A", "C", "E"]),
    ("BDFM", &["B", "D", "F", "M"]),
    ("G", &["G"]),
    ("JZ", &["J", "Z"]),
    ("L", &["L"]),
    ("NQRW", &["N", "Q", "R", "W"]),
    ("S", &["S"]),
];

/// Returns the lines of a named group, or `None` if the group is unknown.
pub fn line_group(name: &str) -> Option<&'static [&'static str]> {
    LINE_GROUPS
        .iter()
        .find(|(group, _)| *group == name)
        .map(|(_, lines)| *lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_groups_only_reference_known_lines() {
        let all: HashSet<&str> = ALL_LINES.iter().copied().collect();
        for (name, lines) in LINE_GROUPS {
            for line in *lines {
                assert!(all.contains(line), "group {} has unknown line {}", name, line);
            }
        }
    }

    #[test]
    fn test_line_group_lookup() {
        assert_eq!(line_group("456"), Some(&["4", "5", "6"][..]));
        assert_eq!(line_group("XYZ"), None);
    }
}
