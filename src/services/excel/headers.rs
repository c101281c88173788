use std::collections::{HashMap, HashSet};

/// Turns raw header labels into trimmed, non-empty, unique labels.
///
/// Blank labels at position `i` become `col_{i+1}`. A repeated label gets a
/// `__{n}` suffix where `n` counts its earlier occurrences; if that suffixed
/// label is itself already taken, `n` keeps increasing until it is free.
pub fn normalize_headers<S: AsRef<str>>(raw: &[Option<S>]) -> Vec<String> {
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut normalized = Vec::with_capacity(raw.len());

    for (idx, label) in raw.iter().enumerate() {
        let base = label
            .as_ref()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| format!("col_{}", idx + 1));

        let count = occurrences.entry(base.clone()).or_insert(0);
        let mut candidate = if *count == 0 {
            base.clone()
        } else {
            format!("{}__{}", base, count)
        };
        while taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{}__{}", base, count);
        }
        *count += 1;

        taken.insert(candidate.clone());
        normalized.push(candidate);
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<Option<String>> {
        raw.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn test_blank_labels_get_positional_names() {
        assert_eq!(
            normalize_headers(&labels(&["", "", ""])),
            vec!["col_1", "col_2", "col_3"]
        );
    }

    #[test]
    fn test_duplicates_are_suffixed() {
        assert_eq!(
            normalize_headers(&labels(&["A", "A", "A"])),
            vec!["A", "A__1", "A__2"]
        );
    }

    #[test]
    fn test_trim_and_absent_labels() {
        let raw = vec![Some("  Name ".to_string()), None, Some("   ".to_string())];
        assert_eq!(normalize_headers(&raw), vec!["Name", "col_2", "col_3"]);
    }

    #[test]
    fn test_suffix_collision_with_existing_label() {
        let out = normalize_headers(&labels(&["A", "A__1", "A", "col_2", ""]));
        assert_eq!(out, vec!["A", "A__1", "A__2", "col_2", "col_5"]);
    }

    #[test]
    fn test_blank_collides_with_explicit_positional_name() {
        let out = normalize_headers(&labels(&["", "col_1"]));
        assert_eq!(out, vec!["col_1", "col_1__1"]);
    }

    #[test]
    fn test_output_is_unique_non_empty_and_same_length() {
        let raw = labels(&["x", "", "x", " x ", "x__1", "", "col_2", "y", "y"]);
        let out = normalize_headers(&raw);
        assert_eq!(out.len(), raw.len());
        assert!(out.iter().all(|l| !l.is_empty()));
        let unique: HashSet<&String> = out.iter().collect();
        assert_eq!(unique.len(), out.len());
    }

    #[test]
    fn test_already_normalized_labels_are_stable() {
        let once = normalize_headers(&labels(&["A", "A", "", "B"]));
        let again: Vec<Option<String>> = once.iter().cloned().map(Some).collect();
        assert_eq!(normalize_headers(&again), once);
    }
}
