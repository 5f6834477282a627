use once_cell::sync::Lazy;
use regex::Regex;

// Longer sequences first so combined forms fold before their prefixes.
const FOLDS: &[(&str, &str)] = &[
    ("q\u{303}\u{303}", "q"),
    ("q\u{303}", "q"),
    ("q~", "que"),
    ("a\u{303}", "a"),
    ("ǎ", "a"),
    ("ã", "a"),
    ("á", "a"),
    ("ä", "a"),
    ("à", "a"),
    ("ā", "a"),
    ("é", "e"),
    ("ě", "e"),
    ("è", "e"),
    ("ē", "e"),
    ("ï", "i"),
    ("í", "i"),
    ("î", "i"),
    ("ì", "i"),
    ("ó", "o"),
    ("ö", "o"),
    ("ǒ", "o"),
    ("ô", "o"),
    ("õ", "o"),
    ("ſ", "s"),
    ("û", "u"),
    ("ǔ", "u"),
    ("ú", "u"),
];

const PUNCTUATION: &[char] = &[',', '.', '[', ']', '\'', '?', '*', '’', '-'];

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\w+\]").expect("valid regex"));

/// Folds a word to the form used to compare annotation keys with document
/// text: lowercase, accents and archaic letters folded, whitespace and
/// punctuation dropped, bracketed editorial insertions removed.
pub fn normalize_word(word: &str) -> String {
    let mut folded = word.to_lowercase();
    for (from, to) in FOLDS {
        if folded.contains(from) {
            folded = folded.replace(from, to);
        }
    }
    let compact: String = folded.chars().filter(|ch| !ch.is_whitespace()).collect();
    BRACKETED
        .replace_all(&compact, "")
        .chars()
        .filter(|ch| !PUNCTUATION.contains(ch))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::normalize_word;

    #[test]
    fn folds_accents_and_case() {
        assert_eq!(normalize_word("Tobí"), "tobi");
        assert_eq!(normalize_word("ſéa"), "sea");
    }

    #[test]
    fn drops_whitespace_and_punctuation() {
        assert_eq!(normalize_word(" co-xi ,\n tao. "), "coxitao");
        assert_eq!(normalize_word("peni’?"), "peni");
    }

    #[test]
    fn removes_bracketed_insertions() {
        assert_eq!(normalize_word("qui[n]ta"), "quita");
    }

    #[test]
    fn expands_abbreviated_que() {
        assert_eq!(normalize_word("q~"), "que");
        assert_eq!(normalize_word("q\u{303}"), "q");
    }

    #[test]
    fn uppercase_accents_fold_after_lowercasing() {
        assert_eq!(normalize_word("TOBÍ"), "tobi");
        assert_eq!(normalize_word("Q~ ÉL"), "queel");
    }
}
