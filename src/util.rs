use std::cmp::Ordering;
use std::path::Path;

/// Label used for files without an extension when grouping by file type.
pub const NO_EXTENSION: &str = "(none)";

/// Case-insensitive name ordering that ignores Latin accents, with the raw
/// string as tie-break.
pub fn case_insensitive_cmp(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(sort_key(b)).then_with(|| a.cmp(b))
}

fn sort_key(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase).map(fold_accent)
}

// Latin-1 letters only; other scripts compare by code point.
fn fold_accent(c: char) -> char {
    match c {
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}

pub fn file_type_key(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NO_EXTENSION.to_string())
}
