//! Text helpers for free-text answers: edit distance and keyword extraction

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Function words ignored when building a free-text profile
const STOP_WORDS: &[&str] = &[
    // Spanish
    "a", "al", "algo", "como", "con", "de", "del", "el", "ella", "ellos", "en", "es", "esta",
    "este", "esto", "fue", "ha", "hay", "la", "las", "le", "les", "lo", "los", "mas", "me", "mi",
    "muy", "no", "nos", "o", "para", "pero", "por", "que", "se", "si", "sin", "sobre", "su",
    "sus", "te", "tu", "un", "una", "uno", "y", "ya", "yo",
    // English
    "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "i", "if", "in", "is",
    "it", "its", "my", "of", "on", "or", "so", "that", "the", "this", "to", "was", "we", "with",
    "you",
];

/// Levenshtein distance between two strings, counted in Unicode scalar values
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Split text into lower-case, accent-free words.
///
/// Accents are removed by canonical decomposition followed by dropping the
/// combining marks; anything that is not a letter separates words, which also
/// discards punctuation and digits.
pub fn tokenize(text: &str) -> Vec<String> {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    folded
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Whether a normalized token is on the fixed stop-word list
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Tokens of `text` that carry meaning
pub fn keywords(text: &str) -> impl Iterator<Item = String> {
    tokenize(text).into_iter().filter(|t| !is_stop_word(t))
}
