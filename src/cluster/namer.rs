//! Cluster naming
//!
//! Derives a short human-readable folder name for a topic from the
//! concatenated text of its member files. Salient unigrams and
//! bigrams are ranked by frequency with common stop words excluded;
//! the winning terms are title-cased and joined with an underscore.
//! Degenerate input falls back to deterministic placeholders, so the
//! result is always a non-empty, filesystem-legal folder name.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// How many candidate terms to rank before picking the final two
const CANDIDATE_TERMS: usize = 3;

/// Terms joined into the final name
const NAME_TERMS: usize = 2;

fn token_pattern() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(r"[a-z]{2,}").expect("static token pattern"))
}

/// Common English stop words, excluded from naming and keywords
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during",
    "each", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her",
    "here", "hers", "him", "his", "how", "if", "in", "into", "is", "it", "its", "itself",
    "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off",
    "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "would", "you", "your", "yours",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Name a topic from its members' texts.
///
/// Blank combined text yields `Misc_<label>`; text with no usable
/// terms yields `Topic_<label>`. Otherwise the top three terms by
/// frequency are ranked and the alphabetically first two are joined.
pub fn name(label: i32, member_texts: &[&str]) -> String {
    let combined = member_texts.join(" ");
    if combined.trim().is_empty() {
        return format!("Misc_{label}");
    }

    let mut terms = top_terms(&combined, CANDIDATE_TERMS);
    if terms.is_empty() {
        return format!("Topic_{label}");
    }

    terms.sort();
    terms.truncate(NAME_TERMS);
    terms
        .iter()
        .map(|t| title_case(t))
        .collect::<Vec<_>>()
        .join("_")
}

/// Highest-frequency unigrams and bigrams after stop-word removal,
/// ties broken alphabetically
fn top_terms(text: &str, limit: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in &tokens {
        *counts.entry((*token).to_string()).or_insert(0) += 1;
    }
    for pair in tokens.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(term, _)| term).collect()
}

/// Up to `limit` salient lowercase words of at least `min_len`
/// characters, most frequent first
pub fn salient_words(text: &str, limit: usize, min_len: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for m in token_pattern().find_iter(&lowered) {
        let token = m.as_str();
        if token.len() >= min_len && !is_stop_word(token) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(term, _)| term.to_string()).collect()
}

/// Capitalize the first letter of each whitespace-separated word
fn title_case(term: &str) -> String {
    term.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
