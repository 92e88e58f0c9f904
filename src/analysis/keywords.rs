//! Keyword extraction from article titles (English and Russian).

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Default number of keywords per cluster.
pub const DEFAULT_MAX_KEYWORDS: usize = 5;

/// Tokens of this many characters or fewer are discarded.
const MIN_TOKEN_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    // English function words
    "about", "above", "after", "again", "against", "among", "been", "before", "being", "below",
    "between", "both", "but", "does", "doing", "down", "during", "each", "from", "further",
    "have", "having", "here", "into", "more", "most", "other", "over", "same", "should", "some",
    "such", "than", "that", "their", "them", "then", "there", "these", "they", "this", "those",
    "through", "under", "until", "upon", "very", "versus", "what", "when", "where", "which",
    "while", "whom", "with", "within", "without", "would", "your",
    // English generic research terms
    "study", "studies", "analysis", "analyses", "result", "results", "research", "review",
    "approach", "approaches", "method", "methods", "using", "based", "case", "effect",
    "effects", "evaluation", "investigation", "novel", "paper", "role", "towards", "toward",
    "use", "new", "data", "model", "models", "systematic", "comparative",
    // Russian function words
    "более", "будет", "было", "быть", "вместе", "весь", "внутри", "вокруг", "всех", "года",
    "даже", "если", "есть", "или", "как", "когда", "которая", "которые", "который", "между",
    "может", "него", "нельзя", "около", "очень", "перед", "после", "против", "среди", "также",
    "только", "через", "чтобы", "этих", "этой", "этом", "этот",
    // Russian generic research terms
    "анализ", "анализа", "исследование", "исследования", "изучение", "изучения", "результаты",
    "результатов", "оценка", "оценки", "влияние", "влияния", "метод", "методы", "методов",
    "подход", "обзор", "основе", "применение", "применения", "роль", "данные", "данных",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static STOP_WORD_SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOP_WORD_SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Whether a token is on the bilingual stop-word list.
pub fn is_stop_word(token: &str) -> bool {
    stop_words().contains(token)
}

/// Lowercased title words with punctuation removed, minus short and stop words.
pub fn tokenize(title: &str) -> Vec<String> {
    title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS && !is_stop_word(token))
        .collect()
}

/// Most frequent title tokens, ties broken by first appearance.
pub fn extract_keywords<S: AsRef<str>>(titles: &[S], max_keywords: usize) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for title in titles {
        for token in tokenize(title.as_ref()) {
            let count = counts.entry(token.clone()).or_insert(0);
            if *count == 0 {
                order.push(token);
            }
            *count += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|token| {
            let count = counts[&token];
            (token, count)
        })
        .collect();
    // Stable sort keeps first-seen order among equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(max_keywords)
        .map(|(token, _)| token)
        .collect()
}
