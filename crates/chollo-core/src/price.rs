//! Free-text price normalization.
//!
//! Submitted and scraped prices arrive as strings in mixed conventions:
//! Argentine `8.000,50`, US `8,000.50`, bare `12,5`, with or without
//! currency symbols and words. The separator roles are disambiguated from
//! punctuation counts alone.

use rust_decimal::Decimal;

const CURRENCY_SYMBOLS: [char; 3] = ['$', '€', '£'];
const CURRENCY_WORDS: [&str; 5] = ["USD", "ARS", "precio", "price", "valor"];

/// Parse a price-like string into a non-negative amount.
///
/// Disambiguation, in priority order:
/// 1. more than one `.` → dots are thousands separators, removed;
/// 2. more than one `,` → commas are thousands separators, removed;
/// 3. one of each → the later one is the decimal separator (normalized to
///    `.`), the earlier one removed;
/// 4. a single `.` → decimal when followed by 1–2 digits, thousands when
///    followed by exactly 3;
/// 5. a single `,` → decimal separator, normalized to `.`.
///
/// Anything unparseable yields `0`; submissions degrade to a zero price
/// instead of failing.
#[must_use]
pub fn parse_price(raw: &str) -> Decimal {
    let mut clean = strip_currency(raw);
    if clean.is_empty() {
        return Decimal::ZERO;
    }

    let dots = clean.matches('.').count();
    let commas = clean.matches(',').count();

    if dots > 1 {
        clean.retain(|c| c != '.');
    } else if commas > 1 {
        clean.retain(|c| c != ',');
    } else if dots == 1 && commas == 1 {
        // Both present: the one appearing later is the decimal separator.
        let dot_pos = clean.rfind('.').unwrap_or(0);
        let comma_pos = clean.rfind(',').unwrap_or(0);
        if dot_pos > comma_pos {
            clean.retain(|c| c != ',');
        } else {
            clean.retain(|c| c != '.');
            clean = clean.replace(',', ".");
        }
    } else if dots == 1 {
        let frac_digits = clean
            .split_once('.')
            .map_or(0, |(_, frac)| leading_digit_run(frac));
        if frac_digits == 3 {
            clean = clean.replacen('.', "", 1);
        }
        // 1–2 digits: already a decimal; anything else: leave untouched.
    } else if commas == 1 {
        clean = clean.replace(',', ".");
    }

    clean.retain(|c| c.is_ascii_digit() || c == '.');
    normalize_fragment(&mut clean);

    clean.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

fn strip_currency(raw: &str) -> String {
    let mut out = raw.to_string();
    for sym in CURRENCY_SYMBOLS {
        out = out.replace(sym, "");
    }
    for word in CURRENCY_WORDS {
        out = remove_word_case_insensitive(&out, word);
    }
    out.trim().to_string()
}

/// Remove whole-word, case-insensitive occurrences of `word`.
///
/// The currency words are all ASCII, so the comparison is ASCII-insensitive
/// over a byte window of the original text; non-ASCII input never matches
/// and is copied through untouched.
fn remove_word_case_insensitive(text: &str, word: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        // `get` is None on a non-boundary or short window, which cannot match.
        if let Some(window) = rest.get(..word.len()) {
            if window.eq_ignore_ascii_case(word) {
                let before_ok = !out.chars().next_back().is_some_and(char::is_alphanumeric);
                let after_ok = !rest[word.len()..]
                    .chars()
                    .next()
                    .is_some_and(char::is_alphanumeric);
                if before_ok && after_ok {
                    rest = &rest[word.len()..];
                    continue;
                }
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

fn leading_digit_run(s: &str) -> usize {
    s.chars().take_while(char::is_ascii_digit).count()
}

/// Make a digit/dot fragment parseable: trim a trailing separator and give a
/// bare leading `.` its zero.
fn normalize_fragment(clean: &mut String) {
    while clean.ends_with('.') {
        clean.pop();
    }
    if clean.starts_with('.') {
        clean.insert(0, '0');
    }
}
