//! Text parsing helpers for source-native listing fields.
//!
//! The sources format everything as display text ("S/ 1,200", "3 dorms.",
//! "85 m²"), so every numeric view of a listing goes through these.

use crate::data_models::Currency;

/// Turn a zone name into the slug the sources use in their URL paths:
/// lower-cased, Spanish accents folded, whitespace collapsed to `-`,
/// everything outside `[a-z0-9-]` dropped.
pub fn slugify_zone(zone: &str) -> String {
    let mut slug = String::with_capacity(zone.len());
    let mut last_was_dash = true; // suppress leading dashes
    for c in zone.trim().to_lowercase().chars() {
        let c = match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        };
        if c.is_whitespace() {
            if !last_was_dash {
                slug.push('-');
                last_was_dash = true;
            }
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            slug.push(c);
            last_was_dash = c == '-';
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Parse raw price text into (currency marker, integer amount).
///
/// "S/" anywhere marks soles, "$" marks dollars; the amount is every digit
/// in the string concatenated. Either side may be missing.
pub fn parse_price(raw: &str) -> (Option<Currency>, Option<i64>) {
    if raw.trim().is_empty() {
        return (None, None);
    }
    let currency = if raw.contains("S/") {
        Some(Currency::Soles)
    } else if raw.contains('$') {
        Some(Currency::Usd)
    } else {
        None
    };
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    // 18 digits is already beyond any real rent; treat longer runs as garbage
    let amount = if digits.is_empty() || digits.len() > 18 {
        None
    } else {
        digits.parse::<i64>().ok()
    };
    (currency, amount)
}

/// The amount from [`parse_price`], but only when the marker says soles.
pub fn price_in_soles(raw: &str) -> Option<i64> {
    match parse_price(raw) {
        (Some(Currency::Soles), Some(amount)) => Some(amount),
        _ => None,
    }
}

/// First run of digits in the text, as an integer.
pub fn extract_int(s: &str) -> Option<i64> {
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            break;
        }
    }
    if digits.is_empty() || digits.len() > 18 {
        None
    } else {
        digits.parse().ok()
    }
}

/// Area in square meters: 1-4 digits directly before an "m2"/"m²" marker
/// (optional whitespace in between), case-insensitive.
pub fn extract_m2(s: &str) -> Option<i64> {
    let chars: Vec<char> = s.to_lowercase().chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let is_marker = chars[i] == 'm'
            && i + 1 < chars.len()
            && (chars[i + 1] == '2' || chars[i + 1] == '²');
        if is_marker {
            // walk back over whitespace, then collect up to 4 digits
            let mut j = i;
            while j > 0 && chars[j - 1].is_whitespace() {
                j -= 1;
            }
            let end = j;
            let mut start = j;
            while start > 0 && chars[start - 1].is_ascii_digit() && end - start < 4 {
                start -= 1;
            }
            if start < end {
                let digits: String = chars[start..end].iter().collect();
                if let Ok(v) = digits.parse() {
                    return Some(v);
                }
            }
        }
        i += 1;
    }
    None
}

/// Request-side count filter: empty or "0" means unconstrained, anything
/// unparseable is ignored the same way.
pub fn requested_count(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return None;
    }
    trimmed.parse().ok()
}

/// Collapse internal whitespace runs to single spaces and trim, the way the
/// sources' text nodes are flattened for display.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters (not bytes), preserving char
/// boundaries in accent-heavy source text.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[test]
fn test_slugify_zone() {
    assert_eq!(slugify_zone("Miraflores"), "miraflores");
    assert_eq!(slugify_zone("San Isidro"), "san-isidro");
    assert_eq!(slugify_zone("  Jesús María  "), "jesus-maria");
    assert_eq!(slugify_zone("Breña!"), "brena");
    assert_eq!(slugify_zone("santiago de   surco"), "santiago-de-surco");
    assert_eq!(slugify_zone(""), "");
}

#[test]
fn test_parse_price() {
    assert_eq!(parse_price("S/ 1,200"), (Some(Currency::Soles), Some(1200)));
    assert_eq!(parse_price("$ 900"), (Some(Currency::Usd), Some(900)));
    assert_eq!(parse_price("Alquiler S/2.500 al mes"), (Some(Currency::Soles), Some(2500)));
    assert_eq!(parse_price("Consultar"), (None, None));
    assert_eq!(parse_price("1500"), (None, Some(1500)));
    assert_eq!(parse_price(""), (None, None));
}

#[test]
fn test_price_in_soles() {
    assert_eq!(price_in_soles("S/ 1,200"), Some(1200));
    assert_eq!(price_in_soles("$ 900"), None);
    assert_eq!(price_in_soles("900"), None);
}

#[test]
fn test_extract_int() {
    assert_eq!(extract_int("3 dormitorios"), Some(3));
    assert_eq!(extract_int("dorms: 2, baños: 1"), Some(2));
    assert_eq!(extract_int("sin datos"), None);
    assert_eq!(extract_int(""), None);
}

#[test]
fn test_extract_m2() {
    assert_eq!(extract_m2("85 m²"), Some(85));
    assert_eq!(extract_m2("120m2"), Some(120));
    assert_eq!(extract_m2("Área: 95 M2 techados"), Some(95));
    assert_eq!(extract_m2("metros: muchos"), None);
    assert_eq!(extract_m2("m2"), None);
}

#[test]
fn test_requested_count() {
    assert_eq!(requested_count("0"), None);
    assert_eq!(requested_count(""), None);
    assert_eq!(requested_count("  3 "), Some(3));
    assert_eq!(requested_count("dos"), None);
}

#[test]
fn test_truncate_chars() {
    assert_eq!(truncate_chars("áéíóú", 3), "áéí");
    assert_eq!(truncate_chars("corto", 140), "corto");
}
