//! Post-merge normalization and the strict re-application of filters some
//! sources cannot push down server-side.

use crate::data_models::{Listing, SearchQuery};

// Bounds substituted when only one side of the price range is given.
const PRICE_FLOOR: i64 = -1_000_000_000_000;
const PRICE_CEIL: i64 = 1_000_000_000_000;

/// Coerce every text field to trimmed text; null-ish markers collapse to "".
pub fn normalize_listing(listing: &mut Listing) {
    for field in [
        &mut listing.title,
        &mut listing.price,
        &mut listing.area,
        &mut listing.bedrooms,
        &mut listing.bathrooms,
        &mut listing.description,
        &mut listing.link,
        &mut listing.image_url,
    ] {
        let trimmed = field.trim();
        *field = if trimmed == "None" || trimmed == "null" {
            String::new()
        } else {
            trimmed.to_string()
        };
    }
}

/// Re-apply bedroom/bathroom/price constraints in-process.
///
/// Counts match exactly (no ranges) and only when the caller constrained
/// them. Price keeps a record only when its raw text parses as a
/// local-currency amount inside [min, max]. Records without a parseable
/// soles price are dropped whenever ANY bound is active, foreign-currency
/// listings included. That mirrors the sources' behavior; see the filter
/// tests before "fixing" it.
pub fn strict_filter(listings: Vec<Listing>, query: &SearchQuery) -> Vec<Listing> {
    let bedrooms_req = query.bedrooms_filter();
    let bathrooms_req = query.bathrooms_filter();
    let price_active = query.has_price_filter();
    let price_min = query.price_min.unwrap_or(PRICE_FLOOR);
    let price_max = query.price_max.unwrap_or(PRICE_CEIL);

    listings
        .into_iter()
        .filter(|listing| {
            if let Some(req) = bedrooms_req {
                match listing.bedrooms_count() {
                    Some(n) if n == req => {}
                    _ => return false,
                }
            }
            if let Some(req) = bathrooms_req {
                match listing.bathrooms_count() {
                    Some(n) if n == req => {}
                    _ => return false,
                }
            }
            if price_active {
                match listing.price_soles() {
                    Some(amount) if amount >= price_min && amount <= price_max => {}
                    _ => return false,
                }
            }
            true
        })
        .collect()
}

/// Conjunctive keyword match for sources that ignore keywords server-side:
/// every lower-cased token must appear somewhere in the record's
/// title+description+area+bedrooms+bathrooms text.
pub fn keyword_filter(listings: Vec<Listing>, keywords: &str) -> Vec<Listing> {
    let tokens: Vec<String> = keywords
        .to_lowercase()
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();
    if tokens.is_empty() {
        return listings;
    }
    listings
        .into_iter()
        .filter(|listing| {
            let haystack = format!(
                "{} {} {} {} {}",
                listing.title,
                listing.description,
                listing.area,
                listing.bedrooms,
                listing.bathrooms
            )
            .to_lowercase();
            tokens.iter().all(|token| haystack.contains(token.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str, price: &str) -> Listing {
        Listing::new(title.into(), price.into(), String::new(), String::new(), String::new())
    }

    #[test]
    fn normalize_collapses_null_markers() {
        let mut l = listing("  Depto  ", "None");
        l.description = " null ".into();
        normalize_listing(&mut l);
        assert_eq!(l.title, "Depto");
        assert_eq!(l.price, "");
        assert_eq!(l.description, "");
    }

    #[test]
    fn price_filter_keeps_soles_in_range() {
        let query = SearchQuery {
            price_min: Some(500),
            price_max: Some(1500),
            ..SearchQuery::default()
        };
        let kept = strict_filter(
            vec![listing("a", "S/ 1,200"), listing("b", "$ 900"), listing("c", "S/ 50")],
            &query,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "a");
    }

    #[test]
    fn min_only_bound_still_drops_foreign_currency() {
        // Source quirk, preserved on purpose: a dollar-priced listing is
        // excluded even though only a minimum was requested.
        let query = SearchQuery {
            price_min: Some(100),
            ..SearchQuery::default()
        };
        let kept = strict_filter(vec![listing("usd", "$ 2000"), listing("pen", "S/ 800")], &query);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "pen");
    }

    #[test]
    fn unbounded_query_keeps_unparseable_prices() {
        let kept = strict_filter(
            vec![listing("a", "Consultar"), listing("b", "$ 900")],
            &SearchQuery::default(),
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn bedroom_filter_requires_exact_parse() {
        let query = SearchQuery {
            bedrooms: "2".into(),
            ..SearchQuery::default()
        };
        let mut two = listing("two", "");
        two.bedrooms = "2 dormitorios".into();
        let mut three = listing("three", "");
        three.bedrooms = "3".into();
        let blank = listing("blank", "");
        let kept = strict_filter(vec![two, three, blank], &query);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "two");
    }

    #[test]
    fn keyword_filter_is_conjunctive() {
        let mut a = listing("Depto con piscina", "");
        a.description = "acepta mascotas".into();
        let b = listing("Depto con piscina", "");
        let kept = keyword_filter(vec![a, b], "piscina MASCOTAS");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].description, "acepta mascotas");
    }

    #[test]
    fn keyword_filter_searches_count_fields() {
        let mut l = listing("Depto", "");
        l.bedrooms = "3".into();
        assert_eq!(keyword_filter(vec![l], "3").len(), 1);
    }
}
