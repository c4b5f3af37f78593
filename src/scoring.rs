//! Desirability scoring and the single-featured-per-page selection.

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::data_models::Listing;

static AMENITY_VOCAB: OnceLock<HashSet<&'static str>> = OnceLock::new();

/// Fixed amenity vocabulary, Spanish terms plus the English forms the
/// sources' keyword parameters map to.
fn amenity_vocab() -> &'static HashSet<&'static str> {
    AMENITY_VOCAB.get_or_init(|| {
        HashSet::from([
            "piscina",
            "pool",
            "mascotas",
            "pets",
            "cochera",
            "estacionamiento",
            "parking",
            "terraza",
            "terrace",
            "balcon",
            "balcón",
            "balcony",
            "ascensor",
            "lift",
            "elevator",
            "gimnasio",
            "gym",
            "amoblado",
            "amueblado",
            "furnished",
            "jardin",
            "jardín",
            "garden",
            "bodega",
            "storage",
        ])
    })
}

/// Heuristic desirability score:
/// +1 per amenity keyword found in title+description,
/// an inverse-price bonus rewarding cheaper soles-priced listings,
/// and a capped area bonus rewarding larger floor plans.
pub fn feature_score(listing: &Listing) -> f64 {
    let haystack = format!("{} {}", listing.title, listing.description).to_lowercase();
    let amenity_hits = amenity_vocab()
        .iter()
        .filter(|word| haystack.contains(*word))
        .count() as f64;

    let price_bonus = listing
        .price_soles()
        .map(|p| 3000.0 / p.max(1) as f64)
        .unwrap_or(0.0);

    let area_bonus = listing
        .area_m2()
        .map(|a| a.min(120) as f64 / 400.0)
        .unwrap_or(0.0);

    amenity_hits + price_bonus + area_bonus
}

/// Flag exactly one listing in the slice as featured: the highest scorer,
/// first occurrence winning ties (strictly-greater scan). Everything else
/// is explicitly reset to false.
pub fn mark_featured(page: &mut [Listing]) {
    for listing in page.iter_mut() {
        listing.is_featured = false;
    }
    let mut best: Option<(usize, f64)> = None;
    for (idx, listing) in page.iter().enumerate() {
        let score = feature_score(listing);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    if let Some((idx, _)) = best {
        page[idx].is_featured = true;
    }
}

/// Top `n` listings by score across a pool, all flagged featured.
/// The sort is stable, so equal scores keep their pool order.
pub fn top_by_score(pool: &[Listing], n: usize) -> Vec<Listing> {
    let scores: Vec<f64> = pool.iter().map(feature_score).collect();
    let mut indices: Vec<usize> = (0..pool.len()).collect();
    indices.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
        .into_iter()
        .take(n)
        .map(|idx| {
            let mut listing = pool[idx].clone();
            listing.is_featured = true;
            listing
        })
        .collect()
}
