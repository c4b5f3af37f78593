//! Offline export of a combined result set as delimited text.

use std::fs;
use std::io;
use std::path::Path;

use crate::data_models::Listing;

/// Fixed column order; consumers key on position, not header.
pub const CSV_COLUMNS: [&str; 9] = [
    "title",
    "price",
    "area",
    "bedrooms",
    "bathrooms",
    "description",
    "link",
    "image_url",
    "source",
];

/// Serialize listings as CSV with RFC-4180 quoting.
pub fn to_csv(listings: &[Listing]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_COLUMNS.join(","));
    out.push('\n');
    for listing in listings {
        let row = [
            listing.title.as_str(),
            listing.price.as_str(),
            listing.area.as_str(),
            listing.bedrooms.as_str(),
            listing.bathrooms.as_str(),
            listing.description.as_str(),
            listing.link.as_str(),
            listing.image_url.as_str(),
            listing.source.as_str(),
        ];
        let encoded: Vec<String> = row.iter().map(|field| csv_field(field)).collect();
        out.push_str(&encoded.join(","));
        out.push('\n');
    }
    out
}

pub fn write_csv(path: &Path, listings: &[Listing]) -> io::Result<()> {
    fs::write(path, to_csv(listings))
}

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
