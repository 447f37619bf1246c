//! Markup hooks for otodom.pl listing and detail pages.
//!
//! The class names are generated by the site's CSS-in-JS build and change
//! between site releases; this is the one place to update them.

use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("hardcoded selector is valid")
}

/// Page-number items of the results pagination control
pub static PAGINATION_ITEMS: LazyLock<Selector> = LazyLock::new(|| {
    css(r#"ul[data-cy="frontend.search.base-pagination.nexus-pagination"] li.css-43nhzf"#)
});

/// Detail-page anchors on a results page
pub static LISTING_LINKS: LazyLock<Selector> =
    LazyLock::new(|| css(r#"a[data-cy="listing-item-link"]"#));

/// "Show this area in Google Maps" anchor; queried through the browser, so kept as text
pub const MAPS_LINK: &str =
    r#"a[title*="Pokaż ten obszar w Mapach Google (otwiera się w nowym oknie)"]"#;

/// `ll=<lat>,<lon>` in the maps link
pub static COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ll=([0-9.\-]+),([0-9.\-]+)").expect("hardcoded regex pattern is valid")
});

/// Static field name paired with the element holding its value, in storage order
pub static STATIC_FIELDS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    vec![
        ("Price", css(r#"strong[data-cy="adPageHeaderPrice"]"#)),
        (
            "Price per sqm",
            css(r#"div.css-8pg163.e1k1vyr24 div[aria-label="Cena za metr kwadratowy"]"#),
        ),
        (
            "Area",
            css("div.css-58w8b7.eezlw8k0 button:nth-of-type(1) div.css-1ftqasz"),
        ),
        (
            "Rooms count",
            css("div.css-58w8b7.eezlw8k0 button:nth-of-type(2) div.css-1ftqasz"),
        ),
        ("Address", css("div.css-70qvj9.e42rcgs0 a.css-1jjm9oe.e42rcgs1")),
        (
            "Real estate office name",
            css(r#"strong[aria-label="Nazwa agencji"].css-15tvki.ee7h84b0"#),
        ),
        ("Date", css("p.e1gioeue5.css-xydenf")),
    ]
});

/// One row of the details table
pub static DETAIL_ROWS: LazyLock<Selector> = LazyLock::new(|| css("div.css-t7cajz.e15n0fyo1"));

/// Cells of a details row: the first is the label, the second the value
pub static DETAIL_CELLS: LazyLock<Selector> = LazyLock::new(|| css("p.e15n0fyo2"));

/// Tag chips inside a value cell
pub static DETAIL_TAGS: LazyLock<Selector> = LazyLock::new(|| css("span.css-axw7ok.e15n0fyo4"));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StaticFields;

    #[test]
    fn all_selectors_compile() {
        LazyLock::force(&PAGINATION_ITEMS);
        LazyLock::force(&LISTING_LINKS);
        LazyLock::force(&COORDINATES);
        LazyLock::force(&DETAIL_ROWS);
        LazyLock::force(&DETAIL_CELLS);
        LazyLock::force(&DETAIL_TAGS);
        css(MAPS_LINK);
    }

    #[test]
    fn static_field_names_match_record_schema() {
        let names: Vec<_> = STATIC_FIELDS.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, StaticFields::NAMES);
    }
}
