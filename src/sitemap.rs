// Sitemap assembly
// Merges the static route table with the fetched geographic catalog
// into the site's discoverability surface, in two output forms: a
// structured entry list for JSON consumers and a hand-built XML
// document conforming to the sitemap protocol.

use crate::catalog::{CityRow, StateRow};
use crate::config::CATEGORY_ROOT;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// Crawl metadata for generated geographic entries, descending by depth
const STATE_PRIORITY: f32 = 0.8;
const CITY_PRIORITY: f32 = 0.7;
const COST_PAGE_PRIORITY: f32 = 0.6;

/// Crawler hint on how often a URL is expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Weekly,
    Monthly,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
        }
    }
}

/// A fixed, build-time route of the site.
#[derive(Debug, Clone, Copy)]
pub struct StaticRoute {
    /// Path relative to the site origin, starting with `/`
    pub path: &'static str,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
}

/// Static pages, in the order they appear in the sitemap.
pub const STATIC_ROUTES: &[StaticRoute] = &[
    StaticRoute {
        path: "/",
        change_frequency: ChangeFrequency::Weekly,
        priority: 1.0,
    },
    StaticRoute {
        path: "/dumpster-rental",
        change_frequency: ChangeFrequency::Weekly,
        priority: 0.9,
    },
    StaticRoute {
        path: "/dumpster-sizes",
        change_frequency: ChangeFrequency::Monthly,
        priority: 0.8,
    },
    StaticRoute {
        path: "/roll-off-dumpster-prices",
        change_frequency: ChangeFrequency::Monthly,
        priority: 0.8,
    },
    StaticRoute {
        path: "/faq",
        change_frequency: ChangeFrequency::Monthly,
        priority: 0.6,
    },
    StaticRoute {
        path: "/contact",
        change_frequency: ChangeFrequency::Monthly,
        priority: 0.5,
    },
];

/// One sitemap record. Constructed fresh on every request, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: DateTime<Utc>,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
}

/// Assemble the structured sitemap: static pages first in table order,
/// then one entry per state, then listing and cost pages per city in
/// fetch order. Every entry carries the same serve-time `last_modified`;
/// the catalog tracks no finer modification granularity.
///
/// Output URLs are unique: on a collision the first occurrence wins, so
/// a static route shadows a generated entry for the same URL.
pub fn build_sitemap_entries(
    origin: &str,
    now: DateTime<Utc>,
    states: &[StateRow],
    cities: &[CityRow],
) -> Vec<SitemapEntry> {
    let mut entries = Vec::with_capacity(STATIC_ROUTES.len() + states.len() + 2 * cities.len());
    let mut seen: HashSet<String> = HashSet::new();

    let mut push = |entries: &mut Vec<SitemapEntry>,
                    url: String,
                    change_frequency: ChangeFrequency,
                    priority: f32| {
        if seen.insert(url.clone()) {
            entries.push(SitemapEntry {
                url,
                last_modified: now,
                change_frequency,
                priority,
            });
        }
    };

    for route in STATIC_ROUTES {
        let url = format!("{origin}{}", route.path);
        push(&mut entries, url, route.change_frequency, route.priority);
    }

    for state in states {
        let url = format!("{origin}/{CATEGORY_ROOT}/{}", state.state_slug);
        push(&mut entries, url, ChangeFrequency::Weekly, STATE_PRIORITY);
    }

    for city in cities {
        let listing = format!(
            "{origin}/{CATEGORY_ROOT}/{}/{}",
            city.state_slug, city.city_slug
        );
        let cost = format!("{listing}/cost");
        push(&mut entries, listing, ChangeFrequency::Weekly, CITY_PRIORITY);
        push(&mut entries, cost, ChangeFrequency::Weekly, COST_PAGE_PRIORITY);
    }

    entries
}

/// Render the city listing pages as a sitemap protocol XML document.
///
/// Every `loc` is escaped before insertion; a slug such as `o'fallon`
/// must not produce malformed XML.
pub fn city_sitemap_xml(origin: &str, date: NaiveDate, cities: &[CityRow]) -> String {
    let lastmod = date.format("%Y-%m-%d").to_string();
    let mut xml = String::with_capacity(256 + 220 * cities.len());

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");

    for city in cities {
        let loc = format!(
            "{origin}/{CATEGORY_ROOT}/{}/{}",
            city.state_slug, city.city_slug
        );

        xml.push_str("  <url>\n    <loc>");
        xml.push_str(&escape_xml(&loc));
        xml.push_str("</loc>\n    <lastmod>");
        xml.push_str(&lastmod);
        xml.push_str("</lastmod>\n    <changefreq>weekly</changefreq>\n");
        xml.push_str("    <priority>0.7</priority>\n  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> Cow<'_, str> {
    // Fast path: most slugs need no escaping
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(state_slug: &str, city_slug: &str) -> CityRow {
        CityRow {
            state_slug: state_slug.to_string(),
            city_slug: city_slug.to_string(),
        }
    }

    fn state(state_slug: &str) -> StateRow {
        StateRow {
            state_slug: state_slug.to_string(),
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("hello"), "hello");
        assert_eq!(escape_xml("<test>"), "&lt;test&gt;");
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml(r#"say "hi""#), "say &quot;hi&quot;");
        assert_eq!(escape_xml("o'fallon"), "o&apos;fallon");
    }

    #[test]
    fn test_entry_count_matches_inputs() {
        let states = vec![state("california"), state("texas")];
        let cities = vec![
            city("california", "los-angeles"),
            city("california", "san-diego"),
            city("texas", "houston"),
        ];

        let entries =
            build_sitemap_entries("https://example.com", Utc::now(), &states, &cities);

        assert_eq!(
            entries.len(),
            STATIC_ROUTES.len() + states.len() + 2 * cities.len()
        );
    }

    #[test]
    fn test_static_routes_come_first_in_table_order() {
        let entries = build_sitemap_entries("https://example.com", Utc::now(), &[], &[]);

        assert_eq!(entries.len(), STATIC_ROUTES.len());
        for (entry, route) in entries.iter().zip(STATIC_ROUTES) {
            assert_eq!(entry.url, format!("https://example.com{}", route.path));
            assert_eq!(entry.change_frequency, route.change_frequency);
        }
    }

    #[test]
    fn test_city_entries_include_listing_and_cost_pages() {
        let states = vec![state("california")];
        let cities = vec![city("california", "los-angeles")];

        let entries =
            build_sitemap_entries("https://example.com", Utc::now(), &states, &cities);
        let urls: Vec<&str> = entries.iter().map(|e| e.url.as_str()).collect();

        assert!(urls.contains(&"https://example.com/dumpster-rental/california"));
        assert!(urls.contains(&"https://example.com/dumpster-rental/california/los-angeles"));
        assert!(urls.contains(&"https://example.com/dumpster-rental/california/los-angeles/cost"));
    }

    #[test]
    fn test_every_url_is_unique_and_absolute() {
        let states = vec![state("california"), state("california")];
        let cities = vec![
            city("california", "los-angeles"),
            city("california", "los-angeles"),
        ];

        let entries =
            build_sitemap_entries("https://example.com", Utc::now(), &states, &cities);

        let mut seen = HashSet::new();
        for entry in &entries {
            assert!(entry.url.starts_with("https://example.com/"), "{}", entry.url);
            assert!(seen.insert(entry.url.clone()), "duplicate {}", entry.url);
        }
    }

    #[test]
    fn test_colliding_urls_keep_the_first_occurrence() {
        // A state whose listing URL equals a city listing URL: the state
        // entry is assembled first and wins; the city entry is dropped
        let states = vec![state("texas/houston")];
        let cities = vec![city("texas", "houston")];

        let entries =
            build_sitemap_entries("https://example.com", Utc::now(), &states, &cities);

        let colliding_url = "https://example.com/dumpster-rental/texas/houston";
        let matches: Vec<&SitemapEntry> =
            entries.iter().filter(|e| e.url == colliding_url).collect();

        assert_eq!(matches.len(), 1);
        assert!((matches[0].priority - STATE_PRIORITY).abs() < f32::EPSILON);
    }

    #[test]
    fn test_all_entries_share_the_serve_time() {
        let now = Utc::now();
        let entries = build_sitemap_entries(
            "https://example.com",
            now,
            &[state("california")],
            &[city("california", "los-angeles")],
        );

        assert!(entries.iter().all(|e| e.last_modified == now));
    }

    #[test]
    fn test_change_frequency_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChangeFrequency::Weekly).unwrap(),
            r#""weekly""#
        );
        assert_eq!(ChangeFrequency::Monthly.as_str(), "monthly");
    }

    #[test]
    fn test_xml_sitemap_empty() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let xml = city_sitemap_xml("https://example.com", date, &[]);

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#)));
        assert!(xml.trim_end().ends_with("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_xml_sitemap_entry_fields() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let cities = vec![city("california", "los-angeles")];
        let xml = city_sitemap_xml("https://example.com", date, &cities);

        assert!(
            xml.contains("<loc>https://example.com/dumpster-rental/california/los-angeles</loc>")
        );
        assert!(xml.contains("<lastmod>2025-06-01</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<priority>0.7</priority>"));
        assert_eq!(xml.matches("<url>").count(), 1);
    }

    #[test]
    fn test_xml_sitemap_escapes_reserved_characters() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let cities = vec![city("missouri", "o'fallon")];
        let xml = city_sitemap_xml("https://example.com", date, &cities);

        assert!(xml.contains("<loc>https://example.com/dumpster-rental/missouri/o&apos;fallon</loc>"));
        assert!(!xml.contains("o'fallon"));
    }

    #[test]
    fn test_xml_sitemap_lists_cities_in_fetch_order() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let cities = vec![
            city("texas", "houston"),
            city("california", "los-angeles"),
        ];
        let xml = city_sitemap_xml("https://example.com", date, &cities);

        let houston = xml.find("texas/houston").unwrap();
        let los_angeles = xml.find("california/los-angeles").unwrap();
        assert!(houston < los_angeles);
        assert_eq!(xml.matches("<url>").count(), 2);
        assert_eq!(xml.matches("</url>").count(), 2);
    }
}
