// Rolloff Directory - Core Library
// Shared by the sitemap CLI, the API server, and tests

pub mod catalog;
pub mod config;
pub mod leads;
pub mod sitemap;
pub mod supabase;

// Re-export commonly used types
pub use catalog::{fetch_all_pages, CatalogStore, CityRow, StateRow};
pub use config::{
    AppConfig, SupabaseConfig, CATEGORY_ROOT, DEFAULT_PAGE_SIZE, DEFAULT_SITE_ORIGIN,
};
pub use leads::{validate_lead, Lead, LeadStore, NewLead, ValidationError, LEAD_STATUS_NEW};
pub use sitemap::{
    build_sitemap_entries, city_sitemap_xml, ChangeFrequency, SitemapEntry, StaticRoute,
    STATIC_ROUTES,
};
pub use supabase::{StoreError, SupabaseRest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
