// Runtime configuration
// Built once at process start; components receive it by parameter and
// never read the environment themselves.

use std::env;

/// Maximum rows Supabase returns for a single range read.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// URL segment under which all geographic listing pages live.
pub const CATEGORY_ROOT: &str = "dumpster-rental";

/// Public origin used when `SITE_ORIGIN` is not set.
pub const DEFAULT_SITE_ORIGIN: &str = "https://www.rolloffdirectory.com";

/// Credentials for the hosted Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://abcdefgh.supabase.co`
    pub url: String,
    /// Anonymous (public) API key
    pub anon_key: String,
}

/// Application configuration shared by the CLI and the server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Absolute origin all emitted URLs live under (no trailing slash)
    pub site_origin: String,
    /// Supabase credentials; `None` when the environment is incomplete.
    /// Components that need the store surface the error per request.
    pub supabase: Option<SupabaseConfig>,
    /// Rows requested per catalog page read
    pub page_size: usize,
}

impl AppConfig {
    /// Build a configuration with a normalized origin and a sane page size.
    pub fn new(
        site_origin: impl Into<String>,
        supabase: Option<SupabaseConfig>,
        page_size: usize,
    ) -> Self {
        let site_origin = site_origin.into().trim_end_matches('/').to_string();

        AppConfig {
            site_origin,
            supabase,
            page_size: page_size.max(1),
        }
    }

    /// Read configuration from the environment.
    ///
    /// `SITE_ORIGIN` falls back to the production origin. Supabase
    /// credentials require both `SUPABASE_URL` and `SUPABASE_ANON_KEY`;
    /// anything less leaves `supabase` unset.
    pub fn from_env() -> Self {
        let site_origin =
            env::var("SITE_ORIGIN").unwrap_or_else(|_| DEFAULT_SITE_ORIGIN.to_string());

        let supabase = match (env::var("SUPABASE_URL"), env::var("SUPABASE_ANON_KEY")) {
            (Ok(url), Ok(anon_key)) if !url.is_empty() && !anon_key.is_empty() => {
                Some(SupabaseConfig { url, anon_key })
            }
            _ => None,
        };

        let page_size = env::var("CATALOG_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self::new(site_origin, supabase, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_normalized() {
        let config = AppConfig::new("https://example.com/", None, 100);
        assert_eq!(config.site_origin, "https://example.com");

        let config = AppConfig::new("https://example.com", None, 100);
        assert_eq!(config.site_origin, "https://example.com");
    }

    #[test]
    fn test_page_size_has_floor() {
        let config = AppConfig::new("https://example.com", None, 0);
        assert_eq!(config.page_size, 1);

        let config = AppConfig::new("https://example.com", None, 500);
        assert_eq!(config.page_size, 500);
    }

    #[test]
    fn test_missing_credentials_are_allowed() {
        let config = AppConfig::new("https://example.com", None, DEFAULT_PAGE_SIZE);
        assert!(config.supabase.is_none());
    }
}
