//! Registry directory: TLD to RDAP base URL.
//!
//! The built-in table is plain data. Deployments extend or override it through
//! [`ResolveConfig::rdap_overrides`](crate::ResolveConfig) without touching the
//! resolver.

use std::collections::HashMap;

lazy_static::lazy_static! {
    /// Built-in RDAP endpoints. Every base URL ends in `/` and the domain is
    /// appended directly.
    static ref BUILTIN_RDAP_ENDPOINTS: HashMap<&'static str, &'static str> = HashMap::from([
        // Popular gTLDs
        ("com", "https://rdap.verisign.com/com/v1/domain/"),
        ("net", "https://rdap.verisign.com/net/v1/domain/"),
        ("org", "https://rdap.publicinterestregistry.org/rdap/domain/"),
        ("info", "https://rdap.identitydigital.services/rdap/domain/"),
        ("biz", "https://rdap.nic.biz/domain/"),
        // Google TLDs
        ("app", "https://pubapi.registry.google/rdap/domain/"),
        ("dev", "https://pubapi.registry.google/rdap/domain/"),
        ("page", "https://pubapi.registry.google/rdap/domain/"),
        // CentralNic
        ("xyz", "https://rdap.centralnic.com/xyz/domain/"),
        ("tech", "https://rdap.centralnic.com/tech/domain/"),
        ("online", "https://rdap.centralnic.com/online/domain/"),
        ("site", "https://rdap.centralnic.com/site/domain/"),
        ("website", "https://rdap.centralnic.com/website/domain/"),
        // Other gTLDs
        ("blog", "https://rdap.blog.fury.ca/rdap/domain/"),
        ("shop", "https://rdap.gmoregistry.net/rdap/domain/"),
        ("cloud", "https://rdap.registry.cloud/rdap/domain/"),
        // Identity Digital
        ("ai", "https://rdap.identitydigital.services/rdap/domain/"),
        ("io", "https://rdap.identitydigital.services/rdap/domain/"),
        ("me", "https://rdap.identitydigital.services/rdap/domain/"),
        ("zone", "https://rdap.identitydigital.services/rdap/domain/"),
        ("digital", "https://rdap.identitydigital.services/rdap/domain/"),
        // ccTLDs with working RDAP
        ("us", "https://rdap.nic.us/domain/"),
        ("uk", "https://rdap.nominet.uk/domain/"),
        ("de", "https://rdap.denic.de/domain/"),
        ("ca", "https://rdap.ca.fury.ca/rdap/domain/"),
        ("au", "https://rdap.cctld.au/rdap/domain/"),
        ("fr", "https://rdap.nic.fr/domain/"),
        ("nl", "https://rdap.sidn.nl/domain/"),
        ("br", "https://rdap.registro.br/domain/"),
        ("in", "https://rdap.nixiregistry.in/rdap/domain/"),
        ("tv", "https://rdap.nic.tv/domain/"),
        ("cc", "https://tld-rdap.verisign.com/cc/v1/domain/"),
        // co, eu, it, jp, es, cn: no working RDAP server, the generic proxy
        // and the WHOIS fallback handle them.
    ]);
}

/// TLD -> RDAP base URL lookup table.
#[derive(Debug, Clone)]
pub struct RegistryDirectory {
    endpoints: HashMap<String, String>,
}

impl RegistryDirectory {
    /// The built-in table only.
    pub fn builtin() -> Self {
        Self {
            endpoints: BUILTIN_RDAP_ENDPOINTS
                .iter()
                .map(|(tld, url)| (tld.to_string(), url.to_string()))
                .collect(),
        }
    }

    /// The built-in table with `overrides` merged on top.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut directory = Self::builtin();
        for (tld, url) in overrides {
            directory.insert(tld, url);
        }
        directory
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, tld: &str, base_url: &str) {
        self.endpoints.insert(
            tld.trim_start_matches('.').to_lowercase(),
            base_url.to_string(),
        );
    }

    /// RDAP base URL for a TLD, if listed.
    pub fn endpoint(&self, tld: &str) -> Option<&str> {
        self.endpoints.get(tld).map(String::as_str)
    }

    /// Full RDAP query URL for a domain, if its TLD is listed.
    pub fn domain_url(&self, domain: &str) -> Option<String> {
        let tld = extract_tld(domain)?;
        self.endpoint(&tld).map(|base| format!("{}{}", base, domain))
    }

    /// Every listed TLD, sorted.
    pub fn known_tlds(&self) -> Vec<String> {
        let mut tlds: Vec<String> = self.endpoints.keys().cloned().collect();
        tlds.sort();
        tlds
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Default for RegistryDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

/// All TLDs in the built-in directory, sorted alphabetically.
pub fn get_all_known_tlds() -> Vec<String> {
    RegistryDirectory::builtin().known_tlds()
}

/// The substring after the last dot, lowercased.
///
/// Returns `None` for names without a dot or with an empty last label.
pub fn extract_tld(domain: &str) -> Option<String> {
    let (_, tld) = domain.rsplit_once('.')?;
    if tld.is_empty() {
        None
    } else {
        Some(tld.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tld() {
        assert_eq!(extract_tld("example.com"), Some("com".to_string()));
        assert_eq!(extract_tld("sub.example.CO.UK"), Some("uk".to_string()));
        assert_eq!(extract_tld("invalid"), None);
        assert_eq!(extract_tld("trailing."), None);
        assert_eq!(extract_tld(""), None);
    }

    #[test]
    fn test_builtin_contains_common_tlds() {
        let directory = RegistryDirectory::builtin();
        assert!(directory.endpoint("com").unwrap().contains("verisign.com"));
        assert!(directory.endpoint("org").is_some());
        assert!(directory.endpoint("io").is_some());
        assert!(directory.endpoint("unknowntld123").is_none());
    }

    #[test]
    fn test_all_endpoints_are_valid_https_urls() {
        for (tld, endpoint) in BUILTIN_RDAP_ENDPOINTS.iter() {
            assert!(
                endpoint.starts_with("https://"),
                "Endpoint for '{}' must use HTTPS: {}",
                tld,
                endpoint
            );
            assert!(
                endpoint.ends_with("/domain/"),
                "Endpoint for '{}' must end with /domain/: {}",
                tld,
                endpoint
            );
        }
    }

    #[test]
    fn test_domain_url() {
        let directory = RegistryDirectory::builtin();
        assert_eq!(
            directory.domain_url("example.com").as_deref(),
            Some("https://rdap.verisign.com/com/v1/domain/example.com")
        );
        assert_eq!(directory.domain_url("example.co"), None);
        assert_eq!(directory.domain_url("localhost"), None);
    }

    #[test]
    fn test_overrides_extend_and_replace() {
        let overrides = HashMap::from([
            ("co".to_string(), "https://rdap.example/co/domain/".to_string()),
            (".COM".to_string(), "http://127.0.0.1:9/com/".to_string()),
        ]);
        let directory = RegistryDirectory::with_overrides(&overrides);

        assert_eq!(directory.endpoint("co"), Some("https://rdap.example/co/domain/"));
        assert_eq!(directory.endpoint("com"), Some("http://127.0.0.1:9/com/"));
        assert_eq!(directory.len(), RegistryDirectory::builtin().len() + 1);
    }

    #[test]
    fn test_get_all_known_tlds_sorted() {
        let tlds = get_all_known_tlds();
        assert!(tlds.len() >= 30);
        let mut sorted = tlds.clone();
        sorted.sort();
        assert_eq!(tlds, sorted);
    }
}
