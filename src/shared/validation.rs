use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating provider names on the provider-file cache
    /// Must be lowercase alphanumeric with hyphens
    /// - Valid: "openai", "google-gemini", "p1"
    /// - Invalid: "-openai", "openai-", "Open-AI", "open_ai"
    pub static ref PROVIDER_NAME_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    /// Regex for validating public share identifiers
    /// 32 lowercase hex characters (a simple UUID without hyphens)
    pub static ref SHARE_ID_REGEX: Regex = Regex::new(r"^[0-9a-f]{32}$").unwrap();
}
