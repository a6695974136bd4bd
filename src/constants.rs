/// Source name constants shared by the CLI, configuration and normalizers

pub const SEDO_SOURCE: &str = "sedo";
pub const OPENSEA_SOURCE: &str = "opensea";
pub const GODADDY_SOURCE: &str = "godaddy";

/// Category assigned when a listing carries none
pub const UNCATEGORIZED: &str = "Uncategorized";

/// OpenSea trait whose value is used as the lead category
pub const OPENSEA_CATEGORY_TRAIT: &str = "Category";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_CHAT_CHANNEL: &str = "#leads";
pub const DEFAULT_CHAT_USERNAME: &str = "Lead Manager";

/// Get all supported source names, in default processing order
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![SEDO_SOURCE, OPENSEA_SOURCE, GODADDY_SOURCE]
}
