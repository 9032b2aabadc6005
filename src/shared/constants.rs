/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// CHAT DEFAULTS
// =============================================================================

/// Title given to auto-created chats
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Model selected for auto-created chats
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

// =============================================================================
// ARTIFACTS
// =============================================================================

/// Language tags whose artifacts can be rendered as a live preview.
/// Matched case-insensitively at artifact creation; the derived flag is
/// stored and never recomputed.
pub const PREVIEWABLE_LANGUAGES: &[&str] = &["html", "markdown", "md", "svg", "mermaid", "jsx", "tsx"];

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - may run maintenance mutations such as the provider-file sweep
pub const ROLE_ADMIN: &str = "admin";
