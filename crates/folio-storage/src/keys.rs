//! Storage key constants.

/// Every key the client persists. Nothing else is written to storage.
pub struct StorageKeys;

impl StorageKeys {
    /// Short-lived bearer credential.
    pub const ACCESS_TOKEN: &'static str = "accessToken";

    /// Long-lived credential used to mint new access credentials.
    pub const REFRESH_TOKEN: &'static str = "refreshToken";

    /// Download-token cache (single JSON blob keyed by ebook id).
    pub const DOWNLOAD_TOKENS: &'static str = "downloadTokens";

    /// All keys, in a stable order.
    pub const ALL: [&'static str; 3] = [
        Self::ACCESS_TOKEN,
        Self::REFRESH_TOKEN,
        Self::DOWNLOAD_TOKENS,
    ];
}
