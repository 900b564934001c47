//! Account topology as reported by the database account endpoint.

use serde::{Deserialize, Serialize};
use url::Url;

/// One region of the account and the endpoint serving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRegion {
    /// Region name, e.g. "West US".
    pub name: String,
    /// Regional endpoint.
    pub database_account_endpoint: Url,
}

impl AccountRegion {
    pub fn new(name: impl Into<String>, database_account_endpoint: Url) -> Self {
        Self {
            name: name.into(),
            database_account_endpoint,
        }
    }
}

/// Regions the account currently exposes, in the account's own order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseAccount {
    /// Regions accepting writes. The first one is the write hub.
    #[serde(default)]
    pub writable_locations: Vec<AccountRegion>,

    /// Regions serving reads.
    #[serde(default)]
    pub readable_locations: Vec<AccountRegion>,

    /// Whether the account accepts writes in every writable region.
    #[serde(default)]
    pub enable_multiple_write_locations: bool,
}

impl DatabaseAccount {
    /// Load a topology document from JSON.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_account_document() {
        let json = r#"{
            "writableLocations": [
                {"name": "West US", "databaseAccountEndpoint": "https://acct-westus.example.net/"}
            ],
            "readableLocations": [
                {"name": "West US", "databaseAccountEndpoint": "https://acct-westus.example.net/"},
                {"name": "East US", "databaseAccountEndpoint": "https://acct-eastus.example.net/"}
            ],
            "enableMultipleWriteLocations": true
        }"#;

        let account = DatabaseAccount::from_json(json).unwrap();
        assert_eq!(account.writable_locations.len(), 1);
        assert_eq!(account.readable_locations[1].name, "East US");
        assert_eq!(
            account.readable_locations[1].database_account_endpoint.as_str(),
            "https://acct-eastus.example.net/"
        );
        assert!(account.enable_multiple_write_locations);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let account = DatabaseAccount::from_json("{}").unwrap();
        assert_eq!(account, DatabaseAccount::default());
    }
}
