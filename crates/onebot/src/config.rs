use serde::{Deserialize, Deserializer, Serialize};

/// Configuration for a single OneBot source.
///
/// The host's configuration layer supplies whitelists as comma-separated ID
/// strings; they deserialize into vectors here. An empty list means no
/// restriction for that dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OnebotSourceConfig {
    /// Admin users allowed to run `/` commands.
    #[serde(deserialize_with = "id_list")]
    pub permission_users: Vec<String>,

    /// User whitelist for plain messages.
    #[serde(deserialize_with = "id_list")]
    pub users: Vec<String>,

    /// Group whitelist for plain messages.
    #[serde(deserialize_with = "id_list")]
    pub groups: Vec<String>,
}

/// Accept either a comma-separated string (`"1,2,3"`) or a plain list.
fn id_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdList {
        Text(String),
        List(Vec<String>),
    }

    Ok(match IdList::deserialize(deserializer)? {
        IdList::Text(raw) => onebridge_channels::gating::split_id_list(&raw),
        IdList::List(entries) => entries,
    })
}
