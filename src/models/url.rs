use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortLink {
    pub id: String,
    #[serde(rename = "longURL")]
    pub long_url: String,
    #[serde(rename = "userID")]
    pub owner_id: String,
    pub created_at: i64,
}

/// Listing entry, keyed by short id in the response map
#[derive(Debug, Clone, Serialize)]
pub struct LinkView {
    #[serde(rename = "longURL")]
    pub long_url: String,
    #[serde(rename = "userID")]
    pub owner_id: String,
}

impl From<&ShortLink> for LinkView {
    fn from(link: &ShortLink) -> Self {
        Self {
            long_url: link.long_url.clone(),
            owner_id: link.owner_id.clone(),
        }
    }
}

/// Create/update form body
#[derive(Debug, Default, Deserialize)]
pub struct LinkForm {
    #[serde(rename = "longURL", default)]
    pub long_url: String,
}
