use serde::Deserialize;
use serde_json::json;

use crate::magasin::Item;
use crate::{ApiClient, Error};

/// One magasin as the boutique endpoint returns it, counts included.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagasinSummary {
    pub id: i64,
    pub name: String,
    pub emoji: String,
    pub position: i64,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub items_count: i64,
    #[serde(default)]
    pub shopping_count: i64,
}

#[derive(Debug, Deserialize)]
struct BoutiquePayload {
    id: i64,
    name: String,
    code: String,
    #[serde(default)]
    magasins: Vec<MagasinSummary>,
}

/// A boutique and its magasins, looked up by PIN code.
///
/// [`load`](Self::load) keeps failures in `error`; the mutating calls return
/// them to the caller and leave the mirror untouched on failure.
#[derive(Debug)]
pub struct BoutiqueState {
    client: ApiClient,
    pub id: i64,
    pub name: String,
    pub code: String,
    pub magasins: Vec<MagasinSummary>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl BoutiqueState {
    pub fn new(client: ApiClient, code: impl Into<String>) -> Self {
        Self {
            client,
            id: 0,
            name: String::new(),
            code: code.into(),
            magasins: Vec::new(),
            is_loading: true,
            error: None,
        }
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;
        let path = format!("/boutique/{}", self.code);
        match self.client.get_json::<BoutiquePayload>(&path).await {
            Ok(payload) => {
                self.id = payload.id;
                self.name = payload.name;
                self.code = payload.code;
                self.magasins = payload.magasins;
            }
            Err(e) => self.error = Some(e.message()),
        }
        self.is_loading = false;
    }

    pub async fn add_magasin(&mut self, name: &str, emoji: &str) -> Result<MagasinSummary, Error> {
        let magasin: MagasinSummary = self
            .client
            .post_json(
                &format!("/boutique/{}/magasins/add", self.code),
                &json!({ "name": name, "emoji": emoji }),
            )
            .await?;
        self.magasins.push(magasin.clone());
        Ok(magasin)
    }

    pub async fn remove_magasin(&mut self, magasin_id: i64) -> Result<(), Error> {
        self.client
            .delete_json::<serde_json::Value>(&format!(
                "/boutique/{}/magasins/{}",
                self.code, magasin_id
            ))
            .await?;
        self.magasins.retain(|m| m.id != magasin_id);
        Ok(())
    }

    /// Articles left to buy across every magasin.
    pub fn total_shopping_count(&self) -> i64 {
        self.magasins.iter().map(|m| m.shopping_count).sum()
    }
}
