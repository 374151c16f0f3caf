use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{ApiClient, Error};

/// One inventory item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub ideal_quantity: i64,
    pub current_quantity: i64,
    pub magasin_id: i64,
}

impl Item {
    pub fn needs_shopping(&self) -> bool {
        self.current_quantity < self.ideal_quantity
    }
}

/// An item below its ideal level, with the missing amount.
#[derive(Debug, Clone)]
pub struct ShoppingEntry {
    pub item: Item,
    pub to_buy: i64,
}

/// Partial update for an item; unset fields keep their stored value.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideal_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MagasinPayload {
    magasin: MagasinHeader,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct MagasinHeader {
    id: i64,
    name: String,
    emoji: String,
}

/// One magasin with its items, plus the derived inventory and shopping views.
#[derive(Debug)]
pub struct MagasinState {
    client: ApiClient,
    code: String,
    pub id: i64,
    pub name: String,
    pub emoji: String,
    pub items: Vec<Item>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl MagasinState {
    pub fn new(client: ApiClient, code: impl Into<String>, magasin_id: i64) -> Self {
        Self {
            client,
            code: code.into(),
            id: magasin_id,
            name: String::new(),
            emoji: "🛒".into(),
            items: Vec::new(),
            is_loading: true,
            error: None,
        }
    }

    fn base(&self) -> String {
        format!("/boutique/{}/magasins/{}", self.code, self.id)
    }

    fn replace(&mut self, item: Item) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == item.id) {
            *slot = item;
        }
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;
        let path = format!("{}/items", self.base());
        match self.client.get_json::<MagasinPayload>(&path).await {
            Ok(payload) => {
                self.id = payload.magasin.id;
                self.name = payload.magasin.name;
                self.emoji = payload.magasin.emoji;
                self.items = payload.items;
            }
            Err(e) => self.error = Some(e.message()),
        }
        self.is_loading = false;
    }

    pub async fn add_item(&mut self, name: &str, ideal_quantity: i64) -> Result<Item, Error> {
        let item: Item = self
            .client
            .post_json(
                &format!("{}/items/add", self.base()),
                &json!({ "name": name, "idealQuantity": ideal_quantity }),
            )
            .await?;
        self.items.push(item.clone());
        Ok(item)
    }

    pub async fn update_item(&mut self, item_id: i64, update: &ItemUpdate) -> Result<Item, Error> {
        let item: Item = self
            .client
            .put_json(&format!("{}/items/{}", self.base(), item_id), update)
            .await?;
        self.replace(item.clone());
        Ok(item)
    }

    pub async fn delete_item(&mut self, item_id: i64) -> Result<(), Error> {
        self.client
            .delete_json::<serde_json::Value>(&format!("{}/items/{}", self.base(), item_id))
            .await?;
        self.items.retain(|i| i.id != item_id);
        Ok(())
    }

    pub async fn consume(&mut self, item_id: i64, quantity: i64) -> Result<Item, Error> {
        let item: Item = self
            .client
            .post_json(
                &format!("{}/items/{}/consume", self.base(), item_id),
                &json!({ "quantity": quantity }),
            )
            .await?;
        self.replace(item.clone());
        Ok(item)
    }

    /// Restock to an explicit level, or back to the ideal when `quantity` is `None`.
    pub async fn restock(&mut self, item_id: i64, quantity: Option<i64>) -> Result<Item, Error> {
        let body = match quantity {
            Some(quantity) => json!({ "quantity": quantity }),
            None => json!({}),
        };
        let item: Item = self
            .client
            .post_json(&format!("{}/items/{}/restock", self.base(), item_id), &body)
            .await?;
        self.replace(item.clone());
        Ok(item)
    }

    /// Buying an article brings it back to its ideal level.
    pub async fn mark_as_purchased(&mut self, item_id: i64) -> Result<Item, Error> {
        self.restock(item_id, None).await
    }

    /// Items below their ideal level, with how many to buy.
    pub fn shopping_list(&self) -> Vec<ShoppingEntry> {
        self.items
            .iter()
            .filter(|item| item.needs_shopping())
            .map(|item| ShoppingEntry {
                to_buy: item.ideal_quantity - item.current_quantity,
                item: item.clone(),
            })
            .collect()
    }

    /// Every item, sorted by name regardless of case.
    pub fn inventory(&self) -> Vec<Item> {
        let mut items = self.items.clone();
        items.sort_by_key(|item| item.name.to_lowercase());
        items
    }
}
