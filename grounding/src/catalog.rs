//! Read-only item catalog: picks suggestion templates and backs the product
//! listing routes.

use std::{collections::HashMap, future::Future, path::Path, pin::Pin};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Display data of one catalog item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Price in the shop currency's minor unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Lookup of item display data by id.
pub trait ItemCatalog: Send + Sync {
    fn lookup_item<'a>(
        &'a self,
        item_id: i64,
    ) -> Pin<Box<dyn Future<Output = Option<ItemInfo>> + Send + 'a>>;
}

/// In-memory catalog, loaded from a JSON file or built directly.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    items: HashMap<i64, ItemInfo>,
}

#[derive(Deserialize)]
struct CatalogRow {
    id: i64,
    #[serde(flatten)]
    info: ItemInfo,
}

impl StaticCatalog {
    pub fn new(items: impl IntoIterator<Item = (i64, ItemInfo)>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Parses a JSON array of `{ "id", "name", "category"? }`.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let rows: Vec<CatalogRow> = serde_json::from_str(raw)?;
        Ok(Self::new(rows.into_iter().map(|r| (r.id, r.info))))
    }

    /// Loads the catalog file; a missing or broken file yields an empty
    /// catalog so suggestions fall back to the generic template.
    pub fn load_or_empty(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "catalog not readable; using empty catalog");
                return Self::default();
            }
        };
        match Self::from_json(&raw) {
            Ok(c) => {
                info!(path = %path.display(), items = c.items.len(), "catalog loaded");
                c
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "catalog is not valid JSON; using empty catalog");
                Self::default()
            }
        }
    }

    /// All items, ascending by id.
    pub fn items(&self) -> Vec<(i64, &ItemInfo)> {
        let mut out: Vec<_> = self.items.iter().map(|(id, info)| (*id, info)).collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    pub fn get(&self, item_id: i64) -> Option<&ItemInfo> {
        self.items.get(&item_id)
    }
}

impl ItemCatalog for StaticCatalog {
    fn lookup_item<'a>(
        &'a self,
        item_id: i64,
    ) -> Pin<Box<dyn Future<Output = Option<ItemInfo>> + Send + 'a>> {
        Box::pin(async move { self.get(item_id).cloned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_rows_and_looks_up() {
        let c = StaticCatalog::from_json(
            r#"[{"id":2,"name":"쌀국수","price":3900},{"id":1,"name":"구스 이불","category":"침구"}]"#,
        )
        .unwrap();
        let ids: Vec<i64> = c.items().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(c.get(2).unwrap().price, Some(3900));
        let item = c.lookup_item(1).await.unwrap();
        assert_eq!(item.name, "구스 이불");
        assert_eq!(item.category.as_deref(), Some("침구"));
        assert!(c.lookup_item(2).await.unwrap().category.is_none());
        assert!(c.lookup_item(3).await.is_none());
    }

    #[test]
    fn missing_file_is_empty() {
        let c = StaticCatalog::load_or_empty(Path::new("/definitely/not/here.json"));
        assert!(c.items().is_empty());
    }
}
