//! Shared domain models.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Kind-specific descriptive data attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemKind {
    /// Plain merchandise with no extra fields.
    #[default]
    General,
    /// Offensive gear.
    Weapon {
        /// Damage dealt per hit.
        damage: u32,
    },
    /// Protective gear.
    Armor {
        /// Damage absorbed.
        defense: u32,
    },
    /// Consumables restoring health.
    Health {
        /// Health restored on use.
        health_amount: u32,
    },
}

impl ItemKind {
    /// Lower-case tag used on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            ItemKind::General => "general",
            ItemKind::Weapon { .. } => "weapon",
            ItemKind::Armor { .. } => "armor",
            ItemKind::Health { .. } => "health",
        }
    }

    /// Returns a user-facing label for the kind-specific field, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            ItemKind::General => None,
            ItemKind::Weapon { damage } => Some(format!("Damage: {damage}")),
            ItemKind::Armor { defense } => Some(format!("Defense: {defense}")),
            ItemKind::Health { health_amount } => Some(format!("Restores: {health_amount} HP")),
        }
    }
}

/// A salable catalog entry. The name is the catalog key and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord", into = "ItemRecord")]
pub struct Item {
    name: String,
    description: String,
    price: u64,
    quantity: u64,
    kind: ItemKind,
}

impl Item {
    /// Build a validated item. Negative prices or quantities are rejected.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: i64,
        quantity: i64,
    ) -> CatalogResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::validation("item name must not be empty"));
        }
        let price = non_negative("price", &name, price)?;
        let quantity = non_negative("quantity", &name, quantity)?;
        Ok(Self {
            name,
            description: description.into(),
            price,
            quantity,
            kind: ItemKind::General,
        })
    }

    /// An entry carrying only a quantity, used when stock is reinstated by name alone.
    pub fn bare(name: impl Into<String>, quantity: u64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price: 0,
            quantity,
            kind: ItemKind::General,
        }
    }

    /// Attach kind-specific data.
    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    /// Catalog key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description; empty for bare entries.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Unit price in whole currency units.
    pub fn price(&self) -> u64 {
        self.price
    }

    /// Units in stock.
    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Kind-specific data.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub(crate) fn add_quantity(&mut self, amount: u64) -> u64 {
        self.quantity = self.quantity.saturating_add(amount);
        self.quantity
    }

    pub(crate) fn take_quantity(&mut self, amount: u64) -> u64 {
        self.quantity = self.quantity.saturating_sub(amount);
        self.quantity
    }
}

/// Wire representation of an item inside a catalog document.
///
/// Integers are signed so that negative input reaches validation instead of
/// failing as an opaque parse error. Unknown fields are ignored.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defense: Option<i64>,
    #[serde(default, alias = "healthAmount", skip_serializing_if = "Option::is_none")]
    pub health_amount: Option<i64>,
}

impl ItemRecord {
    fn item_kind(&self) -> CatalogResult<ItemKind> {
        let tag = self.kind.as_deref().map(|value| value.trim().to_ascii_lowercase());
        let kind = match tag.as_deref() {
            Some("weapon") => ItemKind::Weapon {
                damage: self.field("damage", self.damage)?,
            },
            Some("armor") | Some("armour") => ItemKind::Armor {
                defense: self.field("defense", self.defense)?,
            },
            Some("health") => ItemKind::Health {
                health_amount: self.field("health_amount", self.health_amount)?,
            },
            Some(_) => ItemKind::General,
            // Untagged records still carry their extension field.
            None => {
                if self.damage.is_some() {
                    ItemKind::Weapon {
                        damage: self.field("damage", self.damage)?,
                    }
                } else if self.defense.is_some() {
                    ItemKind::Armor {
                        defense: self.field("defense", self.defense)?,
                    }
                } else if self.health_amount.is_some() {
                    ItemKind::Health {
                        health_amount: self.field("health_amount", self.health_amount)?,
                    }
                } else {
                    ItemKind::General
                }
            }
        };
        Ok(kind)
    }

    fn field(&self, field: &str, value: Option<i64>) -> CatalogResult<u32> {
        let value = value.unwrap_or(0);
        u32::try_from(value).map_err(|_| {
            CatalogError::validation(format!(
                "{field} for {} must be between 0 and {}, got {value}",
                self.name,
                u32::MAX
            ))
        })
    }
}

impl TryFrom<ItemRecord> for Item {
    type Error = CatalogError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        let kind = record.item_kind()?;
        Ok(Item::new(record.name, record.description, record.price, record.quantity)?
            .with_kind(kind))
    }
}

impl From<Item> for ItemRecord {
    fn from(item: Item) -> Self {
        let mut record = ItemRecord {
            name: item.name,
            description: item.description,
            price: clamp_i64(item.price),
            quantity: clamp_i64(item.quantity),
            kind: None,
            damage: None,
            defense: None,
            health_amount: None,
        };
        match item.kind {
            ItemKind::General => {}
            ItemKind::Weapon { damage } => record.damage = Some(i64::from(damage)),
            ItemKind::Armor { defense } => record.defense = Some(i64::from(defense)),
            ItemKind::Health { health_amount } => {
                record.health_amount = Some(i64::from(health_amount))
            }
        }
        if item.kind != ItemKind::General {
            record.kind = Some(item.kind.tag().to_string());
        }
        record
    }
}

fn non_negative(field: &str, name: &str, value: i64) -> CatalogResult<u64> {
    u64::try_from(value)
        .map_err(|_| CatalogError::validation(format!("{field} for {name} cannot be negative")))
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_values() {
        assert!(matches!(
            Item::new("Sword", "", -1, 2),
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            Item::new("Sword", "", 100, -2),
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            Item::new("  ", "", 1, 1),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn bare_item_has_no_metadata() {
        let item = Item::bare("Sword", 2);
        assert_eq!(item.quantity(), 2);
        assert_eq!(item.price(), 0);
        assert!(item.description().is_empty());
        assert_eq!(item.kind(), ItemKind::General);
    }

    #[test]
    fn record_infers_kind_from_extension_field() {
        let record = ItemRecord {
            name: "Axe".to_string(),
            price: 150,
            quantity: 1,
            damage: Some(35),
            ..Default::default()
        };
        let item = Item::try_from(record).expect("valid record");
        assert_eq!(item.kind(), ItemKind::Weapon { damage: 35 });
        assert_eq!(item.kind().detail().as_deref(), Some("Damage: 35"));
    }

    #[test]
    fn deserialize_ignores_unknown_fields_and_tags_kind() {
        let item: Item = serde_json::from_str(
            r#"{"name":"Boots","description":"Covers the shins.","price":100,"quantity":5,
                "kind":"armor","defense":25,"rarity":"common"}"#,
        )
        .expect("valid item");
        assert_eq!(item.name(), "Boots");
        assert_eq!(item.kind(), ItemKind::Armor { defense: 25 });

        let value = serde_json::to_value(&item).expect("serializable");
        assert_eq!(value["kind"], "armor");
        assert_eq!(value["defense"], 25);
        assert!(value.get("damage").is_none());
    }

    #[test]
    fn deserialize_rejects_negative_quantity() {
        let result: Result<Item, _> =
            serde_json::from_str(r#"{"name":"Potion","price":5,"quantity":-3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_kind_falls_back_to_general() {
        let item: Item =
            serde_json::from_str(r#"{"name":"Map","price":1,"quantity":1,"kind":"trinket"}"#)
                .expect("valid item");
        assert_eq!(item.kind(), ItemKind::General);
    }
}
