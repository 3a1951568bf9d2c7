//! Catalog entity types and their wire representations
//!
//! The catalog is a three-level hierarchy: a [`Menu`] owns [`Submenu`]s,
//! which own [`Dish`]es. Parent references (`menu_id`, `submenu_id`) are
//! assigned at creation and never change afterwards.
//!
//! Counters (`submenus_count`, `dishes_count`) are derived fields: they are
//! stored denormalized and maintained incrementally by the storage backend,
//! never recomputed per read. After every operation each counter equals the
//! exact number of live children it describes.
//!
//! Identity is an `i64` assigned by the store as a per-table increasing
//! sequence, but serialized as a JSON string (`"id": "1"`) to match the
//! public API contract.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kinds of entity the catalog manages.
///
/// Used in error reporting: a 404 body carries the kind's display name
/// (e.g. `{"detail": "submenu not found"}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Menu,
    Submenu,
    Dish,
}

impl EntityKind {
    /// The lowercase name used in API error messages and confirmations.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Menu => "menu",
            EntityKind::Submenu => "submenu",
            EntityKind::Dish => "dish",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level menu.
///
/// `submenus_count` and `dishes_count` are derived: they track the number
/// of submenus (resp. dishes, across all submenus) currently under this
/// menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    #[serde(with = "id_string")]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub submenus_count: i64,
    pub dishes_count: i64,
}

/// A submenu under a menu.
///
/// `menu_id` is immutable after creation. `dishes_count` tracks the number
/// of dishes currently under this submenu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submenu {
    #[serde(with = "id_string")]
    pub id: i64,
    #[serde(with = "id_string")]
    pub menu_id: i64,
    pub title: String,
    pub description: String,
    pub dishes_count: i64,
}

/// A dish under a (menu, submenu) pair.
///
/// `menu_id` is redundant with the submenu's parent but is stored so the
/// pair stays checkable; both references are immutable after creation.
/// `price` is an exact decimal, normalized to two fractional digits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    #[serde(with = "id_string")]
    pub id: i64,
    #[serde(with = "id_string")]
    pub menu_id: i64,
    #[serde(with = "id_string")]
    pub submenu_id: i64,
    pub title: String,
    pub description: String,
    pub price: Decimal,
}

/// Request body for creating or updating a menu or submenu.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuDraft {
    pub title: String,
    pub description: String,
}

/// Request body for creating or updating a submenu.
pub type SubmenuDraft = MenuDraft;

/// Request body for creating or updating a dish.
///
/// `price` deserializes from either a JSON string (`"12.50"`) or a number;
/// it is normalized to two fractional digits before storage.
#[derive(Debug, Clone, Deserialize)]
pub struct DishDraft {
    pub title: String,
    pub description: String,
    pub price: Decimal,
}

impl DishDraft {
    /// The price rounded and rescaled to the conventional two fractional
    /// digits, so `"100"` is stored and echoed as `100.00`.
    pub fn normalized_price(&self) -> Decimal {
        let mut price = self.price.round_dp(2);
        price.rescale(2);
        price
    }
}

/// Serde helper: `i64` ids as JSON strings on the wire.
///
/// The public API has always exposed ids as strings (`"id": "1"`), so the
/// serializer emits a string and the deserializer accepts either a string
/// or a bare number.
pub(crate) mod id_string {
    use serde::Serializer;
    use serde::de::{self, Deserializer, Unexpected, Visitor};

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = i64;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an integer id as a string or number")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
                i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
                v.parse()
                    .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}
