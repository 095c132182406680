//! In-memory documents decoded from map unit and actor info containers.
//!
//! Only the fields the patcher needs are typed. Everything else is carried through
//! untouched as a [`Record`] so that re-encoding a document never drops data.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A loosely-typed string-keyed record.
pub type Record = serde_json::Map<String, Value>;

/// The bundled source catalog: actor name -> actor entry.
pub type ActorCatalog = BTreeMap<String, ActorEntry>;

/// One map section (`<Unit>_<Kind>.smubin`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapUnit {
    /// Placed objects, in on-disk order.
    #[serde(rename = "Objs", default)]
    pub objs: Vec<PlacedObject>,

    /// Remaining top-level fields (`Rails`, `LocationPosX`, ...), preserved verbatim.
    #[serde(flatten)]
    pub rest: Record,
}

/// A single placed object inside a [`MapUnit`].
///
/// The whole record is kept opaque; [`name`](Self::name) and [`hash_id`](Self::hash_id)
/// read the two fields the patcher cares about, and [`rename`](Self::rename) rewrites the
/// same name field in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacedObject(Record);

impl PlacedObject {
    /// Field holding the actor name.
    pub const NAME_KEY: &'static str = "UnitConfigName";
    /// Field holding the per-object id.
    pub const ID_KEY: &'static str = "HashId";

    /// Create a record with just a name and an id.
    pub fn new(name: impl Into<String>, hash_id: u32) -> Self {
        let mut record = Record::new();
        record.insert(Self::NAME_KEY.to_string(), Value::String(name.into()));
        record.insert(Self::ID_KEY.to_string(), Value::from(hash_id));
        Self(record)
    }

    /// Wrap an existing record.
    pub fn from_record(record: Record) -> Self {
        Self(record)
    }

    /// The actor name, or `None` if the record has no string name.
    pub fn name(&self) -> Option<&str> {
        self.0.get(Self::NAME_KEY).and_then(Value::as_str)
    }

    /// The per-object id, or `None` if it is missing or out of `u32` range.
    pub fn hash_id(&self) -> Option<u32> {
        self.0
            .get(Self::ID_KEY)
            .and_then(Value::as_u64)
            .and_then(|id| u32::try_from(id).ok())
    }

    /// Overwrite the actor name field.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.0
            .insert(Self::NAME_KEY.to_string(), Value::String(name.into()));
    }

    /// The underlying record.
    pub fn record(&self) -> &Record {
        &self.0
    }
}

/// The actor index (`ActorInfo.product.sbyml`).
///
/// `actors` and `hashes` are parallel lists: the game expects `hashes[i]` to be the
/// name hash of `actors[i]`, and both sorted ascending by that hash.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorInfo {
    #[serde(rename = "Actors", default)]
    pub actors: Vec<ActorEntry>,

    #[serde(rename = "Hashes", default)]
    pub hashes: Vec<u32>,

    #[serde(flatten)]
    pub rest: Record,
}

/// One actor's metadata as listed in an actor index or the source catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorEntry {
    /// Actor name. Catalog entries may omit it; the catalog key is used instead.
    #[serde(default)]
    pub name: String,

    /// Everything else about the actor (profile, bfres, model, ...).
    #[serde(flatten)]
    pub params: Record,
}

impl ActorEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Record::new(),
        }
    }

    /// Builder-style helper to attach a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placed_object_accessors() {
        let obj = PlacedObject::new("Obj_A", 42);
        assert_eq!(obj.name(), Some("Obj_A"));
        assert_eq!(obj.hash_id(), Some(42));
    }

    #[test]
    fn test_placed_object_rename_keeps_single_name_field() {
        let mut obj = PlacedObject::new("Obj_B", 5);
        obj.rename("Obj_BC");

        assert_eq!(obj.name(), Some("Obj_BC"));
        let name_fields = obj
            .record()
            .keys()
            .filter(|k| k.contains("ConfigName"))
            .count();
        assert_eq!(name_fields, 1);
    }

    #[test]
    fn test_placed_object_malformed_name() {
        let record = json!({ "UnitConfigName": 12, "HashId": 1 });
        let obj = PlacedObject::from_record(record.as_object().unwrap().clone());
        assert_eq!(obj.name(), None);
        assert_eq!(obj.hash_id(), Some(1));
    }

    #[test]
    fn test_placed_object_id_out_of_range() {
        let record = json!({ "UnitConfigName": "Obj_A", "HashId": u64::MAX });
        let obj = PlacedObject::from_record(record.as_object().unwrap().clone());
        assert_eq!(obj.hash_id(), None);
    }

    #[test]
    fn test_map_unit_preserves_unknown_fields() {
        let value = json!({
            "Objs": [{ "UnitConfigName": "Obj_A", "HashId": 1, "Translate": [1.0, 2.0, 3.0] }],
            "LocationPosX": 10.5,
        });
        let unit: MapUnit = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(unit.objs.len(), 1);
        assert!(unit.rest.contains_key("LocationPosX"));
        assert_eq!(serde_json::to_value(&unit).unwrap(), value);
    }

    #[test]
    fn test_actor_entry_flattens_params() {
        let entry = ActorEntry::new("Obj_A").with_param("profile", "MapStatic");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({ "name": "Obj_A", "profile": "MapStatic" }));
    }
}
