use std::{fmt, str::FromStr};

use mongodb::bson::oid::ObjectId;
use schemars::{
	gen::SchemaGenerator,
	schema::{InstanceType, Schema, SchemaObject},
	JsonSchema,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A store-native document identifier.
///
/// Rendered as a 24 character hex string everywhere outside the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(ObjectId);

impl Id {
	/// Generates a fresh, unique identifier.
	pub fn new() -> Self {
		Self(ObjectId::new())
	}

	pub fn into_inner(self) -> ObjectId {
		self.0
	}
}

/// The nil identifier. Only used as a placeholder for server-assigned fields.
impl Default for Id {
	fn default() -> Self {
		Self(ObjectId::from_bytes([0; 12]))
	}
}

impl From<ObjectId> for Id {
	fn from(id: ObjectId) -> Self {
		Self(id)
	}
}

impl From<Id> for ObjectId {
	fn from(id: Id) -> Self {
		id.0
	}
}

impl fmt::Display for Id {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.to_hex())
	}
}

impl FromStr for Id {
	type Err = mongodb::bson::oid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ObjectId::parse_str(s).map(Self)
	}
}

impl Serialize for Id {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0.to_hex())
	}
}

impl<'de> Deserialize<'de> for Id {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let hex = String::deserialize(deserializer)?;

		hex.parse()
			.map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&hex), &"a 24 character hex id"))
	}
}

impl JsonSchema for Id {
	fn schema_name() -> String {
		"Id".into()
	}

	fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
		SchemaObject {
			instance_type: Some(InstanceType::String.into()),
			format: Some("objectid".into()),
			..Default::default()
		}
		.into()
	}
}

#[cfg(test)]
mod test {
	use super::Id;

	#[test]
	fn test_id_renders_as_hex() {
		let id = Id::new();
		let json = serde_json::to_value(id).unwrap();

		assert_eq!(json, serde_json::json!(id.to_string()));
		assert_eq!(id.to_string().len(), 24);
		assert_eq!(serde_json::from_value::<Id>(json).unwrap(), id);
	}

	#[test]
	fn test_id_rejects_malformed_hex() {
		assert!(serde_json::from_value::<Id>(serde_json::json!("not-an-id")).is_err());
		assert!("zz".parse::<Id>().is_err());
	}
}
