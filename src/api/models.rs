use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Server-assigned identity of a contact or group.
///
/// The service hands ids out as JSON numbers in some responses and as strings
/// in others (and route parameters always arrive as text), so every id is kept
/// as its decimal/text form and compared strictly. `3` and `"3"` are the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The integer this id spells, if its text is exactly a canonical integer.
    fn as_integer(&self) -> Option<i64> {
        let n: i64 = self.0.parse().ok()?;
        (n.to_string() == self.0).then_some(n)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for EntityId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_integer() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(de::Error::custom(format!(
                "expected a string or number id, got {other}"
            ))),
        }
    }
}

/// A group as embedded in a contact's membership list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: EntityId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl GroupRef {
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

/// A contact's `groups` key as received. An absent key and an explicit `null`
/// both mean "no memberships" but serialize back the way they came in.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Memberships {
    #[default]
    Absent,
    Null,
    List(Vec<GroupRef>),
}

impl Memberships {
    pub fn as_slice(&self) -> &[GroupRef] {
        match self {
            Memberships::List(groups) => groups,
            Memberships::Absent | Memberships::Null => &[],
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Memberships::Absent)
    }
}

impl Serialize for Memberships {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Memberships::List(groups) => groups.serialize(serializer),
            Memberships::Absent | Memberships::Null => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Memberships {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Vec<GroupRef>>::deserialize(deserializer)? {
            Some(groups) => Memberships::List(groups),
            None => Memberships::Null,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Memberships::is_absent")]
    pub groups: Memberships,
    /// Profile fields (name, phone, email, ...) exactly as the server sent them.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Contact {
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub fn groups(&self) -> &[GroupRef] {
        self.groups.as_slice()
    }

    pub fn group_ids(&self) -> Vec<EntityId> {
        self.groups().iter().map(|g| g.id.clone()).collect()
    }

    pub fn is_member_of(&self, group_id: &EntityId) -> bool {
        self.groups().iter().any(|g| &g.id == group_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: EntityId,
    /// Everything besides the id (name, member list, ...) as sent.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Group {
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

/// Body of a membership rewrite: the full set of groups the contact belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembershipUpdate {
    pub group_ids: Vec<EntityId>,
}

/// Query options for listing contacts. Unset options are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactFilter {
    pub search: Option<String>,
    pub group: Option<EntityId>,
    pub extra: BTreeMap<String, String>,
}

impl ContactFilter {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group: impl Into<EntityId>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(group) = &self.group {
            pairs.push(("group".to_string(), group.to_string()));
        }
        pairs.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

/// A list response: either `{"data": [...], "meta": {...}}` or a bare array.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub meta: Option<Value>,
}

impl<T: DeserializeOwned> Listing<T> {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(_) => Ok(Self {
                items: serde_json::from_value(value)?,
                meta: None,
            }),
            Value::Object(mut obj) => {
                let Some(data) = obj.remove("data") else {
                    return Err(de::Error::custom("list response has no `data` array"));
                };
                Ok(Self {
                    items: serde_json::from_value(data)?,
                    meta: obj.remove("meta").filter(|m| !m.is_null()),
                })
            }
            other => Err(de::Error::custom(format!(
                "expected a list response, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_string_ids_are_the_same_id() {
        let a: EntityId = serde_json::from_value(json!(3)).unwrap();
        let b: EntityId = serde_json::from_value(json!("3")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, EntityId::from(3));
    }

    #[test]
    fn ids_serialize_back_in_server_shape() {
        assert_eq!(serde_json::to_value(EntityId::from(42)).unwrap(), json!(42));
        assert_eq!(serde_json::to_value(EntityId::from("007")).unwrap(), json!("007"));
        assert_eq!(
            serde_json::to_value(EntityId::from("9b2f-aa")).unwrap(),
            json!("9b2f-aa")
        );
    }

    #[test]
    fn boolean_id_is_rejected() {
        assert!(serde_json::from_value::<EntityId>(json!(true)).is_err());
    }

    #[test]
    fn contact_keeps_profile_fields_verbatim() {
        let raw = json!({
            "id": 1,
            "name": "Ana",
            "email": "ana@example.com",
            "groups": [{"id": 9, "name": "Family", "color": "red"}]
        });
        let contact: Contact = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(contact.name(), Some("Ana"));
        assert_eq!(contact.group_ids(), vec![EntityId::from(9)]);
        assert_eq!(contact.groups()[0].name(), Some("Family"));
        assert_eq!(contact.groups()[0].fields.get("color"), Some(&json!("red")));
        assert_eq!(serde_json::to_value(&contact).unwrap(), raw);
    }

    #[test]
    fn missing_or_null_groups_mean_no_memberships() {
        let a: Contact = serde_json::from_value(json!({"id": 1})).unwrap();
        let b: Contact = serde_json::from_value(json!({"id": 2, "groups": null})).unwrap();
        assert!(a.groups().is_empty());
        assert!(b.groups().is_empty());
        assert!(!b.is_member_of(&EntityId::from(1)));
    }

    #[test]
    fn null_fields_serialize_back_as_null() {
        let raw = json!({"id": 1, "name": "Ana", "groups": null});
        let contact: Contact = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(contact.groups, Memberships::Null);
        assert_eq!(serde_json::to_value(&contact).unwrap(), raw);

        let raw = json!({"id": 2, "name": "Bo"});
        let contact: Contact = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(contact.groups, Memberships::Absent);
        assert_eq!(serde_json::to_value(&contact).unwrap(), raw);

        let raw = json!({"id": 9, "name": null});
        let group: Group = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(group.name(), None);
        assert_eq!(serde_json::to_value(&group).unwrap(), raw);

        let raw = json!({"id": 3, "groups": [{"id": 9, "name": null}]});
        let contact: Contact = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(contact.groups()[0].name(), None);
        assert_eq!(serde_json::to_value(&contact).unwrap(), raw);
    }

    #[test]
    fn listing_accepts_envelope_and_bare_array() {
        let wrapped: Listing<Group> = Listing::from_value(json!({
            "data": [{"id": 1, "name": "Work"}],
            "meta": {"total": 1}
        }))
        .unwrap();
        assert_eq!(wrapped.items.len(), 1);
        assert_eq!(wrapped.meta, Some(json!({"total": 1})));

        let bare: Listing<Group> = Listing::from_value(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(bare.items.len(), 2);
        assert_eq!(bare.meta, None);
    }

    #[test]
    fn listing_without_data_is_an_error() {
        assert!(Listing::<Group>::from_value(json!({"meta": {}})).is_err());
        assert!(Listing::<Group>::from_value(json!("nope")).is_err());
    }

    #[test]
    fn filter_only_sends_set_options() {
        assert!(ContactFilter::default().query_pairs().is_empty());

        let pairs = ContactFilter::search("ana")
            .with_group(9)
            .with_param("page", "2")
            .query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("search".to_string(), "ana".to_string()),
                ("group".to_string(), "9".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }
}
