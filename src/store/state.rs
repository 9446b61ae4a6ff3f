use crate::api::models::{Contact, EntityId, Group};
use serde_json::Value;

/// Local mirror of the server's contacts and groups plus view-facing status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    /// Load/create order, unique by id.
    pub contacts: Vec<Contact>,
    pub groups: Vec<Group>,
    /// May point at an entity that no longer exists.
    pub selected_contact_id: Option<EntityId>,
    pub selected_group_id: Option<EntityId>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// `meta` of the last contacts listing, passed through untouched.
    pub pagination: Option<Value>,
    in_flight: usize,
}

impl StoreState {
    pub fn contact(&self, id: &EntityId) -> Option<&Contact> {
        self.contacts.iter().find(|c| &c.id == id)
    }

    pub fn group(&self, id: &EntityId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.id == id)
    }

    pub fn contacts_in_group(&self, group_id: &EntityId) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|c| c.is_member_of(group_id))
            .collect()
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        self.selected_contact_id.as_ref().and_then(|id| self.contact(id))
    }

    pub fn selected_group(&self) -> Option<&Group> {
        self.selected_group_id.as_ref().and_then(|id| self.group(id))
    }

    pub(super) fn begin_call(&mut self) {
        self.in_flight += 1;
        self.is_loading = true;
        self.error = None;
    }

    pub(super) fn end_call(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.is_loading = self.in_flight > 0;
    }
}

pub(super) trait Identified {
    fn id(&self) -> &EntityId;
}

impl Identified for Contact {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for Group {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Replaces the entry with `id` in place, or appends when there is none.
pub(super) fn replace_or_append<T: Identified>(items: &mut Vec<T>, id: &EntityId, entity: T) {
    match items.iter().position(|item| item.id() == id) {
        Some(index) => items[index] = entity,
        None => items.push(entity),
    }
}

pub(super) fn remove_by_id<T: Identified>(items: &mut Vec<T>, id: &EntityId) -> Option<T> {
    let index = items.iter().position(|item| item.id() == id)?;
    Some(items.remove(index))
}
