mod state;

pub use state::StoreState;

use crate::api::client::ApiClient;
use crate::api::models::{Contact, ContactFilter, EntityId, Group, MembershipUpdate};
use crate::api::resources::{ContactApi, GroupApi};
use crate::error::Result;
use log::{debug, error, warn};
use serde::Serialize;
use serde_json::Value;
use state::{remove_by_id, replace_or_append};
use tokio::sync::watch;

/// Holds the client-side mirror of the contacts service and keeps it in step
/// with every remote mutation.
///
/// Every network-backed operation runs the same way: mark a call in flight and
/// clear `error`, make exactly one request, apply the local change on success
/// or record a message in `error` on failure, then drop the in-flight mark.
/// The failure itself is always handed back to the caller.
///
/// Views read through [`Store::snapshot`] or watch [`Store::subscribe`]; the
/// receiver is notified after each state change.
pub struct Store {
    contact_api: ContactApi,
    group_api: GroupApi,
    state: watch::Sender<StoreState>,
}

/// Marks one store call as in flight until dropped, whichever way the call ends.
struct InFlight<'a> {
    state: &'a watch::Sender<StoreState>,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a watch::Sender<StoreState>) -> Self {
        state.send_modify(StoreState::begin_call);
        Self { state }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.send_modify(StoreState::end_call);
    }
}

impl Store {
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            contact_api: ContactApi::contacts(api.clone()),
            group_api: GroupApi::groups(api),
            state,
        }
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.state.borrow().contacts.clone()
    }

    pub fn groups(&self) -> Vec<Group> {
        self.state.borrow().groups.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn pagination(&self) -> Option<Value> {
        self.state.borrow().pagination.clone()
    }

    fn update(&self, mutate: impl FnOnce(&mut StoreState)) {
        self.state.send_modify(mutate);
    }

    /// Records a failed call in `error` and passes it on.
    fn settle<T>(&self, result: Result<T>, fallback: &str) -> Result<T> {
        result.inspect_err(|e| {
            error!("{fallback}: {e}");
            let message = e.server_message().unwrap_or(fallback).to_string();
            self.update(|s| s.error = Some(message));
        })
    }

    // Contacts

    /// Replaces the whole contact list with the server's, along with its `meta`.
    pub async fn load_contacts(&self, filter: &ContactFilter) -> Result<()> {
        let _in_flight = InFlight::begin(&self.state);
        let listing = self.settle(
            self.contact_api.get_all(filter).await,
            "Failed to load contacts",
        )?;
        debug!("loaded {} contacts", listing.items.len());
        self.update(move |s| {
            s.contacts = listing.items;
            s.pagination = listing.meta;
        });
        Ok(())
    }

    /// New contacts always land at the end of the list.
    pub async fn add_contact<P: Serialize + ?Sized>(&self, data: &P) -> Result<Contact> {
        let _in_flight = InFlight::begin(&self.state);
        let contact = self.settle(
            self.contact_api.create(data).await,
            "Failed to create contact",
        )?;
        let stored = contact.clone();
        self.update(move |s| s.contacts.push(stored));
        Ok(contact)
    }

    /// Swaps the local copy for the server's. An id the store has never seen
    /// is appended rather than rejected.
    pub async fn update_contact<P: Serialize + ?Sized>(
        &self,
        id: &EntityId,
        data: &P,
    ) -> Result<Contact> {
        let _in_flight = InFlight::begin(&self.state);
        let contact = self.settle(
            self.contact_api.update(id, data).await,
            "Failed to update contact",
        )?;
        let stored = contact.clone();
        self.update(|s| replace_or_append(&mut s.contacts, id, stored));
        Ok(contact)
    }

    pub async fn delete_contact(&self, id: &EntityId) -> Result<()> {
        let _in_flight = InFlight::begin(&self.state);
        self.settle(
            self.contact_api.delete(id).await,
            "Failed to delete contact",
        )?;
        self.update(|s| {
            if remove_by_id(&mut s.contacts, id).is_none() {
                debug!("deleted contact {id} was not in the local list");
            }
            if s.selected_contact_id.as_ref() == Some(id) {
                s.selected_contact_id = None;
            }
        });
        Ok(())
    }

    pub fn get_contact_by_id(&self, id: &EntityId) -> Option<Contact> {
        self.state.borrow().contact(id).cloned()
    }

    pub fn select_contact(&self, id: Option<EntityId>) {
        self.update(|s| s.selected_contact_id = id);
    }

    pub fn selected_contact(&self) -> Option<Contact> {
        self.state.borrow().selected_contact().cloned()
    }

    // Groups

    pub async fn load_groups(&self) -> Result<()> {
        let _in_flight = InFlight::begin(&self.state);
        let listing = self.settle(self.group_api.get_all().await, "Failed to load groups")?;
        debug!("loaded {} groups", listing.items.len());
        self.update(move |s| s.groups = listing.items);
        Ok(())
    }

    pub async fn add_group<P: Serialize + ?Sized>(&self, data: &P) -> Result<Group> {
        let _in_flight = InFlight::begin(&self.state);
        let group = self.settle(self.group_api.create(data).await, "Failed to create group")?;
        let stored = group.clone();
        self.update(move |s| s.groups.push(stored));
        Ok(group)
    }

    pub async fn update_group<P: Serialize + ?Sized>(
        &self,
        id: &EntityId,
        data: &P,
    ) -> Result<Group> {
        let _in_flight = InFlight::begin(&self.state);
        let group = self.settle(
            self.group_api.update(id, data).await,
            "Failed to update group",
        )?;
        let stored = group.clone();
        self.update(|s| replace_or_append(&mut s.groups, id, stored));
        Ok(group)
    }

    pub async fn delete_group(&self, id: &EntityId) -> Result<()> {
        let _in_flight = InFlight::begin(&self.state);
        self.settle(self.group_api.delete(id).await, "Failed to delete group")?;
        self.update(|s| {
            if remove_by_id(&mut s.groups, id).is_none() {
                debug!("deleted group {id} was not in the local list");
            }
            if s.selected_group_id.as_ref() == Some(id) {
                s.selected_group_id = None;
            }
        });
        Ok(())
    }

    pub fn get_group_by_id(&self, id: &EntityId) -> Option<Group> {
        self.state.borrow().group(id).cloned()
    }

    pub fn select_group(&self, id: Option<EntityId>) {
        self.update(|s| s.selected_group_id = id);
    }

    pub fn selected_group(&self) -> Option<Group> {
        self.state.borrow().selected_group().cloned()
    }

    // Membership

    pub fn get_contacts_by_group_id(&self, group_id: &EntityId) -> Vec<Contact> {
        self.state
            .borrow()
            .contacts_in_group(group_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Adds `group_id` to the contact's groups.
    ///
    /// `Ok(false)` when nothing was sent: the contact is not in the store or
    /// already belongs to the group. `Ok(true)` once the rewritten membership
    /// has been accepted by the server.
    pub async fn add_contact_to_group(
        &self,
        contact_id: &EntityId,
        group_id: &EntityId,
    ) -> Result<bool> {
        let Some(mut group_ids) = self.get_contact_by_id(contact_id).map(|c| c.group_ids()) else {
            return Ok(false);
        };
        if group_ids.contains(group_id) {
            return Ok(false);
        }
        group_ids.push(group_id.clone());
        self.rewrite_membership(contact_id, group_ids, "add contact to group")
            .await
    }

    /// Drops `group_id` from the contact's groups. The update is sent whenever
    /// the contact is known, even if it was never in the group.
    pub async fn remove_contact_from_group(
        &self,
        contact_id: &EntityId,
        group_id: &EntityId,
    ) -> Result<bool> {
        let Some(contact) = self.get_contact_by_id(contact_id) else {
            return Ok(false);
        };
        let group_ids = contact
            .group_ids()
            .into_iter()
            .filter(|id| id != group_id)
            .collect();
        self.rewrite_membership(contact_id, group_ids, "remove contact from group")
            .await
    }

    async fn rewrite_membership(
        &self,
        contact_id: &EntityId,
        group_ids: Vec<EntityId>,
        action: &str,
    ) -> Result<bool> {
        match self
            .update_contact(contact_id, &MembershipUpdate { group_ids })
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Failed to {action}: {e}");
                Err(e)
            }
        }
    }

    /// Loads contacts and groups side by side. Whatever loaded is kept; if a
    /// load failed its error is returned, the contacts one first.
    pub async fn init_store(&self) -> Result<()> {
        let filter = ContactFilter::default();
        let (contacts, groups) = tokio::join!(self.load_contacts(&filter), self.load_groups());
        contacts.and(groups)
    }
}
