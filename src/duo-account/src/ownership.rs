//! Ownership slots.
//!
//! Two primary slots, kept in ascending address order, plus an optional assistant slot
//! (`Address::ZERO` when unset). The primaries are peers: either one may hand its own slot to a new
//! principal without the other's consent. The assistant can only be rotated by the account itself.

use alloy_primitives::Address;

use crate::{
    errors::AccountError,
    events::{AccountEvent, Slot},
};

/// Role a principal occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Owner0,
    Owner1,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnershipRegistry {
    slot0: Address,
    slot1: Address,
    assistant: Address,
}

impl OwnershipRegistry {
    /// Validate and sort the initial principals. Returns the registry and one event per filled slot.
    pub fn initialize(
        a: Address,
        b: Address,
        assistant: Option<Address>,
    ) -> Result<(Self, Vec<AccountEvent>), AccountError> {
        let assistant = assistant.unwrap_or(Address::ZERO);
        if a == Address::ZERO || b == Address::ZERO || a == b || assistant == a || assistant == b {
            return Err(AccountError::BadOwner);
        }
        let (slot0, slot1) = if a < b { (a, b) } else { (b, a) };
        let registry = Self {
            slot0,
            slot1,
            assistant,
        };

        let mut events = vec![
            changed(Slot::Owner0, Address::ZERO, slot0),
            changed(Slot::Owner1, Address::ZERO, slot1),
        ];
        if assistant != Address::ZERO {
            events.push(changed(Slot::Assistant, Address::ZERO, assistant));
        }
        Ok((registry, events))
    }

    pub fn slot0(&self) -> Address {
        self.slot0
    }

    pub fn slot1(&self) -> Address {
        self.slot1
    }

    pub fn assistant(&self) -> Option<Address> {
        (self.assistant != Address::ZERO).then_some(self.assistant)
    }

    pub fn role_of(&self, who: Address) -> Option<Role> {
        if who == Address::ZERO {
            None
        } else if who == self.slot0 {
            Some(Role::Owner0)
        } else if who == self.slot1 {
            Some(Role::Owner1)
        } else if who == self.assistant {
            Some(Role::Assistant)
        } else {
            None
        }
    }

    pub fn is_owner(&self, who: Address) -> bool {
        matches!(self.role_of(who), Some(Role::Owner0 | Role::Owner1))
    }

    /// Primary owner or assistant.
    pub fn is_member(&self, who: Address) -> bool {
        self.role_of(who).is_some()
    }

    /// The other primary principal, if `who` is a primary principal.
    pub fn co_owner(&self, who: Address) -> Option<Address> {
        match self.role_of(who)? {
            Role::Owner0 => Some(self.slot1),
            Role::Owner1 => Some(self.slot0),
            Role::Assistant => None,
        }
    }

    /// Hand the caller's primary slot to `new_owner`, keeping `slot0 < slot1`.
    pub fn transfer_slot(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<Vec<AccountEvent>, AccountError> {
        let from_slot0 = match self.role_of(caller) {
            Some(Role::Owner0) => true,
            Some(Role::Owner1) => false,
            _ => return Err(AccountError::NotOwner),
        };
        if new_owner == Address::ZERO
            || new_owner == self.slot0
            || new_owner == self.slot1
            || new_owner == self.assistant
        {
            return Err(AccountError::BadOwner);
        }

        let (old0, old1) = (self.slot0, self.slot1);
        if from_slot0 {
            if new_owner > self.slot1 {
                self.slot0 = self.slot1;
                self.slot1 = new_owner;
            } else {
                self.slot0 = new_owner;
            }
        } else if new_owner < self.slot0 {
            self.slot1 = self.slot0;
            self.slot0 = new_owner;
        } else {
            self.slot1 = new_owner;
        }
        debug_assert!(self.slot0 < self.slot1);

        let mut events = Vec::with_capacity(2);
        if old0 != self.slot0 {
            events.push(changed(Slot::Owner0, old0, self.slot0));
        }
        if old1 != self.slot1 {
            events.push(changed(Slot::Owner1, old1, self.slot1));
        }
        Ok(events)
    }

    /// Replace the assistant (`Address::ZERO` removes it). Caller authorization is the account's job.
    /// Returns no event when the assistant is unchanged.
    pub fn set_assistant(
        &mut self,
        assistant: Address,
    ) -> Result<Option<AccountEvent>, AccountError> {
        if assistant != Address::ZERO && (assistant == self.slot0 || assistant == self.slot1) {
            return Err(AccountError::BadOwner);
        }
        let previous = self.assistant;
        if previous == assistant {
            return Ok(None);
        }
        self.assistant = assistant;
        Ok(Some(changed(Slot::Assistant, previous, assistant)))
    }
}

fn changed(slot: Slot, previous: Address, current: Address) -> AccountEvent {
    AccountEvent::OwnershipChanged {
        slot,
        previous,
        current,
    }
}
