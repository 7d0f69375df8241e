//! Visibility predicate: a companion must not render for an owner who is
//! observing or hidden.

use crate::owner::{OwnerId, Presence};

pub trait Visibility {
    fn is_visible(&self, owner: OwnerId, presence: &Presence) -> bool;
}

/// Hides spectators, invisible owners and vanished owners.
#[derive(Copy, Clone, Debug, Default)]
pub struct StandardVisibility;

impl Visibility for StandardVisibility {
    fn is_visible(&self, _owner: OwnerId, presence: &Presence) -> bool {
        !(presence.spectator || presence.invisible || presence.vanished)
    }
}

/// Plain closures work as predicates too.
impl<F> Visibility for F
where
    F: Fn(OwnerId, &Presence) -> bool,
{
    fn is_visible(&self, owner: OwnerId, presence: &Presence) -> bool {
        self(owner, presence)
    }
}
