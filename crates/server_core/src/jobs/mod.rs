//! Tick-thread job queue.
//!
//! Work that must touch companion state but originates elsewhere (other
//! threads, deferred restores, reload resumes) is queued here and run on the
//! tick thread under a per-tick budget. Delayed jobs are keyed by the tick
//! they become due; the mpsc inbox is the only cross-thread entry point.

use std::collections::{BTreeMap, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::listeners::OwnerEvent;
use crate::owner::OwnerId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Job {
    Equip { owner: OwnerId, companion: String },
    Unequip { owner: OwnerId },
    /// Re-equip the persisted companion if the owner is online, visible and
    /// has none active.
    Restore { owner: OwnerId },
    /// Deferred respawn after a teleport teardown.
    TeleportRespawn { owner: OwnerId },
    Event(OwnerEvent),
    CleanupOrphans,
}

impl Job {
    pub fn owner(&self) -> Option<OwnerId> {
        match self {
            Self::Equip { owner, .. }
            | Self::Unequip { owner }
            | Self::Restore { owner }
            | Self::TeleportRespawn { owner } => Some(*owner),
            Self::Event(ev) => Some(ev.owner()),
            Self::CleanupOrphans => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Equip { .. } => "equip",
            Self::Unequip { .. } => "unequip",
            Self::Restore { .. } => "restore",
            Self::TeleportRespawn { .. } => "teleport_respawn",
            Self::Event(_) => "event",
            Self::CleanupOrphans => "cleanup_orphans",
        }
    }
}

/// Cloneable, `Send` handle for queueing jobs from any thread.
#[derive(Clone, Debug)]
pub struct JobSender {
    tx: Sender<Job>,
}

impl JobSender {
    /// Returns false once the server is gone.
    pub fn send(&self, job: Job) -> bool {
        self.tx.send(job).is_ok()
    }
}

#[derive(Debug)]
pub struct JobQueue {
    tx: Sender<Job>,
    rx: Receiver<Job>,
    ready: VecDeque<Job>,
    /// (due tick, sequence) keeps same-tick jobs in scheduling order.
    delayed: BTreeMap<(u64, u64), Job>,
    seq: u64,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, ready: VecDeque::new(), delayed: BTreeMap::new(), seq: 0 }
    }

    pub fn sender(&self) -> JobSender {
        JobSender { tx: self.tx.clone() }
    }

    /// Run on the next budgeted pass.
    pub fn push(&mut self, job: Job) {
        self.ready.push_back(job);
    }

    /// Run once `due_tick` is reached.
    pub fn schedule(&mut self, job: Job, due_tick: u64) {
        self.seq = self.seq.wrapping_add(1);
        self.delayed.insert((due_tick, self.seq), job);
    }

    /// Move everything sent from other threads onto the ready list.
    pub fn drain_inbox(&mut self) -> usize {
        let mut n = 0usize;
        while let Ok(job) = self.rx.try_recv() {
            self.ready.push_back(job);
            n += 1;
        }
        n
    }

    /// Move delayed jobs whose due tick has arrived onto the ready list.
    pub fn promote_due(&mut self, now: u64) -> usize {
        let later = self.delayed.split_off(&(now.saturating_add(1), 0));
        let due = std::mem::replace(&mut self.delayed, later);
        let n = due.len();
        self.ready.extend(due.into_values());
        n
    }

    pub fn pop(&mut self) -> Option<Job> {
        self.ready.pop_front()
    }

    /// Drop every pending job (ready or delayed) that targets `owner`.
    pub fn cancel_owner(&mut self, owner: OwnerId) -> usize {
        let before = self.len();
        self.ready.retain(|j| j.owner() != Some(owner));
        self.delayed.retain(|_, j| j.owner() != Some(owner));
        before - self.len()
    }

    /// Drop everything, including unread inbox messages.
    pub fn clear(&mut self) {
        while self.rx.try_recv().is_ok() {}
        self.ready.clear();
        self.delayed.clear();
    }

    /// Pending jobs (ready, then delayed) that target `owner`.
    pub fn pending_for(&self, owner: OwnerId) -> impl Iterator<Item = &Job> {
        self.ready
            .iter()
            .chain(self.delayed.values())
            .filter(move |j| j.owner() == Some(owner))
    }

    pub fn len(&self) -> usize {
        self.ready.len() + self.delayed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
