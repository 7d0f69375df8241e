//! Fixed-order tick orchestration: inbox -> update pass (when due) -> due jobs (budgeted).

use std::time::Instant;

use crate::CompanionServer;
use crate::gateway::WorldGateway;
use crate::owner::OwnerDirectory;
use crate::store::OwnershipStore;

/// Periodic trigger for the update pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickTimer {
    interval: u64,
    next_due: Option<u64>,
}

impl TickTimer {
    /// First fire is `interval` ticks after `now`.
    pub fn start(&mut self, now: u64, interval: u64) {
        self.interval = interval.max(1);
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// True at most once per interval; re-arms itself when it fires.
    pub fn fire(&mut self, now: u64) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

/// What one tick did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub received: usize,
    pub updated: bool,
    pub jobs_run: usize,
}

impl<W, D, S> CompanionServer<W, D, S>
where
    W: WorldGateway,
    D: OwnerDirectory,
    S: OwnershipStore,
{
    /// Run one tick:
    /// - Drain jobs sent from other threads
    /// - Run the update pass if the periodic trigger is due
    /// - Run due jobs, at most `max_jobs_per_tick`; the rest carry over
    pub fn tick(&mut self) -> TickReport {
        let t0 = Instant::now();
        self.tick += 1;
        let now = self.tick;
        let received = self.jobs.drain_inbox();
        let updated = self.timer.fire(now);
        if updated {
            self.update_all();
        }
        self.jobs.promote_due(now);
        let budget = self.physics.entity.max_jobs_per_tick;
        let mut jobs_run = 0usize;
        while jobs_run < budget {
            let Some(job) = self.jobs.pop() else { break };
            self.run_job(job);
            jobs_run += 1;
        }
        metrics::histogram!("companions.tick_ms").record(t0.elapsed().as_secs_f64() * 1000.0);
        TickReport { tick: now, received, updated, jobs_run }
    }

    /// Convenience for hosts and tests.
    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }
}
