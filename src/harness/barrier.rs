use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Counters guarded by the [`Barrier`] lock.
///
/// Both counters only grow within a run and never exceed the worker count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BarrierState {
    /// Workers parked at the start line.
    pub arrived: usize,
    /// Set to the worker count once the orchestrator releases the start line.
    pub started: usize,
    /// Workers that completed their batch.
    pub finished: usize,
    /// Set when the run is torn down before the start line is released.
    pub abandoned: bool,
}

/// Two-phase rendezvous between the orchestrator and `num_clients` workers.
///
/// Workers park in [`wait_for_start`](Self::wait_for_start) until the
/// orchestrator calls [`release_start`](Self::release_start), and each worker
/// calls [`signal_finished`](Self::signal_finished) exactly once when its batch
/// is done. The orchestrator observes completion through
/// [`wait_for_finish`](Self::wait_for_finish). A barrier serves one run; build
/// a fresh one for the next.
#[derive(Debug)]
pub struct Barrier {
    num_clients: usize,
    state: Mutex<BarrierState>,
    cv: Condvar,
}

impl Barrier {
    /// Creates a barrier for `num_clients` workers.
    pub fn new(num_clients: usize) -> Self {
        Self {
            num_clients,
            state: Mutex::new(BarrierState::default()),
            cv: Condvar::new(),
        }
    }

    /// Number of workers this barrier synchronizes.
    pub fn num_clients(&self) -> usize {
        self.num_clients
    }

    /// Blocks the calling worker until the start line is released.
    ///
    /// Returns `false` if the barrier was [abandoned](Self::abandon) instead,
    /// in which case the worker must not issue any requests.
    pub fn wait_for_start(&self) -> bool {
        let mut state = self.state.lock();
        assert!(
            state.arrived < self.num_clients,
            "more than {} workers waited for start",
            self.num_clients
        );
        state.arrived += 1;
        self.cv.notify_all();
        while state.started < self.num_clients && !state.abandoned {
            self.cv.wait(&mut state);
        }
        state.started >= self.num_clients
    }

    /// Blocks the orchestrator until every worker is parked at the start line.
    pub fn wait_for_arrivals(&self) {
        let mut state = self.state.lock();
        while state.arrived < self.num_clients {
            self.cv.wait(&mut state);
        }
    }

    /// Releases every parked worker. Called once per run.
    ///
    /// Waits for all workers to arrive first, so no worker leaves the start
    /// line before the whole set has reached it.
    pub fn release_start(&self) {
        let mut state = self.state.lock();
        assert!(state.started == 0, "start line released twice");
        while state.arrived < self.num_clients {
            self.cv.wait(&mut state);
        }
        state.started = self.num_clients;
        self.cv.notify_all();
    }

    /// Wakes every worker parked at the start line without releasing it.
    ///
    /// Used when a run cannot start, e.g. a worker thread failed to spawn.
    /// Workers arriving later return immediately as well.
    pub fn abandon(&self) {
        let mut state = self.state.lock();
        assert!(state.started == 0, "cannot abandon a released start line");
        state.abandoned = true;
        self.cv.notify_all();
    }

    /// Records that one worker finished its batch.
    pub fn signal_finished(&self) {
        let mut state = self.state.lock();
        assert!(
            state.finished < self.num_clients,
            "more than {} workers signalled completion",
            self.num_clients
        );
        state.finished += 1;
        self.cv.notify_all();
    }

    /// Blocks until every worker has signalled completion.
    pub fn wait_for_finish(&self) {
        let mut state = self.state.lock();
        while state.finished < self.num_clients {
            self.cv.wait(&mut state);
        }
    }

    /// Like [`wait_for_finish`](Self::wait_for_finish) but gives up at `timeout`.
    ///
    /// Returns `true` when all workers finished in time.
    pub fn wait_for_finish_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.finished < self.num_clients {
            if self.cv.wait_until(&mut state, deadline).timed_out() {
                return state.finished >= self.num_clients;
            }
        }
        true
    }

    /// Copy of the current counters.
    pub fn snapshot(&self) -> BarrierState {
        *self.state.lock()
    }
}
