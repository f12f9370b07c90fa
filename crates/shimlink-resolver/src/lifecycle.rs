// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lifecycle coordinator
//!
//! ```text
//! Uninstalled --early--> PatchInstalled --late--> HookInstalled
//! HookInstalled --first request--> Ready | Degraded
//! Degraded --dependency ready--> Ready
//! ```
//!
//! The resolution hook is only ever installed from the late extension point.
//! Installing it earlier would let it see the host's own bootstrap loads.
//! The candidate directory is generated by a process that itself runs after
//! the hook exists, so discovery is lazy and re-armed by an explicit signal
//! instead of polling.

use crate::bypass::IdentityBypass;
use crate::error::LifecycleError;
use crate::hook::ResolutionHook;
use crate::host::Host;
use crate::resolver::{Readiness, ResolverState, StatsSnapshot};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{info, warn};

/// Observable coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing installed
    Uninstalled,
    /// Identity bypass installed (or found unavailable)
    PatchInstalled,
    /// Resolution hook installed, discovery not run yet
    HookInstalled,
    /// Candidate directory found and scanned
    Ready,
    /// Candidate directory missing; requests are declined
    Degraded,
}

impl LifecycleState {
    /// State name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninstalled => "Uninstalled",
            Self::PatchInstalled => "PatchInstalled",
            Self::HookInstalled => "HookInstalled",
            Self::Ready => "Ready",
            Self::Degraded => "Degraded",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Inner {
    state: Arc<ResolverState>,
    /// Serializes the two install phases
    install_lock: Mutex<()>,
    early: AtomicBool,
    late: AtomicBool,
    interception_available: AtomicBool,
    reported: AtomicBool,
}

impl Inner {
    fn dependency_ready(&self) {
        if self.late.load(Ordering::Acquire) {
            let readiness = self.state.rearm();
            info!("Dependencies ready; resolver is now {:?}", readiness);
        } else {
            // Hook not installed yet: drop stale state, rebuild on first request
            self.state.reset();
        }
    }
}

/// Drives installation order and rebuilds
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// Create a coordinator around `state`
    pub fn new(state: Arc<ResolverState>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state,
                install_lock: Mutex::new(()),
                early: AtomicBool::new(false),
                late: AtomicBool::new(false),
                interception_available: AtomicBool::new(false),
                reported: AtomicBool::new(false),
            }),
        }
    }

    /// Shared resolver state
    pub fn resolver(&self) -> &Arc<ResolverState> {
        &self.inner.state
    }

    /// Current state
    pub fn state(&self) -> LifecycleState {
        if !self.inner.early.load(Ordering::Acquire) {
            return LifecycleState::Uninstalled;
        }
        if !self.inner.late.load(Ordering::Acquire) {
            return LifecycleState::PatchInstalled;
        }
        match self.inner.state.readiness() {
            Readiness::Pending => LifecycleState::HookInstalled,
            Readiness::Ready => LifecycleState::Ready,
            Readiness::Degraded => LifecycleState::Degraded,
        }
    }

    /// Whether the identity bypass could be installed
    pub fn interception_available(&self) -> bool {
        self.inner.interception_available.load(Ordering::Acquire)
    }

    /// Early bootstrap extension point: install only the identity bypass.
    ///
    /// A host without an interception point is not an error; the resolver then
    /// only serves requests whose file name matches exactly.
    pub fn on_early_bootstrap(&self, host: &dyn Host) -> Result<(), LifecycleError> {
        let _install = self.inner.install_lock.lock();
        if self.inner.early.load(Ordering::Acquire) {
            return Err(LifecycleError::AlreadyInstalled("identity bypass"));
        }

        let bypass = Arc::new(IdentityBypass::new(Arc::clone(&self.inner.state)));
        let available = match host.register_early(bypass) {
            Ok(()) => {
                info!("Identity check bypass installed");
                true
            }
            Err(e) => {
                warn!(
                    "Identity check bypass unavailable ({}); only exact-name matches will load",
                    e
                );
                false
            }
        };
        self.inner
            .interception_available
            .store(available, Ordering::Release);
        self.inner.early.store(true, Ordering::Release);
        Ok(())
    }

    /// Late bootstrap extension point: install the resolution hook.
    ///
    /// Precondition: the host has finished its own bootstrap-phase module
    /// loading. Rejected if the early phase has not run.
    pub fn on_late_bootstrap(&self, host: &dyn Host) -> Result<(), LifecycleError> {
        let _install = self.inner.install_lock.lock();
        if !self.inner.early.load(Ordering::Acquire) {
            return Err(LifecycleError::OutOfOrder {
                phase: "late bootstrap",
                state: LifecycleState::Uninstalled.as_str(),
            });
        }
        if self.inner.late.load(Ordering::Acquire) {
            return Err(LifecycleError::AlreadyInstalled("resolution hook"));
        }

        host.register_late(Arc::new(ResolutionHook::new(Arc::clone(&self.inner.state))));
        self.inner.late.store(true, Ordering::Release);
        info!("Resolution hook installed");
        Ok(())
    }

    /// "Dependency ready" signal from the secondary loader
    pub fn dependency_ready(&self) -> LifecycleState {
        self.inner.dependency_ready();
        self.state()
    }

    /// Handle the external collaborator can keep and fire later
    pub fn ready_signal(&self) -> ReadySignal {
        ReadySignal {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Log the end-of-run statistics, once
    pub fn shutdown(&self) -> StatsSnapshot {
        if self.inner.reported.swap(true, Ordering::AcqRel) {
            return self.inner.state.snapshot();
        }
        self.inner.state.report()
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state())
            .field("interception_available", &self.interception_available())
            .finish()
    }
}

/// Cloneable trigger for the "dependency ready" signal. Firing after the
/// coordinator is gone does nothing.
#[derive(Clone)]
pub struct ReadySignal {
    inner: Weak<Inner>,
}

impl ReadySignal {
    /// Fire the signal; returns whether a coordinator received it
    pub fn fire(&self) -> bool {
        match self.inner.upgrade() {
            Some(inner) => {
                inner.dependency_ready();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ReadySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadySignal")
            .field("live", &(self.inner.strong_count() > 0))
            .finish()
    }
}
