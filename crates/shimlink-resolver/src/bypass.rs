// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Identity-check bypass
//!
//! After the hook hands back a module, the host re-checks that the module's
//! declared name equals the requested one. A module found through the
//! discovered map or the alias table fails that check by construction, so
//! for exactly those pairs the check is forced to pass. Every other pair is
//! left to the host's original validation.

use crate::host::{IdentityInterceptor, ModuleIdentity, ModuleRequest, Verdict};
use crate::resolver::ResolverState;
use std::sync::Arc;
use tracing::debug;

/// Interceptor installed at the early bootstrap extension point
#[derive(Debug, Clone)]
pub struct IdentityBypass {
    state: Arc<ResolverState>,
}

impl IdentityBypass {
    /// Bypass vouching for pairs `state` recognizes
    pub fn new(state: Arc<ResolverState>) -> Self {
        Self { state }
    }
}

impl IdentityInterceptor for IdentityBypass {
    fn check(&self, candidate: &ModuleIdentity, requested: &ModuleRequest) -> Verdict {
        if !self.state.recognizes_alias(&candidate.name, &requested.name) {
            return Verdict::Defer;
        }

        self.state.stats().inc_bypassed();
        debug!(
            "Accepting '{}' for request '{}'",
            candidate.name, requested.name
        );
        Verdict::ForcePass
    }
}
