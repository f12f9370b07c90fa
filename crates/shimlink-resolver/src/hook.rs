// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Handler subscribed to the host's failed-resolution notification

use crate::host::{ModuleHandle, ModuleRequest, ResolvingHandler};
use crate::resolver::ResolverState;
use std::sync::Arc;

/// Resolution hook handed to [`Host::register_late`](crate::host::Host::register_late)
#[derive(Debug, Clone)]
pub struct ResolutionHook {
    state: Arc<ResolverState>,
}

impl ResolutionHook {
    /// Hook serving requests from `state`
    pub fn new(state: Arc<ResolverState>) -> Self {
        Self { state }
    }
}

impl ResolvingHandler for ResolutionHook {
    fn resolve(&self, request: &ModuleRequest) -> Option<ModuleHandle> {
        self.state.resolve(request)
    }
}
