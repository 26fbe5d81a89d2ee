// SPDX-License-Identifier: MIT
// Copyright (c) 2026 agent-runner contributors

//! Concurrency gate: global budget plus per-service limiters in series.
//!
//! Tokens are cooperative. A dispatched run holds its permit until the
//! child exits (or crash recovery reaps it on a later cycle — permits die
//! with the process, records are what survive).

use ar_core::{ServiceKind, ServiceLimits};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Clone)]
pub struct ConcurrencyGate {
    global: Arc<Semaphore>,
    per_service: HashMap<ServiceKind, Arc<Semaphore>>,
}

/// A held slot: one global token plus one service token.
pub struct RunPermit {
    _global: OwnedSemaphorePermit,
    _service: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    pub fn new(global: usize, limits: &ServiceLimits) -> Self {
        let cap = |n: usize| Arc::new(Semaphore::new(n.max(1)));
        let per_service = HashMap::from([
            (ServiceKind::Codex, cap(limits.codex)),
            (ServiceKind::Copilot, cap(limits.copilot)),
            (ServiceKind::Gemini, cap(limits.gemini)),
            (ServiceKind::AmazonQ, cap(limits.amazon_q)),
            (ServiceKind::Claude, cap(limits.claude)),
        ]);
        Self { global: Arc::new(Semaphore::new(global.max(1))), per_service }
    }

    /// Try to take a slot for `service` without waiting.
    pub fn try_acquire(&self, service: ServiceKind) -> Option<RunPermit> {
        let global = self.global.clone().try_acquire_owned().ok()?;
        let semaphore = self.per_service.get(&service)?.clone();
        let service_permit = semaphore.try_acquire_owned().ok()?;
        Some(RunPermit { _global: global, _service: service_permit })
    }

    pub fn available_global(&self) -> usize {
        self.global.available_permits()
    }
}

#[cfg(test)]
#[path = "limiter_tests.rs"]
mod tests;
