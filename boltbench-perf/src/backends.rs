//! The pair of stores a benchmark compares.

use std::fmt;

use boltbench_service::{Backend, BoxedBackend};

/// One of the two compared stores.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Target {
    /// The baseline object store.
    Baseline,
    /// The caching proxy in front of the baseline store.
    Proxy,
}

impl Target {
    /// Both targets, in the order they are benchmarked.
    pub const BOTH: [Target; 2] = [Target::Baseline, Target::Proxy];

    /// The label used as prefix of statistic names.
    pub fn label(self) -> &'static str {
        match self {
            Target::Baseline => "s3",
            Target::Proxy => "bolt",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Handles to the baseline store and the proxy.
#[derive(Debug)]
pub struct Backends {
    baseline: BoxedBackend,
    proxy: BoxedBackend,
}

impl Backends {
    /// Creates a new pair from a baseline store and its proxy.
    pub fn new(baseline: BoxedBackend, proxy: BoxedBackend) -> Self {
        Self { baseline, proxy }
    }

    /// Returns the backend for the given target.
    pub fn get(&self, target: Target) -> &dyn Backend {
        match target {
            Target::Baseline => self.baseline.as_ref(),
            Target::Proxy => self.proxy.as_ref(),
        }
    }

    /// The baseline store.
    pub fn baseline(&self) -> &dyn Backend {
        self.get(Target::Baseline)
    }

    /// The proxy.
    pub fn proxy(&self) -> &dyn Backend {
        self.get(Target::Proxy)
    }
}
