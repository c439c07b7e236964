/// Device statistics: live resource counts and per-frame work counters

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Kind of device object counted by `ResourceCounters`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
    SamplerState,
    Program,
    PipelineState,
}

impl ResourceKind {
    const COUNT: usize = 5;

    const fn index(self) -> usize {
        self as usize
    }
}

/// Shared live-object counters of one device
///
/// Each wrapper holds a `ResourceTicket`; dropping the wrapper drops the
/// ticket and the count goes down, whichever thread releases it.
#[derive(Debug, Clone, Default)]
pub struct ResourceCounters {
    counts: Arc<[AtomicUsize; ResourceKind::COUNT]>,
}

impl ResourceCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a new object of `kind`
    pub fn track(&self, kind: ResourceKind) -> ResourceTicket {
        self.counts[kind.index()].fetch_add(1, Ordering::Relaxed);
        ResourceTicket {
            counters: self.clone(),
            kind,
        }
    }

    /// Number of live objects of `kind`
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.counts[kind.index()].load(Ordering::Relaxed)
    }
}

/// Keeps one object counted while alive
#[derive(Debug)]
pub struct ResourceTicket {
    counters: ResourceCounters,
    kind: ResourceKind,
}

impl ResourceTicket {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl Drop for ResourceTicket {
    fn drop(&mut self) {
        self.counters.counts[self.kind.index()].fetch_sub(1, Ordering::Relaxed);
    }
}

/// Work issued on a context since the last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameCounters {
    pub draw_calls: u32,
    pub dispatch_calls: u32,
    pub command_lists: u32,
}

impl FrameCounters {
    /// Take the current values and start over
    pub fn take(&mut self) -> FrameCounters {
        std::mem::take(self)
    }
}

/// Snapshot returned by `Device::stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStats {
    /// Counters of the last presented frame
    pub last_frame: FrameCounters,
    /// Counters of the frame being recorded
    pub current_frame: FrameCounters,
    /// Frames presented so far
    pub frames_presented: u64,
    pub buffers: usize,
    pub textures: usize,
    pub sampler_states: usize,
    pub programs: usize,
    pub pipeline_states: usize,
}

impl DeviceStats {
    /// Fill the live-object counts from `counters`
    pub fn with_counts(mut self, counters: &ResourceCounters) -> Self {
        self.buffers = counters.count(ResourceKind::Buffer);
        self.textures = counters.count(ResourceKind::Texture);
        self.sampler_states = counters.count(ResourceKind::SamplerState);
        self.programs = counters.count(ResourceKind::Program);
        self.pipeline_states = counters.count(ResourceKind::PipelineState);
        self
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
