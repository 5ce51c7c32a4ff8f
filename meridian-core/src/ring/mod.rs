//! The event ring (§4.1): a fixed-capacity array of reusable event slots
//! shared by multiple producers and a linear chain of consumer stages.

mod buffer;
mod event;
mod wait;

pub use buffer::RingBuffer;
pub use event::{EventPayload, EventSlot};
pub use wait::WaitStrategy;

/// Default ring capacity (§6): a power of two.
pub const DEFAULT_CAPACITY: usize = 65_536;

/// The fixed three-stage consumer chain (§2, §4.1).
pub const STAGE_ORDER: HandlerStage = HandlerStage::Order;
pub const STAGE_POSITION: HandlerStage = HandlerStage::Position;
pub const STAGE_METRICS: HandlerStage = HandlerStage::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerStage {
    Order = 0,
    Position = 1,
    Metrics = 2,
}

impl HandlerStage {
    pub fn index(self) -> usize {
        self as usize
    }
}
