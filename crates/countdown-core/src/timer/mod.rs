mod clock;
mod engine;
mod frame;
mod refresh;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Snapshot, Tick, TimerEngine, TimerState};
pub use frame::{FrameHandle, FrameQueue, Scheduler};
pub use refresh::{RefreshPolicy, DEFAULT_FRAME_INTERVAL, DEFAULT_HIGH_FREQUENCY_BELOW};
