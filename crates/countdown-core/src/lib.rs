//! # Countdown Core Library
//!
//! Core logic for a countdown timer widget: the UI layer (terminal, GUI,
//! web view) only paints [`ViewFrame`]s and forwards user intents.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-anchored state machine. Remaining time is
//!   recomputed from `now - anchor` on every frame, so missed or late frames
//!   never skew it; pausing shifts the anchor instead of a counter.
//! - **Formatter**: pure functions from remaining time to readout strings,
//!   percentage and progress-ring fraction.
//! - **Storage**: a small key-value abstraction (SQLite or in-memory), the
//!   recent-configuration history built on it, and TOML settings.
//! - **Session**: glue between a UI surface and the pieces above.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: countdown state machine
//! - [`ConfigurationStore`]: recent configurations and shortcuts
//! - [`format()`]: display strings for a remaining duration
//! - [`CountdownSession`]: intent handling for a UI

pub mod configuration;
pub mod error;
pub mod events;
pub mod format;
pub mod notify;
pub mod session;
pub mod storage;
pub mod timer;

pub use configuration::{Configuration, TimeUnit};
pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use format::{format, DisplayStrings};
pub use notify::{CompletionNotifier, RecordingNotifier};
pub use session::{CountdownSession, SessionOptions, ViewFrame};
pub use storage::{
    AppConfig, ConfigurationStore, HistoryEntry, KeyValueStore, MemoryStore, SqliteStore,
};
pub use timer::{
    Clock, FrameHandle, FrameQueue, ManualClock, RefreshPolicy, Scheduler, Snapshot, SystemClock,
    Tick, TimerEngine, TimerState,
};
