//! # gather-engine
//!
//! Group availability engine: given every group member's busy intervals
//! (manual time slots plus synced calendar events) and per-member sleep
//! windows, compute the maximal time windows during a day when enough members
//! are simultaneously free.
//!
//! The solver is a pure, synchronous sweep over normalized UTC intervals;
//! persistence and membership lookups live behind injected traits so the core
//! stays free of storage dependencies.
//!
//! ## Modules
//!
//! - [`interval`] — interval model, timezone-anchored day bounds, merging
//! - [`solver`] — the shared-free-window sweep
//! - [`aggregator`] — orchestration: fetch → normalize → solve → persist
//! - [`policy`] — eligibility gate (member count, membership)
//! - [`store`] — in-memory reference stores for tests and the CLI
//! - [`error`] — error types
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use gather_engine::{
//!     AvailabilityEngine, BusyInterval, EngineConfig, MemoryMemberData, MemoryWindowStore,
//! };
//! use uuid::Uuid;
//!
//! let group = Uuid::new_v4();
//! let (ana, ben) = (Uuid::new_v4(), Uuid::new_v4());
//! let data = MemoryMemberData::new()
//!     .with_group(group, &[ana, ben])
//!     .with_busy([BusyInterval {
//!         owner: ana,
//!         start: "2026-03-16T09:00:00Z".parse().unwrap(),
//!         end: "2026-03-16T10:00:00Z".parse().unwrap(),
//!     }]);
//!
//! let engine = AvailabilityEngine::new(EngineConfig::default(), data, MemoryWindowStore::new());
//! let day = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
//! engine.recalculate(group, day).unwrap();
//!
//! let windows = engine.group_availability(group, day, ana).unwrap();
//! assert_eq!(windows.len(), 2); // before and after Ana's meeting
//! ```

pub mod aggregator;
pub mod error;
pub mod interval;
pub mod policy;
pub mod solver;
pub mod store;

pub use aggregator::{
    AvailabilityEngine, AvailabilityWindow, EngineConfig, MemberData, WindowStore,
};
pub use error::{BoxError, EngineError, Result};
pub use interval::{BusyInterval, GroupId, MemberId, SleepWindow, TimeSpan};
pub use policy::{PolicyViolation, DEFAULT_MIN_MEMBERS};
pub use solver::{solve_day, MemberFreeSet, WindowCandidate};
pub use store::{MemoryMemberData, MemoryWindowStore};
