// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! The executor/timer strand: a single serialized thread of control over a
//! multi-threaded tokio runtime (spec.md §3 "Executor & Timer Strand").

pub mod strand;
pub mod timer;

pub use strand::Strand;
pub use timer::{TimerHandle, TimerId};
