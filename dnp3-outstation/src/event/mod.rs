// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! The bounded sequence-of-events buffer: arena storage, counting,
//! configuration, record shape, and the buffer itself.

pub mod arena;
pub mod buffer;
pub mod config;
pub mod count;
pub mod record;
pub mod types;

pub use arena::{Arena, ArenaIndex};
pub use buffer::EventBuffer;
pub use config::EventBufferConfig;
pub use count::EventCount;
pub use record::SoeRecord;
pub use types::{ClassField, EventClass, EventType, EventValue, EventVariation};
