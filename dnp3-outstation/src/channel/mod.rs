// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Solicited and unsolicited response channels: sequence tracking and the
//! confirm/retry state machines each drives.

pub mod sequence;
pub mod solicited;
pub mod unsolicited;

pub use sequence::SequenceInfo;
pub use solicited::SolicitedChannel;
pub use unsolicited::{TimeoutOutcome, UnsolicitedChannel};
