// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Per-function-code request handlers. Each module decodes one function
//! code's object headers and drives the relevant collaborator trait(s);
//! sequencing, response assembly, and IIN bookkeeping stay in
//! [`crate::context`].

pub mod assign_class;
pub mod control;
pub mod delay_measure;
pub mod read;
pub mod restart;
pub mod unsol_control;
pub mod write;

pub use assign_class::handle_assign_class;
pub use control::{decode_control_objects, operate_all, select_all, write_command_responses};
pub use delay_measure::delay_measure_object;
pub use read::handle_read;
pub use restart::{handle_cold_restart, handle_warm_restart};
pub use unsol_control::decode_requested_classes;
pub use write::{handle_write, WriteOutcome};
