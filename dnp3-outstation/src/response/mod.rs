// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Response-cycle bookkeeping: repeat-request history, deferred fragments,
//! the SELECT/OPERATE table, and multi-fragment session tracking.

pub mod deferred;
pub mod history;
pub mod select;
pub mod session;

pub use deferred::DeferredRequest;
pub use history::ResponseHistory;
pub use select::SelectTable;
pub use session::ResponseSession;
