// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! COLD_RESTART/WARM_RESTART handling (spec.md §4.8).

use crate::collaborators::{OutstationApplication, RestartDelay};

/// Group 52 variation and 16-bit value to report for a restart delay.
#[must_use]
pub fn restart_response_object(delay: RestartDelay) -> (u8, u16) {
    match delay {
        RestartDelay::Seconds(s) => (1, s),
        RestartDelay::Milliseconds(ms) => (2, ms),
    }
}

/// Handles COLD_RESTART, returning the delay object to report, or `None`
/// if the application does not support cold restart (the request is then
/// answered with `IinBit::FuncNotSupported`).
pub fn handle_cold_restart(app: &mut dyn OutstationApplication) -> Option<(u8, u16)> {
    app.cold_restart().map(restart_response_object)
}

/// Handles WARM_RESTART, as [`handle_cold_restart`].
pub fn handle_warm_restart(app: &mut dyn OutstationApplication) -> Option<(u8, u16)> {
    app.warm_restart().map(restart_response_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MonotonicTimestamp;

    struct FakeApp(Option<RestartDelay>);
    impl OutstationApplication for FakeApp {
        fn cold_restart(&mut self) -> Option<RestartDelay> { self.0 }
        fn warm_restart(&mut self) -> Option<RestartDelay> { self.0 }
        fn write_absolute_time(&mut self, _: MonotonicTimestamp) {}
    }

    #[test]
    fn coarse_delay_maps_to_variation_one() {
        assert_eq!(restart_response_object(RestartDelay::Seconds(30)), (1, 30));
    }

    #[test]
    fn fine_delay_maps_to_variation_two() {
        assert_eq!(restart_response_object(RestartDelay::Milliseconds(500)), (2, 500));
    }

    #[test]
    fn unsupported_restart_returns_none() {
        let mut app = FakeApp(None);
        assert_eq!(handle_cold_restart(&mut app), None);
    }
}
