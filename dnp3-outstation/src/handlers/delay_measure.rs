// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! DELAY_MEASURE handling (spec.md §4.8): reports how long this
//! outstation took to process the request, as Group 52.
//!
//! The round-trip measurement itself depends on when the request was
//! received and when the response is about to be sent - both timestamps
//! the strand, not this handler, observes - so this module only carries
//! the (tiny) conversion from an elapsed duration to the wire object.

use crate::collaborators::RestartDelay;

/// Converts a measured processing delay into the Group 52 object to
/// report. Uses the coarse (Variation 1, whole seconds) encoding unless
/// the delay is sub-second, matching typical outstation practice of
/// preferring the fine encoding only when it would otherwise round to
/// zero.
#[must_use]
pub fn delay_measure_object(elapsed_ms: u64) -> RestartDelay {
    if elapsed_ms >= 1_000 {
        RestartDelay::Seconds((elapsed_ms / 1_000).min(u64::from(u16::MAX)) as u16)
    } else {
        RestartDelay::Milliseconds(elapsed_ms.min(u64::from(u16::MAX)) as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_second_delay_uses_fine_encoding() {
        assert_eq!(delay_measure_object(250), RestartDelay::Milliseconds(250));
    }

    #[test]
    fn whole_second_delay_uses_coarse_encoding() {
        assert_eq!(delay_measure_object(3_000), RestartDelay::Seconds(3));
    }
}
