// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Outstation configuration (spec.md §3 "OutstationParams"), grounded on
//! `original_source/cpp/libs/src/opendnp3/outstation/OutstationParams.cpp`.

use std::time::Duration;

use serde::Deserialize;

use crate::event::{ClassField, EventBufferConfig};

/// How point indexes are reported in static (non-event) object headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// Indexes are included in every object (qualifier 0x00/0x01/0x17/0x28).
    AlwaysInclude,
    /// Indexes are omitted whenever the object range is contiguous.
    AllowOmission,
}

impl Default for IndexMode {
    fn default() -> Self { Self::AlwaysInclude }
}

/// All tunable outstation behavior, deserializable from an embedder's
/// configuration file (spec.md "AMBIENT STACK: configuration").
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutstationConfig {
    /// Index reporting strategy.
    pub index_mode: IndexMode,
    /// Maximum number of control objects accepted in a single
    /// SELECT/OPERATE/DIRECT_OPERATE request before rejecting with
    /// `CommandStatus::FormatError`.
    pub max_controls_per_request: u16,
    /// How long a SELECT remains valid for a following OPERATE.
    #[serde(with = "duration_millis")]
    pub select_timeout: Duration,
    /// How long a solicited response waits for CONFIRM before the channel
    /// is considered to have NACKed it.
    #[serde(with = "duration_millis")]
    pub sol_confirm_timeout: Duration,
    /// How long an unsolicited response waits for CONFIRM.
    #[serde(with = "duration_millis")]
    pub unsol_confirm_timeout: Duration,
    /// Delay before retrying an unconfirmed unsolicited response.
    #[serde(with = "duration_millis")]
    pub unsol_retry_timeout: Duration,
    /// Largest application fragment this outstation will transmit.
    pub max_tx_frag_size: u16,
    /// Largest application fragment this outstation will accept.
    pub max_rx_frag_size: u16,
    /// Whether unsolicited reporting is permitted at all; still subject to
    /// the master ENABLE_UNSOLICITED handshake (spec.md §4.4).
    pub allow_unsolicited: bool,
    /// Whether a repeated identical request (spec.md §4.6) is answered
    /// from the retained last-response instead of re-executing.
    pub ignore_repeat_reads: bool,
    /// Classes included when the master requests "Class 0" static data.
    pub types_allowed_in_class0: ClassField,
    /// Classes this outstation will report via unsolicited responses.
    pub unsol_class_mask: ClassField,
    /// Per-type SOE buffer capacities.
    pub event_buffer_config: EventBufferConfig,
}

impl Default for OutstationConfig {
    fn default() -> Self {
        Self {
            index_mode: IndexMode::default(),
            max_controls_per_request: 64,
            select_timeout: Duration::from_secs(10),
            sol_confirm_timeout: Duration::from_secs(5),
            unsol_confirm_timeout: Duration::from_secs(5),
            unsol_retry_timeout: Duration::from_secs(5),
            max_tx_frag_size: 2048,
            max_rx_frag_size: 2048,
            allow_unsolicited: true,
            ignore_repeat_reads: true,
            types_allowed_in_class0: ClassField::none(),
            unsol_class_mask: ClassField::all(),
            event_buffer_config: EventBufferConfig::none(),
        }
    }
}

/// Alias kept for parity with the original's `OutstationParams` naming;
/// this crate treats configuration and parameters as the same thing.
pub type OutstationParams = OutstationConfig;

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        (value.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_internally_consistent() {
        let config = OutstationConfig::default();
        assert!(config.allow_unsolicited);
        assert!(config.max_rx_frag_size > 0);
        assert_eq!(config.select_timeout, Duration::from_secs(10));
    }

    #[test]
    fn deserializes_from_partial_toml() {
        let toml = r#"
            max_controls_per_request = 8
            allow_unsolicited = false
        "#;
        let config: OutstationConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_controls_per_request, 8);
        assert!(!config.allow_unsolicited);
        assert_eq!(config.select_timeout, Duration::from_secs(10));
    }
}
