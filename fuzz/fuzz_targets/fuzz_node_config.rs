//! Fuzz target: `NodeConfig::from_json`
//!
//! Arbitrary text must either be rejected or yield a configuration that
//! passes validation and produces well-formed topics.
//!
//! cargo fuzz run fuzz_node_config

#![no_main]

use heartlink::config::NodeConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = NodeConfig::from_json(text) {
        assert!(config.validate().is_ok());
        assert!(config.subscribe_topic().ends_with("/heartbeat"));
        assert_ne!(config.subscribe_topic(), config.publish_topic());
    }
});
