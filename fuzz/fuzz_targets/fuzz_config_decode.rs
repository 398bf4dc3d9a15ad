//! Fuzz target: `SystemConfig::decode`
//!
//! Feeds arbitrary bytes to the postcard config decoder and verifies:
//! - No panics under arbitrary byte inputs
//! - Anything that decodes also passes `validate()`
//! - A decoded config re-encodes and decodes to the same value
//!
//! cargo fuzz run fuzz_config_decode

#![no_main]

use geekhouse::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = SystemConfig::decode(data) else {
        return;
    };
    assert!(cfg.validate().is_ok(), "decode returned an invalid config");

    let bytes = cfg.encode().expect("valid config must encode");
    let again = SystemConfig::decode(&bytes).expect("re-encoded config must decode");
    // NaN calibration coefficients compare unequal; compare the bytes instead.
    assert_eq!(again.encode().expect("encode"), bytes);
});
