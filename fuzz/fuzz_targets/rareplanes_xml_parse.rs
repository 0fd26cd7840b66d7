//! Fuzz target for RarePlanes XML label parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the XML label parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use retinakit::convert::from_rareplanes_xml_slice;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_rareplanes_xml_slice(data);
});
