//! Fuzz target for COCO JSON parsing.
//!
//! Feeds arbitrary bytes to the annotation store loader. Only panics,
//! crashes and hangs count as failures; parse errors are expected.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use retinakit::ir::io_coco_json::from_coco_slice;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for annotation files.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_coco_slice(data);
});
