#![no_main]

use gcode_reorder::classifier::classify_lines;
use gcode_reorder::reassembler::reassemble_sections;
use libfuzzer_sys::fuzz_target;
use std::panic::AssertUnwindSafe;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| classify_lines(content)));

        if let Ok(classification) = result {
            let line_count = content.split('\n').count();

            assert_eq!(classification.stats.lines, line_count, "line count mismatch");
            assert!(
                classification.buckets.total_lines() + classification.stats.discarded()
                    == line_count,
                "every line must be bucketed or discarded"
            );

            let sections = classification.into_sections();
            let output = reassemble_sections(&sections);
            assert!(
                output.len() <= content.len() + 8,
                "reassembly must not invent content"
            );
        }
    }
});
