#![no_main]

use libfuzzer_sys::fuzz_target;
use vtysh_grammar::{DynHelpTable, compile};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Must report malformed formats as errors, never panic.
        let (format, help) = input.split_once('\0').unwrap_or((input, ""));
        let _tree = compile(format, help, "", &DynHelpTable::new());
    }
});
