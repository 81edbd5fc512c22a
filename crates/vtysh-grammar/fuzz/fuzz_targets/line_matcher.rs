#![no_main]

use libfuzzer_sys::fuzz_target;
use vtysh_grammar::{CommandDefinition, Registry, split_for_help, split_line};

const FORMATS: &[&str] = &[
    "show version",
    "show interface IFNAME",
    "ip route A.B.C.D/M (A.B.C.D|INTERFACE) [<1-255>]",
    "ipv6 address X:X::X:X/M",
    "vlan <A:1-4094>",
    "neighbor A.B.C.D {remote-as <1-65535>|weight <0-65535>|description .LINE}",
    "echo .MESSAGE",
];

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let mut reg = Registry::new();
    let Ok(mode) = reg.add_mode("enable", "# ") else {
        return;
    };
    for format in FORMATS {
        if reg.try_install(&["enable"], CommandDefinition::new(format, "", ())).is_err() {
            return;
        }
    }

    // Resolution, help and completion must not panic on any line.
    if let Some(words) = split_line(input) {
        let _ = reg.resolve(mode, &words);
        let _ = reg.resolve_strict(mode, &words);
    }
    let words = split_for_help(input);
    let _ = reg.describe(mode, &words);
    let _ = reg.complete(mode, &words);
});
