#![no_main]

use libfuzzer_sys::fuzz_target;
use vtquery_core::DisabledTables;

fuzz_target!(|data: &[u8]| {
    if let Ok(list) = std::str::from_utf8(data) {
        let disabled = DisabledTables::parse(list);

        // Every entry is trimmed, non-empty and a member
        for name in disabled.iter() {
            assert!(!name.is_empty());
            assert_eq!(name, name.trim());
            assert!(disabled.contains(name));
        }
        assert!(disabled.len() <= list.split(',').count());
    }
});
