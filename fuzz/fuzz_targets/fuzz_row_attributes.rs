#![no_main]

use std::collections::BTreeMap;

use libfuzzer_sys::fuzz_target;
use tabledrag::{AttributesConnector, build_sequence, is_dense, parse_rows};

fuzz_target!(|data: &[u8]| {
    // Lines are rows; `key=value` pairs are separated by ';'.
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let rows: Vec<BTreeMap<String, String>> = text
        .lines()
        .take(64)
        .map(|line| {
            line.split(';')
                .filter_map(|pair| pair.split_once('='))
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .collect()
        })
        .collect();

    let Ok(specs) = parse_rows(&AttributesConnector::default(), &rows) else {
        return;
    };
    if let Ok(sequence) = build_sequence(specs) {
        assert_eq!(sequence.len(), rows.len());
        assert!(is_dense(&sequence));
        if let Some(first) = sequence.nodes().first() {
            assert_eq!(first.depth(), 0);
        }
    }
});
