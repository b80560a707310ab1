#![no_main]
use libfuzzer_sys::fuzz_target;
use repokit::docstore::{compare_docs, eval_predicate, parse_filter_json};

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok((filter, predicate)) = parse_filter_json(s) {
            let docs = [
                bson::doc! {"age": 18, "name": "John"},
                bson::doc! {"age": 25.5, "name": null, "address": {"city": "Berlin"}},
                bson::doc! {"active": true},
            ];
            for d in &docs {
                let _ = eval_predicate(d, &predicate);
                // Reuse the fuzzed document as a sort document too
                let _ = compare_docs(d, &docs[0], &filter);
            }
        }
    }
});
