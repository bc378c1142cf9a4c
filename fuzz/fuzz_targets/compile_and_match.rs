#![no_main]
use libfuzzer_sys::fuzz_target;
use signpost::{Matcher, Params, RouteEntry, RouteTable, Target};

fuzz_target!(|data: (Vec<String>, String)| {
    let mut table = RouteTable::new();

    for (i, pattern) in data.0.iter().enumerate() {
        let entry = RouteEntry::new(
            format!("route-{}", i),
            &[http::Method::GET],
            pattern.clone(),
            Target::new("Fuzz", format!("handler{}", i)),
        );
        if table.register(entry).is_err() {
            return;
        }
    }

    let _ = Matcher::new(&table).lookup(&http::Method::GET, &data.1, &Params::new());
});
