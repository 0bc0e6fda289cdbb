//! `dishstat bulk`: every sample in the window, one CSV row each.

use dishstat_core::output::csv;
use dishstat_core::timestamp::unix_now;
use dishstat_core::{DishClient, FieldSet, SampleCount, history_bulk_field_names, resolve};

use super::{fail, make_source};

pub fn run(
    json: Option<&str>,
    target: &str,
    samples: SampleCount,
    start: Option<u64>,
    header: bool,
) {
    let names = history_bulk_field_names();
    if header {
        // Per-sample rows hold scalars, so the bracket suffixes are dropped.
        let counter = "counter".to_string();
        let columns: Vec<String> = std::iter::once(counter)
            .chain(names.bulk.iter().map(|f| f.trim_end_matches("[]").to_string()))
            .collect();
        println!("{}", csv::header(&columns));
        return;
    }

    let now = unix_now();
    let mut client = DishClient::new(make_source(json, target));
    let history = client
        .history()
        .unwrap_or_else(|e| fail("failure getting history", e));

    let window = resolve(history.capacity(), history.current, samples, start);
    let bulk = history.bulk(&window);
    log::info!(
        "{} samples, end_counter {}",
        bulk.general.samples,
        bulk.general.end_counter
    );

    // The newest sample is taken as "now"; older ones step back a second each.
    let end = bulk.general.end_counter;
    for (counter, fields) in bulk.rows() {
        let timestamp = now.saturating_sub(end - counter);
        let counter_field = FieldSet::new().with("counter", counter);
        println!("{}", csv::row(timestamp, &[&counter_field, &fields]));
    }
}
