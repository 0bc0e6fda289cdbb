//! `dishstat status`: current status as one CSV row.

use dishstat_core::output::csv;
use dishstat_core::timestamp::unix_now;
use dishstat_core::{DishClient, status_data, status_field_names};

use super::{fail, make_source};

pub fn run(json: Option<&str>, target: &str, header: bool) {
    if header {
        let names = status_field_names();
        let columns = names
            .general
            .iter()
            .chain(&names.obstruction)
            .chain(&names.alerts);
        println!("{}", csv::header(columns));
        return;
    }

    let timestamp = unix_now();
    let mut client = DishClient::new(make_source(json, target));
    let status = client
        .status()
        .unwrap_or_else(|e| fail("failure getting status", e));

    let data = status_data(&status);
    println!(
        "{}",
        csv::row(timestamp, &[&data.general, &data.obstruction, &data.alerts])
    );
}
