//! `dishstat ping-stats`: packet-loss summary over recent history.

use dishstat_core::output::csv;
use dishstat_core::timestamp::unix_now;
use dishstat_core::{
    DishClient, GeneralStats, PingDropStats, RunLengthStats, SampleCount, aggregate,
    history_ping_field_names, resolve,
};

use super::{fail, make_source};

pub struct PingStatsConfig<'a> {
    pub json: Option<&'a str>,
    pub target: &'a str,
    pub samples: SampleCount,
    pub run_lengths: bool,
    pub header: bool,
    pub verbose: bool,
}

pub fn run(config: PingStatsConfig<'_>) {
    if config.header {
        let names = history_ping_field_names();
        let mut columns: Vec<&String> = names.general.iter().chain(&names.ping_drop).collect();
        if config.run_lengths {
            columns.extend(&names.run_length);
        }
        println!("{}", csv::header(columns));
        return;
    }

    let timestamp = unix_now();
    let mut client = DishClient::new(make_source(config.json, config.target));
    let history = client
        .history()
        .unwrap_or_else(|e| fail("failure getting ping stats", e));

    let window = resolve(history.capacity(), history.current, config.samples, None);
    let general = GeneralStats::from_window(&window);
    let (drop, runs) = aggregate(&history, &window);

    if config.verbose {
        print_report(&general, &drop, config.run_lengths.then_some(&runs));
        return;
    }

    let general_fields = general.fields();
    let drop_fields = drop.fields();
    let run_fields = runs.fields();
    let mut sets = vec![&general_fields, &drop_fields];
    if config.run_lengths {
        sets.push(&run_fields);
    }
    println!("{}", csv::row(timestamp, &sets));
}

fn print_report(general: &GeneralStats, drop: &PingDropStats, runs: Option<&RunLengthStats>) {
    println!("Parsed samples:        {}", general.samples);
    println!("Total ping drop:       {}", drop.total_ping_drop);
    println!("Count of drop == 1:    {}", drop.count_full_ping_drop);
    println!("Obstructed:            {}", drop.count_obstructed);
    println!("Obstructed ping drop:  {}", drop.total_obstructed_ping_drop);
    println!("Obstructed drop == 1:  {}", drop.count_full_obstructed_ping_drop);
    println!("Unscheduled:           {}", drop.count_unscheduled);
    println!("Unscheduled ping drop: {}", drop.total_unscheduled_ping_drop);
    println!("Unscheduled drop == 1: {}", drop.count_full_unscheduled_ping_drop);
    if let Some(runs) = runs {
        println!("Initial drop run fragment: {}", runs.init_run_fragment);
        println!("Final drop run fragment:   {}", runs.final_run_fragment);
        println!("Per-second drop runs:  {}", join(&runs.run_seconds));
        println!("Per-minute drop runs:  {}", join(&runs.run_minutes));
    }
}

fn join(cells: &[u64]) -> String {
    cells
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
