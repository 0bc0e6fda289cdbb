//! CSV rows on stdout.
//!
//! Every row starts with `datetimestamp_utc`. The remaining columns come from
//! field sets in order, with sequences flattened into consecutive columns.

use crate::fields::expand_field_name;
use crate::timestamp::format_utc;
use crate::value::{FieldSet, FieldValue};

/// Name of the leading timestamp column.
pub const TIMESTAMP_COLUMN: &str = "datetimestamp_utc";

/// Header line for the given (possibly bracketed) field names.
pub fn header<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    let mut columns = vec![TIMESTAMP_COLUMN.to_string()];
    for name in names {
        columns.extend(expand_field_name(name, None));
    }
    columns.join(",")
}

/// Data line: the formatted timestamp followed by every value of `sets`.
pub fn row(timestamp_secs: u64, sets: &[&FieldSet]) -> String {
    let mut cells = vec![format_utc(timestamp_secs)];
    for set in sets {
        for (_, value) in set.iter() {
            push_cells(&mut cells, value);
        }
    }
    cells.join(",")
}

fn push_cells(cells: &mut Vec<String>, value: &FieldValue) {
    match value {
        FieldValue::Seq(items) => {
            for item in items {
                push_cells(cells, item);
            }
        }
        FieldValue::Text(text) => cells.push(quote(text)),
        other => cells.push(other.to_string()),
    }
}

fn quote(text: &str) -> String {
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::history_ping_field_names;

    #[test]
    fn test_header_expands_sequences() {
        let names = history_ping_field_names();
        let line = header(names.general.iter().chain(&names.run_length));
        let cols: Vec<&str> = line.split(',').collect();
        assert_eq!(cols[0], "datetimestamp_utc");
        assert_eq!(cols[1], "samples");
        assert_eq!(cols[3], "init_run_fragment");
        assert_eq!(cols[5], "run_seconds_1");
        assert_eq!(cols.len(), 1 + 2 + 2 + 60 + 60);
    }

    #[test]
    fn test_row_flattens_and_formats() {
        let set = FieldSet::new()
            .with("samples", 3u64)
            .with("rate", 0.5)
            .with("latency", None::<f64>)
            .with("flag", true)
            .with("cells", vec![1u64, 2, 3]);
        assert_eq!(row(0, &[&set]), "1970-01-01T00:00:00,3,0.5,,true,1,2,3");
    }

    #[test]
    fn test_row_concatenates_sets() {
        let a = FieldSet::new().with("a", 1u64);
        let b = FieldSet::new().with("b", "x");
        assert_eq!(row(60, &[&a, &b]), "1970-01-01T00:01:00,1,x");
    }

    #[test]
    fn test_text_quoting() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
