//! Formula text builders.
//!
//! Every function returns formula text without the leading `=`; sheet
//! builders add it when writing the cell. Nothing here is evaluated: the
//! strings are only valid once a spreadsheet application recalculates them.

use churnbook_core::RawRange;

/// A string literal in formula syntax, with embedded quotes doubled
pub fn text(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// `COUNTA(range)`
pub fn count_a(range: &RawRange) -> String {
    format!("COUNTA({range})")
}

/// `COUNTIF(range,"value")`
pub fn count_if(range: &RawRange, value: &str) -> String {
    format!("COUNTIF({range},{})", text(value))
}

/// `COUNTIFS(r1,c1,r2,c2,...)`; criteria are formula expressions
pub fn count_ifs(criteria: &[(&RawRange, String)]) -> String {
    format!("COUNTIFS({})", criteria_list(criteria))
}

/// `SUM(range)`
pub fn sum(range: &RawRange) -> String {
    format!("SUM({range})")
}

/// `SUMIF(criteria_range,"value",sum_range)`
pub fn sum_if(criteria_range: &RawRange, value: &str, sum_range: &RawRange) -> String {
    format!("SUMIF({criteria_range},{},{sum_range})", text(value))
}

/// `SUMIFS(sum_range,r1,c1,...)`
pub fn sum_ifs(sum_range: &RawRange, criteria: &[(&RawRange, String)]) -> String {
    format!("SUMIFS({sum_range},{})", criteria_list(criteria))
}

/// `AVERAGE(range)`
pub fn average(range: &RawRange) -> String {
    format!("AVERAGE({range})")
}

/// `AVERAGEIF(criteria_range,"value",average_range)`
pub fn average_if(criteria_range: &RawRange, value: &str, average_range: &RawRange) -> String {
    format!("AVERAGEIF({criteria_range},{},{average_range})", text(value))
}

/// `numerator/denominator`, yielding 0 when the denominator is 0
pub fn guarded_ratio(numerator: &str, denominator: &str) -> String {
    format!("IF({denominator}=0,0,{numerator}/{denominator})")
}

/// Criterion comparing against another cell, e.g. `">="&B4`
pub fn compare_cell(operator: &str, cell: &str) -> String {
    format!("{}&{cell}", text(operator))
}

fn criteria_list(criteria: &[(&RawRange, String)]) -> String {
    criteria
        .iter()
        .map(|(range, criterion)| format!("{range},{criterion}"))
        .collect::<Vec<_>>()
        .join(",")
}
