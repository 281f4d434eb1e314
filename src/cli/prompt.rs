//! Interactive prompts
//!
//! Selection is asked level by level. Each prompt lists the values left by
//! the choices already made, and a value that is not listed is asked again.

use std::io::{self, BufRead, Write};

use crate::app::models::StreamRecord;
use crate::app::selection::{parse_tokens, Level, SelectionCriteria, SelectionOptions, TimeBounds};
use crate::errors::{AppError, Result};

/// Ask for a selection at every level, narrowing as the user goes
///
/// Pressing enter at a level keeps all of its values.
pub fn prompt_selection(records: &[StreamRecord]) -> Result<SelectionCriteria> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    select_levels(records, &mut input, &mut io::stdout())
}

/// Ask for the begin and end of the requested data
pub fn prompt_time_bounds() -> Result<TimeBounds> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    ask_time_bounds(&mut input, &mut io::stdout())
}

/// Ask a yes/no question; anything but "y" or "yes" is a no
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let answer = ask(&mut input, &mut io::stdout(), &format!("{} y/<n>: ", question))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn select_levels<R: BufRead, W: Write>(
    records: &[StreamRecord],
    input: &mut R,
    output: &mut W,
) -> Result<SelectionCriteria> {
    let mut criteria = SelectionCriteria::default();
    let mut options = SelectionOptions::new(records);

    for level in Level::HIERARCHY
        .into_iter()
        .chain(std::iter::once(Level::DeliveryMethod))
    {
        loop {
            writeln!(output)?;
            writeln!(output, "Available {} values:", level)?;
            writeln!(output, "  {}", options.available(level).join(", "))?;
            let answer = ask(
                input,
                output,
                &format!("Select {} (comma separated, enter for all): ", level),
            )?;

            let tokens = parse_tokens(&answer);
            match options.clone().select(level, &tokens) {
                Ok(narrowed) => {
                    options = narrowed;
                    criteria.set_tokens(level, tokens);
                    break;
                }
                Err(e) => writeln!(output, "❌ {}", e)?,
            }
        }
    }

    writeln!(output, "✅ {} streams selected", options.remaining())?;
    Ok(criteria)
}

fn ask_time_bounds<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<TimeBounds> {
    writeln!(output)?;
    writeln!(
        output,
        "Times look like 2014-01-01T00:00:00.000Z; enter for the full record"
    )?;
    loop {
        let begin = ask(input, output, "Begin time: ")?;
        let end = ask(input, output, "End time: ")?;
        match TimeBounds::new(&begin, &end) {
            Ok(bounds) => return Ok(bounds),
            Err(e) => writeln!(output, "❌ {}", e)?,
        }
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(AppError::generic("Input closed before a selection was made"));
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::fixtures::qcdb_record;
    use std::io::Cursor;

    fn records() -> Vec<StreamRecord> {
        vec![
            qcdb_record(
                "CE02SHSM-RID27-03-CTDBPC000",
                "telemetered",
                "ctdbp_cdef_dcl_instrument",
                "Science",
            ),
            qcdb_record(
                "CE02SHSM-RID27-04-DOSTAD000",
                "recovered_host",
                "dosta_abcdjm_dcl_instrument_recovered",
                "Science",
            ),
            qcdb_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", "Science"),
        ]
    }

    #[test]
    fn test_invalid_value_is_asked_again() {
        let records = records();
        let mut input = Cursor::new("ZZ\nCE\n\n\nCTDBP\n\n");
        let mut output = Vec::new();

        let criteria = select_levels(&records, &mut input, &mut output).unwrap();

        assert_eq!(criteria.arrays, parse_tokens("CE"));
        assert!(criteria.subsites.is_empty());
        assert_eq!(criteria.instruments, parse_tokens("CTDBP"));

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("ZZ"));
        assert!(shown.contains("CE, GI"));
        assert!(shown.contains("1 streams selected"));
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let records = records();
        let mut input = Cursor::new("CE\n");
        let mut output = Vec::new();

        assert!(select_levels(&records, &mut input, &mut output).is_err());
    }

    #[test]
    fn test_time_bounds_reasked_until_ordered() {
        let mut input = Cursor::new(
            "2016-01-01T00:00:00.000Z\n2015-01-01T00:00:00.000Z\n2015-01-01T00:00:00.000Z\n\n",
        );
        let mut output = Vec::new();

        let bounds = ask_time_bounds(&mut input, &mut output).unwrap();
        assert_eq!(bounds.begin.as_deref(), Some("2015-01-01T00:00:00.000Z"));
        assert_eq!(bounds.end, None);
    }

    #[test]
    fn test_confirmation_answers() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES\n"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
    }
}
