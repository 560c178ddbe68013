//! Interactive form
//!
//! Prompts for every field of a rule set, one line per answer. An empty
//! line keeps the shown default. Invalid answers are re-prompted.

use anyhow::{Context, Result};
use ascvd_core::form::{fields, FieldKind};
use ascvd_core::{FormValues, RuleSetKind};
use std::io::{BufRead, Write};

/// Read one trimmed line, failing on end of input
fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    let n = input.read_line(&mut line).context("failed to read answer")?;
    if n == 0 {
        anyhow::bail!("input ended before the form was complete");
    }
    Ok(line.trim().to_string())
}

/// Collect answers for every field of `kind`
///
/// `defaults` replace the catalog defaults shown in the prompt.
/// Returns `None` if the user declines to calculate.
pub fn run_form<R: BufRead, W: Write>(
    kind: RuleSetKind,
    defaults: &FormValues,
    input: &mut R,
    output: &mut W,
) -> Result<Option<FormValues>> {
    let mut values = FormValues::new();

    for spec in fields(kind) {
        let default = defaults
            .get(spec.key)
            .map(str::to_string)
            .unwrap_or_else(|| spec.default_text());

        loop {
            match spec.kind {
                FieldKind::Choice | FieldKind::Sex => {
                    write!(output, "{} ({}) [{}]: ", spec.label, spec.range_text(), default)?
                }
                _ => write!(output, "{} [{}] ({}): ", spec.label, default, spec.range_text())?,
            }
            output.flush()?;

            let answer = read_answer(input)?;
            let answer = if answer.is_empty() { default.clone() } else { answer };

            match spec.parse(&answer) {
                Ok(_) => {
                    values.insert(spec.key, answer);
                    break;
                }
                Err(err) => {
                    tracing::debug!(field = spec.key, "rejected answer");
                    writeln!(output, "  {}", err)?;
                }
            }
        }
    }

    write!(output, "Calculate? [Y/n]: ")?;
    output.flush()?;
    let confirm = read_answer(input)?;
    if confirm.eq_ignore_ascii_case("n") || confirm.eq_ignore_ascii_case("no") {
        return Ok(None);
    }

    Ok(Some(values))
}
