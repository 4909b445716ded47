//! Operator argument validation.

use super::{Command, CommandError};
use crate::Result;
use crate::permissions::{MaskKind, mask};

/// Fails unless at least `command.required_args` arguments were given.
///
/// Extra arguments are ignored.
pub fn require(command: &Command, args: &[String]) -> Result<()> {
    if args.len() < command.required_args {
        return Err(CommandError::invalid(format!(
            "{} expects {} argument(s), got {}; usage: {} {}",
            command.name,
            command.required_args,
            args.len(),
            command.name,
            command.usage
        ))
        .into());
    }
    Ok(())
}

/// Parses a bit index and checks that it addresses a bit of a `kind` mask.
pub fn parse_bit_index(kind: MaskKind, raw: &str) -> Result<i64> {
    let index: i64 = raw
        .trim()
        .parse()
        .map_err(|_| CommandError::invalid(format!("'{raw}' is not a valid bit index")))?;
    mask::check_index(kind, index)?;
    Ok(index)
}

/// Parses `true` or `false`, ignoring case.
pub fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(CommandError::invalid(format!(
            "'{raw}' is not a boolean (expected true or false)"
        ))
        .into()),
    }
}
