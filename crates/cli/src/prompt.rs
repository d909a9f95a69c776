//! Operator AWB entry.

use std::io::{self, Read, Write};

use crate::CliError;

/// Split operator input into waybill numbers. Commas, spaces, and
/// newlines all separate; empty fragments drop out.
pub(crate) fn split_awb_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read waybill numbers from stdin until EOF. On a TTY the operator gets
/// a prompt first; piped input is consumed the same way.
pub(crate) fn read_awbs() -> Result<Vec<String>, CliError> {
    if atty::is(atty::Stream::Stdin) {
        eprint!("waybill numbers (comma, space, or newline separated; Ctrl-D ends): ");
        io::stderr().flush().ok();
    }
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| CliError::usage(format!("cannot read waybill list: {}", e)))?;
    Ok(split_awb_list(&input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_handles_mixed_separators() {
        assert_eq!(
            split_awb_list("160-1, 160-2\n160-3  160-4,,\n"),
            vec!["160-1", "160-2", "160-3", "160-4"]
        );
        assert!(split_awb_list("  \n ,").is_empty());
    }
}
