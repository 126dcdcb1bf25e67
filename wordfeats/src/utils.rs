use std::io::BufRead;
use std::str::FromStr;

use crate::errors::{Result, WordFeatsError};

/// Calls `f` with the 1-based line number and the whitespace-separated fields of every line.
pub fn for_each_record<R, F>(rdr: R, mut f: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &[&str]) -> Result<()>,
{
    for (i, line) in rdr.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        f(i + 1, &fields)?;
    }
    Ok(())
}

pub fn parse_field<T>(source: &'static str, line: usize, name: &str, field: &str) -> Result<T>
where
    T: FromStr,
{
    field.parse().map_err(|_| {
        WordFeatsError::malformed_record(source, line, format!("invalid {}: {:?}", name, field))
    })
}

pub fn expect_n_fields(source: &'static str, line: usize, fields: &[&str], n: usize) -> Result<()> {
    if fields.len() != n {
        return Err(WordFeatsError::malformed_record(
            source,
            line,
            format!("expected {} fields, but got {}", n, fields.len()),
        ));
    }
    Ok(())
}
