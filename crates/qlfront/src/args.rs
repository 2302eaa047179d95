use clap::Parser;
use qlfront_repr::scalar::ScalarValue;

#[derive(Debug, Clone, Parser)]
pub struct ParseArgs {
    /// Statement to parse.
    pub sql: String,

    /// Bytes handed to the tokenizer per read.
    #[clap(long, default_value_t = qlfront_parser::context::DEFAULT_READ_SIZE)]
    pub read_size: usize,

    /// Print every token with its location.
    #[clap(long)]
    pub tokens: bool,

    /// Emit trace events while tokenizing.
    #[clap(long)]
    pub trace_scanning: bool,

    /// Emit trace events while parsing.
    #[clap(long)]
    pub trace_parsing: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct QueryArgs {
    /// Statement to run.
    pub sql: String,

    /// Bind values, matched to bind markers in order.
    ///
    /// `null`, `true`, `false` and integers are typed accordingly, anything
    /// else is passed as text.
    #[clap(short, long = "bind", value_parser = parse_scalar)]
    pub binds: Vec<ScalarValue>,

    /// Override a frontend setting, e.g. `--set default_page_size=10`.
    #[clap(long = "set", value_parser = parse_key_value)]
    pub settings: Vec<(String, ScalarValue)>,

    /// Resume a paged read at this row.
    #[clap(long)]
    pub resume_at: Option<u64>,

    /// Keep fetching pages until the read is exhausted.
    #[clap(long)]
    pub all_pages: bool,
}

/// Parse a command line value into a scalar.
pub fn parse_scalar(s: &str) -> Result<ScalarValue, String> {
    if s.eq_ignore_ascii_case("null") {
        return Ok(ScalarValue::Null);
    }
    if let Ok(b) = s.parse::<bool>() {
        return Ok(b.into());
    }
    if let Ok(n) = s.parse::<i64>() {
        return Ok(n.into());
    }
    Ok(s.into())
}

fn parse_key_value(s: &str) -> Result<(String, ScalarValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing setting name in '{s}'"));
    }
    Ok((key.to_string(), parse_scalar(value.trim())?))
}
