use std::io::Write;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Subcommand;
use qlfront_catalog::request::PagingState;
use qlfront_exec::client::ClientContext;
use qlfront_exec::config::FrontendConfig;
use qlfront_exec::errors::ExecError;
use qlfront_exec::processor::QlProcessor;
use qlfront_parser::errors::ParseError;
use qlfront_parser::tokens::Tokenizer;
use qlfront_parser::{ParseContext, ParseOptions, parse_statement};
use qlfront_repr::datatype::DataType;
use qlfront_repr::row::{Row, RowBlock};
use qlfront_repr::schema::{ColumnSchema, Schema};
use tracing::debug;

use crate::args::{ParseArgs, QueryArgs};
use crate::demo::demo_permissions;
use crate::output::TextTable;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse a statement and print what the parser found.
    Parse(ParseArgs),
    /// Run a statement against the system tables.
    Query(QueryArgs),
    /// List frontend settings with their default values.
    Settings,
}

impl Commands {
    pub fn run(self, out: &mut dyn Write) -> Result<()> {
        match self {
            Commands::Parse(parse) => parse.run(out),
            Commands::Query(query) => query.run(out),
            Commands::Settings => list_settings(out),
        }
    }
}

trait RunCommand {
    fn run(self, out: &mut dyn Write) -> Result<()>;
}

impl RunCommand for ParseArgs {
    fn run(self, out: &mut dyn Write) -> Result<()> {
        if self.read_size == 0 {
            bail!("read size must be greater than zero");
        }
        let opts = ParseOptions {
            trace_scanning: self.trace_scanning,
            trace_parsing: self.trace_parsing,
            read_size: self.read_size,
            ..Default::default()
        };

        if self.tokens {
            let mut ctx = ParseContext::new(self.sql.as_str(), &opts);
            let toks = match Tokenizer::new(&mut ctx).tokenize() {
                Ok(toks) => toks,
                Err(e) => return Err(report_parse_error(out, &self.sql, e)),
            };
            for tok in toks {
                writeln!(out, "{:<6} {}", tok.location.to_string(), tok.token)?;
            }
        }

        let tree = match parse_statement(&self.sql, &opts) {
            Ok(tree) => tree,
            Err(e) => return Err(report_parse_error(out, &self.sql, e)),
        };
        writeln!(out, "{}", tree.statement)?;

        if !tree.bind_variables.is_empty() {
            writeln!(out, "bind variables:")?;
            for var in &tree.bind_variables {
                writeln!(out, "  {} {}", var.location, var)?;
            }
        }
        if !tree.diagnostics.is_empty() {
            writeln!(out, "warnings:")?;
            for diagnostic in &tree.diagnostics {
                writeln!(out, "{}", diagnostic.render(&self.sql))?;
            }
        }

        Ok(())
    }
}

impl RunCommand for QueryArgs {
    fn run(self, out: &mut dyn Write) -> Result<()> {
        let mut config = FrontendConfig::default();
        for (name, value) in &self.settings {
            config.set_from_scalar(name, value)?;
            debug!(%name, %value, "applied setting");
        }

        let processor =
            QlProcessor::try_new(demo_permissions()?, Arc::new(ClientContext::new()), config)?;
        let resume = self.resume_at.map(|next_row| PagingState { next_row });

        let first = match processor.run_paged(&self.sql, &self.binds, resume) {
            Ok(result) => result,
            Err(ExecError::Parse(e)) => return Err(report_parse_error(out, &self.sql, e)),
            Err(e) => return Err(e.into()),
        };
        for warning in &first.warnings {
            writeln!(out, "warning: {warning}")?;
        }

        let mut block = first.rows.materialize()?;
        let mut paging_state = first.paging_state();
        while self.all_pages {
            let Some(state) = paging_state else {
                break;
            };
            let page = processor.run_paged(&self.sql, &self.binds, Some(state))?;
            for row in page.rows.materialize()?.into_rows() {
                block.push_row(row)?;
            }
            paging_state = page.paging_state();
        }

        writeln!(out, "{}", TextTable::new(&block))?;
        if let Some(state) = paging_state {
            writeln!(
                out,
                "more rows available, resume with --resume-at {}",
                state.next_row
            )?;
        }

        Ok(())
    }
}

fn list_settings(out: &mut dyn Write) -> Result<()> {
    let config = FrontendConfig::default();
    let schema = Schema::try_new(
        [
            ColumnSchema::new("name", DataType::Text),
            ColumnSchema::new("default", DataType::Text),
            ColumnSchema::new("description", DataType::Text),
        ],
        1,
    )?;

    let mut block = RowBlock::new(schema);
    for (name, description) in FrontendConfig::settings() {
        let value = config.get_as_scalar(name)?;
        block.push_row(Row::from_iter([
            name.into(),
            value.to_string().into(),
            description.into(),
        ]))?;
    }

    writeln!(out, "{}", TextTable::new(&block))?;
    Ok(())
}

/// Write the failing diagnostic with the statement line it points at, and
/// hand the error back for the caller to return.
fn report_parse_error(out: &mut dyn Write, sql: &str, err: ParseError) -> anyhow::Error {
    if let Err(e) = writeln!(out, "{}", err.diagnostic.render(sql)) {
        return e.into();
    }
    err.into()
}
