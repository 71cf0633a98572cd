//! Line-oriented interactive session
//!
//! Each accepted parameter change builds a new request and reruns the whole
//! pipeline. Rejected input is reported and the previous request stays.

use anyhow::Result;
use chrono::NaiveDate;
use std::io::{BufRead, Write};
use stock_forecast::request::{ForecastRequest, PriceField, MAX_HORIZON_DAYS, MIN_HORIZON_DAYS};
use stock_forecast::ForecastError;
use tracing::debug;

pub const HELP: &str = "\
Commands:
  ticker <SYMBOL>       set the stock ticker and rerun
  start <YYYY-MM-DD>    set the start date and rerun
  end <YYYY-MM-DD>      set the end date (exclusive) and rerun
  horizon <DAYS>        set the forecast horizon and rerun
  field <FIELD>         set the price field (Open, High, Low, Close) and rerun
  run                   rerun with the current parameters
  show                  print the current parameters
  help                  print this help
  quit                  leave the session";

/// One parsed session command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ticker(String),
    Start(NaiveDate),
    End(NaiveDate),
    Horizon(u32),
    Field(PriceField),
    Run,
    Show,
    Help,
    Quit,
}

impl Command {
    /// Parse a line; blank lines give `None`
    pub fn parse(line: &str) -> std::result::Result<Option<Command>, String> {
        let mut parts = line.split_whitespace();
        let keyword = match parts.next() {
            Some(k) => k.to_lowercase(),
            None => return Ok(None),
        };
        let argument = parts.next();
        if parts.next().is_some() {
            return Err(format!("Too many arguments for '{}'", keyword));
        }

        let required = |what: &str| {
            argument.ok_or_else(|| format!("'{}' needs {}", keyword, what))
        };
        let parse_date = |s: &str| {
            s.parse::<NaiveDate>()
                .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s))
        };

        let command = match keyword.as_str() {
            "ticker" => Command::Ticker(required("a symbol")?.to_string()),
            "start" => Command::Start(parse_date(required("a date")?)?),
            "end" => Command::End(parse_date(required("a date")?)?),
            "horizon" => {
                let raw = required("a number of days")?;
                let days = raw.parse::<u32>().map_err(|_| {
                    format!(
                        "Invalid horizon '{}', expected {} to {}",
                        raw, MIN_HORIZON_DAYS, MAX_HORIZON_DAYS
                    )
                })?;
                Command::Horizon(days)
            }
            "field" => Command::Field(
                required("a price field")?
                    .parse::<PriceField>()
                    .map_err(|e| e.to_string())?,
            ),
            "run" => Command::Run,
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("Unknown command '{}', type 'help'", other)),
        };
        Ok(Some(command))
    }

    /// New request for a parameter change, `None` for other commands
    pub fn apply(
        &self,
        request: &ForecastRequest,
    ) -> Option<std::result::Result<ForecastRequest, ForecastError>> {
        match self {
            Command::Ticker(t) => Some(request.with_ticker(t)),
            Command::Start(d) => Some(request.with_start_date(*d)),
            Command::End(d) => Some(request.with_end_date(*d)),
            Command::Horizon(h) => Some(request.with_horizon_days(*h)),
            Command::Field(f) => Some(request.with_price_field(*f)),
            _ => None,
        }
    }
}

/// Read commands until `quit` or end of input.
///
/// `execute` runs the pipeline for a request and renders it to `out`. It is
/// called once for the initial request and again after every accepted change.
pub fn run_session<R, W, F>(input: R, out: &mut W, initial: ForecastRequest, mut execute: F) -> Result<ForecastRequest>
where
    R: BufRead,
    W: Write,
    F: FnMut(&ForecastRequest, &mut W) -> Result<()>,
{
    let mut request = initial;
    execute(&request, out)?;
    writeln!(out, "\nType 'help' for commands.")?;

    for line in input.lines() {
        let line = line?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "{}", message)?;
                continue;
            }
        };
        debug!(?command, "Session command");

        match command.apply(&request) {
            Some(Ok(updated)) => {
                request = updated;
                execute(&request, out)?;
            }
            Some(Err(e)) => writeln!(out, "{}", e)?,
            None => match command {
                Command::Run => execute(&request, out)?,
                Command::Show => writeln!(out, "{}", request)?,
                Command::Help => writeln!(out, "{}", HELP)?,
                Command::Quit => break,
                _ => {}
            },
        }
    }
    Ok(request)
}
