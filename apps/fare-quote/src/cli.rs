//! Command-line argument parsing.

use railfare_core::{BerthType, BogieId, TrainId};
use std::path::PathBuf;

use crate::error::{CliError, CliResult};

pub const USAGE: &str = "\
Railfare Quote Tool

Usage:
  fare-quote quote --train <ID> --from <STATION> --to <STATION> --bogie <ID> [--berth <TYPE>]
  fare-quote rebuild --train <ID>

Options:
  -t, --train <ID>        Train id
  -f, --from <STATION>    Boarding station id or code
  -o, --to <STATION>      Alighting station id or code
  -b, --bogie <ID>        Bogie id
      --berth <TYPE>      upper | lower | single
  -c, --config <PATH>     Config file (default: platform config dir)
  -h, --help              Show this help message";

/// A station given either as its numeric id or its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationRef {
    Id(i64),
    Code(String),
}

impl StationRef {
    pub fn parse(value: &str) -> StationRef {
        match value.parse() {
            Ok(id) => StationRef::Id(id),
            Err(_) => StationRef::Code(value.trim().to_uppercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteArgs {
    pub train_id: TrainId,
    pub from: StationRef,
    pub to: StationRef,
    pub bogie_id: BogieId,
    pub berth: Option<BerthType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quote(QuoteArgs),
    Rebuild { train_id: TrainId },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub command: Command,
}

impl Cli {
    /// Parses arguments, excluding the program name.
    pub fn parse<I, T>(args: I) -> CliResult<Cli>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        let mut subcommand: Option<String> = None;
        let mut config = None;
        let mut train = None;
        let mut from = None;
        let mut to = None;
        let mut bogie = None;
        let mut berth = None;

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--help" | "-h" => {
                    return Ok(Cli { config: None, command: Command::Help });
                }
                "--config" | "-c" => config = Some(PathBuf::from(value(&args, &mut i, flag)?)),
                "--train" | "-t" => train = Some(parse_id(value(&args, &mut i, flag)?, "--train")?),
                "--from" | "-f" => from = Some(StationRef::parse(value(&args, &mut i, flag)?)),
                "--to" | "-o" => to = Some(StationRef::parse(value(&args, &mut i, flag)?)),
                "--bogie" | "-b" => bogie = Some(parse_id(value(&args, &mut i, flag)?, "--bogie")?),
                "--berth" => {
                    let raw = value(&args, &mut i, flag)?;
                    berth = Some(raw.parse::<BerthType>().map_err(|e| {
                        CliError::usage(format!("invalid --berth '{}': {}", raw, e))
                    })?);
                }
                other if other.starts_with('-') => {
                    return Err(CliError::usage(format!("unknown option '{}'", other)));
                }
                other if subcommand.is_none() => subcommand = Some(other.to_string()),
                other => return Err(CliError::usage(format!("unexpected argument '{}'", other))),
            }
            i += 1;
        }

        let command = match subcommand.as_deref() {
            Some("quote") => Command::Quote(QuoteArgs {
                train_id: required(train, "--train")?,
                from: required(from, "--from")?,
                to: required(to, "--to")?,
                bogie_id: required(bogie, "--bogie")?,
                berth,
            }),
            Some("rebuild") => Command::Rebuild {
                train_id: required(train, "--train")?,
            },
            Some(other) => return Err(CliError::usage(format!("unknown command '{}'", other))),
            None => Command::Help,
        };

        Ok(Cli { config, command })
    }
}

fn value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> CliResult<&'a str> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| CliError::usage(format!("{} requires a value", flag)))
}

fn parse_id(raw: &str, flag: &str) -> CliResult<i64> {
    raw.parse()
        .map_err(|_| CliError::usage(format!("{} expects a numeric id, got '{}'", flag, raw)))
}

fn required<T>(value: Option<T>, flag: &str) -> CliResult<T> {
    value.ok_or_else(|| CliError::usage(format!("missing required option {}", flag)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quote() {
        let cli = Cli::parse([
            "quote", "--train", "21", "--from", "ktw", "--to", "5", "--bogie", "3", "--berth", "Lower",
            "--config", "/etc/railfare.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/railfare.toml")));
        assert_eq!(
            cli.command,
            Command::Quote(QuoteArgs {
                train_id: 21,
                from: StationRef::Code("KTW".to_string()),
                to: StationRef::Id(5),
                bogie_id: 3,
                berth: Some(BerthType::Lower),
            })
        );
    }

    #[test]
    fn test_parse_rebuild_short_flags() {
        let cli = Cli::parse(["rebuild", "-t", "2"]).unwrap();
        assert_eq!(cli.command, Command::Rebuild { train_id: 2 });
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_no_arguments_is_help() {
        let cli = Cli::parse(Vec::<String>::new()).unwrap();
        assert_eq!(cli.command, Command::Help);
        assert_eq!(Cli::parse(["quote", "--help"]).unwrap().command, Command::Help);
    }

    #[test]
    fn test_usage_errors() {
        let cases: &[&[&str]] = &[
            &["quote", "--train", "1", "--from", "1", "--to", "2"],
            &["quote", "--train", "one", "--from", "1", "--to", "2", "--bogie", "1"],
            &["quote", "--train"],
            &["rebuild", "--train", "1", "--verbose"],
            &["refund", "--train", "1"],
            &["rebuild", "extra", "--train", "1"],
            &["quote", "-t", "1", "-f", "1", "-o", "2", "-b", "1", "--berth", "middle"],
        ];

        for args in cases {
            assert!(
                matches!(Cli::parse(args.iter().copied()), Err(CliError::Usage(_))),
                "expected usage error for {:?}",
                args
            );
        }
    }
}
