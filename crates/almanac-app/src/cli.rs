use std::path::PathBuf;

use almanac_core::types::Termination;
use almanac_lunar::LunarRecurrence;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "almanac")]
#[command(about = "Lunar calendar conversion and schedule recurrence queries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lunar reading of a solar date (YYYY-MM-DD)
    Lunar { date: NaiveDate },
    /// Lunar readings for every day of a solar month
    Month {
        year: i32,
        month: u32,

        /// Pad to a six-week grid starting on Sunday
        #[arg(long)]
        fill: bool,
    },
    /// Festival days between two dates, inclusive
    Festivals {
        from: NaiveDate,
        to: NaiveDate,

        /// Only festivals whose name contains this text
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Solar dates of a lunar-anchored recurrence inside a window
    Expand {
        #[arg(long, value_enum)]
        kind: LunarKind,

        /// First occurrence of the series
        #[arg(long)]
        origin: NaiveDate,

        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,

        /// Stop after this many occurrences, counting the origin
        #[arg(long, conflicts_with = "until")]
        count: Option<u32>,

        /// Last date an occurrence may start on
        #[arg(long)]
        until: Option<NaiveDate>,

        /// Length of each occurrence in days
        #[arg(long, default_value_t = 0)]
        duration_days: i64,
    },
    /// Answer a JSON query descriptor against a schedule document
    Query {
        /// Path to the query descriptor
        #[arg(long)]
        descriptor: PathBuf,

        /// Schedule document; defaults to `store.schedules_path`
        #[arg(long)]
        schedules: Option<PathBuf>,

        /// Reference time (e.g. "2024-06-03T08:00:00"); defaults to the local clock
        #[arg(long)]
        now: Option<NaiveDateTime>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LunarKind {
    LunarMonthly,
    LunarYearly,
}

impl From<LunarKind> for LunarRecurrence {
    fn from(kind: LunarKind) -> Self {
        match kind {
            LunarKind::LunarMonthly => Self::Monthly,
            LunarKind::LunarYearly => Self::Yearly,
        }
    }
}

/// Termination implied by the mutually exclusive `--count` and `--until` flags.
#[must_use]
pub fn termination(count: Option<u32>, until: Option<NaiveDate>) -> Termination {
    match (count, until) {
        (Some(count), _) => Termination::AfterCount(count),
        (None, Some(until)) => Termination::UntilDate(until),
        (None, None) => Termination::Never,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("almanac").chain(args.iter().copied()))
    }

    #[test]
    fn parses_expand() {
        let cli = parse(&[
            "expand",
            "--kind",
            "lunar-yearly",
            "--origin",
            "2024-02-10",
            "--from",
            "2024-01-01",
            "--to",
            "2026-12-31",
            "--count",
            "2",
        ])
        .expect("valid arguments");
        let Commands::Expand {
            kind,
            count,
            until,
            duration_days,
            ..
        } = cli.command
        else {
            panic!("expected expand");
        };
        assert_eq!(kind, LunarKind::LunarYearly);
        assert_eq!(termination(count, until), Termination::AfterCount(2));
        assert_eq!(duration_days, 0);
    }

    #[test]
    fn count_conflicts_with_until() {
        let result = parse(&[
            "expand",
            "--kind",
            "lunar-monthly",
            "--origin",
            "2024-02-10",
            "--from",
            "2024-01-01",
            "--to",
            "2024-12-31",
            "--count",
            "2",
            "--until",
            "2024-06-01",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse(&["lunar", "2024-13-01"]).is_err());
        assert!(parse(&["lunar", "2024-02-10"]).is_ok());
    }

    #[test]
    fn parses_month_and_festivals() {
        let cli = parse(&["month", "2024", "2", "--fill"]).expect("valid arguments");
        assert!(matches!(
            cli.command,
            Commands::Month {
                year: 2024,
                month: 2,
                fill: true
            }
        ));
        let cli = parse(&["festivals", "2024-02-01", "2024-02-29", "-k", "节"])
            .expect("valid arguments");
        assert!(matches!(cli.command, Commands::Festivals { key: Some(_), .. }));
    }
}
