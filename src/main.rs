mod app;
mod help;
mod logging;
mod theme;
mod widget;
use crate::app::App;
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use stayspan::clock::{Clock, SystemClock};
use stayspan::config::Config;
use stayspan::controller::{RangeController, RangeProps};
use stayspan::error::ConfigError;
use stayspan::policy::{DayPredicate, Policies};
use stayspan::selection::{Endpoint, Selection};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use time::{format_description::FormatItem, macros::format_description, Date, Weekday};

static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run(RunOptions),
    Help,
    Version,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct RunOptions {
    date: Option<Date>,
    months: Option<NonZeroUsize>,
    min_nights: Option<u32>,
    max_nights: Option<u32>,
    outside_days: bool,
    keep_open: bool,
    first_day: Option<u8>,
    block_weekends: bool,
    verbosity: u8,
    log_file: Option<PathBuf>,
}

impl RunOptions {
    fn config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::new()
            .with_outside_days(self.outside_days)
            .with_keep_open_on_date_select(self.keep_open)
            .with_initial_visible_month(self.date);
        if let Some(months) = self.months {
            config = config.with_number_of_months(months);
        }
        if let Some(nights) = self.min_nights {
            config = config.with_minimum_nights(nights);
        }
        if let Some(nights) = self.max_nights {
            config = config.with_maximum_nights(nights);
        }
        if let Some(index) = self.first_day {
            config = config.with_first_day_of_week_index(index)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Days before `today` can never be picked
    fn policies(&self, today: Date) -> Policies {
        let mut policies =
            Policies::new().with_outside_range(DayPredicate::new(move |d| d < today));
        if self.block_weekends {
            policies = policies.with_day_blocked(DayPredicate::new(|d| {
                matches!(d.weekday(), Weekday::Saturday | Weekday::Sunday)
            }));
        }
        policies
    }
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut opts = RunOptions::default();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('m') | Arg::Long("months") => {
                    opts.months = Some(parser.value()?.parse()?);
                }
                Arg::Long("min-nights") => opts.min_nights = Some(parser.value()?.parse()?),
                Arg::Long("max-nights") => opts.max_nights = Some(parser.value()?.parse()?),
                Arg::Long("first-day") => opts.first_day = Some(parser.value()?.parse()?),
                Arg::Long("outside-days") => opts.outside_days = true,
                Arg::Long("keep-open") => opts.keep_open = true,
                Arg::Long("block-weekends") => opts.block_weekends = true,
                Arg::Short('v') | Arg::Long("verbose") => {
                    opts.verbosity = opts.verbosity.saturating_add(1);
                }
                Arg::Long("log-file") => opts.log_file = Some(parser.value()?.into()),
                Arg::Value(value) if opts.date.is_none() => {
                    let value = value.string()?;
                    match Date::parse(&value, &YMD_FMT) {
                        Ok(d) => opts.date = Some(d),
                        Err(e) => {
                            return Err(lexopt::Error::ParsingFailed {
                                value,
                                error: Box::new(e),
                            })
                        }
                    }
                }
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Command::Run(opts))
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run(opts) => {
                if let Some(path) = &opts.log_file {
                    logging::init(opts.verbosity, path)?;
                }
                let config = opts.config().context("invalid options")?;
                let clock = SystemClock;
                let policies = opts.policies(clock.today());
                let props = RangeProps::new(Selection::focused(Endpoint::Start), config, policies);
                let controller = RangeController::new(props, clock);
                with_terminal(|mut terminal| {
                    terminal.hide_cursor().context("failed to hide cursor")?;
                    App::new(controller).run(&mut terminal)?;
                    Ok(())
                })
            }
            Command::Help => {
                println!("Usage: stayspan [<options>] [YYYY-MM-DD]");
                println!();
                println!("Pick a check-in and check-out date in the terminal");
                println!();
                println!("Options:");
                println!("  -m, --months <N>      Show N months side by side [default: 1]");
                println!("      --min-nights <N>  Require at least N nights [default: 1]");
                println!("      --max-nights <N>  Allow a stay of at most N nights (0: no limit)");
                println!("      --first-day <D>   First day of the week, 0 = Sunday [default: 0]");
                println!("      --outside-days    Show days of adjacent months");
                println!("      --keep-open       Keep picking after both dates are chosen");
                println!("      --block-weekends  Make Saturdays and Sundays unavailable");
                println!("      --log-file <PATH> Write a log to PATH");
                println!("  -v, --verbose         Log more detail; may be repeated");
                println!("  -h, --help            Display this help message and exit");
                println!("  -V, --version         Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}
