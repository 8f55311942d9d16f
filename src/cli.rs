use crate::error::{CfdError, CfdResult};
use crate::flow::Config;
use crate::global_variables::*;
use clap::error::ErrorKind;
use clap::{arg, command, value_parser, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

pub const USAGE: &'static str = "Usage: cfd <scale> <numiter> [reynolds]";

#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    pub scale_factor: usize,
    pub num_iter: usize,
    pub reynolds: Option<Float>,
    pub tolerance: Float,
    pub number_of_threads: Option<usize>,
    pub output: Option<PathBuf>,
    pub verbosity: u8,
}

impl Options {
    pub fn config(&self) -> CfdResult<Config> {
        Ok(Config::new(self.scale_factor, self.num_iter, self.reynolds)?
            .with_tolerance(self.tolerance))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Invocation {
    Run(Options),
    /// Wrong number of positional arguments: print the usage line, do no work.
    Usage,
}

pub fn command() -> Command {
    command!()
        .name("cfd")
        .about("Jacobi stream function / vorticity flow solver")
        .arg(
            arg!(<scale> "Multiplies the base 32 x 32 grid and the inlet/outlet geometry")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(<numiter> "Number of Jacobi iterations")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!([reynolds] "Reynolds number; selects rotational flow when given")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true),
        )
        .arg(
            arg!(
                -t --tolerance <TOLERANCE> "Stops once the relative error drops below this value (<= 0 disables)"
            )
            .required(false)
            .value_parser(value_parser!(f64))
            .default_value("0"),
        )
        .arg(
            arg!(
                -n --number_of_threads <NUMBER_OF_THREADS> "Sets the number of threads"
            )
            .required(false)
            .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(
                -o --output <DIR> "Writes the colour map, velocity and gnuplot files to DIR"
            )
            .required(false)
            .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(
                -v --verbose "Increases the diagnostic output"
            )
            .action(ArgAction::Count),
        )
}

pub fn parse_args<I, T>(args: I) -> CfdResult<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match command().try_get_matches_from(args) {
        Ok(matches) => Ok(Invocation::Run(options_from_matches(&matches)?)),
        Err(e) => match e.kind() {
            ErrorKind::MissingRequiredArgument
            | ErrorKind::UnknownArgument
            | ErrorKind::TooManyValues
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => Ok(Invocation::Usage),
            _ => Err(CfdError::Cli(e)),
        },
    }
}

fn options_from_matches(matches: &ArgMatches) -> CfdResult<Options> {
    let number_of_threads = matches.get_one::<usize>("number_of_threads").copied();
    if number_of_threads == Some(0) {
        return Err(CfdError::invalid_argument(
            "number_of_threads",
            "must be a positive integer",
        ));
    }
    Ok(Options {
        scale_factor: *matches.get_one::<usize>("scale").unwrap_or(&0),
        num_iter: *matches.get_one::<usize>("numiter").unwrap_or(&0),
        reynolds: matches.get_one::<f64>("reynolds").copied(),
        tolerance: *matches.get_one::<f64>("tolerance").unwrap_or(&TOLERANCE),
        number_of_threads,
        output: matches.get_one::<PathBuf>("output").cloned(),
        verbosity: matches.get_count("verbose"),
    })
}
