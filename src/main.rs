use cfd_jacobi as cfd;
use cfd_jacobi::cli::{self, Invocation};
use cfd_jacobi::flow::Solver;
use cfd_jacobi::{CfdError, CfdResult};
use colored::*;
use rayon::ThreadPoolBuilder;
use std::env;
use std::process;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() {
    match run() {
        Ok(()) => {}
        Err(CfdError::Cli(e)) => e.exit(),
        Err(e) => {
            eprintln!("{} {e}.", "Error:".red().bold());
            process::exit(1);
        }
    }
}

fn run() -> CfdResult<()> {
    let options = match cli::parse_args(env::args_os())? {
        Invocation::Run(options) => options,
        Invocation::Usage => {
            println!("{}", cli::USAGE);
            return Ok(());
        }
    };

    let level = match options.verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let _ = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    if let Some(num_threads) = options.number_of_threads {
        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()?;
    }

    let config = options.config()?;
    let mut monitor = cfd::io::ConsoleMonitor::new(rayon::current_num_threads());
    let mut solver = Solver::new(&config);
    solver.run(&mut monitor)?;

    if let Some(path) = &options.output {
        let flow = solver.into_flow();
        cfd::io::create_output_directory(path)?;
        cfd::io::write_data_files(&flow.psi, config.scale_factor, path)?;
        cfd::io::write_plot_file(flow.geometry.m, flow.geometry.n, config.scale_factor, path)?;
    }

    println!("... finished");
    Ok(())
}
