use crate::flow::post::{compute_max_speed, compute_velocity, hue_to_rgb, speed_hue};
use crate::flow::{Config, Field, Monitor};
use crate::global_variables::*;
use crate::{FlowMode, RunSummary};
use colored::*;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const COLOURMAP_FILE: &'static str = "colourmap.dat";

pub const VELOCITY_FILE: &'static str = "velocity.dat";

pub const PLOT_FILE: &'static str = "cfd.plt";

pub fn create_output_directory(path: &Path) -> io::Result<()> {
    if !path.exists() {
        println!("Creating the {} path.\n", path.display().to_string().yellow().bold());
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Writes the speed colour map of every interior cell and a sparse set of
/// velocity vectors, one per `scale` x `scale` block.
pub fn write_data_files(psi: &Field, scale_factor: usize, path: &Path) -> io::Result<()> {
    let (_, n) = psi.interior_shape();
    let velocity = compute_velocity(psi);
    let sample_offset = (scale_factor - 1) / 2;

    println!("\nWriting data files ...");
    let mut colour_file = BufWriter::new(File::create(path.join(COLOURMAP_FILE))?);
    let mut velocity_file = BufWriter::new(File::create(path.join(VELOCITY_FILE))?);
    for (index, &[ux, uy]) in velocity.iter().enumerate() {
        let ix = index / n + 1;
        let iy = index % n + 1;
        let [r, g, b] = hue_to_rgb(speed_hue([ux, uy]));
        writeln!(colour_file, "{ix} {iy} {r} {g} {b}")?;
        if (ix - 1) % scale_factor == sample_offset && (iy - 1) % scale_factor == sample_offset {
            writeln!(velocity_file, "{ix} {iy} {ux:.6} {uy:.6}")?;
        }
    }
    colour_file.flush()?;
    velocity_file.flush()?;
    println!(
        "Written {} and {} (max speed {:.6}).",
        COLOURMAP_FILE.yellow().bold(),
        VELOCITY_FILE.yellow().bold(),
        compute_max_speed(&velocity)
    );
    Ok(())
}

pub fn write_plot_file(m: usize, n: usize, scale_factor: usize, path: &Path) -> io::Result<()> {
    let mut file = File::create(path.join(PLOT_FILE))?;
    writeln!(
        file,
        r##"set size square
set key off
unset xtics
unset ytics
set xrange [{x_min}:{x_max}]
set yrange [{y_min}:{y_max}]
plot "{colourmap}" w rgbimage, "{velocity}" u 1:2:({scale}*0.75*$3/sqrt($3**2+$4**2)):({scale}*0.75*$4/sqrt($3**2+$4**2)) with vectors lc rgb "#7F7F7F""##,
        x_min = 1 - scale_factor as isize,
        x_max = m + scale_factor,
        y_min = 1 - scale_factor as isize,
        y_max = n + scale_factor,
        colourmap = COLOURMAP_FILE,
        velocity = VELOCITY_FILE,
        scale = scale_factor,
    )?;
    println!("\nWritten gnuplot script {}.", PLOT_FILE.yellow().bold());
    Ok(())
}

/// Prints the run to the terminal.
pub struct ConsoleMonitor {
    threads: usize,
}

impl ConsoleMonitor {
    pub fn new(threads: usize) -> Self {
        Self { threads }
    }
}

impl Monitor for ConsoleMonitor {
    fn start(&mut self, config: &Config) {
        if config.check_error() {
            println!(
                "{} {}, {} {}, {} {}",
                "Scale Factor =".cyan().bold(),
                config.scale_factor,
                "iterations =".cyan().bold(),
                config.num_iter,
                "tolerance =".cyan().bold(),
                config.tolerance
            );
        } else {
            println!(
                "{} {}, {} {}",
                "Scale Factor =".cyan().bold(),
                config.scale_factor,
                "iterations =".cyan().bold(),
                config.num_iter
            );
        }
        match (config.mode, config.reynolds) {
            (FlowMode::Rotational { reynolds }, Some(input)) => println!(
                "{} {:.6} (rescaled to {:.6})",
                "Reynolds number =".cyan().bold(),
                input,
                reynolds
            ),
            _ => println!("{}", "Irrotational flow".cyan().bold()),
        }
        println!(
            "Running CFD on {} x {} grid using {} threads",
            config.geometry.m, config.geometry.n, self.threads
        );
        println!("\nStarting main loop...\n");
    }

    fn progress(&mut self, iteration: usize, error: Option<Float>) {
        match error {
            Some(error) => println!("Completed iteration {iteration}, error = {error:.8e}"),
            None => println!("Completed iteration {iteration}"),
        }
    }

    fn finish(&mut self, summary: &RunSummary) {
        println!("\n... finished");
        if summary.converged {
            println!(
                "{} {}",
                "Converged on iteration".green().bold(),
                summary.iterations
            );
        }
        println!(
            "After {} iterations, the error is {:.8e}",
            summary.iterations, summary.error
        );
        println!(
            "Time for {} iterations was {:.6} seconds",
            summary.iterations,
            summary.elapsed.as_secs_f64()
        );
        println!(
            "Each iteration took {:.6e} seconds ({:.1} iterations per second)",
            summary.time_per_iteration(),
            summary.iterations_per_second()
        );
    }
}
