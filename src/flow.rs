pub mod bc;
pub mod jacobi;
pub mod post;

pub use bc::BoundaryFace;

use crate::error::{CfdError, CfdResult};
use crate::global_variables::*;
use crate::{FlowMode, RunSummary};
use rayon::prelude::*;
use std::ops::{Index, IndexMut};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

pub const D: usize = 2;

/// Dense (m+2) x (n+2) array with a one-cell halo ring, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    rows: usize,
    cols: usize,
    data: Vec<Float>,
}

impl Field {
    pub fn zeros(m: usize, n: usize) -> Self {
        Self {
            rows: m + 2,
            cols: n + 2,
            data: vec![0.0; (m + 2) * (n + 2)],
        }
    }

    /// Interior extent `(m, n)`.
    pub fn interior_shape(&self) -> (usize, usize) {
        (self.rows - 2, self.cols - 2)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[Float] {
        &self.data
    }

    pub fn fill(&mut self, value: Float) {
        self.data.par_iter_mut().for_each(|x| *x = value);
    }

    /// Rows `1..=m` paired with their row index, halo columns included.
    pub fn interior_rows(&self) -> impl IndexedParallelIterator<Item = (usize, &[Float])> + '_ {
        let m = self.rows - 2;
        self.data.par_chunks(self.cols).enumerate().skip(1).take(m)
    }

    pub fn interior_rows_mut(
        &mut self,
    ) -> impl IndexedParallelIterator<Item = (usize, &mut [Float])> + '_ {
        let m = self.rows - 2;
        self.data.par_chunks_mut(self.cols).enumerate().skip(1).take(m)
    }

    /// Copies the interior of `other` into `self`; the halo is left alone.
    pub fn copy_interior_from(&mut self, other: &Field) {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        let n = self.cols - 2;
        self.interior_rows_mut()
            .zip(other.interior_rows())
            .for_each(|((_, dst), (_, src))| dst[1..=n].copy_from_slice(&src[1..=n]));
    }

    /// Sum of squares over the halo ring only.
    pub fn halo_sum_sq(&self) -> Float {
        let mut sum = 0.0;
        for i in 0..self.rows {
            for j in 0..self.cols {
                let on_halo = i == 0 || i == self.rows - 1 || j == 0 || j == self.cols - 1;
                if on_halo {
                    sum += self[[i, j]] * self[[i, j]];
                }
            }
        }
        sum
    }

    pub fn all_finite(&self) -> bool {
        self.data.par_iter().all(|x| x.is_finite())
    }
}

impl Index<[usize; D]> for Field {
    type Output = Float;

    fn index(&self, index: [usize; D]) -> &Float {
        let [i, j] = index;
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<[usize; D]> for Field {
    fn index_mut(&mut self, index: [usize; D]) -> &mut Float {
        let [i, j] = index;
        &mut self.data[i * self.cols + j]
    }
}

/// Grid size and the position of the inlet and outlet slots.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Geometry {
    pub m: usize,
    pub n: usize,
    /// Solid bottom wall before the inlet.
    pub barrier_width: usize,
    /// Height of the right wall below the outlet.
    pub channel_height: usize,
    /// Width of both the inlet and the outlet.
    pub channel_width: usize,
}

impl Geometry {
    pub fn new(
        m: usize,
        n: usize,
        barrier_width: usize,
        channel_height: usize,
        channel_width: usize,
    ) -> CfdResult<Self> {
        if m == 0 || n == 0 {
            return Err(CfdError::InvalidGeometry {
                message: format!("empty {m} x {n} grid"),
            });
        }
        if channel_width == 0 {
            return Err(CfdError::InvalidGeometry {
                message: "channel width must be at least one cell".to_string(),
            });
        }
        if barrier_width + channel_width > m + 1 {
            return Err(CfdError::InvalidGeometry {
                message: format!(
                    "inlet ending at {} lies outside {m} columns",
                    barrier_width + channel_width - 1
                ),
            });
        }
        if channel_height + channel_width > n + 1 {
            return Err(CfdError::InvalidGeometry {
                message: format!(
                    "outlet ending at {} lies outside {n} rows",
                    channel_height + channel_width - 1
                ),
            });
        }
        Ok(Self {
            m,
            n,
            barrier_width,
            channel_height,
            channel_width,
        })
    }

    pub fn scaled(scale_factor: usize) -> CfdResult<Self> {
        Self::new(
            M_BASE * scale_factor,
            N_BASE * scale_factor,
            B_BASE * scale_factor,
            H_BASE * scale_factor,
            W_BASE * scale_factor,
        )
    }
}

/// Immutable run configuration, built once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub scale_factor: usize,
    pub num_iter: usize,
    /// Reynolds number as given, before rescaling.
    pub reynolds: Option<Float>,
    pub mode: FlowMode,
    pub tolerance: Float,
    pub print_freq: usize,
    pub geometry: Geometry,
}

impl Config {
    pub fn new(scale_factor: usize, num_iter: usize, reynolds: Option<Float>) -> CfdResult<Self> {
        if scale_factor == 0 {
            return Err(CfdError::invalid_argument("scale", "must be a positive integer"));
        }
        if num_iter == 0 {
            return Err(CfdError::invalid_argument("numiter", "must be a positive integer"));
        }
        let mode = match reynolds {
            None => FlowMode::Irrotational,
            Some(re) if !re.is_finite() || re < 0.0 => {
                return Err(CfdError::invalid_argument(
                    "reynolds",
                    format!("{re} is not a non-negative number"),
                ));
            }
            Some(re) => {
                let reynolds = re / scale_factor as Float;
                if reynolds >= REYNOLDS_LIMIT {
                    return Err(CfdError::UnstableReynolds {
                        reynolds,
                        limit: REYNOLDS_LIMIT,
                    });
                }
                FlowMode::Rotational { reynolds }
            }
        };
        Ok(Self {
            scale_factor,
            num_iter,
            reynolds,
            mode,
            tolerance: TOLERANCE,
            print_freq: PRINT_FREQ,
            geometry: Geometry::scaled(scale_factor)?,
        })
    }

    pub fn with_tolerance(mut self, tolerance: Float) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_print_freq(mut self, print_freq: usize) -> Self {
        self.print_freq = print_freq.max(1);
        self
    }

    pub fn check_error(&self) -> bool {
        self.tolerance > 0.0
    }
}

#[derive(Clone, Debug)]
pub struct Vorticity {
    pub zeta: Field,
    pub zeta_tmp: Field,
    pub reynolds: Float,
}

/// Every array the loop touches. Allocated once and kept for the whole run;
/// the only transfers are the boundary setup in and the final `psi` out.
#[derive(Clone, Debug)]
pub struct FlowField {
    pub geometry: Geometry,
    pub psi: Field,
    pub psi_tmp: Field,
    pub vorticity: Option<Vorticity>,
    pub bnorm: Float,
}

impl FlowField {
    /// Zeroed arrays; boundaries are not applied yet.
    pub fn new(geometry: Geometry, mode: FlowMode) -> Self {
        let Geometry { m, n, .. } = geometry;
        let vorticity = match mode {
            FlowMode::Irrotational => None,
            FlowMode::Rotational { reynolds } => Some(Vorticity {
                zeta: Field::zeros(m, n),
                zeta_tmp: Field::zeros(m, n),
                reynolds,
            }),
        };
        Self {
            geometry,
            psi: Field::zeros(m, n),
            psi_tmp: Field::zeros(m, n),
            vorticity,
            bnorm: 0.0,
        }
    }

    /// The psi boundary goes first since the zeta boundary reads it; the
    /// error norm is fixed last.
    pub fn apply_initial_conditions(&mut self) {
        self.boundary_psi();
        self.boundary_zeta();
        self.bnorm = self.boundary_norm();
        info!(
            m = self.geometry.m,
            n = self.geometry.n,
            bnorm = self.bnorm,
            "boundary conditions applied"
        );
    }

    pub fn initialization(geometry: Geometry, mode: FlowMode) -> Self {
        let mut flow = Self::new(geometry, mode);
        flow.apply_initial_conditions();
        flow
    }

    pub fn is_rotational(&self) -> bool {
        self.vorticity.is_some()
    }

    /// One Jacobi sweep from the live arrays into the scratch arrays.
    pub fn jacobi_step(&mut self) {
        match self.vorticity.as_mut() {
            None => jacobi::jacobi_step(&mut self.psi_tmp, &self.psi),
            Some(vorticity) => jacobi::jacobi_step_vort(
                &mut vorticity.zeta_tmp,
                &mut self.psi_tmp,
                &vorticity.zeta,
                &self.psi,
                vorticity.reynolds,
            ),
        }
    }

    /// Relative change between the scratch and live arrays.
    pub fn compute_error(&self) -> Float {
        let mut error = jacobi::delta_sq(&self.psi_tmp, &self.psi);
        if let Some(vorticity) = &self.vorticity {
            error += jacobi::delta_sq(&vorticity.zeta_tmp, &vorticity.zeta);
        }
        let error = error.sqrt();
        if self.bnorm > 0.0 {
            error / self.bnorm
        } else {
            error
        }
    }

    pub fn copy_back(&mut self) {
        self.psi.copy_interior_from(&self.psi_tmp);
        if let Some(vorticity) = self.vorticity.as_mut() {
            vorticity.zeta.copy_interior_from(&vorticity.zeta_tmp);
        }
    }

    pub fn all_finite(&self) -> bool {
        self.psi.all_finite()
            && self
                .vorticity
                .as_ref()
                .map_or(true, |vorticity| vorticity.zeta.all_finite())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Stage {
    Setup,
    Looping,
    Done,
}

/// Receives progress from the driver. Everything defaults to a no-op.
pub trait Monitor {
    fn start(&mut self, _config: &Config) {}

    fn progress(&mut self, _iteration: usize, _error: Option<Float>) {}

    fn finish(&mut self, _summary: &RunSummary) {}
}

pub struct NullMonitor;

impl Monitor for NullMonitor {}

pub struct Solver<'a> {
    config: &'a Config,
    flow: FlowField,
    stage: Stage,
    iteration: usize,
    error: Option<Float>,
    converged: bool,
}

impl<'a> Solver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            flow: FlowField::new(config.geometry, config.mode),
            stage: Stage::Setup,
            iteration: 0,
            error: None,
            converged: false,
        }
    }

    /// Applies the boundary conditions and moves on to the loop. Only the
    /// first call has an effect.
    pub fn setup(&mut self) {
        if self.stage == Stage::Setup {
            self.flow.apply_initial_conditions();
            self.stage = Stage::Looping;
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn error(&self) -> Option<Float> {
        self.error
    }

    pub fn flow(&self) -> &FlowField {
        &self.flow
    }

    pub fn into_flow(self) -> FlowField {
        self.flow
    }

    fn error_required(&self) -> bool {
        self.config.check_error()
            || self.iteration == self.config.num_iter
            || self.iteration % self.config.print_freq == 0
    }

    /// Advances one iteration. Returns the residual when it was evaluated.
    /// Does nothing once the driver is done.
    pub fn step(&mut self) -> CfdResult<Option<Float>> {
        self.setup();
        if self.stage != Stage::Looping {
            return Ok(None);
        }
        self.iteration += 1;

        self.flow.jacobi_step();

        let error = if self.error_required() {
            let error = self.flow.compute_error();
            if !error.is_finite() {
                warn!(iteration = self.iteration, "residual is not finite");
                return Err(CfdError::NonFiniteResidual {
                    iteration: self.iteration,
                });
            }
            self.error = Some(error);
            Some(error)
        } else {
            None
        };

        self.flow.copy_back();
        self.flow.boundary_zeta();
        trace!(iteration = self.iteration, "iteration complete");

        if let Some(error) = error {
            if self.config.check_error() && error < self.config.tolerance {
                info!(iteration = self.iteration, error, "converged");
                self.converged = true;
                self.stage = Stage::Done;
            }
        }
        if self.iteration >= self.config.num_iter {
            self.stage = Stage::Done;
        }
        Ok(error)
    }

    pub fn run<M: Monitor>(&mut self, monitor: &mut M) -> CfdResult<RunSummary> {
        self.setup();
        monitor.start(self.config);
        let simulation_time = Instant::now();
        while self.stage == Stage::Looping {
            let error = self.step()?;
            if self.iteration % self.config.print_freq == 0 {
                debug!(iteration = self.iteration, ?error, "progress");
                monitor.progress(self.iteration, error);
            }
        }
        let summary = RunSummary {
            iterations: self.iteration,
            error: self.error.unwrap_or(0.0),
            converged: self.converged,
            elapsed: simulation_time.elapsed(),
        };
        monitor.finish(&summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_field_layout_and_halo() {
        let mut field = Field::zeros(3, 4);
        assert_eq!(field.rows(), 5);
        assert_eq!(field.cols(), 6);
        assert_eq!(field.interior_shape(), (3, 4));
        field[[0, 2]] = 3.0;
        field[[4, 5]] = 4.0;
        field[[2, 2]] = 100.0;
        assert_relative_eq!(field.halo_sum_sq(), 25.0);
        assert_eq!(field.as_slice()[2], 3.0);
    }

    #[test]
    fn test_copy_interior_keeps_halo() {
        let mut dst = Field::zeros(4, 4);
        let mut src = Field::zeros(4, 4);
        src.fill(7.0);
        dst[[0, 0]] = -1.0;
        dst[[5, 3]] = -2.0;
        dst.copy_interior_from(&src);
        assert_eq!(dst[[0, 0]], -1.0);
        assert_eq!(dst[[5, 3]], -2.0);
        assert_eq!(dst[[0, 3]], 0.0);
        for i in 1..=4 {
            for j in 1..=4 {
                assert_eq!(dst[[i, j]], 7.0);
            }
        }
    }

    #[test]
    fn test_geometry_scaling() {
        let geometry = Geometry::scaled(2).unwrap();
        assert_eq!(geometry.m, 64);
        assert_eq!(geometry.n, 64);
        assert_eq!(geometry.barrier_width, 20);
        assert_eq!(geometry.channel_height, 30);
        assert_eq!(geometry.channel_width, 10);
    }

    #[test]
    fn test_geometry_rejects_out_of_bounds_slots() {
        assert!(matches!(
            Geometry::new(10, 10, 8, 2, 4),
            Err(CfdError::InvalidGeometry { .. })
        ));
        assert!(matches!(
            Geometry::new(10, 10, 2, 8, 4),
            Err(CfdError::InvalidGeometry { .. })
        ));
        assert!(matches!(
            Geometry::new(10, 10, 2, 2, 0),
            Err(CfdError::InvalidGeometry { .. })
        ));
        assert!(Geometry::new(10, 10, 7, 7, 4).is_ok());
    }

    #[test]
    fn test_config_rescales_reynolds() {
        let config = Config::new(2, 10, Some(3.0)).unwrap();
        assert_eq!(config.mode, FlowMode::Rotational { reynolds: 1.5 });
        assert_eq!(config.reynolds, Some(3.0));
        let config = Config::new(1, 10, None).unwrap();
        assert_eq!(config.mode, FlowMode::Irrotational);
    }

    #[test]
    fn test_config_rejects_unstable_reynolds() {
        assert!(matches!(
            Config::new(1, 10, Some(3.7)),
            Err(CfdError::UnstableReynolds { .. })
        ));
        // Same input is fine once the grid is refined.
        assert!(Config::new(2, 10, Some(7.0)).is_ok());
        assert!(matches!(
            Config::new(1, 10, Some(-1.0)),
            Err(CfdError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Config::new(0, 10, None),
            Err(CfdError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Config::new(1, 0, None),
            Err(CfdError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_bnorm_ignores_interior() {
        let geometry = Geometry::scaled(1).unwrap();
        let mut flow = FlowField::initialization(geometry, FlowMode::Rotational { reynolds: 1.0 });
        let bnorm = flow.bnorm;
        assert!(bnorm > 0.0);
        flow.psi[[5, 5]] = 123.0;
        flow.psi[[20, 7]] = -4.0;
        assert_relative_eq!(flow.boundary_norm(), bnorm);

        let again = FlowField::initialization(geometry, FlowMode::Rotational { reynolds: 1.0 });
        assert_eq!(again.bnorm, bnorm);
    }

    #[test]
    fn test_solver_fixed_iteration_count() {
        let config = Config::new(1, 25, None).unwrap().with_print_freq(10);
        let mut solver = Solver::new(&config);
        assert_eq!(solver.stage(), Stage::Setup);
        assert_eq!(solver.flow().bnorm, 0.0);

        struct Recorder(Vec<(usize, Option<Float>)>);
        impl Monitor for Recorder {
            fn progress(&mut self, iteration: usize, error: Option<Float>) {
                self.0.push((iteration, error));
            }
        }
        let mut recorder = Recorder(Vec::new());
        let summary = solver.run(&mut recorder).unwrap();

        assert_eq!(summary.iterations, 25);
        assert!(!summary.converged);
        assert!(summary.error >= 0.0);
        assert_eq!(solver.stage(), Stage::Done);
        assert_eq!(recorder.0.len(), 2);
        assert_eq!(recorder.0[0].0, 10);
        assert!(recorder.0[0].1.is_some());

        assert_eq!(solver.step().unwrap(), None);
        assert_eq!(solver.iteration(), 25);
    }

    #[test]
    fn test_error_only_evaluated_when_required() {
        let config = Config::new(1, 5, None).unwrap();
        let mut solver = Solver::new(&config);
        for _ in 0..4 {
            assert_eq!(solver.step().unwrap(), None);
        }
        assert!(solver.step().unwrap().is_some());
    }

    #[test]
    fn test_tolerance_stops_early_with_consistent_buffers() {
        let config = Config::new(1, 100_000, None).unwrap().with_tolerance(1e-3);
        let mut solver = Solver::new(&config);
        let summary = solver.run(&mut NullMonitor).unwrap();

        assert!(summary.converged);
        assert!(summary.iterations < 100_000);
        assert!(summary.error < 1e-3);
        let flow = solver.flow();
        let (m, n) = flow.psi.interior_shape();
        for i in 1..=m {
            for j in 1..=n {
                assert_eq!(flow.psi[[i, j]], flow.psi_tmp[[i, j]]);
            }
        }
    }

    #[test]
    fn test_non_finite_residual_fails_fast() {
        let config = Config::new(1, 1, Some(1.0)).unwrap();
        let mut solver = Solver::new(&config);
        solver.setup();
        assert_eq!(solver.stage(), Stage::Looping);
        solver.flow.psi[[5, 5]] = Float::NAN;
        assert!(matches!(
            solver.step(),
            Err(CfdError::NonFiniteResidual { iteration: 1 })
        ));
    }

    #[test]
    fn test_residual_non_increasing_for_laplace() {
        let geometry = Geometry::scaled(1).unwrap();
        let mut flow = FlowField::initialization(geometry, FlowMode::Irrotational);
        flow.jacobi_step();
        let first = flow.compute_error();
        flow.copy_back();
        let mut previous = first;
        for _ in 0..300 {
            flow.jacobi_step();
            let error = flow.compute_error();
            assert!(error <= previous * (1.0 + 1e-12));
            previous = error;
            flow.copy_back();
        }
        assert!(previous < 0.5 * first);
    }
}
