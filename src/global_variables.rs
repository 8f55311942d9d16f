pub type Float = f64;

pub const M_BASE: usize = 32;

pub const N_BASE: usize = 32;

pub const B_BASE: usize = 10;

pub const H_BASE: usize = 15;

pub const W_BASE: usize = 5;

pub const PRINT_FREQ: usize = 1000;

/// Tolerance for early convergence. A value <= 0 disables the check.
pub const TOLERANCE: Float = 0.0;

/// Upper bound for the rescaled Reynolds number of the explicit scheme.
pub const REYNOLDS_LIMIT: Float = 3.7;
