use super::{Field, D};
use crate::global_variables::*;
use rayon::prelude::*;

pub const RGB_MAX: Float = 255.0;

/// Velocity at every interior cell from centred differences of psi,
/// row-major over `(i, j)` with `i` in `1..=m` and `j` in `1..=n`.
pub fn compute_velocity(psi: &Field) -> Vec<[Float; D]> {
    let (_, n) = psi.interior_shape();
    psi.interior_rows()
        .flat_map_iter(|(i, row)| {
            (1..=n).map(move |j| {
                let ux = (row[j + 1] - row[j - 1]) / 2.0;
                let uy = -(psi[[i + 1, j]] - psi[[i - 1, j]]) / 2.0;
                [ux, uy]
            })
        })
        .collect()
}

pub fn compute_max_speed(velocity: &[[Float; D]]) -> Float {
    velocity
        .par_iter()
        .map(|[ux, uy]| (ux * ux + uy * uy).sqrt())
        .reduce(|| 0.0, Float::max)
}

/// Colour intensity for the squared speed, compressed so slow regions
/// remain visible.
pub fn speed_hue(velocity: [Float; D]) -> Float {
    let [ux, uy] = velocity;
    (ux * ux + uy * uy).powf(0.4)
}

pub fn hue_to_rgb(hue: Float) -> [u8; 3] {
    [
        (RGB_MAX * colour_function(hue - 1.0)) as u8,
        (RGB_MAX * colour_function(hue - 0.5)) as u8,
        (RGB_MAX * colour_function(hue)) as u8,
    ]
}

fn colour_function(x: Float) -> Float {
    let x1 = 0.2;
    let x2 = 0.5;
    let abs_x = x.abs();
    if abs_x > x2 {
        0.0
    } else if abs_x < x1 {
        1.0
    } else {
        1.0 - ((abs_x - x1) / (x2 - x1)).powi(2)
    }
}
