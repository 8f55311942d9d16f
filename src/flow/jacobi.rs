//! Jacobi sweeps over the interior. Each output cell reads only the previous
//! iterate, so rows are updated in parallel without any coordination.

use super::Field;
use crate::global_variables::*;
use rayon::prelude::*;

/// Laplace update `psi_tmp = average of the four neighbours of psi`.
pub fn jacobi_step(psi_tmp: &mut Field, psi: &Field) {
    let (_, n) = psi.interior_shape();
    psi_tmp.interior_rows_mut().for_each(|(i, row)| {
        for j in 1..=n {
            row[j] = 0.25 * (psi[[i - 1, j]] + psi[[i + 1, j]] + psi[[i, j - 1]] + psi[[i, j + 1]]);
        }
    });
}

/// Coupled update of vorticity transport and the stream function Poisson
/// equation. `re` is the rescaled Reynolds number and must stay below
/// `REYNOLDS_LIMIT`, otherwise the iteration diverges.
pub fn jacobi_step_vort(
    zeta_tmp: &mut Field,
    psi_tmp: &mut Field,
    zeta: &Field,
    psi: &Field,
    re: Float,
) {
    let (_, n) = psi.interior_shape();
    let advection = re / 16.0;
    zeta_tmp
        .interior_rows_mut()
        .zip(psi_tmp.interior_rows_mut())
        .for_each(|((i, zeta_row), (_, psi_row))| {
            for j in 1..=n {
                let diffusion = 0.25
                    * (zeta[[i - 1, j]] + zeta[[i + 1, j]] + zeta[[i, j - 1]] + zeta[[i, j + 1]]);
                let jacobian = (psi[[i, j + 1]] - psi[[i, j - 1]])
                    * (zeta[[i + 1, j]] - zeta[[i - 1, j]])
                    - (psi[[i + 1, j]] - psi[[i - 1, j]]) * (zeta[[i, j + 1]] - zeta[[i, j - 1]]);
                zeta_row[j] = diffusion - advection * jacobian;
                psi_row[j] = 0.25
                    * (psi[[i - 1, j]] + psi[[i + 1, j]] + psi[[i, j - 1]] + psi[[i, j + 1]]
                        - zeta[[i, j]]);
            }
        });
}

/// Squared L2 distance between two iterates over the interior.
pub fn delta_sq(new: &Field, old: &Field) -> Float {
    let (_, n) = new.interior_shape();
    new.interior_rows()
        .zip(old.interior_rows())
        .map(|((_, new_row), (_, old_row))| {
            new_row[1..=n]
                .iter()
                .zip(&old_row[1..=n])
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<Float>()
        })
        .sum::<Float>()
}
