use super::*;
use crate::global_variables::*;

const WALLS: [BoundaryFace; 4] = [
    BoundaryFace::South,
    BoundaryFace::North,
    BoundaryFace::West,
    BoundaryFace::East,
];

/// Box faces; `i` runs west to east, `j` south to north.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum BoundaryFace {
    East,
    West,
    North,
    South,
}

impl FlowField {
    pub fn boundary_psi(&mut self) {
        boundary_psi(&mut self.psi, &self.geometry);
    }

    /// Wall vorticity from the current psi. A no-op for irrotational flow.
    pub fn boundary_zeta(&mut self) {
        if let Some(vorticity) = self.vorticity.as_mut() {
            boundary_zeta(&mut vorticity.zeta, &self.psi);
        }
    }

    pub fn boundary_norm(&self) -> Float {
        boundary_norm(&self.psi, self.vorticity.as_ref().map(|v| &v.zeta))
    }
}

/// Fixed stream function on the walls: an inflow slot on the south wall
/// right after the barrier and an outflow slot on the east wall above the
/// channel height. Total flux through both slots is `channel_width`.
pub fn boundary_psi(psi: &mut Field, geometry: &Geometry) {
    let Geometry {
        m,
        barrier_width: b,
        channel_height: h,
        channel_width: w,
        ..
    } = *geometry;

    for i in b + 1..b + w {
        psi[[i, 0]] = (i - b) as Float;
    }
    for i in b + w..=m {
        psi[[i, 0]] = w as Float;
    }

    for j in 1..=h {
        psi[[m + 1, j]] = w as Float;
    }
    for j in h + 1..h + w {
        psi[[m + 1, j]] = (w + h - j) as Float;
    }
}

pub fn boundary_zeta(zeta: &mut Field, psi: &Field) {
    for face in WALLS {
        wall_vorticity(zeta, psi, face);
    }
}

/// `zeta = 2 (psi_neighbour - psi_wall)` along one face, corners excluded.
fn wall_vorticity(zeta: &mut Field, psi: &Field, face: BoundaryFace) {
    let (m, n) = psi.interior_shape();
    match face {
        BoundaryFace::South => {
            for i in 1..=m {
                zeta[[i, 0]] = 2.0 * (psi[[i, 1]] - psi[[i, 0]]);
            }
        }
        BoundaryFace::North => {
            for i in 1..=m {
                zeta[[i, n + 1]] = 2.0 * (psi[[i, n]] - psi[[i, n + 1]]);
            }
        }
        BoundaryFace::West => {
            for j in 1..=n {
                zeta[[0, j]] = 2.0 * (psi[[1, j]] - psi[[0, j]]);
            }
        }
        BoundaryFace::East => {
            for j in 1..=n {
                zeta[[m + 1, j]] = 2.0 * (psi[[m, j]] - psi[[m + 1, j]]);
            }
        }
    }
}

/// Norm of the boundary values, used to make the residual relative.
pub fn boundary_norm(psi: &Field, zeta: Option<&Field>) -> Float {
    let mut bnorm = psi.halo_sum_sq();
    if let Some(zeta) = zeta {
        bnorm += zeta.halo_sum_sq();
    }
    bnorm.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn geometry() -> Geometry {
        Geometry::scaled(1).unwrap()
    }

    #[test]
    fn test_psi_inlet_and_outlet_profile() {
        let mut psi = Field::zeros(32, 32);
        boundary_psi(&mut psi, &geometry());

        assert_eq!(psi[[10, 0]], 0.0);
        assert_eq!(psi[[11, 0]], 1.0);
        assert_eq!(psi[[14, 0]], 4.0);
        assert_eq!(psi[[15, 0]], 5.0);
        assert_eq!(psi[[32, 0]], 5.0);

        assert_eq!(psi[[33, 1]], 5.0);
        assert_eq!(psi[[33, 15]], 5.0);
        assert_eq!(psi[[33, 16]], 4.0);
        assert_eq!(psi[[33, 19]], 1.0);
        assert_eq!(psi[[33, 20]], 0.0);

        assert_eq!(psi[[0, 10]], 0.0);
        assert_eq!(psi[[10, 33]], 0.0);
        assert_eq!(psi[[16, 16]], 0.0);
    }

    #[test]
    fn test_psi_boundary_is_idempotent() {
        let mut once = Field::zeros(32, 32);
        boundary_psi(&mut once, &geometry());
        let mut twice = once.clone();
        boundary_psi(&mut twice, &geometry());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_zeta_boundary_from_psi() {
        let mut psi = Field::zeros(32, 32);
        boundary_psi(&mut psi, &geometry());
        psi[[12, 1]] = 3.5;
        psi[[32, 16]] = 2.0;
        let mut zeta = Field::zeros(32, 32);
        boundary_zeta(&mut zeta, &psi);

        assert_relative_eq!(zeta[[12, 0]], 2.0 * (3.5 - 2.0));
        assert_relative_eq!(zeta[[33, 16]], 2.0 * (2.0 - 4.0));
        assert_relative_eq!(zeta[[20, 0]], -10.0);
        assert_eq!(zeta[[0, 0]], 0.0);
        assert_eq!(zeta[[33, 33]], 0.0);
        assert_eq!(zeta[[16, 16]], 0.0);
    }

    #[test]
    fn test_zeta_boundary_is_idempotent() {
        let mut flow =
            FlowField::initialization(geometry(), crate::FlowMode::Rotational { reynolds: 2.0 });
        for _ in 0..10 {
            flow.jacobi_step();
            flow.copy_back();
            flow.boundary_zeta();
        }
        flow.boundary_zeta();
        let first = flow.vorticity.as_ref().unwrap().zeta.clone();
        flow.boundary_zeta();
        let second = &flow.vorticity.as_ref().unwrap().zeta;
        assert_eq!(&first, second);
    }

    #[test]
    fn test_boundary_norm_matches_profile() {
        let mut psi = Field::zeros(32, 32);
        boundary_psi(&mut psi, &geometry());
        // 1 + 4 + 9 + 16 + 18 * 25 on the south wall, 15 * 25 + 16 + 9 + 4 + 1 on the east wall.
        assert_relative_eq!(boundary_norm(&psi, None), 885.0_f64.sqrt());
    }
}
