//! # Image-Method Mutual Heating
//!
//! **Layer:** Thermal / Cable-to-Cable Coupling
//! **Reference:** Neher and McGrath (1957); Kennelly's image construction
//!
//! The ground surface isotherm is replaced by a mirror heat sink: each heated
//! neighbour k raises the external thermal resistance seen by cable p by
//! rho / (2 pi) * ln(d'pk / dpk), where dpk is the direct distance and d'pk
//! the distance to the mirror image of k above the surface. The pairwise
//! coefficients form a symmetric zero-diagonal matrix, assembled once per
//! solve and reused across the current-weighted iterations.

use ndarray::Array2;

use crate::error::AmpacityError;
use crate::model::CablePosition;
use crate::tables::TWO_PI;

/// Pairwise mutual-heating coefficients, K.m/W per unit of neighbour weight.
#[derive(Debug, Clone, PartialEq)]
pub struct MutualField {
    coefficients: Array2<f64>,
}

impl MutualField {
    /// Assembles the coefficient matrix for a set of buried cable centres.
    ///
    /// Positions must be distinct and below the surface; coincident centres
    /// have no finite coupling and are rejected.
    pub fn new(positions: &[CablePosition], rho_soil: f64) -> Result<Self, AmpacityError> {
        let n = positions.len();
        let mut coefficients = Array2::zeros((n, n));

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = positions[i].x_m - positions[j].x_m;
                let dy = positions[i].y_m - positions[j].y_m;
                let direct = (dx * dx + dy * dy).sqrt();
                if !(direct > 0.0) {
                    return Err(AmpacityError::EnvelopeViolation(format!(
                        "cables {i} and {j} occupy the same position"
                    )));
                }
                let sum_y = positions[i].y_m + positions[j].y_m;
                let image = (dx * dx + sum_y * sum_y).sqrt();
                // Both centres sit below the surface, so image > direct and
                // the coefficient is strictly positive.
                let f = rho_soil / TWO_PI * (image / direct).ln();
                coefficients[(i, j)] = f;
                coefficients[(j, i)] = f;
            }
        }
        Ok(MutualField { coefficients })
    }

    pub fn cable_count(&self) -> usize {
        self.coefficients.nrows()
    }

    /// Pairwise coefficient F_pk (zero on the diagonal).
    pub fn coefficient(&self, p: usize, k: usize) -> f64 {
        self.coefficients[(p, k)]
    }

    /// Weighted mutual addition at cable p: sum over k != p of F_pk * w_k.
    /// With unit weights this is the uniform-load image sum.
    pub fn weighted_addition(&self, p: usize, weights: &[f64]) -> f64 {
        self.coefficients
            .row(p)
            .iter()
            .zip(weights)
            .map(|(f, w)| f * w)
            .sum()
    }
}
