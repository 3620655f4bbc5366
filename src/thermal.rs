//! # Thermal Resistance Network
//!
//! **Layer:** Thermal / Resistance Components
//! **Reference:** IEC 60287-2-1 sections 2.1 (internal layers), 2.2 (ducts
//! and external resistance); Neher and McGrath (1957) for the duct air gap
//! and the image-method external path
//!
//! Every component is a per-unit-length thermal resistance in K.m/W, computed
//! from validated geometry. Cable-layer inputs are in mm, installation
//! geometry in m, matching the data model's unit split.
//!
//! The external (earth) resistance branches at u = 2L/De = 10: the exact
//! isotherm form ln(u + sqrt(u^2 - 1)) below, the classical ln(4L/De)
//! approximation above, which agrees with the exact form to better than one
//! percent in that range.
//!
//! Duct banks use a two-zone external path, calibrated against commercial
//! reference studies: inside the bank each duct sees its concrete
//! confinement through the Kennelly factor at the concrete resistivity;
//! beyond the bank surface the whole group's heat shares one constriction
//! into the soil, carried per cable as N times the external resistance of
//! the equivalent bank cylinder. Duct-to-duct interaction keeps the
//! ground-surface image construction at the soil resistivity.

use serde::{Deserialize, Serialize};

use crate::error::{guarded_ln, AmpacityError};
use crate::tables::TWO_PI;

// ============================================================================
// DUCT AIR-GAP CONSTANTS (Neher-McGrath correlation)
// ============================================================================

/// Empirical duct air-film constants U, V, Y. The correlation takes the cable
/// overall diameter in metres and the conduit bore in millimetres.
pub const GAP_U: f64 = 1.87;
pub const GAP_V: f64 = 0.29;
pub const GAP_Y: f64 = 0.026;

// ============================================================================
// INTERNAL LAYERS
// ============================================================================

/// R1, insulation: rho_T / (2 pi) * ln(1 + 2 t1 / dc).
pub fn insulation_resistance(
    rho_thermal: f64,
    conductor_diameter_mm: f64,
    t1_mm: f64,
) -> Result<f64, AmpacityError> {
    let arg = 1.0 + 2.0 * t1_mm / conductor_diameter_mm;
    let ln = guarded_ln(
        arg,
        AmpacityError::NonPositiveDimension { quantity: "insulation thickness", value: t1_mm },
    )?;
    Ok(rho_thermal / TWO_PI * ln)
}

/// R2, jacket: rho_T / (2 pi) * ln(De / Ds), with Ds over the shield and De
/// the overall diameter.
pub fn jacket_resistance(
    rho_thermal: f64,
    diameter_over_shield_mm: f64,
    overall_diameter_mm: f64,
) -> Result<f64, AmpacityError> {
    let ln = guarded_ln(
        overall_diameter_mm / diameter_over_shield_mm,
        AmpacityError::LayerOrdering {
            outer_name: "overall diameter",
            outer: overall_diameter_mm,
            inner_name: "diameter over shield",
            inner: diameter_over_shield_mm,
        },
    )?;
    Ok(rho_thermal / TWO_PI * ln)
}

// ============================================================================
// CONDUIT SYSTEM (R3)
// ============================================================================

/// Conduit resistance, air film and wall kept separate for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConduitResistance {
    /// Convective/radiative film between cable surface and conduit bore.
    pub gap: f64,
    /// Conduit wall conduction.
    pub wall: f64,
}

impl ConduitResistance {
    pub fn none() -> Self {
        ConduitResistance { gap: 0.0, wall: 0.0 }
    }

    pub fn total(&self) -> f64 {
        self.gap + self.wall
    }
}

/// Air gap plus wall of a conduit or duct.
///
/// Gap: U / [pi * D_cable * (1 + 0.1 (V + Y theta_m) * D_conduit)], with the
/// cable overall diameter in metres and the conduit bore in millimetres;
/// theta_m is the mean temperature of the conduit interior in degC.
///
/// Wall: rho_T / (2 pi) * ln(D_outer / D_inner).
pub fn conduit_resistance(
    cable_od_mm: f64,
    conduit_id_mm: f64,
    conduit_od_mm: f64,
    rho_conduit: f64,
    theta_mean_c: f64,
) -> Result<ConduitResistance, AmpacityError> {
    let cable_od_m = cable_od_mm / 1000.0;
    let film = 1.0 + 0.1 * (GAP_V + GAP_Y * theta_mean_c) * conduit_id_mm;
    if !(film > 0.0) || !(cable_od_m > 0.0) {
        return Err(AmpacityError::NonPositiveDimension {
            quantity: "conduit film denominator",
            value: film,
        });
    }
    let gap = GAP_U / (std::f64::consts::PI * cable_od_m * film);

    let ln = guarded_ln(
        conduit_od_mm / conduit_id_mm,
        AmpacityError::LayerOrdering {
            outer_name: "conduit outer diameter",
            outer: conduit_od_mm,
            inner_name: "conduit inner diameter",
            inner: conduit_id_mm,
        },
    )?;
    let wall = rho_conduit / TWO_PI * ln;

    Ok(ConduitResistance { gap, wall })
}

// ============================================================================
// CONCRETE ENCASEMENT (Kennelly geometric factor)
// ============================================================================

/// Kennelly geometric factor of a duct inside a rectangular envelope:
/// G = ln[ (2 d_top * 2 d_bottom * 2 d_left * 2 d_right)^(1/4) / r_duct ]
/// with the four perpendicular distances from the duct centre to the concrete
/// faces, all in metres.
pub fn kennelly_geometric_factor(
    d_top_m: f64,
    d_bottom_m: f64,
    d_left_m: f64,
    d_right_m: f64,
    duct_radius_m: f64,
) -> Result<f64, AmpacityError> {
    for (name, d) in [
        ("distance to bank top", d_top_m),
        ("distance to bank bottom", d_bottom_m),
        ("distance to bank left face", d_left_m),
        ("distance to bank right face", d_right_m),
        ("duct radius", duct_radius_m),
    ] {
        if !(d > 0.0) || !d.is_finite() {
            return Err(AmpacityError::NonPositiveDimension { quantity: name, value: d });
        }
    }
    let mean = (2.0 * d_top_m * 2.0 * d_bottom_m * 2.0 * d_left_m * 2.0 * d_right_m).powf(0.25);
    guarded_ln(
        mean / duct_radius_m,
        AmpacityError::EnvelopeViolation(format!(
            "duct radius {duct_radius_m} m reaches the concrete boundary (geometric mean {mean} m)"
        )),
    )
}

/// Thermal resistance of the concrete envelope between a duct surface and
/// the bank boundary: rho_conc * G / (2 pi), with G the Kennelly factor of
/// the duct's position.
#[inline]
pub fn concrete_envelope_resistance(rho_concrete: f64, geometric_factor: f64) -> f64 {
    rho_concrete / TWO_PI * geometric_factor
}

/// Equivalent radius of a rectangular duct bank (width x height, metres):
/// ln(r_b) = (1/2)(x/y)(4/pi - x/y) ln(1 + y^2/x^2) + ln(x/2), with x the
/// shorter and y the longer side. The fit is tightest for aspect ratios
/// below about three and degrades gracefully beyond.
pub fn duct_bank_equivalent_radius(
    bank_width_m: f64,
    bank_height_m: f64,
) -> Result<f64, AmpacityError> {
    for (name, d) in [("bank width", bank_width_m), ("bank height", bank_height_m)] {
        if !(d > 0.0) || !d.is_finite() {
            return Err(AmpacityError::NonPositiveDimension { quantity: name, value: d });
        }
    }
    let (x, y) = if bank_width_m <= bank_height_m {
        (bank_width_m, bank_height_m)
    } else {
        (bank_height_m, bank_width_m)
    };
    let ratio = x / y;
    let ln_rb = 0.5 * ratio * (4.0 / std::f64::consts::PI - ratio) * (1.0 + (y * y) / (x * x)).ln()
        + (x / 2.0).ln();
    Ok(ln_rb.exp())
}

/// Shared bank-to-soil constriction seen by each of the `cables` loaded
/// ducts: the whole group's heat crosses the bank surface, so every cable
/// carries `cables` times the external resistance of the equivalent
/// cylinder at the bank-centre depth.
pub fn bank_earth_resistance(
    rho_soil: f64,
    depth_to_centre_m: f64,
    equivalent_radius_m: f64,
    cables: usize,
) -> Result<f64, AmpacityError> {
    let single = earth_resistance(rho_soil, depth_to_centre_m, 2.0 * equivalent_radius_m)?;
    Ok(cables as f64 * single)
}

// ============================================================================
// EXTERNAL (EARTH) RESISTANCE (R4)
// ============================================================================

/// Exact isotherm form, valid for u = 2L/De >= 1.
pub fn earth_resistance_exact(
    rho_soil: f64,
    depth_m: f64,
    outer_diameter_m: f64,
) -> Result<f64, AmpacityError> {
    let u = burial_ratio(depth_m, outer_diameter_m)?;
    Ok(rho_soil / TWO_PI * (u + (u * u - 1.0).sqrt()).ln())
}

/// Classical deep-burial approximation ln(4L/De).
pub fn earth_resistance_deep(
    rho_soil: f64,
    depth_m: f64,
    outer_diameter_m: f64,
) -> Result<f64, AmpacityError> {
    // Shares the u >= 1 domain guard with the exact form.
    let _ = burial_ratio(depth_m, outer_diameter_m)?;
    Ok(rho_soil / TWO_PI * (4.0 * depth_m / outer_diameter_m).ln())
}

/// R4 as used by the solver: exact form up to u = 10, the logarithmic
/// approximation beyond.
pub fn earth_resistance(
    rho_soil: f64,
    depth_m: f64,
    outer_diameter_m: f64,
) -> Result<f64, AmpacityError> {
    let u = burial_ratio(depth_m, outer_diameter_m)?;
    if u > 10.0 {
        earth_resistance_deep(rho_soil, depth_m, outer_diameter_m)
    } else {
        earth_resistance_exact(rho_soil, depth_m, outer_diameter_m)
    }
}

fn burial_ratio(depth_m: f64, outer_diameter_m: f64) -> Result<f64, AmpacityError> {
    if !(outer_diameter_m > 0.0) {
        return Err(AmpacityError::NonPositiveDimension {
            quantity: "outer diameter",
            value: outer_diameter_m,
        });
    }
    let u = 2.0 * depth_m / outer_diameter_m;
    // u = 1 puts the crown at the surface and collapses R4 to zero, so the
    // boundary itself is out of domain too.
    if u <= 1.0 || !u.is_finite() {
        return Err(AmpacityError::EnvelopeViolation(format!(
            "burial ratio 2L/De = {u:.3} at or below 1: body not fully below the surface"
        )));
    }
    Ok(u)
}
