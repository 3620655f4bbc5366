//! # AC Conductor Resistance
//!
//! **Layer:** Electrical / Conductor Transport
//! **Reference:** IEC 60287-1-1 section 2.1; CIGRE empirical Ycs data for
//! large Milliken conductors
//!
//! DC resistance with linear temperature correction, skin-effect factor ys and
//! proximity-effect factor yp. For segmental (Milliken) conductors of 800 mm^2
//! and above the IEC skin series is out of its validity range; the engine then
//! substitutes the tabulated CIGRE Ycs value - unless the caller supplied an
//! explicit ks, which always wins.

use serde::{Deserialize, Serialize};

use crate::error::AmpacityError;
use crate::model::{Conductor, Stranding};
use crate::tables;

/// Which branch produced the skin-effect factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinEffectSource {
    /// IEC series, xs^2 <= 2.8.
    IecSeries,
    /// IEC alternative polynomial, xs^2 > 2.8.
    IecHighArgument,
    /// CIGRE empirical table for large Milliken conductors.
    CigreTable,
}

/// Resolved AC resistance with its intermediate factors, kept in the result
/// for report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcResistance {
    /// DC resistance at 20 degC, ohm/m.
    pub r_dc_20: f64,
    /// DC resistance at the evaluation temperature, ohm/m.
    pub r_dc: f64,
    pub ys: f64,
    pub yp: f64,
    /// R_ac = R_dc * (1 + ys + yp), ohm/m.
    pub r_ac: f64,
    pub skin_source: SkinEffectSource,
}

/// Shared skin/proximity argument factor F(x).
///
/// Piecewise on x^2 at 2.8:
/// - series form x^4 / (192 + 0.8 x^4) below,
/// - the alternative polynomial -0.136 - 0.0177 x + 0.0563 x^2 above, where
///   the linear coefficient multiplies x itself.
///
/// The polynomial dips fractionally below zero in a narrow band just above the
/// branch point; the factor is floored at zero there so the correction can
/// never reduce the resistance.
#[inline]
fn argument_factor(x_squared: f64) -> f64 {
    if x_squared <= 2.8 {
        let x4 = x_squared * x_squared;
        x4 / (192.0 + 0.8 * x4)
    } else {
        let x = x_squared.sqrt();
        (-0.136 - 0.0177 * x + 0.0563 * x_squared).max(0.0)
    }
}

/// DC resistance at temperature theta, ohm/m.
///
/// R_dc(theta) = R20 * (1 + alpha20 * (theta - 20)); R20 comes from the
/// material resistivity and cross-section when not supplied.
pub fn dc_resistance(conductor: &Conductor, theta_c: f64) -> (f64, f64) {
    let props = conductor.material.properties();
    let r20 = conductor
        .r20_ohm_per_m
        .unwrap_or(props.resistivity_20 / (conductor.cross_section_mm2 * 1e-6));
    let r_theta = r20 * (1.0 + props.alpha_20 * (theta_c - 20.0));
    (r20, r_theta)
}

/// Full AC resistance evaluation at the given conductor temperature.
///
/// `spacing_mm` is the axial spacing to the neighbouring phase; `None` for an
/// isolated cable, which has no proximity term.
pub fn ac_resistance(
    conductor: &Conductor,
    theta_c: f64,
    frequency_hz: f64,
    spacing_mm: Option<f64>,
) -> Result<AcResistance, AmpacityError> {
    let (r_dc_20, r_dc) = dc_resistance(conductor, theta_c);
    let (ks_default, kp_default) = tables::default_skin_coefficients(conductor.stranding);
    let ks = conductor.ks.unwrap_or(ks_default);
    let kp = conductor.kp.unwrap_or(kp_default);

    // Stage 1: skin effect. The CIGRE table engages only for large Milliken
    // conductors with no user-supplied ks; an explicit ks always wins.
    let milliken_fallback = conductor.stranding == Stranding::Segmental
        && conductor.cross_section_mm2 >= tables::YCS_MIN_AREA_MM2
        && conductor.ks.is_none();

    let (ys, skin_source) = if milliken_fallback {
        let ycs = tables::ycs_lookup(conductor.cross_section_mm2, frequency_hz)?;
        (ycs, SkinEffectSource::CigreTable)
    } else {
        let xs_squared = (8.0 * std::f64::consts::PI * frequency_hz / r_dc) * 1e-7 * ks;
        let source = if xs_squared <= 2.8 {
            SkinEffectSource::IecSeries
        } else {
            SkinEffectSource::IecHighArgument
        };
        (argument_factor(xs_squared), source)
    };

    // Stage 2: proximity effect for the trefoil / equal-spacing arrangement.
    let yp = match spacing_mm {
        None => 0.0,
        Some(spacing) => {
            let xp_squared = (8.0 * std::f64::consts::PI * frequency_hz / r_dc) * 1e-7 * kp;
            let f_xp = argument_factor(xp_squared);
            let ratio = conductor.diameter() / spacing;
            let ratio2 = ratio * ratio;
            f_xp * ratio2 * (0.312 * ratio2 + 1.18 / (f_xp + 0.27))
        }
    };

    let r_ac = r_dc * (1.0 + ys + yp);
    Ok(AcResistance { r_dc_20, r_dc, ys, yp, r_ac, skin_source })
}
