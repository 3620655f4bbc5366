//! # Dielectric and Shield Losses
//!
//! **Layer:** Electrical / Loss Accounting
//! **Reference:** IEC 60287-1-1 sections 2.2 (dielectric) and 2.3 (sheath
//! loss factor)
//!
//! Per-unit-length heat sources other than the conductor I^2 R term. The
//! shield loss factor lambda1 splits into a circulating component, present
//! only when both ends of the shield are bonded, and an eddy component, which
//! is negligible for the shield constructions covered here and is carried as
//! zero.

use serde::{Deserialize, Serialize};

use crate::error::{guarded_ln, AmpacityError};
use crate::model::{Shield, ShieldBonding};
use crate::tables;

/// Dielectric loss evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DielectricLoss {
    /// Cable capacitance, F/m.
    pub capacitance_f_per_m: f64,
    /// Dielectric heat, W/m.
    pub wd_w_per_m: f64,
}

/// Capacitance of the coaxial insulation system and the resulting dielectric
/// heat Wd = 2 pi f C U0^2 tan(delta).
///
/// `dc_mm` is the conductor diameter, `di_mm` the diameter over insulation.
pub fn dielectric_loss(
    dc_mm: f64,
    di_mm: f64,
    relative_permittivity: f64,
    loss_tangent: f64,
    voltage_v: f64,
    frequency_hz: f64,
) -> Result<DielectricLoss, AmpacityError> {
    let ratio_ln = guarded_ln(
        di_mm / dc_mm,
        AmpacityError::LayerOrdering {
            outer_name: "diameter over insulation",
            outer: di_mm,
            inner_name: "conductor diameter",
            inner: dc_mm,
        },
    )?;
    let capacitance = 2.0 * std::f64::consts::PI * tables::EPSILON_0 * relative_permittivity / ratio_ln;
    let omega = 2.0 * std::f64::consts::PI * frequency_hz;
    let wd = omega * capacitance * voltage_v * voltage_v * loss_tangent;
    Ok(DielectricLoss { capacitance_f_per_m: capacitance, wd_w_per_m: wd })
}

/// Shield loss factor evaluation, kept component-wise for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldLoss {
    /// Total loss factor lambda1 applied by the solver.
    pub lambda1: f64,
    /// Circulating-current component lambda1'.
    pub circulating: f64,
    /// Eddy-current component lambda1''.
    pub eddy: f64,
    /// Shield resistance at the evaluation temperature, ohm/m.
    pub rs_ohm_per_m: f64,
    /// Shield reactance Xs, ohm/m (zero for an isolated cable).
    pub xs_ohm_per_m: f64,
}

impl ShieldLoss {
    /// A cable with no shield dissipates nothing there.
    pub fn none() -> Self {
        ShieldLoss { lambda1: 0.0, circulating: 0.0, eddy: 0.0, rs_ohm_per_m: 0.0, xs_ohm_per_m: 0.0 }
    }
}

/// Loss factor of a metallic shield at the evaluation temperature.
///
/// Xs = 2 pi f * 2e-7 * ln(2s / ds); lambda1' = (Rs/Rac) / (1 + (Rs/Xs)^2).
///
/// Bonding selects the participating components: single-point and ideally
/// cross-bonded shields carry no net circulating current, so only the (zero)
/// eddy term remains; both-ends bonding adds the circulating term.
pub fn shield_loss_factor(
    shield: Option<&Shield>,
    r_ac_ohm_per_m: f64,
    theta_c: f64,
    frequency_hz: f64,
    spacing_mm: Option<f64>,
) -> Result<ShieldLoss, AmpacityError> {
    let Some(shield) = shield else {
        return Ok(ShieldLoss::none());
    };

    let props = shield.material.properties();
    let area_m2 = shield.area_mm2() * 1e-6;
    if !(area_m2 > 0.0) {
        return Err(AmpacityError::NonPositiveDimension {
            quantity: "shield cross-section",
            value: area_m2,
        });
    }
    let rs = props.resistivity_20 / area_m2 * (1.0 + props.alpha_20 * (theta_c - 20.0));

    // Eddy component: negligible for tape, wire, corrugated and extruded
    // constructions at power frequency; carried as zero.
    let eddy = 0.0;

    // Circulating component: needs a neighbouring phase to close the loop.
    // The reactance formula demands 2s > ds; anything tighter would produce a
    // non-positive Xs.
    let (circulating, xs_report) = match spacing_mm {
        None => (0.0, 0.0),
        Some(spacing) => {
            if 2.0 * spacing <= shield.mean_diameter_mm {
                return Err(AmpacityError::LayerOrdering {
                    outer_name: "twice the axial spacing",
                    outer: 2.0 * spacing,
                    inner_name: "shield mean diameter",
                    inner: shield.mean_diameter_mm,
                });
            }
            let ratio_ln = (2.0 * spacing / shield.mean_diameter_mm).ln();
            let xs = 2.0 * std::f64::consts::PI * frequency_hz * 2e-7 * ratio_ln;
            let rs_over_xs = rs / xs;
            ((rs / r_ac_ohm_per_m) / (1.0 + rs_over_xs * rs_over_xs), xs)
        }
    };

    let lambda1 = match shield.bonding {
        ShieldBonding::SinglePoint | ShieldBonding::CrossBonded => eddy,
        ShieldBonding::BothEnds => circulating + eddy,
    };

    Ok(ShieldLoss { lambda1, circulating, eddy, rs_ohm_per_m: rs, xs_ohm_per_m: xs_report })
}

/// Conductor ohmic heat at a given current, W/m. Reported at the solved
/// ampacity.
#[inline]
pub fn conductor_loss(current_a: f64, r_ac_ohm_per_m: f64) -> f64 {
    current_a * current_a * r_ac_ohm_per_m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShieldMaterial, ShieldType};

    #[test]
    fn dielectric_loss_of_a_230kv_xlpe_core() {
        // 2535.6 mm^2 conductor, 23.01 mm XLPE wall.
        let loss = dielectric_loss(56.85, 102.87, 2.5, 0.001, 132_790.0, 60.0).unwrap();
        assert!((loss.capacitance_f_per_m - 2.345e-10).abs() < 5e-13);
        assert!((loss.wd_w_per_m - 1.559).abs() < 0.01, "Wd = {}", loss.wd_w_per_m);
    }

    #[test]
    fn dielectric_loss_requires_an_insulated_conductor() {
        let err = dielectric_loss(50.0, 50.0, 2.5, 0.001, 10_000.0, 60.0).unwrap_err();
        assert_eq!(err.code(), "GEO-02");
    }

    fn wire_shield(bonding: ShieldBonding) -> Shield {
        Shield {
            material: ShieldMaterial::Copper,
            shield_type: ShieldType::Wire,
            thickness_mm: 1.0,
            mean_diameter_mm: 71.0,
            bonding,
            cross_section_mm2: Some(10.0),
        }
    }

    #[test]
    fn bonding_selects_the_circulating_component() {
        let r_ac = 2.66e-5;
        let single = shield_loss_factor(
            Some(&wire_shield(ShieldBonding::SinglePoint)), r_ac, 90.0, 60.0, Some(300.0),
        )
        .unwrap();
        let cross = shield_loss_factor(
            Some(&wire_shield(ShieldBonding::CrossBonded)), r_ac, 90.0, 60.0, Some(300.0),
        )
        .unwrap();
        let both = shield_loss_factor(
            Some(&wire_shield(ShieldBonding::BothEnds)), r_ac, 90.0, 60.0, Some(300.0),
        )
        .unwrap();

        assert_eq!(single.lambda1, 0.0);
        assert_eq!(cross.lambda1, 0.0);
        assert!(both.lambda1 > 0.0);
        assert_eq!(both.lambda1, both.circulating);
        // All three see the same shield resistance.
        assert_eq!(single.rs_ohm_per_m, both.rs_ohm_per_m);
    }

    #[test]
    fn reactance_matches_the_closed_form() {
        let both = shield_loss_factor(
            Some(&wire_shield(ShieldBonding::BothEnds)), 2.66e-5, 90.0, 60.0, Some(300.0),
        )
        .unwrap();
        // Xs = 2 pi 60 * 2e-7 * ln(600/71).
        assert!((both.xs_ohm_per_m - 1.6091e-4).abs() / 1.6091e-4 < 1e-3);
        // lambda1' for this 10 mm^2 shield lands near 0.44.
        assert!((both.lambda1 - 0.44).abs() < 0.01, "lambda1 = {}", both.lambda1);
    }

    #[test]
    fn isolated_cable_has_no_circulating_path() {
        let loss = shield_loss_factor(
            Some(&wire_shield(ShieldBonding::BothEnds)), 2.66e-5, 90.0, 60.0, None,
        )
        .unwrap();
        assert_eq!(loss.lambda1, 0.0);
        assert!(loss.rs_ohm_per_m > 0.0);
    }

    #[test]
    fn spacing_tighter_than_the_shield_is_rejected() {
        let err = shield_loss_factor(
            Some(&wire_shield(ShieldBonding::BothEnds)), 2.66e-5, 90.0, 60.0, Some(30.0),
        )
        .unwrap_err();
        assert_eq!(err.code(), "GEO-02");
    }

    #[test]
    fn missing_shield_is_lossless() {
        let loss = shield_loss_factor(None, 2.66e-5, 90.0, 60.0, Some(300.0)).unwrap();
        assert_eq!(loss, ShieldLoss::none());
    }
}
