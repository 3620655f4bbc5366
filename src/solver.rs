// src/solver.rs

//! # Ampacity Solver
//!
//! **Layer:** Orchestration / Coupled Inversion
//! **Reference:** IEC 60287-1-1 section 1.4 (permissible current rating);
//! Neher and McGrath (1957) for the current-weighted interaction
//!
//! Closes the loop on the rating equation
//!
//! delta_T = I^2 * R_ac * (1 + lambda1) * Sigma_R + Wd * Sigma_R'
//!
//! with Sigma_R' carrying half of R1, the dielectric loss being injected at
//! the insulation mid-point. All temperature-dependent quantities are
//! evaluated at Tmax, the boundary condition of the rating problem.
//!
//! Multi-cable installations couple through the image-method field. The
//! neighbour weights follow the heat each cable actually emits at its own
//! ampacity, so the fixed point is an explicit bounded loop: at most 20
//! passes, convergence when no cable current moves by more than one percent,
//! divergence reported as a flagged degraded result rather than an endless
//! oscillation.

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::coupling::MutualField;
use crate::error::AmpacityError;
use crate::losses::{self, ShieldLoss};
use crate::model::{CableDesign, Installation, OperatingConditions};
use crate::resistance::{self, AcResistance};
use crate::tables::{self, MaterialRegistry};
use crate::thermal::{self, ConduitResistance};

/// Hard cap on the mutual-heating fixed point.
pub const MAX_COUPLING_ITERATIONS: u32 = 20;

/// Convergence predicate: largest relative current change below one percent.
pub const COUPLING_TOLERANCE: f64 = 0.01;

// ============================================================================
// REQUEST / RESULT SURFACE
// ============================================================================

/// Complete rating request. `target_current_a` and `margin` drive the
/// PASS/FAIL verdict; without them any feasible positive rating passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmpacityRequest {
    pub cable: CableDesign,
    pub operating: OperatingConditions,
    pub installation: Installation,
    pub target_current_a: Option<f64>,
    pub margin: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignStatus {
    Pass,
    Fail,
}

/// Degraded-solve causes carried inside an otherwise complete result so that
/// reports can explain the failure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum SolveFailure {
    /// THM-01: the dielectric heat alone exhausts the thermal budget.
    ThermalInfeasible { wd_w_per_m: f64, delta_t_k: f64 },
    /// ITR-01: the coupling loop hit its cap; currents hold the last estimate.
    IterationDivergence { iterations: u32, last_change: f64 },
}

/// Heat sources at the solved ampacity, W/m.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossBreakdown {
    pub conductor_w_per_m: f64,
    pub dielectric_w_per_m: f64,
    pub shield_w_per_m: f64,
    pub capacitance_f_per_m: f64,
}

/// The assembled resistance tree at the rated cable, K.m/W.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalNetwork {
    pub r1_insulation: f64,
    pub r2_jacket: f64,
    pub r3_gap: f64,
    pub r3_wall: f64,
    /// Concrete envelope between the duct surface and the bank boundary
    /// (Kennelly factor at the concrete resistivity); zero outside banks.
    pub r_concrete: f64,
    /// Soil path at the cable's own depth, or for duct banks the shared
    /// bank-to-soil constriction every loaded duct carries in full.
    pub r4_earth: f64,
    pub r_mutual: f64,
    pub r4_effective: f64,
    /// Sigma_R seen by the conductor heat.
    pub total: f64,
    /// Sigma_R' seen by the dielectric heat (half of R1).
    pub total_dielectric: f64,
}

/// Temperature rise decomposition at the solved ampacity, K per layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRise {
    pub ambient_c: f64,
    pub conductor_c: f64,
    pub total_k: f64,
    pub insulation_k: f64,
    pub jacket_k: f64,
    pub conduit_k: f64,
    pub concrete_k: f64,
    pub earth_k: f64,
}

/// Rated temperature ceilings of the insulation system, reported only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsulationLimits {
    pub continuous_c: f64,
    pub emergency_c: f64,
    pub short_circuit_c: f64,
}

/// Full solve outcome. Returned by value; shares nothing with the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmpacityResult {
    /// Steady-state rating of the target cable, A.
    pub ampacity_a: f64,
    /// Load-factor scaled cyclic rating, A.
    pub cyclic_ampacity_a: f64,
    pub design_status: DesignStatus,
    pub failure: Option<SolveFailure>,
    pub ac_resistance: AcResistance,
    pub shield: ShieldLoss,
    pub losses: LossBreakdown,
    pub thermal: ThermalNetwork,
    pub temperature: TemperatureRise,
    /// R4_effective / R4: unity for an isolated cable.
    pub mutual_heating_multiplier: f64,
    pub insulation_limits: InsulationLimits,
    pub iterations: u32,
    pub converged: bool,
    pub per_cable_ampacity_a: Vec<f64>,
    pub target_index: usize,
}

impl AmpacityResult {
    /// JSON rendering for the service layer.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// COUPLED FIXED POINT
// ============================================================================

/// Per-cable slice of the resistance network that does not change across
/// coupling passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NetworkSite {
    /// Self external resistance: the soil path at the cable's own depth, or
    /// the shared bank constriction for a duct bank.
    pub r4: f64,
    /// Concrete envelope resistance at the cable's own bank position.
    pub r_concrete: f64,
    /// R1 + R2 + R3 + R_conc.
    pub fixed: f64,
    /// 0.5 R1 + R2 + R3 + R_conc.
    pub fixed_dielectric: f64,
}

pub(crate) struct CouplingProblem<'a> {
    /// R_ac * (1 + lambda1), ohm/m.
    pub heat_resistance: f64,
    /// Dielectric heat, W/m.
    pub wd: f64,
    /// Tmax - Tamb, K.
    pub delta_t: f64,
    pub sites: &'a [NetworkSite],
    pub field: &'a MutualField,
}

pub(crate) struct CouplingOutcome {
    pub currents: Vec<f64>,
    pub weights: Vec<f64>,
    pub iterations: u32,
    pub converged: bool,
    pub last_change: f64,
}

/// Per-cable rating at the current neighbour weights. A non-positive
/// numerator means the dielectric heat alone exceeds the budget at this site;
/// the current is pinned to zero and the verdict is decided at the target.
#[inline]
fn site_current(problem: &CouplingProblem<'_>, index: usize, weights: &[f64]) -> f64 {
    let site = &problem.sites[index];
    let r4_effective = site.r4 + problem.field.weighted_addition(index, weights);
    let sigma_r = site.fixed + r4_effective;
    let sigma_r_dielectric = site.fixed_dielectric + r4_effective;
    let numerator = problem.delta_t - problem.wd * sigma_r_dielectric;
    if numerator > 0.0 && sigma_r > 0.0 {
        (numerator / (problem.heat_resistance * sigma_r)).sqrt()
    } else {
        0.0
    }
}

/// The bounded current-weighted fixed point.
///
/// Pass structure: compute every cable's rating at the standing weights,
/// measure the largest relative current change against the previous pass,
/// then renormalize the weights by each cable's heat output over the mean.
/// The first pass only establishes the baseline. `initial_weights` lets a
/// caller resume from a previous outcome.
pub(crate) fn run_coupling(
    problem: &CouplingProblem<'_>,
    initial_weights: Option<Vec<f64>>,
) -> CouplingOutcome {
    let n = problem.sites.len();
    let mut weights = initial_weights.unwrap_or_else(|| vec![1.0; n]);
    let mut currents = vec![0.0; n];
    let mut last_change = f64::INFINITY;
    let mut converged = false;
    let mut iterations = 0;

    for pass in 1..=MAX_COUPLING_ITERATIONS {
        iterations = pass;
        let next: Vec<f64> = (0..n).map(|i| site_current(problem, i, &weights)).collect();

        let change = currents
            .iter()
            .zip(&next)
            .map(|(prev, cur)| {
                if *prev > 0.0 {
                    ((cur - prev) / prev).abs()
                } else if *cur > 0.0 {
                    1.0
                } else {
                    0.0
                }
            })
            .fold(0.0_f64, f64::max);
        currents = next;

        debug!(
            "coupling pass {pass}: max relative current change {change:.5}, \
             currents {currents:?}"
        );

        // A single cable has no neighbours to re-weight: its first pass is
        // exact. A true multi-cable run needs a baseline pass before the
        // change means anything.
        if n <= 1 {
            converged = true;
            last_change = 0.0;
            break;
        }
        if pass > 1 {
            last_change = change;
            if change < COUPLING_TOLERANCE {
                converged = true;
                break;
            }
        }

        let heats: Vec<f64> = currents
            .iter()
            .map(|i| i * i * problem.heat_resistance + problem.wd)
            .collect();
        let mean_heat = heats.iter().sum::<f64>() / n as f64;
        if mean_heat > 0.0 {
            weights = heats.iter().map(|q| q / mean_heat).collect();
        }
    }

    if !converged {
        warn!(
            "coupling fixed point hit the {MAX_COUPLING_ITERATIONS}-pass cap \
             with relative change {last_change:.5}"
        );
    }

    CouplingOutcome { currents, weights, iterations, converged, last_change }
}

// ============================================================================
// SOLVE
// ============================================================================

/// Rates a cable installation against the embedded standards tables.
pub fn solve(request: &AmpacityRequest) -> Result<AmpacityResult, AmpacityError> {
    solve_with_registry(request, &MaterialRegistry::embedded())
}

/// Rates a cable installation with caller-supplied material overrides.
pub fn solve_with_registry(
    request: &AmpacityRequest,
    registry: &MaterialRegistry,
) -> Result<AmpacityResult, AmpacityError> {
    let cable = &request.cable;
    let operating = &request.operating;
    let installation = &request.installation;

    // Stage 1: staged input validation. Nothing numerical runs on raw input.
    cable.validate()?;
    operating.validate()?;
    let cable_od_mm = cable.overall_diameter_mm();
    installation.validate(cable_od_mm)?;

    // Stage 2: resolved material properties and the thermal budget.
    let insulation_props = registry.insulation(cable.insulation.material);
    let relative_permittivity = cable
        .insulation
        .relative_permittivity
        .unwrap_or(insulation_props.relative_permittivity);
    let loss_tangent = cable.insulation.loss_tangent.unwrap_or(insulation_props.loss_tangent);
    let rho_insulation = cable
        .insulation
        .thermal_resistivity
        .unwrap_or(insulation_props.thermal_resistivity);

    let t_max = operating
        .max_conductor_temp_c
        .unwrap_or(insulation_props.max_continuous_c);
    let t_amb = installation.ambient_c();
    if t_max <= t_amb {
        return Err(AmpacityError::TemperatureOrdering { tmax: t_max, tamb: t_amb });
    }
    let delta_t = t_max - t_amb;

    // Stage 3: electrical quantities, all at the Tmax boundary condition.
    let spacing_mm = installation.axial_spacing_mm();
    let ac = resistance::ac_resistance(
        &cable.conductor,
        t_max,
        operating.frequency_hz,
        spacing_mm,
    )?;
    let dielectric = losses::dielectric_loss(
        cable.conductor.diameter(),
        cable.diameter_over_insulation_mm(),
        relative_permittivity,
        loss_tangent,
        operating.voltage_v,
        operating.frequency_hz,
    )?;
    let shield = losses::shield_loss_factor(
        cable.shield.as_ref(),
        ac.r_ac,
        t_max,
        operating.frequency_hz,
        spacing_mm,
    )?;
    let heat_resistance = ac.r_ac * (1.0 + shield.lambda1);

    // Stage 4: internal layer resistances shared by every cable.
    let r1 = thermal::insulation_resistance(
        rho_insulation,
        cable.conductor.diameter(),
        cable.insulation.t1_mm(),
    )?;
    let r2 = match &cable.jacket {
        Some(jacket) => thermal::jacket_resistance(
            registry.jacket(jacket.material),
            cable.diameter_over_shield_mm(),
            cable_od_mm,
        )?,
        None => 0.0,
    };
    let theta_mean = (t_max + t_amb) / 2.0;
    let (r3, external_diameter_m) = match installation {
        Installation::DirectBuried { .. } => (ConduitResistance::none(), cable_od_mm / 1000.0),
        Installation::Conduit { conduit_id_mm, conduit_od_mm, conduit_material, .. }
        | Installation::DuctBank {
            duct_id_mm: conduit_id_mm,
            duct_od_mm: conduit_od_mm,
            conduit_material,
            ..
        } => (
            thermal::conduit_resistance(
                cable_od_mm,
                *conduit_id_mm,
                *conduit_od_mm,
                tables::conduit_thermal_resistivity(*conduit_material),
                theta_mean,
            )?,
            conduit_od_mm / 1000.0,
        ),
    };

    // Stage 5: per-cable external path. Flat and conduit runs see the soil
    // directly at their own depth; duct banks follow the two-zone
    // convention: concrete confinement (Kennelly factor at the concrete
    // resistivity) in series with the shared bank-to-soil constriction,
    // which every loaded duct carries in full.
    let positions = installation.positions();
    let rho_soil = installation.soil_resistivity();
    let fixed_internal = r1 + r2 + r3.total();
    let fixed_internal_dielectric = 0.5 * r1 + r2 + r3.total();

    let bank_r4 = match installation {
        Installation::DuctBank {
            depth_to_top_m, bank_width_m, bank_height_m, occupied, ..
        } => {
            let equivalent_radius =
                thermal::duct_bank_equivalent_radius(*bank_width_m, *bank_height_m)?;
            thermal::bank_earth_resistance(
                rho_soil,
                depth_to_top_m + bank_height_m / 2.0,
                equivalent_radius,
                occupied.len(),
            )?
        }
        _ => 0.0,
    };

    let mut sites = Vec::with_capacity(positions.len());
    for position in &positions {
        let (r4, r_concrete) = match installation {
            Installation::DuctBank {
                depth_to_top_m,
                concrete_resistivity,
                bank_width_m,
                bank_height_m,
                duct_od_mm,
                ..
            } => {
                let bank_bottom = depth_to_top_m + bank_height_m;
                let half_width = bank_width_m / 2.0;
                let g = thermal::kennelly_geometric_factor(
                    position.y_m - depth_to_top_m,
                    bank_bottom - position.y_m,
                    position.x_m + half_width,
                    half_width - position.x_m,
                    duct_od_mm / 2000.0,
                )?;
                (bank_r4, thermal::concrete_envelope_resistance(*concrete_resistivity, g))
            }
            _ => (
                thermal::earth_resistance(rho_soil, position.y_m, external_diameter_m)?,
                0.0,
            ),
        };
        sites.push(NetworkSite {
            r4,
            r_concrete,
            fixed: fixed_internal + r_concrete,
            fixed_dielectric: fixed_internal_dielectric + r_concrete,
        });
    }

    // Stage 6: the coupled fixed point.
    let field = MutualField::new(&positions, rho_soil)?;
    let problem = CouplingProblem {
        heat_resistance,
        wd: dielectric.wd_w_per_m,
        delta_t,
        sites: &sites,
        field: &field,
    };
    let outcome = run_coupling(&problem, None);

    let mut failure = if outcome.converged {
        None
    } else {
        Some(SolveFailure::IterationDivergence {
            iterations: outcome.iterations,
            last_change: outcome.last_change,
        })
    };

    // Stage 7: rate the target cable. Duct banks rate the declared target;
    // flat formations rate the limiting cable.
    let target_index = match installation {
        Installation::DuctBank { .. } => installation.target_index(),
        _ => outcome
            .currents
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i),
    };
    let site = sites[target_index];
    let r_mutual = field.weighted_addition(target_index, &outcome.weights);
    let r4_effective = site.r4 + r_mutual;
    let sigma_r = site.fixed + r4_effective;
    let sigma_r_dielectric = site.fixed_dielectric + r4_effective;

    let ampacity = outcome.currents[target_index];
    if delta_t - dielectric.wd_w_per_m * sigma_r_dielectric <= 0.0 && failure.is_none() {
        failure = Some(SolveFailure::ThermalInfeasible {
            wd_w_per_m: dielectric.wd_w_per_m,
            delta_t_k: delta_t,
        });
    }

    // Stage 8: report assembly at the solved current.
    let conductor_w = losses::conductor_loss(ampacity, ac.r_ac);
    let shield_w = conductor_w * shield.lambda1;
    let heat_total = ampacity * ampacity * heat_resistance;

    let insulation_k = heat_total * r1 + dielectric.wd_w_per_m * 0.5 * r1;
    let jacket_k = (heat_total + dielectric.wd_w_per_m) * r2;
    let conduit_k = (heat_total + dielectric.wd_w_per_m) * r3.total();
    let concrete_k = (heat_total + dielectric.wd_w_per_m) * site.r_concrete;
    let earth_k = (heat_total + dielectric.wd_w_per_m) * r4_effective;
    let total_k = insulation_k + jacket_k + conduit_k + concrete_k + earth_k;

    let design_status = if failure.is_some() || !(ampacity > 0.0) {
        DesignStatus::Fail
    } else {
        match request.target_current_a {
            Some(target) => {
                let required = target * (1.0 + request.margin.unwrap_or(0.0));
                if ampacity >= required {
                    DesignStatus::Pass
                } else {
                    DesignStatus::Fail
                }
            }
            None => DesignStatus::Pass,
        }
    };

    Ok(AmpacityResult {
        ampacity_a: ampacity,
        cyclic_ampacity_a: ampacity / operating.load_factor.sqrt(),
        design_status,
        failure,
        ac_resistance: ac,
        shield,
        losses: LossBreakdown {
            conductor_w_per_m: conductor_w,
            dielectric_w_per_m: dielectric.wd_w_per_m,
            shield_w_per_m: shield_w,
            capacitance_f_per_m: dielectric.capacitance_f_per_m,
        },
        thermal: ThermalNetwork {
            r1_insulation: r1,
            r2_jacket: r2,
            r3_gap: r3.gap,
            r3_wall: r3.wall,
            r_concrete: site.r_concrete,
            r4_earth: site.r4,
            r_mutual,
            r4_effective,
            total: sigma_r,
            total_dielectric: sigma_r_dielectric,
        },
        temperature: TemperatureRise {
            ambient_c: t_amb,
            conductor_c: t_amb + total_k,
            total_k,
            insulation_k,
            jacket_k,
            conduit_k,
            concrete_k,
            earth_k,
        },
        mutual_heating_multiplier: r4_effective / site.r4,
        insulation_limits: InsulationLimits {
            continuous_c: insulation_props.max_continuous_c,
            emergency_c: insulation_props.max_emergency_c,
            short_circuit_c: insulation_props.max_short_circuit_c,
        },
        iterations: outcome.iterations,
        converged: outcome.converged,
        per_cable_ampacity_a: outcome.currents,
        target_index,
    })
}

/// Rates a batch of independent requests. `deterministic` forces strictly
/// ordered sequential evaluation; otherwise the batch spreads across the
/// rayon pool. Either way the per-request results are bitwise identical, the
/// flag only pins the execution order.
pub fn solve_batch(
    requests: &[AmpacityRequest],
    deterministic: bool,
) -> Vec<Result<AmpacityResult, AmpacityError>> {
    if deterministic {
        requests.iter().map(solve).collect()
    } else {
        requests.par_iter().map(solve).collect()
    }
}
