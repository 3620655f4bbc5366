//! Closed error taxonomy of the ampacity engine.
//!
//! Every failure path in the crate maps to exactly one variant here. Error
//! messages carry short stable codes so that service-layer reports can key on
//! them without parsing prose. Validation errors abort a solve; the two
//! degraded outcomes (`ThermalInfeasible`, `IterationDivergence`) are *not*
//! surfaced through this enum on the solve path - the solver returns a full
//! result flagged FAIL so reports can explain the failure - but they reuse the
//! same codes when the study engine tallies outcomes.

use thiserror::Error;

/// Enumeration of formal engine failures.
///
/// The taxonomy is closed: callers can match exhaustively and every numeric
/// domain error (`ln` of a non-positive argument, `sqrt` of a negative) is
/// trapped and mapped onto one of these variants before it can reach the
/// output. The engine never emits NaN or infinity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmpacityError {
    /// GEO-01: a dimension that must be strictly positive is not.
    #[error("GEO-01: Invalid geometry - {quantity} must be strictly positive, got {value}")]
    NonPositiveDimension { quantity: &'static str, value: f64 },

    /// GEO-02: a layer diameter ordering constraint is violated, for example a
    /// shield mean diameter at or below the diameter over insulation.
    #[error("GEO-02: Invalid geometry - {outer_name} ({outer} mm) must exceed {inner_name} ({inner} mm)")]
    LayerOrdering {
        outer_name: &'static str,
        outer: f64,
        inner_name: &'static str,
        inner: f64,
    },

    /// GEO-03: duct-bank occupancy is inconsistent (target not occupied, or an
    /// occupied position outside the declared grid).
    #[error("GEO-03: Invalid geometry - duct position ({row}, {col}) {problem}")]
    DuctPosition {
        row: usize,
        col: usize,
        problem: &'static str,
    },

    /// GEO-04: a cable or duct does not fit inside its declared envelope
    /// (bank bounds, burial depth versus outer diameter).
    #[error("GEO-04: Invalid geometry - {0}")]
    EnvelopeViolation(String),

    /// OPR-01: maximum conductor temperature does not exceed ambient.
    #[error("OPR-01: Invalid operating point - Tmax ({tmax} degC) must exceed Tamb ({tamb} degC)")]
    TemperatureOrdering { tmax: f64, tamb: f64 },

    /// OPR-02: load factor outside (0, 1].
    #[error("OPR-02: Invalid operating point - load factor {0} outside (0, 1]")]
    LoadFactorOutOfRange(f64),

    /// OPR-03: frequency unsupported where the tabulated Ycs fallback is
    /// reached (the CIGRE anchors exist at 50 and 60 Hz only).
    #[error("OPR-03: Invalid operating point - frequency {0} Hz has no tabulated Ycs column (50 or 60 Hz required)")]
    UnsupportedFrequency(f64),

    /// OPR-04: frequency or voltage is not strictly positive.
    #[error("OPR-04: Invalid operating point - {quantity} must be strictly positive, got {value}")]
    NonPositiveOperating { quantity: &'static str, value: f64 },

    /// MAT-01: a material name outside the closed enumerations. Reachable only
    /// through the string-typed surfaces (registry TOML, study CSV); inside the
    /// typed API the enums make this unrepresentable.
    #[error("MAT-01: Unknown material '{0}'")]
    UnknownMaterial(String),

    /// THM-01: dielectric losses alone exceed the thermal budget. Carried in
    /// the degraded result; also used by batch surfaces when tallying.
    #[error("THM-01: Thermally infeasible - dielectric loss {wd} W/m exhausts the {delta_t} K budget")]
    ThermalInfeasible { wd: f64, delta_t: f64 },

    /// ITR-01: the current-weighted mutual-heating fixed point failed to meet
    /// the convergence predicate within the iteration cap.
    #[error("ITR-01: Mutual-heating iteration did not converge within {iterations} passes (last relative change {last_change})")]
    IterationDivergence { iterations: u32, last_change: f64 },

    /// IO-01: study input could not be read or parsed.
    #[error("IO-01: Study input failure - {0}")]
    StudyInput(String),
}

impl AmpacityError {
    /// Stable machine-readable code of the variant, as embedded in the message.
    pub fn code(&self) -> &'static str {
        match self {
            AmpacityError::NonPositiveDimension { .. } => "GEO-01",
            AmpacityError::LayerOrdering { .. } => "GEO-02",
            AmpacityError::DuctPosition { .. } => "GEO-03",
            AmpacityError::EnvelopeViolation(_) => "GEO-04",
            AmpacityError::TemperatureOrdering { .. } => "OPR-01",
            AmpacityError::LoadFactorOutOfRange(_) => "OPR-02",
            AmpacityError::UnsupportedFrequency(_) => "OPR-03",
            AmpacityError::NonPositiveOperating { .. } => "OPR-04",
            AmpacityError::UnknownMaterial(_) => "MAT-01",
            AmpacityError::ThermalInfeasible { .. } => "THM-01",
            AmpacityError::IterationDivergence { .. } => "ITR-01",
            AmpacityError::StudyInput(_) => "IO-01",
        }
    }
}

/// Guard for logarithm arguments. Domain violations are promoted to the given
/// error instead of letting `ln` produce NaN or negative infinity.
#[inline]
pub(crate) fn guarded_ln(x: f64, on_domain: AmpacityError) -> Result<f64, AmpacityError> {
    if x > 0.0 && x.is_finite() {
        Ok(x.ln())
    } else {
        Err(on_domain)
    }
}
