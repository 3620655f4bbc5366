//! # Material and Standards Tables
//!
//! **Layer:** Constants / Standards Data
//! **Reference:** IEC 60287-1-1 Table 1, IEC 60287-2-1 Table 1, CIGRE TB 272
//!
//! Read-only after initialization: every table here is embedded as immutable
//! data and shared freely across concurrent solves. The only mutable surface
//! is the [`MaterialRegistry`], a per-caller value that layers user overrides
//! (loaded from a TOML document) over the embedded defaults.

use serde::Deserialize;
use std::f64::consts::PI;

use crate::error::AmpacityError;
use crate::model::{
    ConductorMaterial, ConduitMaterial, InsulationMaterial, JacketMaterial, ShieldMaterial,
    Stranding,
};

// ============================================================================
// PHYSICAL CONSTANTS
// ============================================================================

/// Vacuum permittivity, F/m.
pub const EPSILON_0: f64 = 8.854e-12;

/// Angular prefactor 2*pi, kept named so the thermal formulas read like the
/// standard: rho_T / TWO_PI * ln(...).
pub const TWO_PI: f64 = 2.0 * PI;

// ============================================================================
// CONDUCTOR ELECTRICAL PROPERTIES (IEC 60287-1-1 Table 1)
// ============================================================================

/// Electrical resistivity at 20 degC, ohm.m, and the linear temperature
/// coefficient alpha20, 1/K.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConductorProperties {
    pub resistivity_20: f64,
    pub alpha_20: f64,
}

pub const COPPER: ConductorProperties = ConductorProperties {
    resistivity_20: 1.7241e-8,
    alpha_20: 0.00393,
};

pub const ALUMINUM: ConductorProperties = ConductorProperties {
    resistivity_20: 2.8264e-8,
    alpha_20: 0.00403,
};

impl ConductorMaterial {
    pub fn properties(self) -> ConductorProperties {
        match self {
            ConductorMaterial::Copper => COPPER,
            ConductorMaterial::Aluminum => ALUMINUM,
        }
    }
}

/// Shield metals reuse the conductor coefficients where they overlap; lead is
/// tabulated separately (IEC 60287-1-1 Table 1, sheath row).
impl ShieldMaterial {
    pub fn properties(self) -> ConductorProperties {
        match self {
            ShieldMaterial::Copper => COPPER,
            ShieldMaterial::Aluminum => ALUMINUM,
            ShieldMaterial::Lead => ConductorProperties {
                resistivity_20: 21.4e-8,
                alpha_20: 0.004,
            },
        }
    }
}

// ============================================================================
// SKIN / PROXIMITY COEFFICIENT DEFAULTS (IEC 60287-1-1 Table 2)
// ============================================================================

/// Default (ks, kp) per stranding, overridable per call.
pub fn default_skin_coefficients(stranding: Stranding) -> (f64, f64) {
    match stranding {
        Stranding::Solid => (1.0, 1.0),
        Stranding::StrandedRound => (1.0, 0.8),
        Stranding::StrandedCompact => (0.8, 0.8),
        Stranding::Segmental => (0.435, 0.37),
    }
}

// ============================================================================
// CIGRE Ycs TABLE - LARGE MILLIKEN CONDUCTORS
// ============================================================================

/// Empirical skin-effect anchors for segmental (Milliken) conductors where the
/// IEC series is out of range. Columns: area mm^2, Ycs at 50 Hz, Ycs at 60 Hz.
pub const YCS_ANCHORS: [(f64, f64, f64); 9] = [
    (800.0, 0.015, 0.018),
    (1000.0, 0.019, 0.023),
    (1200.0, 0.023, 0.028),
    (1400.0, 0.027, 0.032),
    (1600.0, 0.031, 0.037),
    (1800.0, 0.035, 0.042),
    (2000.0, 0.039, 0.047),
    (2500.0, 0.048, 0.058),
    (3000.0, 0.057, 0.069),
];

/// Area below which the table does not apply and the IEC series is used.
pub const YCS_MIN_AREA_MM2: f64 = 800.0;

/// Linear interpolation of Ycs over the anchor table, clamped at both ends.
///
/// The frequency must be one of the two tabulated columns; anything else is an
/// operating-point error because no empirical basis exists to interpolate
/// across frequency.
pub fn ycs_lookup(area_mm2: f64, frequency_hz: f64) -> Result<f64, AmpacityError> {
    let column = if (frequency_hz - 50.0).abs() < 1e-9 {
        1
    } else if (frequency_hz - 60.0).abs() < 1e-9 {
        2
    } else {
        return Err(AmpacityError::UnsupportedFrequency(frequency_hz));
    };

    let pick = |anchor: &(f64, f64, f64)| if column == 1 { anchor.1 } else { anchor.2 };

    // Endpoint clamping.
    let first = &YCS_ANCHORS[0];
    if area_mm2 <= first.0 {
        return Ok(pick(first));
    }
    let last = &YCS_ANCHORS[YCS_ANCHORS.len() - 1];
    if area_mm2 >= last.0 {
        return Ok(pick(last));
    }

    for window in YCS_ANCHORS.windows(2) {
        let (lo, hi) = (&window[0], &window[1]);
        if area_mm2 >= lo.0 && area_mm2 <= hi.0 {
            let t = (area_mm2 - lo.0) / (hi.0 - lo.0);
            return Ok(pick(lo) + t * (pick(hi) - pick(lo)));
        }
    }

    // The anchor scan above is exhaustive over [first, last].
    Ok(pick(last))
}

// ============================================================================
// INSULATION PROPERTIES (IEC 60287-1-1 Table 3, IEC 60287-2-1 Table 1)
// ============================================================================

/// Dielectric and thermal properties of an insulation system. Temperatures in
/// degC; `max_emergency_c` and `max_short_circuit_c` are reported only and
/// never consulted by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct InsulationProperties {
    pub relative_permittivity: f64,
    pub loss_tangent: f64,
    pub thermal_resistivity: f64,
    pub max_continuous_c: f64,
    pub max_emergency_c: f64,
    pub max_short_circuit_c: f64,
}

pub const XLPE: InsulationProperties = InsulationProperties {
    relative_permittivity: 2.5,
    loss_tangent: 0.001,
    thermal_resistivity: 3.5,
    max_continuous_c: 90.0,
    max_emergency_c: 130.0,
    max_short_circuit_c: 250.0,
};

pub const EPR: InsulationProperties = InsulationProperties {
    relative_permittivity: 3.0,
    loss_tangent: 0.020,
    thermal_resistivity: 3.5,
    max_continuous_c: 90.0,
    max_emergency_c: 130.0,
    max_short_circuit_c: 250.0,
};

pub const PAPER_OIL: InsulationProperties = InsulationProperties {
    relative_permittivity: 3.6,
    loss_tangent: 0.01,
    thermal_resistivity: 6.0,
    max_continuous_c: 85.0,
    max_emergency_c: 105.0,
    max_short_circuit_c: 200.0,
};

// ============================================================================
// JACKET AND CONDUIT THERMAL RESISTIVITIES (K.m/W)
// ============================================================================

pub fn jacket_thermal_resistivity(material: JacketMaterial) -> f64 {
    match material {
        JacketMaterial::Pvc => 5.0,
        JacketMaterial::Pe | JacketMaterial::Hdpe => 3.5,
    }
}

/// Conduit wall resistivity. Steel is thermally near-transparent; the 1.0
/// placeholder keeps the wall term finite and is flagged in reports.
pub fn conduit_thermal_resistivity(material: ConduitMaterial) -> f64 {
    match material {
        ConduitMaterial::Pvc => 6.0,
        ConduitMaterial::Fiberglass => 4.0,
        ConduitMaterial::Steel => 1.0,
    }
}

// ============================================================================
// MATERIAL OVERRIDE REGISTRY
// ============================================================================

/// Optional per-field insulation override, TOML-deserializable. Absent fields
/// fall through to the embedded table.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct InsulationOverride {
    pub relative_permittivity: Option<f64>,
    pub loss_tangent: Option<f64>,
    pub thermal_resistivity: Option<f64>,
    pub max_continuous_c: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct JacketOverride {
    pub thermal_resistivity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    insulation: std::collections::BTreeMap<String, InsulationOverride>,
    #[serde(default)]
    jacket: std::collections::BTreeMap<String, JacketOverride>,
}

/// Layered material property source: embedded standards tables with optional
/// user overrides merged on top.
///
/// ```toml
/// [insulation.xlpe]
/// loss_tangent = 0.0004
///
/// [jacket.pvc]
/// thermal_resistivity = 6.0
/// ```
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    insulation: [Option<InsulationOverride>; 3],
    jacket: [Option<JacketOverride>; 3],
}

impl MaterialRegistry {
    /// Registry with no overrides: embedded tables only.
    pub fn embedded() -> Self {
        Self::default()
    }

    /// Parses a TOML override document and merges it over the defaults.
    /// Unknown material names map to `MAT-01`.
    pub fn from_toml_str(document: &str) -> Result<Self, AmpacityError> {
        let parsed: RegistryDocument = toml::from_str(document)
            .map_err(|e| AmpacityError::StudyInput(format!("registry TOML: {e}")))?;

        let mut registry = Self::default();
        for (name, over) in parsed.insulation {
            let idx = match name.to_ascii_lowercase().as_str() {
                "xlpe" => 0,
                "epr" => 1,
                "paper_oil" | "paper-oil" | "paper" => 2,
                _ => return Err(AmpacityError::UnknownMaterial(name)),
            };
            registry.insulation[idx] = Some(over);
        }
        for (name, over) in parsed.jacket {
            let idx = match name.to_ascii_lowercase().as_str() {
                "pvc" => 0,
                "pe" => 1,
                "hdpe" => 2,
                _ => return Err(AmpacityError::UnknownMaterial(name)),
            };
            registry.jacket[idx] = Some(over);
        }
        Ok(registry)
    }

    /// Effective insulation properties: table values with overrides applied.
    pub fn insulation(&self, material: InsulationMaterial) -> InsulationProperties {
        let (base, idx) = match material {
            InsulationMaterial::Xlpe => (XLPE, 0),
            InsulationMaterial::Epr => (EPR, 1),
            InsulationMaterial::PaperOil => (PAPER_OIL, 2),
        };
        let Some(over) = self.insulation[idx] else {
            return base;
        };
        InsulationProperties {
            relative_permittivity: over.relative_permittivity.unwrap_or(base.relative_permittivity),
            loss_tangent: over.loss_tangent.unwrap_or(base.loss_tangent),
            thermal_resistivity: over.thermal_resistivity.unwrap_or(base.thermal_resistivity),
            max_continuous_c: over.max_continuous_c.unwrap_or(base.max_continuous_c),
            ..base
        }
    }

    /// Effective jacket thermal resistivity.
    pub fn jacket(&self, material: JacketMaterial) -> f64 {
        let idx = match material {
            JacketMaterial::Pvc => 0,
            JacketMaterial::Pe => 1,
            JacketMaterial::Hdpe => 2,
        };
        self.jacket[idx]
            .and_then(|o| o.thermal_resistivity)
            .unwrap_or_else(|| jacket_thermal_resistivity(material))
    }
}
