//! # Cable System Data Model
//!
//! **Layer:** Domain Model / Input Validation
//! **Reference:** IEC 60287-1-1 section 1.4 (system of quantities)
//!
//! Value-type entities describing a cable construction, its operating point
//! and its installation geometry. All entities have well-defined equality and
//! carry no interior mutability; the engine never aliases its inputs into a
//! result.
//!
//! Units follow the standard's split convention: cable-layer geometry in mm,
//! installation geometry in m, temperatures in degC, voltage in V (phase to
//! ground), frequency in Hz.
//!
//! No raw input reaches the numerical modules without passing the staged
//! validation here; downstream code may therefore take positivity and layer
//! ordering as invariants.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AmpacityError;

// ============================================================================
// MATERIAL ENUMERATIONS (closed sets)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConductorMaterial {
    Copper,
    Aluminum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stranding {
    Solid,
    StrandedRound,
    StrandedCompact,
    Segmental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsulationMaterial {
    Xlpe,
    Epr,
    PaperOil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldMaterial {
    Copper,
    Aluminum,
    Lead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldType {
    Tape,
    Wire,
    Corrugated,
    Extruded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldBonding {
    SinglePoint,
    BothEnds,
    CrossBonded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JacketMaterial {
    Pvc,
    Pe,
    Hdpe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConduitMaterial {
    Pvc,
    Fiberglass,
    Steel,
}

impl FromStr for ConductorMaterial {
    type Err = AmpacityError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copper" | "cu" => Ok(ConductorMaterial::Copper),
            "aluminum" | "aluminium" | "al" => Ok(ConductorMaterial::Aluminum),
            other => Err(AmpacityError::UnknownMaterial(other.to_string())),
        }
    }
}

impl FromStr for InsulationMaterial {
    type Err = AmpacityError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlpe" => Ok(InsulationMaterial::Xlpe),
            "epr" => Ok(InsulationMaterial::Epr),
            "paper_oil" | "paper-oil" | "paper" => Ok(InsulationMaterial::PaperOil),
            other => Err(AmpacityError::UnknownMaterial(other.to_string())),
        }
    }
}

impl FromStr for JacketMaterial {
    type Err = AmpacityError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pvc" => Ok(JacketMaterial::Pvc),
            "pe" => Ok(JacketMaterial::Pe),
            "hdpe" => Ok(JacketMaterial::Hdpe),
            other => Err(AmpacityError::UnknownMaterial(other.to_string())),
        }
    }
}

// ============================================================================
// CABLE CONSTRUCTION
// ============================================================================

/// Conductor specification. `r20_ohm_per_m`, `ks` and `kp` are per-call
/// overrides; absent, the material resistivity and the stranding defaults of
/// IEC 60287-1-1 Table 2 apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conductor {
    pub material: ConductorMaterial,
    pub cross_section_mm2: f64,
    /// Outer diameter over the conductor. Derived from the cross-section as a
    /// solid-equivalent circle when absent.
    pub diameter_mm: Option<f64>,
    pub stranding: Stranding,
    pub r20_ohm_per_m: Option<f64>,
    pub ks: Option<f64>,
    pub kp: Option<f64>,
}

impl Conductor {
    /// Diameter as given, or the solid-equivalent derivation 2*sqrt(A/pi).
    pub fn diameter(&self) -> f64 {
        self.diameter_mm
            .unwrap_or_else(|| 2.0 * (self.cross_section_mm2 / std::f64::consts::PI).sqrt())
    }
}

/// Insulation layer. Dielectric properties default to the standards tables
/// unless overridden field by field. Screen thicknesses fold into the thermal
/// thickness t1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insulation {
    pub material: InsulationMaterial,
    pub thickness_mm: f64,
    pub conductor_screen_mm: Option<f64>,
    pub insulation_screen_mm: Option<f64>,
    pub relative_permittivity: Option<f64>,
    pub loss_tangent: Option<f64>,
    pub thermal_resistivity: Option<f64>,
}

impl Insulation {
    /// Thermal thickness t1: insulation plus both semi-conducting screens.
    pub fn t1_mm(&self) -> f64 {
        self.thickness_mm
            + self.conductor_screen_mm.unwrap_or(0.0)
            + self.insulation_screen_mm.unwrap_or(0.0)
    }
}

/// Metallic shield or sheath. Wire shields give their copper area directly
/// through `cross_section_mm2`; the annulus approximation pi*ds*t covers the
/// continuous types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    pub material: ShieldMaterial,
    pub shield_type: ShieldType,
    pub thickness_mm: f64,
    pub mean_diameter_mm: f64,
    pub bonding: ShieldBonding,
    pub cross_section_mm2: Option<f64>,
}

impl Shield {
    /// Effective metallic cross-section, mm^2.
    pub fn area_mm2(&self) -> f64 {
        self.cross_section_mm2
            .unwrap_or(std::f64::consts::PI * self.mean_diameter_mm * self.thickness_mm)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jacket {
    pub material: JacketMaterial,
    pub thickness_mm: f64,
}

/// Complete single-core cable construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableDesign {
    pub conductor: Conductor,
    pub insulation: Insulation,
    pub shield: Option<Shield>,
    pub jacket: Option<Jacket>,
}

impl CableDesign {
    /// Diameter over the insulation system (conductor + 2*t1), mm.
    pub fn diameter_over_insulation_mm(&self) -> f64 {
        self.conductor.diameter() + 2.0 * self.insulation.t1_mm()
    }

    /// Diameter over the shield, or over the insulation when no shield, mm.
    pub fn diameter_over_shield_mm(&self) -> f64 {
        match &self.shield {
            Some(shield) => self.diameter_over_insulation_mm() + 2.0 * shield.thickness_mm,
            None => self.diameter_over_insulation_mm(),
        }
    }

    /// Overall cable diameter including the jacket, mm.
    pub fn overall_diameter_mm(&self) -> f64 {
        match &self.jacket {
            Some(jacket) => self.diameter_over_shield_mm() + 2.0 * jacket.thickness_mm,
            None => self.diameter_over_shield_mm(),
        }
    }

    /// Staged construction validation.
    pub fn validate(&self) -> Result<(), AmpacityError> {
        // Stage 1: positivity of every declared dimension.
        require_positive("conductor cross-section", self.conductor.cross_section_mm2)?;
        if let Some(d) = self.conductor.diameter_mm {
            require_positive("conductor diameter", d)?;
        }
        if let Some(r20) = self.conductor.r20_ohm_per_m {
            require_positive("conductor R20", r20)?;
        }
        require_positive("insulation thickness", self.insulation.thickness_mm)?;
        if let Some(jacket) = &self.jacket {
            require_positive("jacket thickness", jacket.thickness_mm)?;
        }

        // Stage 2: layer ordering.
        if let Some(shield) = &self.shield {
            require_positive("shield thickness", shield.thickness_mm)?;
            let over_insulation = self.diameter_over_insulation_mm();
            if shield.mean_diameter_mm <= over_insulation {
                return Err(AmpacityError::LayerOrdering {
                    outer_name: "shield mean diameter",
                    outer: shield.mean_diameter_mm,
                    inner_name: "diameter over insulation",
                    inner: over_insulation,
                });
            }
            if let Some(area) = shield.cross_section_mm2 {
                require_positive("shield cross-section", area)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// OPERATING CONDITIONS
// ============================================================================

/// Electrical operating point. `max_conductor_temp_c` defaults to the
/// insulation's rated continuous temperature when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingConditions {
    /// Phase-to-ground voltage U0, V.
    pub voltage_v: f64,
    pub frequency_hz: f64,
    pub max_conductor_temp_c: Option<f64>,
    /// Daily load factor, (0, 1].
    pub load_factor: f64,
}

impl OperatingConditions {
    pub fn validate(&self) -> Result<(), AmpacityError> {
        if !(self.voltage_v > 0.0) {
            return Err(AmpacityError::NonPositiveOperating {
                quantity: "voltage",
                value: self.voltage_v,
            });
        }
        if !(self.frequency_hz > 0.0) {
            return Err(AmpacityError::NonPositiveOperating {
                quantity: "frequency",
                value: self.frequency_hz,
            });
        }
        if !(self.load_factor > 0.0) || self.load_factor > 1.0 {
            return Err(AmpacityError::LoadFactorOutOfRange(self.load_factor));
        }
        Ok(())
    }
}

// ============================================================================
// INSTALLATION GEOMETRY
// ============================================================================

/// Duct grid coordinate, row 0 at the top of the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
}

/// Cable centre in the vertical plane: x horizontal, y downward from the
/// ground surface, both in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CablePosition {
    pub x_m: f64,
    pub y_m: f64,
}

/// Installation variants, dispatched by tag. The operations the solver needs
/// (positions, resistance components, diagnostics) are closed and enumerable,
/// so this is a sum type rather than an open hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Installation {
    DirectBuried {
        depth_m: f64,
        /// Axial spacing between adjacent cables, m. Unused when a single
        /// cable is installed.
        spacing_m: f64,
        num_cables: usize,
        soil_resistivity: f64,
        ambient_c: f64,
    },
    Conduit {
        depth_m: f64,
        spacing_m: f64,
        num_conduits: usize,
        soil_resistivity: f64,
        ambient_c: f64,
        conduit_id_mm: f64,
        conduit_od_mm: f64,
        conduit_material: ConduitMaterial,
    },
    DuctBank {
        depth_to_top_m: f64,
        soil_resistivity: f64,
        concrete_resistivity: f64,
        ambient_c: f64,
        bank_width_m: f64,
        bank_height_m: f64,
        rows: usize,
        cols: usize,
        duct_id_mm: f64,
        duct_od_mm: f64,
        conduit_material: ConduitMaterial,
        horizontal_spacing_m: f64,
        vertical_spacing_m: f64,
        occupied: Vec<GridPosition>,
        target: GridPosition,
    },
}

impl Installation {
    pub fn ambient_c(&self) -> f64 {
        match self {
            Installation::DirectBuried { ambient_c, .. }
            | Installation::Conduit { ambient_c, .. }
            | Installation::DuctBank { ambient_c, .. } => *ambient_c,
        }
    }

    pub fn soil_resistivity(&self) -> f64 {
        match self {
            Installation::DirectBuried { soil_resistivity, .. }
            | Installation::Conduit { soil_resistivity, .. }
            | Installation::DuctBank { soil_resistivity, .. } => *soil_resistivity,
        }
    }

    /// Axial spacing in mm for the proximity-effect and shield-reactance
    /// terms. `None` for an isolated single cable.
    pub fn axial_spacing_mm(&self) -> Option<f64> {
        match self {
            Installation::DirectBuried { spacing_m, num_cables, .. } => {
                (*num_cables > 1).then_some(spacing_m * 1000.0)
            }
            Installation::Conduit { spacing_m, num_conduits, .. } => {
                (*num_conduits > 1).then_some(spacing_m * 1000.0)
            }
            Installation::DuctBank { horizontal_spacing_m, occupied, .. } => {
                (occupied.len() > 1).then_some(horizontal_spacing_m * 1000.0)
            }
        }
    }

    /// Cable (or duct) centre positions, flat formations centred on x = 0.
    /// Duct-bank positions follow the occupancy list order.
    pub fn positions(&self) -> Vec<CablePosition> {
        match self {
            Installation::DirectBuried { depth_m, spacing_m, num_cables, .. }
            | Installation::Conduit {
                depth_m, spacing_m, num_conduits: num_cables, ..
            } => {
                let n = *num_cables;
                let mid = (n as f64 - 1.0) / 2.0;
                (0..n)
                    .map(|i| CablePosition {
                        x_m: (i as f64 - mid) * spacing_m,
                        y_m: *depth_m,
                    })
                    .collect()
            }
            Installation::DuctBank {
                depth_to_top_m,
                bank_height_m,
                rows,
                cols,
                horizontal_spacing_m,
                vertical_spacing_m,
                occupied,
                ..
            } => {
                // Rows are centred vertically inside the bank; columns are
                // centred on x = 0 like the flat formations.
                let v_margin = (bank_height_m - (*rows as f64 - 1.0) * vertical_spacing_m) / 2.0;
                let mid = (*cols as f64 - 1.0) / 2.0;
                occupied
                    .iter()
                    .map(|p| CablePosition {
                        x_m: (p.col as f64 - mid) * horizontal_spacing_m,
                        y_m: depth_to_top_m + v_margin + p.row as f64 * vertical_spacing_m,
                    })
                    .collect()
            }
        }
    }

    /// Index of the rated cable within `positions()`. For duct banks this is
    /// the declared target; flat formations rate the limiting cable, which
    /// the solver identifies after coupling, so they default to index 0 here.
    pub fn target_index(&self) -> usize {
        match self {
            Installation::DuctBank { occupied, target, .. } => occupied
                .iter()
                .position(|p| p == target)
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Staged geometric validation against the cable's overall diameter (mm).
    pub fn validate(&self, cable_od_mm: f64) -> Result<(), AmpacityError> {
        match self {
            Installation::DirectBuried { depth_m, spacing_m, num_cables, soil_resistivity, .. } => {
                require_positive("burial depth", *depth_m)?;
                require_positive("soil thermal resistivity", *soil_resistivity)?;
                if *num_cables == 0 {
                    return Err(AmpacityError::NonPositiveDimension {
                        quantity: "cable count",
                        value: 0.0,
                    });
                }
                if *num_cables > 1 {
                    require_positive("cable spacing", *spacing_m)?;
                }
                // Full burial: the image method needs u = 2L/De > 1.
                if 2.0 * depth_m * 1000.0 <= cable_od_mm {
                    return Err(AmpacityError::EnvelopeViolation(format!(
                        "burial depth {depth_m} m shallower than the cable radius"
                    )));
                }
                Ok(())
            }
            Installation::Conduit {
                depth_m,
                spacing_m,
                num_conduits,
                soil_resistivity,
                conduit_id_mm,
                conduit_od_mm,
                ..
            } => {
                require_positive("burial depth", *depth_m)?;
                require_positive("soil thermal resistivity", *soil_resistivity)?;
                require_positive("conduit inner diameter", *conduit_id_mm)?;
                require_positive("conduit outer diameter", *conduit_od_mm)?;
                if *num_conduits == 0 {
                    return Err(AmpacityError::NonPositiveDimension {
                        quantity: "conduit count",
                        value: 0.0,
                    });
                }
                if *num_conduits > 1 {
                    require_positive("conduit spacing", *spacing_m)?;
                }
                if conduit_od_mm <= conduit_id_mm {
                    return Err(AmpacityError::LayerOrdering {
                        outer_name: "conduit outer diameter",
                        outer: *conduit_od_mm,
                        inner_name: "conduit inner diameter",
                        inner: *conduit_id_mm,
                    });
                }
                if cable_od_mm >= *conduit_id_mm {
                    return Err(AmpacityError::LayerOrdering {
                        outer_name: "conduit inner diameter",
                        outer: *conduit_id_mm,
                        inner_name: "cable overall diameter",
                        inner: cable_od_mm,
                    });
                }
                if 2.0 * depth_m * 1000.0 <= *conduit_od_mm {
                    return Err(AmpacityError::EnvelopeViolation(format!(
                        "burial depth {depth_m} m shallower than the conduit radius"
                    )));
                }
                Ok(())
            }
            Installation::DuctBank {
                depth_to_top_m,
                soil_resistivity,
                concrete_resistivity,
                bank_width_m,
                bank_height_m,
                rows,
                cols,
                duct_id_mm,
                duct_od_mm,
                horizontal_spacing_m,
                vertical_spacing_m,
                occupied,
                target,
                ..
            } => {
                require_positive("depth to bank top", *depth_to_top_m)?;
                require_positive("soil thermal resistivity", *soil_resistivity)?;
                require_positive("concrete thermal resistivity", *concrete_resistivity)?;
                require_positive("bank width", *bank_width_m)?;
                require_positive("bank height", *bank_height_m)?;
                require_positive("duct inner diameter", *duct_id_mm)?;
                require_positive("duct outer diameter", *duct_od_mm)?;
                require_positive("horizontal duct spacing", *horizontal_spacing_m)?;
                require_positive("vertical duct spacing", *vertical_spacing_m)?;
                if *rows == 0 || *cols == 0 {
                    return Err(AmpacityError::NonPositiveDimension {
                        quantity: "duct grid extent",
                        value: 0.0,
                    });
                }
                if duct_od_mm <= duct_id_mm {
                    return Err(AmpacityError::LayerOrdering {
                        outer_name: "duct outer diameter",
                        outer: *duct_od_mm,
                        inner_name: "duct inner diameter",
                        inner: *duct_id_mm,
                    });
                }
                if cable_od_mm >= *duct_id_mm {
                    return Err(AmpacityError::LayerOrdering {
                        outer_name: "duct inner diameter",
                        outer: *duct_id_mm,
                        inner_name: "cable overall diameter",
                        inner: cable_od_mm,
                    });
                }
                if occupied.is_empty() {
                    return Err(AmpacityError::DuctPosition {
                        row: target.row,
                        col: target.col,
                        problem: "occupancy set is empty",
                    });
                }
                for p in occupied {
                    if p.row >= *rows || p.col >= *cols {
                        return Err(AmpacityError::DuctPosition {
                            row: p.row,
                            col: p.col,
                            problem: "lies outside the declared grid",
                        });
                    }
                }
                if !occupied.contains(target) {
                    return Err(AmpacityError::DuctPosition {
                        row: target.row,
                        col: target.col,
                        problem: "is the rating target but is not occupied",
                    });
                }

                // The grid, ducts included, must fit inside the concrete.
                let duct_od_m = duct_od_mm / 1000.0;
                let grid_w = (*cols as f64 - 1.0) * horizontal_spacing_m + duct_od_m;
                let grid_h = (*rows as f64 - 1.0) * vertical_spacing_m + duct_od_m;
                if grid_w > *bank_width_m || grid_h > *bank_height_m {
                    return Err(AmpacityError::EnvelopeViolation(format!(
                        "duct grid {grid_w:.3} x {grid_h:.3} m exceeds the bank envelope \
                         {bank_width_m:.3} x {bank_height_m:.3} m"
                    )));
                }
                Ok(())
            }
        }
    }
}

#[inline]
fn require_positive(quantity: &'static str, value: f64) -> Result<(), AmpacityError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AmpacityError::NonPositiveDimension { quantity, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cable_240() -> CableDesign {
        CableDesign {
            conductor: Conductor {
                material: ConductorMaterial::Copper,
                cross_section_mm2: 240.0,
                diameter_mm: Some(17.5),
                stranding: Stranding::StrandedCompact,
                r20_ohm_per_m: None,
                ks: None,
                kp: None,
            },
            insulation: Insulation {
                material: InsulationMaterial::Xlpe,
                thickness_mm: 8.0,
                conductor_screen_mm: None,
                insulation_screen_mm: None,
                relative_permittivity: None,
                loss_tangent: None,
                thermal_resistivity: None,
            },
            shield: None,
            jacket: Some(Jacket { material: JacketMaterial::Pvc, thickness_mm: 3.0 }),
        }
    }

    #[test]
    fn layer_diameters_stack_outward() {
        let cable = cable_240();
        assert!((cable.diameter_over_insulation_mm() - 33.5).abs() < 1e-12);
        assert!((cable.overall_diameter_mm() - 39.5).abs() < 1e-12);
        cable.validate().unwrap();
    }

    #[test]
    fn conductor_diameter_derives_from_area_when_absent() {
        let mut cable = cable_240();
        cable.conductor.diameter_mm = None;
        let derived = cable.conductor.diameter();
        // Solid-equivalent circle of 240 mm^2.
        assert!((derived - 17.4811).abs() < 1e-3);
    }

    #[test]
    fn shield_below_insulation_is_rejected() {
        let mut cable = cable_240();
        cable.shield = Some(Shield {
            material: ShieldMaterial::Copper,
            shield_type: ShieldType::Wire,
            thickness_mm: 1.0,
            mean_diameter_mm: 30.0, // below the 33.5 mm insulation diameter
            bonding: ShieldBonding::SinglePoint,
            cross_section_mm2: None,
        });
        let err = cable.validate().unwrap_err();
        assert_eq!(err.code(), "GEO-02");
    }

    #[test]
    fn operating_point_bounds() {
        let mut op = OperatingConditions {
            voltage_v: 8_660.0,
            frequency_hz: 60.0,
            max_conductor_temp_c: None,
            load_factor: 1.0,
        };
        op.validate().unwrap();

        op.load_factor = 0.0;
        assert_eq!(op.validate().unwrap_err().code(), "OPR-02");
        op.load_factor = 1.2;
        assert_eq!(op.validate().unwrap_err().code(), "OPR-02");
    }

    #[test]
    fn flat_positions_are_centred_and_symmetric() {
        let install = Installation::DirectBuried {
            depth_m: 1.0,
            spacing_m: 0.2,
            num_cables: 3,
            soil_resistivity: 1.0,
            ambient_c: 25.0,
        };
        let p = install.positions();
        assert_eq!(p.len(), 3);
        assert!((p[0].x_m + 0.2).abs() < 1e-12);
        assert!((p[1].x_m).abs() < 1e-12);
        assert!((p[2].x_m - 0.2).abs() < 1e-12);
        assert!(p.iter().all(|c| (c.y_m - 1.0).abs() < 1e-12));
    }

    #[test]
    fn duct_bank_positions_respect_margins() {
        let install = Installation::DuctBank {
            depth_to_top_m: 0.89,
            soil_resistivity: 0.9,
            concrete_resistivity: 1.0,
            ambient_c: 25.0,
            bank_width_m: 0.915,
            bank_height_m: 0.61,
            rows: 2,
            cols: 3,
            duct_id_mm: 202.7,
            duct_od_mm: 219.1,
            conduit_material: ConduitMaterial::Pvc,
            horizontal_spacing_m: 0.305,
            vertical_spacing_m: 0.305,
            occupied: (0..2)
                .flat_map(|r| (0..3).map(move |c| GridPosition { row: r, col: c }))
                .collect(),
            target: GridPosition { row: 1, col: 1 },
        };
        let p = install.positions();
        assert_eq!(p.len(), 6);
        // Vertical margin (0.61 - 0.305)/2 = 0.1525 above the first row.
        assert!((p[0].y_m - 1.0425).abs() < 1e-9);
        assert!((p[5].y_m - 1.3475).abs() < 1e-9);
        // Target is the bottom-centre duct, fourth in row-major occupancy.
        assert_eq!(install.target_index(), 4);
    }

    #[test]
    fn duct_bank_target_must_be_occupied() {
        let install = Installation::DuctBank {
            depth_to_top_m: 0.89,
            soil_resistivity: 0.9,
            concrete_resistivity: 1.0,
            ambient_c: 25.0,
            bank_width_m: 0.915,
            bank_height_m: 0.61,
            rows: 2,
            cols: 3,
            duct_id_mm: 202.7,
            duct_od_mm: 219.1,
            conduit_material: ConduitMaterial::Pvc,
            horizontal_spacing_m: 0.305,
            vertical_spacing_m: 0.305,
            occupied: vec![GridPosition { row: 0, col: 0 }],
            target: GridPosition { row: 1, col: 1 },
        };
        let err = install.validate(110.0).unwrap_err();
        assert_eq!(err.code(), "GEO-03");
    }

    #[test]
    fn cable_must_fit_the_duct_bore() {
        let install = Installation::Conduit {
            depth_m: 1.0,
            spacing_m: 0.3,
            num_conduits: 1,
            soil_resistivity: 1.0,
            ambient_c: 25.0,
            conduit_id_mm: 100.0,
            conduit_od_mm: 110.0,
            conduit_material: ConduitMaterial::Pvc,
        };
        let err = install.validate(120.0).unwrap_err();
        assert_eq!(err.code(), "GEO-02");
    }

    #[test]
    fn material_parsing_rejects_unknown_names() {
        assert!("copper".parse::<ConductorMaterial>().is_ok());
        assert!("AL".parse::<ConductorMaterial>().is_ok());
        let err = "bronze".parse::<ConductorMaterial>().unwrap_err();
        assert_eq!(err.code(), "MAT-01");
        assert!("paper-oil".parse::<InsulationMaterial>().is_ok());
    }
}
