// src/lib.rs

//! # Ampacity Core - Cable Rating Engine
//!
//! **Layer:** API / Library Boundary
//! **Reference:** IEC 60287-1-1, IEC 60287-2-1, IEC 60287-3-2 (load-factor
//! approximation), Neher and McGrath (1957)
//!
//! Steady-state current ratings of buried power cables: AC resistance with
//! skin and proximity corrections (including the CIGRE empirical table for
//! large Milliken conductors), dielectric and shield losses, the full
//! IEC / Neher-McGrath thermal resistance network with concrete encasement
//! and image-method mutual heating, and the coupled ampacity inversion.
//!
//! ## Architectural Guarantees
//! 1. **Pure Solves**: a solve is a function of its request. No I/O, no
//!    global mutable state; the standards tables are immutable embedded data.
//! 2. **Bounded Work**: one solve allocates O(number of cables) and performs
//!    at most 20 coupling passes; it is safe to run many solves concurrently
//!    without coordination.
//! 3. **Panic-Free Execution**: `unwrap()` and `panic!()` are confined to
//!    tests. Domain violations in `ln` and `sqrt` are trapped and promoted to
//!    the closed [`AmpacityError`] taxonomy; results never carry NaN or
//!    infinity.
//! 4. **Deterministic Batches**: every parallel batch surface takes a flag
//!    that forces strictly ordered sequential iteration for reproducible
//!    pipelines.
//!
//! ## Entry points
//! [`solve`] rates one installation; [`solve_batch`] fans a slice of requests
//! across the rayon pool; [`study::run_study_csv`] sweeps a CSV scenario
//! table with duplicate-row accounting.
//!
//! ```no_run
//! use ampacity_core::{
//!     AmpacityRequest, CableDesign, Conductor, ConductorMaterial, Installation, Insulation,
//!     InsulationMaterial, Jacket, JacketMaterial, OperatingConditions, Stranding,
//! };
//!
//! let request = AmpacityRequest {
//!     cable: CableDesign {
//!         conductor: Conductor {
//!             material: ConductorMaterial::Copper,
//!             cross_section_mm2: 240.0,
//!             diameter_mm: Some(17.5),
//!             stranding: Stranding::StrandedCompact,
//!             r20_ohm_per_m: None,
//!             ks: None,
//!             kp: None,
//!         },
//!         insulation: Insulation {
//!             material: InsulationMaterial::Xlpe,
//!             thickness_mm: 8.0,
//!             conductor_screen_mm: None,
//!             insulation_screen_mm: None,
//!             relative_permittivity: None,
//!             loss_tangent: None,
//!             thermal_resistivity: None,
//!         },
//!         shield: None,
//!         jacket: Some(Jacket { material: JacketMaterial::Pvc, thickness_mm: 3.0 }),
//!     },
//!     operating: OperatingConditions {
//!         voltage_v: 15_000.0,
//!         frequency_hz: 60.0,
//!         max_conductor_temp_c: None,
//!         load_factor: 1.0,
//!     },
//!     installation: Installation::DirectBuried {
//!         depth_m: 1.0,
//!         spacing_m: 0.2,
//!         num_cables: 3,
//!         soil_resistivity: 1.0,
//!         ambient_c: 25.0,
//!     },
//!     target_current_a: None,
//!     margin: None,
//! };
//!
//! let result = ampacity_core::solve(&request).expect("valid request");
//! println!("rating: {:.0} A", result.ampacity_a);
//! ```

// Core engine modules, leaves first.
pub mod error;
pub mod tables;
pub mod model;
pub mod resistance;
pub mod losses;
pub mod thermal;
pub mod coupling;
pub mod solver;
pub mod study;

// Export the error taxonomy centrally to satisfy crate-level references.
pub use error::AmpacityError;

pub use model::{
    CableDesign, CablePosition, Conductor, ConductorMaterial, ConduitMaterial, GridPosition,
    Installation, Insulation, InsulationMaterial, Jacket, JacketMaterial, OperatingConditions,
    Shield, ShieldBonding, ShieldMaterial, ShieldType, Stranding,
};
pub use resistance::{AcResistance, SkinEffectSource};
pub use solver::{
    solve, solve_batch, solve_with_registry, AmpacityRequest, AmpacityResult, DesignStatus,
    SolveFailure,
};
pub use study::{run_study_csv, run_study_reader, StudyReport, StudyRow};
pub use tables::MaterialRegistry;
