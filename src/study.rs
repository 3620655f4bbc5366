// src/study.rs

//! Batch rating studies over CSV scenario tables: parse, deduplicate,
//! solve, summarize. Duplicate rows are detected by SHA-256 fingerprint of
//! the canonicalized row, so re-exported spreadsheets do not skew the study
//! statistics.

use ahash::AHashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::AmpacityError;
use crate::model::{
    CableDesign, Conductor, Insulation, Installation, Jacket, OperatingConditions, Stranding,
};
use crate::solver::{self, AmpacityRequest};

/// One direct-buried rating scenario, one CSV record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRow {
    pub conductor: String,
    pub area_mm2: f64,
    #[serde(default)]
    pub conductor_diameter_mm: Option<f64>,
    #[serde(default)]
    pub stranding: Option<String>,
    pub insulation: String,
    pub insulation_mm: f64,
    #[serde(default)]
    pub jacket: Option<String>,
    #[serde(default)]
    pub jacket_mm: Option<f64>,
    pub voltage_v: f64,
    pub frequency_hz: f64,
    #[serde(default)]
    pub max_conductor_temp_c: Option<f64>,
    #[serde(default = "default_load_factor")]
    pub load_factor: f64,
    pub depth_m: f64,
    #[serde(default)]
    pub spacing_m: Option<f64>,
    #[serde(default = "default_num_cables")]
    pub num_cables: usize,
    pub soil_resistivity: f64,
    pub ambient_c: f64,
}

fn default_load_factor() -> f64 {
    1.0
}

fn default_num_cables() -> usize {
    1
}

fn parse_stranding(name: Option<&str>) -> Result<Stranding, AmpacityError> {
    match name.map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(Stranding::StrandedCompact),
        Some(s) => match s.as_str() {
            "" => Ok(Stranding::StrandedCompact),
            "solid" => Ok(Stranding::Solid),
            "stranded_round" | "round" => Ok(Stranding::StrandedRound),
            "stranded_compact" | "compact" => Ok(Stranding::StrandedCompact),
            "segmental" | "milliken" => Ok(Stranding::Segmental),
            other => Err(AmpacityError::UnknownMaterial(other.to_string())),
        },
    }
}

impl StudyRow {
    /// Canonical dedup key: SHA-256 over the JSON rendering of the row.
    fn fingerprint(&self) -> Result<String, AmpacityError> {
        let canonical = serde_json::to_vec(self)
            .map_err(|e| AmpacityError::StudyInput(format!("row canonicalization: {e}")))?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        Ok(hex::encode(hasher.finalize()))
    }

    fn to_request(&self) -> Result<AmpacityRequest, AmpacityError> {
        let jacket = match (&self.jacket, self.jacket_mm) {
            (Some(material), Some(thickness_mm)) => {
                Some(Jacket { material: material.parse()?, thickness_mm })
            }
            _ => None,
        };
        Ok(AmpacityRequest {
            cable: CableDesign {
                conductor: Conductor {
                    material: self.conductor.parse()?,
                    cross_section_mm2: self.area_mm2,
                    diameter_mm: self.conductor_diameter_mm,
                    stranding: parse_stranding(self.stranding.as_deref())?,
                    r20_ohm_per_m: None,
                    ks: None,
                    kp: None,
                },
                insulation: Insulation {
                    material: self.insulation.parse()?,
                    thickness_mm: self.insulation_mm,
                    conductor_screen_mm: None,
                    insulation_screen_mm: None,
                    relative_permittivity: None,
                    loss_tangent: None,
                    thermal_resistivity: None,
                },
                shield: None,
                jacket,
            },
            operating: OperatingConditions {
                voltage_v: self.voltage_v,
                frequency_hz: self.frequency_hz,
                max_conductor_temp_c: self.max_conductor_temp_c,
                load_factor: self.load_factor,
            },
            installation: Installation::DirectBuried {
                depth_m: self.depth_m,
                spacing_m: self.spacing_m.unwrap_or(0.0),
                num_cables: self.num_cables,
                soil_resistivity: self.soil_resistivity,
                ambient_c: self.ambient_c,
            },
            target_current_a: None,
            margin: None,
        })
    }
}

/// Row accounting and ampacity statistics of a study run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudyReport {
    pub total_rows: usize,
    pub duplicate_rows: usize,
    pub solved_rows: usize,
    /// Rows rejected by validation or parsing.
    pub rejected_rows: usize,
    /// Rows whose solve completed but came back flagged (THM-01 / ITR-01).
    pub flagged_rows: usize,
    pub min_ampacity_a: f64,
    pub max_ampacity_a: f64,
    pub mean_ampacity_a: f64,
}

impl StudyReport {
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Runs a study over any CSV byte stream with a header row.
pub fn run_study_reader<R: Read>(
    reader: R,
    deterministic: bool,
) -> Result<StudyReport, AmpacityError> {
    let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let mut report = StudyReport::default();
    let mut seen = AHashSet::new();
    let mut rows: Vec<StudyRow> = Vec::new();

    for record in csv_reader.deserialize::<StudyRow>() {
        let row = record.map_err(|e| AmpacityError::StudyInput(format!("CSV record: {e}")))?;
        report.total_rows += 1;
        if seen.insert(row.fingerprint()?) {
            rows.push(row);
        } else {
            report.duplicate_rows += 1;
        }
    }

    let outcomes: Vec<Result<_, AmpacityError>> = if deterministic {
        rows.iter().map(|row| row.to_request().and_then(|r| solver::solve(&r))).collect()
    } else {
        rows.par_iter()
            .map(|row| row.to_request().and_then(|r| solver::solve(&r)))
            .collect()
    };

    let mut sum = 0.0;
    for outcome in outcomes {
        match outcome {
            Err(_) => report.rejected_rows += 1,
            Ok(result) => match result.failure {
                Some(_) => report.flagged_rows += 1,
                None => {
                    let ampacity = result.ampacity_a;
                    if report.solved_rows == 0 {
                        report.min_ampacity_a = ampacity;
                        report.max_ampacity_a = ampacity;
                    } else {
                        report.min_ampacity_a = report.min_ampacity_a.min(ampacity);
                        report.max_ampacity_a = report.max_ampacity_a.max(ampacity);
                    }
                    sum += ampacity;
                    report.solved_rows += 1;
                }
            },
        }
    }
    if report.solved_rows > 0 {
        report.mean_ampacity_a = sum / report.solved_rows as f64;
    }
    Ok(report)
}

/// Runs a study over a CSV file on disk.
pub fn run_study_csv<P: AsRef<Path>>(
    path: P,
    deterministic: bool,
) -> Result<StudyReport, AmpacityError> {
    let file = File::open(path.as_ref())
        .map_err(|e| AmpacityError::StudyInput(format!("{}: {e}", path.as_ref().display())))?;
    run_study_reader(BufReader::new(file), deterministic)
}
