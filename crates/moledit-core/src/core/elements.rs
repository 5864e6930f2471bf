use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Built-in element data: symbol => (atomic number, covalent radius in Angstroms).
///
/// Radii are the single-bond covalent radii of Cordero et al. (2008); carbon uses
/// the sp3 value and first-row transition metals the low-spin values.
static ELEMENT_DATA: Map<&'static str, (u8, f64)> = phf_map! {
    "H" => (1, 0.31), "He" => (2, 0.28), "Li" => (3, 1.28), "Be" => (4, 0.96),
    "B" => (5, 0.84), "C" => (6, 0.76), "N" => (7, 0.71), "O" => (8, 0.66),
    "F" => (9, 0.57), "Ne" => (10, 0.58), "Na" => (11, 1.66), "Mg" => (12, 1.41),
    "Al" => (13, 1.21), "Si" => (14, 1.11), "P" => (15, 1.07), "S" => (16, 1.05),
    "Cl" => (17, 1.02), "Ar" => (18, 1.06), "K" => (19, 2.03), "Ca" => (20, 1.76),
    "Sc" => (21, 1.70), "Ti" => (22, 1.60), "V" => (23, 1.53), "Cr" => (24, 1.39),
    "Mn" => (25, 1.39), "Fe" => (26, 1.32), "Co" => (27, 1.26), "Ni" => (28, 1.24),
    "Cu" => (29, 1.32), "Zn" => (30, 1.22), "Ga" => (31, 1.22), "Ge" => (32, 1.20),
    "As" => (33, 1.19), "Se" => (34, 1.20), "Br" => (35, 1.20), "Kr" => (36, 1.16),
    "Rb" => (37, 2.20), "Sr" => (38, 1.95), "Y" => (39, 1.90), "Zr" => (40, 1.75),
    "Nb" => (41, 1.64), "Mo" => (42, 1.54), "Tc" => (43, 1.47), "Ru" => (44, 1.46),
    "Rh" => (45, 1.42), "Pd" => (46, 1.39), "Ag" => (47, 1.45), "Cd" => (48, 1.44),
    "In" => (49, 1.42), "Sn" => (50, 1.39), "Sb" => (51, 1.39), "Te" => (52, 1.38),
    "I" => (53, 1.39), "Xe" => (54, 1.40), "Cs" => (55, 2.44), "Ba" => (56, 2.15),
    "La" => (57, 2.07), "Ce" => (58, 2.04), "Pr" => (59, 2.03), "Nd" => (60, 2.01),
    "Pm" => (61, 1.99), "Sm" => (62, 1.98), "Eu" => (63, 1.98), "Gd" => (64, 1.96),
    "Tb" => (65, 1.94), "Dy" => (66, 1.92), "Ho" => (67, 1.92), "Er" => (68, 1.89),
    "Tm" => (69, 1.90), "Yb" => (70, 1.87), "Lu" => (71, 1.87), "Hf" => (72, 1.75),
    "Ta" => (73, 1.70), "W" => (74, 1.62), "Re" => (75, 1.51), "Os" => (76, 1.44),
    "Ir" => (77, 1.41), "Pt" => (78, 1.36), "Au" => (79, 1.36), "Hg" => (80, 1.32),
    "Tl" => (81, 1.45), "Pb" => (82, 1.46), "Bi" => (83, 1.48), "Po" => (84, 1.40),
    "At" => (85, 1.50), "Rn" => (86, 1.50), "Fr" => (87, 2.60), "Ra" => (88, 2.21),
    "Ac" => (89, 2.15), "Th" => (90, 2.06), "Pa" => (91, 2.00), "U" => (92, 1.96),
    "Np" => (93, 1.90), "Pu" => (94, 1.87), "Am" => (95, 1.80), "Cm" => (96, 1.69),};

#[derive(Debug, Error)]
pub enum ElementTableError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),
    #[error("Invalid covalent radius {radius} for element '{symbol}'")]
    InvalidRadius { symbol: String, radius: f64 },
}

#[derive(Debug, Deserialize)]
struct RadiusRecord {
    symbol: String,
    covalent_radius: f64,
}

/// Periodic-table lookup used to validate element symbols and to supply covalent
/// radii for bond perception.
///
/// The built-in data can be overridden per element, either programmatically or
/// from a CSV file with a `symbol,covalent_radius` header.
#[derive(Debug, Clone, Default)]
pub struct ElementTable {
    radius_overrides: HashMap<&'static str, f64>,
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a table whose radii are overridden by the records of a CSV file.
    pub fn load_radius_overrides(path: &Path) -> Result<Self, ElementTableError> {
        let mut table = Self::new();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| ElementTableError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        for result in reader.deserialize::<RadiusRecord>() {
            let record = result.map_err(|e| ElementTableError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            table.set_covalent_radius(&record.symbol, record.covalent_radius)?;
        }
        Ok(table)
    }

    /// Returns the canonical spelling of a symbol ("cl" => "Cl") if it names a known element.
    pub fn normalize(symbol: &str) -> Option<&'static str> {
        let trimmed = symbol.trim();
        let mut chars = trimmed.chars();
        let first = chars.next()?;
        let canonical: String = first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect();
        ELEMENT_DATA.get_key(canonical.as_str()).copied()
    }

    pub fn is_valid(&self, symbol: &str) -> bool {
        Self::normalize(symbol).is_some()
    }

    pub fn atomic_number(&self, symbol: &str) -> Option<u8> {
        Self::normalize(symbol).and_then(|key| ELEMENT_DATA.get(key).map(|&(number, _)| number))
    }

    /// Returns the covalent radius of an element in Angstroms, honouring overrides.
    pub fn covalent_radius(&self, symbol: &str) -> Option<f64> {
        let key = Self::normalize(symbol)?;
        self.radius_overrides
            .get(key)
            .copied()
            .or_else(|| ELEMENT_DATA.get(key).map(|&(_, radius)| radius))
    }

    pub fn set_covalent_radius(&mut self, symbol: &str, radius: f64) -> Result<(), ElementTableError> {
        let key = Self::normalize(symbol)
            .ok_or_else(|| ElementTableError::UnknownElement(symbol.to_string()))?;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ElementTableError::InvalidRadius {
                symbol: key.to_string(),
                radius,
            });
        }
        self.radius_overrides.insert(key, radius);
        Ok(())
    }
}
