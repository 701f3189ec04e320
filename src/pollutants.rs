/// Pollutant registry for the air-quality feed.
///
/// Defines the canonical list of the nine pollutants measured by the
/// monitoring station, the mapping from raw feed column names to canonical
/// identifiers, and the fixed zero-fill allow-list. This is the single
/// source of truth for pollutant naming: normalizers and the store should
/// reference pollutants from here rather than hardcoding column names.

use crate::model::PollutantValues;

// ---------------------------------------------------------------------------
// Pollutant identifiers
// ---------------------------------------------------------------------------

/// The nine pollutants reported by the feed. Variants are stable keys for
/// field access on [`PollutantValues`]; display naming lives in the
/// registry, never on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pollutant {
    Pm10,
    Trs,
    O3,
    No2,
    Co,
    Pm25,
    So2,
    Benzene,
    Toluene,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Metadata for a single pollutant column.
pub struct PollutantSpec {
    pub pollutant: Pollutant,
    /// Column header exactly as the upstream feed spells it.
    pub raw_column: &'static str,
    /// Canonical identifier used in persisted output and reporting.
    pub canonical_name: &'static str,
    /// Measurement unit as reported by the station (not unified).
    pub unit: &'static str,
    /// Whether a month with no valid mean is written as zero instead of
    /// missing. Fixed allow-list for the three historically sparsest
    /// pollutants; must never be inferred from observed coverage.
    pub zero_fill_when_missing: bool,
    /// Short description of what the column measures.
    pub description: &'static str,
}

/// All pollutant columns in upstream feed order. This order is also the
/// column order of the persisted `pollution` table.
pub static POLLUTANT_REGISTRY: &[PollutantSpec] = &[
    PollutantSpec {
        pollutant: Pollutant::Pm10,
        raw_column: "MP10",
        canonical_name: "PM10",
        unit: "ug/m3",
        zero_fill_when_missing: false,
        description: "Inhalable particulate matter, 10 micrometers or less",
    },
    PollutantSpec {
        pollutant: Pollutant::Trs,
        raw_column: "TRS",
        canonical_name: "TRS",
        unit: "ug/m3",
        zero_fill_when_missing: true,
        description: "Total reduced sulfur compounds",
    },
    PollutantSpec {
        pollutant: Pollutant::O3,
        raw_column: "O3",
        canonical_name: "O3",
        unit: "ug/m3",
        zero_fill_when_missing: false,
        description: "Ground-level ozone",
    },
    PollutantSpec {
        pollutant: Pollutant::No2,
        raw_column: "NO2",
        canonical_name: "NO2",
        unit: "ug/m3",
        zero_fill_when_missing: false,
        description: "Nitrogen dioxide",
    },
    PollutantSpec {
        pollutant: Pollutant::Co,
        raw_column: "CO",
        canonical_name: "CO",
        unit: "ppm", // the one column not reported in ug/m3
        zero_fill_when_missing: false,
        description: "Carbon monoxide",
    },
    PollutantSpec {
        pollutant: Pollutant::Pm25,
        raw_column: "MP2.5",
        canonical_name: "PM2.5",
        unit: "ug/m3",
        zero_fill_when_missing: false,
        description: "Fine particulate matter, 2.5 micrometers or less",
    },
    PollutantSpec {
        pollutant: Pollutant::So2,
        raw_column: "SO2",
        canonical_name: "SO2",
        unit: "ug/m3",
        zero_fill_when_missing: false,
        description: "Sulfur dioxide",
    },
    PollutantSpec {
        pollutant: Pollutant::Benzene,
        raw_column: "BENZENO",
        canonical_name: "Benzene",
        unit: "ug/m3",
        zero_fill_when_missing: true,
        description: "Benzene vapor",
    },
    PollutantSpec {
        pollutant: Pollutant::Toluene,
        raw_column: "TOLUENO",
        canonical_name: "Toluene",
        unit: "ug/m3",
        zero_fill_when_missing: true,
        description: "Toluene vapor",
    },
];

/// Looks up a pollutant's registry entry. The registry covers every enum
/// variant, so this cannot miss.
pub fn spec_for(pollutant: Pollutant) -> &'static PollutantSpec {
    POLLUTANT_REGISTRY
        .iter()
        .find(|s| s.pollutant == pollutant)
        .expect("every pollutant variant has a registry entry")
}

/// Looks up a registry entry by upstream column header. Returns `None` for
/// non-pollutant columns (sequence id, timestamp, station id).
pub fn find_by_raw_column(raw_column: &str) -> Option<&'static PollutantSpec> {
    POLLUTANT_REGISTRY.iter().find(|s| s.raw_column == raw_column)
}

/// Canonical column names in feed order, suitable for building the
/// persisted table schema.
pub fn canonical_names() -> Vec<&'static str> {
    POLLUTANT_REGISTRY.iter().map(|s| s.canonical_name).collect()
}

/// The pollutants whose missing monthly means are written as zero.
pub fn zero_fill_set() -> Vec<Pollutant> {
    POLLUTANT_REGISTRY
        .iter()
        .filter(|s| s.zero_fill_when_missing)
        .map(|s| s.pollutant)
        .collect()
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

impl PollutantValues {
    /// Reads the field for one pollutant.
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm10 => self.pm10,
            Pollutant::Trs => self.trs,
            Pollutant::O3 => self.o3,
            Pollutant::No2 => self.no2,
            Pollutant::Co => self.co,
            Pollutant::Pm25 => self.pm2_5,
            Pollutant::So2 => self.so2,
            Pollutant::Benzene => self.benzene,
            Pollutant::Toluene => self.toluene,
        }
    }

    /// Writes the field for one pollutant.
    pub fn set(&mut self, pollutant: Pollutant, value: Option<f64>) {
        match pollutant {
            Pollutant::Pm10 => self.pm10 = value,
            Pollutant::Trs => self.trs = value,
            Pollutant::O3 => self.o3 = value,
            Pollutant::No2 => self.no2 = value,
            Pollutant::Co => self.co = value,
            Pollutant::Pm25 => self.pm2_5 = value,
            Pollutant::So2 => self.so2 = value,
            Pollutant::Benzene => self.benzene = value,
            Pollutant::Toluene => self.toluene = value,
        }
    }

    /// True when all nine fields are missing. Such a reading carries no
    /// signal and is dropped by the normalizer.
    pub fn is_empty(&self) -> bool {
        POLLUTANT_REGISTRY
            .iter()
            .all(|s| self.get(s.pollutant).is_none())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
