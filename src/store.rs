/// SQLite persistence for the two monthly series.
///
/// Each series lands in its own file-backed database, mirroring the split
/// between the deforestation and air-quality stores downstream notebooks
/// read. Every run fully replaces the table contents: the drop, the create,
/// and all inserts run inside one transaction, so a write that fails
/// midway rolls back and the previous run's table survives untouched.
use rusqlite::{Connection, params};
use std::path::Path;

use crate::model::{MonthlyDeforestationPoint, MonthlyPollutionPoint};

// ---------------------------------------------------------------------------
// Table names
// ---------------------------------------------------------------------------

/// Table holding the monthly deforestation series.
pub const DEFORESTATION_TABLE: &str = "deforestation";

/// Table holding the monthly pollution series.
pub const POLLUTION_TABLE: &str = "pollution";

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Replaces the `deforestation` table with the given monthly series and
/// returns the number of rows written.
///
/// `Date` is the ISO month-start date, the same key the alignment step
/// joins on.
pub fn write_deforestation(
    db_path: &Path,
    points: &[MonthlyDeforestationPoint],
) -> Result<usize, rusqlite::Error> {
    let mut conn = Connection::open(db_path)?;
    let tx = conn.transaction()?;

    tx.execute_batch(
        "DROP TABLE IF EXISTS deforestation;
         CREATE TABLE deforestation (
             Date         TEXT NOT NULL PRIMARY KEY,
             AffectedArea REAL NOT NULL
         );",
    )?;

    {
        let mut stmt =
            tx.prepare("INSERT INTO deforestation (Date, AffectedArea) VALUES (?1, ?2)")?;
        for point in points {
            stmt.execute(params![point.month.first_day(), point.area_ha])?;
        }
    }

    tx.commit()?;
    Ok(points.len())
}

/// Replaces the `pollution` table with the given monthly series and returns
/// the number of rows written.
///
/// One column per pollutant in feed order; a pollutant with no monthly mean
/// is stored as NULL, except the zero-filled trio which the normalizer has
/// already replaced upstream. The quoted "PM2.5" identifier keeps the dot
/// out of SQL's way.
pub fn write_pollution(
    db_path: &Path,
    points: &[MonthlyPollutionPoint],
) -> Result<usize, rusqlite::Error> {
    let mut conn = Connection::open(db_path)?;
    let tx = conn.transaction()?;

    tx.execute_batch(
        r#"DROP TABLE IF EXISTS pollution;
           CREATE TABLE pollution (
               Date    TEXT NOT NULL PRIMARY KEY,
               PM10    REAL,
               TRS     REAL,
               O3      REAL,
               NO2     REAL,
               CO      REAL,
               "PM2.5" REAL,
               SO2     REAL,
               Benzene REAL,
               Toluene REAL
           );"#,
    )?;

    {
        let mut stmt = tx.prepare(
            r#"INSERT INTO pollution
               (Date, PM10, TRS, O3, NO2, CO, "PM2.5", SO2, Benzene, Toluene)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
        )?;
        for point in points {
            let v = &point.values;
            stmt.execute(params![
                point.month.first_day(),
                v.pm10,
                v.trs,
                v.o3,
                v.no2,
                v.co,
                v.pm2_5,
                v.so2,
                v.benzene,
                v.toluene,
            ])?;
        }
    }

    tx.commit()?;
    Ok(points.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
