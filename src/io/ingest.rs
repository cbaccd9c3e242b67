//! CSV ingest: yield samples, PERD factors and turnover rates.
//!
//! Yield rows are grouped into one `StandGrowthCurve` per
//! `(growth_curve_id, spu_id)` with one yield table per species group.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic order** (stands come out sorted by key)

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{CurveKey, PERD_FACTOR_LEN, PerdFactor, RunConfig, SpeciesType, TurnoverRates, YieldRow};
use crate::error::AppError;
use crate::growth::{StandGrowthCurve, YieldTable};

/// PERD table columns after `species`, in coefficient order.
pub const PERD_COLUMNS: [&str; PERD_FACTOR_LEN] = [
    "a",
    "b",
    "a_non_merch",
    "b_non_merch",
    "k_non_merch",
    "cap_non_merch",
    "a_sap",
    "b_sap",
    "k_sap",
    "cap_sap",
    "a1",
    "a2",
    "a3",
    "b1",
    "b2",
    "b3",
    "c1",
    "c2",
    "c3",
    "min_volume",
    "max_volume",
    "low_stemwood_prop",
    "high_stemwood_prop",
    "low_stembark_prop",
    "high_stembark_prop",
    "low_branches_prop",
    "high_branches_prop",
    "low_foliage_prop",
    "high_foliage_prop",
    "softwood_top_prop",
    "softwood_stump_prop",
    "hardwood_top_prop",
    "hardwood_stump_prop",
];

/// Oldest stand age accepted from a yield row. Tables are dense up to their max age.
pub const MAX_YIELD_AGE: usize = 1000;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// One parsed yield sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldRecord {
    pub key: CurveKey,
    pub species: SpeciesType,
    pub row: YieldRow,
}

#[derive(Debug, Clone)]
pub struct YieldRecords {
    pub records: Vec<YieldRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Ingest output: processed stands ready for curve generation.
#[derive(Debug, Clone)]
pub struct IngestedStands {
    pub stands: Vec<StandGrowthCurve>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load every input named by `config` and build processed stands.
pub fn load_stands(config: &RunConfig) -> Result<IngestedStands, AppError> {
    let perd = read_perd_factors(open(&config.perd_path)?)?;
    let turnover = match &config.turnover_path {
        Some(path) => Some(read_turnover_rates(open(path)?)?),
        None => None,
    };
    let yields = read_yield_rows(open(&config.yields_path)?)?;

    let records: Vec<YieldRecord> = yields
        .records
        .into_iter()
        .filter(|r| config.only.is_none_or(|k| k == r.key))
        .collect();
    let rows_used = records.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No yield rows remain after filtering."));
    }

    let stands = build_stands(&records, &perd, turnover)?;

    Ok(IngestedStands {
        stands,
        row_errors: yields.row_errors,
        rows_read: yields.rows_read,
        rows_used,
    })
}

/// Group yield records by key and species and build processed stands.
pub fn build_stands(
    records: &[YieldRecord],
    perd: &HashMap<SpeciesType, PerdFactor>,
    turnover: Option<TurnoverRates>,
) -> Result<Vec<StandGrowthCurve>, AppError> {
    let mut grouped: BTreeMap<CurveKey, BTreeMap<SpeciesType, Vec<YieldRow>>> = BTreeMap::new();
    for r in records {
        grouped
            .entry(r.key)
            .or_default()
            .entry(r.species)
            .or_default()
            .push(r.row);
    }

    let mut stands = Vec::with_capacity(grouped.len());
    for (key, by_species) in grouped {
        let mut stand = StandGrowthCurve::new(key);
        for (species, rows) in by_species {
            stand.add_yield_table(YieldTable::new(&rows, species)?);
            let factor = perd.get(&species).ok_or_else(|| {
                AppError::new(2, format!("PERD table has no `{}` row (needed by {key}).", species.as_str()))
            })?;
            stand.set_perd_factor(species, *factor);
        }
        if let Some(rates) = turnover {
            stand.set_turnover_rates(rates);
        }
        stand.process_stand_yield_tables();
        stands.push(stand);
    }

    Ok(stands)
}

/// Parse yield samples (`growth_curve_id,spu_id,species,age,merchantable_volume`).
pub fn read_yield_rows<R: Read>(reader: R) -> Result<YieldRecords, AppError> {
    let mut reader = csv_reader(reader);
    let header_map = read_header_map(&mut reader)?;
    for col in ["growth_curve_id", "spu_id", "species", "age", "merchantable_volume"] {
        if !header_map.contains_key(col) {
            return Err(AppError::new(2, format!("Missing required column: `{col}`")));
        }
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_yield_record(&record, &header_map));
        match parsed {
            Ok(r) => records.push(r),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    Ok(YieldRecords {
        records,
        row_errors,
        rows_read,
    })
}

fn parse_yield_record(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<YieldRecord, String> {
    let growth_curve_id = parse_i64(get_required(record, header_map, "growth_curve_id")?)?;
    let spu_id = parse_i64(get_required(record, header_map, "spu_id")?)?;
    let species = parse_species(get_required(record, header_map, "species")?)?;

    let age_raw = get_required(record, header_map, "age")?;
    let age = age_raw
        .parse::<usize>()
        .map_err(|_| format!("Invalid age '{age_raw}'."))?;
    if age > MAX_YIELD_AGE {
        return Err(format!("Age {age} exceeds the maximum of {MAX_YIELD_AGE}."));
    }

    let volume_raw = get_required(record, header_map, "merchantable_volume")?;
    let volume = parse_f64(volume_raw)?;
    if volume < 0.0 {
        return Err(format!("Negative volume '{volume_raw}'."));
    }

    Ok(YieldRecord {
        key: CurveKey::new(growth_curve_id, spu_id),
        species,
        row: YieldRow::new(age, volume),
    })
}

/// Parse the PERD table: one row per species group.
///
/// Unlike yield rows, a malformed PERD row is fatal.
pub fn read_perd_factors<R: Read>(reader: R) -> Result<HashMap<SpeciesType, PerdFactor>, AppError> {
    let mut reader = csv_reader(reader);
    let header_map = read_header_map(&mut reader)?;
    for col in std::iter::once("species").chain(PERD_COLUMNS) {
        if !header_map.contains_key(col) {
            return Err(AppError::new(2, format!("PERD table is missing column: `{col}`")));
        }
    }

    let mut factors = HashMap::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("PERD line {line}: CSV parse error: {e}")))?;
        let parse = || -> Result<(SpeciesType, PerdFactor), String> {
            let species = parse_species(get_required(&record, &header_map, "species")?)?;
            let values = PERD_COLUMNS
                .iter()
                .map(|col| get_required(&record, &header_map, col).and_then(parse_f64))
                .collect::<Result<Vec<f64>, String>>()?;
            let factor = PerdFactor::from_values(&values).map_err(|e| e.to_string())?;
            Ok((species, factor))
        };
        let (species, factor) = parse().map_err(|e| AppError::new(2, format!("PERD line {line}: {e}")))?;
        if factors.insert(species, factor).is_some() {
            return Err(AppError::new(
                2,
                format!("PERD line {line}: duplicate row for `{}`", species.as_str()),
            ));
        }
    }

    if factors.is_empty() {
        return Err(AppError::new(2, "PERD table has no rows."));
    }
    Ok(factors)
}

/// Parse a single-row turnover table whose columns are the `TurnoverRates` fields.
pub fn read_turnover_rates<R: Read>(reader: R) -> Result<TurnoverRates, AppError> {
    let mut reader = csv_reader(reader);
    reader
        .deserialize::<TurnoverRates>()
        .next()
        .ok_or_else(|| AppError::new(2, "Turnover table has no rows."))?
        .map_err(|e| AppError::new(2, format!("Invalid turnover table: {e}")))
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn read_header_map<R: Read>(reader: &mut csv::Reader<R>) -> Result<HashMap<String, usize>, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?;
    Ok(build_header_map(headers))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_species(s: &str) -> Result<SpeciesType, String> {
    match s.to_ascii_lowercase().as_str() {
        "softwood" | "sw" => Ok(SpeciesType::Softwood),
        "hardwood" | "hw" => Ok(SpeciesType::Hardwood),
        _ => Err(format!("Unknown species '{s}'. Expected softwood or hardwood.")),
    }
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_i64(s: &str) -> Result<i64, String> {
    s.parse::<i64>().map_err(|_| format!("Invalid integer '{s}'."))
}

fn parse_f64(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid number '{s}'.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::stand::fixtures::{HW_PERD, SW_PERD};

    fn perd_csv() -> String {
        let mut csv = format!("species,{}\n", PERD_COLUMNS.join(","));
        for (name, values) in [("softwood", SW_PERD), ("hardwood", HW_PERD)] {
            let row: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            csv.push_str(&format!("{name},{}\n", row.join(",")));
        }
        csv
    }

    #[test]
    fn yield_rows_skip_bad_lines() {
        let csv = "\u{feff}Growth_Curve_ID,spu_id,species,age,merchantable_volume\n\
                   1,7,softwood,0,0\n\
                   1,7,SW,10,25.5\n\
                   1,7,larch,10,3\n\
                   1,7,hardwood,ten,3\n\
                   2,7,hw,20,-1\n";
        let parsed = read_yield_rows(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows_read, 5);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1].row, YieldRow::new(10, 25.5));
        assert_eq!(parsed.records[1].species, SpeciesType::Softwood);
        let lines: Vec<usize> = parsed.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![4, 5, 6]);
    }

    #[test]
    fn implausible_ages_are_row_errors() {
        let csv = "growth_curve_id,spu_id,species,age,merchantable_volume\n\
                   1,1,softwood,1000,5\n\
                   1,1,softwood,10000000000,5\n\
                   1,1,softwood,1001,5\n";
        let parsed = read_yield_rows(csv.as_bytes()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].row.age, MAX_YIELD_AGE);
        let lines: Vec<usize> = parsed.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4]);
        assert!(parsed.row_errors[0].message.contains("exceeds"));
    }

    #[test]
    fn yield_rows_require_schema() {
        let err = read_yield_rows("growth_curve_id,spu_id,age\n1,1,0\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn perd_rows_parse_in_column_order() {
        let factors = read_perd_factors(perd_csv().as_bytes()).unwrap();
        assert_eq!(factors.len(), 2);
        let sw = factors[&SpeciesType::Softwood];
        assert_eq!(sw, PerdFactor::from_values(&SW_PERD).unwrap());
        assert_eq!(factors[&SpeciesType::Hardwood].min_volume, HW_PERD[19]);
    }

    #[test]
    fn perd_duplicate_species_is_fatal() {
        let mut csv = perd_csv();
        let dup = csv.lines().nth(1).unwrap().to_string();
        csv.push_str(&dup);
        csv.push('\n');
        assert_eq!(read_perd_factors(csv.as_bytes()).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn turnover_row_deserializes_by_field_name() {
        let names = [
            "sw_foliage_turnover",
            "hw_foliage_turnover",
            "sw_stem_turnover",
            "hw_stem_turnover",
            "sw_branch_turnover",
            "hw_branch_turnover",
            "sw_stem_snag_turnover",
            "hw_stem_snag_turnover",
            "sw_branch_snag_turnover",
            "hw_branch_snag_turnover",
            "sw_coarse_root_turnover",
            "hw_coarse_root_turnover",
            "sw_fine_root_turnover",
            "hw_fine_root_turnover",
            "sw_other_to_branch_snag_split",
            "hw_other_to_branch_snag_split",
            "sw_coarse_root_split",
            "hw_coarse_root_split",
            "sw_fine_root_ag_split",
            "hw_fine_root_ag_split",
        ];
        let values: Vec<String> = (0..names.len()).map(|i| format!("0.{:02}", i + 1)).collect();
        let csv = format!("{}\n{}\n", names.join(","), values.join(","));
        let rates = read_turnover_rates(csv.as_bytes()).unwrap();
        assert_eq!(rates.sw_foliage_turnover, 0.01);
        assert_eq!(rates.hw_fine_root_ag_split, 0.20);
    }

    #[test]
    fn stands_group_by_key_and_species() {
        let csv = "growth_curve_id,spu_id,species,age,merchantable_volume\n\
                   2,1,softwood,0,0\n\
                   2,1,softwood,10,20\n\
                   1,1,softwood,0,0\n\
                   1,1,softwood,10,40\n\
                   1,1,hardwood,0,0\n\
                   1,1,hardwood,10,10\n";
        let records = read_yield_rows(csv.as_bytes()).unwrap().records;
        let perd = read_perd_factors(perd_csv().as_bytes()).unwrap();
        let stands = build_stands(&records, &perd, None).unwrap();

        assert_eq!(stands.len(), 2);
        assert_eq!(stands[0].key(), CurveKey::new(1, 1));
        assert!(stands[0].has_yield_component(SpeciesType::Hardwood));
        assert!(!stands[1].has_yield_component(SpeciesType::Hardwood));
        assert_eq!(stands[0].stand_total_volume_at_age(10), 50.0);
        assert_eq!(stands[0].stand_softwood_volume_ratio_at_age(10), 0.8);
        assert!(stands[0].perd_factor(SpeciesType::Hardwood).is_some());
    }

    #[test]
    fn stand_without_matching_perd_row_is_rejected() {
        let records = vec![YieldRecord {
            key: CurveKey::new(1, 1),
            species: SpeciesType::Hardwood,
            row: YieldRow::new(10, 5.0),
        }];
        let mut perd = HashMap::new();
        perd.insert(SpeciesType::Softwood, PerdFactor::from_values(&SW_PERD).unwrap());
        assert_eq!(build_stands(&records, &perd, None).unwrap_err().exit_code(), 2);
    }
}
