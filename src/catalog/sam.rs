//! SAM-format component tables (Sandia modules, CEC/Sandia inverters).
//!
//! The first row names the columns. SAM files then carry a units row and a
//! description row, recognised by a `Units` or `[...]` name and skipped.

use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;

use super::CatalogError;
use crate::domain::{InverterRatings, ModuleRatings};

const MODULE_TABLE: &str = "modules";
const INVERTER_TABLE: &str = "inverters";

struct Columns {
    index: HashMap<String, usize>,
    table: &'static str,
}

impl Columns {
    fn new(headers: &StringRecord, table: &'static str) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { index, table }
    }

    fn require(&self, names: &[&str]) -> Result<(), CatalogError> {
        match names.iter().find(|n| !self.index.contains_key(**n)) {
            Some(missing) => Err(CatalogError::Load(format!(
                "{} table has no `{}` column",
                self.table, missing
            ))),
            None => Ok(()),
        }
    }

    fn text<'r>(&self, row: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.index
            .get(name)
            .and_then(|i| row.get(*i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn number(&self, row: &StringRecord, line: u64, name: &str) -> Result<f64, CatalogError> {
        self.optional(row, line, name)?
            .ok_or_else(|| CatalogError::MalformedRow {
                table: self.table,
                line,
                reason: format!("missing `{name}`"),
            })
    }

    fn optional(&self, row: &StringRecord, line: u64, name: &str) -> Result<Option<f64>, CatalogError> {
        match self.text(row, name) {
            None => Ok(None),
            Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| CatalogError::MalformedRow {
                table: self.table,
                line,
                reason: format!("`{name}` is not numeric: {raw}"),
            }),
        }
    }
}

fn is_annotation(name: &str) -> bool {
    name.is_empty() || name.eq_ignore_ascii_case("units") || name.starts_with('[')
}

fn records(body: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes())
}

/// Percent-per-degree coefficient from an absolute one.
fn percent(coefficient: Option<f64>, reference: f64) -> Option<f64> {
    coefficient
        .filter(|_| reference != 0.0)
        .map(|c| c / reference * 100.0)
}

pub fn parse_modules(body: &str) -> Result<Vec<ModuleRatings>, CatalogError> {
    let mut reader = records(body);
    let headers = reader
        .headers()
        .map_err(|e| CatalogError::Load(e.to_string()))?
        .clone();
    let cols = Columns::new(&headers, MODULE_TABLE);
    cols.require(&["Name", "Area", "Isco", "Voco", "Impo", "Vmpo"])?;

    let mut out = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let line = i as u64 + 2;
        let row = row.map_err(|e| CatalogError::Load(e.to_string()))?;
        let name = cols.text(&row, "Name").unwrap_or_default();
        if is_annotation(name) {
            continue;
        }

        let voc = cols.number(&row, line, "Voco")?;
        let vmp = cols.number(&row, line, "Vmpo")?;
        let imp = cols.number(&row, line, "Impo")?;
        let voc_pct = percent(cols.optional(&row, line, "Bvoco")?, voc);
        let vmp_pct = percent(cols.optional(&row, line, "Bvmpo")?, vmp);
        let imp_pct = percent(cols.optional(&row, line, "Aimp")?, imp);

        out.push(ModuleRatings {
            name: name.to_string(),
            voc,
            isc: cols.number(&row, line, "Isco")?,
            vmp,
            imp,
            stc_power_w: cols.optional(&row, line, "STC")?,
            area_m2: cols.number(&row, line, "Area")?,
            material: cols.text(&row, "Material").map(str::to_string),
            temp_coeff_voc_pct: voc_pct,
            temp_coeff_vmp_pct: vmp_pct,
            temp_coeff_pmax_pct: vmp_pct.map(|v| v + imp_pct.unwrap_or(0.0)),
        });
    }
    Ok(out)
}

pub fn parse_inverters(body: &str) -> Result<Vec<InverterRatings>, CatalogError> {
    let mut reader = records(body);
    let headers = reader
        .headers()
        .map_err(|e| CatalogError::Load(e.to_string()))?
        .clone();
    let cols = Columns::new(&headers, INVERTER_TABLE);
    cols.require(&["Name", "Paco", "Pdco", "Idcmax", "Mppt_low", "Mppt_high"])?;

    let mut out = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let line = i as u64 + 2;
        let row = row.map_err(|e| CatalogError::Load(e.to_string()))?;
        let name = cols.text(&row, "Name").unwrap_or_default();
        if is_annotation(name) {
            continue;
        }

        out.push(InverterRatings {
            name: name.to_string(),
            pac_max_w: cols.number(&row, line, "Paco")?,
            pdc_max_w: cols.number(&row, line, "Pdco")?,
            mppt_min_v: cols.number(&row, line, "Mppt_low")?,
            mppt_max_v: cols.number(&row, line, "Mppt_high")?,
            idc_max_a: cols.number(&row, line, "Idcmax")?,
            vdc_max_v: cols.optional(&row, line, "Vdcmax")?,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MODULES: &str = "\
Name,Area,Material,Isco,Voco,Impo,Vmpo,Aimp,Bvoco,Bvmpo
Units,m2,,A,V,A,V,1/C,V/C,V/C
[0],(Area),(Material),(Isco),(Voco),(Impo),(Vmpo),(Aimp),(Bvoco),(Bvmpo)
Test_Module,1.7,mono,10,40,9.5,32,-0.0001,-0.12,-0.16
Bare_Module,1.6,,9,38,8.5,31,,,
";

    #[test]
    fn test_parse_modules_skips_annotation_rows_and_derives_coefficients() {
        let modules = parse_modules(MODULES).unwrap();
        assert_eq!(modules.len(), 2);
        let m = &modules[0];
        assert_eq!(m.name, "Test_Module");
        assert_eq!(m.material.as_deref(), Some("mono"));
        assert_relative_eq!(m.temp_coeff_voc_pct.unwrap(), -0.3, epsilon = 1e-12);
        assert_relative_eq!(m.temp_coeff_vmp_pct.unwrap(), -0.5, epsilon = 1e-12);
        assert_relative_eq!(
            m.temp_coeff_pmax_pct.unwrap(),
            -0.5 + (-0.0001 / 9.5 * 100.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(m.rated_power_w(), 32.0 * 9.5);

        let bare = &modules[1];
        assert!(bare.temp_coeff_voc_pct.is_none());
        assert!(bare.material.is_none());
    }

    #[test]
    fn test_parse_modules_reports_malformed_row() {
        let body = "Name,Area,Isco,Voco,Impo,Vmpo\nBad,1.7,ten,40,9,32\n";
        let err = parse_modules(body).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_parse_inverters_requires_columns() {
        let err = parse_inverters("Name,Paco\nX,1000\n").unwrap_err();
        assert!(matches!(err, CatalogError::Load(_)));
    }

    #[test]
    fn test_parse_inverters_reads_optional_vdcmax() {
        let body = "Name,Paco,Pdco,Idcmax,Mppt_low,Mppt_high,Vdcmax\nUnits,W,W,A,V,V,V\nInv,5000,5200,18,240,480,\n";
        let inverters = parse_inverters(body).unwrap();
        assert_eq!(inverters.len(), 1);
        assert!(inverters[0].vdc_max_v.is_none());
        assert_eq!(inverters[0].pac_max_w, 5000.0);
    }
}
