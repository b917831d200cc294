// 📥 Survey CSV adapter - vendor rows → SourceSpecialty
//
// Expected header (blank cells mean "not reported"):
//   vendor,specialty,n,tcc_p25,tcc_p50,tcc_p75,tcc_p90,
//   wrvu_p25,wrvu_p50,wrvu_p75,wrvu_p90,cf_p25,cf_p50,cf_p75,cf_p90

use crate::entities::{PercentileValues, SourceSpecialty, SurveyMetrics};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SurveyRow {
    vendor: String,
    specialty: String,
    #[serde(default)]
    n: Option<u32>,
    #[serde(default)]
    tcc_p25: Option<f64>,
    #[serde(default)]
    tcc_p50: Option<f64>,
    #[serde(default)]
    tcc_p75: Option<f64>,
    #[serde(default)]
    tcc_p90: Option<f64>,
    #[serde(default)]
    wrvu_p25: Option<f64>,
    #[serde(default)]
    wrvu_p50: Option<f64>,
    #[serde(default)]
    wrvu_p75: Option<f64>,
    #[serde(default)]
    wrvu_p90: Option<f64>,
    #[serde(default)]
    cf_p25: Option<f64>,
    #[serde(default)]
    cf_p50: Option<f64>,
    #[serde(default)]
    cf_p75: Option<f64>,
    #[serde(default)]
    cf_p90: Option<f64>,
}

fn percentiles(p25: Option<f64>, p50: Option<f64>, p75: Option<f64>, p90: Option<f64>) -> Option<PercentileValues> {
    let values = PercentileValues { p25, p50, p75, p90 };
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

impl SurveyRow {
    fn into_source(self) -> SourceSpecialty {
        let metrics = SurveyMetrics {
            tcc: percentiles(self.tcc_p25, self.tcc_p50, self.tcc_p75, self.tcc_p90),
            wrvu: percentiles(self.wrvu_p25, self.wrvu_p50, self.wrvu_p75, self.wrvu_p90),
            cf: percentiles(self.cf_p25, self.cf_p50, self.cf_p75, self.cf_p90),
        };
        SourceSpecialty::with_metrics(&self.specialty, &self.vendor, metrics, self.n.unwrap_or(1))
    }
}

pub fn load_survey_csv(csv_path: &Path) -> Result<Vec<SourceSpecialty>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    read_survey(file)
}

pub fn read_survey<R: Read>(reader: R) -> Result<Vec<SourceSpecialty>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut sources = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let row: SurveyRow = result.with_context(|| format!("Failed to deserialize survey row {}", index + 1))?;
        if row.vendor.is_empty() || row.specialty.is_empty() {
            bail!("Survey row {} is missing vendor or specialty", index + 1);
        }
        sources.push(row.into_source());
    }

    Ok(sources)
}
