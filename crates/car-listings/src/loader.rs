//! Reading the listings table and deriving `make`.
//!
//! Loading is two steps: [`DataLoader::read_path`] / [`DataLoader::read_str`]
//! produce the raw frame as the CSV reader infers it, and
//! [`DataLoader::prepare`] validates it into the frame the imputer expects:
//! required columns present, numeric columns strictly converted,
//! `date_posted` parsed into a `Date` column, and a `make` column appended.

use crate::config::PipelineConfig;
use crate::error::{ListingsError, ParseError, Result, ResultExt};
use crate::types::columns;
use crate::utils::{check_non_negative, date_series, string_values, strict_numeric};
use chrono::NaiveDate;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info};

/// Columns converted to `Float64`.
const FLOAT_COLUMNS: [&str; 5] = [
    columns::PRICE,
    columns::MODEL_YEAR,
    columns::CYLINDERS,
    columns::ODOMETER,
    columns::IS_4WD,
];

/// Numeric columns that may not hold negative values.
const NON_NEGATIVE_COLUMNS: [&str; 2] = [columns::PRICE, columns::ODOMETER];

/// Columns that are never imputed and so must be present in every row.
/// `model`, `type` and `date_posted` have their own, more specific errors.
const ALWAYS_PRESENT_COLUMNS: [&str; 3] =
    [columns::PRICE, columns::CONDITION, columns::DAYS_LISTED];

/// Columns converted to `String`.
const STRING_COLUMNS: [&str; 4] = [
    columns::MODEL,
    columns::CONDITION,
    columns::TYPE,
    columns::PAINT_COLOR,
];

/// Loads the listings table from a delimited file.
#[derive(Debug, Clone)]
pub struct DataLoader {
    date_format: String,
    infer_schema_length: usize,
}

impl DataLoader {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            date_format: config.date_format.clone(),
            infer_schema_length: config.infer_schema_length,
        }
    }

    /// Read and prepare a CSV file.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let raw = self.read_path(path)?;
        self.prepare(raw)
    }

    /// Read and prepare CSV text.
    pub fn load_str(&self, csv: &str) -> Result<DataFrame> {
        let raw = self.read_str(csv)?;
        self.prepare(raw)
    }

    /// Read and prepare CSV from any reader.
    pub fn load_reader(&self, reader: impl Read) -> Result<DataFrame> {
        let raw = self.read_reader(reader)?;
        self.prepare(raw)
    }

    /// Read a CSV file without validation.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        info!("Loading listings from: {}", path.display());

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .context(format!("Opening {}", path.display()))?
            .finish()
            .context(format!("Reading {}", path.display()))?;

        debug!("Raw frame shape: {:?}", df.shape());
        Ok(df)
    }

    /// Read CSV text without validation.
    pub fn read_str(&self, csv: &str) -> Result<DataFrame> {
        self.read_bytes(csv.as_bytes().to_vec())
    }

    /// Read CSV from any reader without validation.
    pub fn read_reader(&self, mut reader: impl Read) -> Result<DataFrame> {
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .map_err(|e| ListingsError::from(e).with_context("Reading CSV input"))?;
        self.read_bytes(buffer)
    }

    fn read_bytes(&self, bytes: Vec<u8>) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .context("Reading CSV input")?;
        debug!("Raw frame shape: {:?}", df.shape());
        Ok(df)
    }

    /// Validate a raw frame and derive `make`.
    ///
    /// Fails on the first missing column, non-numeric or out-of-range value,
    /// missing value in an always-present column, bad date or empty model.
    /// Row numbers in errors are 1-based data rows.
    pub fn prepare(&self, mut df: DataFrame) -> Result<DataFrame> {
        for column in columns::REQUIRED {
            if df.column(column).is_err() {
                return Err(ParseError::MissingColumn(column.to_string()).into());
            }
        }

        for column in FLOAT_COLUMNS {
            let converted = strict_numeric(&df, column, &DataType::Float64)?;
            if NON_NEGATIVE_COLUMNS.contains(&column) {
                check_non_negative(&converted, column, false)?;
            }
            df.replace(column, converted)?;
        }
        let days_listed = strict_numeric(&df, columns::DAYS_LISTED, &DataType::Float64)?;
        check_non_negative(&days_listed, columns::DAYS_LISTED, true)?;
        df.replace(columns::DAYS_LISTED, days_listed.cast(&DataType::Int64)?)?;

        for column in STRING_COLUMNS {
            let converted = df
                .column(column)?
                .as_materialized_series()
                .cast(&DataType::String)?;
            df.replace(column, converted)?;
        }

        for column in ALWAYS_PRESENT_COLUMNS {
            ensure_present(&df, column)?;
        }

        let dates = self.parse_dates(&df)?;
        df.replace(columns::DATE_POSTED, date_series(columns::DATE_POSTED, &dates))?;

        let makes = derive_makes(&string_values(&df, columns::MODEL)?)?;
        df.with_column(Series::new(columns::MAKE.into(), makes))?;

        info!("Loaded {} listings ({} columns)", df.height(), df.width());
        Ok(df)
    }

    fn parse_dates(&self, df: &DataFrame) -> Result<Vec<NaiveDate>> {
        string_values(df, columns::DATE_POSTED)?
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                let raw = raw.unwrap_or_default();
                NaiveDate::parse_from_str(raw.trim(), &self.date_format).map_err(|_| {
                    ListingsError::from(ParseError::InvalidDate {
                        row: idx + 1,
                        value: raw,
                        format: self.date_format.clone(),
                    })
                })
            })
            .collect()
    }
}

fn ensure_present(df: &DataFrame, column: &str) -> Result<()> {
    let missing = string_values(df, column)?
        .iter()
        .position(|value| value.as_deref().is_none_or(|v| v.trim().is_empty()));
    match missing {
        Some(idx) => Err(ParseError::MissingValue {
            column: column.to_string(),
            row: idx + 1,
        }
        .into()),
        None => Ok(()),
    }
}

/// The make is the model up to its first whitespace character.
pub fn make_from_model(model: &str) -> Option<&str> {
    model.split_whitespace().next()
}

fn derive_makes(models: &[Option<String>]) -> Result<Vec<String>> {
    models
        .iter()
        .enumerate()
        .map(|(idx, model)| {
            model
                .as_deref()
                .and_then(make_from_model)
                .map(str::to_string)
                .ok_or_else(|| ListingsError::from(ParseError::MissingModel { row: idx + 1 }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{date_values, f64_values};
    use pretty_assertions::assert_eq;

    const HEADER: &str = "price,model_year,model,condition,cylinders,fuel,odometer,transmission,type,paint_color,is_4wd,date_posted,days_listed";

    fn loader() -> DataLoader {
        DataLoader::new(&PipelineConfig::default())
    }

    fn csv(rows: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text.push('\n');
        text
    }

    #[test]
    fn test_make_from_model() {
        assert_eq!(make_from_model("ford f-150"), Some("ford"));
        assert_eq!(make_from_model("bmw"), Some("bmw"));
        assert_eq!(make_from_model("chevrolet\tsilverado"), Some("chevrolet"));
        assert_eq!(make_from_model("   "), None);
        assert_eq!(make_from_model(""), None);
    }

    #[test]
    fn test_load_derives_make_and_parses_dates() {
        let text = csv(&[
            "9400,2011.0,bmw x5,good,6.0,gas,145000.0,automatic,SUV,,1.0,2018-06-23,19",
            "25500,,ford f-150,good,6.0,gas,88705.0,automatic,pickup,white,1.0,2018-10-19,50",
        ]);

        let df = loader().load_str(&text).unwrap();

        let makes = string_values(&df, "make").unwrap();
        assert_eq!(makes, vec![Some("bmw".to_string()), Some("ford".to_string())]);

        assert_eq!(df.column("date_posted").unwrap().dtype(), &DataType::Date);
        let dates = date_values(&df, "date_posted").unwrap();
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2018, 10, 19));

        let years = f64_values(&df, "model_year").unwrap();
        assert_eq!(years, vec![Some(2011.0), None]);
    }

    #[test]
    fn test_load_preserves_row_order() {
        let text = csv(&[
            "1,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,1",
            "2,2012,audi a4,good,4,gas,1,automatic,sedan,red,,2018-06-23,1",
            "3,2013,kia rio,good,4,gas,1,automatic,sedan,red,,2018-06-23,1",
        ]);

        let df = loader().load_str(&text).unwrap();
        let prices = f64_values(&df, "price").unwrap();
        assert_eq!(prices, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_invalid_date_is_parse_error() {
        let text = csv(&[
            "1,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,1",
            "2,2012,audi a4,good,4,gas,1,automatic,sedan,red,,06/23/2018,1",
        ]);

        let err = loader().load_str(&text).unwrap_err();
        match err {
            ListingsError::Parse(ParseError::InvalidDate { row, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "06/23/2018");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_model_is_parse_error() {
        let text = csv(&[
            "1,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,1",
            "2,2012,,good,4,gas,1,automatic,sedan,red,,2018-06-23,1",
        ]);

        let err = loader().load_str(&text).unwrap_err();
        assert!(matches!(
            err,
            ListingsError::Parse(ParseError::MissingModel { row: 2 })
        ));
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let text = "price,model\n100,kia soul\n";
        let err = loader().load_str(text).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_COLUMN");
    }

    #[test]
    fn test_non_numeric_price_is_parse_error() {
        let text = csv(&["cheap,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,1"]);
        let err = loader().load_str(&text).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NUMBER");
    }

    #[test]
    fn test_missing_price_is_parse_error() {
        let text = csv(&[
            "1,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,1",
            ",2012,audi a4,,4,gas,1,automatic,sedan,red,,2018-06-23,",
            "3,2013,kia rio,good,4,gas,1,automatic,sedan,red,,2018-06-23,1",
        ]);

        let err = loader().load_str(&text).unwrap_err();
        assert_eq!(
            err.to_string(),
            ParseError::MissingValue {
                column: "price".to_string(),
                row: 2,
            }
            .to_string()
        );
        assert_eq!(err.error_code(), "MISSING_VALUE");
    }

    #[test]
    fn test_missing_condition_is_parse_error() {
        let text = csv(&[
            "1,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,1",
            "2,2012,audi a4,,4,gas,1,automatic,sedan,red,,2018-06-23,1",
        ]);

        let err = loader().load_str(&text).unwrap_err();
        assert!(matches!(
            err,
            ListingsError::Parse(ParseError::MissingValue { ref column, row: 2 }) if column == "condition"
        ));
    }

    #[test]
    fn test_fractional_days_listed_is_parse_error() {
        let text = csv(&[
            "1,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,19.7",
            "2,2012,audi a4,good,4,gas,1,automatic,sedan,red,,2018-06-23,5",
        ]);

        let err = loader().load_str(&text).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NUMBER");
        assert!(err.to_string().contains("days_listed"));
    }

    #[test]
    fn test_negative_values_are_parse_errors() {
        let negative_days =
            csv(&["1,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,-5"]);
        let err = loader().load_str(&negative_days).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NUMBER");
        assert!(err.to_string().contains("days_listed"));

        let negative_price =
            csv(&["-100,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,1"]);
        let err = loader().load_str(&negative_price).unwrap_err();
        assert!(err.to_string().contains("price"));

        let negative_odometer =
            csv(&["100,2011,kia soul,good,4,gas,-1,automatic,sedan,red,,2018-06-23,1"]);
        let err = loader().load_str(&negative_odometer).unwrap_err();
        assert!(err.to_string().contains("odometer"));
    }

    #[test]
    fn test_whole_days_listed_loads_as_integer() {
        let text = csv(&["1,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,19.0"]);
        let df = loader().load_str(&text).unwrap();
        assert_eq!(df.column("days_listed").unwrap().dtype(), &DataType::Int64);
        assert_eq!(
            crate::utils::i64_values(&df, "days_listed").unwrap(),
            vec![Some(19)]
        );
    }

    #[test]
    fn test_load_reader() {
        let text = csv(&["1,2011,kia soul,good,4,gas,1,automatic,sedan,red,,2018-06-23,1"]);
        let df = loader().load_reader(text.as_bytes()).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(string_values(&df, "make").unwrap(), vec![Some("kia".to_string())]);
    }

    #[test]
    fn test_custom_date_format() {
        let config = PipelineConfig::builder()
            .date_format("%d/%m/%Y")
            .build()
            .unwrap();
        let text = csv(&["1,2011,kia soul,good,4,gas,1,automatic,sedan,red,,23/06/2018,1"]);

        let df = DataLoader::new(&config).load_str(&text).unwrap();
        let dates = date_values(&df, "date_posted").unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2018, 6, 23));
    }
}
