use std::{
    collections::BTreeSet,
    fs::{read_dir, File},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use itertools::Itertools;

use crate::model::{Company, Place, FIELDNAMES};

/// Snapshots are named `{YYYY-MM-DD}-{name}.csv.zst`.
pub const EXTENSION: &str = "csv.zst";

/// Path of the most recent snapshot of a named dataset, scanning the
/// data directory for dates embedded in filenames and walking them
/// newest first until one actually exists.
pub fn newest(data_dir: &Path, name: &str) -> Result<Option<PathBuf>> {
    let mut dates = BTreeSet::new();
    for entry in read_dir(data_dir)
        .with_context(|| format!("failed to list data directory {}", data_dir.display()))?
    {
        let file = entry?.file_name();
        if let Some(date) = iso_date(&file.to_string_lossy()) {
            dates.insert(date.to_string());
        }
    }

    for date in dates.iter().rev() {
        let path = data_dir.join(format!("{date}-{name}.{EXTENSION}"));
        if path.is_file() {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// First `YYYY-MM-DD` substring of a filename, if any.
fn iso_date(file: &str) -> Option<&str> {
    let bytes = file.as_bytes();
    for start in 0..bytes.len().saturating_sub(9) {
        let window = &bytes[start..start + 10];
        let matches = window.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
        if matches {
            return Some(&file[start..start + 10]);
        }
    }

    None
}

pub fn output_path(data_dir: &Path) -> PathBuf {
    let date = Local::now().format("%Y-%m-%d");
    data_dir.join(format!("{date}-sex-place-distances.{EXTENSION}"))
}

pub fn read_companies(path: &Path) -> Result<Vec<Company>> {
    let input = zstd::Decoder::new(
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
    )?;
    let mut reader = csv::Reader::from_reader(input);
    let companies = reader.deserialize::<Company>().try_collect()?;
    Ok(companies)
}

/// Append-only output writer, held open for the whole run. Each run adds
/// one zstd frame; concatenated frames decode as a single stream. The
/// encoder finishes its frame on drop, so rows already appended survive
/// a run that aborts before `finish`.
pub struct Appender {
    writer: csv::Writer<zstd::stream::write::AutoFinishEncoder<'static, File>>,
}

impl Appender {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open output {}", path.display()))?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(zstd::Encoder::new(file, 0)?.auto_finish());

        Ok(Self { writer })
    }

    pub fn write_headers(&mut self) -> Result<()> {
        self.writer.write_record(FIELDNAMES)?;
        Ok(())
    }

    pub fn append(&mut self, place: &Place) -> Result<()> {
        self.writer.serialize(place)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use typed_floats::tf64::NonNaN;

    use super::*;

    #[test]
    fn iso_date_scans_filenames() {
        assert_eq!(iso_date("2023-01-05-companies.csv.zst"), Some("2023-01-05"));
        assert_eq!(iso_date("backup.2023-01-05.csv.zst"), Some("2023-01-05"));
        assert_eq!(iso_date("companies.csv.zst"), None);
        assert_eq!(iso_date("2023-1-5-companies.csv.zst"), None);
        assert_eq!(iso_date(""), None);
    }

    #[test]
    fn newest_prefers_the_latest_matching_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "2023-01-01-companies.csv.zst",
            "2023-01-05-companies.csv.zst",
            "2023-01-10-other.csv.zst",
        ] {
            File::create(dir.path().join(name)).unwrap();
        }

        let found = newest(dir.path(), "companies").unwrap().unwrap();
        assert_eq!(found, dir.path().join("2023-01-05-companies.csv.zst"));
    }

    #[test]
    fn newest_without_a_match_is_none() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        assert!(newest(dir.path(), "companies").unwrap().is_none());
    }

    #[test]
    fn read_companies_tolerates_missing_and_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2023-01-05-companies.csv.zst");

        let mut encoder = zstd::Encoder::new(File::create(&path).unwrap(), 0).unwrap();
        encoder
            .write_all(
                b"cnpj,name,latitude,longitude,situation\n\
                  12.345.678/0001-91,Central Alimentos Ltda,-23.55,-46.63,active\n\
                  98.765.432/0001-10,Sem Coordenadas SA,,,inactive\n",
            )
            .unwrap();
        encoder.finish().unwrap();

        let companies = read_companies(&path).unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].name, "Central Alimentos Ltda");
        assert_eq!(companies[0].trade_name, "");
        assert!(companies[0].point().is_some());
        assert_eq!(companies[1].latitude, "");
        assert!(companies[1].point().is_none());
    }

    fn place() -> Place {
        Place {
            id: Some("abc123".to_string()),
            keyword: "sex shop".to_string(),
            latitude: -23.5510,
            longitude: -46.6340,
            distance: NonNaN::new(40.0).unwrap(),
            name: "Shop X".to_string(),
            address: "Rua A, 1".to_string(),
            phone: "(11) 5555-5555".to_string(),
            cnpj: "12345678000191".to_string(),
            company_name: "Central Alimentos Ltda".to_string(),
            company_trade_name: "Padaria Central".to_string(),
        }
    }

    #[test]
    fn append_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2023-01-05-sex-place-distances.csv.zst");

        let mut output = Appender::create(&path).unwrap();
        output.write_headers().unwrap();
        output.append(&place()).unwrap();
        output.finish().unwrap();

        let input = zstd::Decoder::new(File::open(&path).unwrap()).unwrap();
        let mut reader = csv::Reader::from_reader(input);
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(FIELDNAMES.to_vec())
        );
        let rows: Vec<Place> = reader.deserialize().try_collect().unwrap();
        assert_eq!(rows, vec![place()]);
    }

    #[test]
    fn appended_rows_survive_an_aborted_run() {
        // a transport failure aborts the run without reaching finish();
        // whatever was already appended must still decode
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv.zst");

        let mut output = Appender::create(&path).unwrap();
        let mut farther = place();
        farther.keyword = "night club".to_string();
        farther.distance = NonNaN::new(75.0).unwrap();
        output.append(&place()).unwrap();
        output.append(&farther).unwrap();
        drop(output);

        let input = zstd::Decoder::new(File::open(&path).unwrap()).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(input);
        let rows: Vec<Place> = reader.deserialize().try_collect().unwrap();
        assert_eq!(rows, vec![place(), farther]);
    }

    #[test]
    fn append_without_a_place_for_an_id_less_candidate() {
        // id stays empty in the csv and reads back as None
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv.zst");

        let mut anonymous = place();
        anonymous.id = None;

        let mut output = Appender::create(&path).unwrap();
        output.write_headers().unwrap();
        output.append(&anonymous).unwrap();
        output.finish().unwrap();

        let input = zstd::Decoder::new(File::open(&path).unwrap()).unwrap();
        let mut reader = csv::Reader::from_reader(input);
        let rows: Vec<Place> = reader.deserialize().try_collect().unwrap();
        assert_eq!(rows[0].id, None);
    }
}
