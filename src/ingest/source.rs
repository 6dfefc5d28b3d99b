//! Pull-based reader over a `;`-separated harvest export.

use crate::error::{HarvestError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const COL_FARMER_EMAIL: &str = "Mail Agricultor";
pub const COL_FARMER_FIRST_NAME: &str = "Nombre Agricultor";
pub const COL_FARMER_LAST_NAME: &str = "Apellido Agricultor";
pub const COL_CLIENT_EMAIL: &str = "Mail Cliente";
pub const COL_CLIENT_FIRST_NAME: &str = "Nombre Cliente";
pub const COL_CLIENT_LAST_NAME: &str = "Apellido Cliente";
pub const COL_FIELD_NAME: &str = "Nombre Campo";
pub const COL_FIELD_LOCATION: &str = "Ubicación de Campo";
pub const COL_HARVESTED_FRUIT: &str = "Fruta Cosechada";
pub const COL_HARVESTED_VARIETY: &str = "Variedad Cosechada";

/// One data line of the export, values exactly as they appear in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestRow {
    /// 1-based position in the file, header excluded.
    pub record_number: usize,
    pub farmer_email: String,
    pub farmer_first_name: String,
    pub farmer_last_name: String,
    pub client_email: String,
    pub client_first_name: String,
    pub client_last_name: String,
    pub field_name: String,
    pub field_location: String,
    pub harvested_fruit: String,
    pub harvested_variety: String,
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    farmer_email: usize,
    farmer_first_name: usize,
    farmer_last_name: usize,
    client_email: usize,
    client_first_name: usize,
    client_last_name: usize,
    field_name: usize,
    field_location: usize,
    harvested_fruit: usize,
    harvested_variety: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| HarvestError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            farmer_email: find(COL_FARMER_EMAIL)?,
            farmer_first_name: find(COL_FARMER_FIRST_NAME)?,
            farmer_last_name: find(COL_FARMER_LAST_NAME)?,
            client_email: find(COL_CLIENT_EMAIL)?,
            client_first_name: find(COL_CLIENT_FIRST_NAME)?,
            client_last_name: find(COL_CLIENT_LAST_NAME)?,
            field_name: find(COL_FIELD_NAME)?,
            field_location: find(COL_FIELD_LOCATION)?,
            harvested_fruit: find(COL_HARVESTED_FRUIT)?,
            harvested_variety: find(COL_HARVESTED_VARIETY)?,
        })
    }

    fn build(&self, record: &StringRecord, record_number: usize) -> HarvestRow {
        let get = |idx: usize| record.get(idx).unwrap_or_default().to_string();
        HarvestRow {
            record_number,
            farmer_email: get(self.farmer_email),
            farmer_first_name: get(self.farmer_first_name),
            farmer_last_name: get(self.farmer_last_name),
            client_email: get(self.client_email),
            client_first_name: get(self.client_first_name),
            client_last_name: get(self.client_last_name),
            field_name: get(self.field_name),
            field_location: get(self.field_location),
            harvested_fruit: get(self.harvested_fruit),
            harvested_variety: get(self.harvested_variety),
        }
    }
}

/// Lazy, finite sequence of rows. The first read error ends the sequence:
/// it is yielded once and every later `next` returns `None`. The underlying
/// reader is owned here and released when the source is dropped.
pub struct RowSource<R: Read = BufReader<File>> {
    reader: csv::Reader<R>,
    columns: ColumnIndex,
    record: StringRecord,
    next_number: usize,
    done: bool,
}

impl RowSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read> RowSource<R> {
    /// Reads and validates the header line.
    pub fn from_reader(input: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(input);
        let headers = reader.headers()?.clone();
        let columns = ColumnIndex::from_headers(&headers)?;
        Ok(Self {
            reader,
            columns,
            record: StringRecord::new(),
            next_number: 1,
            done: false,
        })
    }
}

impl<R: Read> Iterator for RowSource<R> {
    type Item = Result<HarvestRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                let row = self.columns.build(&self.record, self.next_number);
                self.next_number += 1;
                Some(Ok(row))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Mail Agricultor;Nombre Agricultor;Apellido Agricultor;Mail Cliente;Nombre Cliente;Apellido Cliente;Nombre Campo;Ubicación de Campo;Fruta Cosechada;Variedad Cosechada";

    fn source(body: &str) -> Result<RowSource<&[u8]>> {
        RowSource::from_reader(body.as_bytes())
    }

    #[test]
    fn maps_columns_and_numbers_rows_from_one() {
        let input = format!(
            "{}\nf@x.com;Luis;Rojas;c@x.com;Ana;Diaz;Norte;Curico;Apple;Granny Smith\n;;;c2@x.com;;;;;;\n",
            HEADER
        );
        let rows: Vec<HarvestRow> = source(&input)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record_number, 1);
        assert_eq!(rows[0].farmer_email, "f@x.com");
        assert_eq!(rows[0].client_last_name, "Diaz");
        assert_eq!(rows[0].field_location, "Curico");
        assert_eq!(rows[0].harvested_variety, "Granny Smith");
        assert_eq!(rows[1].record_number, 2);
        assert_eq!(rows[1].client_email, "c2@x.com");
        assert!(rows[1].farmer_email.is_empty());
    }

    #[test]
    fn column_order_follows_the_header() {
        let input = "Variedad Cosechada;Fruta Cosechada;Ubicación de Campo;Nombre Campo;Apellido Cliente;Nombre Cliente;Mail Cliente;Apellido Agricultor;Nombre Agricultor;Mail Agricultor\nFuji;Apple;L1;F1;Diaz;Ana;c@x.com;Rojas;Luis;f@x.com\n";
        let row = source(input).unwrap().next().unwrap().unwrap();

        assert_eq!(row.harvested_variety, "Fuji");
        assert_eq!(row.client_email, "c@x.com");
        assert_eq!(row.farmer_email, "f@x.com");
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let input = format!("{}\nf@x.com;Luis;Rojas;c@x.com\n", HEADER);
        let row = source(&input).unwrap().next().unwrap().unwrap();

        assert_eq!(row.client_email, "c@x.com");
        assert!(row.field_name.is_empty());
        assert!(row.harvested_variety.is_empty());
    }

    #[test]
    fn header_without_accent_is_rejected() {
        let input = HEADER.replace("Ubicación", "Ubicacion");
        let err = source(&input).err().unwrap();

        assert!(matches!(err, HarvestError::MissingColumn(ref c) if c == COL_FIELD_LOCATION));
        assert!(err.is_parse_failure());
    }

    #[test]
    fn read_error_ends_the_sequence() {
        let mut bytes = format!("{}\n", HEADER).into_bytes();
        bytes.extend_from_slice(b"f@x.com;Luis;Rojas;c@x.com;Ana;Diaz;F1;L1;Apple;Fuji\n");
        bytes.extend_from_slice(b"f@x.com;\xff\xfe;Rojas;c@x.com;Ana;Diaz;F1;L1;Apple;Fuji\n");
        bytes.extend_from_slice(b"f@x.com;Luis;Rojas;c@x.com;Ana;Diaz;F1;L1;Apple;Fuji\n");
        let mut rows = RowSource::from_reader(bytes.as_slice()).unwrap();

        assert!(rows.next().unwrap().is_ok());
        let err = rows.next().unwrap().unwrap_err();
        assert!(err.is_parse_failure());
        assert!(rows.next().is_none());
    }
}
