//! Streams RFC 4180 CSV rows keyed by header name over any byte source.
//!
//! Numeric and boolean coercion is the builder's job, not this reader's:
//! every field comes back as a trimmed string, and a column that the header
//! doesn't have yields `""` rather than an error.

use std::io::Read;

use csv::{ReaderBuilder, Trim};

pub struct TabularReader<R: Read> {
    inner: csv::Reader<R>,
}

impl<R: Read> TabularReader<R> {
    pub fn new(reader: R) -> Self {
        let inner = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);
        Self { inner }
    }

    /// Iterate header-keyed records. A deserialization failure on a single
    /// row is surfaced to the caller rather than aborting the whole file.
    pub fn records(&mut self) -> impl Iterator<Item = csv::Result<Record>> {
        let headers = self.inner.headers().cloned().unwrap_or_default();
        self.inner.records().map(move |result| {
            result.map(|raw| Record {
                headers: headers.clone(),
                raw,
            })
        })
    }
}

#[derive(Clone)]
pub struct Record {
    headers: csv::StringRecord,
    raw: csv::StringRecord,
}

impl Record {
    /// The value for `column`, or `""` if the column isn't present in this
    /// file's header. Never errors — absent optional columns are routine.
    pub fn get(&self, column: &str) -> &str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.raw.get(i))
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_header_keyed_trimmed_records() {
        let csv = "stop_id, stop_name ,stop_lat,stop_lon\n 1 , Central , 51.5 , -0.1\n";
        let mut reader = TabularReader::new(csv.as_bytes());
        let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("stop_id"), "1");
        assert_eq!(rows[0].get("stop_name"), "Central");
        assert_eq!(rows[0].get("missing_column"), "");
    }

    #[test]
    fn skips_empty_lines() {
        let csv = "a,b\n1,2\n\n3,4\n";
        let mut reader = TabularReader::new(csv.as_bytes());
        let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
    }
}
