//! Reads back the workbooks the exporter writes.
//!
//! Only the subset of SpreadsheetML that `rust_xlsxwriter` emits for a report
//! is understood: shared strings, plain numbers and one worksheet.

use std::collections::HashMap;
use std::io::{self, Cursor, Read};

/// Cell values of the first worksheet, keyed by reference such as `E2`.
#[derive(Debug, Default)]
pub struct SheetCells {
    /// Worksheet names in workbook order.
    pub sheet_names: Vec<String>,
    cells: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Text(String),
    Number(f64),
}

impl SheetCells {
    /// Parse xlsx bytes.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the archive or one of its parts is unreadable.
    pub fn read(bytes: &[u8]) -> io::Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut part = |name: &str| -> io::Result<String> {
            let mut xml = String::new();
            archive.by_name(name)?.read_to_string(&mut xml)?;
            Ok(xml)
        };

        let workbook = part("xl/workbook.xml")?;
        let strings = shared_strings(&part("xl/sharedStrings.xml")?);
        let sheet = part("xl/worksheets/sheet1.xml")?;

        let sheet_names = workbook
            .split("<sheet name=\"")
            .skip(1)
            .filter_map(|rest| rest.split_once('"'))
            .map(|(name, _)| unescape(name))
            .collect();

        let mut cells = HashMap::new();
        for chunk in sheet.split("<c r=\"").skip(1) {
            let Some((reference, rest)) = chunk.split_once('"') else {
                continue;
            };
            let Some((attrs, body)) = rest.split_once('>') else {
                continue;
            };
            if attrs.ends_with('/') {
                continue;
            }
            let Some(raw) = body
                .split_once("<v>")
                .and_then(|(_, v)| v.split_once("</v>"))
                .map(|(v, _)| v)
            else {
                continue;
            };

            let value = if attrs.contains("t=\"s\"") {
                let index: usize = raw.parse().map_err(invalid)?;
                let text = strings.get(index).ok_or_else(|| {
                    invalid(format!("shared string {index} out of range"))
                })?;
                Value::Text(text.clone())
            } else {
                Value::Number(raw.parse().map_err(invalid)?)
            };
            cells.insert(reference.to_owned(), value);
        }

        Ok(Self { sheet_names, cells })
    }

    /// Text in a string cell.
    #[must_use]
    pub fn text(&self, reference: &str) -> Option<&str> {
        match self.cells.get(reference)? {
            Value::Text(text) => Some(text),
            Value::Number(_) => None,
        }
    }

    /// Value of a numeric cell.
    #[must_use]
    pub fn number(&self, reference: &str) -> Option<f64> {
        match self.cells.get(reference)? {
            Value::Number(number) => Some(*number),
            Value::Text(_) => None,
        }
    }

    /// Highest 1-based row index holding a value.
    #[must_use]
    pub fn last_row(&self) -> u32 {
        self.cells
            .keys()
            .filter_map(|reference| {
                reference
                    .trim_start_matches(|c: char| c.is_ascii_alphabetic())
                    .parse()
                    .ok()
            })
            .max()
            .unwrap_or(0)
    }
}

fn shared_strings(xml: &str) -> Vec<String> {
    xml.split("<si>")
        .skip(1)
        .map(|item| {
            item.split("<t")
                .skip(1)
                .filter_map(|run| run.split_once('>'))
                .filter_map(|(_, body)| body.split_once("</t>"))
                .map(|(text, _)| unescape(text))
                .collect()
        })
        .collect()
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn invalid(error: impl ToString) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, error.to_string())
}
