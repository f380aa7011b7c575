//! Roster ingestion
//!
//! Reads the signer roster from a spreadsheet and turns each row into a
//! [`RosterEntry`]. The first worksheet is used and its first row must hold
//! the column headers `nombre`, `apellido1`, `apellido2`, `telefono` and
//! `ruta` (`id` is optional).

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{FirmaError, Result};
use crate::normalize::{digits_only, normalize};
use calamine::{open_workbook_auto, Data, Reader};
use serde::Serialize;
use std::path::{Path, PathBuf};

const REQUIRED_COLUMNS: [&str; 5] = ["nombre", "apellido1", "apellido2", "telefono", "ruta"];

/// Phone cell as found in the spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub enum PhoneCell {
    Number(f64),
    Text(String),
}

impl PhoneCell {
    /// Digits of the phone. Numeric cells drop any fractional part first, so
    /// `612345678.0` yields `"612345678"`.
    pub fn digits(&self) -> String {
        match self {
            PhoneCell::Number(n) => digits_only(&format!("{}", n.trunc() as i64)),
            PhoneCell::Text(s) => digits_only(s),
        }
    }
}

/// One raw roster row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterRow {
    pub id: Option<String>,
    pub nombre: Option<String>,
    pub apellido1: Option<String>,
    pub apellido2: Option<String>,
    pub telefono: Option<PhoneCell>,
    pub ruta: Option<String>,
}

impl RosterRow {
    /// Convenience constructor used by callers that build rosters in code.
    pub fn new(nombre: &str, apellido1: &str, apellido2: &str) -> Self {
        Self {
            nombre: non_empty(nombre),
            apellido1: non_empty(apellido1),
            apellido2: non_empty(apellido2),
            ..Self::default()
        }
    }

    pub fn with_phone(mut self, phone: PhoneCell) -> Self {
        self.telefono = Some(phone);
        self
    }

    pub fn with_path(mut self, ruta: &str) -> Self {
        self.ruta = non_empty(ruta);
        self
    }

    /// "nombre apellido1 apellido2" with absent parts rendered as empty.
    pub fn display_name(&self) -> String {
        format!(
            "{} {} {}",
            field(&self.nombre),
            field(&self.apellido1),
            field(&self.apellido2)
        )
    }
}

/// A roster person with a signature image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub id: Option<String>,
    /// Normalized "first surname1 surname2".
    pub full_name: String,
    /// Normalized "first surname1".
    pub short_name: String,
    /// Phone digits, when the row carried any.
    pub phone_digits: Option<String>,
    pub signature_path: PathBuf,
    /// Whether `signature_path` pointed at an existing file at load time.
    pub path_exists: bool,
}

impl RosterEntry {
    /// Build an entry from a row. Rows without `ruta` yield `None`.
    ///
    /// Relative signature paths that do not exist as given are retried
    /// against `roster_dir`.
    pub fn from_row(row: &RosterRow, roster_dir: Option<&Path>) -> Option<Self> {
        let ruta = row.ruta.as_deref()?;
        let (signature_path, path_exists) = resolve_signature_path(ruta, roster_dir);

        let full_name = normalize(&row.display_name());
        let short_name = normalize(&format!(
            "{} {}",
            field(&row.nombre),
            field(&row.apellido1)
        ));
        let phone_digits = row
            .telefono
            .as_ref()
            .map(PhoneCell::digits)
            .filter(|d| !d.is_empty());

        Some(Self {
            id: row.id.clone(),
            full_name,
            short_name,
            phone_digits,
            signature_path,
            path_exists,
        })
    }
}

/// Roster contents plus the directory relative paths are resolved against.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub rows: Vec<RosterRow>,
    pub base_dir: Option<PathBuf>,
}

impl Roster {
    pub fn from_rows(rows: Vec<RosterRow>, base_dir: Option<PathBuf>) -> Self {
        Self { rows, base_dir }
    }

    /// Read the first worksheet of a spreadsheet (`.xlsx`, `.xls`, `.xlsb`, `.ods`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let read_err = |reason: String| FirmaError::RosterRead {
            path: path.to_path_buf(),
            reason,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| read_err(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| read_err("workbook has no worksheets".to_string()))?
            .map_err(|e| read_err(e.to_string()))?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| read_err("worksheet is empty".to_string()))?;
        let columns = ColumnMap::from_header(header).map_err(read_err)?;
        let rows = rows.map(|cells| columns.row(cells)).collect();

        Ok(Self {
            rows,
            base_dir: path.parent().map(Path::to_path_buf),
        })
    }

    /// Turn rows into entries, reporting each decision to `sink`.
    pub fn entries(&self, sink: &mut dyn DiagnosticSink) -> Vec<RosterEntry> {
        let mut entries = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            match RosterEntry::from_row(row, self.base_dir.as_deref()) {
                Some(entry) => {
                    sink.record(Diagnostic::RosterEntryLoaded {
                        name: entry.full_name.clone(),
                        phone: entry.phone_digits.clone(),
                        path: entry.signature_path.clone(),
                        path_exists: entry.path_exists,
                    });
                    entries.push(entry);
                }
                None => sink.record(Diagnostic::RosterEntrySkipped {
                    name: normalize(&row.display_name()),
                }),
            }
        }
        entries
    }
}

/// Positions of the known columns within the header row.
#[derive(Debug, Default)]
struct ColumnMap {
    id: Option<usize>,
    nombre: usize,
    apellido1: usize,
    apellido2: usize,
    telefono: usize,
    ruta: usize,
}

impl ColumnMap {
    fn from_header(header: &[Data]) -> std::result::Result<Self, String> {
        let names: Vec<String> = header
            .iter()
            .map(|cell| cell_text(cell).unwrap_or_default().to_lowercase())
            .collect();
        let find = |column: &str| names.iter().position(|n| n == column);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| find(c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing required column(s): {}", missing.join(", ")));
        }

        // Every required column was found above.
        let required = |column: &str| find(column).unwrap_or_default();
        Ok(Self {
            id: find("id"),
            nombre: required("nombre"),
            apellido1: required("apellido1"),
            apellido2: required("apellido2"),
            telefono: required("telefono"),
            ruta: required("ruta"),
        })
    }

    fn row(&self, cells: &[Data]) -> RosterRow {
        let text = |idx: usize| cells.get(idx).and_then(cell_text);
        RosterRow {
            id: self.id.and_then(text),
            nombre: text(self.nombre),
            apellido1: text(self.apellido1),
            apellido2: text(self.apellido2),
            telefono: cells.get(self.telefono).and_then(cell_phone),
            ruta: text(self.ruta),
        }
    }
}

/// Trimmed textual value of a cell; empty cells are `None`.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    non_empty(&text)
}

fn cell_phone(cell: &Data) -> Option<PhoneCell> {
    match cell {
        Data::Float(f) => Some(PhoneCell::Number(*f)),
        Data::Int(i) => Some(PhoneCell::Number(*i as f64)),
        other => cell_text(other).map(PhoneCell::Text),
    }
}

fn resolve_signature_path(ruta: &str, roster_dir: Option<&Path>) -> (PathBuf, bool) {
    let direct = PathBuf::from(ruta);
    if direct.exists() {
        return (direct, true);
    }
    if let Some(dir) = roster_dir {
        let relative = dir.join(ruta);
        if relative.exists() {
            return (relative, true);
        }
    }
    (direct, false)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header() -> Vec<Data> {
        ["id", "Nombre", "apellido1", "apellido2", "telefono", " ruta "]
            .iter()
            .map(|s| Data::String(s.to_string()))
            .collect()
    }

    #[test]
    fn test_phone_cell_digits() {
        assert_eq!(PhoneCell::Number(612345678.0).digits(), "612345678");
        assert_eq!(PhoneCell::Text("612 34 56 78".into()).digits(), "612345678");
        assert_eq!(PhoneCell::Text("n/a".into()).digits(), "");
    }

    #[test]
    fn test_column_map_reads_row() {
        let columns = ColumnMap::from_header(&header()).unwrap();
        let row = columns.row(&[
            Data::Int(7),
            Data::String(" Juan ".into()),
            Data::String("Pérez".into()),
            Data::Empty,
            Data::Float(612345678.0),
            Data::String("firmas/juan.png".into()),
        ]);

        assert_eq!(
            row,
            RosterRow {
                id: Some("7".into()),
                nombre: Some("Juan".into()),
                apellido1: Some("Pérez".into()),
                apellido2: None,
                telefono: Some(PhoneCell::Number(612345678.0)),
                ruta: Some("firmas/juan.png".into()),
            }
        );
    }

    #[test]
    fn test_column_map_short_row() {
        let columns = ColumnMap::from_header(&header()).unwrap();
        let row = columns.row(&[Data::Int(1), Data::String("Ana".into())]);
        assert_eq!(row.nombre.as_deref(), Some("Ana"));
        assert!(row.ruta.is_none());
        assert!(row.telefono.is_none());
    }

    #[test]
    fn test_column_map_missing_column() {
        let header: Vec<Data> = ["nombre", "apellido1", "ruta"]
            .iter()
            .map(|s| Data::String(s.to_string()))
            .collect();
        let err = ColumnMap::from_header(&header).unwrap_err();
        assert!(err.contains("apellido2"));
        assert!(err.contains("telefono"));
    }

    #[test]
    fn test_entry_names() {
        let row = RosterRow::new("Juan", "Pérez", "García")
            .with_phone(PhoneCell::Text("612345678".into()))
            .with_path("juan.png");
        let entry = RosterEntry::from_row(&row, None).unwrap();

        assert_eq!(entry.full_name, "JUAN PEREZ GARCIA");
        assert_eq!(entry.short_name, "JUAN PEREZ");
        assert_eq!(entry.phone_digits.as_deref(), Some("612345678"));
        assert!(!entry.path_exists);
    }

    #[test]
    fn test_entry_without_second_surname() {
        let row = RosterRow::new("Ana", "López", "").with_path("ana.png");
        let entry = RosterEntry::from_row(&row, None).unwrap();
        assert_eq!(entry.full_name, "ANA LOPEZ");
        assert_eq!(entry.short_name, "ANA LOPEZ");
        assert!(entry.phone_digits.is_none());
    }

    #[test]
    fn test_entry_requires_path() {
        let row = RosterRow::new("Ana", "López", "");
        assert!(RosterEntry::from_row(&row, None).is_none());
    }

    #[test]
    fn test_relative_path_resolved_against_roster_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ana.png"), b"png").unwrap();

        let row = RosterRow::new("Ana", "López", "").with_path("ana.png");
        let entry = RosterEntry::from_row(&row, Some(dir.path())).unwrap();

        assert!(entry.path_exists);
        assert_eq!(entry.signature_path, dir.path().join("ana.png"));
    }

    #[test]
    fn test_entries_reports_skipped_rows() {
        let roster = Roster::from_rows(
            vec![
                RosterRow::new("Ana", "López", "").with_path("ana.png"),
                RosterRow::new("Luis", "Gil", ""),
            ],
            None,
        );
        let mut events: Vec<Diagnostic> = Vec::new();
        let entries = roster.entries(&mut events);

        assert_eq!(entries.len(), 1);
        assert!(matches!(
            events[1],
            Diagnostic::RosterEntrySkipped { ref name } if name == "LUIS GIL"
        ));
    }

    #[test]
    fn test_load_missing_file_is_roster_error() {
        let err = Roster::load("/definitely/not/here.xlsx").unwrap_err();
        assert!(matches!(err, FirmaError::RosterRead { .. }));
    }
}
