#![allow(dead_code)]

use std::path::{Path, PathBuf};

use asoa::loader::{BOATS_SHEET, REQUIRED_COLUMNS};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use tempfile::TempDir;

/// A fixture cell value.
#[derive(Clone, Copy)]
pub enum Cell {
    Num(f64),
    Text(&'static str),
    Date(i32, u32, u32),
}

pub type Row = Vec<(&'static str, Cell)>;

/// Write a roster workbook with the standard header and the given rows on
/// a sheet called `sheet`.
pub fn write_workbook(path: &Path, sheet: &str, rows: &[Row]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    for (col, name) in REQUIRED_COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name).unwrap();
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        for (name, cell) in row {
            let col = REQUIRED_COLUMNS
                .iter()
                .position(|c| c == name)
                .expect("unknown fixture column") as u16;
            match *cell {
                Cell::Num(n) => {
                    worksheet.write_number(r, col, n).unwrap();
                }
                Cell::Text(s) => {
                    worksheet.write_string(r, col, s).unwrap();
                }
                Cell::Date(y, m, d) => {
                    let date = NaiveDate::from_ymd_opt(y, m, d)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap();
                    worksheet
                        .write_datetime_with_format(r, col, &date, &date_format)
                        .unwrap();
                }
            }
        }
    }

    workbook.save(path).unwrap();
}

/// Rows for three hulls: 101 changed hands once, 102 has one owner, 103
/// sank. One row has no hull and must be ignored.
pub fn sample_rows() -> Vec<Row> {
    use Cell::*;
    vec![
        vec![
            ("hull", Num(101.0)),
            ("date", Date(1975, 7, 1)),
            ("status", Text("GOOD")),
            ("boat_name", Text("Kestrel")),
            ("sailnum", Num(2201.0)),
            ("rig", Text("sloop")),
            ("berth", Text("Annapolis MD")),
            ("owner_name", Text("Lou Mann")),
            ("address1", Text("1 Dock St")),
            ("phone", Text("555-0101")),
            ("email", Text("lou@example.org")),
        ],
        vec![
            ("hull", Num(102.0)),
            ("date", Date(1980, 3, 1)),
            ("status", Text("GOOD")),
            ("boat_name", Text("Osprey")),
            ("berth", Text("Mystic CT")),
            ("sale_link", Text("javascript:alert(1)")),
            ("owner_name", Text("Ann Baker")),
            ("email", Text("ann@example.org")),
        ],
        vec![
            ("boat_name", Text("Ghost")),
            ("status", Text("GOOD")),
            ("owner_name", Text("Nobody")),
        ],
        vec![
            ("hull", Num(101.0)),
            ("date", Date(2015, 5, 17)),
            ("status", Text("GOOD")),
            ("berth", Text("Oxford MD")),
            ("latest_info", Text("New **sails** in 2016.")),
            ("sale_link", Text("https://boats.example.org/kestrel")),
            ("owner_name", Text("Max Nolan")),
            ("address1", Text("22 Harbor Rd")),
            ("address2", Text("Oxford MD 21654")),
            ("phone", Text("555-0199")),
            ("email", Text("max.nolan@example.org")),
        ],
        vec![
            ("hull", Num(103.0)),
            ("status", Text("SUNK")),
            ("boat_name", Text("Blue Moon")),
            ("epitaph", Text("Lost in Hurricane Bob, 1991.")),
            ("owner_name", Text("Gil Hart")),
        ],
    ]
}

/// A temp dir holding `roster.xlsx` built from [`sample_rows`].
pub fn sample_roster() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.xlsx");
    write_workbook(&path, BOATS_SHEET, &sample_rows());
    (dir, path)
}
