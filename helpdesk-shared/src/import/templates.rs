//! Downloadable import templates

use crate::spreadsheet::{write_workbook, Cell, Sheet, SpreadsheetError};

pub const COMPUTER_HEADERS: [&str; 10] = [
    "asset_tag",
    "name",
    "type",
    "manufacturer",
    "model",
    "status",
    "serial_number",
    "location",
    "department",
    "notes",
];

pub const USER_HEADERS: [&str; 4] = ["email", "full_name", "department", "role"];

pub const COMPUTER_TEMPLATE_FILENAME: &str = "computer_import_template.xlsx";
pub const USER_TEMPLATE_FILENAME: &str = "user_import_template.xlsx";

fn row(values: &[&str]) -> Vec<Cell> {
    values.iter().map(|v| Cell::from(*v)).collect()
}

pub fn computer_template() -> Result<Vec<u8>, SpreadsheetError> {
    let mut sheet = Sheet::new("Computers", &COMPUTER_HEADERS)
        .with_widths(&[15.0, 20.0, 12.0, 15.0, 15.0, 12.0, 15.0, 15.0, 15.0, 30.0]);

    sheet.push_row(row(&[
        "COMP001",
        "Dev Laptop 1",
        "laptop",
        "Dell",
        "XPS 15",
        "active",
        "SN123456",
        "Main Office",
        "IT",
        "Development machine",
    ]));
    sheet.push_row(row(&[
        "COMP002",
        "Reception PC",
        "desktop",
        "HP",
        "ProDesk 600",
        "active",
        "SN789012",
        "Reception",
        "Admin",
        "Front desk computer",
    ]));

    write_workbook(&[sheet])
}

pub fn user_template() -> Result<Vec<u8>, SpreadsheetError> {
    let mut sheet = Sheet::new("Users", &USER_HEADERS).with_widths(&[20.0, 20.0, 15.0, 10.0]);

    sheet.push_row(row(&["john@example.com", "John Doe", "IT", "user"]));
    sheet.push_row(row(&["jane@example.com", "Jane Smith", "HR", "technician"]));

    write_workbook(&[sheet])
}
