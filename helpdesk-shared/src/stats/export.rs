//! Statistics workbook export

use crate::spreadsheet::{write_workbook, Cell, Sheet, SpreadsheetError};

use super::StatisticsReport;

pub const EXPORT_FILENAME: &str = "help-desk-statistics.xlsx";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to export statistics")]
    Write(#[from] SpreadsheetError),

    #[error("Failed to export statistics")]
    Serialize(#[from] serde_json::Error),
}

fn hours(value: Option<f64>) -> Cell {
    value.map(|h| (h * 100.0).round() / 100.0).into()
}

/// Builds the five-sheet workbook for a report
pub fn export_workbook(report: &StatisticsReport) -> Result<Vec<u8>, ExportError> {
    let mut tickets = Sheet::new("Ticket Statistics", &["Status", "Priority", "Type", "Count"])
        .with_widths(&[14.0, 12.0, 12.0, 10.0]);
    for stat in &report.ticket_stats {
        tickets.push_row(vec![
            stat.status.to_string().into(),
            stat.priority.to_string().into(),
            stat.ticket_type.to_string().into(),
            stat.count.into(),
        ]);
    }

    let mut response = Sheet::new(
        "Response Times",
        &[
            "Average First Response (hours)",
            "Average Resolution Time (hours)",
            "Tickets Resolved",
        ],
    )
    .with_widths(&[30.0, 30.0, 16.0]);
    let times = &report.response_times;
    response.push_row(vec![
        hours(times.avg_first_response_hours),
        hours(times.avg_resolution_hours),
        times.tickets_resolved.into(),
    ]);

    let mut technicians = Sheet::new(
        "Technician Performance",
        &[
            "Name",
            "Tickets Assigned",
            "Tickets Resolved",
            "Average Resolution Time (hours)",
        ],
    )
    .with_widths(&[25.0, 16.0, 16.0, 30.0]);
    for tech in &report.technician_stats {
        technicians.push_row(vec![
            tech.technician_name.clone().into(),
            tech.tickets_assigned.into(),
            tech.tickets_resolved.into(),
            hours(tech.avg_resolution_hours),
        ]);
    }

    let mut computers = Sheet::new(
        "Computer Inventory",
        &[
            "Total Computers",
            "Active Computers",
            "In Maintenance",
            "Retired Computers",
            "Unassigned Computers",
        ],
    )
    .with_widths(&[16.0, 16.0, 16.0, 18.0, 20.0]);
    let inventory = &report.computer_stats;
    computers.push_row(vec![
        inventory.total_computers.into(),
        inventory.active_computers.into(),
        inventory.in_maintenance.into(),
        inventory.retired_computers.into(),
        inventory.unassigned_computers.into(),
    ]);

    let mut backlog = Sheet::new(
        "Backlog Analysis",
        &["Age Range", "Ticket Count", "Priority Breakdown", "Type Breakdown"],
    )
    .with_widths(&[14.0, 14.0, 40.0, 30.0]);
    for bucket in &report.backlog_stats {
        backlog.push_row(vec![
            bucket.age_range.clone().into(),
            bucket.ticket_count.into(),
            serde_json::to_string(&bucket.priority_breakdown)?.into(),
            serde_json::to_string(&bucket.type_breakdown)?.into(),
        ]);
    }

    Ok(write_workbook(&[
        tickets,
        response,
        technicians,
        computers,
        backlog,
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ticket::{TicketPriority, TicketStatus, TicketType};
    use crate::spreadsheet::read_rows;
    use crate::stats::backlog::{bucket_backlog, ActiveTicket};
    use crate::stats::{ComputerStats, ResponseTimes, TicketStat, TimeRange};
    use calamine::{open_workbook_from_rs, Reader, Xlsx};
    use chrono::Utc;
    use std::io::Cursor;

    fn report() -> StatisticsReport {
        let now = Utc::now();
        StatisticsReport {
            time_range: TimeRange::Last30Days,
            backlog_cutoff_days: 7,
            generated_at: now,
            ticket_stats: vec![TicketStat {
                status: TicketStatus::InProgress,
                priority: TicketPriority::Critical,
                ticket_type: TicketType::Incident,
                count: 4,
            }],
            response_times: ResponseTimes {
                avg_first_response_hours: Some(1.23456),
                avg_resolution_hours: None,
                tickets_resolved: 0,
            },
            technician_stats: Vec::new(),
            computer_stats: ComputerStats {
                total_computers: 3,
                ..ComputerStats::default()
            },
            backlog_stats: bucket_backlog(
                &[ActiveTicket {
                    created_at: now,
                    priority: TicketPriority::High,
                    ticket_type: TicketType::Request,
                }],
                7,
                now,
            ),
        }
    }

    #[test]
    fn test_workbook_has_the_five_sheets_in_order() {
        let bytes = export_workbook(&report()).unwrap();
        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();

        assert_eq!(
            workbook.sheet_names(),
            vec![
                "Ticket Statistics",
                "Response Times",
                "Technician Performance",
                "Computer Inventory",
                "Backlog Analysis",
            ]
        );
    }

    #[test]
    fn test_first_sheet_rows() {
        let bytes = export_workbook(&report()).unwrap();
        let rows = read_rows(&bytes).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("status"), Some("in_progress"));
        assert_eq!(rows[0].get("priority"), Some("critical"));
        assert_eq!(rows[0].get("count"), Some("4"));
    }

    #[test]
    fn test_hours_are_rounded() {
        assert_eq!(hours(Some(1.23456)), Cell::Number(1.23));
        assert_eq!(hours(None), Cell::Empty);
    }
}
