//! Markdown and JSON rendering.
//!
//! Every view of the case register renders to a Markdown string for the
//! terminal, or to pretty JSON through [`generate_json`].

use crate::analysis::calendar::format_date;
use crate::analysis::dashboard::{CrimeData, Dashboard, TabView};
use crate::analysis::ranking::{bar_width, max_count, Ranked};
use crate::analysis::summary::{column_headers, CategoryTally};
use crate::analysis::trend::{MonthCount, QuarterTrend, YearlyTrend};
use crate::analysis::Stats;
use crate::listing::vehicles::VehicleRow;
use crate::listing::{unit_name, Page};
use crate::models::{Personnel, Report, Unit};
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub const NO_DATA: &str = "Data tidak tersedia.";

const BAR_CELLS: f64 = 20.0;

/// Generate the dashboard: both report-type tabs.
pub fn generate_dashboard(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", dashboard.title));
    output.push_str(&generate_tab_section("Laporan Polisi", &dashboard.police_reports));
    output.push_str(&generate_tab_section(
        "Pengaduan Masyarakat",
        &dashboard.public_complaints,
    ));

    output
}

fn generate_tab_section(title: &str, tab: &Stats<TabView>) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    let Some(tab) = tab.data() else {
        section.push_str(&format!("{}\n\n", NO_DATA));
        return section;
    };

    section.push_str("| Total Laporan | Dalam Proses | Selesai | Kendaraan Hilang |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        tab.stats.total, tab.stats.in_progress, tab.stats.completed, tab.stats.stolen_vehicles
    ));

    section.push_str(&generate_yearly_chart(&tab.yearly));
    section.push_str(&generate_ranking("Jenis Kasus Teratas", &tab.top_case_types));
    if let Some(units) = &tab.top_units {
        section.push_str(&generate_ranking("Kinerja Unit Teratas", units));
    }
    if let Some(personnel) = &tab.top_personnel {
        section.push_str(&generate_ranking("Personil dengan P21 Terbanyak", personnel));
    }

    section
}

fn bar(count: usize, max: usize) -> String {
    let cells = (bar_width(count, max) / 100.0 * BAR_CELLS).round() as usize;
    "█".repeat(cells)
}

fn generate_yearly_chart(yearly: &YearlyTrend) -> String {
    let mut section = String::new();

    section.push_str(&format!("### Tren Laporan Tahunan {}\n\n", yearly.year));
    if !yearly.has_data() {
        section.push_str(&format!("{}\n\n", NO_DATA));
        return section;
    }

    let max = yearly.max_total();
    section.push_str("| Bulan | Total | Selesai | |\n");
    section.push_str("|:---|:---:|:---:|:---|\n");
    for bucket in &yearly.months {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            bucket.label,
            bucket.count.total,
            bucket.count.completed,
            bar(bucket.count.total, max)
        ));
    }
    section.push('\n');

    section
}

/// Render a top-N ranking as a table with proportional bars.
pub fn generate_ranking(title: &str, entries: &[Ranked]) -> String {
    let mut section = String::new();

    section.push_str(&format!("### {}\n\n", title));
    if entries.is_empty() {
        section.push_str(&format!("{}\n\n", NO_DATA));
        return section;
    }

    let max = max_count(entries);
    section.push_str("| # | Nama | Jumlah | |\n");
    section.push_str("|:---:|:---|:---:|:---|\n");
    for (i, entry) in entries.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            i + 1,
            entry.name,
            entry.count,
            bar(entry.count, max)
        ));
    }
    section.push('\n');

    section
}

/// Generate the crime-data screen: category summary and three-month trend.
pub fn generate_crime_data(data: &CrimeData) -> String {
    let mut output = String::new();

    output.push_str("# Rekapitulasi Data Gangguan Kamtibmas\n\n");
    output.push_str(&format!("{}\n\n", data.period_label()));

    match data.summary.data() {
        None => output.push_str(&format!("{}\n\n", NO_DATA)),
        Some(summary) => {
            let headers = column_headers();
            output.push_str(&format!("| Kasus | {} |\n", headers.join(" | ")));
            output.push_str(&format!("|:---|{}\n", ":---:|".repeat(headers.len())));
            for (case_type, tally) in &summary.rows {
                output.push_str(&tally_line(case_type, tally, false));
            }
            output.push_str(&tally_line("Total", &summary.totals, true));
            output.push('\n');
        }
    }

    output.push_str(&generate_quarter_trend(&data.trend));
    output
}

fn tally_line(label: &str, tally: &CategoryTally, strong: bool) -> String {
    let cells: Vec<String> = tally
        .columns()
        .iter()
        .map(|n| if strong { format!("**{}**", n) } else { n.to_string() })
        .collect();
    let label = if strong {
        format!("**{}**", label)
    } else {
        label.to_string()
    };
    format!("| {} | {} |\n", label, cells.join(" | "))
}

fn month_cells(months: &[MonthCount]) -> String {
    months
        .iter()
        .map(|m| format!("{} | {}", m.total, m.completed))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn generate_quarter_trend(trend: &QuarterTrend) -> String {
    let mut section = String::new();

    section.push_str("## Tren Kasus 3 Bulan Terakhir\n\n");
    if trend.is_empty() {
        section.push_str("Tidak ada data kasus dalam 3 bulan terakhir.\n\n");
        return section;
    }

    let headers: Vec<String> = trend
        .labels()
        .iter()
        .map(|label| format!("{label} Total | {label} Selesai"))
        .collect();
    section.push_str(&format!("| Kasus | {} |\n", headers.join(" | ")));
    section.push_str(&format!("|:---|{}\n", ":---:|".repeat(trend.months.len() * 2)));
    for row in &trend.rows {
        section.push_str(&format!(
            "| {} | {} |\n",
            row.case_type,
            month_cells(&row.months)
        ));
    }
    section.push_str(&format!("| **Total** | {} |\n\n", month_cells(&trend.totals())));

    section
}

/// Generate one page of the report list.
pub fn generate_report_list(page: &Page<&Report>, units: &[Unit]) -> String {
    let mut output = String::new();

    output.push_str("# Data Laporan\n\n");
    if page.items.is_empty() {
        output.push_str("Tidak ada laporan yang cocok.\n\n");
    } else {
        output.push_str("| No. Laporan | SPKT | Jenis Kasus | Pelapor | Tanggal | Status | Keterangan | Unit | ID |\n");
        output.push_str("|:---|:---|:---|:---|:---:|:---:|:---:|:---|:---|\n");
        for report in &page.items {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | `{}` |\n",
                report.short_number(),
                report.spkt,
                report.case_type,
                report.reporter_name,
                format_date(report.report_date.date_naive()),
                report.status,
                report
                    .status_detail
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                unit_name(units, report.assigned_unit_id()),
                report.id,
            ));
        }
        output.push('\n');
    }
    output.push_str(&page_footer(page));

    output
}

fn page_footer<T>(page: &Page<T>) -> String {
    format!(
        "_{} (halaman {} dari {})_\n",
        page.range_label(),
        page.page,
        page.total_pages.max(1)
    )
}

/// Rupiah with dot thousands separators, e.g. `Rp 15.000.000`.
pub fn format_rupiah(amount: f64) -> String {
    let whole = amount.round().abs() as u64;
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}Rp {}", sign, grouped)
}

/// Generate the full record of one report.
pub fn generate_report_detail(report: &Report, units: &[Unit], personnel: &[Personnel]) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.full_number()));
    output.push_str(&format!("- **Jenis Laporan:** {}\n", report.report_type));
    output.push_str(&format!("- **SPKT:** {}\n", report.spkt));
    output.push_str(&format!(
        "- **Tanggal Laporan:** {}\n",
        format_date(report.report_date.date_naive())
    ));
    output.push_str(&format!("- **Pelapor:** {}\n", report.reporter_name));
    output.push_str(&format!("- **Jenis Kasus:** {}\n", report.case_type));
    output.push_str(&format!(
        "- **Waktu Kejadian:** {} {}\n",
        format_date(report.incident_date.date_naive()),
        report.incident_time
    ));
    output.push_str(&format!(
        "- **Lokasi:** {} ({}), Kel. {}, Kec. {}\n",
        report.incident_location, report.location_type, report.sub_district, report.district
    ));
    if let Some(loss) = report.loss_amount {
        output.push_str(&format!("- **Kerugian:** {}\n", format_rupiah(loss)));
    }
    output.push_str(&format!(
        "- **Status:** {}{}\n",
        report.status,
        report
            .status_detail
            .map(|d| format!(" / {}", d))
            .unwrap_or_default()
    ));
    output.push_str(&format!(
        "- **Unit:** {}\n",
        unit_name(units, report.assigned_unit_id())
    ));

    let names: Vec<String> = report
        .assigned_personnel_ids()
        .iter()
        .filter_map(|id| personnel.iter().find(|p| &p.id == id))
        .map(Personnel::display_name)
        .collect();
    if !names.is_empty() {
        output.push_str(&format!("- **Personil:** {}\n", names.join(", ")));
    }
    output.push('\n');

    if !report.stolen_vehicles.is_empty() {
        output.push_str("## Kendaraan Hilang\n\n");
        output.push_str("| Jenis | No. Rangka | No. Mesin |\n");
        output.push_str("|:---|:---|:---|\n");
        for v in &report.stolen_vehicles {
            output.push_str(&format!(
                "| {} | {} | {} |\n",
                v.vehicle_type, v.frame_number, v.engine_number
            ));
        }
        output.push('\n');
    }

    output.push_str("## Riwayat Status\n\n");
    if report.status_history.is_empty() {
        output.push_str("Belum ada riwayat.\n");
    } else {
        for entry in &report.status_history {
            output.push_str(&format!(
                "- {} {} **{} / {}** oleh {}",
                format_date(entry.updated_at.date_naive()),
                entry.updated_at.format("%H:%M"),
                entry.status,
                entry.status_detail,
                entry.updated_by
            ));
            if !entry.description.is_empty() {
                output.push_str(&format!(": {}", entry.description));
            }
            output.push('\n');
        }
    }

    output
}

/// Generate one page of the stolen-vehicle list, with the type ranking.
pub fn generate_vehicle_list(
    page: &Page<VehicleRow<'_>>,
    units: &[Unit],
    top_types: &[Ranked],
) -> String {
    let mut output = String::new();

    output.push_str("# Data Kendaraan Hilang\n\n");
    output.push_str(&generate_ranking("Jenis Kendaraan Terbanyak", top_types));

    if page.items.is_empty() {
        output.push_str("Tidak ada kendaraan yang cocok.\n\n");
    } else {
        output.push_str("| No. Laporan | Tanggal | Jenis | No. Rangka | No. Mesin | Unit |\n");
        output.push_str("|:---|:---:|:---|:---|:---|:---|\n");
        for row in &page.items {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                row.report.full_number(),
                format_date(row.report.report_date.date_naive()),
                row.vehicle.vehicle_type,
                row.vehicle.frame_number,
                row.vehicle.engine_number,
                unit_name(units, row.report.assigned_unit_id()),
            ));
        }
        output.push('\n');
    }
    output.push_str(&page_footer(page));

    output
}

/// Generate one page of the personnel roster.
pub fn generate_personnel_list(page: &Page<&Personnel>, units: &[Unit]) -> String {
    let mut output = String::new();

    output.push_str("# Data Personil\n\n");
    if page.items.is_empty() {
        output.push_str("Tidak ada personil yang cocok.\n\n");
    } else {
        output.push_str("| Nama | Pangkat | Unit | Akun | ID |\n");
        output.push_str("|:---|:---|:---|:---|:---|\n");
        for p in &page.items {
            let account = match (&p.user_email, &p.user_id) {
                (Some(email), _) => email.clone(),
                (None, Some(_)) => "Ada".to_string(),
                (None, None) => "-".to_string(),
            };
            output.push_str(&format!(
                "| {} | {} | {} | {} | `{}` |\n",
                p.name,
                p.rank,
                unit_name(units, Some(&p.unit_id)),
                account,
                p.id
            ));
        }
        output.push('\n');
    }
    output.push_str(&page_footer(page));

    output
}

/// Generate the unit list with member counts.
pub fn generate_unit_list(units: &[Unit], personnel: &[Personnel]) -> String {
    let mut output = String::new();

    output.push_str("# Data Unit\n\n");
    if units.is_empty() {
        output.push_str("Belum ada unit.\n");
        return output;
    }

    output.push_str("| Nama Unit | Jumlah Personil | ID |\n");
    output.push_str("|:---|:---:|:---|\n");
    for unit in units {
        let members = personnel.iter().filter(|p| p.unit_id == unit.id).count();
        output.push_str(&format!("| {} | {} | `{}` |\n", unit.name, members, unit.id));
    }

    output
}

/// Generate pretty JSON for any view.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
