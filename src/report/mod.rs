//! Rendering and export of the analytics views.

pub mod generator;
pub mod spreadsheet;

pub use generator::{
    generate_crime_data, generate_dashboard, generate_json, generate_personnel_list,
    generate_report_detail, generate_report_list, generate_unit_list, generate_vehicle_list,
    write_output,
};
