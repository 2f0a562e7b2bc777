//! CLI display utilities for formatting output

use crate::store::api::{Area, Task};
use colored::Colorize;

const ID_WIDTH: usize = 36;
const AREA_WIDTH: usize = 10;
const TYPE_WIDTH: usize = 14;

fn colored_area(area: Area, use_color: bool) -> String {
    let padded = format!("{:<width$}", area.to_string(), width = AREA_WIDTH);
    if !use_color {
        return padded;
    }
    match area {
        Area::Done => padded.green().to_string(),
        Area::Failed => padded.red().to_string(),
        Area::Processing => padded.yellow().to_string(),
        _ => padded.cyan().to_string(),
    }
}

/// Header line for [`task_line`] rows
pub fn task_header(use_color: bool) -> String {
    let header = format!(
        "{:<id$} {:<area$} {:<kind$} {:<20} TARGET",
        "ID",
        "AREA",
        "TYPE",
        "CREATED",
        id = ID_WIDTH,
        area = AREA_WIDTH,
        kind = TYPE_WIDTH
    );
    if use_color {
        header.bold().to_string()
    } else {
        header
    }
}

/// One row of `snapscan list`
pub fn task_line(task: &Task, area: Area, use_color: bool) -> String {
    let mut line = format!(
        "{:<id$} {} {:<kind$} {:<20} {}",
        task.id,
        colored_area(area, use_color),
        task.target_type,
        task.created.format("%Y-%m-%d %H:%M:%S").to_string(),
        task.target,
        id = ID_WIDTH,
        kind = TYPE_WIDTH
    );
    if let Some(error) = &task.error {
        let reason = format!("  ({})", error);
        if use_color {
            line.push_str(&reason.dimmed().to_string());
        } else {
            line.push_str(&reason);
        }
    }
    line
}

/// Bulleted list of registry names
pub fn name_list(kind: &str, names: &[String]) -> String {
    if names.is_empty() {
        return format!("No {}s registered.", kind);
    }
    names
        .iter()
        .map(|name| format!("  {}", name))
        .collect::<Vec<_>>()
        .join("\n")
}
