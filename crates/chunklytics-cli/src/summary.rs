//! Terminal summary for --summary

use chunklytics_core::ParseResult;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

pub fn print(result: &ParseResult) {
    println!("\n{}", "Results:".green().bold());
    println!("  {} {}", "Processed:".dimmed(), result.total_processed.to_string().cyan());
    println!("  {} {}", "Ok:".dimmed(), result.total_ok.to_string().green());
    println!("  {} {}", "Failed:".dimmed(), result.total_failed.to_string().red());

    if !result.top_client_ips.is_empty() {
        println!("\n{}", "Top clients:".cyan().bold());
        println!("{}", clients_table(result));
    }

    if !result.top_path_avg_seconds.is_empty() {
        println!("\n{}", "Slowest paths:".cyan().bold());
        println!("{}", paths_table(result));
    }
}

pub fn clients_table(result: &ParseResult) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Client", "Requests"]);

    for (rank, (addr, count)) in result.top_client_ips.iter().enumerate() {
        table.add_row(vec![(rank + 1).to_string(), addr.to_string(), count.to_string()]);
    }
    table
}

pub fn paths_table(result: &ParseResult) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Path", "Avg seconds"]);

    for (rank, (path, seconds)) in result.top_path_avg_seconds.iter().enumerate() {
        table.add_row(vec![(rank + 1).to_string(), path.to_string(), format!("{:.2}", seconds)]);
    }
    table
}
