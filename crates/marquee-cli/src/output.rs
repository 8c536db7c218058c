use clap::ValueEnum;
use comfy_table::{presets, Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

/// Human or JSON rendering of command results
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    fn message(&self, kind: &str, marker: String, msg: &str) {
        if self.is_human() {
            if marker.is_empty() {
                println!("{}", msg);
            } else {
                println!("{} {}", marker, msg);
            }
        } else {
            self.print_json(&json!({ "type": kind, "message": msg }));
        }
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("success", "✓".green().to_string(), msg.as_ref());
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("info", String::new(), msg.as_ref());
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("warning", "⚠".yellow().to_string(), msg.as_ref());
        }
    }

    /// Shown even in quiet mode
    pub fn error(&self, msg: impl AsRef<str>) {
        if self.is_human() {
            eprintln!("{} {}", "✗".red(), msg.as_ref());
        } else {
            self.print_json(&json!({ "type": "error", "message": msg.as_ref() }));
        }
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && !self.is_human() {
            return;
        }
        self.print_json(data);
    }

    /// Tables in human mode, the raw value otherwise
    pub fn table(&self, header: &[&str], rows: Vec<Vec<String>>, data: &serde_json::Value) {
        if !self.is_human() {
            self.json(data);
            return;
        }
        if self.quiet {
            return;
        }
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        table.set_header(
            header
                .iter()
                .map(|h| Cell::new(h).add_attribute(comfy_table::Attribute::Bold)),
        );
        for row in rows {
            table.add_row(row);
        }
        println!("{}", table);
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            _ => println!("{}", serde_json::to_string(data).unwrap_or_default()),
        }
    }
}
