//! Output formatting for quotes and sync feedback.
//!
//! Supports multiple output formats: plain text, JSON, and table view.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{Notification, NotificationKind, Quote, SyncState};

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON format for programmatic use.
    Json,
    /// Compact table listing.
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => Err(format!("Unknown format: {s}. Use: text, json, table")),
        }
    }
}

/// Formats a single quote for display.
pub fn format_quote(quote: &Quote) -> String {
    format!(
        "{}\n  {} {}",
        format!("\"{}\"", quote.text).bold(),
        "Category:".italic(),
        quote.category.cyan()
    )
}

/// Formats quotes in the requested format.
///
/// # Errors
/// Returns error if JSON serialization fails.
pub fn format_quotes(quotes: &[&Quote], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(format_quotes_text(quotes)),
        OutputFormat::Json => serde_json::to_string_pretty(quotes),
        OutputFormat::Table => Ok(format_quotes_table(quotes)),
    }
}

fn format_quotes_text(quotes: &[&Quote]) -> String {
    if quotes.is_empty() {
        return "No quotes available.".to_string();
    }

    quotes
        .iter()
        .map(|q| format_quote(q))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Formats a table listing of quotes.
pub fn format_quotes_table(quotes: &[&Quote]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Category", "Quote"]);

    for (i, quote) in quotes.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            quote.category.clone(),
            truncate(&quote.text, 70),
        ]);
    }

    table.to_string()
}

/// Formats the category list, marking the selected one.
pub fn format_categories(categories: &[String], selected: &str) -> String {
    let mut out = String::new();
    for category in categories {
        if category == selected {
            out.push_str(&format!("{} {}\n", "*".green().bold(), category.green()));
        } else {
            out.push_str(&format!("  {category}\n"));
        }
    }

    if !categories.iter().any(|c| c == selected) {
        out.push_str(&format!(
            "{} selected category '{}' matches no quotes\n",
            "!".yellow().bold(),
            selected
        ));
    }

    out.trim_end().to_string()
}

/// Formats a sync notification.
pub fn format_notification(notification: &Notification) -> String {
    match notification.kind {
        NotificationKind::Synced => {
            format!("{} {}", "✓".green().bold(), notification.message)
        }
        NotificationKind::Offline => {
            format!("{} {}", "⚠".yellow().bold(), notification.message.yellow())
        }
    }
}

/// Summary figures for the `status` command.
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub quote_count: usize,
    pub visible_count: usize,
    pub category_count: usize,
    pub filter: String,
    pub storage_path: String,
    pub storage_bytes: u64,
    pub slots: Vec<String>,
    pub endpoint: String,
}

/// Formats store statistics for display.
///
/// `sync` is only known inside a long-running session.
pub fn format_status(status: &StoreStatus, sync: Option<&SyncState>) -> String {
    let mut out = format!(
        "{}\n  Quotes: {}\n  Visible with filter: {}\n  Categories: {}\n  Filter: {}\n  Storage: {} ({})\n  Slots: {}\n  Endpoint: {}",
        "📊 Status".bold(),
        status.quote_count.to_string().cyan(),
        status.visible_count.to_string().cyan(),
        status.category_count.to_string().cyan(),
        status.filter.green(),
        status.storage_path,
        format_bytes(status.storage_bytes),
        status.slots.join(", "),
        status.endpoint,
    );

    if let Some(sync) = sync {
        let last_sync = sync.last_sync.map_or_else(
            || "never".to_string(),
            |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        out.push_str(&format!(
            "\n  Sync: {} (last: {}, attempts: {})",
            sync.phase, last_sync, sync.attempts
        ));

        if let Some(err) = &sync.last_error {
            out.push_str(&format!("\n  Last error: {}", err.red()));
        }
    }

    out
}

/// Format bytes as human readable string.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Truncates a string to max characters with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(text: &str, category: &str) -> Quote {
        Quote {
            text: text.into(),
            category: category.into(),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world!", 8), "hello...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!(matches!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!(matches!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table)));
        assert!("markdown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_empty_text_listing() {
        let out = format_quotes(&[], OutputFormat::Text).unwrap();
        assert_eq!(out, "No quotes available.");
    }

    #[test]
    fn test_json_listing() {
        let q = quote("a", "b");
        let out = format_quotes(&[&q], OutputFormat::Json).unwrap();
        assert!(out.contains("\"text\": \"a\""));
    }

    #[test]
    fn test_table_contains_quotes() {
        let q = quote("Be kind", "Life");
        let out = format_quotes_table(&[&q]);
        assert!(out.contains("Be kind"));
        assert!(out.contains("Life"));
    }

    #[test]
    fn test_status_includes_sync_only_when_known() {
        colored::control::set_override(false);
        let status = StoreStatus {
            quote_count: 3,
            visible_count: 1,
            category_count: 3,
            filter: "Design".into(),
            storage_path: "/tmp/quotes.db".into(),
            storage_bytes: 2048,
            slots: vec!["quotes".into(), "selectedCategory".into()],
            endpoint: "http://localhost/posts".into(),
        };

        let without = format_status(&status, None);
        assert!(without.contains("2.00 KB"));
        assert!(without.contains("quotes, selectedCategory"));
        assert!(!without.contains("Sync:"));

        let state = SyncState::default().with_error("offline");
        let with = format_status(&status, Some(&state));
        assert!(with.contains("Sync: idle (last: never, attempts: 1)"));
        assert!(with.contains("Last error: offline"));
    }

    #[test]
    fn test_categories_flags_stale_filter() {
        colored::control::set_override(false);
        let categories = vec!["all".to_string(), "Design".to_string()];
        assert!(!format_categories(&categories, "Design").contains("matches no quotes"));
        assert!(format_categories(&categories, "Gone").contains("matches no quotes"));
    }
}
