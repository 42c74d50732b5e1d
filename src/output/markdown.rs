//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of a run: the
//! statistics, then for an events run every event with the outcome of each of
//! its external fetches.

use crate::aggregator::{ExternalOutcome, ParentRecord};
use crate::output::stats::CrawlStatistics;
use crate::output::traits::OutputResult;
use std::fs;
use std::path::Path;

/// Generates a markdown summary and writes it to `output_path`
///
/// # Arguments
///
/// * `stats` - The run statistics
/// * `parents` - Event records emitted during the run (empty in site mode)
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    stats: &CrawlStatistics,
    parents: &[ParentRecord],
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(stats, parents);

    if let Some(dir) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(output_path, markdown)?;

    Ok(())
}

/// Formats the run summary as markdown
pub fn format_markdown_summary(stats: &CrawlStatistics, parents: &[ParentRecord]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Xpo-Harvest Run Summary: {}\n\n", stats.run_identifier));

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Mode**: {}\n", stats.mode.as_str()));
    md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
    if let Some(finished) = &stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n\n",
        stats.elapsed.as_secs_f64()
    ));

    md.push_str("## Statistics\n\n");
    md.push_str("| Counter | Value |\n");
    md.push_str("|---------|-------|\n");
    for (label, value) in [
        ("Pages fetched", stats.pages_fetched),
        ("Fetch failures", stats.fetch_failures),
        ("Pages emitted", stats.pages_emitted),
        ("Policy drops", stats.policy_drops),
        ("Duplicate drops", stats.duplicate_drops),
        ("Variant drops", stats.variant_drops),
        ("Events opened", stats.parents_opened),
        ("Events finalized", stats.parents_finalized),
        ("External successes", stats.child_successes),
        ("External errors", stats.child_errors),
        ("Unfinished events", stats.unfinished_parents),
        ("Records written", stats.records_written),
    ] {
        md.push_str(&format!("| {} | {} |\n", label, value));
    }
    md.push('\n');

    if parents.is_empty() {
        return md;
    }

    md.push_str(&format!("## Events ({})\n\n", parents.len()));
    for parent in parents {
        format_event(&mut md, parent);
    }

    md
}

fn format_event(md: &mut String, parent: &ParentRecord) {
    let fields = &parent.fields;
    let title = if fields.title.is_empty() {
        "(untitled)"
    } else {
        fields.title.as_str()
    };

    md.push_str(&format!("### {}\n\n", title));
    md.push_str(&format!("- **Page**: {}\n", fields.event_url));
    for (label, value) in [
        ("Date", &fields.date),
        ("Location", &fields.location),
        ("Image", &fields.image_url),
        ("Contact", &fields.contact_email_on_main_site),
    ] {
        if let Some(value) = value {
            md.push_str(&format!("- **{}**: {}\n", label, value));
        }
    }
    md.push('\n');

    if parent.external_data.is_empty() {
        md.push_str("No external links.\n\n");
        return;
    }

    md.push_str("| External URL | Status | Ticket URL | Contacts |\n");
    md.push_str("|--------------|--------|------------|----------|\n");
    for result in &parent.external_data {
        match &result.outcome {
            ExternalOutcome::Success(page) => {
                let contacts: Vec<&str> = page
                    .contact_info
                    .email
                    .iter()
                    .chain(&page.contact_info.phone)
                    .map(String::as_str)
                    .collect();
                md.push_str(&format!(
                    "| {} | success | {} | {} |\n",
                    result.url,
                    page.ticket_url.as_deref().unwrap_or("-"),
                    if contacts.is_empty() {
                        "-".to_string()
                    } else {
                        contacts.join(", ")
                    }
                ));
            }
            ExternalOutcome::Error { error_message } => {
                md.push_str(&format!(
                    "| {} | error: {} | - | - |\n",
                    result.url,
                    error_message.replace('|', "/")
                ));
            }
        }
    }
    md.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{ContactInfo, EventFields, ExternalPage, ExternalResult};
    use crate::config::CrawlMode;
    use tempfile::TempDir;

    fn create_test_parent() -> ParentRecord {
        let mut parent = ParentRecord::new(EventFields {
            title: "Flanders Flooring Days".to_string(),
            date: Some("12 - 14 maart".to_string()),
            event_url: "https://www.kortrijkxpo.com/kalender/event/pxk/12/ffd/".to_string(),
            ..EventFields::default()
        });
        parent.external_data.push(ExternalResult::success(
            "https://ffd.example.com/",
            ExternalPage {
                ticket_url: Some("https://ffd.example.com/tickets".to_string()),
                contact_info: ContactInfo {
                    email: vec!["info@ffd.example.com".to_string()],
                    ..ContactInfo::default()
                },
                ..ExternalPage::default()
            },
        ));
        parent
            .external_data
            .push(ExternalResult::error("https://down.example.com/", "HTTP status 500"));
        parent
    }

    #[test]
    fn test_format_site_summary() {
        let mut stats = CrawlStatistics::new("ffd", CrawlMode::Site);
        stats.pages_fetched = 12;
        let markdown = format_markdown_summary(&stats, &[]);

        assert!(markdown.contains("# Xpo-Harvest Run Summary: ffd"));
        assert!(markdown.contains("| Pages fetched | 12 |"));
        assert!(!markdown.contains("## Events"));
    }

    #[test]
    fn test_format_events_summary() {
        let stats = CrawlStatistics::new("xpo", CrawlMode::Events);
        let markdown = format_markdown_summary(&stats, &[create_test_parent()]);

        assert!(markdown.contains("## Events (1)"));
        assert!(markdown.contains("### Flanders Flooring Days"));
        assert!(markdown.contains("- **Date**: 12 - 14 maart"));
        assert!(markdown.contains(
            "| https://ffd.example.com/ | success | https://ffd.example.com/tickets | info@ffd.example.com |"
        ));
        assert!(markdown.contains("| https://down.example.com/ | error: HTTP status 500 | - | - |"));
    }

    #[test]
    fn test_generate_markdown_summary_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("summary.md");
        let stats = CrawlStatistics::new("xpo", CrawlMode::Events);

        generate_markdown_summary(&stats, &[create_test_parent()], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Flanders Flooring Days"));
    }
}
