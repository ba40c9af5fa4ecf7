//! Text output for reports.

use super::Report;
use crate::delta::AsciiFormatter;
use crate::source::{ResourceSet, Scope};
use std::io::{self, Write};

/// Writes the formatted diff of every modified entry in `both`, in key
/// order. Entries without changes are skipped. An entry whose diff cannot
/// be formatted is logged and skipped.
pub fn print_deltas(both: &ResourceSet, w: &mut dyn Write, coloring: bool) -> io::Result<()> {
    for (key, entry) in both.sorted() {
        let Some(diff) = entry.diff.as_ref().filter(|d| d.modified()) else {
            continue;
        };

        let text = match AsciiFormatter::new(&entry.object, coloring).format(diff) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(%key, error = %err, "failed to format diff");
                continue;
            }
        };

        writeln!(w, "{}", text)?;
    }
    Ok(())
}

/// Writes the grouped summary of a report: one section per partition,
/// listing resources grouped by scope and then by type.
pub fn print_report_summary(report: &Report, w: &mut dyn Write) -> io::Result<()> {
    print_section("Left Only", &report.left_only, w)?;
    print_section("Right Only", &report.right_only, w)?;
    print_section("Both", &report.both, w)?;
    Ok(())
}

fn print_section(title: &str, resources: &ResourceSet, w: &mut dyn Write) -> io::Result<()> {
    let header = format!("{} ({} items)", title, resources.len());
    writeln!(w, "{}", header)?;
    writeln!(w, "{}", "-".repeat(header.len()))?;

    let mut current: Option<(&Scope, &str)> = None;

    for (key, _) in resources.sorted() {
        let scope_changed = current.map_or(true, |(scope, _)| scope != &key.scope);
        if scope_changed {
            writeln!(w, "{}", key.scope)?;
        }
        if scope_changed || current.map_or(true, |(_, gvk)| gvk != key.gvk) {
            writeln!(w, "\t{}", key.gvk)?;
        }
        writeln!(w, "\t\t{}", key.name)?;

        current = Some((&key.scope, key.gvk.as_str()));
    }

    Ok(())
}
