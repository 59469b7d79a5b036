//! Plain-text rendering of schema reports.

use std::fmt;

use crate::schema::{FieldPolicy, SchemaReport, TypeConflict};
use crate::store::Scope;

/// A schema report ready for display: a field table followed by
/// inconsistency and type-conflict notes.
pub struct ReportView<'a> {
    pub scope: &'a Scope,
    pub report: &'a SchemaReport,
    pub policy: &'a FieldPolicy,
    pub conflicts: &'a [TypeConflict],
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "--- Schema: {} ({} items) ---", self.scope, report.total_items)?;
        if report.properties.is_empty() {
            return writeln!(f, "(no fields)");
        }

        let width = report
            .properties
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("field".len());
        writeln!(
            f,
            "{:<width$}  {:<8} {:>9} {:>6}  protected",
            "field", "type", "present", "nulls"
        )?;
        for name in report.ordered_fields(self.policy) {
            let Some(profile) = report.properties.get(name) else {
                continue;
            };
            writeln!(
                f,
                "{:<width$}  {:<8} {:>4}/{:<4} {:>6}  {}",
                name,
                profile.value_type,
                profile.count,
                report.total_items,
                profile.null_count,
                if self.policy.is_protected(name) { "yes" } else { "" }
            )?;
        }

        if report.is_consistent() {
            writeln!(f, "\nAll fields present on every item.")?;
        } else {
            writeln!(f, "\nInconsistent fields:")?;
            for issue in &report.inconsistencies {
                writeln!(
                    f,
                    "  {}: present in {} of {} ({}%)",
                    issue.property, issue.present_in, issue.total_items, issue.percentage
                )?;
            }
        }

        if !self.conflicts.is_empty() {
            writeln!(f, "\nType conflicts:")?;
            for conflict in self.conflicts {
                let types: Vec<&str> = conflict.observed.iter().map(|t| t.as_str()).collect();
                writeln!(f, "  {}: {}", conflict.property, types.join(", "))?;
            }
        }
        Ok(())
    }
}

pub fn render_report(
    scope: &Scope,
    report: &SchemaReport,
    policy: &FieldPolicy,
    conflicts: &[TypeConflict],
) -> String {
    ReportView {
        scope,
        report,
        policy,
        conflicts,
    }
    .to_string()
}

pub fn print_report(
    scope: &Scope,
    report: &SchemaReport,
    policy: &FieldPolicy,
    conflicts: &[TypeConflict],
) {
    print!("{}", render_report(scope, report, policy, conflicts));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Record, profile, type_conflicts};
    use serde_json::json;

    fn records() -> Vec<Record> {
        [
            json!({"name": "B1", "vm": 1.0, "zone": "north"}),
            json!({"name": "B2", "vm": "1.02"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
    }

    #[test]
    fn report_lists_fields_and_gaps() {
        let records = records();
        let policy = FieldPolicy::new().with_protected(["name"]);
        let report = profile(&records, &policy);
        let conflicts = type_conflicts(&records, &policy);
        let text = render_report(&Scope::Demand, &report, &policy, &conflicts);

        assert!(text.starts_with("--- Schema: demand (2 items) ---"));
        assert!(text.contains("zone: present in 1 of 2 (50%)"));
        assert!(text.contains("vm: number, string"));
        let name_line = text.lines().find(|l| l.starts_with("name"));
        assert!(name_line.is_some_and(|l| l.ends_with("yes")));
    }

    #[test]
    fn empty_report_says_so() {
        let text = render_report(
            &Scope::Generators { level: 0 },
            &SchemaReport::empty(),
            &FieldPolicy::new(),
            &[],
        );
        assert!(text.contains("(no fields)"));
    }

    #[test]
    fn consistent_report_has_no_gap_section() {
        let records = records()[..1].to_vec();
        let policy = FieldPolicy::new();
        let report = profile(&records, &policy);
        let view = ReportView {
            scope: &Scope::Demand,
            report: &report,
            policy: &policy,
            conflicts: &[],
        };
        let text = format!("{view}");
        assert!(text.ends_with("\nAll fields present on every item.\n"));
        assert!(!text.contains("Type conflicts"));
    }
}
