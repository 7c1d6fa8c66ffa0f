use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::{Outcome, RunReport, TestReport};

/// Render the run as JUnit XML, one `<testsuite>` per suite.
pub fn render_junit(report: &RunReport) -> String {
    let mut suites: BTreeMap<&str, Vec<&TestReport>> = BTreeMap::new();
    for test in &report.tests {
        suites.entry(test.suite.as_str()).or_default().push(test);
    }

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<testsuites name=\"{}\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" time=\"{:.3}\">",
        escape(&report.title),
        report.total(),
        report.failed,
        report.skipped,
        report.duration.as_secs_f64()
    );

    for (suite, tests) in suites {
        let failures = tests.iter().filter(|t| t.outcome == Outcome::Failed).count();
        let skipped = tests.iter().filter(|t| t.outcome == Outcome::Skipped).count();
        let time: f64 = tests.iter().map(|t| t.duration.as_secs_f64()).sum();
        let _ = writeln!(
            out,
            "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{failures}\" skipped=\"{skipped}\" time=\"{time:.3}\">",
            escape(suite),
            tests.len()
        );

        for test in tests {
            let _ = write!(
                out,
                "    <testcase classname=\"{}\" name=\"{}\" time=\"{:.3}\"",
                escape(classname(&test.nodeid)),
                escape(&test.name),
                test.duration.as_secs_f64()
            );
            match test.outcome {
                Outcome::Passed => out.push_str("/>\n"),
                Outcome::Failed => {
                    out.push_str(">\n");
                    let summary = test.failures.first().map(String::as_str).unwrap_or("failed");
                    let _ = writeln!(
                        out,
                        "      <failure message=\"{}\">{}</failure>",
                        escape(summary),
                        escape(&test.failures.join("\n"))
                    );
                    out.push_str("    </testcase>\n");
                }
                Outcome::Skipped => {
                    out.push_str(">\n");
                    let _ = writeln!(
                        out,
                        "      <skipped message=\"{}\"/>",
                        escape(test.skip_reason.as_deref().unwrap_or(""))
                    );
                    out.push_str("    </testcase>\n");
                }
            }
        }

        out.push_str("  </testsuite>\n");
    }

    out.push_str("</testsuites>\n");
    out
}

fn classname(nodeid: &str) -> &str {
    nodeid.rsplit_once("::").map(|(head, _)| head).unwrap_or(nodeid)
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
