use serde::Serialize;

use super::types::{ResultRecord, Unit};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub label: String,
    pub value: String,
}

impl Line {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Display-ready view of a result. All rounding happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub headline: Line,
    pub breakdown: Vec<Line>,
    pub metrics: Vec<Line>,
    pub classifications: Vec<Line>,
    pub notes: Vec<String>,
}

impl Presentation {
    pub fn from_result(result: &ResultRecord) -> Self {
        Self {
            headline: Line::new(&result.total_label, format_value(result.total, result.unit)),
            breakdown: result
                .components
                .iter()
                .map(|c| Line::new(&c.label, format_value(c.value, c.unit)))
                .collect(),
            metrics: result
                .metrics
                .iter()
                .map(|m| Line::new(&m.label, format_value(m.value, m.unit)))
                .collect(),
            classifications: result
                .classifications
                .iter()
                .map(|c| Line::new(humanize(c.table), c.label))
                .collect(),
            notes: result.notes.clone(),
        }
    }

    /// Plain text rendering used by the CLI.
    pub fn to_text(&self) -> String {
        let mut out = format!("{}: {}\n", self.headline.label, self.headline.value);
        let sections = [
            ("Breakdown", &self.breakdown),
            ("Details", &self.metrics),
            ("Ratings", &self.classifications),
        ];
        for (title, lines) in sections {
            if lines.is_empty() {
                continue;
            }
            out.push_str(&format!("\n{title}\n"));
            let width = lines.iter().map(|l| l.label.len()).max().unwrap_or(0);
            for line in lines {
                out.push_str(&format!("  {:<width$}  {}\n", line.label, line.value));
            }
        }
        if !self.notes.is_empty() {
            out.push_str("\nNotes\n");
            for note in &self.notes {
                out.push_str(&format!("  - {note}\n"));
            }
        }
        out
    }
}

pub fn format_value(value: f64, unit: Unit) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    match unit {
        Unit::Currency => {
            let cents = (value.abs() * 100.0).round() as u64;
            let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
            format!("{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
        }
        Unit::Percent => format!("{:.1}%", round_to(value, 1)),
        Unit::Days => {
            let days = value.round() as i64;
            if days.abs() == 1 {
                format!("{days} day")
            } else {
                format!("{days} days")
            }
        }
        Unit::Miles => {
            let miles = value.round();
            let sign = if miles < 0.0 { "-" } else { "" };
            format!("{sign}{} mi", group_thousands(miles.abs() as u64))
        }
        Unit::Months | Unit::Points => format!("{:.1}", round_to(value, 1)),
        Unit::Count => format!("{}", value.round() as i64),
    }
}

// Avoids "-0.0" for small negatives.
fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tiers::TierMatch;
    use crate::core::types::ResultBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn currency_groups_thousands_and_rounds_cents() {
        assert_eq!(format_value(1234.567, Unit::Currency), "$1,234.57");
        assert_eq!(format_value(-12.0, Unit::Currency), "-$12.00");
        assert_eq!(format_value(0.004, Unit::Currency), "$0.00");
        assert_eq!(format_value(-0.004, Unit::Currency), "$0.00");
        assert_eq!(format_value(1_000_000.0, Unit::Currency), "$1,000,000.00");
    }

    #[test]
    fn other_units_follow_display_rules() {
        assert_eq!(format_value(12.46, Unit::Percent), "12.5%");
        assert_eq!(format_value(-0.01, Unit::Percent), "0.0%");
        assert_eq!(format_value(45.2, Unit::Days), "45 days");
        assert_eq!(format_value(1.0, Unit::Days), "1 day");
        assert_eq!(format_value(-24.0, Unit::Days), "-24 days");
        assert_eq!(format_value(12_345.4, Unit::Miles), "12,345 mi");
        assert_eq!(format_value(20.04, Unit::Months), "20.0");
        assert_eq!(format_value(158.333, Unit::Points), "158.3");
        assert_eq!(format_value(3.0, Unit::Count), "3");
        assert_eq!(format_value(f64::NAN, Unit::Currency), "n/a");
    }

    #[test]
    fn presentation_mirrors_result_order() {
        let mut builder = ResultBuilder::new("Total boarding cost", Unit::Currency);
        builder
            .component("base", "Base cost", 315.0)
            .component("duration_discount", "Duration discount (weekly)", -31.5)
            .metric("cost_per_pet_night", "Effective cost per pet per night", 40.5, Unit::Currency)
            .classification(
                "duration_discount",
                7.0,
                TierMatch {
                    label: "weekly",
                    value: 0.1,
                    index: Some(2),
                },
            )
            .note("Stay qualifies for a discount.");
        let view = Presentation::from_result(&builder.build());

        assert_eq!(view.headline, Line::new("Total boarding cost", "$283.50"));
        assert_eq!(
            view.breakdown,
            vec![
                Line::new("Base cost", "$315.00"),
                Line::new("Duration discount (weekly)", "-$31.50"),
            ]
        );
        assert_eq!(view.metrics[0].value, "$40.50");
        assert_eq!(view.classifications, vec![Line::new("Duration discount", "weekly")]);
        let text = view.to_text();
        assert!(text.starts_with("Total boarding cost: $283.50\n"));
        assert!(text.contains("  - Stay qualifies for a discount."));
    }
}
