use crate::models::{DateRange, TimelineItem};
use chrono::NaiveDate;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

pub const TIMELINE_TITLE: &str = "Symptomly Timeline";

/// Markdown export of timeline items, one section per day, newest day first.
///
/// Items are expected newest first, as `build_timeline` returns them.
pub fn timeline_to_markdown(items: &[TimelineItem], range: Option<&DateRange>) -> String {
    let mut md = format!("# {}\n\n", TIMELINE_TITLE);
    if let Some(range) = range {
        md.push_str(&format!("_{}_\n\n", range));
    }

    if items.is_empty() {
        md.push_str("No entries for this period.\n");
        return md;
    }

    let mut current_day: Option<NaiveDate> = None;
    for item in items {
        let day = item.timestamp.date();
        if current_day != Some(day) {
            if current_day.is_some() {
                md.push('\n');
            }
            md.push_str(&format!("## {}\n\n", day.format("%A, %B %-d, %Y")));
            current_day = Some(day);
        }
        md.push_str(&format!(
            "- **{}** {}: {} — {}\n",
            item.timestamp.format("%H:%M"),
            item.kind,
            escape_inline(&item.name),
            escape_inline(&item.details)
        ));
    }

    md
}

/// Backslash-escape characters that would otherwise start inline markup.
fn escape_inline(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '_' | '`' | '[' | ']' | '<' | '>' | '#' | '\\') {
            escaped.push('\\');
        }
        // Keep each entry on its own bullet line
        escaped.push(if c == '\n' { ' ' } else { c });
    }
    escaped
}

pub fn to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Heading texts with their level (1 for `#`).
pub fn outline(markdown: &str) -> Vec<(u8, String)> {
    let mut headings = Vec::new();
    let mut current: Option<(u8, String)> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((heading_depth(level), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }

    headings
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;
    use chrono::NaiveDateTime;
    use uuid::Uuid;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn item(kind: ItemKind, name: &str, details: &str, timestamp: NaiveDateTime) -> TimelineItem {
        TimelineItem {
            id: Uuid::new_v4(),
            timestamp,
            kind,
            name: name.to_string(),
            details: details.to_string(),
        }
    }

    fn sample() -> Vec<TimelineItem> {
        vec![
            item(ItemKind::Symptom, "Cough", "Severity: Mild", at(3, 20, 15)),
            item(ItemKind::Remedy, "Bryonia", "Potency: 6C", at(2, 9, 0)),
            item(ItemKind::Symptom, "Headache", "Severity: Moderate", at(2, 8, 5)),
        ]
    }

    #[test]
    fn test_markdown_groups_by_day() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
        );
        let md = timeline_to_markdown(&sample(), Some(&range));

        assert!(md.starts_with("# Symptomly Timeline\n\n_Mar 1, 2024 - Mar 3, 2024_\n"));
        assert!(md.contains("## Sunday, March 3, 2024\n\n- **20:15** Symptom: Cough — Severity: Mild\n"));
        assert!(md.contains(
            "## Saturday, March 2, 2024\n\n- **09:00** Remedy: Bryonia — Potency: 6C\n- **08:05** Symptom: Headache"
        ));
        assert!(md.find("March 3").unwrap() < md.find("March 2").unwrap());
    }

    #[test]
    fn test_markdown_empty_range() {
        let md = timeline_to_markdown(&[], None);
        assert_eq!(md, "# Symptomly Timeline\n\nNo entries for this period.\n");
    }

    #[test]
    fn test_markup_in_names_is_escaped() {
        let items = vec![item(ItemKind::Symptom, "*sharp* pain", "Severity: Mild", at(1, 7, 0))];
        let md = timeline_to_markdown(&items, None);
        assert!(md.contains("\\*sharp\\* pain"));
        assert!(!to_html(&md).contains("<em>sharp</em>"));
    }

    #[test]
    fn test_outline_lists_headings() {
        let md = timeline_to_markdown(&sample(), None);
        let headings = outline(&md);
        assert_eq!(headings.len(), 3);
        assert_eq!(headings[0], (1, "Symptomly Timeline".to_string()));
        assert_eq!(headings[1], (2, "Sunday, March 3, 2024".to_string()));
    }

    #[test]
    fn test_html_render() {
        let html = to_html(&timeline_to_markdown(&sample(), None));
        assert!(html.contains("<h1>Symptomly Timeline</h1>"));
        assert!(html.contains("<strong>20:15</strong>"));
        assert_eq!(html.matches("<li>").count(), 3);
    }
}
