use crate::autoconfig::{FieldManager, Rgb};
use crate::error::AutoconfigError;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use tracing::info;

const SHOWN_EXAMPLES: usize = 4;
const EXAMPLE_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRow {
    pub name: String,
    pub examples: Vec<String>,
    pub color: Rgb,
}

/// Terminal table of the candidate fields, one colored row per field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionView {
    pub rows: Vec<SelectionRow>,
}

impl From<&FieldManager> for SelectionView {
    fn from(fields: &FieldManager) -> Self {
        let rows = fields
            .iter()
            .map(|f| SelectionRow {
                name: f.name.clone(),
                examples: f
                    .example_values()
                    .take(SHOWN_EXAMPLES)
                    .map(ToString::to_string)
                    .collect(),
                color: f.color,
            })
            .collect();
        SelectionView { rows }
    }
}

fn shorten(value: &str) -> String {
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if value.chars().count() > EXAMPLE_WIDTH {
        let head: String = value.chars().take(EXAMPLE_WIDTH - 3).collect();
        format!("{}...", head)
    } else {
        value
    }
}

impl SelectionView {
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let width = self.rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
        for (i, row) in self.rows.iter().enumerate() {
            let examples = row.examples.iter().map(|e| shorten(e)).collect::<Vec<_>>();
            let line = format!("{:>3}  {:<width$}  {}", i, row.name, examples.join(" | "));
            writeln!(out, "{}", row.color.paint(&line))?;
        }
        write!(out, "Fields to keep (e.g. 0,2,5-7 or all) [all]: ")?;
        out.flush()
    }

    pub fn parse_selection(&self, input: &str) -> Result<BTreeSet<usize>, AutoconfigError> {
        parse_selection(input, self.rows.len())
    }
}

/// Parses `all`, an empty answer, or a comma separated list of indices and
/// inclusive ranges.
pub fn parse_selection(input: &str, len: usize) -> Result<BTreeSet<usize>, AutoconfigError> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("all") {
        return Ok((0..len).collect());
    }

    let index = |s: &str| -> Result<usize, AutoconfigError> {
        let i: usize = s
            .trim()
            .parse()
            .map_err(|_| AutoconfigError::InvalidSelection(format!("{} is not a number", s)))?;
        if i >= len {
            return Err(AutoconfigError::InvalidSelection(format!(
                "{} is out of range, there are {} fields",
                i, len
            )));
        }
        Ok(i)
    };

    let mut selected = BTreeSet::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (index(start)?, index(end)?);
                if start > end {
                    return Err(AutoconfigError::InvalidSelection(format!(
                        "{} is an empty range",
                        part
                    )));
                }
                selected.extend(start..=end);
            }
            None => {
                selected.insert(index(part)?);
            }
        }
    }
    Ok(selected)
}

/// Keeps every field unless `interactive`, in which case the user picks from
/// the table on stdin.
pub fn select_fields(
    fields: FieldManager,
    interactive: bool,
) -> Result<FieldManager, AutoconfigError> {
    if !interactive {
        return Ok(fields);
    }

    let view = SelectionView::from(&fields);
    view.render(&mut io::stdout().lock())?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let selected = view.parse_selection(&answer)?;
    info!("Selected {} of {} fields", selected.len(), fields.len());

    Ok(fields
        .into_iter()
        .enumerate()
        .filter(|(i, _)| selected.contains(i))
        .map(|(_, f)| f)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoconfig::{FieldCandidate, Path};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("", 3).unwrap(), BTreeSet::from([0, 1, 2]));
        assert_eq!(parse_selection(" ALL\n", 2).unwrap(), BTreeSet::from([0, 1]));
        assert_eq!(
            parse_selection("0,2, 5-7", 8).unwrap(),
            BTreeSet::from([0, 2, 5, 6, 7])
        );
        assert_eq!(parse_selection("3,3,1", 4).unwrap(), BTreeSet::from([1, 3]));
    }

    #[test]
    fn test_parse_selection_errors() {
        for input in ["x", "9", "2-1", "1-9", "-"] {
            assert!(
                matches!(
                    parse_selection(input, 4),
                    Err(AutoconfigError::InvalidSelection(_))
                ),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_render() {
        let mut field = FieldCandidate::new(Path::default(), "", 0, "First   value", 0);
        field.name = "title".to_string();
        let mut view = SelectionView::from(&FieldManager::from(vec![field]));
        assert_eq!(view.rows[0].examples, vec!["First   value"]);
        view.rows[0].examples.push("x".repeat(50));

        let mut out = vec![];
        view.render(&mut out).expect("Render failed");
        let rendered = String::from_utf8(out).expect("Invalid utf-8");

        assert!(rendered.contains("  0  title  First value | "));
        assert!(rendered.contains(&format!("{}...", "x".repeat(37))));
        assert!(rendered.starts_with("\x1b[38;2;"));
        assert!(rendered.ends_with("[all]: "));
    }

    #[test]
    fn test_select_fields_not_interactive() {
        let fm = FieldManager::from(vec![
            FieldCandidate::new(Path::default(), "", 0, "a", 0),
            FieldCandidate::new(Path::default(), "", 0, "b", 1),
        ]);
        let selected = select_fields(fm.clone(), false).expect("Selection failed");
        assert_eq!(selected, fm);
    }
}
