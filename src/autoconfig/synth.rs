use super::{FieldManager, Path};
use crate::config::{DateComponent, ElementLocation, Field, FieldType, ScraperConfig};
use crate::date::{CoveredDateParts, DateFormat};
use crate::error::AutoconfigError;
use crate::utils;
use tracing::{debug, warn};

/// Names starting with this are parts of the composite date field. The rest
/// of the name lists the covered parts, e.g. `date-component-day-month`.
pub const DATE_COMPONENT_PREFIX: &str = "date-component-";
pub const DATE_FIELD: &str = "date";
const LINK_ATTRIBUTES: [&str; 2] = ["href", "src"];

/// Longest path prefix shared by every field, compared node by node against
/// the first field. A single field yields its whole path.
pub fn root_path(fields: &FieldManager) -> Path {
    let Some(first) = fields.first() else {
        return Path::default();
    };

    let depth = (0..first.path.len())
        .take_while(|&i| fields.iter().all(|f| f.path.get(i) == Some(&first.path[i])))
        .count();
    Path(first.path[..depth].to_vec())
}

/// Builds the scraper config for the selected fields.
pub fn synthesize(
    fields: &FieldManager,
    name: &str,
    url: &str,
) -> Result<ScraperConfig, AutoconfigError> {
    if fields.is_empty() {
        return Err(AutoconfigError::NothingSelected);
    }

    let root = root_path(fields);
    debug!("Item selector: {}", root);

    let mut output = vec![];
    let mut components = vec![];
    let mut date_examples = vec![];
    let mut language: Option<&'static str> = None;

    for field in fields.iter() {
        let location = ElementLocation {
            selector: field.path.relative(root.len()).to_string(),
            attr: (!field.attr.is_empty()).then(|| field.attr.clone()),
            child_index: field.text_index,
            ..Default::default()
        };
        let examples: Vec<String> = field.example_values().map(ToString::to_string).collect();

        match field.name.strip_prefix(DATE_COMPONENT_PREFIX) {
            Some(parts) => {
                let covers = CoveredDateParts::from_parts(parts);
                let format = DateFormat::infer(&examples, covers);
                if format.is_unknown() {
                    warn!("No date layout found for {}, it has to be set manually", field.name);
                }
                language = language.or(format.language);
                date_examples.extend(examples.iter().map(|e| format!("{}: {}", parts, e)));
                components.push(DateComponent {
                    covers,
                    location,
                    layout: format.layout,
                });
            }
            None => {
                let field_type = if LINK_ATTRIBUTES.contains(&field.attr.as_str()) {
                    FieldType::Url
                } else {
                    FieldType::Text
                };
                output.push(Field {
                    name: field.name.clone(),
                    field_type,
                    location: vec![location],
                    examples,
                    ..Default::default()
                });
            }
        }
    }

    if !components.is_empty() {
        output.push(Field {
            name: DATE_FIELD.to_string(),
            field_type: FieldType::Date,
            components,
            date_location: Some(utils::local_timezone()),
            date_language: language.map(ToString::to_string),
            examples: date_examples,
            ..Default::default()
        });
    }

    Ok(ScraperConfig {
        name: name.to_string(),
        url: url.to_string(),
        item: root.to_string(),
        fields: output,
    })
}
