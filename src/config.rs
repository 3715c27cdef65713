use crate::date::CoveredDateParts;
use crate::error::AutoconfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub scrapers: Vec<ScraperConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub name: String,
    pub url: String,
    pub item: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Url,
    Date,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<ElementLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<DateComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_language: Option<String>,
    /// Values captured while generating, written out as comments only.
    #[serde(skip)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementLocation {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
    #[serde(default)]
    pub child_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_extract: Option<RegexConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegexConfig {
    pub exp: String,
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateComponent {
    pub covers: CoveredDateParts,
    pub location: ElementLocation,
    pub layout: String,
}

impl Config {
    /// YAML with each field's examples as comment lines above the field.
    pub fn to_yaml(&self) -> Result<String, AutoconfigError> {
        let yaml = serde_yaml::to_string(self)?;

        let mut pending = self
            .scrapers
            .iter()
            .flat_map(|s| s.fields.iter())
            .map(|f| -> Result<_, AutoconfigError> {
                let name = serde_yaml::to_string(&f.name)?;
                Ok((format!("- name: {}", name.trim()), f))
            })
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .peekable();

        // Field entries sit at the indentation of their `fields:` key.
        let mut out = String::with_capacity(yaml.len());
        let mut fields_indent: Option<usize> = None;
        for line in yaml.lines() {
            let trimmed = line.trim_start();
            let indent = line.len() - trimmed.len();
            if fields_indent.map_or(false, |i| indent < i) {
                fields_indent = None;
            }

            if trimmed == "fields:" {
                fields_indent = Some(indent);
            } else if fields_indent == Some(indent)
                && pending
                    .peek()
                    .map_or(false, |(header, _)| trimmed == header.as_str())
            {
                if let Some((_, field)) = pending.next() {
                    write_examples(&mut out, &line[..indent], &field.examples);
                }
            }
            out.push_str(line);
            out.push('\n');
        }
        Ok(out)
    }
}

fn write_examples(out: &mut String, indent: &str, examples: &[String]) {
    if examples.is_empty() {
        return;
    }
    out.push_str(indent);
    out.push_str("# examples:\n");
    for example in examples {
        out.push_str(indent);
        out.push_str("#   ");
        out.push_str(&example.replace(|c: char| c == '\n' || c == '\r', " "));
        out.push('\n');
    }
}
