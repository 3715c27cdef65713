use crate::autoconfig::FieldManager;
use crate::error::AutoconfigError;
use lazy_regex::regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, info};

#[async_trait::async_trait]
pub trait Labeler: Send + Sync {
    /// Sets a unique `name` on every field.
    async fn label_fields(&self, fields: &mut FieldManager) -> Result<(), AutoconfigError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LabelerKind {
    #[default]
    Enumerate,
    Knn {
        training: PathBuf,
        words: Option<PathBuf>,
        k: usize,
    },
    Remote {
        endpoint: String,
    },
}

pub fn labeler_for(kind: &LabelerKind) -> Box<dyn Labeler> {
    match kind {
        LabelerKind::Enumerate => Box::new(EnumerateLabeler),
        LabelerKind::Knn { training, words, k } => Box::new(KnnLabeler {
            training: training.clone(),
            words: words.clone(),
            k: *k,
        }),
        LabelerKind::Remote { endpoint } => Box::new(RemoteLabeler {
            endpoint: endpoint.clone(),
            client: reqwest::Client::new(),
        }),
    }
}

/// Appends `-1`, `-2`, ... to repeated names.
fn unique_names(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let n = seen.entry(name.clone()).or_default();
            let mut candidate = name.clone();
            while taken.contains(&candidate) {
                *n += 1;
                candidate = format!("{}-{}", name, n);
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

fn apply_names(fields: &mut FieldManager, names: Vec<String>) {
    for (field, name) in fields.iter_mut().zip(unique_names(names)) {
        field.name = name;
    }
}

#[derive(Debug)]
pub struct EnumerateLabeler;

#[async_trait::async_trait]
impl Labeler for EnumerateLabeler {
    async fn label_fields(&self, fields: &mut FieldManager) -> Result<(), AutoconfigError> {
        let names = (0..fields.len()).map(|i| format!("field-{}", i)).collect();
        apply_names(fields, names);
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TrainingField {
    name: String,
    examples: Vec<String>,
}

const FEATURES: usize = 7;
type Features = [f64; FEATURES];

/// Digits, chars, dictionary words, then the counts of `/ : - .`.
fn features(value: &str, words: Option<&HashSet<String>>) -> Features {
    let count = |c: char| value.chars().filter(|v| *v == c).count() as f64;
    let dictionary = regex!(r"\p{L}+")
        .find_iter(value)
        .filter(|m| words.map_or(true, |w| w.contains(&m.as_str().to_lowercase())))
        .count();
    [
        value.chars().filter(char::is_ascii_digit).count() as f64,
        value.chars().count() as f64,
        dictionary as f64,
        count('/'),
        count(':'),
        count('-'),
        count('.'),
    ]
}

fn euclidean(a: &Features, b: &Features) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Most frequent label, the first one seen wins ties.
fn majority<'a, I: IntoIterator<Item = &'a str>>(labels: I) -> Option<&'a str> {
    let mut order: Vec<&str> = vec![];
    let mut votes: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        let count = votes.entry(label).or_default();
        if *count == 0 {
            order.push(label);
        }
        *count += 1;
    }
    order.into_iter().fold(None, |best, label| match best {
        Some(b) if votes[b] >= votes[label] => Some(b),
        _ => Some(label),
    })
}

#[derive(Debug)]
pub struct KnnLabeler {
    training: PathBuf,
    words: Option<PathBuf>,
    k: usize,
}

struct Model {
    samples: Vec<(Features, String)>,
    words: Option<HashSet<String>>,
    k: usize,
}

impl Model {
    fn new(training: Vec<TrainingField>, words: Option<HashSet<String>>, k: usize) -> Self {
        let samples = training
            .into_iter()
            .flat_map(|field| {
                let words = words.as_ref();
                let name = field.name;
                field
                    .examples
                    .into_iter()
                    .map(move |e| (features(&e, words), name.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        Model {
            samples,
            words,
            k: k.max(1),
        }
    }

    fn classify(&self, value: &str) -> Option<&str> {
        let target = features(value, self.words.as_ref());
        let mut nearest: Vec<(f64, &str)> = self
            .samples
            .iter()
            .map(|(f, name)| (euclidean(f, &target), name.as_str()))
            .collect();
        nearest.sort_by(|a, b| a.0.total_cmp(&b.0));
        majority(nearest.into_iter().take(self.k).map(|(_, name)| name))
    }

    fn label<'a, I: IntoIterator<Item = &'a str>>(&self, examples: I) -> Option<String> {
        let votes: Vec<&str> = examples
            .into_iter()
            .filter_map(|e| self.classify(e))
            .collect();
        majority(votes).map(ToString::to_string)
    }
}

#[async_trait::async_trait]
impl Labeler for KnnLabeler {
    async fn label_fields(&self, fields: &mut FieldManager) -> Result<(), AutoconfigError> {
        let training: Vec<TrainingField> =
            serde_json::from_str(&tokio::fs::read_to_string(&self.training).await?)?;
        if training.iter().all(|t| t.examples.is_empty()) {
            return Err(AutoconfigError::Labeler(format!(
                "No training examples in {}",
                self.training.display()
            )));
        }

        let words = match &self.words {
            Some(path) => Some(
                tokio::fs::read_to_string(path)
                    .await?
                    .lines()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect::<HashSet<_>>(),
            ),
            None => None,
        };

        let model = Model::new(training, words, self.k);
        debug!("Loaded {} training samples", model.samples.len());

        let names = fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                model
                    .label(f.example_values())
                    .unwrap_or_else(|| format!("field-{}", i))
            })
            .collect();
        apply_names(fields, names);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RemoteField<'a> {
    examples: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct RemoteRequest<'a> {
    fields: Vec<RemoteField<'a>>,
}

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    names: Vec<String>,
}

#[derive(Debug)]
pub struct RemoteLabeler {
    endpoint: String,
    client: reqwest::Client,
}

#[async_trait::async_trait]
impl Labeler for RemoteLabeler {
    async fn label_fields(&self, fields: &mut FieldManager) -> Result<(), AutoconfigError> {
        let request = RemoteRequest {
            fields: fields
                .iter()
                .map(|f| RemoteField {
                    examples: f.example_values().collect(),
                })
                .collect(),
        };

        info!("Labeling {} fields with {}", fields.len(), self.endpoint);
        let response = self.client.post(self.endpoint.as_str()).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(AutoconfigError::Status {
                url: self.endpoint.clone(),
                status: response.status().as_u16(),
            });
        }

        let response: RemoteResponse = response.json().await?;
        if response.names.len() != fields.len() {
            return Err(AutoconfigError::Labeler(format!(
                "Expected {} names, got {}",
                fields.len(),
                response.names.len()
            )));
        }
        apply_names(fields, response.names);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoconfig::{FieldCandidate, Path};
    use crate::utils::serve_once;
    use pretty_assertions::assert_eq;

    fn fields(values: &[&[&str]]) -> FieldManager {
        values
            .iter()
            .enumerate()
            .map(|(i, examples)| {
                let mut field = FieldCandidate::new(Path::default(), "", 0, examples[0], i);
                for (j, e) in examples.iter().enumerate().skip(1) {
                    field.examples.push(crate::autoconfig::Example {
                        value: e.to_string(),
                        index: i + j,
                    });
                }
                field
            })
            .collect()
    }

    #[test]
    fn test_unique_names() {
        let names = ["title", "title", "date", "title", "title-1"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            unique_names(names),
            vec!["title", "title-1", "date", "title-2", "title-1-1"]
        );
    }

    #[test]
    fn test_majority_first_seen_wins_ties() {
        assert_eq!(majority(["a", "b", "b", "a"]), Some("a"));
        assert_eq!(majority(["a", "b", "b"]), Some("b"));
        assert_eq!(majority(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_features() {
        assert_eq!(
            features("17.03.2023 20:30", None),
            [12.0, 16.0, 0.0, 0.0, 1.0, 0.0, 2.0]
        );
        let words: HashSet<String> = ["concert".to_string()].into_iter().collect();
        assert_eq!(features("Jazz Concert", Some(&words))[2], 1.0);
        assert_eq!(features("Jazz Concert", None)[2], 2.0);
    }

    #[tokio::test]
    async fn test_enumerate_labeler() {
        let mut fm = fields(&[&["a"], &["b"], &["c"]]);
        labeler_for(&LabelerKind::Enumerate)
            .label_fields(&mut fm)
            .await
            .expect("Labeling failed");
        let names: Vec<&str> = fm.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["field-0", "field-1", "field-2"]);
    }

    fn remote(endpoint: String) -> Box<dyn Labeler> {
        labeler_for(&LabelerKind::Remote { endpoint })
    }

    #[tokio::test]
    async fn test_remote_labeler() {
        let (url, request) = serve_once("200 OK", r#"{"names": ["title", "title"]}"#).await;
        let mut fm = fields(&[&["Jazz", "Rock"], &["Folk"]]);

        remote(format!("{}/label", url))
            .label_fields(&mut fm)
            .await
            .expect("Labeling failed");

        let names: Vec<&str> = fm.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "title-1"]);

        let request = request.await.expect("Server failed");
        assert!(request.starts_with("POST /label HTTP/1.1"));
        assert!(request.ends_with(r#"{"fields":[{"examples":["Jazz","Rock"]},{"examples":["Folk"]}]}"#));
    }

    #[tokio::test]
    async fn test_remote_labeler_name_count() {
        let (url, _request) = serve_once("200 OK", r#"{"names": ["title"]}"#).await;
        let mut fm = fields(&[&["a"], &["b"]]);

        let result = remote(url).label_fields(&mut fm).await;
        match result {
            Err(AutoconfigError::Labeler(message)) => {
                assert_eq!(message, "Expected 2 names, got 1")
            }
            other => panic!("Expected a labeler error, got {:?}", other),
        }
        assert!(fm.iter().all(|f| f.name.is_empty()));
    }

    #[tokio::test]
    async fn test_remote_labeler_status() {
        let (url, _request) = serve_once("500 Internal Server Error", "").await;
        let mut fm = fields(&[&["a"]]);

        let result = remote(url).label_fields(&mut fm).await;
        assert!(matches!(
            result,
            Err(AutoconfigError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn test_knn_model() {
        let training = vec![
            TrainingField {
                name: "date".to_string(),
                examples: vec!["17.03.2023".to_string(), "01.04.2023".to_string()],
            },
            TrainingField {
                name: "url".to_string(),
                examples: vec!["/events/jazz-night".to_string(), "/events/rock".to_string()],
            },
            TrainingField {
                name: "title".to_string(),
                examples: vec!["Jazz Night".to_string(), "Rock Concert".to_string()],
            },
        ];
        let model = Model::new(training, None, 1);

        assert_eq!(model.label(["03.05.2023", "12.12.2023"]), Some("date".to_string()));
        assert_eq!(model.label(["/events/folk"]), Some("url".to_string()));
        assert_eq!(model.label(["Folk Night"]), Some("title".to_string()));
        assert_eq!(model.label(Vec::<&str>::new()), None);
    }
}
