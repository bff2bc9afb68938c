use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The maximum length of a graph name.
pub const MAX_NAME_LENGTH: usize = 120;

/// The fixed set of domains graphs are namespaced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Business,
    Education,
    Sports,
    Health,
    Weather,
    Analytics,
    Expression,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Business,
        Category::Education,
        Category::Sports,
        Category::Health,
        Category::Weather,
        Category::Analytics,
        Category::Expression,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Education => "education",
            Category::Sports => "sports",
            Category::Health => "health",
            Category::Weather => "weather",
            Category::Analytics => "analytics",
            Category::Expression => "expression",
        }
    }
}

impl FromStr for Category {
    type Err = GraphError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| GraphError::UnknownCategory(value.to_string()))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a graph is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    Line,
    Bar,
    Pie,
}

impl GraphKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphKind::Line => "line",
            GraphKind::Bar => "bar",
            GraphKind::Pie => "pie",
        }
    }
}

impl FromStr for GraphKind {
    type Err = GraphError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "line" => Ok(GraphKind::Line),
            "bar" => Ok(GraphKind::Bar),
            "pie" => Ok(GraphKind::Pie),
            other => Err(GraphError::UnknownKind(other.to_string())),
        }
    }
}

impl Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled series within a multi-series graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
}

/// The values of a graph, either a single flat series or multiple labeled ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphData {
    Single(Vec<f64>),
    Multi(Vec<Dataset>),
}

impl GraphData {
    /// Returns every series with its label. A single flat series has no label.
    pub fn series(&self) -> Vec<(Option<&str>, &[f64])> {
        match self {
            GraphData::Single(values) => vec![(None, values.as_slice())],
            GraphData::Multi(datasets) => datasets
                .iter()
                .map(|d| (Some(d.label.as_str()), d.values.as_slice()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GraphData::Single(values) => values.is_empty(),
            GraphData::Multi(datasets) => datasets.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("'{0}' is not a known category")]
    UnknownCategory(String),
    #[error("'{0}' is not a known graph kind")]
    UnknownKind(String),
    #[error("Graph name cannot be empty")]
    EmptyName,
    #[error("Graph name cannot be longer than {MAX_NAME_LENGTH} characters")]
    NameTooLong,
    #[error("Graph must have at least one label")]
    EmptyLabels,
    #[error("Graph must have at least one dataset")]
    NoDatasets,
    #[error("Series '{series}' has {values} values but the graph has {labels} labels")]
    LengthMismatch {
        series: String,
        labels: usize,
        values: usize,
    },
    #[error("Series '{series}' contains a value that is not a finite number")]
    NonFiniteValue { series: String },
    #[error("Pie graphs can only be drawn from a single flat series")]
    PieRequiresSingleSeries,
    #[error("Pie slice '{label}' cannot be negative")]
    NegativePieSlice { label: String },
    #[error("Weather graphs must specify a weather type")]
    MissingWeatherType,
    #[error("Analytics graphs must specify a metric")]
    MissingMetric,
    #[error("Expression graphs must specify an expression")]
    MissingExpression,
    #[error("Expression range is invalid: min {min} must be less than max {max}")]
    InvalidRange { min: f64, max: f64 },
    #[error("Only expression graphs may carry an expression and a range")]
    UnexpectedExpressionFields,
}

/// The full content of a graph as submitted for saving.
///
/// Category-specific extras (metric, weather type, expression fields) live
/// here as options so one shape covers every category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub name: String,
    pub kind: GraphKind,
    pub labels: Vec<String>,
    pub data: GraphData,
    pub metric: Option<String>,
    pub weather_type: Option<String>,
    pub expression: Option<String>,
    pub variables: Option<String>,
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
}

impl GraphSpec {
    /// Checks every invariant a graph must hold before it is stored.
    pub fn validate(&self, category: Category) -> Result<(), GraphError> {
        let name = self.name.trim();

        if name.is_empty() {
            return Err(GraphError::EmptyName);
        }

        if name.len() > MAX_NAME_LENGTH {
            return Err(GraphError::NameTooLong);
        }

        if self.labels.is_empty() {
            return Err(GraphError::EmptyLabels);
        }

        if self.data.is_empty() {
            return Err(GraphError::NoDatasets);
        }

        for (label, values) in self.data.series() {
            let series = label.unwrap_or(name).to_string();

            if values.len() != self.labels.len() {
                return Err(GraphError::LengthMismatch {
                    series,
                    labels: self.labels.len(),
                    values: values.len(),
                });
            }

            if values.iter().any(|v| !v.is_finite()) {
                return Err(GraphError::NonFiniteValue { series });
            }
        }

        if self.kind == GraphKind::Pie {
            let values = match &self.data {
                GraphData::Single(values) => values,
                GraphData::Multi(_) => return Err(GraphError::PieRequiresSingleSeries),
            };

            if let Some(index) = values.iter().position(|v| *v < 0.) {
                return Err(GraphError::NegativePieSlice {
                    label: self.labels[index].clone(),
                });
            }
        }

        match category {
            Category::Weather if self.weather_type.is_none() => {
                return Err(GraphError::MissingWeatherType)
            }
            Category::Analytics if self.metric.is_none() => return Err(GraphError::MissingMetric),
            Category::Expression => {
                if self.expression.is_none() {
                    return Err(GraphError::MissingExpression);
                }

                let min = self.x_min.unwrap_or(f64::NAN);
                let max = self.x_max.unwrap_or(f64::NAN);

                if !(min.is_finite() && max.is_finite() && min < max) {
                    return Err(GraphError::InvalidRange { min, max });
                }
            }
            _ => {
                if self.expression.is_some() || self.x_min.is_some() || self.x_max.is_some() {
                    return Err(GraphError::UnexpectedExpressionFields);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn spec(kind: GraphKind, labels: &[&str], data: GraphData) -> GraphSpec {
        GraphSpec {
            name: "Quarterly revenue".to_string(),
            kind,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            data,
            metric: None,
            weather_type: None,
            expression: None,
            variables: None,
            x_min: None,
            x_max: None,
        }
    }

    #[test]
    fn test_accepts_matching_lengths() {
        let spec = spec(
            GraphKind::Line,
            &["Q1", "Q2", "Q3"],
            GraphData::Single(vec![1., 2., 3.]),
        );

        assert!(spec.validate(Category::Business).is_ok());
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let spec = spec(
            GraphKind::Line,
            &["Q1", "Q2", "Q3"],
            GraphData::Single(vec![1., 2.]),
        );

        assert_eq!(
            spec.validate(Category::Business),
            Err(GraphError::LengthMismatch {
                series: "Quarterly revenue".to_string(),
                labels: 3,
                values: 2,
            })
        );
    }

    #[test]
    fn test_rejects_mismatched_dataset() {
        let spec = spec(
            GraphKind::Bar,
            &["Mon", "Tue"],
            GraphData::Multi(vec![
                Dataset {
                    label: "Team A".to_string(),
                    values: vec![3., 4.],
                },
                Dataset {
                    label: "Team B".to_string(),
                    values: vec![5.],
                },
            ]),
        );

        assert_eq!(
            spec.validate(Category::Sports),
            Err(GraphError::LengthMismatch {
                series: "Team B".to_string(),
                labels: 2,
                values: 1,
            })
        );
    }

    #[test]
    fn test_rejects_multi_series_pie() {
        let spec = spec(
            GraphKind::Pie,
            &["A", "B"],
            GraphData::Multi(vec![Dataset {
                label: "Only".to_string(),
                values: vec![1., 2.],
            }]),
        );

        assert_eq!(
            spec.validate(Category::Business),
            Err(GraphError::PieRequiresSingleSeries)
        );
    }

    #[test]
    fn test_rejects_negative_pie_slice() {
        let spec = spec(
            GraphKind::Pie,
            &["Rent", "Food"],
            GraphData::Single(vec![800., -20.]),
        );

        assert_eq!(
            spec.validate(Category::Business),
            Err(GraphError::NegativePieSlice {
                label: "Food".to_string()
            })
        );
    }

    #[test]
    fn test_requires_category_extras() {
        let plain = spec(
            GraphKind::Line,
            &["Jan"],
            GraphData::Single(vec![12.]),
        );

        assert_eq!(
            plain.validate(Category::Weather),
            Err(GraphError::MissingWeatherType)
        );
        assert_eq!(
            plain.validate(Category::Analytics),
            Err(GraphError::MissingMetric)
        );
        assert_eq!(
            plain.validate(Category::Expression),
            Err(GraphError::MissingExpression)
        );
    }

    #[test]
    fn test_rejects_expression_fields_elsewhere() {
        let mut spec = spec(GraphKind::Line, &["0"], GraphData::Single(vec![1.]));
        spec.expression = Some("x".to_string());

        assert_eq!(
            spec.validate(Category::Health),
            Err(GraphError::UnexpectedExpressionFields)
        );
    }

    #[test]
    fn test_expression_range_must_be_ordered() {
        let mut spec = spec(GraphKind::Line, &["0"], GraphData::Single(vec![1.]));
        spec.expression = Some("x".to_string());
        spec.x_min = Some(5.);
        spec.x_max = Some(-5.);

        assert_eq!(
            spec.validate(Category::Expression),
            Err(GraphError::InvalidRange { min: 5., max: -5. })
        );
    }

    #[test]
    fn test_data_deserializes_both_shapes() {
        let single: GraphData = serde_json::from_str("[1.0, 2.0, 3.0]").unwrap();
        let multi: GraphData =
            serde_json::from_str(r#"[{"label": "A", "values": [1.0]}]"#).unwrap();

        assert_eq!(single, GraphData::Single(vec![1., 2., 3.]));
        assert_eq!(
            multi,
            GraphData::Multi(vec![Dataset {
                label: "A".to_string(),
                values: vec![1.],
            }])
        );
    }
}
