use std::fmt;

use serde::{Deserialize, Serialize};

/// The semantic purpose a host assigns to an input column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    StartDate,
    EndDate,
    #[serde(rename = "events")]
    Events,
    EventGroup,
    #[serde(rename = "EventURL")]
    EventUrl,
    #[serde(rename = "description")]
    Description,
    Tooltip,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    DateTime,
    Text,
    Numeric,
    #[serde(rename = "bool")]
    Boolean,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Mirrors the host's truthiness test used before coercing start dates.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Bool(value) => !value,
            Self::Number(value) => *value == 0.0 || value.is_nan(),
            Self::Text(value) => value.is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(value) => value.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    #[serde(rename = "displayName")]
    pub display_name: String,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(rename = "type")]
    pub value_type: ValueType,

    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(default)]
    pub values: Vec<Option<CellValue>>,

    /// Per-row fill colour chosen by the user in the property pane.
    #[serde(default, rename = "colorOverrides")]
    pub color_overrides: Vec<Option<String>>,
}

impl Column {
    pub fn new(display_name: &str, value_type: ValueType, roles: &[Role]) -> Self {
        Self {
            display_name: display_name.to_string(),
            format: None,
            value_type,
            roles: roles.to_vec(),
            values: vec![],
            color_overrides: vec![],
        }
    }

    pub fn with_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = Option<V>>,
        V: Into<CellValue>,
    {
        self.values = values.into_iter().map(|v| v.map(Into::into)).collect();
        self
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, row: usize) -> Option<&CellValue> {
        self.values.get(row).and_then(Option::as_ref)
    }

    pub fn text(&self, row: usize) -> Option<String> {
        self.value(row).map(ToString::to_string)
    }

    pub fn color_override(&self, row: usize) -> Option<&str> {
        self.color_overrides
            .get(row)
            .and_then(Option::as_deref)
            .map(str::trim)
            .filter(|color| !color.is_empty())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One update's worth of bound columns, as delivered by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSet {
    pub columns: Vec<Column>,
}

#[cfg(test)]
mod tests {
    use super::{CellValue, Column, DataSet, Role, ValueType};

    #[test]
    fn deserializes_host_role_names() {
        let raw = r#"{"columns":[
            {"displayName":"When","type":"dateTime","roles":["StartDate"],"values":["2024-01-01",null]},
            {"displayName":"What","type":"text","roles":["events","description"],"values":["A",null]},
            {"displayName":"Link","type":"text","roles":["EventURL"],"values":["https://x",null]}
        ]}"#;
        let data: DataSet = serde_json::from_str(raw).expect("parse dataset");

        assert_eq!(data.columns.len(), 3);
        assert_eq!(data.columns[0].value_type, ValueType::DateTime);
        assert!(data.columns[1].has_role(Role::Events));
        assert!(data.columns[1].has_role(Role::Description));
        assert!(data.columns[2].has_role(Role::EventUrl));
        assert_eq!(data.columns[1].value(1), None);
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(CellValue::Number(42.0).to_string(), "42");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn blank_color_override_is_ignored() {
        let mut column = Column::new("What", ValueType::Text, &[Role::Events]);
        column.color_overrides = vec![Some("  ".to_string()), Some("#123456".to_string())];

        assert_eq!(column.color_override(0), None);
        assert_eq!(column.color_override(1), Some("#123456"));
        assert_eq!(column.color_override(5), None);
    }
}
