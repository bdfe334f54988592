//! Feature schema and one-hot encoding.
//!
//! A [`FeatureSchema`] is built once from the list of feature groups and
//! fixes the column position of every (group, level) indicator. Columns are
//! laid out the way the reference dataset lays out its dummy columns: sorted
//! by column name `"<code>_<level>"`. Every declared level gets a column even
//! if the reference data never observed it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::STANDARD_FEATURES;
use crate::error::ModelError;

/// One categorical risk factor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureGroup {
    /// Questionnaire code, e.g. `"2.1.1"`
    pub code: String,
    /// Higher-level category the group is ranked within, e.g. `"2"`
    pub category: String,
    /// Number of mutually exclusive levels
    pub levels: usize,
}

impl FeatureGroup {
    /// Create a group whose category is the leading segment of its code
    pub fn new(code: impl Into<String>, levels: usize) -> Self {
        let code = code.into();
        let category = code.split('.').next().unwrap_or_default().to_string();
        Self {
            code,
            category,
            levels,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn column_name(&self, level: usize) -> String {
        format!("{}_{}", self.code, level)
    }
}

/// A feature group together with the vector positions of its indicators.
///
/// `columns[level]` is the position of the indicator for `level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupColumns {
    pub group: FeatureGroup,
    pub columns: Vec<usize>,
}

impl GroupColumns {
    pub fn code(&self) -> &str {
        &self.group.code
    }

    pub fn category(&self) -> &str {
        &self.group.category
    }

    pub fn levels(&self) -> usize {
        self.columns.len()
    }

    /// Level of the first active indicator, if any
    pub fn active_level(&self, vector: &EncodedVector) -> Option<usize> {
        self.columns
            .iter()
            .position(|&col| vector.values.get(col).is_some_and(|v| *v != 0.0))
    }

    fn active_count(&self, vector: &EncodedVector) -> usize {
        self.columns
            .iter()
            .filter(|&&col| vector.values.get(col).is_some_and(|v| *v != 0.0))
            .count()
    }
}

/// Flat one-hot vector covering every feature group of a schema.
///
/// Vectors are never edited in place by the search; [`EncodedVector::with_level`]
/// and [`EncodedVector::with_levels`] return modified copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedVector {
    values: Vec<f64>,
}

impl EncodedVector {
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn zeros(width: usize) -> Self {
        Self {
            values: vec![0.0; width],
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of this vector with only `group` switched to `level`
    pub fn with_level(&self, group: &GroupColumns, level: usize) -> EncodedVector {
        let mut next = self.clone();
        next.set_level(group, level);
        next
    }

    /// Copy of this vector with every listed change applied at once
    pub fn with_levels(&self, changes: &[(&GroupColumns, usize)]) -> EncodedVector {
        let mut next = self.clone();
        for (group, level) in changes {
            next.set_level(group, *level);
        }
        next
    }

    fn set_level(&mut self, group: &GroupColumns, level: usize) {
        for (idx, &col) in group.columns.iter().enumerate() {
            if let Some(slot) = self.values.get_mut(col) {
                *slot = if idx == level { 1.0 } else { 0.0 };
            }
        }
    }
}

/// Load-time mapping from feature groups to column positions
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    groups: Vec<GroupColumns>,
    index: HashMap<String, usize>,
    width: usize,
}

impl FeatureSchema {
    /// Build a schema from groups given in questionnaire input order
    pub fn new(groups: Vec<FeatureGroup>) -> Result<Self, ModelError> {
        if groups.is_empty() {
            return Err(ModelError::InvalidSchema(
                "at least one feature group is required".into(),
            ));
        }
        let mut seen = HashMap::new();
        for (idx, group) in groups.iter().enumerate() {
            if group.levels == 0 {
                return Err(ModelError::InvalidSchema(format!(
                    "feature group {} has no levels",
                    group.code
                )));
            }
            if seen.insert(group.code.clone(), idx).is_some() {
                return Err(ModelError::InvalidSchema(format!(
                    "feature group {} is declared twice",
                    group.code
                )));
            }
        }
        Ok(Self::layout(groups, seen))
    }

    /// Schema of the sixteen-question standard questionnaire (72 columns)
    pub fn standard() -> Self {
        let groups: Vec<FeatureGroup> = STANDARD_FEATURES
            .iter()
            .map(|info| FeatureGroup::new(info.code, info.options.len()))
            .collect();
        let index = groups
            .iter()
            .enumerate()
            .map(|(idx, g)| (g.code.clone(), idx))
            .collect();
        Self::layout(groups, index)
    }

    fn layout(groups: Vec<FeatureGroup>, index: HashMap<String, usize>) -> Self {
        let mut names: Vec<(String, usize, usize)> = groups
            .iter()
            .enumerate()
            .flat_map(|(g, group)| (0..group.levels).map(move |l| (group.column_name(l), g, l)))
            .collect();
        names.sort();

        let mut columns: Vec<Vec<usize>> = groups.iter().map(|g| vec![0; g.levels]).collect();
        for (position, (_, g, l)) in names.iter().enumerate() {
            columns[*g][*l] = position;
        }

        let width = names.len();
        let groups = groups
            .into_iter()
            .zip(columns)
            .map(|(group, columns)| GroupColumns { group, columns })
            .collect();
        Self {
            groups,
            index,
            width,
        }
    }

    /// Total number of indicator columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of feature groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in questionnaire input order
    pub fn groups(&self) -> &[GroupColumns] {
        &self.groups
    }

    pub fn group(&self, code: &str) -> Option<&GroupColumns> {
        self.index.get(code).map(|&idx| &self.groups[idx])
    }

    /// Column names in vector position order
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.width];
        for group in &self.groups {
            for (level, &col) in group.columns.iter().enumerate() {
                names[col] = group.group.column_name(level);
            }
        }
        names
    }

    /// True when this schema has exactly the standard questionnaire's groups
    pub fn is_standard(&self) -> bool {
        self.groups.len() == STANDARD_FEATURES.len()
            && self
                .groups
                .iter()
                .zip(STANDARD_FEATURES)
                .all(|(g, info)| g.code() == info.code && g.levels() == info.options.len())
    }

    /// One-hot encode raw answers, one level index per group in input order
    pub fn encode(&self, raw: &[usize]) -> Result<EncodedVector, ModelError> {
        if raw.len() != self.groups.len() {
            return Err(ModelError::InputLength {
                expected: self.groups.len(),
                actual: raw.len(),
            });
        }
        let mut vector = EncodedVector::zeros(self.width);
        for (group, &level) in self.groups.iter().zip(raw) {
            if level >= group.levels() {
                return Err(ModelError::LevelOutOfRange {
                    group: group.code().to_string(),
                    level,
                    levels: group.levels(),
                });
            }
            vector.set_level(group, level);
        }
        Ok(vector)
    }

    /// Recover the raw answers from a valid vector
    pub fn decode(&self, vector: &EncodedVector) -> Result<Vec<usize>, ModelError> {
        self.validate(vector)?;
        Ok(self
            .groups
            .iter()
            .map(|g| g.active_level(vector).unwrap_or_default())
            .collect())
    }

    /// Check width and that every group has exactly one active indicator
    pub fn validate(&self, vector: &EncodedVector) -> Result<(), ModelError> {
        if vector.len() != self.width {
            return Err(ModelError::DimensionMismatch {
                expected: self.width,
                actual: vector.len(),
            });
        }
        for group in &self.groups {
            let active = group.active_count(vector);
            if active != 1 {
                return Err(ModelError::InvalidVector {
                    group: group.code().to_string(),
                    active,
                });
            }
        }
        Ok(())
    }
}
