//! Partial-update expressions.
//!
//! An update is a list of `SET` clauses whose attribute names and values are
//! referenced through generated aliases (`#f0`, `:v0`, ...). Aliases are
//! positional, so any attribute name is expressible: reserved words, names
//! containing spaces or punctuation, names that collide with each other once
//! lowercased. Stores resolve the aliases back into plain assignments.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::traits::Item;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetClause {
    pub name_alias: String,
    pub value_alias: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    clauses: Vec<SetClause>,
    names: BTreeMap<String, String>,
    values: BTreeMap<String, Value>,
}

impl UpdateExpression {
    pub fn builder() -> UpdateExpressionBuilder {
        UpdateExpressionBuilder::default()
    }

    /// One `SET` clause per entry, in map order.
    pub fn from_fields(fields: &Item) -> Self {
        fields
            .iter()
            .fold(Self::builder(), |builder, (name, value)| {
                builder.set(name.clone(), value.clone())
            })
            .build()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[SetClause] {
        &self.clauses
    }

    /// Alias → attribute name.
    pub fn names(&self) -> &BTreeMap<String, String> {
        &self.names
    }

    /// Alias → value.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Rendered form, e.g. `SET #f0 = :v0, #f1 = :v1`.
    pub fn expression(&self) -> String {
        let clauses: Vec<String> = self
            .clauses
            .iter()
            .map(|c| format!("{} = {}", c.name_alias, c.value_alias))
            .collect();
        format!("SET {}", clauses.join(", "))
    }

    /// Resolved `(attribute, value)` pairs in clause order.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.clauses.iter().filter_map(move |c| {
            let name = self.names.get(&c.name_alias)?;
            let value = self.values.get(&c.value_alias)?;
            Some((name.as_str(), value))
        })
    }

    pub fn touches(&self, attribute: &str) -> bool {
        self.names.values().any(|name| name == attribute)
    }

    /// Resolved assignments as a JSON object (a merge patch).
    pub fn to_patch(&self) -> Item {
        self.assignments()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    pub fn apply(&self, item: &mut Item) {
        for (name, value) in self.assignments() {
            item.insert(name.to_string(), value.clone());
        }
    }
}

#[derive(Debug, Default)]
pub struct UpdateExpressionBuilder {
    fields: Vec<(String, Value)>,
}

impl UpdateExpressionBuilder {
    /// Set `name` to `value`. Setting a name twice keeps its first position
    /// and the last value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn build(self) -> UpdateExpression {
        let mut expression = UpdateExpression::default();
        for (i, (name, value)) in self.fields.into_iter().enumerate() {
            let name_alias = format!("#f{i}");
            let value_alias = format!(":v{i}");
            expression.names.insert(name_alias.clone(), name);
            expression.values.insert(value_alias.clone(), value);
            expression.clauses.push(SetClause {
                name_alias,
                value_alias,
            });
        }
        expression
    }
}
