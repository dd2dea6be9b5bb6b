use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ParamOptions, RowValues, SqlType};

/// Key under which a stored procedure's integer return code is stored after execution.
pub const RETURN_VALUE_KEY: &str = "returnValue";

/// Alternate names a parameter may be found under in a [`ValueMap`](super::ValueMap).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AltNames {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl AltNames {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, AltNames::None)
    }
}

impl From<&str> for AltNames {
    fn from(value: &str) -> Self {
        AltNames::One(value.to_owned())
    }
}

impl From<String> for AltNames {
    fn from(value: String) -> Self {
        AltNames::One(value)
    }
}

impl From<Vec<String>> for AltNames {
    fn from(value: Vec<String>) -> Self {
        AltNames::Many(value)
    }
}

impl From<&[&str]> for AltNames {
    fn from(value: &[&str]) -> Self {
        AltNames::Many(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AltNames {
    fn from(value: [&str; N]) -> Self {
        AltNames::Many(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

/// Declarative description of one statement or procedure parameter.
///
/// Deserialises from the same shape callers would write by hand:
/// `{"type": "NVarChar", "required": true, "alt": ["name", "login"], "options": {"length": 50}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    #[serde(rename = "type")]
    pub sql_type: SqlType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "AltNames::is_none")]
    pub alt: AltNames,
    #[serde(default)]
    pub options: ParamOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RowValues>,
    #[serde(default)]
    pub output: bool,
}

impl ParamDef {
    #[must_use]
    pub fn new(sql_type: SqlType) -> Self {
        Self {
            sql_type,
            required: false,
            alt: AltNames::None,
            options: ParamOptions::default(),
            value: None,
            output: false,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn output(mut self) -> Self {
        self.output = true;
        self
    }

    #[must_use]
    pub fn alt(mut self, alt: impl Into<AltNames>) -> Self {
        self.alt = alt.into();
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ParamOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.options.length = Some(length);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<RowValues>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Keys tried in order when looking this parameter up: the name, its lowercase
    /// form, then the alternates followed by their lowercase forms.
    #[must_use]
    pub fn lookup_keys(&self, name: &str) -> Vec<String> {
        let mut keys = vec![name.to_owned(), name.to_lowercase()];
        match &self.alt {
            AltNames::None => {}
            AltNames::One(alt) => {
                keys.push(alt.clone());
                keys.push(alt.to_lowercase());
            }
            AltNames::Many(alts) => {
                keys.extend(alts.iter().cloned());
                keys.extend(alts.iter().map(|a| a.to_lowercase()));
            }
        }
        keys
    }
}

/// Parameter definitions keyed by parameter name (without the leading `@`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamMap {
    params: BTreeMap<String, ParamDef>,
}

impl ParamMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, def: ParamDef) -> Self {
        self.insert(name, def);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, def: ParamDef) -> Option<ParamDef> {
        self.params.insert(name.into(), def)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamDef> {
        self.params.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParamDef> {
        self.params.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// The value currently assigned to `name`, if any.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&RowValues> {
        self.params.get(name).and_then(|def| def.value.as_ref())
    }

    /// The stored procedure return code recorded by the last execution.
    #[must_use]
    pub fn return_value(&self) -> Option<i64> {
        self.value(RETURN_VALUE_KEY).and_then(RowValues::as_int).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamDef)> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut ParamDef)> {
        self.params.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ParamDef)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, ParamDef)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_keys_follow_declared_order() {
        let def = ParamDef::new(SqlType::Int).alt(["AcctId", "Account"]);
        assert_eq!(
            def.lookup_keys("AccountID"),
            vec!["AccountID", "accountid", "AcctId", "Account", "acctid", "account"]
        );
        let single = ParamDef::new(SqlType::Int).alt("Login");
        assert_eq!(single.lookup_keys("x"), vec!["x", "x", "Login", "login"]);
    }

    #[test]
    fn deserializes_declarations() {
        let map: ParamMap = serde_json::from_value(serde_json::json!({
            "Name": {"type": "varchar", "required": true, "alt": "name_text", "options": {"length": 40}},
            "TypeID": {"type": "Int", "alt": ["type", "kind"]},
            "NewId": {"type": "BigInt", "output": true}
        }))
        .unwrap();

        let name = map.get("Name").unwrap();
        assert_eq!(name.sql_type, SqlType::VarChar);
        assert!(name.required);
        assert_eq!(name.alt, AltNames::One("name_text".into()));
        assert_eq!(name.options.length, Some(40));
        assert_eq!(
            map.get("TypeID").unwrap().alt,
            AltNames::Many(vec!["type".into(), "kind".into()])
        );
        assert!(map.get("NewId").unwrap().output);
    }
}
