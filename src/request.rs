//! Requests handed to a driver connection, and the attachment of merged parameters.

use std::fmt;

use tracing::debug;

use crate::error::TdsHelperError;
use crate::params::{ParamMap, RETURN_VALUE_KEY};
use crate::types::{ParamOptions, RowValues, SqlType, parse_timestamp};

/// What the request text is and how the connection should run it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Parameterised T-SQL statement(s).
    Statement,
    /// Stored procedure call; the request text is the procedure name.
    Procedure,
    /// Unparameterised batch; attached parameters are ignored.
    Batch,
}

impl OperationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Statement => "exec_sql",
            OperationKind::Procedure => "exec_sp",
            OperationKind::Batch => "exec_sql_batch",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter as attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub name: String,
    pub sql_type: SqlType,
    /// `None` only for output parameters without an initial value.
    pub value: Option<RowValues>,
    pub output: bool,
    pub options: ParamOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    kind: OperationKind,
    text: String,
    params: Vec<BoundParam>,
}

impl Request {
    pub fn new(kind: OperationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    /// Attach every parameter that has a value or is an output parameter.
    ///
    /// Temporal parameters given as text are parsed into timestamps. The reserved
    /// `returnValue` entry is never attached. Batches take no parameters.
    ///
    /// # Errors
    /// Returns `TdsHelperError::MissingRequiredParameter` for a required input without
    /// a value, or `TdsHelperError::ParameterError` for unparseable date text.
    pub fn attach_params(&mut self, params: &ParamMap) -> Result<(), TdsHelperError> {
        if self.kind == OperationKind::Batch {
            if !params.is_empty() {
                debug!(params = params.len(), "batch ignores parameters");
            }
            return Ok(());
        }

        for (name, def) in params.iter() {
            if name == RETURN_VALUE_KEY {
                continue;
            }
            debug!(
                param = %name,
                sql_type = %def.sql_type,
                value = ?def.value,
                output = def.output,
                "addParam"
            );

            if def.value.is_none() && !def.output {
                if def.required {
                    return Err(TdsHelperError::MissingRequiredParameter(name.clone()));
                }
                continue;
            }

            let value = match &def.value {
                Some(RowValues::Text(text)) if def.sql_type.is_temporal() => {
                    Some(RowValues::Timestamp(parse_timestamp(text)?))
                }
                other => other.clone(),
            };

            self.params.push(BoundParam {
                name: name.clone(),
                sql_type: def.sql_type,
                value,
                output: def.output,
                options: def.options,
            });
        }
        Ok(())
    }

    /// Whether any attached parameter is an output parameter.
    #[must_use]
    pub fn has_outputs(&self) -> bool {
        self.params.iter().any(|p| p.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamDef;

    #[test]
    fn attaches_values_and_outputs_only() {
        let params = ParamMap::new()
            .with("a", ParamDef::new(SqlType::Int).with_value(1))
            .with("b", ParamDef::new(SqlType::Int))
            .with("c", ParamDef::new(SqlType::BigInt).output());
        let mut request = Request::new(OperationKind::Statement, "select @a");
        request.attach_params(&params).unwrap();

        let names: Vec<_> = request.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(request.has_outputs());
        assert_eq!(request.params()[1].value, None);
    }

    #[test]
    fn required_without_value_is_rejected() {
        let params = ParamMap::new().with("Name", ParamDef::new(SqlType::VarChar).required());
        let mut request = Request::new(OperationKind::Procedure, "dbo.spAdd");
        let err = request.attach_params(&params).unwrap_err();
        assert!(matches!(err, TdsHelperError::MissingRequiredParameter(n) if n == "Name"));
    }

    #[test]
    fn required_output_without_value_is_attached() {
        let params = ParamMap::new().with("Id", ParamDef::new(SqlType::Int).required().output());
        let mut request = Request::new(OperationKind::Procedure, "dbo.spAdd");
        request.attach_params(&params).unwrap();
        assert_eq!(request.params().len(), 1);
    }

    #[test]
    fn date_text_is_parsed() {
        let params = ParamMap::new()
            .with("At", ParamDef::new(SqlType::DateTime).with_value("2024-05-06T07:08:09"))
            .with("Note", ParamDef::new(SqlType::VarChar).with_value("2024-05-06"));
        let mut request = Request::new(OperationKind::Statement, "select @At, @Note");
        request.attach_params(&params).unwrap();

        let at = &request.params()[0];
        assert_eq!(
            at.value.as_ref().and_then(RowValues::as_timestamp).map(|t| t.to_string()),
            Some("2024-05-06 07:08:09".to_owned())
        );
        assert_eq!(request.params()[1].value, Some(RowValues::from("2024-05-06")));

        let bad = ParamMap::new().with("At", ParamDef::new(SqlType::DateTime).with_value("soon"));
        let mut request = Request::new(OperationKind::Statement, "select @At");
        assert!(matches!(
            request.attach_params(&bad),
            Err(TdsHelperError::ParameterError(_))
        ));
    }

    #[test]
    fn batch_and_return_value_are_skipped() {
        let params = ParamMap::new()
            .with("a", ParamDef::new(SqlType::Int).required())
            .with(RETURN_VALUE_KEY, ParamDef::new(SqlType::Int).with_value(0));
        let mut batch = Request::new(OperationKind::Batch, "select 1");
        batch.attach_params(&params).unwrap();
        assert!(batch.params().is_empty());

        let params = ParamMap::new().with(RETURN_VALUE_KEY, ParamDef::new(SqlType::Int).with_value(0));
        let mut sp = Request::new(OperationKind::Procedure, "dbo.sp");
        sp.attach_params(&params).unwrap();
        assert!(sp.params().is_empty());
    }
}
