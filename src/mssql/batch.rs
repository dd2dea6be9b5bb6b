//! Compilation of a [`Request`] into the T-SQL text tiberius sends.
//!
//! tiberius binds values positionally as `@P1..@Pn`. Each attached parameter becomes a
//! local variable under its own name, initialised from its positional binding, so
//! statements can refer to `@AccountID` and procedures can be called with named and
//! `OUTPUT` arguments. Output values and the procedure return code are read back by a
//! trailer `SELECT` whose first column is [`OUTPUT_MARKER`].

use std::sync::LazyLock;

use regex::Regex;

use crate::error::TdsHelperError;
use crate::request::{BoundParam, OperationKind, Request};
use crate::types::RowValues;

/// First column of the trailer result set.
pub(crate) const OUTPUT_MARKER: &str = "__tds_helper_outputs";
const RETURN_VAR: &str = "@__tds_helper_rv";

static PARAM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_#][A-Za-z0-9_@#$]{0,127}$").expect("parameter name pattern")
});

static POSITIONAL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)p[0-9]+$").expect("positional name pattern"));

static PROCEDURE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    let part = r"(?:\[[^\]]+\]|[A-Za-z_#][A-Za-z0-9_@#$]*)";
    Regex::new(&format!(r"^{part}(?:\.{part}){{0,3}}$")).expect("procedure name pattern")
});

/// T-SQL text plus the values for its `@P1..@Pn` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledBatch {
    pub sql: String,
    pub binds: Vec<RowValues>,
}

pub(crate) fn compile(request: &Request) -> Result<CompiledBatch, TdsHelperError> {
    match request.kind() {
        OperationKind::Batch => Ok(CompiledBatch {
            sql: request.text().to_owned(),
            binds: Vec::new(),
        }),
        OperationKind::Statement => compile_statement(request),
        OperationKind::Procedure => compile_procedure(request),
    }
}

fn compile_statement(request: &Request) -> Result<CompiledBatch, TdsHelperError> {
    let (mut sql, binds) = declare_params(request.params())?;
    sql.push_str(request.text());
    if request.has_outputs() {
        sql.push('\n');
        push_trailer(&mut sql, "CAST(NULL AS INT)", request.params());
    }
    Ok(CompiledBatch { sql, binds })
}

fn compile_procedure(request: &Request) -> Result<CompiledBatch, TdsHelperError> {
    let procedure = request.text().trim();
    if !PROCEDURE_NAME.is_match(procedure) {
        return Err(TdsHelperError::ParameterError(format!(
            "invalid procedure name: {procedure}"
        )));
    }

    let (mut sql, binds) = declare_params(request.params())?;
    sql.push_str(&format!("DECLARE {RETURN_VAR} INT;\n"));
    sql.push_str(&format!("EXEC {RETURN_VAR} = {procedure}"));
    for (i, param) in request.params().iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        sql.push_str(&format!("{sep}@{0} = @{0}", param.name));
        if param.output {
            sql.push_str(" OUTPUT");
        }
    }
    sql.push_str(";\n");
    push_trailer(&mut sql, RETURN_VAR, request.params());
    Ok(CompiledBatch { sql, binds })
}

fn declare_params(params: &[BoundParam]) -> Result<(String, Vec<RowValues>), TdsHelperError> {
    let mut sql = String::new();
    let mut binds = Vec::with_capacity(params.len());

    for param in params {
        validate_param_name(&param.name)?;
        let decl = param.sql_type.declaration(&param.options, param.value.as_ref());
        match &param.value {
            Some(value) => {
                binds.push(value.clone());
                sql.push_str(&format!("DECLARE @{} {decl} = @P{};\n", param.name, binds.len()));
            }
            None => {
                sql.push_str(&format!("DECLARE @{} {decl};\n", param.name));
            }
        }
    }
    Ok((sql, binds))
}

fn push_trailer(sql: &mut String, marker_expr: &str, params: &[BoundParam]) {
    sql.push_str(&format!(";SELECT {marker_expr} AS [{OUTPUT_MARKER}]"));
    for param in params.iter().filter(|p| p.output) {
        sql.push_str(&format!(", @{0} AS [{0}]", param.name));
    }
    sql.push(';');
}

fn validate_param_name(name: &str) -> Result<(), TdsHelperError> {
    if !PARAM_NAME.is_match(name) || POSITIONAL_NAME.is_match(name) || name.starts_with("__tds_helper") {
        return Err(TdsHelperError::ParameterError(format!(
            "invalid parameter name: {name}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamDef, ParamMap};
    use crate::types::SqlType;

    fn request(kind: OperationKind, text: &str, params: &ParamMap) -> Request {
        let mut request = Request::new(kind, text);
        request.attach_params(params).unwrap();
        request
    }

    #[test]
    fn statement_declares_named_params() {
        let params = ParamMap::new()
            .with("AccountID", ParamDef::new(SqlType::Int).with_value(7))
            .with("UserName", ParamDef::new(SqlType::VarChar).length(50).with_value("ann"));
        let compiled = compile(&request(
            OperationKind::Statement,
            "delete from users where accountid = @AccountID and username = @UserName",
            &params,
        ))
        .unwrap();

        assert_eq!(
            compiled.sql,
            "DECLARE @AccountID INT = @P1;\n\
             DECLARE @UserName VARCHAR(50) = @P2;\n\
             delete from users where accountid = @AccountID and username = @UserName"
        );
        assert_eq!(compiled.binds, vec![RowValues::Int(7), RowValues::from("ann")]);
    }

    #[test]
    fn statement_with_output_gets_trailer() {
        let params = ParamMap::new().with("Total", ParamDef::new(SqlType::BigInt).output());
        let compiled = compile(&request(
            OperationKind::Statement,
            "select @Total = count(*) from t",
            &params,
        ))
        .unwrap();
        assert_eq!(
            compiled.sql,
            "DECLARE @Total BIGINT;\nselect @Total = count(*) from t\n\
             ;SELECT CAST(NULL AS INT) AS [__tds_helper_outputs], @Total AS [Total];"
        );
        assert!(compiled.binds.is_empty());
    }

    #[test]
    fn procedure_call_passes_named_and_output_args() {
        let params = ParamMap::new()
            .with("Name", ParamDef::new(SqlType::NVarChar).with_value("widget"))
            .with("NewId", ParamDef::new(SqlType::Int).output());
        let compiled = compile(&request(OperationKind::Procedure, "dbo.spAddObject", &params)).unwrap();
        assert_eq!(
            compiled.sql,
            "DECLARE @Name NVARCHAR(MAX) = @P1;\n\
             DECLARE @NewId INT;\n\
             DECLARE @__tds_helper_rv INT;\n\
             EXEC @__tds_helper_rv = dbo.spAddObject @Name = @Name, @NewId = @NewId OUTPUT;\n\
             ;SELECT @__tds_helper_rv AS [__tds_helper_outputs], @NewId AS [NewId];"
        );
    }

    #[test]
    fn procedure_without_params_still_reads_return_code() {
        let compiled =
            compile(&request(OperationKind::Procedure, "[dbo].[spPing]", &ParamMap::new())).unwrap();
        assert_eq!(
            compiled.sql,
            "DECLARE @__tds_helper_rv INT;\n\
             EXEC @__tds_helper_rv = [dbo].[spPing];\n\
             ;SELECT @__tds_helper_rv AS [__tds_helper_outputs];"
        );
    }

    #[test]
    fn batch_is_sent_verbatim() {
        let params = ParamMap::new().with("x", ParamDef::new(SqlType::Int).with_value(1));
        let compiled = compile(&request(OperationKind::Batch, "select 1; select 2", &params)).unwrap();
        assert_eq!(compiled.sql, "select 1; select 2");
        assert!(compiled.binds.is_empty());
    }

    #[test]
    fn rejects_unsafe_names() {
        let bad_param = ParamMap::new().with("x; drop table t", ParamDef::new(SqlType::Int).with_value(1));
        assert!(compile(&request(OperationKind::Statement, "select 1", &bad_param)).is_err());

        let positional = ParamMap::new().with("P1", ParamDef::new(SqlType::Int).with_value(1));
        assert!(compile(&request(OperationKind::Statement, "select 1", &positional)).is_err());

        assert!(compile(&request(OperationKind::Procedure, "sp; drop table t", &ParamMap::new())).is_err());
    }
}
