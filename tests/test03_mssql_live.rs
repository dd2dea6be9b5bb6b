//! Runs against a real SQL Server when `MSSQL_SERVER` (and the other `MSSQL_*`
//! variables read by `MssqlOptions::from_env`) are set; otherwise every test is a no-op.

use serde_json::json;
use tds_helper::prelude::*;

fn live_options() -> Option<MssqlOptions> {
    if std::env::var("MSSQL_SERVER").is_err() {
        eprintln!("MSSQL_SERVER not set; skipping live test");
        return None;
    }
    Some(MssqlOptions::from_env().unwrap())
}

#[tokio::test]
async fn statement_with_parameters() -> Result<(), Box<dyn std::error::Error>> {
    let Some(options) = live_options() else {
        return Ok(());
    };

    let params = ParamMap::new()
        .with("Id", ParamDef::new(SqlType::Int).required())
        .with("Name", ParamDef::new(SqlType::NVarChar).length(50));
    let params = merge(&params, &ValueMap::new().with("id", 5).with("name", "ann"))?;

    let result = exec_sql(&options, "select @Id as id, @Name as name", &params).await?;
    assert_eq!(result.output.into_json(), json!([{"id": 5, "name": "ann"}]));
    Ok(())
}

#[tokio::test]
async fn for_json_output_is_decoded() -> Result<(), Box<dyn std::error::Error>> {
    let Some(options) = live_options() else {
        return Ok(());
    };

    let result = exec_sql(
        &options,
        "select 1 as a, 'x' as b for json path",
        &ParamMap::new(),
    )
    .await?;
    assert_eq!(result.output, QueryOutput::Json(json!([{"a": 1, "b": "x"}])));
    Ok(())
}

#[tokio::test]
async fn output_parameter_is_written_back() -> Result<(), Box<dyn std::error::Error>> {
    let Some(options) = live_options() else {
        return Ok(());
    };

    let params = ParamMap::new()
        .with("In", ParamDef::new(SqlType::Int).with_value(20))
        .with("Out", ParamDef::new(SqlType::Int).output());

    let result = exec_sql(&options, "set @Out = @In + 1", &params).await?;
    assert_eq!(result.params.value("Out"), Some(&RowValues::Int(21)));
    assert_eq!(result.return_value(), None);
    Ok(())
}

#[tokio::test]
async fn procedure_return_code() -> Result<(), Box<dyn std::error::Error>> {
    let Some(options) = live_options() else {
        return Ok(());
    };

    exec_sql_batch(
        &options,
        "create or alter procedure dbo.tds_helper_probe @x int, @y int output as \
         begin set @y = @x * 2; select @x as x; return 7; end",
    )
    .await?;

    let params = ParamMap::new()
        .with("x", ParamDef::new(SqlType::Int).with_value(4))
        .with("y", ParamDef::new(SqlType::Int).output());
    let result = exec_sp(&options, "dbo.tds_helper_probe", &params).await?;

    assert_eq!(result.return_value(), Some(7));
    assert_eq!(result.params.value("y"), Some(&RowValues::Int(8)));
    assert_eq!(result.output.into_json(), json!([{"x": 4}]));

    exec_sql_batch(&options, "drop procedure dbo.tds_helper_probe").await?;
    Ok(())
}

#[tokio::test]
async fn driver_errors_are_preserved() {
    let Some(options) = live_options() else {
        return;
    };

    let err = exec_sql_batch(&options, "select * from dbo.no_such_table_tds_helper")
        .await
        .unwrap_err();
    assert!(matches!(err, TdsHelperError::MssqlError(_)));
}
