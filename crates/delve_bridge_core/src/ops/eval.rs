use crate::types::{
    EvalIn, EvalOut, EvalScope, ListFunctionArgsOut, ListLocalVarsOut, ListVarsIn, LoadConfig,
    Variable,
};
use crate::{DelveClient, DelveError, Result};

pub async fn eval(client: &mut DelveClient, scope: EvalScope, expr: &str) -> Result<Variable> {
    let out: EvalOut = client
        .call(
            "Eval",
            &EvalIn {
                scope,
                expr: expr.to_string(),
                cfg: Some(LoadConfig::default()),
            },
        )
        .await?;
    out.variable
        .ok_or_else(|| DelveError::InvalidResponse("expression evaluated to nothing".into()))
}

pub async fn locals(client: &mut DelveClient, scope: EvalScope) -> Result<Vec<Variable>> {
    let out: ListLocalVarsOut = client
        .call(
            "ListLocalVars",
            &ListVarsIn {
                scope,
                cfg: LoadConfig::default(),
            },
        )
        .await?;
    Ok(out.variables)
}

pub async fn args(client: &mut DelveClient, scope: EvalScope) -> Result<Vec<Variable>> {
    let out: ListFunctionArgsOut = client
        .call(
            "ListFunctionArgs",
            &ListVarsIn {
                scope,
                cfg: LoadConfig::default(),
            },
        )
        .await?;
    Ok(out.args)
}
