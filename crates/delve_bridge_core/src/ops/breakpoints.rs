use crate::types::{
    Breakpoint, BreakpointOut, ClearBreakpointIn, CreateBreakpointIn, EvalScope, FindLocationIn,
    FindLocationOut, ListBreakpointsIn, ListBreakpointsOut, Location,
};
use crate::{DelveClient, DelveError, Result};

const CONDITION_SEPARATOR: &str = " if ";

/// Splits `"<locspec> if <cond>"` into its parts. The engine's location
/// resolver rejects conditions, so this has to happen before `FindLocation`.
pub fn split_condition(spec: &str) -> (String, Option<String>) {
    match spec.find(CONDITION_SEPARATOR) {
        Some(idx) => {
            let loc = spec[..idx].trim().to_string();
            let cond = spec[idx + CONDITION_SEPARATOR.len()..].trim();
            let cond = (!cond.is_empty()).then(|| cond.to_string());
            (loc, cond)
        }
        None => (spec.trim().to_string(), None),
    }
}

pub async fn find_location(
    client: &mut DelveClient,
    scope: EvalScope,
    loc: &str,
) -> Result<Vec<Location>> {
    let out: FindLocationOut = client
        .call(
            "FindLocation",
            &FindLocationIn {
                scope,
                loc: loc.to_string(),
                include_non_executable_lines: false,
                substitute_path_rules: Vec::new(),
            },
        )
        .await?;
    Ok(out.locations)
}

pub async fn create_breakpoint(client: &mut DelveClient, bp: Breakpoint) -> Result<Breakpoint> {
    let out: BreakpointOut = client
        .call("CreateBreakpoint", &CreateBreakpointIn { breakpoint: bp })
        .await?;
    Ok(out.breakpoint)
}

/// Resolves `spec` (optionally carrying `if <cond>`) and creates one
/// breakpoint per resolved address. Inlined or generic code can resolve to
/// several addresses, so several ids may come back for one spec.
pub async fn set_breakpoint(
    client: &mut DelveClient,
    scope: EvalScope,
    spec: &str,
) -> Result<Vec<Breakpoint>> {
    let (loc, cond) = split_condition(spec);
    if loc.is_empty() {
        return Err(DelveError::Request(
            "usage: break <locspec> [if <condition>]".into(),
        ));
    }

    let locations = find_location(client, scope, &loc).await?;
    if locations.is_empty() {
        return Err(DelveError::Request(format!("no location found for {loc:?}")));
    }

    let mut created = Vec::with_capacity(locations.len());
    for location in &locations {
        let Some(addr) = location.address() else {
            tracing::debug!("skipping {}:{} without address", location.file, location.line);
            continue;
        };
        let bp = Breakpoint {
            addr,
            file: location.file.clone(),
            line: location.line,
            cond: cond.clone().unwrap_or_default(),
            ..Breakpoint::default()
        };
        created.push(create_breakpoint(client, bp).await?);
    }

    if created.is_empty() {
        return Err(DelveError::Request(format!(
            "no executable address found for {loc:?}"
        )));
    }
    Ok(created)
}

pub async fn list_breakpoints(client: &mut DelveClient, all: bool) -> Result<Vec<Breakpoint>> {
    let out: ListBreakpointsOut = client
        .call("ListBreakpoints", &ListBreakpointsIn { all })
        .await?;
    Ok(out.breakpoints)
}

/// Removes breakpoint `id`; the engine rejects unknown ids.
pub async fn clear_breakpoint(client: &mut DelveClient, id: i64) -> Result<Breakpoint> {
    let out: BreakpointOut = client
        .call(
            "ClearBreakpoint",
            &ClearBreakpointIn {
                id,
                name: String::new(),
            },
        )
        .await?;
    Ok(out.breakpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_condition_plain_location() {
        assert_eq!(
            split_condition("pipeline.go:28"),
            ("pipeline.go:28".to_string(), None)
        );
    }

    #[test]
    fn test_split_condition_with_clause() {
        assert_eq!(
            split_condition("pipeline.go:28 if start == 12"),
            ("pipeline.go:28".to_string(), Some("start == 12".to_string()))
        );
    }

    #[test]
    fn test_split_condition_keeps_nested_if_in_condition() {
        let (loc, cond) = split_condition("main.main if x == 1 if y");
        assert_eq!(loc, "main.main");
        assert_eq!(cond.as_deref(), Some("x == 1 if y"));
    }

    #[test]
    fn test_split_condition_empty_clause() {
        assert_eq!(
            split_condition("main.go:5 if  "),
            ("main.go:5".to_string(), None)
        );
    }
}
