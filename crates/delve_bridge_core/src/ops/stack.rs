use crate::types::{
    Goroutine, ListGoroutinesIn, ListGoroutinesOut, Stackframe, StacktraceIn, StacktraceOut,
};
use crate::{DelveClient, Result};

pub const DEFAULT_STACK_DEPTH: i64 = 20;
pub const DEFAULT_GOROUTINE_COUNT: i64 = 100;

pub async fn stacktrace(
    client: &mut DelveClient,
    goroutine_id: i64,
    depth: i64,
) -> Result<Vec<Stackframe>> {
    let out: StacktraceOut = client
        .call(
            "Stacktrace",
            &StacktraceIn {
                id: goroutine_id,
                depth,
                full: false,
                defers: false,
                opts: 0,
                cfg: None,
            },
        )
        .await?;
    Ok(out.locations)
}

pub async fn goroutines(
    client: &mut DelveClient,
    start: i64,
    count: i64,
) -> Result<Vec<Goroutine>> {
    let out: ListGoroutinesOut = client
        .call("ListGoroutines", &ListGoroutinesIn { start, count })
        .await?;
    Ok(out.goroutines)
}
