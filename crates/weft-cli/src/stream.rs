//! NDJSON message streaming.

use anyhow::Result as AnyhowResult;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use weft_runtime::engine::{ProcessingContext, RunOutcome, WorkflowRunner};
use weft_runtime::job::RunRequest;
use weft_runtime::message::Message;

/// Runs a job and writes each message to `out` as it is posted.
///
/// Messages still queued when the runner returns are flushed before the
/// outcome is reported, so the terminal `job_update` is always the last line.
pub async fn run_streaming<W>(
    runner: &WorkflowRunner,
    request: RunRequest,
    ctx: &ProcessingContext,
    out: &mut W,
) -> AnyhowResult<RunOutcome>
where
    W: AsyncWrite + Unpin,
{
    let run = runner.run(request, ctx);
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            biased;
            Some(message) = ctx.pop_message_async() => write_message(out, &message).await?,
            result = &mut run => break result,
        }
    };

    for message in ctx.drain_messages() {
        write_message(out, &message).await?;
    }
    out.flush().await?;
    Ok(result?)
}

async fn write_message<W>(out: &mut W, message: &Message) -> AnyhowResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = message.to_ndjson()?;
    line.push('\n');
    out.write_all(line.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}
