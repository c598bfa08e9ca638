use anyhow::Result;

use super::{Context, text_or_stdin};

pub fn handle(ctx: &Context, text: Option<String>, max_tokens: Option<usize>) -> Result<()> {
    let text = text_or_stdin(text)?;
    let max_tokens = max_tokens.unwrap_or(ctx.config.budget_tokens);

    let result = ctx.estimator.truncate(&text, max_tokens, &ctx.model)?;
    tracing::debug!(
        max_tokens,
        token_count = result.token_count,
        reason = %result.reason,
        "truncated"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
