use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow};
use tally_core::{Usage, parse_messages};
use tally_engine::{PromptAccountant, StaticImageProbe};

use super::{Context, text_or_stdin};

pub fn text(ctx: &Context, text: Option<String>) -> Result<()> {
    let text = text_or_stdin(text)?;
    let count = ctx.estimator.tokens_for_text(&text, &ctx.model)?;
    println!("{}", count);
    Ok(())
}

pub async fn messages(
    ctx: &Context,
    file: PathBuf,
    images: Vec<String>,
    completion: Option<String>,
    json: bool,
) -> Result<()> {
    let raw = if file.as_os_str() == "-" {
        text_or_stdin(None)?
    } else {
        std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?
    };
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("Messages file is not valid JSON")?;
    let messages = parse_messages(&value)?;

    let mut probe = StaticImageProbe::new();
    for spec in &images {
        let (url, width, height) = parse_image_size(spec)?;
        probe.insert(url, width, height);
    }

    let accountant = PromptAccountant::new(ctx.estimator.clone(), Arc::new(probe))
        .with_default_detail(ctx.config.image.default_detail);

    if let Some(completion) = completion {
        let usage = accountant.usage(&messages, &completion, &ctx.model).await?;
        println!("{}", render_usage(&usage, json)?);
        return Ok(());
    }

    let usage = accountant.account(&messages, &ctx.model).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&usage)?);
        return Ok(());
    }

    println!("Messages: {}", messages.len());
    println!("  Text tokens: {}", usage.text_tokens);
    println!("  Image tokens: {}", usage.image_tokens);
    for charge in &usage.images {
        println!(
            "    [message {}] {}x{} ({}): {}",
            charge.message_index, charge.width, charge.height, charge.detail, charge.tokens
        );
    }
    if usage.skipped_images > 0 {
        println!("  Images without size: {}", usage.skipped_images);
    }
    println!("  Total: {}", usage.total_tokens);

    Ok(())
}

fn render_usage(usage: &Usage, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(usage)?);
    }
    Ok(format!(
        "Prompt tokens: {}\nCompletion tokens: {}\nTotal: {}",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    ))
}

/// Parse `URL=WIDTHxHEIGHT`. The size is taken after the last `=`, so base64 padding in
/// data URLs is left alone.
fn parse_image_size(spec: &str) -> Result<(String, u32, u32)> {
    let (url, size) = spec
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("Expected URL=WIDTHxHEIGHT, got: {}", spec))?;
    let (width, height) = size
        .split_once('x')
        .ok_or_else(|| anyhow!("Invalid image size: {}", size))?;

    let width = width
        .parse()
        .with_context(|| format!("Invalid image width: {}", width))?;
    let height = height
        .parse()
        .with_context(|| format!("Invalid image height: {}", height))?;

    if url.is_empty() {
        return Err(anyhow!("Missing image URL in: {}", spec));
    }

    Ok((url.to_string(), width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_usage_follows_json_flag() {
        let usage = Usage::new(12, 5);

        assert_eq!(
            render_usage(&usage, false).unwrap(),
            "Prompt tokens: 12\nCompletion tokens: 5\nTotal: 17"
        );

        let value: serde_json::Value =
            serde_json::from_str(&render_usage(&usage, true).unwrap()).unwrap();
        assert_eq!(value["prompt_tokens"], 12);
        assert_eq!(value["completion_tokens"], 5);
        assert_eq!(value["total_tokens"], 17);
    }

    #[test]
    fn test_parse_image_size() {
        let (url, w, h) = parse_image_size("https://example.com/a.png=640x480").unwrap();
        assert_eq!(url, "https://example.com/a.png");
        assert_eq!((w, h), (640, 480));
    }

    #[test]
    fn test_parse_image_size_keeps_base64_padding() {
        let (url, w, h) = parse_image_size("data:image/png;base64,iVBORw0KGgo==10x20").unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!((w, h), (10, 20));
    }

    #[test]
    fn test_parse_image_size_rejects_garbage() {
        assert!(parse_image_size("no-size").is_err());
        assert!(parse_image_size("u=10").is_err());
        assert!(parse_image_size("u=axb").is_err());
        assert!(parse_image_size("=10x10").is_err());
    }
}
