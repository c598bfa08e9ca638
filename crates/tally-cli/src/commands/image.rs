use anyhow::Result;
use tally_core::ImageDetail;

use super::Context;

pub fn handle(ctx: &Context, width: u32, height: u32, detail: Option<String>) -> Result<()> {
    let detail = detail
        .as_deref()
        .map(ImageDetail::from)
        .unwrap_or(ctx.config.image.default_detail);

    let tokens = ctx.estimator.tokens_for_image(width, height, detail);
    println!("{}", tokens);
    Ok(())
}
