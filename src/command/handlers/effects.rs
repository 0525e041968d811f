//! Visual effect handlers driven by slider controls

use super::slider_fraction;
use crate::command::{DispatchError, HandlerContext};
use router_shared::Args;
use tracing::debug;

/// Feedback never goes fully to 100%; the effect runs away above this
const FEEDBACK_MAX: f64 = 0.9;

/// Handle `seekbar_changed`: slider position → feedback amount
pub fn handle_seekbar_changed(ctx: &HandlerContext<'_>, args: &Args) -> Result<(), DispatchError> {
    let feedback = slider_fraction(ctx, args)? * FEEDBACK_MAX;

    debug!("  [FEEDBACK] {} -> {:.3}", ctx.token, feedback);
    ctx.parameters.send_parameter("feedback", feedback);
    Ok(())
}

/// Handle `contrast_changed`: slider position → contrast
pub fn handle_contrast_changed(ctx: &HandlerContext<'_>, args: &Args) -> Result<(), DispatchError> {
    let contrast = slider_fraction(ctx, args)?;

    debug!("  [CONTRAST] {} -> {:.3}", ctx.token, contrast);
    ctx.parameters.send_parameter("contrast", contrast);
    Ok(())
}
