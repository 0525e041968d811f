//! Playback control handlers

use super::{number_arg, slider_fraction};
use crate::command::{DispatchError, HandlerContext};
use router_shared::{Args, Message};
use tracing::info;

const SPEED_MIN: f64 = 0.5;
const SPEED_MAX: f64 = 2.0;

/// Handle `skip_button_pressed`
///
/// `time` is the playback position the user skipped at; `x`/`y` are the
/// touch coordinates on the device screen.
pub fn handle_skip_button_pressed(
    ctx: &HandlerContext<'_>,
    args: &Args,
) -> Result<(), DispatchError> {
    let time = number_arg(ctx, args, "time")?;
    let x = number_arg(ctx, args, "x")?;
    let y = number_arg(ctx, args, "y")?;

    info!("  [SKIP] {} at {}s (touch {}, {})", ctx.token, time, x, y);
    ctx.parameters.send_parameter("skip", time);
    Ok(())
}

/// Handle `speed_changed`: slider position → playback speed
///
/// The applied speed is echoed back so the device can show it.
pub fn handle_speed_changed(ctx: &HandlerContext<'_>, args: &Args) -> Result<(), DispatchError> {
    let speed = SPEED_MIN + slider_fraction(ctx, args)? * (SPEED_MAX - SPEED_MIN);

    ctx.parameters.send_parameter("speed", speed);
    ctx.outbox
        .send(&Message::new(ctx.token, "speed").with_arg("speed", format!("{speed:.2}")));
    Ok(())
}
