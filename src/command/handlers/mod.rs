//! Built-in action handlers

mod effects;
mod playback;

pub use effects::{handle_contrast_changed, handle_seekbar_changed};
pub use playback::{handle_skip_button_pressed, handle_speed_changed};

use super::{DispatchError, HandlerContext, HandlerTable, RegistrationError};
use router_shared::Args;

/// Full-scale value of the slider controls on the devices
pub const SLIDER_MAX: f64 = 255.0;

/// Bind the built-in handlers to their triggers
pub fn register_defaults(table: &mut HandlerTable) -> Result<(), RegistrationError> {
    table.register("skip_button_pressed", &["time", "x", "y"], handle_skip_button_pressed)?;
    table.register("seekbar_changed", &["progress"], handle_seekbar_changed)?;
    table.register("contrast_changed", &["progress"], handle_contrast_changed)?;
    table.register("speed_changed", &["progress"], handle_speed_changed)?;
    Ok(())
}

/// Read a numeric argument
fn number_arg(ctx: &HandlerContext<'_>, args: &Args, key: &str) -> Result<f64, DispatchError> {
    let raw = args.get(key).ok_or_else(|| DispatchError::MissingArgument {
        trigger: ctx.trigger.to_owned(),
        key: key.to_owned(),
    })?;

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DispatchError::InvalidArgument {
            key: key.to_owned(),
            value: raw.clone(),
        }),
    }
}

/// Read a slider position as a fraction of full scale, clamped to [0, 1]
fn slider_fraction(ctx: &HandlerContext<'_>, args: &Args) -> Result<f64, DispatchError> {
    let progress = number_arg(ctx, args, "progress")?;
    Ok((progress / SLIDER_MAX).clamp(0.0, 1.0))
}
