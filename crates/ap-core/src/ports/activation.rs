use crate::pass::ScannableCode;

/// Surface that displays the scannable code to the user.
pub trait ActivationSurfacePort: Send + Sync {
    fn show(&self, code: &ScannableCode);
}
