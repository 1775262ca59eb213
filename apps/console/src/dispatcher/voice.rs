//! Voice intake.
//!
//! Audio capture is not implemented. The voice channel substitutes a fixed transcript and
//! forwards it through the text path, so callers get a real extraction result back.

use tracing::info;

use crate::dispatcher::IntakeBackend;
use crate::errors::RequestError;
use crate::models::ExtractionResult;

/// Transcript submitted in place of recorded audio.
pub const CANNED_TRANSCRIPT: &str =
    "Voice recording: Looking for a cloud infrastructure engineer with AWS and Terraform experience.";

pub async fn simulate_voice_input<B>(backend: &B) -> Result<ExtractionResult, RequestError>
where
    B: IntakeBackend + ?Sized,
{
    info!("voice capture not implemented; submitting canned transcript");
    backend.submit_text(CANNED_TRANSCRIPT).await
}
