// src/endsession.rs

use crate::backchannel::BackChannelLogoutClient;
use crate::error::NilaLogoutError;
use crate::frontchannel::FrontChannelHtmlRenderer;
use crate::model::EndSessionCallbackValidationResult;
use http::{Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, instrument};

/// The response to the end-session callback.
///
/// A failed validation yields 400 and notifies nobody. A successful one hands
/// the back-channel targets to the logout client and answers 200 with the
/// front-channel page, whatever happens to the back-channel deliveries.
pub struct EndSessionCallbackResult {
    result: EndSessionCallbackValidationResult,
    back_channel_client: Arc<dyn BackChannelLogoutClient>,
}

impl EndSessionCallbackResult {
    pub fn new(
        result: EndSessionCallbackValidationResult,
        back_channel_client: Arc<dyn BackChannelLogoutClient>,
    ) -> Self {
        Self {
            result,
            back_channel_client,
        }
    }

    #[instrument(skip(self), fields(is_error = self.result.is_error()), err)]
    pub async fn execute(&self) -> Result<Response<String>, NilaLogoutError> {
        if self.result.is_error() {
            debug!("End-session callback validation failed.");
            let response = Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(String::new())?;
            return Ok(response);
        }

        let back_channel_logouts = self.result.back_channel_logouts().to_vec();
        debug!(count = back_channel_logouts.len(), "Sending back-channel logouts.");
        self.back_channel_client.send_logouts(back_channel_logouts).await;

        let urls = self.result.front_channel_logout_urls();
        debug!(count = urls.len(), "Rendering front-channel logout page.");
        FrontChannelHtmlRenderer::response(urls)
    }
}
