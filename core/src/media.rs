//! Binary media: images, stream URLs and lyrics.

use crate::client::{segment, Client};
use crate::error::Result;
use crate::http::HttpResponse;
use crate::params::keys;
use crate::types::Lyrics;

impl Client {
    /// Fetch an item image, e.g. `image_type = "Primary"`.
    ///
    /// The response body is the raw image; decoding it is up to the caller.
    pub fn item_image(&self, item_id: &str, image_type: &str, size: u32, quality: u32) -> Result<HttpResponse> {
        let mut params = self.default_params();
        params.set(keys::WIDTH, size.to_string());
        params.set(keys::QUALITY, quality.to_string());
        let path = format!("/Items/{}/Images/{}", segment(item_id)?, segment(image_type)?);
        self.get(&path, &params).map_err(|e| e.context("get item image"))
    }

    /// A pre-authorized URL an external player can stream directly.
    ///
    /// Fails only for an id that cannot form a path segment.
    pub fn stream_url(&self, item_id: &str) -> Result<String> {
        let mut params = self.default_params();
        params.set(keys::PLAY_SESSION_ID, self.session().device_id());
        params.set(keys::STATIC, "true");
        params.set(keys::API_KEY, self.session().token());
        let path = format!("/audio/{}/stream", segment(item_id)?);
        Ok(self.encode_url(&path, &params))
    }

    pub fn lyrics(&self, item_id: &str) -> Result<Lyrics> {
        let path = format!("/Audio/{}/Lyrics", segment(item_id)?);
        let response = self
            .get(&path, &self.default_params())
            .map_err(|e| e.context("get lyrics"))?;
        response.body.json().map_err(|e| e.context("decode lyrics"))
    }
}
