use serde::Serialize;

use crate::client::{segment, Client};
use crate::error::Result;

/// Serializes to `{}`.
#[derive(Serialize)]
struct EmptyBody {}

impl Client {
    /// Star or unstar an item for the logged-in user.
    pub fn set_favorite(&self, item_id: &str, favorite: bool) -> Result<()> {
        let path = format!(
            "/Users/{}/FavoriteItems/{}",
            segment(self.user_id()?)?,
            segment(item_id)?
        );
        let params = self.default_params();
        let result = if favorite {
            self.post(&path, &params, &EmptyBody {})
        } else {
            self.delete(&path, &params)
        };
        result.map_err(|e| e.context("set favorite"))?;
        Ok(())
    }

    /// Ask the server to rescan its libraries.
    pub fn refresh_library(&self) -> Result<()> {
        self.post("/Library/Refresh", &self.default_params(), &EmptyBody {})
            .map_err(|e| e.context("refresh library"))?;
        Ok(())
    }
}
