use reqwest::multipart::{Form, Part};
use reqwest::Response;

use super::constants::CLIENT_REQUEST_TIMEOUT;
use super::server::TestServer;

/// HTTP client for talking to a [`TestServer`].
pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(server: &TestServer) -> Self {
        let client = reqwest::Client::builder()
            .timeout(CLIENT_REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create test HTTP client");
        Self {
            client,
            base_url: server.base_url.clone(),
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// Submit the music form with a text description.
    pub async fn post_music_text(&self, text: &str) -> Response {
        let form = Form::new().text("text", text.to_string());
        self.post_music(form).await
    }

    /// Submit the music form with an uploaded image.
    pub async fn post_music_image(&self, bytes: &[u8]) -> Response {
        let part = Part::bytes(bytes.to_vec()).file_name("upload.png");
        let form = Form::new().part("image", part);
        self.post_music(form).await
    }

    /// Submit the music form with no fields filled in.
    pub async fn post_music_empty(&self) -> Response {
        self.post_music(Form::new()).await
    }

    async fn post_music(&self, form: Form) -> Response {
        self.client
            .post(format!("{}/music", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("POST /music request failed")
    }
}
