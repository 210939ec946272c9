/// Upload session management
///
/// A visit to a personal landing URL mints an opaque token bound to the
/// resolved display name. Upload requests present that token as a bearer
/// credential, and the handlers resolve the uploader explicitly from it
/// instead of from any ambient per-request state.
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Length of session tokens in characters
const TOKEN_LENGTH: usize = 32;

const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// In-memory token-to-owner table
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, String>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new session token bound to a display name
    pub async fn create(&self, display_name: &str) -> String {
        let token = Self::generate_token();
        self.sessions
            .write()
            .await
            .insert(token.clone(), display_name.to_string());
        token
    }

    /// Resolve a token to the display name it was minted for
    pub async fn resolve(&self, token: &str) -> Option<String> {
        self.sessions.read().await.get(token).cloned()
    }

    fn generate_token() -> String {
        let mut rng = rand::thread_rng();
        (0..TOKEN_LENGTH)
            .map(|_| {
                let idx = rng.gen_range(0..TOKEN_CHARSET.len());
                TOKEN_CHARSET[idx] as char
            })
            .collect()
    }
}
