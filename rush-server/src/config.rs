use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Instance discriminator baked into every generated id; must fit
    /// in 8 bits.
    pub machine_id: u32,
    pub wordlist_path: String,
    pub fragments_path: String,
    pub countdown_ms: u64,
    pub connection_timeout_seconds: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            machine_id: env::var("MACHINE_ID")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .expect("Invalid MACHINE_ID"),
            wordlist_path: env::var("WORDLIST_PATH")
                .unwrap_or_else(|_| "./shared/words.txt".to_string()),
            fragments_path: env::var("FRAGMENTS_PATH")
                .unwrap_or_else(|_| "./shared/fragments.json".to_string()),
            countdown_ms: env::var("COUNTDOWN_MS")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("Invalid COUNTDOWN_MS"),
            connection_timeout_seconds: env::var("CONNECTION_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .expect("Invalid CONNECTION_TIMEOUT_SECONDS"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
