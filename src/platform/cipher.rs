//! Signature cipher deciphering for video platform

use crate::core::video_info::VideoId;
use crate::error::YtdrError;
use crate::platform::client::VideoClient;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

/// Turns an obfuscated signature cipher blob into a directly fetchable URL
#[async_trait]
pub trait CipherResolver: Send + Sync {
    /// Resolve a cipher blob, failing with [`YtdrError::CipherDecodeFailed`]
    async fn resolve(&self, cipher: &str) -> Result<String, YtdrError>;
}

/// One step of a signature transformation program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherOp {
    /// Reverse the whole signature
    Reverse,
    /// Drop the first N characters
    Splice(usize),
    /// Swap the first character with the one at N modulo length
    Swap(usize),
}

impl CipherOp {
    fn apply(&self, chars: &mut Vec<char>) {
        match *self {
            CipherOp::Reverse => chars.reverse(),
            CipherOp::Splice(n) => {
                let n = n.min(chars.len());
                chars.drain(..n);
            }
            CipherOp::Swap(n) => {
                if !chars.is_empty() {
                    let idx = n % chars.len();
                    chars.swap(0, idx);
                }
            }
        }
    }
}

/// Signature cipher with a known transformation program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCipher {
    ops: Vec<CipherOp>,
}

impl SignatureCipher {
    /// Create a cipher from a transformation program
    pub fn new(ops: Vec<CipherOp>) -> Self {
        Self { ops }
    }

    /// Apply the transformation program to a signature
    pub fn decipher_signature(&self, signature: &str) -> String {
        let mut chars: Vec<char> = signature.chars().collect();
        for op in &self.ops {
            op.apply(&mut chars);
        }
        chars.into_iter().collect()
    }

    /// Derive the transformation program from the player script
    pub fn from_player_script(player_js: &str) -> Result<Self, YtdrError> {
        // Step 1: find the function that splits its argument and joins it back
        let fn_regex = Regex::new(
            r#"function\s*([a-zA-Z0-9$]*)\s*\(\s*([a-zA-Z0-9$]+)\s*\)\s*\{([\s\S]*?)\}"#,
        )?;

        let (param, body) = fn_regex
            .captures_iter(player_js)
            .filter_map(|captures| {
                let param = captures.get(2)?.as_str();
                let body = captures.get(3)?.as_str();
                let splits = body.contains(&format!("{}.split(\"\")", param));
                let joins = body.contains(&format!("return {}.join(\"\")", param));
                (splits && joins).then(|| (param.to_string(), body.to_string()))
            })
            .next()
            .ok_or_else(|| cipher_failed("could not find decipher function"))?;

        // Step 2: the helper object is whatever the body calls methods on
        let obj_name_regex = Regex::new(&format!(
            r#"([a-zA-Z0-9$]+)\.[a-zA-Z0-9$]+\({}(?:,\s*\d+)?\)"#,
            regex::escape(&param)
        ))?;
        let obj_name = obj_name_regex
            .captures(&body)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| cipher_failed("could not find transform object name"))?;

        // Step 3: the helper object literal
        let obj_regex = Regex::new(&format!(
            r#"(?:var|let|const)\s+{}\s*=\s*\{{([\s\S]*?)\}};"#,
            regex::escape(&obj_name)
        ))?;
        let obj_body = obj_regex
            .captures(player_js)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| cipher_failed("could not find transform object"))?;

        // Step 4: classify helpers by what their bodies do
        let helper_regex = Regex::new(
            r#"([a-zA-Z0-9$]+)\s*:\s*function\s*\([a-zA-Z0-9$]+(?:\s*,\s*[a-zA-Z0-9$]+)?\)\s*\{([\s\S]*?)\}"#,
        )?;
        let mut helpers: HashMap<String, fn(usize) -> CipherOp> = HashMap::new();
        for captures in helper_regex.captures_iter(&obj_body) {
            let (Some(name), Some(helper_body)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            let helper_body = helper_body.as_str();
            let op: fn(usize) -> CipherOp = if helper_body.contains(".reverse()") {
                |_| CipherOp::Reverse
            } else if helper_body.contains(".splice(") {
                CipherOp::Splice
            } else if helper_body.contains("[0]") && helper_body.contains(".length]") {
                CipherOp::Swap
            } else {
                continue;
            };
            helpers.insert(name.as_str().to_string(), op);
        }

        if helpers.is_empty() {
            return Err(cipher_failed("no transform operations found"));
        }

        // Step 5: ordered calls with their numeric arguments
        let call_regex = Regex::new(&format!(
            r#"{}\.([a-zA-Z0-9$]+)\({}(?:,\s*(\d+))?\)"#,
            regex::escape(&obj_name),
            regex::escape(&param)
        ))?;
        let mut ops = Vec::new();
        for captures in call_regex.captures_iter(&body) {
            let Some(op) = captures.get(1).and_then(|m| helpers.get(m.as_str())) else {
                continue;
            };
            let arg = captures
                .get(2)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .unwrap_or(0);
            ops.push(op(arg));
        }

        if ops.is_empty() {
            return Err(cipher_failed("no transform steps found"));
        }

        debug!("Extracted cipher program: {:?}", ops);
        Ok(Self::new(ops))
    }

    /// Resolve a cipher blob (`s`, `sp`, `url` query parameters) into a URL
    pub fn resolve_blob(&self, cipher: &str) -> Result<String, YtdrError> {
        let params: HashMap<String, String> = url::form_urlencoded::parse(cipher.as_bytes())
            .into_owned()
            .collect();

        let base_url = params
            .get("url")
            .ok_or_else(|| cipher_failed("cipher has no url"))?;
        let signature = params
            .get("s")
            .ok_or_else(|| cipher_failed("cipher has no signature"))?;
        let signature_param = params
            .get("sp")
            .map(String::as_str)
            .unwrap_or("signature");

        let mut url = Url::parse(base_url).map_err(|e| cipher_failed(&e.to_string()))?;
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != signature_param)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair(signature_param, &self.decipher_signature(signature));

        Ok(url.into())
    }
}

#[async_trait]
impl CipherResolver for SignatureCipher {
    async fn resolve(&self, cipher: &str) -> Result<String, YtdrError> {
        self.resolve_blob(cipher)
    }
}

/// Cipher resolver that derives its program from the video's player script.
///
/// The script is fetched lazily on the first protected stream and reused for
/// the rest of the session.
pub struct PlayerScriptCipher {
    client: VideoClient,
    video_id: VideoId,
    cipher: OnceCell<SignatureCipher>,
}

impl PlayerScriptCipher {
    pub fn new(client: VideoClient, video_id: VideoId) -> Self {
        Self {
            client,
            video_id,
            cipher: OnceCell::new(),
        }
    }

    /// Find the player script URL in a watch page
    pub fn player_js_url(&self, html: &str) -> Result<String, YtdrError> {
        let player_js_regex = Regex::new(r#""(?:jsUrl|PLAYER_JS_URL)"\s*:\s*"([^"]+)""#)?;
        let raw = player_js_regex
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().replace("\\/", "/"))
            .ok_or_else(|| cipher_failed("player script URL not found"))?;

        let url = if raw.starts_with("//") {
            format!("https:{}", raw)
        } else if raw.starts_with('/') {
            format!("{}{}", self.client.config().watch_base.trim_end_matches('/'), raw)
        } else {
            raw
        };
        Ok(url)
    }

    async fn load(&self) -> Result<SignatureCipher, YtdrError> {
        let watch_url = self.client.watch_url(&self.video_id);
        let html = self.client.fetch_text(&watch_url).await?;
        let player_js_url = self.player_js_url(&html)?;
        debug!("Player script: {}", player_js_url);

        let player_js = self.client.fetch_text(&player_js_url).await?;
        SignatureCipher::from_player_script(&player_js)
    }
}

#[async_trait]
impl CipherResolver for PlayerScriptCipher {
    async fn resolve(&self, cipher: &str) -> Result<String, YtdrError> {
        let signature_cipher = self
            .cipher
            .get_or_try_init(|| self.load())
            .await
            .map_err(|e| match e {
                YtdrError::CipherDecodeFailed(_) => e,
                other => cipher_failed(&other.to_string()),
            })?;
        signature_cipher.resolve_blob(cipher)
    }
}

fn cipher_failed(reason: &str) -> YtdrError {
    YtdrError::CipherDecodeFailed(reason.to_string())
}
