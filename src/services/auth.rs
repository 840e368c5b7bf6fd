use crate::services::exchange::{DigestCredentials, OutboundRequest};
use crate::spec::{ApiKeyPlacement, AuthenticationSpec};
use crate::utils::template::{expand_template, Context};
use base64::Engine;
use md5::Md5;
use sha2::{Digest, Sha256};

fn resolve(template: Option<&String>, context: &Context) -> String {
    template
        .map(|raw| expand_template(raw, context))
        .unwrap_or_default()
}

pub fn apply_authentication(
    auth: &AuthenticationSpec,
    context: &Context,
    request: &mut OutboundRequest,
) {
    match auth {
        AuthenticationSpec::Basic(creds) => {
            let username = resolve(creds.username.as_ref(), context);
            let password = resolve(creds.password.as_ref(), context);
            let encoded = base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", username, password));
            request
                .headers
                .set("Authorization", format!("Basic {}", encoded));
        }
        AuthenticationSpec::Digest(creds) => {
            request.digest = Some(DigestCredentials {
                username: resolve(creds.username.as_ref(), context),
                password: resolve(creds.password.as_ref(), context),
            });
        }
        AuthenticationSpec::Bearer(bearer) => {
            let token = resolve(bearer.token.as_ref(), context);
            let value = if token.to_lowercase().starts_with("bearer ") {
                token
            } else {
                format!("Bearer {}", token)
            };
            request.headers.set("Authorization", value);
        }
        AuthenticationSpec::ApiKey(api_key) => {
            let key = resolve(api_key.key.as_ref(), context);
            if key.trim().is_empty() {
                return;
            }
            let value = resolve(api_key.value.as_ref(), context);
            request.secret_keys.push(key.clone());
            match api_key.placement {
                ApiKeyPlacement::Header => request.headers.set(key, value),
                ApiKeyPlacement::Query => request.append_query(&key, &value),
            }
        }
        AuthenticationSpec::Unsupported => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DigestAlgorithm {
    Md5,
    Md5Sess,
    Sha256,
    Sha256Sess,
}

impl DigestAlgorithm {
    fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(|r| r.trim().to_uppercase()).as_deref() {
            None | Some("MD5") => Some(DigestAlgorithm::Md5),
            Some("MD5-SESS") => Some(DigestAlgorithm::Md5Sess),
            Some("SHA-256") => Some(DigestAlgorithm::Sha256),
            Some("SHA-256-SESS") => Some(DigestAlgorithm::Sha256Sess),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Md5Sess => "MD5-sess",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha256Sess => "SHA-256-sess",
        }
    }

    fn hash(self, input: &str) -> String {
        match self {
            DigestAlgorithm::Md5 | DigestAlgorithm::Md5Sess => {
                hex::encode(Md5::digest(input.as_bytes()))
            }
            DigestAlgorithm::Sha256 | DigestAlgorithm::Sha256Sess => {
                hex::encode(Sha256::digest(input.as_bytes()))
            }
        }
    }

    fn is_session(self) -> bool {
        matches!(self, DigestAlgorithm::Md5Sess | DigestAlgorithm::Sha256Sess)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    realm: String,
    nonce: String,
    opaque: Option<String>,
    algorithm: DigestAlgorithm,
    qop_auth: bool,
}

fn parse_auth_params(raw: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = raw.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if *c == ',' || c.is_whitespace()) {
            chars.next();
        }
        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ',' {
                break;
            }
            key.push(c);
            chars.next();
        }
        if key.trim().is_empty() {
            break;
        }
        let mut value = String::new();
        if chars.peek() == Some(&'=') {
            chars.next();
            if chars.peek() == Some(&'"') {
                chars.next();
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        '"' => break,
                        _ => value.push(c),
                    }
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
        }
        params.push((key.trim().to_lowercase(), value.trim().to_string()));
    }
    params
}

impl DigestChallenge {
    pub fn parse(header: &str) -> Option<Self> {
        let trimmed = header.trim();
        let (scheme, rest) = trimmed.split_once(char::is_whitespace)?;
        if !scheme.eq_ignore_ascii_case("digest") {
            return None;
        }
        let params = parse_auth_params(rest);
        let get = |name: &str| {
            params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        };
        let qop_auth = get("qop")
            .map(|qop| qop.split(',').any(|item| item.trim().eq_ignore_ascii_case("auth")))
            .unwrap_or(false);
        Some(Self {
            realm: get("realm").unwrap_or_default(),
            nonce: get("nonce")?,
            opaque: get("opaque"),
            algorithm: DigestAlgorithm::parse(get("algorithm").as_deref())?,
            qop_auth,
        })
    }

    pub fn authorization(
        &self,
        credentials: &DigestCredentials,
        method: &str,
        uri: &str,
        cnonce: &str,
    ) -> String {
        let nc = "00000001";
        let algorithm = self.algorithm;
        let mut ha1 = algorithm.hash(&format!(
            "{}:{}:{}",
            credentials.username, self.realm, credentials.password
        ));
        if algorithm.is_session() {
            ha1 = algorithm.hash(&format!("{}:{}:{}", ha1, self.nonce, cnonce));
        }
        let ha2 = algorithm.hash(&format!("{}:{}", method.to_uppercase(), uri));
        let response = if self.qop_auth {
            algorithm.hash(&format!(
                "{}:{}:{}:{}:auth:{}",
                ha1, self.nonce, nc, cnonce, ha2
            ))
        } else {
            algorithm.hash(&format!("{}:{}:{}", ha1, self.nonce, ha2))
        };

        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", algorithm={}, response=\"{}\"",
            credentials.username,
            self.realm,
            self.nonce,
            uri,
            algorithm.label(),
            response
        );
        if self.qop_auth {
            header.push_str(&format!(", qop=auth, nc={}, cnonce=\"{}\"", nc, cnonce));
        }
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(", opaque=\"{}\"", opaque));
        }
        header
    }
}

pub fn generate_cnonce() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}
