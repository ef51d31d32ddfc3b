use crate::config::AppConfig;
use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::{Error as JwtError, ErrorKind},
};
use serde::{Deserialize, Serialize};

/// 令牌类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,           // 用户 ID
    pub role: String,          // 用户角色
    pub token_type: TokenKind, // access 或 refresh
    pub exp: usize,            // 过期时间戳
    pub iat: usize,            // 签发时间戳
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, JwtError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| ErrorKind::InvalidToken.into())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct JwtUtils;

impl JwtUtils {
    fn get_secret() -> &'static str {
        &AppConfig::get().jwt.secret
    }

    // 生成 Access Token
    pub fn generate_access_token(user_id: i64, role: &str) -> Result<String, JwtError> {
        let config = AppConfig::get();
        Self::encode_with_secret(
            Self::get_secret(),
            user_id,
            role,
            TokenKind::Access,
            chrono::Duration::minutes(config.jwt.access_token_expiry),
        )
    }

    // 生成 Refresh Token，未指定有效期时使用默认天数
    pub fn generate_refresh_token(
        user_id: i64,
        role: &str,
        token_expiry: Option<chrono::Duration>,
    ) -> Result<String, JwtError> {
        let expiry = token_expiry.unwrap_or_else(|| {
            chrono::Duration::days(AppConfig::get().jwt.refresh_token_expiry)
        });
        Self::encode_with_secret(Self::get_secret(), user_id, role, TokenKind::Refresh, expiry)
    }

    pub fn generate_token_pair(
        user_id: i64,
        role: &str,
        refresh_token_expiry: Option<chrono::Duration>,
    ) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: Self::generate_access_token(user_id, role)?,
            refresh_token: Self::generate_refresh_token(user_id, role, refresh_token_expiry)?,
        })
    }

    pub fn encode_with_secret(
        secret: &str,
        user_id: i64,
        role: &str,
        kind: TokenKind,
        expiry: chrono::Duration,
    ) -> Result<String, JwtError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            token_type: kind,
            exp: (now + expiry).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// 校验签名、过期时间和令牌类型
    pub fn decode_with_secret(
        secret: &str,
        token: &str,
        expected: TokenKind,
    ) -> Result<Claims, JwtError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?
        .claims;
        if claims.token_type != expected {
            return Err(ErrorKind::InvalidToken.into());
        }
        Ok(claims)
    }

    pub fn verify_access_token(token: &str) -> Result<Claims, JwtError> {
        Self::decode_with_secret(Self::get_secret(), token, TokenKind::Access)
    }

    pub fn verify_refresh_token(token: &str) -> Result<Claims, JwtError> {
        Self::decode_with_secret(Self::get_secret(), token, TokenKind::Refresh)
    }

    /// 创建 Refresh Token Cookie，有效期与令牌一致
    pub fn create_refresh_token_cookie(refresh_token: &str, remember_me: bool) -> Cookie<'static> {
        let config = AppConfig::get();
        let days = if remember_me {
            config.jwt.refresh_token_remember_me_expiry
        } else {
            config.jwt.refresh_token_expiry
        };
        Cookie::build("refresh_token", refresh_token.to_string())
            .path("/api/v1/auth")
            .max_age(actix_web::cookie::time::Duration::days(days))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.is_production())
            .finish()
    }

    /// 创建空的 Refresh Token Cookie（用于注销）
    pub fn create_empty_refresh_token_cookie() -> Cookie<'static> {
        Cookie::build("refresh_token", "")
            .path("/api/v1/auth")
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(AppConfig::get().is_production())
            .finish()
    }

    pub fn extract_refresh_token_from_cookie(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie("refresh_token")
            .map(|cookie| cookie.value().to_string())
    }
}
