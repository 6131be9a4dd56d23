use crate::{
    database::{MongoDB, USERS},
    models::{User, UserInfo, ROLE_USER},
    services::geoip_service::GeoIpClient,
    utils::{text::is_valid_email, AppError},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, to_bson};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user email
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
    pub aud: String,           // audience
    pub iss: String,           // issuer
}

impl Claims {
    pub fn email(&self) -> &str {
        &self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == crate::models::ROLE_ADMIN)
    }
}

/// Identity handed over by the web tier after its OAuth sign-in
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SessionRequest {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserInfo,
}

const DEFAULT_JWT_SECRET: &str = "default-secret-change-me";

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string())
}

/// True when tokens would be signed with the built-in fallback secret
pub fn jwt_secret_is_default() -> bool {
    get_jwt_secret() == DEFAULT_JWT_SECRET
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "job-feed-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "job-feed-web".to_string())
}

// Generate JWT token
pub fn generate_jwt(user: &User) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::days(7)).timestamp() as usize;

    let claims = Claims {
        sub: user.email.clone(),
        name: user.name.clone(),
        roles: vec![user.role.clone()],
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Unauthorized(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Creates the user on first sign-in, refreshes identity fields otherwise,
/// and returns a service token. Geo-IP tracking runs in the background.
pub async fn exchange_session(
    db: &MongoDB,
    geoip: &GeoIpClient,
    request: &SessionRequest,
    client_ip: Option<String>,
) -> Result<AuthResponse, AppError> {
    let email = request.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::InvalidRequest("A valid email is required".to_string()));
    }

    let collection = db.collection::<User>(USERS);
    let now = Utc::now().timestamp();

    let mut set_doc = doc! {
        "updated_at": now,
        "last_login": now,
    };
    if let Some(name) = &request.name {
        set_doc.insert("name", name.trim());
    }
    if let Some(image) = &request.image {
        set_doc.insert("image", image.trim());
    }
    if let Some(ip) = &client_ip {
        set_doc.insert("last_ip", ip);
    }

    let update = doc! {
        "$set": set_doc,
        "$setOnInsert": {
            "role": ROLE_USER,
            "is_active": true,
            "profile": to_bson(&crate::models::UserProfile::default())?,
            "bookmarks": [],
            "created_at": now,
        }
    };

    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();

    let user = collection
        .find_one_and_update(doc! { "email": &email }, update)
        .with_options(options)
        .await?
        .ok_or_else(|| AppError::DatabaseError("Upsert returned no document".to_string()))?;

    if !user.is_active {
        log::warn!("🚫 Inactive account tried to sign in: {}", email);
        return Err(AppError::Forbidden("Account is inactive".to_string()));
    }

    if let Some(ip) = client_ip {
        track_location(db.clone(), geoip.clone(), email.clone(), ip);
    }

    let token = generate_jwt(&user)?;

    Ok(AuthResponse {
        success: true,
        token,
        user: UserInfo::from(user),
    })
}

/// Fire-and-forget geo-IP lookup; failures only get logged
fn track_location(db: MongoDB, geoip: GeoIpClient, email: String, ip: String) {
    tokio::spawn(async move {
        let Some(geo) = geoip.lookup(&ip).await else {
            return;
        };

        let geo_bson = match to_bson(&geo) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("⚠️  Could not encode geo location for {}: {}", email, e);
                return;
            }
        };

        let result = db
            .collection::<User>(USERS)
            .update_one(doc! { "email": &email }, doc! { "$set": { "geo": geo_bson } })
            .await;

        match result {
            Ok(_) => log::debug!("🌍 Location tracked for {}", email),
            Err(e) => log::warn!("⚠️  Failed to store location for {}: {}", email, e),
        }
    });
}

pub async fn get_current_user(db: &MongoDB, email: &str) -> Result<User, AppError> {
    db.collection::<User>(USERS)
        .find_one(doc! { "email": email })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UserProfile, ROLE_ADMIN};

    #[test]
    fn test_default_secret_detected_only_without_env() {
        let from_env = std::env::var("JWT_SECRET").ok();
        let expected = from_env.map_or(true, |secret| secret == DEFAULT_JWT_SECRET);
        assert_eq!(jwt_secret_is_default(), expected);
    }

    fn user(role: &str) -> User {
        User {
            id: None,
            email: "ada@example.com".to_string(),
            name: Some("Ada".to_string()),
            image: None,
            role: role.to_string(),
            is_active: true,
            profile: UserProfile::default(),
            bookmarks: vec![],
            last_ip: None,
            geo: None,
            created_at: 0,
            updated_at: 0,
            last_login: None,
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let token = generate_jwt(&user(ROLE_USER)).unwrap();
        let claims = verify_token(&token).unwrap();

        assert_eq!(claims.email(), "ada@example.com");
        assert_eq!(claims.name.as_deref(), Some("Ada"));
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_admin_claims() {
        let token = generate_jwt(&user(ROLE_ADMIN)).unwrap();
        assert!(verify_token(&token).unwrap().is_admin());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(verify_token("not-a-jwt"), Err(AppError::Unauthorized(_))));
    }
}
