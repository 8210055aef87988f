use anyhow::{anyhow, Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::middlewares::auth::{JwtClaims, JwtService};
use crate::models::user::{AuthResponse, ChangePasswordRequest, LoginRequest, User, UserProfile};
use crate::utils::time::chrono_to_bson;

pub struct AuthService {
    mongo: Database,
    jwt_service: JwtService,
    access_token_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(mongo: Database, jwt_service: JwtService) -> Self {
        let access_token_ttl_seconds = std::env::var("JWT_ACCESS_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(3600); // Default: 1 hour

        Self {
            mongo,
            jwt_service,
            access_token_ttl_seconds,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, DEFAULT_COST).context("Failed to hash password")
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        verify(password, hash).context("Failed to verify password")
    }

    /// Login with email and password
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse> {
        let users_collection = self.mongo.collection::<User>("users");

        let user = users_collection
            .find_one(doc! { "email": &req.email })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| anyhow!("Invalid email or password"))?;

        if !self.verify_password(&req.password, &user.password_hash)? {
            return Err(anyhow!("Invalid email or password"));
        }

        let user_id = user
            .id
            .ok_or_else(|| anyhow!("Stored user is missing an id"))?;

        // Record last login
        users_collection
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": { "lastLoginAt": chrono_to_bson(Utc::now()) } },
            )
            .await
            .context("Failed to record last login")?;

        let access_token = self.generate_access_token(&user)?;

        Ok(AuthResponse {
            access_token,
            user: UserProfile::from(user),
        })
    }

    /// Fetch the profile of the authenticated user
    pub async fn current_user(&self, user_id: &str) -> Result<UserProfile> {
        let users_collection = self.mongo.collection::<User>("users");
        let object_id = ObjectId::parse_str(user_id).context("Invalid user ID format")?;

        let user = users_collection
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| anyhow!("User not found"))?;

        Ok(UserProfile::from(user))
    }

    /// Change the authenticated user's password
    pub async fn change_password(&self, user_id: &str, req: ChangePasswordRequest) -> Result<()> {
        let users_collection = self.mongo.collection::<User>("users");
        let object_id = ObjectId::parse_str(user_id).context("Invalid user ID format")?;

        let user = users_collection
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| anyhow!("User not found"))?;

        if !self.verify_password(&req.old_password, &user.password_hash)? {
            return Err(anyhow!("Old password is incorrect"));
        }

        let password_hash = self.hash_password(&req.new_password)?;
        users_collection
            .update_one(
                doc! { "_id": object_id },
                doc! { "$set": {
                    "password_hash": password_hash,
                    "updatedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await
            .context("Failed to update password")?;

        Ok(())
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let user_id = user
            .id
            .ok_or_else(|| anyhow!("Stored user is missing an id"))?;
        let now = Utc::now().timestamp();

        let claims = JwtClaims {
            sub: user_id.to_hex(),
            role: user.role.as_str().to_string(),
            student_id: user.student_id.map(|id| id.to_hex()),
            exp: (now + self.access_token_ttl_seconds) as usize,
            iat: now as usize,
        };

        self.jwt_service
            .generate_token(claims)
            .map_err(|e| anyhow!("Failed to generate token: {}", e))
    }
}
