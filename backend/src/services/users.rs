//! User service for authentication and account management
//!
//! Password hashing runs on the blocking thread pool and the JWT service is
//! passed by reference, so the keys are derived once at startup.

use super::{check_uploads, discard_images, store_images};
use crate::auth::{JwtService, PasswordService, SocialError, SocialProvider, TokenSubject};
use crate::error::ApiError;
use crate::hashing;
use crate::media::{ImageKind, ImageStore, UploadedFile};
use crate::repositories::{
    DenyRepository, NewUser, UpdateProfile, UserFilter, UserRecord, UserRepository,
};
use bml_shared::models::{Role, SnsLoginType};
use bml_shared::types::{
    AuthTokens, DeniedUser, DenyToggleResponse, LoginResponse, MyInfoResponse, PaginatedResponse,
    PublicProfile, RegisterData, UserListQuery, UserResponse,
};
use bml_shared::validation::{
    normalize_phone, validate_email, validate_nickname, validate_password,
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

/// Editable profile fields; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,
    pub description: Option<String>,
    pub marketing_agree: Option<bool>,
    pub push_agree: Option<bool>,
}

/// User service for authentication operations
pub struct UserService;

impl UserService {
    pub fn to_response(user: &UserRecord) -> UserResponse {
        UserResponse {
            user_hash: user.view_hash.clone(),
            sns_login_type: user.sns_login_type.parse().unwrap_or(SnsLoginType::Email),
            nickname: user.nickname.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.parse().unwrap_or_default(),
            profile_image: user.profile_image.clone(),
            description: user.description.clone(),
            marketing_agree: user.marketing_agree,
            push_agree: user.push_agree,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }

    fn issue_tokens(jwt_service: &JwtService, user: &UserRecord) -> Result<AuthTokens, ApiError> {
        let role: Role = user.role.parse().unwrap_or_default();
        let subject = TokenSubject {
            user_id: user.id,
            user_hash: &user.view_hash,
            role,
        };

        Ok(AuthTokens {
            access_token: jwt_service
                .generate_access_token(&subject)
                .map_err(ApiError::from_repo)?,
            refresh_token: jwt_service
                .generate_refresh_token(&subject)
                .map_err(ApiError::from_repo)?,
            token_type: "Bearer".to_string(),
            expires_in: jwt_service.access_token_expiry_secs(),
        })
    }

    fn login_response(jwt_service: &JwtService, user: &UserRecord) -> Result<LoginResponse, ApiError> {
        Ok(LoginResponse {
            user: Self::to_response(user),
            tokens: Self::issue_tokens(jwt_service, user)?,
        })
    }

    /// Active user or 401
    pub async fn require_active(pool: &PgPool, user_id: i64) -> Result<UserRecord, ApiError> {
        UserRepository::find_by_id(pool, user_id)
            .await
            .map_err(ApiError::from_repo)?
            .filter(UserRecord::is_usable)
            .ok_or_else(|| ApiError::Unauthorized("Account is not active".to_string()))
    }

    /// Register an email or social account
    pub async fn register(
        pool: &PgPool,
        jwt_service: &JwtService,
        store: &ImageStore,
        data: RegisterData,
        avatar: Option<UploadedFile>,
    ) -> Result<LoginResponse, ApiError> {
        validate_nickname(&data.nickname).map_err(ApiError::Validation)?;

        let email = data.email.trim().to_string();
        let phone = normalize_phone(&data.phone);
        let sns_id = data.sns_id.trim().to_string();

        let password_hash = if data.sns_login_type.is_social() {
            if sns_id.is_empty() {
                return Err(ApiError::Validation("sns_id is required".to_string()));
            }
            None
        } else {
            validate_email(&email).map_err(ApiError::Validation)?;
            let password = data.password.clone().unwrap_or_default();
            validate_password(&password).map_err(ApiError::Validation)?;
            Some(
                PasswordService::hash_async(password)
                    .await
                    .map_err(ApiError::from_repo)?,
            )
        };

        if let Some(file) = &avatar {
            check_uploads(store, std::slice::from_ref(file))?;
        }

        if !email.is_empty()
            && UserRepository::email_exists(pool, &email)
                .await
                .map_err(ApiError::from_repo)?
        {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
        if !phone.is_empty()
            && UserRepository::phone_exists(pool, &phone)
                .await
                .map_err(ApiError::from_repo)?
        {
            return Err(ApiError::Conflict("Phone number already registered".to_string()));
        }
        let login_type = data.sns_login_type.as_str();
        if data.sns_login_type.is_social()
            && UserRepository::sns_exists(pool, login_type, &sns_id)
                .await
                .map_err(ApiError::from_repo)?
        {
            return Err(ApiError::Conflict("Account already registered".to_string()));
        }

        let view_hash = hashing::user_hash(login_type, &sns_id, &data.name, &email, &phone);
        let mut user = UserRepository::create(
            pool,
            NewUser {
                sns_login_type: login_type.to_string(),
                sns_id,
                password_hash,
                name: data.name,
                nickname: data.nickname.trim().to_string(),
                email,
                phone,
                profile_image: None,
                marketing_agree: data.marketing_agree,
                push_agree: data.push_agree,
                view_hash,
            },
        )
        .await
        .map_err(ApiError::from_repo)?;

        if let Some(file) = avatar {
            if let Some(image) = store_images(store, ImageKind::Users, user.id, vec![file])
                .await
                .into_iter()
                .next()
            {
                user = UserRepository::update_profile(
                    pool,
                    user.id,
                    UpdateProfile {
                        profile_image: Some(image.path),
                        ..UpdateProfile::default()
                    },
                )
                .await
                .map_err(ApiError::from_repo)?;
            }
        }

        info!(user_id = user.id, login_type, "User registered");
        Self::login_response(jwt_service, &user)
    }

    /// Login with email and password
    pub async fn login(
        pool: &PgPool,
        jwt_service: &JwtService,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, ApiError> {
        let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

        let user = UserRepository::find_by_email(pool, email.trim())
            .await
            .map_err(ApiError::from_repo)?
            .filter(UserRecord::is_usable)
            .ok_or_else(invalid)?;

        let valid = PasswordService::verify_async(password.to_string(), user.password_hash.clone())
            .await
            .map_err(ApiError::from_repo)?;
        if !valid {
            return Err(invalid());
        }

        UserRepository::touch_last_login(pool, user.id)
            .await
            .map_err(ApiError::from_repo)?;
        let user = UserRecord {
            last_login_at: Some(Utc::now()),
            ..user
        };

        Self::login_response(jwt_service, &user)
    }

    /// Sign in with a provider token, creating the account on first use
    pub async fn social_login(
        pool: &PgPool,
        jwt_service: &JwtService,
        provider: &dyn SocialProvider,
        token: &str,
    ) -> Result<LoginResponse, ApiError> {
        if token.trim().is_empty() {
            return Err(ApiError::Validation("Token is required".to_string()));
        }

        let info = provider.fetch_user(token).await.map_err(|e| match e {
            SocialError::Http(err) => ApiError::Internal(err.into()),
            other => ApiError::Unauthorized(format!("Social login failed: {}", other)),
        })?;
        let login_type = info.provider.as_str();

        let existing = UserRepository::find_by_sns(pool, login_type, &info.social_id)
            .await
            .map_err(ApiError::from_repo)?;

        let user = match existing {
            Some(user) => {
                let avatar = info
                    .profile_image
                    .as_deref()
                    .filter(|img| user.profile_image.as_deref() != Some(*img));
                if user.is_usable() && avatar.is_none() {
                    user
                } else {
                    UserRepository::reactivate(pool, user.id, avatar)
                        .await
                        .map_err(ApiError::from_repo)?
                }
            }
            None => {
                let name = info.name.clone().unwrap_or_default();
                let email = info.email.clone().unwrap_or_default();
                let nickname = info
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| format!("{}_user", login_type.to_ascii_lowercase()));
                let view_hash = hashing::user_hash(login_type, &info.social_id, &name, &email, "");

                let user = UserRepository::create(
                    pool,
                    NewUser {
                        sns_login_type: login_type.to_string(),
                        sns_id: info.social_id.clone(),
                        password_hash: None,
                        name,
                        nickname,
                        email,
                        phone: String::new(),
                        profile_image: info.profile_image.clone(),
                        marketing_agree: false,
                        push_agree: false,
                        view_hash,
                    },
                )
                .await
                .map_err(ApiError::from_repo)?;
                info!(user_id = user.id, login_type, "Social account created");
                user
            }
        };

        UserRepository::touch_last_login(pool, user.id)
            .await
            .map_err(ApiError::from_repo)?;
        let user = UserRecord {
            last_login_at: Some(Utc::now()),
            ..user
        };

        Self::login_response(jwt_service, &user)
    }

    /// Exchange a refresh token for a new pair
    pub async fn refresh_token(
        pool: &PgPool,
        jwt_service: &JwtService,
        refresh_token: &str,
    ) -> Result<AuthTokens, ApiError> {
        let claims = jwt_service
            .validate_refresh_token(refresh_token)
            .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

        let user = Self::require_active(pool, user_id).await?;
        Self::issue_tokens(jwt_service, &user)
    }

    pub async fn withdraw(pool: &PgPool, user_id: i64) -> Result<(), ApiError> {
        let user = Self::require_active(pool, user_id).await?;
        UserRepository::soft_delete(pool, user.id)
            .await
            .map_err(ApiError::from_repo)?;
        info!(user_id, "User withdrew");
        Ok(())
    }

    pub async fn my_info(pool: &PgPool, user_id: i64) -> Result<MyInfoResponse, ApiError> {
        let user = Self::require_active(pool, user_id).await?;
        let counts = UserRepository::counts(pool, user.id)
            .await
            .map_err(ApiError::from_repo)?;

        Ok(MyInfoResponse {
            user: Self::to_response(&user),
            feed_count: counts.feed_count,
            liked_feed_count: counts.liked_feed_count,
            community_count: counts.community_count,
        })
    }

    /// Update profile fields; a new avatar replaces the old variant files
    pub async fn update_me(
        pool: &PgPool,
        store: &ImageStore,
        user_id: i64,
        update: ProfileUpdate,
        avatar: Option<UploadedFile>,
    ) -> Result<UserResponse, ApiError> {
        let user = Self::require_active(pool, user_id).await?;

        let nickname = match update.nickname {
            Some(nickname) => {
                validate_nickname(&nickname).map_err(ApiError::Validation)?;
                Some(nickname.trim().to_string())
            }
            None => None,
        };
        if let Some(file) = &avatar {
            check_uploads(store, std::slice::from_ref(file))?;
        }

        let mut profile_image = None;
        if let Some(file) = avatar {
            if let Some(image) = store_images(store, ImageKind::Users, user.id, vec![file])
                .await
                .into_iter()
                .next()
            {
                profile_image = Some(image.path);
            }
        }

        let updated = UserRepository::update_profile(
            pool,
            user.id,
            UpdateProfile {
                nickname,
                description: update.description,
                marketing_agree: update.marketing_agree,
                push_agree: update.push_agree,
                profile_image: profile_image.clone(),
            },
        )
        .await
        .map_err(ApiError::from_repo)?;

        if let (Some(_), Some(old)) = (profile_image, user.profile_image) {
            discard_images(store, &[old]).await;
        }

        Ok(Self::to_response(&updated))
    }

    pub async fn change_password(
        pool: &PgPool,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let user = Self::require_active(pool, user_id).await?;
        if user.sns_login_type != SnsLoginType::Email.as_str() {
            return Err(ApiError::BadRequest(
                "Password can only be changed for email accounts".to_string(),
            ));
        }

        let valid =
            PasswordService::verify_async(current_password.to_string(), user.password_hash.clone())
                .await
                .map_err(ApiError::from_repo)?;
        if !valid {
            return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
        }

        validate_password(new_password).map_err(ApiError::Validation)?;
        let hash = PasswordService::hash_async(new_password.to_string())
            .await
            .map_err(ApiError::from_repo)?;
        UserRepository::update_password(pool, user.id, &hash)
            .await
            .map_err(ApiError::from_repo)?;

        Ok(())
    }

    pub async fn public_profile(pool: &PgPool, user_hash: &str) -> Result<PublicProfile, ApiError> {
        let user = UserRepository::find_active_by_hash(pool, user_hash)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        let feed_count = UserRepository::public_feed_count(pool, user.id)
            .await
            .map_err(ApiError::from_repo)?;

        Ok(PublicProfile {
            user_hash: user.view_hash,
            nickname: user.nickname,
            profile_image: user.profile_image,
            description: user.description,
            feed_count,
        })
    }

    /// Block or unblock another user
    pub async fn toggle_deny(
        pool: &PgPool,
        user_id: i64,
        deny_user_hash: &str,
    ) -> Result<DenyToggleResponse, ApiError> {
        let target = UserRepository::find_active_by_hash(pool, deny_user_hash)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        if target.id == user_id {
            return Err(ApiError::BadRequest("You cannot block yourself".to_string()));
        }

        let removed = DenyRepository::remove(pool, user_id, target.id)
            .await
            .map_err(ApiError::from_repo)?;
        if !removed {
            DenyRepository::add(pool, user_id, target.id)
                .await
                .map_err(ApiError::from_repo)?;
        }

        Ok(DenyToggleResponse { denied: !removed })
    }

    pub async fn list_denies(pool: &PgPool, user_id: i64) -> Result<Vec<DeniedUser>, ApiError> {
        let rows = DenyRepository::list(pool, user_id)
            .await
            .map_err(ApiError::from_repo)?;

        Ok(rows
            .into_iter()
            .map(|row| DeniedUser {
                user_hash: row.user_hash,
                nickname: row.nickname,
                profile_image: row.profile_image,
                denied_at: row.denied_at,
            })
            .collect())
    }

    /// Admin user search
    pub async fn list_users(
        pool: &PgPool,
        query: UserListQuery,
    ) -> Result<PaginatedResponse<UserResponse>, ApiError> {
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);
        let filter = UserFilter {
            sns_id: non_blank(query.sns_id),
            name: non_blank(query.name),
            nickname: non_blank(query.nickname),
        };

        let offset = i64::from(page - 1) * i64::from(limit);
        let (users, total) = UserRepository::list(pool, &filter, i64::from(limit), offset)
            .await
            .map_err(ApiError::from_repo)?;

        Ok(PaginatedResponse::new(
            users.iter().map(Self::to_response).collect(),
            u64::try_from(total).unwrap_or_default(),
            page,
            limit,
        ))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(role: &str, login_type: &str) -> UserRecord {
        UserRecord {
            id: 7,
            sns_login_type: login_type.to_string(),
            sns_id: String::new(),
            password_hash: None,
            name: "Kim".to_string(),
            nickname: "kim".to_string(),
            email: "kim@example.com".to_string(),
            phone: String::new(),
            role: role.to_string(),
            profile_image: None,
            description: None,
            marketing_agree: false,
            push_agree: true,
            is_active: true,
            view_hash: "hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
            deleted_at: None,
        }
    }

    #[test]
    fn test_to_response_parses_enums() {
        let response = UserService::to_response(&record("ADMIN", "KAKAO"));
        assert_eq!(response.role, Role::Admin);
        assert_eq!(response.sns_login_type, SnsLoginType::Kakao);
        assert_eq!(response.user_hash, "hash");
    }

    #[test]
    fn test_to_response_falls_back_on_unknown_values() {
        let response = UserService::to_response(&record("ROOT", "APPLE"));
        assert_eq!(response.role, Role::User);
        assert_eq!(response.sns_login_type, SnsLoginType::Email);
    }

    #[test]
    fn test_issued_tokens_carry_user() {
        let jwt = JwtService::new("test-secret", 3600, 7200);
        let tokens = UserService::issue_tokens(&jwt, &record("USER", "EMAIL")).unwrap();

        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 3600);
        let claims = jwt.validate_access_token(&tokens.access_token).unwrap();
        assert_eq!(claims.user_hash, "hash");
        assert_eq!(claims.user_id().unwrap(), 7);
        assert!(jwt.validate_refresh_token(&tokens.refresh_token).is_ok());
    }

    #[test]
    fn test_usable_requires_active_and_not_deleted() {
        let mut user = record("USER", "EMAIL");
        assert!(user.is_usable());
        user.deleted_at = Some(Utc::now());
        assert!(!user.is_usable());
        user.deleted_at = None;
        user.is_active = false;
        assert!(!user.is_usable());
    }

    #[test]
    fn test_non_blank_filters() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" kim ".to_string())), Some("kim".to_string()));
        assert_eq!(non_blank(None), None);
    }
}
